//! Declarative argument casts
//!
//! A [`Cast`] describes how one builtin argument is turned into the value the
//! algorithm expects. Steps are stored per phase, so they always run in the
//! same order no matter how the builder was called:
//!
//! 1. missing / `NULL` short-circuit
//! 2. type predicates (error when violated)
//! 3. conversion to an element kind
//! 4. value predicates (error when violated)
//! 5. post maps (`map_if`, `first_element`, `replace_na`)
//!
//! Conversion reuses the input vector when it is already of the target kind
//! and carries no attributes.

use crate::error::{Message, RError, RResult};
use crate::interpreter::Interpreter;
use crate::value::{Kind, Value, Vector, VectorData};

type TypePredicate = fn(&Value) -> bool;
type VectorPredicate = fn(&Vector) -> bool;
type VectorMap = fn(Vector) -> Vector;

#[derive(Debug, Clone)]
enum OnMissing {
    Error,
    Default(Value),
    Pass,
}

#[derive(Debug, Clone)]
enum OnNull {
    /// Continue the pipeline; a conversion turns `NULL` into a zero-length vector
    Convert,
    Default(Value),
    Pass,
}

#[derive(Debug, Clone)]
enum PostMap {
    MapIf(VectorPredicate, VectorMap),
    FirstElement,
    ReplaceNa(Vector),
}

/// Argument cast pipeline
#[derive(Debug, Clone)]
pub struct Cast {
    name: &'static str,
    on_missing: OnMissing,
    on_null: OnNull,
    type_checks: Vec<(TypePredicate, Message)>,
    conversion: Option<Kind>,
    value_checks: Vec<(VectorPredicate, Message)>,
    post: Vec<PostMap>,
}

impl Cast {
    /// Cast for the formal `name`; by default a missing argument passes through
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            on_missing: OnMissing::Pass,
            on_null: OnNull::Convert,
            type_checks: Vec::new(),
            conversion: None,
            value_checks: Vec::new(),
            post: Vec::new(),
        }
    }

    // === Missing / NULL ===

    pub fn must_not_be_missing(mut self) -> Self {
        self.on_missing = OnMissing::Error;
        self
    }

    pub fn default_if_missing(mut self, value: Value) -> Self {
        self.on_missing = OnMissing::Default(value);
        self
    }

    pub fn default_if_null(mut self, value: Value) -> Self {
        self.on_null = OnNull::Default(value);
        self
    }

    /// `NULL` is returned as is, skipping every later phase
    pub fn null_passes(mut self) -> Self {
        self.on_null = OnNull::Pass;
        self
    }

    // === Type predicates ===

    pub fn must_be(mut self, predicate: TypePredicate, message: Message) -> Self {
        self.type_checks.push((predicate, message));
        self
    }

    // === Conversion ===

    pub fn as_logical(self) -> Self {
        self.convert_to(Kind::Logical)
    }

    pub fn as_integer(self) -> Self {
        self.convert_to(Kind::Integer)
    }

    pub fn as_double(self) -> Self {
        self.convert_to(Kind::Double)
    }

    pub fn as_complex(self) -> Self {
        self.convert_to(Kind::Complex)
    }

    pub fn as_character(self) -> Self {
        self.convert_to(Kind::Character)
    }

    fn convert_to(mut self, kind: Kind) -> Self {
        self.conversion = Some(kind);
        self
    }

    // === Value predicates ===

    pub fn must(mut self, predicate: VectorPredicate, message: Message) -> Self {
        self.value_checks.push((predicate, message));
        self
    }

    // === Post maps ===

    pub fn map_if(mut self, predicate: VectorPredicate, map: VectorMap) -> Self {
        self.post.push(PostMap::MapIf(predicate, map));
        self
    }

    /// Keep only the first element; an empty vector stays empty
    pub fn first_element(mut self) -> Self {
        self.post.push(PostMap::FirstElement);
        self
    }

    /// Replace a scalar NA by `replacement`
    pub fn replace_na(mut self, replacement: Vector) -> Self {
        self.post.push(PostMap::ReplaceNa(replacement));
        self
    }

    /// Run the pipeline on an argument value
    pub fn apply(&self, interp: &mut Interpreter, value: Value) -> RResult<Value> {
        let value = match value {
            Value::Missing => match &self.on_missing {
                OnMissing::Error => return Err(Message::ArgumentMissing(self.name.to_string()).into()),
                OnMissing::Default(v) => return Ok(v.clone()),
                OnMissing::Pass => return Ok(Value::Missing),
            },
            Value::Null => match &self.on_null {
                OnNull::Pass => return Ok(Value::Null),
                OnNull::Default(v) => return Ok(v.clone()),
                OnNull::Convert => Value::Null,
            },
            other => other,
        };

        for (predicate, message) in &self.type_checks {
            if !predicate(&value) {
                return Err(RError::new(message.clone()));
            }
        }

        let mut vector = match (self.conversion, value) {
            (Some(kind), Value::Null) => Vector::empty(kind),
            (Some(kind), Value::Vector(v)) => {
                if !v.kind().is_atomic() && kind != Kind::List && !list_is_scalar(&v) {
                    return Err(Message::InvalidArgument(self.name.to_string()).into());
                }
                interp.coerce(&v, kind)?
            }
            (Some(_), _) => return Err(Message::InvalidArgument(self.name.to_string()).into()),
            (None, Value::Vector(v)) => v,
            (None, other) => {
                // non-vectors only reach here without value checks or post maps
                if self.value_checks.is_empty() && self.post.is_empty() {
                    return Ok(other);
                }
                return Err(Message::InvalidArgument(self.name.to_string()).into());
            }
        };

        for (predicate, message) in &self.value_checks {
            if !predicate(&vector) {
                return Err(RError::new(message.clone()));
            }
        }

        for step in &self.post {
            vector = match step {
                PostMap::MapIf(predicate, map) => {
                    if predicate(&vector) {
                        map(vector)
                    } else {
                        vector
                    }
                }
                PostMap::FirstElement => {
                    if vector.len() <= 1 && !vector.has_attributes() {
                        vector
                    } else {
                        let first = vector.data().take(&[0][..vector.len().min(1)]);
                        Vector::new(first)
                    }
                }
                PostMap::ReplaceNa(replacement) => {
                    if vector.len() == 1 && vector.data().is_na_at(0) {
                        replacement.clone()
                    } else {
                        vector
                    }
                }
            };
        }

        Ok(Value::Vector(vector))
    }
}

/// A list whose elements are all length-one atomics coerces element-wise
fn list_is_scalar(v: &Vector) -> bool {
    match v.data() {
        VectorData::List(items) => items
            .iter()
            .all(|item| matches!(item, Value::Vector(x) if x.len() == 1 && x.kind().is_atomic())),
        _ => true,
    }
}

// ============================================================================
// Common casts
// ============================================================================

/// Non-NA logical scalar, the usual `na.rm`-style flag
pub fn flag(name: &'static str) -> Cast {
    Cast::new(name)
        .must_not_be_missing()
        .as_logical()
        .must(|v| !v.is_empty(), Message::InvalidArgument(name.to_string()))
        .first_element()
        .must(|v| v.is_complete(), Message::InvalidArgument(name.to_string()))
}

/// Integer scalar; NA allowed
pub fn int_scalar(name: &'static str) -> Cast {
    Cast::new(name)
        .must_not_be_missing()
        .must_be(is_numeric_like, Message::InvalidArgument(name.to_string()))
        .as_integer()
        .must(|v| !v.is_empty(), Message::InvalidArgument(name.to_string()))
        .first_element()
}

/// Double scalar; NA allowed
pub fn double_scalar(name: &'static str) -> Cast {
    Cast::new(name)
        .must_not_be_missing()
        .must_be(is_numeric_like, Message::InvalidArgument(name.to_string()))
        .as_double()
        .must(|v| !v.is_empty(), Message::InvalidArgument(name.to_string()))
        .first_element()
}

/// Single non-NA string
pub fn string_scalar(name: &'static str) -> Cast {
    Cast::new(name)
        .must_not_be_missing()
        .must_be(
            |v| matches!(v, Value::Vector(x) if x.kind() == Kind::Character),
            Message::InvalidArgument(name.to_string()),
        )
        .must(|v| v.len() == 1 && v.is_complete(), Message::InvalidArgument(name.to_string()))
}

/// Numeric, logical or complex vector (or `NULL`)
pub fn is_numeric_like(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Vector(v) => v.kind().is_numeric() || v.kind() == Kind::Complex,
        _ => false,
    }
}

/// Any atomic vector (or `NULL`)
pub fn is_atomic(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Vector(v) => v.kind().is_atomic(),
        _ => false,
    }
}

// ============================================================================
// Plain extraction after a cast
// ============================================================================

pub fn to_bool(value: &Value) -> Option<bool> {
    match value.as_vector()?.data() {
        VectorData::Logical(v) => v.first().copied().flatten(),
        _ => None,
    }
}

pub fn to_int(value: &Value) -> Option<i32> {
    match value.as_vector()?.data() {
        VectorData::Integer(v) => v.first().copied(),
        _ => None,
    }
}

pub fn to_double(value: &Value) -> Option<f64> {
    match value.as_vector()?.data() {
        VectorData::Double(v) => v.first().copied(),
        _ => None,
    }
}

pub fn to_str(value: &Value) -> Option<String> {
    match value.as_vector()?.data() {
        VectorData::Character(v) => v.first().cloned().flatten().map(|s| s.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::na::NA_INTEGER;

    fn interp() -> Interpreter {
        Interpreter::new()
    }

    #[test]
    fn test_missing_policies() {
        let mut it = interp();
        let err = Cast::new("x").must_not_be_missing().apply(&mut it, Value::Missing).unwrap_err();
        assert_eq!(err.message, Message::ArgumentMissing("x".to_string()));

        let v = Cast::new("x")
            .default_if_missing(Value::lgl(true))
            .as_integer()
            .apply(&mut it, Value::Missing)
            .unwrap();
        // defaults short-circuit the rest of the pipeline
        assert_eq!(v, Value::lgl(true));
    }

    #[test]
    fn test_null_converts_to_empty() {
        let mut it = interp();
        let v = Cast::new("x").as_double().apply(&mut it, Value::Null).unwrap();
        assert_eq!(v, Value::Vector(Vector::double(vec![])));
        let v = Cast::new("x").null_passes().as_double().apply(&mut it, Value::Null).unwrap();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_conversion_fast_path_keeps_instance() {
        let mut it = interp();
        let x = Vector::integer(vec![1, 2, 3]);
        let out = Cast::new("x").as_integer().apply(&mut it, Value::Vector(x.clone())).unwrap();
        assert!(out.as_vector().unwrap().ptr_eq(&x));
    }

    #[test]
    fn test_type_check_before_conversion() {
        let mut it = interp();
        let err = Cast::new("x")
            .must_be(is_numeric_like, Message::NonNumericMath)
            .as_double()
            .apply(&mut it, Value::str("a"))
            .unwrap_err();
        assert_eq!(err.message, Message::NonNumericMath);
    }

    #[test]
    fn test_phase_order_is_fixed() {
        let mut it = interp();
        // builder order differs from execution order: convert, then check, then map
        let cast = Cast::new("n")
            .first_element()
            .must(|v| v.is_complete(), Message::InvalidArgument("n".to_string()))
            .as_integer();
        let out = cast.apply(&mut it, Value::Vector(Vector::double(vec![2.7, 9.0]))).unwrap();
        assert_eq!(out, Value::int(2));
    }

    #[test]
    fn test_replace_na() {
        let mut it = interp();
        let out = Cast::new("nomatch")
            .as_integer()
            .replace_na(Vector::integer(vec![0]))
            .apply(&mut it, Value::na_logical())
            .unwrap();
        assert_eq!(out, Value::int(0));
    }

    #[test]
    fn test_flag() {
        let mut it = interp();
        assert_eq!(flag("na.rm").apply(&mut it, Value::lgl(true)).unwrap(), Value::lgl(true));
        let err = flag("na.rm").apply(&mut it, Value::na_logical()).unwrap_err();
        assert_eq!(err.message, Message::InvalidArgument("na.rm".to_string()));
        let err = flag("right").apply(&mut it, Value::Vector(Vector::logical(vec![]))).unwrap_err();
        assert_eq!(err.message.to_string(), "invalid 'right' argument");
    }

    #[test]
    fn test_int_scalar_keeps_na() {
        let mut it = interp();
        let out = int_scalar("nrow").apply(&mut it, Value::na_logical()).unwrap();
        match out.as_vector().unwrap().data() {
            VectorData::Integer(v) => assert_eq!(v, &vec![NA_INTEGER]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_conversion_warns() {
        let mut it = interp();
        let out = Cast::new("x").as_double().apply(&mut it, Value::str("abc")).unwrap();
        assert!(crate::na::is_na_real(to_double(&out).unwrap()));
        assert_eq!(it.ctx.warnings().len(), 1);
    }
}
