//! Coercion and type predicates: `as.*`, `is.*`, `typeof`, `vector`,
//! `unlist`, `identical`
//!
//! Coercions drop every attribute. A vector that already has the requested
//! kind and carries no attributes is returned as the same instance.

use crate::args::Args;
use crate::ast::Expr;
use crate::builtins::seq::combine;
use crate::builtins::{names_of, BuiltinSpec};
use crate::casts::{self, to_bool, to_str};
use crate::deparse::deparse_expr;
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::{is_na_complex, is_nan_not_na, NA_INTEGER};
use crate::value::{DotArg, Kind, RStr, Value, Vector, VectorData};

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("as.logical", &["x", "..."], builtin_as_logical),
    BuiltinSpec::eager("as.integer", &["x", "..."], builtin_as_integer),
    BuiltinSpec::eager("as.double", &["x", "..."], builtin_as_double),
    BuiltinSpec::eager("as.numeric", &["x", "..."], builtin_as_double),
    BuiltinSpec::eager("as.complex", &["x", "..."], builtin_as_complex),
    BuiltinSpec::eager("as.character", &["x", "..."], builtin_as_character),
    BuiltinSpec::eager("as.raw", &["x"], builtin_as_raw),
    BuiltinSpec::eager("as.list", &["x", "..."], builtin_as_list),
    BuiltinSpec::eager("as.vector", &["x", "mode"], builtin_as_vector),
    BuiltinSpec::eager("unlist", &["x", "recursive", "use.names"], builtin_unlist),
    BuiltinSpec::eager("typeof", &["x"], builtin_typeof),
    BuiltinSpec::eager("is.null", &["x"], builtin_is_null),
    BuiltinSpec::eager("is.na", &["x"], builtin_is_na),
    BuiltinSpec::eager("is.nan", &["x"], builtin_is_nan),
    BuiltinSpec::eager("is.numeric", &["x"], builtin_is_numeric),
    BuiltinSpec::eager("is.character", &["x"], builtin_is_character),
    BuiltinSpec::eager("is.logical", &["x"], builtin_is_logical),
    BuiltinSpec::eager("is.integer", &["x"], builtin_is_integer),
    BuiltinSpec::eager("is.double", &["x"], builtin_is_double),
    BuiltinSpec::eager("is.complex", &["x"], builtin_is_complex),
    BuiltinSpec::eager("is.function", &["x"], builtin_is_function),
    BuiltinSpec::eager("is.environment", &["x"], builtin_is_environment),
    BuiltinSpec::eager("is.list", &["x"], builtin_is_list),
    BuiltinSpec::eager("is.atomic", &["x"], builtin_is_atomic),
    BuiltinSpec::eager("is.vector", &["x", "mode"], builtin_is_vector),
    BuiltinSpec::eager("vector", &["mode", "length"], builtin_vector),
    BuiltinSpec::eager("logical", &["length"], builtin_logical),
    BuiltinSpec::eager("integer", &["length"], builtin_integer),
    BuiltinSpec::eager("numeric", &["length"], builtin_double),
    BuiltinSpec::eager("double", &["length"], builtin_double),
    BuiltinSpec::eager("complex", &["length.out"], builtin_complex),
    BuiltinSpec::eager("character", &["length"], builtin_character),
    BuiltinSpec::eager("identical", &["x", "y"], builtin_identical),
];

// ============================================================================
// as.*
// ============================================================================

/// Elements of a language object as strings
fn language_strings(expr: &Expr) -> Vec<Option<RStr>> {
    match expr {
        Expr::Call(head, args) => std::iter::once(head.as_ref())
            .chain(args.iter().map(|a| &a.value))
            .map(|e| Some(RStr::from(deparse_expr(e))))
            .collect(),
        Expr::Symbol(name) => vec![Some(RStr::from(name.as_str()))],
        other => vec![Some(RStr::from(deparse_expr(other)))],
    }
}

/// `as.<kind>(x)`
pub(crate) fn coerce_value(interp: &mut Interpreter, value: Value, kind: Kind) -> RResult<Vector> {
    match value {
        Value::Null => Ok(Vector::empty(kind)),
        Value::Vector(v) => interp.coerce(&v, kind),
        Value::Lang(expr) if kind == Kind::Character => Ok(Vector::character(language_strings(&expr))),
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        other => Err(Message::CannotCoerce(other.type_name().to_string(), kind.type_name().to_string()).into()),
    }
}

fn as_kind(interp: &mut Interpreter, args: &Args, kind: Kind) -> RResult<Value> {
    Ok(Value::Vector(coerce_value(interp, args.get("x"), kind)?))
}

fn builtin_as_logical(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    as_kind(interp, args, Kind::Logical)
}

fn builtin_as_integer(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    as_kind(interp, args, Kind::Integer)
}

fn builtin_as_double(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    as_kind(interp, args, Kind::Double)
}

fn builtin_as_complex(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    as_kind(interp, args, Kind::Complex)
}

fn builtin_as_character(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    as_kind(interp, args, Kind::Character)
}

fn builtin_as_raw(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    as_kind(interp, args, Kind::Raw)
}

/// Elements as a list; names survive
pub(crate) fn to_list(interp: &mut Interpreter, value: Value) -> RResult<Value> {
    match value {
        Value::Vector(v) if v.kind() == Kind::List => {
            if v.has_attributes() && v.names().is_none() {
                return Ok(Value::Vector(v.strip_attributes()));
            }
            Ok(Value::Vector(v))
        }
        Value::Vector(v) => {
            let mut out = interp.coerce(&v, Kind::List)?;
            if let Some(names) = names_of(&v) {
                out.set_names(Some(names));
            }
            Ok(Value::Vector(out))
        }
        Value::Null => Ok(Value::Vector(Vector::list(Vec::new()))),
        Value::Env(env) => {
            let mut bindings = env.bindings();
            bindings.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(Value::Vector(Vector::named_list(bindings)))
        }
        Value::Lang(expr) => {
            let items = match expr.as_ref() {
                Expr::Call(head, args) => std::iter::once(head.as_ref().clone())
                    .chain(args.iter().map(|a| a.value.clone()))
                    .map(|e| Value::Lang(std::rc::Rc::new(e)))
                    .collect(),
                other => vec![Value::Lang(std::rc::Rc::new(other.clone()))],
            };
            Ok(Value::Vector(Vector::list(items)))
        }
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        other => Err(Message::CannotCoerce(other.type_name().to_string(), "list".to_string()).into()),
    }
}

fn builtin_as_list(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    to_list(interp, args.get("x"))
}

fn mode_arg(interp: &mut Interpreter, args: &Args) -> RResult<String> {
    let mode = casts::string_scalar("mode")
        .default_if_missing(Value::str("any"))
        .apply(interp, args.get("mode"))?;
    Ok(to_str(&mode).unwrap_or_else(|| "any".to_string()))
}

fn builtin_as_vector(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let mode = mode_arg(interp, args)?;
    let x = args.get("x");
    match mode.as_str() {
        "any" => match x {
            // lists keep their names, atomic vectors lose everything
            Value::Vector(v) if v.kind() == Kind::List => to_list(interp, Value::Vector(v)),
            Value::Vector(v) => Ok(Value::Vector(v.strip_attributes())),
            other => Ok(other),
        },
        "list" => to_list(interp, x),
        mode => {
            let kind = Kind::from_mode(mode).ok_or_else(|| Message::InvalidArgument("mode".to_string()))?;
            Ok(Value::Vector(coerce_value(interp, x, kind)?))
        }
    }
}

// ============================================================================
// unlist
// ============================================================================

/// Flatten a list; nested lists are flattened first when `recursive`
pub(crate) fn unlist(interp: &mut Interpreter, list: &Vector, recursive: bool, use_names: bool) -> RResult<Value> {
    let names = names_of(list);
    let mut items = Vec::with_capacity(list.len());
    for i in 0..list.len() {
        let mut value = list.data().element(i);
        if recursive {
            if let Value::Vector(inner) = &value {
                if inner.kind() == Kind::List {
                    value = unlist(interp, inner, true, use_names)?;
                }
            }
        }
        let name = if use_names {
            names
                .as_ref()
                .and_then(|n| n[i].as_deref())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        } else {
            None
        };
        items.push(DotArg { name, value });
    }
    let out = combine(interp, &items)?;
    if use_names {
        return Ok(out);
    }
    Ok(match out {
        Value::Vector(mut v) => {
            v.set_names(None);
            Value::Vector(v)
        }
        other => other,
    })
}

fn builtin_unlist(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let recursive = casts::flag("recursive")
        .default_if_missing(Value::lgl(true))
        .apply(interp, args.get("recursive"))?;
    let use_names = casts::flag("use.names")
        .default_if_missing(Value::lgl(true))
        .apply(interp, args.get("use.names"))?;
    match args.get("x") {
        Value::Vector(v) if v.kind() == Kind::List => unlist(
            interp,
            &v,
            to_bool(&recursive).unwrap_or(true),
            to_bool(&use_names).unwrap_or(true),
        ),
        other => Ok(other),
    }
}

// ============================================================================
// Type predicates
// ============================================================================

fn builtin_typeof(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::str(args.get("x").type_name()))
}

fn kind_of(args: &Args) -> Option<Kind> {
    args.get("x").as_vector().map(Vector::kind)
}

fn builtin_is_null(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(args.get("x").is_null()))
}

fn is_factor(value: &Value) -> bool {
    value
        .as_vector()
        .and_then(Vector::class)
        .map_or(false, |c| c.iter().any(|c| c.as_deref() == Some("factor")))
}

fn builtin_is_numeric(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let numeric = matches!(kind_of(args), Some(Kind::Integer | Kind::Double));
    Ok(Value::lgl(numeric && !is_factor(&args.get("x"))))
}

fn builtin_is_character(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(kind_of(args) == Some(Kind::Character)))
}

fn builtin_is_logical(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(kind_of(args) == Some(Kind::Logical)))
}

fn builtin_is_integer(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(kind_of(args) == Some(Kind::Integer)))
}

fn builtin_is_double(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(kind_of(args) == Some(Kind::Double)))
}

fn builtin_is_complex(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(kind_of(args) == Some(Kind::Complex)))
}

fn builtin_is_function(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(matches!(args.get("x"), Value::Function(_))))
}

fn builtin_is_environment(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(matches!(args.get("x"), Value::Env(_))))
}

fn builtin_is_list(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(kind_of(args) == Some(Kind::List)))
}

fn builtin_is_atomic(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(kind_of(args).map_or(false, Kind::is_atomic)))
}

/// A vector whose only attribute, if any, is `names`
fn builtin_is_vector(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let mode = mode_arg(interp, args)?;
    let Value::Vector(v) = args.get("x") else {
        return Ok(Value::lgl(false));
    };
    let plain = v
        .attributes()
        .map_or(true, |a| a.iter().all(|(name, _)| name == "names"));
    let kind_ok = match mode.as_str() {
        "any" => true,
        "numeric" => matches!(v.kind(), Kind::Integer | Kind::Double),
        mode => Kind::from_mode(mode) == Some(v.kind()),
    };
    Ok(Value::lgl(plain && kind_ok))
}

/// Elementwise missingness, keeping names and dims
fn builtin_is_na(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let v = match args.get("x") {
        Value::Vector(v) => v,
        Value::Null => return Ok(Value::Vector(Vector::empty(Kind::Logical))),
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        other => {
            interp.warning(Message::IsNaNonVector(other.type_name().to_string()));
            return Ok(Value::lgl(false));
        }
    };
    let flags: Vec<Option<bool>> = match v.data() {
        VectorData::List(items) => items
            .iter()
            .map(|item| {
                Some(matches!(item, Value::Vector(x) if x.len() == 1 && x.kind().is_atomic() && x.data().is_na_at(0)))
            })
            .collect(),
        data => (0..data.len()).map(|i| Some(data.is_na_at(i))).collect(),
    };
    Ok(Value::Vector(with_shape(&v, flags)))
}

fn builtin_is_nan(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let v = match args.get("x") {
        Value::Vector(v) => v,
        Value::Null => return Ok(Value::Vector(Vector::empty(Kind::Logical))),
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        other => return Err(Message::DefaultMethodNotImplemented(other.type_name().to_string()).into()),
    };
    let flags: Vec<Option<bool>> = match v.data() {
        VectorData::Double(d) => d.iter().map(|&x| Some(is_nan_not_na(x))).collect(),
        VectorData::Complex(z) => z
            .iter()
            .map(|&z| Some(!is_na_complex(z) && (z.re.is_nan() || z.im.is_nan())))
            .collect(),
        VectorData::List(_) => return Err(Message::DefaultMethodNotImplemented("list".to_string()).into()),
        data => vec![Some(false); data.len()],
    };
    Ok(Value::Vector(with_shape(&v, flags)))
}

/// Logical result carrying the names, dim and dimnames of `x`
fn with_shape(x: &Vector, flags: Vec<Option<bool>>) -> Vector {
    let mut out = Vector::with_completeness(VectorData::Logical(flags), true);
    for name in ["names", "dim", "dimnames"] {
        if let Some(value) = x.attr(name) {
            out.set_attr(name, value.clone());
        }
    }
    out
}

// ============================================================================
// Constructors
// ============================================================================

fn length_arg(interp: &mut Interpreter, args: &Args, name: &'static str) -> RResult<usize> {
    let length = casts::int_scalar(name)
        .default_if_missing(Value::int(0))
        .apply(interp, args.get(name))?;
    match casts::to_int(&length) {
        Some(n) if n != NA_INTEGER && n >= 0 => Ok(n as usize),
        _ => Err(Message::InvalidArgument(name.to_string()).into()),
    }
}

/// Zero-filled vector of `kind`; lists hold `NULL`s
pub(crate) fn zero_vector(kind: Kind, n: usize) -> Vector {
    let data = match kind {
        Kind::Raw => VectorData::Raw(vec![0; n]),
        Kind::Logical => VectorData::Logical(vec![Some(false); n]),
        Kind::Integer => VectorData::Integer(vec![0; n]),
        Kind::Double => VectorData::Double(vec![0.0; n]),
        Kind::Complex => VectorData::Complex(vec![num::complex::Complex64::new(0.0, 0.0); n]),
        Kind::Character => VectorData::Character(vec![Some(RStr::from("")); n]),
        Kind::List => VectorData::List(vec![Value::Null; n]),
    };
    Vector::with_completeness(data, kind != Kind::List)
}

fn builtin_vector(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let mode = casts::string_scalar("mode")
        .default_if_missing(Value::str("logical"))
        .apply(interp, args.get("mode"))?;
    let mode = to_str(&mode).unwrap_or_default();
    let kind = Kind::from_mode(&mode).ok_or_else(|| Message::CannotMakeVectorOfMode(mode.clone()))?;
    let n = length_arg(interp, args, "length")?;
    Ok(Value::Vector(zero_vector(kind, n)))
}

fn builtin_logical(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::Vector(zero_vector(Kind::Logical, length_arg(interp, args, "length")?)))
}

fn builtin_integer(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::Vector(zero_vector(Kind::Integer, length_arg(interp, args, "length")?)))
}

fn builtin_double(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::Vector(zero_vector(Kind::Double, length_arg(interp, args, "length")?)))
}

fn builtin_complex(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::Vector(zero_vector(Kind::Complex, length_arg(interp, args, "length.out")?)))
}

fn builtin_character(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::Vector(zero_vector(Kind::Character, length_arg(interp, args, "length")?)))
}

fn builtin_identical(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(Value::lgl(args.get("x") == args.get("y")))
}
