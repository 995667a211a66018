//! Runtime value representation
//!
//! - Vectors: copy-on-write (`Rc<VectorData>` with `Rc::make_mut`), value semantics
//! - Attributes: insertion-ordered name/value pairs attached to a vector
//! - Environments, promises and closures: shared, reference-counted handles
//!
//! Every vector carries a completeness flag. It may be `false` for a vector
//! without NAs but is never `true` for a vector holding one.

use crate::ast::{Expr, Formal};
use crate::builtins::BuiltinSpec;
use crate::env::Environment;
use crate::na::{self, Element};
use crate::promise::Promise;
use num::complex::Complex64;
use std::fmt;
use std::rc::Rc;

/// Shared immutable string element
pub type RStr = Rc<str>;

/// Element kinds, ordered by coercion rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Raw,
    Logical,
    Integer,
    Double,
    Complex,
    Character,
    List,
}

impl Kind {
    /// Name reported by `typeof`
    pub fn type_name(self) -> &'static str {
        match self {
            Kind::Raw => "raw",
            Kind::Logical => "logical",
            Kind::Integer => "integer",
            Kind::Double => "double",
            Kind::Complex => "complex",
            Kind::Character => "character",
            Kind::List => "list",
        }
    }

    /// Parse a mode string as accepted by `vector()` and `as.vector()`
    pub fn from_mode(mode: &str) -> Option<Kind> {
        match mode {
            "raw" => Some(Kind::Raw),
            "logical" => Some(Kind::Logical),
            "integer" => Some(Kind::Integer),
            "double" | "numeric" => Some(Kind::Double),
            "complex" => Some(Kind::Complex),
            "character" => Some(Kind::Character),
            "list" => Some(Kind::List),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Logical | Kind::Integer | Kind::Double)
    }

    pub fn is_atomic(self) -> bool {
        self != Kind::List
    }
}

/// Element storage of a vector
#[derive(Debug, Clone)]
pub enum VectorData {
    Logical(Vec<Option<bool>>),
    Integer(Vec<i32>),
    Double(Vec<f64>),
    Complex(Vec<Complex64>),
    Character(Vec<Option<RStr>>),
    Raw(Vec<u8>),
    List(Vec<Value>),
}

fn pick<T: Element>(v: &[T], indices: &[Option<usize>]) -> Vec<T> {
    indices
        .iter()
        .map(|i| i.and_then(|i| v.get(i).cloned()).unwrap_or_else(T::na))
        .collect()
}

impl VectorData {
    pub fn kind(&self) -> Kind {
        match self {
            VectorData::Logical(_) => Kind::Logical,
            VectorData::Integer(_) => Kind::Integer,
            VectorData::Double(_) => Kind::Double,
            VectorData::Complex(_) => Kind::Complex,
            VectorData::Character(_) => Kind::Character,
            VectorData::Raw(_) => Kind::Raw,
            VectorData::List(_) => Kind::List,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VectorData::Logical(v) => v.len(),
            VectorData::Integer(v) => v.len(),
            VectorData::Double(v) => v.len(),
            VectorData::Complex(v) => v.len(),
            VectorData::Character(v) => v.len(),
            VectorData::Raw(v) => v.len(),
            VectorData::List(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-length storage of a kind
    pub fn empty(kind: Kind) -> VectorData {
        VectorData::na_of(kind, 0)
    }

    /// `n` NA elements of a kind (zero bytes for raw, NULL for list)
    pub fn na_of(kind: Kind, n: usize) -> VectorData {
        match kind {
            Kind::Logical => VectorData::Logical(vec![None; n]),
            Kind::Integer => VectorData::Integer(vec![na::NA_INTEGER; n]),
            Kind::Double => VectorData::Double(vec![na::na_real(); n]),
            Kind::Complex => VectorData::Complex(vec![na::na_complex(); n]),
            Kind::Character => VectorData::Character(vec![None; n]),
            Kind::Raw => VectorData::Raw(vec![0; n]),
            Kind::List => VectorData::List(vec![Value::Null; n]),
        }
    }

    /// Whether any element is NA (NaN counts). Lists report true.
    pub fn has_na(&self) -> bool {
        match self {
            VectorData::Logical(v) => v.iter().any(Element::is_na),
            VectorData::Integer(v) => v.iter().any(Element::is_na),
            VectorData::Double(v) => v.iter().any(Element::is_na),
            VectorData::Complex(v) => v.iter().any(Element::is_na),
            VectorData::Character(v) => v.iter().any(Element::is_na),
            VectorData::Raw(_) => false,
            VectorData::List(_) => true,
        }
    }

    /// `is.na` for one element
    pub fn is_na_at(&self, i: usize) -> bool {
        match self {
            VectorData::Logical(v) => v[i].is_na(),
            VectorData::Integer(v) => v[i].is_na(),
            VectorData::Double(v) => v[i].is_na(),
            VectorData::Complex(v) => v[i].is_na(),
            VectorData::Character(v) => v[i].is_na(),
            VectorData::Raw(_) => false,
            VectorData::List(v) => match &v[i] {
                Value::Vector(x) if x.len() == 1 && x.kind().is_atomic() => x.data().is_na_at(0),
                _ => false,
            },
        }
    }

    /// Gather elements by index; `None` or out-of-range positions become NA
    pub fn select(&self, indices: &[Option<usize>]) -> VectorData {
        match self {
            VectorData::Logical(v) => VectorData::Logical(pick(v, indices)),
            VectorData::Integer(v) => VectorData::Integer(pick(v, indices)),
            VectorData::Double(v) => VectorData::Double(pick(v, indices)),
            VectorData::Complex(v) => VectorData::Complex(pick(v, indices)),
            VectorData::Character(v) => VectorData::Character(pick(v, indices)),
            VectorData::Raw(v) => VectorData::Raw(pick(v, indices)),
            VectorData::List(v) => VectorData::List(
                indices
                    .iter()
                    .map(|i| i.and_then(|i| v.get(i).cloned()).unwrap_or(Value::Null))
                    .collect(),
            ),
        }
    }

    /// Gather by plain indices
    pub fn take(&self, indices: &[usize]) -> VectorData {
        let indices: Vec<Option<usize>> = indices.iter().map(|&i| Some(i)).collect();
        self.select(&indices)
    }

    /// Repeat cyclically to length `n`
    pub fn recycle(&self, n: usize) -> VectorData {
        let len = self.len();
        if len == n {
            return self.clone();
        }
        let indices: Vec<Option<usize>> = (0..n)
            .map(|i| if len == 0 { None } else { Some(i % len) })
            .collect();
        self.select(&indices)
    }

    /// Element `i` as a length-one vector value
    pub fn element(&self, i: usize) -> Value {
        match self {
            VectorData::List(v) => v[i].clone(),
            _ => Value::Vector(Vector::new(self.take(&[i]))),
        }
    }

    fn identical(&self, other: &VectorData) -> bool {
        fn same_double(a: f64, b: f64) -> bool {
            if a.is_nan() || b.is_nan() {
                na::is_na_real(a) == na::is_na_real(b) && a.is_nan() == b.is_nan()
            } else {
                a == b
            }
        }
        match (self, other) {
            (VectorData::Logical(a), VectorData::Logical(b)) => a == b,
            (VectorData::Integer(a), VectorData::Integer(b)) => a == b,
            (VectorData::Double(a), VectorData::Double(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_double(*x, *y))
            }
            (VectorData::Complex(a), VectorData::Complex(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|(x, y)| same_double(x.re, y.re) && same_double(x.im, y.im))
            }
            (VectorData::Character(a), VectorData::Character(b)) => a == b,
            (VectorData::Raw(a), VectorData::Raw(b)) => a == b,
            (VectorData::List(a), VectorData::List(b)) => a == b,
            _ => false,
        }
    }
}

/// Ordered attribute map
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Set in place (keeping position) or append; `NULL` removes
    pub fn set(&mut self, name: &str, value: Value) {
        if value.is_null() {
            self.remove(name);
            return;
        }
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

/// A vector with optional attributes
#[derive(Debug, Clone)]
pub struct Vector {
    data: Rc<VectorData>,
    attributes: Option<Attributes>,
    complete: bool,
}

impl Vector {
    /// Build from storage, scanning for NAs
    pub fn new(data: VectorData) -> Self {
        let complete = !data.has_na();
        Self {
            data: Rc::new(data),
            attributes: None,
            complete,
        }
    }

    /// Build with a completeness flag already known to the caller
    pub fn with_completeness(data: VectorData, complete: bool) -> Self {
        debug_assert!(
            !complete || !data.has_na(),
            "vector flagged complete while holding NA"
        );
        let complete = complete && data.kind() != Kind::List;
        Self {
            data: Rc::new(data),
            attributes: None,
            complete,
        }
    }

    pub fn empty(kind: Kind) -> Self {
        Self::with_completeness(VectorData::empty(kind), kind != Kind::List)
    }

    pub fn logical(v: Vec<Option<bool>>) -> Self {
        Self::new(VectorData::Logical(v))
    }

    pub fn integer(v: Vec<i32>) -> Self {
        Self::new(VectorData::Integer(v))
    }

    pub fn double(v: Vec<f64>) -> Self {
        Self::new(VectorData::Double(v))
    }

    pub fn complex(v: Vec<Complex64>) -> Self {
        Self::new(VectorData::Complex(v))
    }

    pub fn character(v: Vec<Option<RStr>>) -> Self {
        Self::new(VectorData::Character(v))
    }

    /// Character vector without NAs
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let v: Vec<Option<RStr>> = items.into_iter().map(|s| Some(RStr::from(s.as_ref()))).collect();
        Self::with_completeness(VectorData::Character(v), true)
    }

    pub fn raw(v: Vec<u8>) -> Self {
        Self::with_completeness(VectorData::Raw(v), true)
    }

    pub fn list(v: Vec<Value>) -> Self {
        Self::with_completeness(VectorData::List(v), false)
    }

    /// List with a `names` attribute
    pub fn named_list(entries: Vec<(String, Value)>) -> Self {
        let (names, values): (Vec<String>, Vec<Value>) = entries.into_iter().unzip();
        let mut list = Self::list(values);
        list.set_attr("names", Value::Vector(Self::strings(names)));
        list
    }

    pub fn data(&self) -> &VectorData {
        &self.data
    }

    /// Mutable storage; copies when shared and drops the completeness claim
    pub fn data_mut(&mut self) -> &mut VectorData {
        self.complete = false;
        Rc::make_mut(&mut self.data)
    }

    /// Consume into owned storage, cloning only if shared
    pub fn into_data(self) -> VectorData {
        Rc::try_unwrap(self.data).unwrap_or_else(|rc| (*rc).clone())
    }

    /// Same storage, same attributes
    pub fn ptr_eq(&self, other: &Vector) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    pub fn kind(&self) -> Kind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Rescan after direct storage edits
    pub fn refresh_completeness(&mut self) {
        self.complete = !self.data.has_na();
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attributes(&self) -> Option<&Attributes> {
        self.attributes.as_ref()
    }

    pub fn has_attributes(&self) -> bool {
        self.attributes.is_some()
    }

    pub fn set_attributes(&mut self, attributes: Option<Attributes>) {
        self.attributes = attributes.filter(|a| !a.is_empty());
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.as_ref().and_then(|a| a.get(name))
    }

    /// Set an attribute; `NULL` removes it
    pub fn set_attr(&mut self, name: &str, value: Value) {
        let attributes = self.attributes.get_or_insert_with(Attributes::new);
        attributes.set(name, value);
        if attributes.is_empty() {
            self.attributes = None;
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<Value> {
        let attributes = self.attributes.as_mut()?;
        let removed = attributes.remove(name);
        if attributes.is_empty() {
            self.attributes = None;
        }
        removed
    }

    /// Same data, no attributes
    pub fn strip_attributes(mut self) -> Self {
        self.attributes = None;
        self
    }

    /// Character elements of the `names` attribute
    pub fn names(&self) -> Option<&[Option<RStr>]> {
        match self.attr("names") {
            Some(Value::Vector(v)) => match v.data() {
                VectorData::Character(names) => Some(names),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn set_names(&mut self, names: Option<Vec<Option<RStr>>>) {
        match names {
            Some(names) => self.set_attr("names", Value::Vector(Vector::character(names))),
            None => {
                self.remove_attr("names");
            }
        }
    }

    /// Extents of the `dim` attribute
    pub fn dim(&self) -> Option<Vec<usize>> {
        match self.attr("dim") {
            Some(Value::Vector(v)) => match v.data() {
                VectorData::Integer(d) => Some(d.iter().map(|&x| x.max(0) as usize).collect()),
                VectorData::Double(d) => Some(d.iter().map(|&x| x.max(0.0) as usize).collect()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn set_dim(&mut self, dim: &[usize]) {
        let dim: Vec<i32> = dim.iter().map(|&d| d as i32).collect();
        self.set_attr("dim", Value::Vector(Vector::integer(dim)));
    }

    /// `(nrow, ncol)` when the vector is a matrix
    pub fn matrix_dims(&self) -> Option<(usize, usize)> {
        match self.dim()?.as_slice() {
            [r, c] => Some((*r, *c)),
            _ => None,
        }
    }

    pub fn class(&self) -> Option<&[Option<RStr>]> {
        match self.attr("class") {
            Some(Value::Vector(v)) => match v.data() {
                VectorData::Character(c) => Some(c),
                _ => None,
            },
            _ => None,
        }
    }
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        self.data.identical(&other.data) && self.attributes == other.attributes
    }
}

impl From<VectorData> for Vector {
    fn from(data: VectorData) -> Self {
        Vector::new(data)
    }
}

/// A user-defined function
#[derive(Debug)]
pub struct Closure {
    pub formals: Rc<Vec<Formal>>,
    pub body: Rc<Expr>,
    pub env: Environment,
}

/// Anything callable
#[derive(Clone)]
pub enum Function {
    Builtin(&'static BuiltinSpec),
    Closure(Rc<Closure>),
}

impl Function {
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Function::Builtin(spec) => Some(spec.name),
            Function::Closure(_) => None,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Builtin(spec) => write!(f, "Builtin({})", spec.name),
            Function::Closure(c) => write!(f, "Closure({} formals)", c.formals.len()),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Builtin(a), Function::Builtin(b)) => a.name == b.name,
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// One element of a `...` binding
#[derive(Debug, Clone, PartialEq)]
pub struct DotArg {
    pub name: Option<String>,
    pub value: Value,
}

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    /// An omitted argument, distinct from `NULL`
    Missing,
    Vector(Vector),
    Env(Environment),
    Function(Function),
    /// Quoted symbol or call
    Lang(Rc<Expr>),
    /// Contents of `...` in a closure frame
    Dots(Vec<DotArg>),
    Promise(Promise),
}

impl Value {
    pub fn lgl(b: bool) -> Value {
        Value::Vector(Vector::with_completeness(VectorData::Logical(vec![Some(b)]), true))
    }

    pub fn int(i: i32) -> Value {
        Value::Vector(Vector::integer(vec![i]))
    }

    pub fn dbl(x: f64) -> Value {
        Value::Vector(Vector::double(vec![x]))
    }

    pub fn cplx(re: f64, im: f64) -> Value {
        Value::Vector(Vector::complex(vec![Complex64::new(re, im)]))
    }

    pub fn str(s: &str) -> Value {
        Value::Vector(Vector::strings([s]))
    }

    pub fn na_logical() -> Value {
        Value::Vector(Vector::logical(vec![None]))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_vector(&self) -> Option<&Vector> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_vector(self) -> Option<Vector> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_env(&self) -> Option<&Environment> {
        match self {
            Value::Env(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Name reported by `typeof`
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Missing => "symbol",
            Value::Vector(v) => v.kind().type_name(),
            Value::Env(_) => "environment",
            Value::Function(Function::Builtin(spec)) => {
                if spec.is_special() {
                    "special"
                } else {
                    "builtin"
                }
            }
            Value::Function(Function::Closure(_)) => "closure",
            Value::Lang(expr) => match expr.as_ref() {
                Expr::Symbol(_) => "symbol",
                _ => "language",
            },
            Value::Dots(_) => "...",
            Value::Promise(_) => "promise",
        }
    }

    /// `length(x)`
    pub fn length(&self) -> usize {
        match self {
            Value::Null | Value::Missing => 0,
            Value::Vector(v) => v.len(),
            Value::Env(e) => e.len(),
            Value::Lang(expr) => match expr.as_ref() {
                Expr::Call(_, args) => args.len() + 1,
                _ => 1,
            },
            Value::Dots(d) => d.len(),
            Value::Function(_) | Value::Promise(_) => 1,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.as_vector().and_then(|v| v.attr(name))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Missing, Value::Missing) => true,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Env(a), Value::Env(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Lang(a), Value::Lang(b)) => a == b,
            (Value::Dots(a), Value::Dots(b)) => a == b,
            (Value::Promise(a), Value::Promise(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Vector> for Value {
    fn from(v: Vector) -> Self {
        Value::Vector(v)
    }
}

impl From<VectorData> for Value {
    fn from(data: VectorData) -> Self {
        Value::Vector(Vector::new(data))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::deparse::deparse_value(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ordering() {
        assert!(Kind::Raw < Kind::Logical);
        assert!(Kind::Logical < Kind::Integer);
        assert!(Kind::Integer < Kind::Double);
        assert!(Kind::Double < Kind::Complex);
        assert!(Kind::Complex < Kind::Character);
        assert!(Kind::Character < Kind::List);
    }

    #[test]
    fn test_completeness_scan() {
        assert!(Vector::double(vec![1.0, 2.0]).is_complete());
        assert!(!Vector::double(vec![1.0, na::na_real()]).is_complete());
        assert!(!Vector::integer(vec![na::NA_INTEGER]).is_complete());
        assert!(!Vector::list(vec![]).is_complete());
        assert!(Vector::raw(vec![1, 2]).is_complete());
    }

    #[test]
    fn test_data_mut_is_copy_on_write() {
        let a = Vector::integer(vec![1, 2, 3]);
        let mut b = a.clone();
        assert!(a.ptr_eq(&b));
        if let VectorData::Integer(v) = b.data_mut() {
            v[0] = 10;
        }
        assert!(!a.ptr_eq(&b));
        assert!(!b.is_complete());
        b.refresh_completeness();
        assert!(b.is_complete());
        assert_eq!(a.data().len(), 3);
    }

    #[test]
    fn test_attributes_null_removes() {
        let mut v = Vector::integer(vec![1, 2]);
        v.set_attr("foo", Value::int(1));
        assert!(v.has_attributes());
        v.set_attr("foo", Value::Null);
        assert!(!v.has_attributes());
    }

    #[test]
    fn test_attribute_order_kept() {
        let mut attrs = Attributes::new();
        attrs.set("b", Value::int(1));
        attrs.set("a", Value::int(2));
        attrs.set("b", Value::int(3));
        let names: Vec<&str> = attrs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(attrs.get("b"), Some(&Value::int(3)));
    }

    #[test]
    fn test_identical_doubles() {
        assert_eq!(Value::dbl(na::na_real()), Value::dbl(na::na_real()));
        assert_eq!(Value::dbl(f64::NAN), Value::dbl(f64::NAN));
        assert_ne!(Value::dbl(f64::NAN), Value::dbl(na::na_real()));
        assert_eq!(Value::dbl(0.0), Value::dbl(-0.0));
    }

    #[test]
    fn test_select_fills_na() {
        let v = VectorData::Integer(vec![1, 2, 3]);
        match v.select(&[Some(2), None, Some(7)]) {
            VectorData::Integer(out) => assert_eq!(out, vec![3, na::NA_INTEGER, na::NA_INTEGER]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_matrix_dims() {
        let mut m = Vector::integer(vec![1, 2, 3, 4, 5, 6]);
        m.set_dim(&[2, 3]);
        assert_eq!(m.matrix_dims(), Some((2, 3)));
        assert_eq!(Vector::integer(vec![1]).matrix_dims(), None);
    }
}
