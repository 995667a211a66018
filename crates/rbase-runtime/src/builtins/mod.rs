//! Builtin functions
//!
//! Every builtin is declared in a per-module `BUILTINS` table: its name, its
//! formals, how it receives arguments and how it sets visibility. The tables
//! are merged into one registry on first use and bound in the base
//! environment at interpreter start.

pub mod apply;
pub mod arith;
pub mod attrib;
pub mod bincode;
pub mod coerce;
pub mod cumulative;
pub mod envir;
pub mod lang;
pub mod matching;
pub mod math;
pub mod matrix;
pub mod options;
pub mod order;
pub mod polyroot;
pub mod random;
pub mod seq;
pub mod string;
pub mod subset;
pub mod summary;
pub mod system;

use crate::args::Args;
use crate::ast::Arg;
use crate::env::Environment;
use crate::error::{Message, RError, RResult};
use crate::interpreter::Interpreter;
use crate::value::{DotArg, Function, Kind, RStr, Value, Vector, VectorData};
use num::complex::Complex64;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::warn;

/// Builtin receiving matched arguments, declared formals already forced
pub type EagerFn = fn(&mut Interpreter, &Args) -> RResult<Value>;

/// Builtin receiving the unevaluated call arguments and the calling environment
pub type SpecialFn = fn(&mut Interpreter, &[Arg], &Environment) -> RResult<Value>;

#[derive(Clone, Copy)]
pub enum BuiltinKind {
    Eager(EagerFn),
    Special(SpecialFn),
}

/// How a builtin leaves the visibility flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    On,
    Off,
    /// The body decides
    Custom,
}

/// Static description of a builtin
pub struct BuiltinSpec {
    pub name: &'static str,
    pub formals: &'static [&'static str],
    pub kind: BuiltinKind,
    pub visibility: Visibility,
}

impl BuiltinSpec {
    pub const fn eager(name: &'static str, formals: &'static [&'static str], body: EagerFn) -> Self {
        Self {
            name,
            formals,
            kind: BuiltinKind::Eager(body),
            visibility: Visibility::On,
        }
    }

    pub const fn special(name: &'static str, formals: &'static [&'static str], body: SpecialFn) -> Self {
        Self {
            name,
            formals,
            kind: BuiltinKind::Special(body),
            visibility: Visibility::On,
        }
    }

    pub const fn invisible(mut self) -> Self {
        self.visibility = Visibility::Off;
        self
    }

    pub const fn custom_visibility(mut self) -> Self {
        self.visibility = Visibility::Custom;
        self
    }

    pub fn is_special(&self) -> bool {
        matches!(self.kind, BuiltinKind::Special(_))
    }
}

impl fmt::Debug for BuiltinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinSpec")
            .field("name", &self.name)
            .field("formals", &self.formals)
            .field("special", &self.is_special())
            .field("visibility", &self.visibility)
            .finish()
    }
}

// ============================================================================
// Registry
// ============================================================================

fn tables() -> [&'static [BuiltinSpec]; 20] {
    [
        apply::BUILTINS,
        arith::BUILTINS,
        attrib::BUILTINS,
        bincode::BUILTINS,
        coerce::BUILTINS,
        cumulative::BUILTINS,
        envir::BUILTINS,
        lang::BUILTINS,
        matching::BUILTINS,
        math::BUILTINS,
        matrix::BUILTINS,
        options::BUILTINS,
        order::BUILTINS,
        polyroot::BUILTINS,
        random::BUILTINS,
        seq::BUILTINS,
        string::BUILTINS,
        subset::BUILTINS,
        summary::BUILTINS,
        system::BUILTINS,
    ]
}

fn registry() -> &'static HashMap<&'static str, &'static BuiltinSpec> {
    static REGISTRY: OnceLock<HashMap<&'static str, &'static BuiltinSpec>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        tables()
            .into_iter()
            .flat_map(|table| table.iter())
            .map(|spec| (spec.name, spec))
            .collect()
    })
}

/// Find a builtin by name
pub fn lookup(name: &str) -> Option<&'static BuiltinSpec> {
    registry().get(name).copied()
}

/// Every registered builtin, in table order
pub fn all() -> impl Iterator<Item = &'static BuiltinSpec> {
    tables().into_iter().flat_map(|table| table.iter())
}

/// Check if a name is a builtin
pub fn is_builtin(name: &str) -> bool {
    registry().contains_key(name)
}

/// Bind every builtin and the base constants in `base`
pub fn install(base: &Environment) {
    let letters = |upper: bool| {
        let letters: Vec<String> = (b'a'..=b'z')
            .map(|c| {
                let c = c as char;
                let c = if upper { c.to_ascii_uppercase() } else { c };
                c.to_string()
            })
            .collect();
        Value::Vector(Vector::strings(letters))
    };
    let constants = [
        ("T", Value::lgl(true)),
        ("F", Value::lgl(false)),
        ("pi", Value::dbl(std::f64::consts::PI)),
        ("letters", letters(false)),
        ("LETTERS", letters(true)),
        (".Machine", crate::options::machine()),
        (".Platform", crate::options::platform()),
    ];
    let bindings = all()
        .map(|spec| (spec.name, Value::Function(Function::Builtin(spec))))
        .chain(constants);
    for (name, value) in bindings {
        if let Err(err) = base.define(name, value) {
            warn!(name, error = %err, "could not bind base value");
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Force every `...` entry, left to right
pub(crate) fn force_dots(interp: &mut Interpreter, args: &Args) -> RResult<Vec<DotArg>> {
    let mut out = Vec::with_capacity(args.dots().len());
    for dot in args.dots() {
        out.push(DotArg {
            name: dot.name.clone(),
            value: interp.force_value(dot.value.clone())?,
        });
    }
    Ok(out)
}

/// Result length of an elementwise operation; warns when lengths do not divide
pub(crate) fn recycled_length(interp: &mut Interpreter, lengths: &[usize]) -> usize {
    if lengths.iter().any(|&n| n == 0) {
        return 0;
    }
    let n = lengths.iter().copied().max().unwrap_or(0);
    if lengths.iter().any(|&len| n % len != 0) {
        interp.warning(Message::LengthNotMultiple);
    }
    n
}

/// `names` as owned strings
pub(crate) fn names_of(v: &Vector) -> Option<Vec<Option<RStr>>> {
    v.names().map(|n| n.to_vec())
}

/// Copy `names` from `from` when lengths agree
pub(crate) fn copy_names(from: &Vector, to: &mut Vector) {
    if from.len() == to.len() {
        if let Some(names) = names_of(from) {
            to.set_names(Some(names));
        }
    }
}

/// Argument as a vector; `NULL` becomes a zero-length logical
pub(crate) fn vector_arg(value: &Value, name: &str) -> RResult<Vector> {
    match value {
        Value::Vector(v) => Ok(v.clone()),
        Value::Null => Ok(Vector::empty(Kind::Logical)),
        Value::Missing => Err(Message::ArgumentMissing(name.to_string()).into()),
        _ => Err(Message::InvalidArgument(name.to_string()).into()),
    }
}

pub(crate) fn invalid_argument(name: &str) -> RError {
    Message::InvalidArgument(name.to_string()).into()
}

/// Integer vector result from `usize` counts or positions
pub(crate) fn int_vector(values: impl IntoIterator<Item = usize>) -> Vector {
    let data: Vec<i32> = values.into_iter().map(|i| i as i32).collect();
    Vector::with_completeness(VectorData::Integer(data), true)
}

// === Element extraction (coercing, warnings raised) ===

pub(crate) fn doubles(interp: &mut Interpreter, v: &Vector) -> RResult<Vec<f64>> {
    match interp.coerce(v, Kind::Double)?.into_data() {
        VectorData::Double(d) => Ok(d),
        _ => Ok(Vec::new()),
    }
}

pub(crate) fn integers(interp: &mut Interpreter, v: &Vector) -> RResult<Vec<i32>> {
    match interp.coerce(v, Kind::Integer)?.into_data() {
        VectorData::Integer(d) => Ok(d),
        _ => Ok(Vec::new()),
    }
}

pub(crate) fn logicals(interp: &mut Interpreter, v: &Vector) -> RResult<Vec<Option<bool>>> {
    match interp.coerce(v, Kind::Logical)?.into_data() {
        VectorData::Logical(d) => Ok(d),
        _ => Ok(Vec::new()),
    }
}

pub(crate) fn complexes(interp: &mut Interpreter, v: &Vector) -> RResult<Vec<Complex64>> {
    match interp.coerce(v, Kind::Complex)?.into_data() {
        VectorData::Complex(d) => Ok(d),
        _ => Ok(Vec::new()),
    }
}

pub(crate) fn strings(interp: &mut Interpreter, v: &Vector) -> RResult<Vec<Option<RStr>>> {
    match interp.coerce(v, Kind::Character)?.into_data() {
        VectorData::Character(d) => Ok(d),
        _ => Ok(Vec::new()),
    }
}

/// Concatenate storage that has already been coerced to `kind`
pub(crate) fn concat(kind: Kind, parts: Vec<VectorData>) -> VectorData {
    let mut out = VectorData::empty(kind);
    for part in parts {
        match (&mut out, part) {
            (VectorData::Logical(a), VectorData::Logical(b)) => a.extend(b),
            (VectorData::Integer(a), VectorData::Integer(b)) => a.extend(b),
            (VectorData::Double(a), VectorData::Double(b)) => a.extend(b),
            (VectorData::Complex(a), VectorData::Complex(b)) => a.extend(b),
            (VectorData::Character(a), VectorData::Character(b)) => a.extend(b),
            (VectorData::Raw(a), VectorData::Raw(b)) => a.extend(b),
            (VectorData::List(a), VectorData::List(b)) => a.extend(b),
            (_, part) => debug_assert!(false, "concat of {:?} into {:?}", part.kind(), kind),
        }
    }
    out
}

/// `dst[i] <- src[j]`; both sides must already share a kind
pub(crate) fn assign_element(dst: &mut VectorData, i: usize, src: &VectorData, j: usize) {
    match (dst, src) {
        (VectorData::Logical(a), VectorData::Logical(b)) => a[i] = b[j],
        (VectorData::Integer(a), VectorData::Integer(b)) => a[i] = b[j],
        (VectorData::Double(a), VectorData::Double(b)) => a[i] = b[j],
        (VectorData::Complex(a), VectorData::Complex(b)) => a[i] = b[j],
        (VectorData::Character(a), VectorData::Character(b)) => a[i] = b[j].clone(),
        (VectorData::Raw(a), VectorData::Raw(b)) => a[i] = b[j],
        (VectorData::List(a), VectorData::List(b)) => a[i] = b[j].clone(),
        (dst, src) => debug_assert!(false, "assign {:?} into {:?}", src.kind(), dst.kind()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::RResult;
    use crate::interpreter::Interpreter;
    use crate::parser::parse_program;
    use crate::value::Value;

    /// Evaluate source in an existing interpreter, returning the last value
    pub(crate) fn eval_in(interp: &mut Interpreter, source: &str) -> RResult<Value> {
        let program = parse_program(source)?;
        let mut last = Value::Null;
        for expr in &program {
            last = interp.eval_toplevel(expr)?;
        }
        Ok(last)
    }

    pub(crate) fn eval(source: &str) -> RResult<Value> {
        eval_in(&mut Interpreter::new(), source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_are_unique() {
        let mut seen = HashSet::new();
        for spec in all() {
            assert!(seen.insert(spec.name), "duplicate builtin {}", spec.name);
        }
    }

    #[test]
    fn test_lookup() {
        assert!(lookup("cumsum").is_some());
        assert!(lookup("quote").unwrap().is_special());
        assert!(!lookup("sum").unwrap().is_special());
        assert!(lookup("no_such_builtin").is_none());
        assert!(is_builtin("diag<-"));
    }

    #[test]
    fn test_invisible_builtins() {
        for name in ["invisible", "assign", "rm", "on.exit", "set.seed", "<-"] {
            assert_eq!(lookup(name).unwrap().visibility, Visibility::Off, "{}", name);
        }
    }

    #[test]
    fn test_install_binds_constants() {
        let base = Environment::named("base", Some(Environment::empty()));
        install(&base);
        assert_eq!(base.get_local("T"), Some(Value::lgl(true)));
        assert!(matches!(base.get_local("sum"), Some(Value::Function(_))));
        assert_eq!(base.get_local("letters").unwrap().length(), 26);
    }

    #[test]
    fn test_recycled_length_warns() {
        let mut interp = Interpreter::new();
        assert_eq!(recycled_length(&mut interp, &[3, 2]), 3);
        assert_eq!(interp.ctx.warnings().len(), 1);
        assert_eq!(recycled_length(&mut interp, &[4, 0]), 0);
    }
}
