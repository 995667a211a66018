//! Arithmetic, comparison and logical operators
//!
//! Binary operators recycle the shorter operand and take their attributes from
//! the longer one (the first on ties). Integer arithmetic that leaves the
//! 32-bit range produces NA and a single warning per call.

use crate::args::Args;
use crate::ast::Arg;
use crate::builtins::lang::match_special;
use crate::builtins::{complexes, doubles, integers, logicals, recycled_length, strings, BuiltinSpec};
use crate::env::Environment;
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::{is_na_complex, is_na_real, na_complex, na_real, NA_INTEGER};
use crate::value::{Kind, Value, Vector, VectorData};
use num::complex::Complex64;
use std::cmp::Ordering;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("+", &["e1", "e2"], builtin_add),
    BuiltinSpec::eager("-", &["e1", "e2"], builtin_sub),
    BuiltinSpec::eager("*", &["e1", "e2"], builtin_mul),
    BuiltinSpec::eager("/", &["e1", "e2"], builtin_div),
    BuiltinSpec::eager("^", &["e1", "e2"], builtin_pow),
    BuiltinSpec::eager("%%", &["e1", "e2"], builtin_mod),
    BuiltinSpec::eager("%/%", &["e1", "e2"], builtin_int_div),
    BuiltinSpec::eager("==", &["e1", "e2"], builtin_eq),
    BuiltinSpec::eager("!=", &["e1", "e2"], builtin_ne),
    BuiltinSpec::eager("<", &["e1", "e2"], builtin_lt),
    BuiltinSpec::eager(">", &["e1", "e2"], builtin_gt),
    BuiltinSpec::eager("<=", &["e1", "e2"], builtin_le),
    BuiltinSpec::eager(">=", &["e1", "e2"], builtin_ge),
    BuiltinSpec::eager("!", &["x"], builtin_not),
    BuiltinSpec::eager("&", &["e1", "e2"], builtin_and),
    BuiltinSpec::eager("|", &["e1", "e2"], builtin_or),
    BuiltinSpec::special("&&", &["x", "y"], builtin_and_and),
    BuiltinSpec::special("||", &["x", "y"], builtin_or_or),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
    IntDiv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

fn binary_or_unary(interp: &mut Interpreter, args: &Args, op: ArithOp) -> RResult<Value> {
    let e1 = args.get("e1");
    if args.is_missing("e2") {
        return match op {
            ArithOp::Add | ArithOp::Sub => unary(interp, op, &e1),
            _ => Err(Message::ArgumentMissing("e2".to_string()).into()),
        };
    }
    arith(interp, op, &e1, &args.get("e2"))
}

fn builtin_add(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    binary_or_unary(interp, args, ArithOp::Add)
}

fn builtin_sub(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    binary_or_unary(interp, args, ArithOp::Sub)
}

fn builtin_mul(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    binary_or_unary(interp, args, ArithOp::Mul)
}

fn builtin_div(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    binary_or_unary(interp, args, ArithOp::Div)
}

fn builtin_pow(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    binary_or_unary(interp, args, ArithOp::Pow)
}

fn builtin_mod(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    binary_or_unary(interp, args, ArithOp::Mod)
}

fn builtin_int_div(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    binary_or_unary(interp, args, ArithOp::IntDiv)
}

fn comparison(interp: &mut Interpreter, args: &Args, op: CompareOp) -> RResult<Value> {
    compare(interp, op, &args.get("e1"), &args.get("e2"))
}

fn builtin_eq(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    comparison(interp, args, CompareOp::Eq)
}

fn builtin_ne(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    comparison(interp, args, CompareOp::Ne)
}

fn builtin_lt(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    comparison(interp, args, CompareOp::Lt)
}

fn builtin_gt(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    comparison(interp, args, CompareOp::Gt)
}

fn builtin_le(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    comparison(interp, args, CompareOp::Le)
}

fn builtin_ge(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    comparison(interp, args, CompareOp::Ge)
}

fn builtin_and(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    logic(interp, true, &args.get("e1"), &args.get("e2"))
}

fn builtin_or(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    logic(interp, false, &args.get("e1"), &args.get("e2"))
}

// ============================================================================
// Operands
// ============================================================================

fn operand(value: &Value, name: &str) -> RResult<Vector> {
    match value {
        Value::Vector(v) => Ok(v.clone()),
        Value::Null => Ok(Vector::empty(Kind::Logical)),
        Value::Missing => Err(Message::ArgumentMissing(name.to_string()).into()),
        _ => Err(Message::NonNumericBinary.into()),
    }
}

fn is_arith_kind(kind: Kind) -> bool {
    kind.is_numeric() || kind == Kind::Complex
}

/// Copy the attributes of the operand whose length is the result length
fn inherit_attributes(x: &Vector, y: &Vector, out: &mut Vector) {
    let n = out.len();
    let source = if x.len() == n && x.has_attributes() {
        Some(x)
    } else if y.len() == n && y.has_attributes() {
        Some(y)
    } else {
        None
    };
    if let Some(source) = source {
        out.set_attributes(source.attributes().cloned());
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

fn int_op(op: ArithOp, a: i32, b: i32, overflow: &mut bool) -> i32 {
    if a == NA_INTEGER || b == NA_INTEGER {
        return NA_INTEGER;
    }
    let (a, b) = (a as i64, b as i64);
    let r = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Mod | ArithOp::IntDiv if b == 0 => return NA_INTEGER,
        ArithOp::Mod => floor_mod(a, b),
        ArithOp::IntDiv => (a - floor_mod(a, b)) / b,
        // never reached: `/` and `^` are computed in doubles
        ArithOp::Div | ArithOp::Pow => return NA_INTEGER,
    };
    if r > i32::MAX as i64 || r <= i32::MIN as i64 {
        *overflow = true;
        return NA_INTEGER;
    }
    r as i32
}

/// Remainder with the sign of the divisor
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

pub(crate) fn double_op(op: ArithOp, a: f64, b: f64) -> f64 {
    if op == ArithOp::Pow {
        // 1^y and x^0 are 1 even for NA
        if a == 1.0 || b == 0.0 {
            return 1.0;
        }
        if is_na_real(a) || is_na_real(b) {
            return na_real();
        }
        return a.powf(b);
    }
    if is_na_real(a) || is_na_real(b) {
        return na_real();
    }
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Mod => {
            if b == 0.0 {
                f64::NAN
            } else {
                a - (a / b).floor() * b
            }
        }
        ArithOp::IntDiv => (a / b).floor(),
        ArithOp::Pow => a.powf(b),
    }
}

fn complex_op(op: ArithOp, a: Complex64, b: Complex64) -> RResult<Complex64> {
    if is_na_complex(a) || is_na_complex(b) {
        return Ok(na_complex());
    }
    Ok(match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Pow => {
            if b == Complex64::new(0.0, 0.0) {
                Complex64::new(1.0, 0.0)
            } else {
                a.powc(b)
            }
        }
        ArithOp::Mod | ArithOp::IntDiv => return Err(Message::InvalidComplexOperation.into()),
    })
}

/// Elementwise `x op y`
pub(crate) fn arith(interp: &mut Interpreter, op: ArithOp, x: &Value, y: &Value) -> RResult<Value> {
    let x = operand(x, "e1")?;
    let y = operand(y, "e2")?;
    if !is_arith_kind(x.kind()) || !is_arith_kind(y.kind()) {
        return Err(Message::NonNumericBinary.into());
    }
    let kind = if x.kind() == Kind::Complex || y.kind() == Kind::Complex {
        Kind::Complex
    } else if x.kind() == Kind::Double || y.kind() == Kind::Double || matches!(op, ArithOp::Div | ArithOp::Pow) {
        Kind::Double
    } else {
        Kind::Integer
    };
    let n = recycled_length(interp, &[x.len(), y.len()]);
    let (lx, ly) = (x.len().max(1), y.len().max(1));

    let data = match kind {
        Kind::Complex => {
            let a = complexes(interp, &x)?;
            let b = complexes(interp, &y)?;
            let mut out = Vec::with_capacity(n);
            for i in 0..n {
                out.push(complex_op(op, a[i % lx], b[i % ly])?);
            }
            VectorData::Complex(out)
        }
        Kind::Double => {
            let a = doubles(interp, &x)?;
            let b = doubles(interp, &y)?;
            VectorData::Double((0..n).map(|i| double_op(op, a[i % lx], b[i % ly])).collect())
        }
        _ => {
            let a = integers(interp, &x)?;
            let b = integers(interp, &y)?;
            let mut overflow = false;
            let out = (0..n).map(|i| int_op(op, a[i % lx], b[i % ly], &mut overflow)).collect();
            if overflow {
                interp.warning(Message::IntegerOverflow);
            }
            VectorData::Integer(out)
        }
    };

    let mut out = Vector::new(data);
    inherit_attributes(&x, &y, &mut out);
    Ok(Value::Vector(out))
}

/// Unary `+x` / `-x`; logical operands become integer
fn unary(interp: &mut Interpreter, op: ArithOp, x: &Value) -> RResult<Value> {
    let x = match x {
        Value::Vector(v) if is_arith_kind(v.kind()) => v.clone(),
        _ => return Err(Message::InvalidUnaryArgument.into()),
    };
    let negate = op == ArithOp::Sub;
    let data = match x.data() {
        VectorData::Logical(_) | VectorData::Integer(_) => {
            let values = integers(interp, &x)?;
            VectorData::Integer(
                values
                    .into_iter()
                    .map(|i| if negate && i != NA_INTEGER { -i } else { i })
                    .collect(),
            )
        }
        VectorData::Double(d) => VectorData::Double(d.iter().map(|&v| if negate { -v } else { v }).collect()),
        VectorData::Complex(z) => VectorData::Complex(z.iter().map(|&v| if negate { -v } else { v }).collect()),
        _ => return Err(Message::InvalidUnaryArgument.into()),
    };
    let mut out = Vector::with_completeness(data, x.is_complete());
    out.set_attributes(x.attributes().cloned());
    Ok(Value::Vector(out))
}

// ============================================================================
// Comparison
// ============================================================================

fn comparable(value: &Value, name: &str) -> RResult<Vector> {
    let v = operand(value, name).map_err(|_| Message::ComparisonNotImplemented)?;
    if v.kind() == Kind::List {
        return Err(Message::ComparisonNotImplemented.into());
    }
    Ok(v)
}

/// Elementwise comparison; NA operands give NA
pub(crate) fn compare(interp: &mut Interpreter, op: CompareOp, x: &Value, y: &Value) -> RResult<Value> {
    let x = comparable(x, "e1")?;
    let y = comparable(y, "e2")?;
    let n = recycled_length(interp, &[x.len(), y.len()]);
    let (lx, ly) = (x.len().max(1), y.len().max(1));
    let kind = x.kind().max(y.kind());

    let result: Vec<Option<bool>> = match kind {
        Kind::Character => {
            let a = strings(interp, &x)?;
            let b = strings(interp, &y)?;
            (0..n)
                .map(|i| match (&a[i % lx], &b[i % ly]) {
                    (Some(a), Some(b)) => Some(op.holds(a.as_ref().cmp(b.as_ref()))),
                    _ => None,
                })
                .collect()
        }
        Kind::Complex => {
            if !matches!(op, CompareOp::Eq | CompareOp::Ne) {
                return Err(Message::InvalidComplexComparison.into());
            }
            let a = complexes(interp, &x)?;
            let b = complexes(interp, &y)?;
            (0..n)
                .map(|i| {
                    let (a, b) = (a[i % lx], b[i % ly]);
                    if a.re.is_nan() || a.im.is_nan() || b.re.is_nan() || b.im.is_nan() {
                        None
                    } else {
                        Some((a == b) == (op == CompareOp::Eq))
                    }
                })
                .collect()
        }
        _ => {
            let a = doubles(interp, &x)?;
            let b = doubles(interp, &y)?;
            (0..n)
                .map(|i| a[i % lx].partial_cmp(&b[i % ly]).map(|ord| op.holds(ord)))
                .collect()
        }
    };

    let mut out = Vector::logical(result);
    inherit_attributes(&x, &y, &mut out);
    Ok(Value::Vector(out))
}

// ============================================================================
// Logic
// ============================================================================

fn logic_operand(value: &Value, name: &str) -> RResult<Vector> {
    let v = operand(value, name).map_err(|_| Message::LogicalOperationType)?;
    if !is_arith_kind(v.kind()) {
        return Err(Message::LogicalOperationType.into());
    }
    Ok(v)
}

/// Three-valued elementwise `&` (`and = true`) or `|`
fn logic(interp: &mut Interpreter, and: bool, x: &Value, y: &Value) -> RResult<Value> {
    let x = logic_operand(x, "e1")?;
    let y = logic_operand(y, "e2")?;
    let n = recycled_length(interp, &[x.len(), y.len()]);
    let (lx, ly) = (x.len().max(1), y.len().max(1));
    let a = logicals(interp, &x)?;
    let b = logicals(interp, &y)?;
    let result = (0..n)
        .map(|i| match (a[i % lx], b[i % ly], and) {
            (Some(false), _, true) | (_, Some(false), true) => Some(false),
            (Some(true), _, false) | (_, Some(true), false) => Some(true),
            (Some(p), Some(q), _) => Some(if and { p && q } else { p || q }),
            _ => None,
        })
        .collect();
    let mut out = Vector::logical(result);
    inherit_attributes(&x, &y, &mut out);
    Ok(Value::Vector(out))
}

fn builtin_not(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match args.get("x") {
        Value::Vector(v) if is_arith_kind(v.kind()) => v,
        Value::Null => return Ok(Value::Vector(Vector::empty(Kind::Logical))),
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        _ => return Err(Message::InvalidArgumentType.into()),
    };
    let values = logicals(interp, &x)?;
    let mut out = Vector::with_completeness(
        VectorData::Logical(values.into_iter().map(|b| b.map(|b| !b)).collect()),
        x.is_complete(),
    );
    out.set_attributes(x.attributes().cloned());
    Ok(Value::Vector(out))
}

/// Scalar operand of `&&` / `||`
fn scalar_truth(interp: &mut Interpreter, value: &Value, op: &str, first: bool) -> RResult<Option<bool>> {
    let bad_type = || {
        if first {
            Message::InvalidXType(op.to_string())
        } else {
            Message::InvalidYType(op.to_string())
        }
    };
    let v = match value {
        Value::Vector(v) if v.kind() != Kind::List => v,
        _ => return Err(bad_type().into()),
    };
    if v.len() != 1 {
        return Err(Message::LengthInCoercionToLogical(v.len()).into());
    }
    if v.kind() == Kind::Character {
        let s = strings(interp, v)?;
        return match &s[0] {
            None => Ok(None),
            Some(s) => crate::coerce::parse_logical(s).map(Some).ok_or_else(|| bad_type().into()),
        };
    }
    Ok(logicals(interp, v)?[0])
}

fn short_circuit(interp: &mut Interpreter, args: &[Arg], env: &Environment, and: bool) -> RResult<Value> {
    let op = if and { "&&" } else { "||" };
    let formals = ["x", "y"];
    let matched = match_special(&formals, args, env)?;
    let Some(x) = &matched.values[0] else {
        return Err(Message::ArgumentMissing("x".to_string()).into());
    };
    let x = interp.eval(x, env)?;
    let a = scalar_truth(interp, &x, op, true)?;
    // the left operand decides alone
    if a == Some(!and) {
        return Ok(Value::lgl(!and));
    }
    let Some(y) = &matched.values[1] else {
        return Err(Message::ArgumentMissing("y".to_string()).into());
    };
    let y = interp.eval(y, env)?;
    let b = scalar_truth(interp, &y, op, false)?;
    interp.ctx.visible = true;
    Ok(match (a, b) {
        (_, Some(v)) if v == !and => Value::lgl(!and),
        (Some(_), Some(_)) => Value::lgl(and),
        _ => Value::na_logical(),
    })
}

fn builtin_and_and(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    short_circuit(interp, args, env, true)
}

fn builtin_or_or(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    short_circuit(interp, args, env, false)
}
