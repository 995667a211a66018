//! Cumulative scans: `cumsum`, `cumprod`, `cummax`, `cummin`
//!
//! Missing values taint forward: once NA is met every later position is NA.
//! For doubles a NaN taints forward as NaN until an NA upgrades the rest.

use crate::args::Args;
use crate::builtins::{complexes, copy_names, doubles, integers, BuiltinSpec};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::{is_na_complex, is_na_real, na_complex, na_real, NA_INTEGER};
use crate::value::{Kind, Value, Vector, VectorData};
use num::complex::Complex64;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("cumsum", &["x"], builtin_cumsum),
    BuiltinSpec::eager("cumprod", &["x"], builtin_cumprod),
    BuiltinSpec::eager("cummax", &["x"], builtin_cummax),
    BuiltinSpec::eager("cummin", &["x"], builtin_cummin),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Sum,
    Prod,
    Max,
    Min,
}

impl Scan {
    fn name(self) -> &'static str {
        match self {
            Scan::Sum => "cumsum",
            Scan::Prod => "cumprod",
            Scan::Max => "cummax",
            Scan::Min => "cummin",
        }
    }
}

fn builtin_cumsum(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    scan(interp, args, Scan::Sum)
}

fn builtin_cumprod(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    scan(interp, args, Scan::Prod)
}

fn builtin_cummax(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    scan(interp, args, Scan::Max)
}

fn builtin_cummin(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    scan(interp, args, Scan::Min)
}

fn scan(interp: &mut Interpreter, args: &Args, op: Scan) -> RResult<Value> {
    let x = match args.get("x") {
        Value::Vector(v) => v,
        Value::Null => return Ok(Value::Vector(Vector::empty(Kind::Double))),
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        other => return Err(Message::InvalidTypeOfArgument(other.type_name().to_string()).into()),
    };

    let data = match x.kind() {
        Kind::Complex => match op {
            Scan::Sum | Scan::Prod => VectorData::Complex(scan_complex(&complexes(interp, &x)?, op)),
            Scan::Max | Scan::Min => return Err(Message::NotDefinedForComplex(op.name().to_string()).into()),
        },
        Kind::Logical | Kind::Integer if op != Scan::Prod => {
            let (values, overflow) = scan_integer(&integers(interp, &x)?, op);
            if overflow {
                interp.warning(Message::IntegerOverflowCumulative(op.name().to_string()));
            }
            VectorData::Integer(values)
        }
        _ => VectorData::Double(scan_double(&doubles(interp, &x)?, op)),
    };

    let mut out = Vector::new(data);
    copy_names(&x, &mut out);
    Ok(Value::Vector(out))
}

/// Integer scan; the flag reports an overflow, after which everything is NA
fn scan_integer(values: &[i32], op: Scan) -> (Vec<i32>, bool) {
    let mut out = Vec::with_capacity(values.len());
    let mut acc: Option<i64> = None;
    let mut overflow = false;
    for &v in values {
        if v == NA_INTEGER {
            out.resize(values.len(), NA_INTEGER);
            break;
        }
        let v = v as i64;
        let next = match (acc, op) {
            (None, _) => v,
            (Some(a), Scan::Sum) => a + v,
            (Some(a), Scan::Max) => a.max(v),
            (Some(a), Scan::Min) => a.min(v),
            (Some(a), Scan::Prod) => a * v,
        };
        if next > i32::MAX as i64 || next <= i32::MIN as i64 {
            overflow = true;
            out.resize(values.len(), NA_INTEGER);
            break;
        }
        acc = Some(next);
        out.push(next as i32);
    }
    (out, overflow)
}

fn scan_double(values: &[f64], op: Scan) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut acc: Option<f64> = None;
    let mut nan_seen = false;
    for &v in values {
        if is_na_real(v) {
            out.resize(values.len(), na_real());
            break;
        }
        if v.is_nan() || nan_seen {
            nan_seen = true;
            out.push(f64::NAN);
            continue;
        }
        let next = match (acc, op) {
            (None, _) => v,
            (Some(a), Scan::Sum) => a + v,
            (Some(a), Scan::Prod) => a * v,
            (Some(a), Scan::Max) => a.max(v),
            (Some(a), Scan::Min) => a.min(v),
        };
        acc = Some(next);
        out.push(next);
    }
    out
}

fn scan_complex(values: &[Complex64], op: Scan) -> Vec<Complex64> {
    let mut out = Vec::with_capacity(values.len());
    let mut acc = match op {
        Scan::Prod => Complex64::new(1.0, 0.0),
        _ => Complex64::new(0.0, 0.0),
    };
    for &z in values {
        if is_na_complex(z) {
            out.resize(values.len(), na_complex());
            break;
        }
        acc = if op == Scan::Prod { acc * z } else { acc + z };
        out.push(acc);
    }
    out
}
