//! Construction and sequences: `c`, `list`, `:`, `seq`, `rep`

use crate::args::Args;
use crate::builtins::{concat, doubles, force_dots, int_vector, integers, vector_arg, BuiltinSpec};
use crate::casts::{self, to_int};
use crate::coerce::common_kind;
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::NA_INTEGER;
use crate::value::{DotArg, Kind, RStr, Value, Vector, VectorData};

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("c", &["..."], builtin_c),
    BuiltinSpec::eager("list", &["..."], builtin_list),
    BuiltinSpec::eager("seq_len", &["length.out"], builtin_seq_len),
    BuiltinSpec::eager("seq_along", &["along.with"], builtin_seq_along),
    BuiltinSpec::eager("rep", &["x", "times", "each", "length.out"], builtin_rep),
    BuiltinSpec::eager(":", &["from", "to"], builtin_colon),
    BuiltinSpec::eager("seq", &["from", "to", "by", "length.out"], builtin_seq),
];

/// Longest sequence `:` and `seq` will build
const MAX_SEQUENCE: f64 = i32::MAX as f64;

// ============================================================================
// c / list
// ============================================================================

fn builtin_c(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let items = force_dots(interp, args)?;
    combine(interp, &items)
}

/// Concatenate tagged values into one vector of their common kind
///
/// `NULL`s are skipped. Anything that is not a vector turns the result into a
/// list.
pub(crate) fn combine(interp: &mut Interpreter, items: &[DotArg]) -> RResult<Value> {
    let items: Vec<&DotArg> = items.iter().filter(|d| !d.value.is_null()).collect();
    if items.is_empty() {
        return Ok(Value::Null);
    }
    let kind = if items.iter().all(|d| matches!(d.value, Value::Vector(_))) {
        common_kind(items.iter().filter_map(|d| d.value.as_vector().map(Vector::kind))).unwrap_or(Kind::Logical)
    } else {
        Kind::List
    };

    let mut parts = Vec::with_capacity(items.len());
    let mut names = Vec::new();
    let mut named = false;
    for item in items {
        let tag = item.name.as_deref();
        match &item.value {
            Value::Vector(v) => {
                push_names(tag, v, &mut names, &mut named);
                parts.push(interp.coerce(v, kind)?.into_data());
            }
            other => {
                named |= tag.is_some();
                names.push(Some(RStr::from(tag.unwrap_or(""))));
                parts.push(VectorData::List(vec![other.clone()]));
            }
        }
    }

    let mut out = Vector::new(concat(kind, parts));
    if named {
        out.set_names(Some(names));
    }
    Ok(Value::Vector(out))
}

/// Element names for `c`: `tag.name`, `tag<i>`, `tag` or the element's own name
fn push_names(tag: Option<&str>, v: &Vector, out: &mut Vec<Option<RStr>>, named: &mut bool) {
    let inner = v.names();
    let n = v.len();
    for i in 0..n {
        let own = inner
            .and_then(|names| names.get(i).cloned().flatten())
            .filter(|s| !s.is_empty());
        let name = match (tag, own) {
            (Some(tag), Some(own)) => format!("{}.{}", tag, own),
            (Some(tag), None) if n == 1 => tag.to_string(),
            (Some(tag), None) => format!("{}{}", tag, i + 1),
            (None, Some(own)) => own.to_string(),
            (None, None) => String::new(),
        };
        *named |= !name.is_empty();
        out.push(Some(RStr::from(name)));
    }
}

fn builtin_list(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let items = force_dots(interp, args)?;
    let named = items.iter().any(|d| d.name.is_some());
    let names: Vec<Option<RStr>> = items
        .iter()
        .map(|d| Some(RStr::from(d.name.as_deref().unwrap_or(""))))
        .collect();
    let mut out = Vector::list(items.into_iter().map(|d| d.value).collect());
    if named {
        out.set_names(Some(names));
    }
    Ok(Value::Vector(out))
}

// ============================================================================
// Integer sequences
// ============================================================================

fn builtin_seq_len(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let n = non_negative_count(interp, &args.get("length.out"), "length.out")?;
    Ok(Value::Vector(int_vector(1..=n)))
}

fn builtin_seq_along(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let n = args.get("along.with").length();
    Ok(Value::Vector(int_vector(1..=n)))
}

fn non_negative_count(interp: &mut Interpreter, value: &Value, name: &str) -> RResult<usize> {
    let v = vector_arg(value, name)?;
    if v.is_empty() {
        return Err(Message::ArgumentOfLength0.into());
    }
    if !v.kind().is_numeric() {
        return Err(Message::NonNegativeInteger.into());
    }
    let x = doubles(interp, &v)?[0];
    if x.is_nan() || x < 0.0 || x > MAX_SEQUENCE {
        return Err(Message::NonNegativeInteger.into());
    }
    Ok(x as usize)
}

fn endpoint(interp: &mut Interpreter, value: &Value, name: &str) -> RResult<f64> {
    let v = vector_arg(value, name)?;
    if v.is_empty() {
        return Err(Message::ArgumentOfLength0.into());
    }
    let x = doubles(interp, &v)?[0];
    if x.is_nan() {
        return Err(Message::NaNanArgument.into());
    }
    Ok(x)
}

fn builtin_colon(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let from = endpoint(interp, &args.get("from"), "from")?;
    let to = endpoint(interp, &args.get("to"), "to")?;
    Ok(Value::Vector(colon(from, to)?))
}

/// `from:to`, integer when `from` is integral and both ends fit
pub(crate) fn colon(from: f64, to: f64) -> RResult<Vector> {
    let span = (to - from).abs();
    if span >= MAX_SEQUENCE {
        return Err(Message::TooLongVector.into());
    }
    let n = (span + 1e-10).floor() as usize + 1;
    let step = if from <= to { 1.0 } else { -1.0 };
    let last = from + step * (n - 1) as f64;
    let fits = |x: f64| x > i32::MIN as f64 && x <= i32::MAX as f64;
    if from == from.trunc() && fits(from) && fits(last) {
        let start = from as i64;
        let step = step as i64;
        let data: Vec<i32> = (0..n as i64).map(|i| (start + step * i) as i32).collect();
        return Ok(Vector::with_completeness(VectorData::Integer(data), true));
    }
    let data: Vec<f64> = (0..n).map(|i| from + step * i as f64).collect();
    Ok(Vector::with_completeness(VectorData::Double(data), true))
}

// ============================================================================
// seq
// ============================================================================

fn finite(interp: &mut Interpreter, args: &Args, name: &str, message: Message) -> RResult<Option<f64>> {
    let value = args.get(name);
    if value.is_missing() {
        return Ok(None);
    }
    let v = vector_arg(&value, name)?;
    if v.len() != 1 || !v.kind().is_numeric() {
        return Err(message.into());
    }
    let x = doubles(interp, &v)?[0];
    if !x.is_finite() {
        return Err(message.into());
    }
    Ok(Some(x))
}

fn is_integer_arg(args: &Args, name: &str) -> bool {
    matches!(args.get(name), Value::Vector(v) if v.kind() == Kind::Integer)
}

fn builtin_seq(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let only_from = ["to", "by", "length.out"].iter().all(|name| args.is_missing(name));
    let from_arg = args.get("from");
    // seq(x) for a vector x is seq_along(x)
    if only_from && !from_arg.is_missing() && from_arg.length() != 1 {
        return Ok(Value::Vector(int_vector(1..=from_arg.length())));
    }
    let from = finite(interp, args, "from", Message::FromMustBeFinite)?;
    let to = finite(interp, args, "to", Message::ToMustBeFinite)?;
    let by = finite(interp, args, "by", Message::InvalidArgument("by".to_string()))?;
    let length_out = if args.is_missing("length.out") {
        None
    } else {
        Some(non_negative_count(interp, &args.get("length.out"), "length.out")?)
    };

    let out = match (from, to, by, length_out) {
        (Some(n), None, None, None) => colon(1.0, n)?,
        (from, to, None, None) => colon(from.unwrap_or(1.0), to.unwrap_or(1.0))?,
        (from, to, Some(by), None) => {
            let from = from.unwrap_or(1.0);
            let to = to.unwrap_or(1.0);
            stepped(from, to, by, is_integer_arg(args, "from") && is_integer_arg(args, "by"))?
        }
        (from, to, by, Some(n)) => with_length(from, to, by, n),
    };
    Ok(Value::Vector(out))
}

fn stepped(from: f64, to: f64, by: f64, integer: bool) -> RResult<Vector> {
    let delta = to - from;
    if delta == 0.0 {
        return Ok(Vector::double(vec![from]));
    }
    if by == 0.0 {
        return Err(Message::InvalidSeqBy.into());
    }
    let steps = delta / by;
    if steps < 0.0 {
        return Err(Message::WrongSignInBy.into());
    }
    if steps > MAX_SEQUENCE {
        return Err(Message::TooLongVector.into());
    }
    let n = (steps + 1e-10).floor() as usize + 1;
    let values: Vec<f64> = (0..n).map(|i| from + by * i as f64).collect();
    if integer {
        let data = values.into_iter().map(|x| x as i32).collect();
        return Ok(Vector::with_completeness(VectorData::Integer(data), true));
    }
    Ok(Vector::with_completeness(VectorData::Double(values), true))
}

/// `seq(..., length.out = n)`
fn with_length(from: Option<f64>, to: Option<f64>, by: Option<f64>, n: usize) -> Vector {
    let values: Vec<f64> = match (from, to, by) {
        (Some(from), Some(to), _) => {
            if n == 1 {
                vec![from]
            } else {
                let by = (to - from) / (n - 1) as f64;
                (0..n).map(|i| from + by * i as f64).collect()
            }
        }
        (None, Some(to), by) => {
            let by = by.unwrap_or(1.0);
            (0..n).map(|i| to - by * (n - 1 - i) as f64).collect()
        }
        (from, None, by) => {
            let from = from.unwrap_or(1.0);
            let by = by.unwrap_or(1.0);
            (0..n).map(|i| from + by * i as f64).collect()
        }
    };
    let integral = values.iter().all(|x| x.fract() == 0.0 && x.abs() < MAX_SEQUENCE);
    if integral && from.map_or(true, |x| x.fract() == 0.0) {
        Vector::with_completeness(VectorData::Integer(values.into_iter().map(|x| x as i32).collect()), true)
    } else {
        Vector::with_completeness(VectorData::Double(values), true)
    }
}

// ============================================================================
// rep
// ============================================================================

fn counts(interp: &mut Interpreter, value: &Value, name: &str) -> RResult<Vec<usize>> {
    let v = vector_arg(value, name)?;
    if !v.kind().is_numeric() {
        return Err(Message::InvalidArgument(name.to_string()).into());
    }
    integers(interp, &v)?
        .into_iter()
        .map(|i| {
            if i == NA_INTEGER || i < 0 {
                Err(Message::InvalidArgument(name.to_string()).into())
            } else {
                Ok(i as usize)
            }
        })
        .collect()
}

fn builtin_rep(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match args.get("x") {
        Value::Vector(v) => v,
        Value::Null => return Ok(Value::Null),
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        other => return Err(Message::ReplicateType(other.type_name().to_string()).into()),
    };
    let each = casts::int_scalar("each")
        .default_if_missing(Value::int(1))
        .apply(interp, args.get("each"))?;
    let each = match to_int(&each) {
        Some(e) if e != NA_INTEGER && e >= 0 => e as usize,
        _ => return Err(Message::InvalidArgument("each".to_string()).into()),
    };
    let length_out = casts::int_scalar("length.out")
        .default_if_missing(Value::int(NA_INTEGER))
        .apply(interp, args.get("length.out"))?;
    let length_out = to_int(&length_out).filter(|&n| n != NA_INTEGER);
    if matches!(length_out, Some(n) if n < 0) {
        return Err(Message::InvalidArgument("length.out".to_string()).into());
    }

    let base: Vec<usize> = (0..x.len())
        .flat_map(|i| std::iter::repeat(i).take(each))
        .collect();
    let indices: Vec<usize> = if let Some(n) = length_out {
        if base.is_empty() {
            Vec::new()
        } else {
            (0..n as usize).map(|k| base[k % base.len()]).collect()
        }
    } else {
        let times = if args.is_missing("times") {
            vec![1]
        } else {
            counts(interp, &args.get("times"), "times")?
        };
        if times.len() == 1 {
            let mut out = Vec::with_capacity(base.len() * times[0]);
            for _ in 0..times[0] {
                out.extend_from_slice(&base);
            }
            out
        } else if times.len() == base.len() {
            base.iter()
                .zip(&times)
                .flat_map(|(&i, &t)| std::iter::repeat(i).take(t))
                .collect()
        } else {
            return Err(Message::InvalidArgument("times".to_string()).into());
        }
    };

    let mut out = Vector::new(x.data().take(&indices));
    if let Some(names) = x.names() {
        out.set_names(Some(indices.iter().map(|&i| names[i].clone()).collect()));
    }
    Ok(Value::Vector(out))
}
