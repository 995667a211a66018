//! Summaries over `...`: `all`, `any`, `sum`, `prod`, `max`, `min`, `range`
//! and `mean`

use crate::args::Args;
use crate::builtins::{complexes, concat, doubles, force_dots, integers, logicals, strings, BuiltinSpec};
use crate::casts::{self, to_bool};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::{is_na_real, na_complex, na_real, NA_INTEGER};
use crate::value::{Kind, Value, Vector};
use num::complex::Complex64;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("all", &["...", "na.rm"], builtin_all),
    BuiltinSpec::eager("any", &["...", "na.rm"], builtin_any),
    BuiltinSpec::eager("sum", &["...", "na.rm"], builtin_sum),
    BuiltinSpec::eager("prod", &["...", "na.rm"], builtin_prod),
    BuiltinSpec::eager("max", &["...", "na.rm"], builtin_max),
    BuiltinSpec::eager("min", &["...", "na.rm"], builtin_min),
    BuiltinSpec::eager("range", &["...", "na.rm"], builtin_range),
    BuiltinSpec::eager("mean", &["x", "na.rm"], builtin_mean),
];

fn na_rm(interp: &mut Interpreter, args: &Args) -> RResult<bool> {
    let value = casts::flag("na.rm")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("na.rm"))?;
    Ok(to_bool(&value).unwrap_or(false))
}

/// Forced `...` values as vectors, `NULL`s skipped; lists and other
/// non-atomic values are rejected
fn summary_operands(interp: &mut Interpreter, args: &Args, allow_character: bool) -> RResult<Vec<Vector>> {
    let mut out = Vec::new();
    for dot in force_dots(interp, args)? {
        match dot.value {
            Value::Null | Value::Missing => {}
            Value::Vector(v) => {
                let ok = match v.kind() {
                    Kind::Character => allow_character,
                    Kind::List | Kind::Raw => false,
                    _ => true,
                };
                if !ok {
                    return Err(Message::InvalidTypeOfArgument(v.kind().type_name().to_string()).into());
                }
                out.push(v);
            }
            other => return Err(Message::InvalidTypeOfArgument(other.type_name().to_string()).into()),
        }
    }
    Ok(out)
}

// ============================================================================
// all / any
// ============================================================================

fn builtin_all(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    any_all(interp, args, true)
}

fn builtin_any(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    any_all(interp, args, false)
}

/// `all` stops at the first FALSE, `any` at the first TRUE; later `...`
/// entries stay unforced
fn any_all(interp: &mut Interpreter, args: &Args, is_all: bool) -> RResult<Value> {
    let na_rm = na_rm(interp, args)?;
    let decisive = !is_all;
    let mut saw_na = false;
    for dot in args.dots() {
        let v = match interp.force_value(dot.value.clone())? {
            Value::Null | Value::Missing => continue,
            Value::Vector(v) => v,
            other => return Err(Message::InvalidTypeOfArgument(other.type_name().to_string()).into()),
        };
        match v.kind() {
            Kind::Character | Kind::List | Kind::Raw => {
                return Err(Message::InvalidTypeOfArgument(v.kind().type_name().to_string()).into());
            }
            Kind::Double | Kind::Complex => {
                interp.warning(Message::CoercingToLogical(v.kind().type_name().to_string()));
            }
            Kind::Logical | Kind::Integer => {}
        }
        for b in logicals(interp, &v)? {
            match b {
                Some(b) if b == decisive => return Ok(Value::lgl(decisive)),
                None => saw_na = true,
                _ => {}
            }
        }
    }
    if saw_na && !na_rm {
        Ok(Value::na_logical())
    } else {
        Ok(Value::lgl(is_all))
    }
}

// ============================================================================
// sum / prod
// ============================================================================

fn builtin_sum(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let na_rm = na_rm(interp, args)?;
    let operands = summary_operands(interp, args, false)?;
    let kind = operands.iter().map(Vector::kind).max().unwrap_or(Kind::Integer).max(Kind::Integer);
    match kind {
        Kind::Complex => {
            let mut total = Complex64::new(0.0, 0.0);
            for v in &operands {
                for z in complexes(interp, v)? {
                    if z.re.is_nan() || z.im.is_nan() {
                        if na_rm {
                            continue;
                        }
                        if is_na_real(z.re) || is_na_real(z.im) {
                            return Ok(Value::Vector(Vector::complex(vec![na_complex()])));
                        }
                    }
                    total += z;
                }
            }
            Ok(Value::Vector(Vector::complex(vec![total])))
        }
        Kind::Double => {
            let mut total = 0.0;
            let mut saw_na = false;
            for v in &operands {
                for x in doubles(interp, v)? {
                    if x.is_nan() {
                        if na_rm {
                            continue;
                        }
                        saw_na |= is_na_real(x);
                    }
                    total += x;
                }
            }
            Ok(Value::dbl(if saw_na { na_real() } else { total }))
        }
        _ => {
            let mut total: i64 = 0;
            for v in &operands {
                for i in integers(interp, v)? {
                    if i == NA_INTEGER {
                        if na_rm {
                            continue;
                        }
                        return Ok(Value::int(NA_INTEGER));
                    }
                    total += i as i64;
                }
            }
            if total > i32::MAX as i64 || total <= i32::MIN as i64 {
                interp.warning(Message::IntegerOverflowSum);
                return Ok(Value::int(NA_INTEGER));
            }
            Ok(Value::int(total as i32))
        }
    }
}

fn builtin_prod(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let na_rm = na_rm(interp, args)?;
    let operands = summary_operands(interp, args, false)?;
    if operands.iter().any(|v| v.kind() == Kind::Complex) {
        let mut total = Complex64::new(1.0, 0.0);
        for v in &operands {
            for z in complexes(interp, v)? {
                if na_rm && (z.re.is_nan() || z.im.is_nan()) {
                    continue;
                }
                total *= z;
            }
        }
        return Ok(Value::Vector(Vector::complex(vec![total])));
    }
    let mut total = 1.0;
    let mut saw_na = false;
    for v in &operands {
        for x in doubles(interp, v)? {
            if x.is_nan() {
                if na_rm {
                    continue;
                }
                saw_na |= is_na_real(x);
            }
            total *= x;
        }
    }
    Ok(Value::dbl(if saw_na { na_real() } else { total }))
}

// ============================================================================
// max / min / range
// ============================================================================

fn builtin_max(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let na_rm = na_rm(interp, args)?;
    let operands = summary_operands(interp, args, true)?;
    Ok(Value::Vector(extreme(interp, &operands, na_rm, true)?))
}

fn builtin_min(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let na_rm = na_rm(interp, args)?;
    let operands = summary_operands(interp, args, true)?;
    Ok(Value::Vector(extreme(interp, &operands, na_rm, false)?))
}

fn builtin_range(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let na_rm = na_rm(interp, args)?;
    let operands = summary_operands(interp, args, true)?;
    let low = extreme(interp, &operands, na_rm, false)?;
    let high = extreme(interp, &operands, na_rm, true)?;
    let kind = low.kind().max(high.kind());
    let low = interp.coerce(&low, kind)?;
    let high = interp.coerce(&high, kind)?;
    Ok(Value::Vector(Vector::new(concat(kind, vec![low.into_data(), high.into_data()]))))
}

/// Largest (`is_max`) or smallest element over all operands
///
/// The result kind is the highest operand kind, at least integer. NA wins
/// over NaN unless `na_rm`.
fn extreme(interp: &mut Interpreter, operands: &[Vector], na_rm: bool, is_max: bool) -> RResult<Vector> {
    let name = if is_max { "max" } else { "min" };
    let kind = operands.iter().map(Vector::kind).max().unwrap_or(Kind::Integer).max(Kind::Integer);
    let better = |candidate: f64, current: f64| if is_max { candidate > current } else { candidate < current };

    match kind {
        Kind::Complex => Err(Message::InvalidTypeOfArgument("complex".to_string()).into()),
        Kind::Character => {
            let mut best: Option<String> = None;
            for v in operands {
                for s in strings(interp, v)? {
                    let Some(s) = s else {
                        if na_rm {
                            continue;
                        }
                        return Ok(Vector::character(vec![None]));
                    };
                    let replace = match &best {
                        None => true,
                        Some(b) => {
                            if is_max {
                                s.as_ref() > b.as_str()
                            } else {
                                s.as_ref() < b.as_str()
                            }
                        }
                    };
                    if replace {
                        best = Some(s.to_string());
                    }
                }
            }
            match best {
                Some(best) => Ok(Vector::strings([best])),
                None => Err(Message::NoNonMissing(name.to_string()).into()),
            }
        }
        Kind::Integer => {
            let mut best: Option<i32> = None;
            for v in operands {
                for i in integers(interp, v)? {
                    if i == NA_INTEGER {
                        if na_rm {
                            continue;
                        }
                        return Ok(Vector::integer(vec![NA_INTEGER]));
                    }
                    if best.map_or(true, |b| better(i as f64, b as f64)) {
                        best = Some(i);
                    }
                }
            }
            match best {
                Some(best) => Ok(Vector::integer(vec![best])),
                None => Ok(empty_extreme(interp, name, is_max)),
            }
        }
        _ => {
            let mut best: Option<f64> = None;
            let mut saw_na = false;
            let mut saw_nan = false;
            for v in operands {
                for x in doubles(interp, v)? {
                    if x.is_nan() {
                        if is_na_real(x) {
                            saw_na = true;
                        } else {
                            saw_nan = true;
                        }
                        continue;
                    }
                    if best.map_or(true, |b| better(x, b)) {
                        best = Some(x);
                    }
                }
            }
            if !na_rm && saw_na {
                return Ok(Vector::double(vec![na_real()]));
            }
            if !na_rm && saw_nan {
                return Ok(Vector::double(vec![f64::NAN]));
            }
            match best {
                Some(best) => Ok(Vector::double(vec![best])),
                None => Ok(empty_extreme(interp, name, is_max)),
            }
        }
    }
}

fn empty_extreme(interp: &mut Interpreter, name: &str, is_max: bool) -> Vector {
    let (value, text) = if is_max {
        (f64::NEG_INFINITY, "-Inf")
    } else {
        (f64::INFINITY, "Inf")
    };
    interp.warning(Message::NoNonMissingReturning(name.to_string(), text.to_string()));
    Vector::double(vec![value])
}

// ============================================================================
// mean
// ============================================================================

fn builtin_mean(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let na_rm = na_rm(interp, args)?;
    let x = match args.get("x") {
        Value::Vector(v) if v.kind().is_numeric() || v.kind() == Kind::Complex => v,
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        _ => {
            interp.warning(Message::NotNumericReturningNa);
            return Ok(Value::dbl(na_real()));
        }
    };
    if x.kind() == Kind::Complex {
        let values: Vec<Complex64> = complexes(interp, &x)?
            .into_iter()
            .filter(|z| !(na_rm && (z.re.is_nan() || z.im.is_nan())))
            .collect();
        let re = corrected_mean(&values.iter().map(|z| z.re).collect::<Vec<_>>());
        let im = corrected_mean(&values.iter().map(|z| z.im).collect::<Vec<_>>());
        return Ok(Value::cplx(re, im));
    }
    let mut values = doubles(interp, &x)?;
    if na_rm {
        values.retain(|v| !v.is_nan());
    } else if values.iter().any(|&v| is_na_real(v)) {
        return Ok(Value::dbl(na_real()));
    }
    Ok(Value::dbl(corrected_mean(&values)))
}

/// Mean with a second pass correcting the rounding error of the first
pub(crate) fn corrected_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if !mean.is_finite() {
        return mean;
    }
    let correction = values.iter().map(|&v| v - mean).sum::<f64>() / n;
    mean + correction
}

#[cfg(test)]
mod tests {
    use crate::builtins::testing::{eval, eval_in};
    use crate::error::Message;
    use crate::interpreter::Interpreter;
    use crate::na::NA_INTEGER;
    use crate::value::{Value, Vector};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("all()", Value::lgl(true))]
    #[case("all(NULL)", Value::lgl(true))]
    #[case("any()", Value::lgl(false))]
    #[case("all(TRUE, NA)", Value::na_logical())]
    #[case("all(TRUE, NA, na.rm = TRUE)", Value::lgl(true))]
    #[case("any(FALSE, NA)", Value::na_logical())]
    #[case("any(NA, TRUE)", Value::lgl(true))]
    #[case("all(FALSE, stop(\"not forced\"))", Value::lgl(false))]
    #[case("any(TRUE, stop(\"not forced\"))", Value::lgl(true))]
    fn test_any_all(#[case] source: &str, #[case] expected: Value) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[test]
    fn test_any_all_errors_and_warnings() {
        assert_eq!(
            eval("any(\"a\")").unwrap_err().message,
            Message::InvalidTypeOfArgument("character".to_string())
        );
        let mut it = Interpreter::new();
        assert_eq!(eval_in(&mut it, "any(0.5)").unwrap(), Value::lgl(true));
        assert_eq!(
            it.ctx.warnings()[0].message,
            Message::CoercingToLogical("double".to_string())
        );
    }

    #[rstest]
    #[case("sum(1:4)", Value::int(10))]
    #[case("sum(TRUE, TRUE)", Value::int(2))]
    #[case("sum(1, 2L)", Value::dbl(3.0))]
    #[case("sum()", Value::int(0))]
    #[case("sum(1L, NA)", Value::int(NA_INTEGER))]
    #[case("sum(1L, NA, na.rm = TRUE)", Value::int(1))]
    #[case("sum(1i, 2)", Value::cplx(2.0, 1.0))]
    #[case("prod(1:4)", Value::dbl(24.0))]
    #[case("prod()", Value::dbl(1.0))]
    #[case("max(1:3, 2.5)", Value::dbl(3.0))]
    #[case("min(4L, 2L)", Value::int(2))]
    #[case("max(\"apple\", \"pear\")", Value::str("pear"))]
    #[case("max(NA, 1, na.rm = TRUE)", Value::dbl(1.0))]
    #[case("mean(c(1, 2, 3, 4))", Value::dbl(2.5))]
    #[case("mean(c(1L, NA), na.rm = TRUE)", Value::dbl(1.0))]
    fn test_summaries(#[case] source: &str, #[case] expected: Value) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[test]
    fn test_sum_integer_overflow() {
        let mut it = Interpreter::new();
        let out = eval_in(&mut it, "sum(2147483647L, 1L)").unwrap();
        assert_eq!(out, Value::int(NA_INTEGER));
        assert_eq!(it.ctx.warnings()[0].message, Message::IntegerOverflowSum);
    }

    #[test]
    fn test_max_na_beats_nan() {
        let out = eval("is.na(max(NaN, NA))").unwrap();
        assert_eq!(out, Value::lgl(true));
        let out = eval("is.nan(max(NaN, NA))").unwrap();
        assert_eq!(out, Value::lgl(false));
    }

    #[test]
    fn test_empty_max_min() {
        let mut it = Interpreter::new();
        assert_eq!(eval_in(&mut it, "max(numeric(0))").unwrap(), Value::dbl(f64::NEG_INFINITY));
        assert_eq!(eval_in(&mut it, "min()").unwrap(), Value::dbl(f64::INFINITY));
        let texts: Vec<String> = it.ctx.warnings().iter().map(|w| w.message.to_string()).collect();
        assert_eq!(
            texts,
            vec![
                "no non-missing arguments to max; returning -Inf".to_string(),
                "no non-missing arguments to min; returning Inf".to_string(),
            ]
        );
        assert_eq!(
            eval("max(character(0))").unwrap_err().message,
            Message::NoNonMissing("max".to_string())
        );
    }

    #[test]
    fn test_range() {
        assert_eq!(eval("range(c(3, 1, 2))").unwrap(), Value::Vector(Vector::double(vec![1.0, 3.0])));
        assert_eq!(eval("range(5L, 2L)").unwrap(), Value::Vector(Vector::integer(vec![2, 5])));
    }

    #[test]
    fn test_mean_edge_cases() {
        assert_eq!(eval("is.nan(mean(numeric(0)))").unwrap(), Value::lgl(true));
        assert_eq!(eval("is.na(mean(c(1, NA)))").unwrap(), Value::lgl(true));
        let mut it = Interpreter::new();
        eval_in(&mut it, "mean(\"a\")").unwrap();
        assert_eq!(it.ctx.warnings()[0].message, Message::NotNumericReturningNa);
    }
}
