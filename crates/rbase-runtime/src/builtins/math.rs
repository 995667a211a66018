//! Elementwise mathematical functions
//!
//! One-argument functions keep every attribute of `x`. A NaN produced from a
//! non-NaN input raises one `NaNs produced` warning per call.

use crate::args::Args;
use crate::builtins::{complexes, copy_names, doubles, recycled_length, BuiltinSpec};
use crate::casts::{self, to_double};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::{is_na_real, na_real, NA_INTEGER};
use crate::value::{Kind, Value, Vector, VectorData};
use num::complex::Complex64;
use std::f64::consts::PI;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("abs", &["x"], builtin_abs),
    BuiltinSpec::eager("sqrt", &["x"], builtin_sqrt),
    BuiltinSpec::eager("exp", &["x"], builtin_exp),
    BuiltinSpec::eager("floor", &["x"], builtin_floor),
    BuiltinSpec::eager("ceiling", &["x"], builtin_ceiling),
    BuiltinSpec::eager("trunc", &["x", "..."], builtin_trunc),
    BuiltinSpec::eager("sign", &["x"], builtin_sign),
    BuiltinSpec::eager("log", &["x", "base"], builtin_log),
    BuiltinSpec::eager("round", &["x", "digits"], builtin_round),
    BuiltinSpec::eager("signif", &["x", "digits"], builtin_signif),
    BuiltinSpec::eager("choose", &["n", "k"], builtin_choose),
    BuiltinSpec::eager("lchoose", &["n", "k"], builtin_lchoose),
    BuiltinSpec::eager("factorial", &["x"], builtin_factorial),
    BuiltinSpec::eager("gamma", &["x"], builtin_gamma),
    BuiltinSpec::eager("lgamma", &["x"], builtin_lgamma),
    BuiltinSpec::eager("beta", &["a", "b"], builtin_beta),
    BuiltinSpec::eager("lbeta", &["a", "b"], builtin_lbeta),
];

// ============================================================================
// Operand handling
// ============================================================================

fn numeric_operand(value: Value, name: &str) -> RResult<Vector> {
    match value {
        Value::Vector(v) if v.kind().is_numeric() || v.kind() == Kind::Complex => Ok(v),
        Value::Missing => Err(Message::ArgumentMissing(name.to_string()).into()),
        _ => Err(Message::NonNumericMath.into()),
    }
}

/// Result storage with the attributes of `x`
fn keep_attributes(x: &Vector, data: VectorData) -> Value {
    let mut out = Vector::new(data);
    out.set_attributes(x.attributes().cloned());
    Value::Vector(out)
}

fn warn_new_nans(interp: &mut Interpreter, input: &[f64], output: &[f64]) {
    if input.iter().zip(output).any(|(x, y)| !x.is_nan() && y.is_nan()) {
        interp.warning(Message::NansProduced);
    }
}

/// Apply `f` to the doubles of `x`; complex input goes through `fc`
fn math1(
    interp: &mut Interpreter,
    args: &Args,
    f: fn(f64) -> f64,
    fc: Option<fn(Complex64) -> Complex64>,
) -> RResult<Value> {
    let x = numeric_operand(args.get("x"), "x")?;
    if x.kind() == Kind::Complex {
        let fc = fc.ok_or(Message::UnimplementedComplexFunction)?;
        let values: Vec<Complex64> = complexes(interp, &x)?.into_iter().map(fc).collect();
        return Ok(keep_attributes(&x, VectorData::Complex(values)));
    }
    let input = doubles(interp, &x)?;
    let output: Vec<f64> = input.iter().map(|&v| f(v)).collect();
    warn_new_nans(interp, &input, &output);
    Ok(keep_attributes(&x, VectorData::Double(output)))
}

fn builtin_abs(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = numeric_operand(args.get("x"), "x")?;
    match x.data() {
        VectorData::Integer(v) => {
            let data = v
                .iter()
                .map(|&i| if i == NA_INTEGER { NA_INTEGER } else { i.abs() })
                .collect();
            Ok(keep_attributes(&x, VectorData::Integer(data)))
        }
        VectorData::Logical(v) => {
            let data = v.iter().map(|b| b.map_or(NA_INTEGER, i32::from)).collect();
            Ok(keep_attributes(&x, VectorData::Integer(data)))
        }
        VectorData::Complex(z) => {
            let data = z.iter().map(|z| if z.re.is_nan() { z.re } else { z.norm() }).collect();
            Ok(keep_attributes(&x, VectorData::Double(data)))
        }
        _ => math1(interp, args, f64::abs, None),
    }
}

fn builtin_sqrt(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math1(interp, args, f64::sqrt, Some(Complex64::sqrt))
}

fn builtin_exp(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math1(interp, args, f64::exp, Some(Complex64::exp))
}

fn builtin_floor(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math1(interp, args, f64::floor, None)
}

fn builtin_ceiling(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math1(interp, args, f64::ceil, None)
}

fn builtin_trunc(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math1(interp, args, f64::trunc, None)
}

fn builtin_sign(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math1(
        interp,
        args,
        |v| {
            if v.is_nan() || v == 0.0 {
                v
            } else {
                v.signum()
            }
        },
        None,
    )
}

fn builtin_log(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let base = casts::double_scalar("base")
        .default_if_missing(Value::dbl(std::f64::consts::E))
        .apply(interp, args.get("base"))?;
    let base = to_double(&base).unwrap_or(std::f64::consts::E);

    let x = numeric_operand(args.get("x"), "x")?;
    if x.kind() == Kind::Complex {
        let ln_base = Complex64::new(base, 0.0).ln();
        let values = complexes(interp, &x)?.into_iter().map(|z| z.ln() / ln_base).collect();
        return Ok(keep_attributes(&x, VectorData::Complex(values)));
    }

    let input = doubles(interp, &x)?;
    let output: Vec<f64> = input.iter().map(|&v| log_base(v, base)).collect();
    warn_new_nans(interp, &input, &output);
    Ok(keep_attributes(&x, VectorData::Double(output)))
}

fn log_base(x: f64, base: f64) -> f64 {
    if is_na_real(x) {
        return x;
    }
    if base == std::f64::consts::E {
        x.ln()
    } else if base == 10.0 {
        x.log10()
    } else if base == 2.0 {
        x.log2()
    } else {
        x.ln() / base.ln()
    }
}

// ============================================================================
// Rounding
// ============================================================================

/// Round to the nearest integer, ties to even
pub(crate) fn round_half_even(x: f64) -> f64 {
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        x.round()
    }
}

fn round_digits(x: f64, digits: i32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    if digits > 308 {
        return x;
    }
    if digits == 0 {
        return round_half_even(x);
    }
    if digits > 0 {
        let p = 10f64.powi(digits);
        let y = x * p;
        if !y.is_finite() {
            return x;
        }
        round_half_even(y) / p
    } else {
        let p = 10f64.powi(-digits);
        round_half_even(x / p) * p
    }
}

fn signif_digits(x: f64, digits: i32) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    let digits = digits.clamp(1, 22);
    let magnitude = x.abs().log10().floor() as i32;
    round_digits(x, digits - 1 - magnitude)
}

fn digits_arg(interp: &mut Interpreter, args: &Args, default: i32) -> RResult<Option<i32>> {
    let digits = casts::int_scalar("digits")
        .default_if_missing(Value::int(default))
        .apply(interp, args.get("digits"))?;
    Ok(casts::to_int(&digits).filter(|&d| d != NA_INTEGER))
}

fn rounding(interp: &mut Interpreter, args: &Args, default: i32, f: fn(f64, i32) -> f64) -> RResult<Value> {
    let x = numeric_operand(args.get("x"), "x")?;
    let digits = digits_arg(interp, args, default)?;
    if x.kind() == Kind::Complex {
        let values = complexes(interp, &x)?
            .into_iter()
            .map(|z| match digits {
                Some(d) => Complex64::new(f(z.re, d), f(z.im, d)),
                None => Complex64::new(na_real(), na_real()),
            })
            .collect();
        return Ok(keep_attributes(&x, VectorData::Complex(values)));
    }
    let values = doubles(interp, &x)?
        .into_iter()
        .map(|v| match digits {
            Some(d) => f(v, d),
            None => na_real(),
        })
        .collect();
    Ok(keep_attributes(&x, VectorData::Double(values)))
}

fn builtin_round(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    rounding(interp, args, 0, round_digits)
}

fn builtin_signif(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    rounding(interp, args, 6, signif_digits)
}

// ============================================================================
// Gamma family
// ============================================================================

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

fn lanczos_sum(x: f64) -> f64 {
    LANCZOS[1..]
        .iter()
        .enumerate()
        .fold(LANCZOS[0], |acc, (i, c)| acc + c / (x + i as f64 + 1.0))
}

fn is_nonpositive_integer(x: f64) -> bool {
    x <= 0.0 && x == x.floor()
}

pub(crate) fn gamma(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }
    if is_nonpositive_integer(x) || x == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if x > 171.62 {
        return f64::INFINITY;
    }
    if x == x.floor() && x <= 171.0 {
        return (2..x as u32).fold(1.0, |acc, k| acc * k as f64);
    }
    if x < 0.5 {
        return PI / ((PI * x).sin() * gamma(1.0 - x));
    }
    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    (2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * lanczos_sum(x)
}

/// `log(|gamma(x)|)`
pub(crate) fn lgamma(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }
    if is_nonpositive_integer(x) || x.is_infinite() {
        return f64::INFINITY;
    }
    if x == 1.0 || x == 2.0 {
        return 0.0;
    }
    if x < 0.5 {
        return (PI / (PI * x).sin().abs()).ln() - lgamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + lanczos_sum(x).ln()
}

/// Sign of `gamma(x)`
fn gamma_sign(x: f64) -> f64 {
    if x > 0.0 || x == x.floor() {
        1.0
    } else if (-x).floor() as i64 % 2 == 0 {
        -1.0
    } else {
        1.0
    }
}

pub(crate) fn lbeta(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return a + b;
    }
    let (p, q) = (a.min(b), a.max(b));
    if p < 0.0 {
        f64::NAN
    } else if p == 0.0 {
        f64::INFINITY
    } else if q.is_infinite() {
        f64::NEG_INFINITY
    } else {
        lgamma(p) + lgamma(q) - lgamma(p + q)
    }
}

fn beta(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return a + b;
    }
    if a < 0.0 || b < 0.0 {
        return f64::NAN;
    }
    if a == 0.0 || b == 0.0 {
        return f64::INFINITY;
    }
    if a + b < 171.61 {
        gamma(a) * gamma(b) / gamma(a + b)
    } else {
        lbeta(a, b).exp()
    }
}

fn builtin_factorial(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math1(interp, args, |v| gamma(v + 1.0), None)
}

fn builtin_gamma(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math1(interp, args, gamma, None)
}

fn builtin_lgamma(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math1(interp, args, lgamma, None)
}

// ============================================================================
// Two-argument functions
// ============================================================================

/// Recycle two numeric operands through `f`; names come from the longer one
fn math2(
    interp: &mut Interpreter,
    args: &Args,
    names: [&str; 2],
    mut f: impl FnMut(&mut Interpreter, f64, f64) -> f64,
) -> RResult<Value> {
    let a = numeric_operand(args.get(names[0]), names[0])?;
    let b = numeric_operand(args.get(names[1]), names[1])?;
    if a.kind() == Kind::Complex || b.kind() == Kind::Complex {
        return Err(Message::NonNumericMath.into());
    }
    let xs = doubles(interp, &a)?;
    let ys = doubles(interp, &b)?;
    let n = recycled_length(interp, &[xs.len(), ys.len()]);
    let mut produced_nan = false;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let (x, y) = (xs[i % xs.len()], ys[i % ys.len()]);
        let r = if is_na_real(x) || is_na_real(y) {
            na_real()
        } else if x.is_nan() || y.is_nan() {
            f64::NAN
        } else {
            let r = f(interp, x, y);
            produced_nan |= r.is_nan();
            r
        };
        out.push(r);
    }
    if produced_nan {
        interp.warning(Message::NansProduced);
    }
    let mut result = Vector::new(VectorData::Double(out));
    let source = if a.len() >= b.len() { &a } else { &b };
    copy_names(source, &mut result);
    Ok(Value::Vector(result))
}

fn builtin_beta(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math2(interp, args, ["a", "b"], |_, a, b| beta(a, b))
}

fn builtin_lbeta(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math2(interp, args, ["a", "b"], |_, a, b| lbeta(a, b))
}

// ============================================================================
// Binomial coefficients
// ============================================================================

const K_SMALL_MAX: f64 = 30.0;

fn is_int(x: f64) -> bool {
    (x - round_half_even(x)).abs() <= 1e-7 * x.abs().max(1.0)
}

fn lfastchoose(n: f64, k: f64) -> f64 {
    -(n + 1.0).ln() - lbeta(n - k + 1.0, k + 1.0)
}

/// `log|choose(n, k)|` and its sign, for `n < k - 1`
fn lfastchoose2(n: f64, k: f64) -> (f64, f64) {
    let r = lgamma(n - k + 1.0);
    let sign = gamma_sign(n - k + 1.0);
    (lgamma(n + 1.0) - lgamma(k + 1.0) - r, sign)
}

/// Round `k`, warning when that changes it
fn rounded_k(interp: &mut Interpreter, k: f64) -> f64 {
    let r = round_half_even(k);
    if (k - r).abs() > 1e-7 {
        interp.warning(Message::ChooseRoundedK(format!("{:.2}", k), format!("{:.0}", r)));
    }
    r
}

pub(crate) fn choose(n: f64, k: f64) -> f64 {
    let mut k = k;
    if k < K_SMALL_MAX {
        if n - k < k && n >= 0.0 && is_int(n) {
            k = round_half_even(n - k);
        }
        if k < 0.0 {
            return 0.0;
        }
        if k == 0.0 {
            return 1.0;
        }
        let mut r = n;
        let mut j = 2.0;
        while j <= k {
            r *= (n - j + 1.0) / j;
            j += 1.0;
        }
        return if is_int(n) { round_half_even(r) } else { r };
    }
    if n < 0.0 {
        let r = choose(-n + k - 1.0, k);
        return if k % 2.0 == 1.0 { -r } else { r };
    }
    if is_int(n) {
        let n = round_half_even(n);
        if n < k {
            return 0.0;
        }
        if n - k < K_SMALL_MAX {
            return choose(n, n - k);
        }
        return round_half_even(lfastchoose(n, k).exp());
    }
    if n < k - 1.0 {
        let (r, sign) = lfastchoose2(n, k);
        return sign * r.exp();
    }
    lfastchoose(n, k).exp()
}

pub(crate) fn lchoose(n: f64, k: f64) -> f64 {
    if k < 2.0 {
        if k < 0.0 {
            return f64::NEG_INFINITY;
        }
        if k == 0.0 {
            return 0.0;
        }
        return n.abs().ln();
    }
    if n < 0.0 {
        return lchoose(-n + k - 1.0, k);
    }
    if is_int(n) {
        let n = round_half_even(n);
        if n < k {
            return f64::NEG_INFINITY;
        }
        if n - k < 2.0 {
            return lchoose(n, n - k);
        }
        return lfastchoose(n, k);
    }
    if n < k - 1.0 {
        return lfastchoose2(n, k).0;
    }
    lfastchoose(n, k)
}

fn builtin_choose(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math2(interp, args, ["n", "k"], |interp, n, k| {
        let k = rounded_k(interp, k);
        choose(n, k)
    })
}

fn builtin_lchoose(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    math2(interp, args, ["n", "k"], |interp, n, k| {
        let k = rounded_k(interp, k);
        lchoose(n, k)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::{eval, eval_in};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn num(source: &str) -> Vec<f64> {
        match eval(source).unwrap() {
            Value::Vector(v) => match v.data() {
                VectorData::Double(d) => d.clone(),
                other => panic!("expected double, got {:?}", other.kind()),
            },
            other => panic!("expected vector, got {:?}", other),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[rstest]
    #[case(0.5, 0.0)]
    #[case(1.5, 2.0)]
    #[case(2.5, 2.0)]
    #[case(-0.5, -0.0)]
    #[case(-1.5, -2.0)]
    #[case(2.4, 2.0)]
    #[case(2.6, 3.0)]
    fn test_round_half_even(#[case] x: f64, #[case] expected: f64) {
        assert_eq!(round_half_even(x), expected);
    }

    #[rstest]
    #[case("round(2.5)", vec![2.0])]
    #[case("round(-1.5)", vec![-2.0])]
    #[case("round(1234.5678, 2)", vec![1234.57])]
    #[case("round(1234.5678, -2)", vec![1200.0])]
    #[case("signif(123456, 2)", vec![120000.0])]
    #[case("signif(0.000123456, 3)", vec![0.000123])]
    #[case("floor(c(-1.5, 1.5))", vec![-2.0, 1.0])]
    #[case("ceiling(c(-1.5, 1.5))", vec![-1.0, 2.0])]
    #[case("trunc(c(-1.5, 1.5))", vec![-1.0, 1.0])]
    #[case("sign(c(-3, 0, 2))", vec![-1.0, 0.0, 1.0])]
    #[case("log(100, 10)", vec![2.0])]
    #[case("log(8, base = 2)", vec![3.0])]
    #[case("sqrt(c(4, 9))", vec![2.0, 3.0])]
    fn test_elementwise(#[case] source: &str, #[case] expected: Vec<f64>) {
        let out = num(source);
        assert_eq!(out.len(), expected.len());
        for (a, b) in out.iter().zip(&expected) {
            assert!(close(*a, *b), "{}: {} != {}", source, a, b);
        }
    }

    #[test]
    fn test_abs_keeps_integers() {
        assert_eq!(eval("abs(-3:1)").unwrap(), Value::Vector(Vector::integer(vec![3, 2, 1, 0, 1])));
        assert_eq!(eval("abs(-2.5)").unwrap(), Value::dbl(2.5));
    }

    #[test]
    fn test_sqrt_negative_warns() {
        let mut it = Interpreter::new();
        let out = eval_in(&mut it, "sqrt(-1)").unwrap();
        assert!(matches!(out.as_vector().unwrap().data(), VectorData::Double(d) if d[0].is_nan()));
        let warnings = it.ctx.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].to_string(), "Warning in sqrt(-1) : NaNs produced");
    }

    #[test]
    fn test_non_numeric_errors() {
        let err = eval("sqrt(\"a\")").unwrap_err();
        assert_eq!(err.to_string(), "Error in sqrt(\"a\") : non-numeric argument to mathematical function");
    }

    #[test]
    fn test_attributes_kept() {
        let out = eval("x <- c(a = 1, b = 4)\nnames(sqrt(x))").unwrap();
        assert_eq!(out, Value::Vector(Vector::strings(["a", "b"])));
    }

    #[rstest]
    #[case(5.0, 2.0, 10.0)]
    #[case(5.0, 0.0, 1.0)]
    #[case(5.0, -1.0, 0.0)]
    #[case(-3.0, 2.0, 6.0)]
    #[case(0.5, 2.0, -0.125)]
    #[case(50.0, 30.0, 47_129_212_243_960.0)]
    #[case(4.0, 5.0, 0.0)]
    fn test_choose(#[case] n: f64, #[case] k: f64, #[case] expected: f64) {
        assert!(close(choose(n, k), expected), "choose({}, {}) = {}", n, k, choose(n, k));
    }

    #[test]
    fn test_choose_large_k_negative_n() {
        // (-1)^k choose(-n + k - 1, k) with k odd
        let direct = choose(-2.0, 31.0);
        assert!(close(direct, -32.0));
    }

    #[test]
    fn test_lchoose_matches_log_choose() {
        for (n, k) in [(10.0, 3.0), (100.0, 40.0), (7.5, 2.0)] {
            assert!(close(lchoose(n, k), choose(n, k).abs().ln()), "lchoose({}, {})", n, k);
        }
        assert_eq!(lchoose(3.0, 5.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_choose_rounds_k_with_warning() {
        let mut it = Interpreter::new();
        let out = eval_in(&mut it, "choose(5, 2.5)").unwrap();
        assert_eq!(out, Value::dbl(10.0));
        assert_eq!(
            it.ctx.warnings()[0].message,
            Message::ChooseRoundedK("2.50".to_string(), "2".to_string())
        );

        let mut it = Interpreter::new();
        eval_in(&mut it, "choose(5, 2)").unwrap();
        assert!(it.ctx.warnings().is_empty());
    }

    #[test]
    fn test_choose_na() {
        let out = num("choose(c(NA, 5), 2)");
        assert!(is_na_real(out[0]));
        assert_eq!(out[1], 10.0);
    }

    #[rstest]
    #[case(1.0, 1.0)]
    #[case(5.0, 24.0)]
    #[case(0.5, PI.sqrt())]
    #[case(-0.5, -2.0 * PI.sqrt())]
    #[case(10.3, 716_430.689_062_376_5)]
    fn test_gamma(#[case] x: f64, #[case] expected: f64) {
        assert!((gamma(x) - expected).abs() <= 1e-10 * expected.abs(), "gamma({}) = {}", x, gamma(x));
    }

    #[test]
    fn test_gamma_poles() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "gamma(0)").unwrap();
        assert_eq!(it.ctx.warnings()[0].message, Message::NansProduced);
        assert_eq!(lgamma(0.0), f64::INFINITY);
        assert!(close(lgamma(100.0), 359.134_205_369_575_4));
    }

    #[test]
    fn test_factorial_and_beta() {
        assert_eq!(num("factorial(c(0, 5))"), vec![1.0, 120.0]);
        assert!(close(num("beta(2, 3)")[0], 1.0 / 12.0));
        assert!(close(num("lbeta(2, 3)")[0], (1.0f64 / 12.0).ln()));
    }
}
