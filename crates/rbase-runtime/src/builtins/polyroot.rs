//! Polynomial roots by Aberth–Ehrlich simultaneous iteration

use crate::args::Args;
use crate::builtins::{complexes, BuiltinSpec};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::value::{Kind, Value, Vector, VectorData};
use num::complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[BuiltinSpec::eager("polyroot", &["z"], builtin_polyroot)];

const MAX_ITERATIONS: usize = 500;

fn builtin_polyroot(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let z = match args.get("z") {
        Value::Vector(v) if v.kind().is_numeric() || v.kind() == Kind::Complex => v,
        Value::Null => Vector::empty(Kind::Complex),
        Value::Missing => return Err(Message::ArgumentMissing("z".to_string()).into()),
        _ => return Err(Message::InvalidArgumentType.into()),
    };
    let coefficients = complexes(interp, &z)?;
    if coefficients.iter().any(|c| !c.re.is_finite() || !c.im.is_finite()) {
        return Err(Message::InvalidPolynomialCoefficient.into());
    }
    let roots = polyroot(&coefficients)?;
    Ok(Value::Vector(Vector::new(VectorData::Complex(roots))))
}

/// Roots of `c[0] + c[1] x + ... + c[n] x^n`, where `n` is the highest index
/// with a nonzero coefficient
pub(crate) fn polyroot(coefficients: &[Complex64]) -> RResult<Vec<Complex64>> {
    let zero = Complex64::new(0.0, 0.0);
    let Some(degree) = coefficients.iter().rposition(|c| *c != zero) else {
        return Ok(Vec::new());
    };
    if degree == 0 {
        return Ok(Vec::new());
    }

    // zero roots split off exactly
    let zeros = coefficients.iter().take_while(|c| **c == zero).count();
    let lead = coefficients[degree];
    let monic: Vec<Complex64> = coefficients[zeros..=degree].iter().map(|c| c / lead).collect();

    let mut roots = vec![zero; zeros];
    roots.extend(aberth(&monic)?);
    Ok(roots)
}

/// Horner evaluation of `p(x)` and `p'(x)`, plus the rounding-error bound
/// `sum |c_k| |x|^k`
fn evaluate(c: &[Complex64], x: Complex64) -> (Complex64, Complex64, f64) {
    let mut p = Complex64::new(0.0, 0.0);
    let mut dp = Complex64::new(0.0, 0.0);
    let mut bound = 0.0;
    let r = x.norm();
    for &coef in c.iter().rev() {
        dp = dp * x + p;
        p = p * x + coef;
        bound = bound * r + coef.norm();
    }
    (p, dp, bound)
}

/// Initial guesses on a circle whose radius bounds the root moduli
fn initial_guesses(monic: &[Complex64]) -> Vec<Complex64> {
    let n = monic.len() - 1;
    let radius = (1..=n)
        .map(|k| monic[n - k].norm().powf(1.0 / k as f64))
        .fold(0.0, f64::max)
        .max(f64::MIN_POSITIVE);
    (0..n)
        .map(|k| Complex64::from_polar(radius, 2.0 * PI * k as f64 / n as f64 + 0.4))
        .collect()
}

fn aberth(monic: &[Complex64]) -> RResult<Vec<Complex64>> {
    let n = monic.len() - 1;
    let mut z = initial_guesses(monic);
    let mut done = vec![false; n];

    for iteration in 0..MAX_ITERATIONS {
        for i in 0..n {
            if done[i] {
                continue;
            }
            let (p, dp, bound) = evaluate(monic, z[i]);
            if p.norm() <= 4.0 * f64::EPSILON * bound {
                done[i] = true;
                continue;
            }
            let ratio = p / dp;
            let repulsion: Complex64 = (0..n)
                .filter(|&j| j != i)
                .map(|j| Complex64::new(1.0, 0.0) / (z[i] - z[j]))
                .sum();
            let step = ratio / (Complex64::new(1.0, 0.0) - ratio * repulsion);
            if !step.re.is_finite() || !step.im.is_finite() {
                // stationary point or coincident guesses; nudge off it
                let scale = 1.0 + z[i].norm();
                let nudge = f64::EPSILON.sqrt();
                z[i] += Complex64::new(nudge, nudge) * scale;
                continue;
            }
            z[i] -= step;
            if step.norm() <= f64::EPSILON * z[i].norm() {
                done[i] = true;
            }
        }
        if done.iter().all(|&d| d) {
            debug!(iterations = iteration + 1, degree = n, "polyroot converged");
            return Ok(z);
        }
    }
    Err(Message::RootFindingFailed.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::eval;
    use pretty_assertions::assert_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    /// Roots compared as a multiset, within tolerance
    fn assert_roots(actual: Vec<Complex64>, expected: &[Complex64]) {
        assert_eq!(actual.len(), expected.len());
        let mut remaining = actual.clone();
        for e in expected {
            let hit = remaining.iter().position(|a| (a - e).norm() < 1e-6);
            match hit {
                Some(i) => {
                    remaining.swap_remove(i);
                }
                None => panic!("{:?} has no root near {:?}", actual, e),
            }
        }
    }

    #[test]
    fn test_quadratic() {
        // x^2 - 3x + 2
        assert_roots(polyroot(&[c(2.0, 0.0), c(-3.0, 0.0), c(1.0, 0.0)]).unwrap(), &[c(1.0, 0.0), c(2.0, 0.0)]);
    }

    #[test]
    fn test_complex_pair() {
        // x^2 + 1
        assert_roots(polyroot(&[c(1.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)]).unwrap(), &[c(0.0, -1.0), c(0.0, 1.0)]);
    }

    #[test]
    fn test_double_root_and_zero_root() {
        // x (x - 1)^2 = x^3 - 2x^2 + x
        let roots = polyroot(&[c(0.0, 0.0), c(1.0, 0.0), c(-2.0, 0.0), c(1.0, 0.0)]).unwrap();
        assert_roots(roots, &[c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0)]);
    }

    #[test]
    fn test_trailing_zeros_ignored() {
        // 6 + 5x + x^2 with zero high-order coefficients
        let roots = polyroot(&[c(6.0, 0.0), c(5.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)]).unwrap();
        assert_roots(roots, &[c(-3.0, 0.0), c(-2.0, 0.0)]);
    }

    #[test]
    fn test_high_degree_roots_of_unity() {
        // x^8 - 1
        let mut coefficients = vec![c(0.0, 0.0); 9];
        coefficients[0] = c(-1.0, 0.0);
        coefficients[8] = c(1.0, 0.0);
        let roots = polyroot(&coefficients).unwrap();
        assert_eq!(roots.len(), 8);
        for r in roots {
            assert!((r.powu(8) - c(1.0, 0.0)).norm() < 1e-8);
        }
    }

    #[test]
    fn test_builtin() {
        assert_eq!(eval("polyroot(5)").unwrap(), Value::Vector(Vector::empty(Kind::Complex)));
        assert_eq!(eval("length(polyroot(c(6, 5, 1)))").unwrap(), Value::int(2));
        assert_eq!(eval("polyroot(\"a\")").unwrap_err().message, Message::InvalidArgumentType);
        assert_eq!(eval("polyroot(c(1, Inf))").unwrap_err().message, Message::InvalidPolynomialCoefficient);
        assert_eq!(eval("polyroot(c(1, NA))").unwrap_err().message, Message::InvalidPolynomialCoefficient);
    }
}
