//! Random numbers: `set.seed`, `runif`, `sample`, `sample2`
//!
//! The generator is taken out of the context before drawing and put back
//! afterwards, also when the builtin fails part-way.

use crate::args::Args;
use crate::builtins::order::reorder;
use crate::builtins::{doubles, int_vector, BuiltinSpec};
use crate::casts::{self, is_numeric_like, to_bool, to_double};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::{is_na_real, NA_INTEGER};
use crate::value::{Value, Vector, VectorData};
use rand::rngs::StdRng;
use rand::RngExt;
use std::collections::HashSet;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("set.seed", &["seed"], builtin_set_seed).invisible(),
    BuiltinSpec::eager("runif", &["n", "min", "max"], builtin_runif),
    BuiltinSpec::eager("sample", &["x", "size", "replace", "prob"], builtin_sample),
    BuiltinSpec::eager("sample2", &["n", "size"], builtin_sample2),
];

/// Run `draw` with the context generator
fn with_rng<T>(interp: &mut Interpreter, draw: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut rng = interp.ctx.rng.fetch();
    let out = draw(&mut rng);
    interp.ctx.rng.store(rng);
    out
}

fn builtin_set_seed(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let seed = casts::Cast::new("seed")
        .must_not_be_missing()
        .null_passes()
        .must_be(is_numeric_like, Message::InvalidSeed)
        .as_double()
        .must(|v| !v.is_empty(), Message::InvalidSeed)
        .first_element()
        .apply(interp, args.get("seed"))?;
    match to_double(&seed) {
        None => interp.ctx.rng.reset(),
        Some(s) if is_na_real(s) || s.is_nan() => interp.ctx.rng.reset(),
        Some(s) if s.is_finite() && s.abs() <= i32::MAX as f64 => interp.ctx.rng.set_seed(s.trunc() as i64),
        Some(_) => return Err(Message::InvalidSeed.into()),
    }
    Ok(Value::Null)
}

// ============================================================================
// runif
// ============================================================================

/// Count argument: a scalar, or the length of a longer vector
fn count_arg(interp: &mut Interpreter, value: Value) -> RResult<usize> {
    let v = match value {
        Value::Vector(v) => v,
        Value::Missing => return Err(Message::ArgumentMissing("n".to_string()).into()),
        _ => return Err(Message::InvalidArguments.into()),
    };
    if v.len() != 1 {
        return Ok(v.len());
    }
    match doubles(interp, &v)?.first() {
        Some(&n) if n.is_finite() && n >= 0.0 && n <= i32::MAX as f64 => Ok(n as usize),
        _ => Err(Message::InvalidArguments.into()),
    }
}

fn builtin_runif(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let n = count_arg(interp, args.get("n"))?;
    let bound = |name: &'static str, default: f64| {
        casts::Cast::new(name)
            .default_if_missing(Value::dbl(default))
            .must_be(is_numeric_like, Message::InvalidArguments)
            .as_double()
    };
    let min = bound("min", 0.0).apply(interp, args.get("min"))?;
    let max = bound("max", 1.0).apply(interp, args.get("max"))?;
    let (min, max) = match (min.as_vector().map(Vector::data), max.as_vector().map(Vector::data)) {
        (Some(VectorData::Double(a)), Some(VectorData::Double(b))) => (a.clone(), b.clone()),
        _ => (Vec::new(), Vec::new()),
    };
    if n == 0 {
        return Ok(Value::Vector(Vector::double(Vec::new())));
    }
    if min.is_empty() || max.is_empty() {
        return Ok(Value::Vector(Vector::double(vec![f64::NAN; n])));
    }

    let mut produced_nan = false;
    let out = with_rng(interp, |rng| {
        (0..n)
            .map(|i| {
                let (a, b) = (min[i % min.len()], max[i % max.len()]);
                if !a.is_finite() || !b.is_finite() || b < a {
                    produced_nan = true;
                    f64::NAN
                } else if a == b {
                    a
                } else {
                    a + (b - a) * rng.random::<f64>()
                }
            })
            .collect()
    });
    if produced_nan {
        interp.warning(Message::NasProduced);
    }
    Ok(Value::Vector(Vector::double(out)))
}

// ============================================================================
// sample
// ============================================================================

/// Population description after resolving `x`
enum Population {
    /// `1:n`
    Range(usize),
    Elements(Vector),
}

impl Population {
    fn len(&self) -> usize {
        match self {
            Population::Range(n) => *n,
            Population::Elements(v) => v.len(),
        }
    }
}

fn population(interp: &mut Interpreter, x: Value) -> RResult<Population> {
    match x {
        Value::Vector(v) if v.len() == 1 && v.kind().is_numeric() => {
            let n = doubles(interp, &v)?[0];
            if n.is_nan() || n.is_infinite() {
                return Err(Message::InvalidFirstArgument.into());
            }
            if n >= 1.0 {
                if n > i32::MAX as f64 {
                    return Err(Message::InvalidFirstArgument.into());
                }
                Ok(Population::Range(n as usize))
            } else {
                Ok(Population::Elements(v))
            }
        }
        Value::Vector(v) => Ok(Population::Elements(v)),
        Value::Null => Ok(Population::Elements(Vector::empty(crate::value::Kind::Logical))),
        _ => Err(Message::InvalidFirstArgument.into()),
    }
}

/// Validated, non-normalised weights
fn probabilities(interp: &mut Interpreter, prob: &Vector, n: usize, size: usize, replace: bool) -> RResult<Vec<f64>> {
    let p = doubles(interp, prob)?;
    if p.len() != n {
        return Err(Message::IncorrectNumProbabilities.into());
    }
    if p.iter().any(|x| x.is_nan() || x.is_infinite()) {
        return Err(Message::NaInProbability.into());
    }
    if p.iter().any(|&x| x < 0.0) {
        return Err(Message::NegativeProbability.into());
    }
    let positive = p.iter().filter(|&&x| x > 0.0).count();
    if positive == 0 || (!replace && size > positive) {
        return Err(Message::TooFewPositiveProbabilities.into());
    }
    Ok(p)
}

/// Walk the cumulative weights to the bucket holding `u * total`
fn pick_weighted(weights: &[f64], total: f64, u: f64) -> usize {
    let target = u * total;
    let mut acc = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        acc += w;
        if target < acc && w > 0.0 {
            return i;
        }
    }
    // rounding left the target past the last bucket
    weights.iter().rposition(|&w| w > 0.0).unwrap_or(0)
}

/// Zero-based positions drawn from `0..n`
fn draw_positions(rng: &mut StdRng, n: usize, size: usize, replace: bool, weights: Option<&[f64]>) -> Vec<usize> {
    match (weights, replace) {
        (None, true) => (0..size).map(|_| rng.random_range(0..n)).collect(),
        (None, false) => {
            // partial Fisher-Yates
            let mut pool: Vec<usize> = (0..n).collect();
            for i in 0..size {
                let j = rng.random_range(i..n);
                pool.swap(i, j);
            }
            pool.truncate(size);
            pool
        }
        (Some(w), true) => {
            let total: f64 = w.iter().sum();
            (0..size).map(|_| pick_weighted(w, total, rng.random::<f64>())).collect()
        }
        (Some(w), false) => {
            let mut w = w.to_vec();
            let mut out = Vec::with_capacity(size);
            for _ in 0..size {
                let total: f64 = w.iter().sum();
                let k = pick_weighted(&w, total, rng.random::<f64>());
                w[k] = 0.0;
                out.push(k);
            }
            out
        }
    }
}

fn builtin_sample(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let population = population(interp, args.get("x"))?;
    let n = population.len();
    let replace = casts::flag("replace")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("replace"))?;
    let replace = to_bool(&replace).unwrap_or(false);
    let size = match args.get("size") {
        Value::Missing | Value::Null => n,
        other => {
            let size = casts::double_scalar("size").apply(interp, other)?;
            match to_double(&size) {
                Some(s) if s.is_finite() && s >= 0.0 => s as usize,
                _ => return Err(Message::InvalidArgument("size".to_string()).into()),
            }
        }
    };
    let weights = match args.get("prob") {
        Value::Missing | Value::Null => None,
        Value::Vector(p) => Some(probabilities(interp, &p, n, size, replace)?),
        _ => return Err(Message::IncorrectNumProbabilities.into()),
    };
    if weights.is_none() && !replace && size > n {
        return Err(Message::SampleLargerThanPopulation.into());
    }
    if size > 0 && n == 0 {
        return Err(Message::InvalidFirstArgument.into());
    }

    let positions = with_rng(interp, |rng| draw_positions(rng, n, size, replace, weights.as_deref()));
    Ok(Value::Vector(match population {
        Population::Range(_) => int_vector(positions.into_iter().map(|p| p + 1)),
        Population::Elements(v) => reorder(&v, &positions),
    }))
}

/// `size` distinct draws from `1:n` by rejection
fn builtin_sample2(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let n = casts::double_scalar("n").apply(interp, args.get("n"))?;
    let size = casts::int_scalar("size").apply(interp, args.get("size"))?;
    let n = match to_double(&n) {
        Some(n) if n.is_finite() && n >= 0.0 => n,
        _ => return Err(Message::InvalidFirstArgument.into()),
    };
    let size = match casts::to_int(&size) {
        Some(s) if s != NA_INTEGER && s >= 0 => s as usize,
        _ => return Err(Message::InvalidArgument("size".to_string()).into()),
    };
    if size as f64 > n / 2.0 {
        return Err(Message::Sample2Size.into());
    }
    let upper = n as u64;
    let draws = with_rng(interp, |rng| {
        let mut seen = HashSet::with_capacity(size);
        let mut out = Vec::with_capacity(size);
        while out.len() < size {
            let k = rng.random_range(0..upper) + 1;
            if seen.insert(k) {
                out.push(k);
            }
        }
        out
    });
    let out = if n <= i32::MAX as f64 {
        Vector::integer(draws.into_iter().map(|k| k as i32).collect())
    } else {
        Vector::double(draws.into_iter().map(|k| k as f64).collect())
    };
    Ok(Value::Vector(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::{eval, eval_in};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn ints(v: &Value) -> Vec<i32> {
        match v.as_vector().map(Vector::data) {
            Some(VectorData::Integer(i)) => i.clone(),
            _ => panic!("not an integer vector: {:?}", v),
        }
    }

    #[test]
    fn test_seed_reproduces_streams() {
        let mut it = Interpreter::new();
        let first = eval_in(&mut it, "set.seed(42); sample(10)").unwrap();
        let second = eval_in(&mut it, "set.seed(42); sample(10)").unwrap();
        assert_eq!(first, second);
        let mut sorted = ints(&first);
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=10).collect::<Vec<_>>());

        let a = eval_in(&mut it, "set.seed(1); runif(3)").unwrap();
        let b = eval_in(&mut it, "set.seed(1); runif(3)").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_seed_is_invisible() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "set.seed(3)").unwrap();
        assert!(!it.ctx.visible);
        assert!(it.ctx.rng.is_seeded());
        eval_in(&mut it, "set.seed(NULL)").unwrap();
        assert!(!it.ctx.rng.is_seeded());
        assert_eq!(eval("set.seed(\"a\")").unwrap_err().message, Message::InvalidSeed);
    }

    #[test]
    fn test_runif_bounds() {
        let out = eval("set.seed(7); runif(100, 2, 3)").unwrap();
        match out.as_vector().map(Vector::data) {
            Some(VectorData::Double(d)) => {
                assert_eq!(d.len(), 100);
                assert!(d.iter().all(|&x| (2.0..3.0).contains(&x)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(eval("runif(2, 1, 1)").unwrap(), Value::Vector(Vector::double(vec![1.0, 1.0])));
        assert_eq!(eval("length(runif(c(9, 9, 9)))").unwrap(), Value::int(3));
        assert_eq!(eval("runif(-1)").unwrap_err().message, Message::InvalidArguments);
    }

    #[test]
    fn test_runif_bad_bounds_warn() {
        let mut it = Interpreter::new();
        let out = eval_in(&mut it, "runif(1, 2, 1)").unwrap();
        assert!(matches!(out.as_vector().map(Vector::data), Some(VectorData::Double(d)) if d[0].is_nan()));
        assert_eq!(it.ctx.warnings()[0].message, Message::NasProduced);
    }

    #[test]
    fn test_sample_elements_and_names() {
        let out = eval("set.seed(1); sample(c(a = \"x\"), 1)").unwrap();
        let mut expected = Vector::strings(["x"]);
        expected.set_names(Some(vec![Some("a".into())]));
        assert_eq!(out, Value::Vector(expected));
        assert_eq!(eval("length(sample(5, 20, replace = TRUE))").unwrap(), Value::int(20));
        assert_eq!(eval("sample(c(3, 3), 2, prob = c(0, 1), replace = TRUE)").unwrap(), eval("c(3, 3)").unwrap());
        assert_eq!(eval("sample(1:3, 2, prob = c(0, 0, 1), replace = TRUE)").unwrap(), eval("c(3L, 3L)").unwrap());
    }

    #[test]
    fn test_sample_errors() {
        assert_eq!(eval("sample(3, 5)").unwrap_err().message, Message::SampleLargerThanPopulation);
        assert_eq!(eval("sample(3, 1, prob = c(1, 2))").unwrap_err().message, Message::IncorrectNumProbabilities);
        assert_eq!(eval("sample(2, 1, prob = c(NA, 1))").unwrap_err().message, Message::NaInProbability);
        assert_eq!(eval("sample(2, 1, prob = c(-1, 1))").unwrap_err().message, Message::NegativeProbability);
        assert_eq!(
            eval("sample(3, 2, prob = c(0, 0, 1))").unwrap_err().message,
            Message::TooFewPositiveProbabilities
        );
        assert_eq!(eval("sample(sum)").unwrap_err().message, Message::InvalidFirstArgument);
    }

    #[test]
    fn test_sample2() {
        let out = eval("set.seed(5); sample2(100, 10)").unwrap();
        let draws = ints(&out);
        assert_eq!(draws.len(), 10);
        assert_eq!(draws.iter().collect::<HashSet<_>>().len(), 10);
        assert!(draws.iter().all(|&k| (1..=100).contains(&k)));
        assert_eq!(eval("sample2(10, 6)").unwrap_err().message, Message::Sample2Size);
    }

    proptest! {
        #[test]
        fn prop_sample_without_replacement_is_distinct(n in 1usize..50, seed in 0u64..1000) {
            let mut rng = <StdRng as rand::SeedableRng>::seed_from_u64(seed);
            let size = n / 2;
            let drawn = draw_positions(&mut rng, n, size, false, None);
            prop_assert_eq!(drawn.len(), size);
            prop_assert_eq!(drawn.iter().collect::<HashSet<_>>().len(), size);
            prop_assert!(drawn.iter().all(|&p| p < n));
        }
    }
}
