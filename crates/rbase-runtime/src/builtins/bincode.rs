//! Interval binning: `bincode` and `tabulate`

use crate::args::Args;
use crate::builtins::{doubles, int_vector, integers, vector_arg, BuiltinSpec};
use crate::casts::{self, is_numeric_like, to_bool, to_int};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::NA_INTEGER;
use crate::value::{Value, Vector, VectorData};
use std::cmp::Ordering;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("bincode", &["x", "breaks", "right", "include.lowest"], builtin_bincode),
    BuiltinSpec::eager("tabulate", &["bin", "nbins"], builtin_tabulate),
];

fn builtin_bincode(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let breaks = casts::Cast::new("breaks")
        .must_not_be_missing()
        .must_be(is_numeric_like, Message::InvalidArgument("breaks".to_string()))
        .as_double()
        .apply(interp, args.get("breaks"))?;
    let breaks = match breaks.as_vector().map(|v| v.data()) {
        Some(VectorData::Double(b)) => b.clone(),
        _ => Vec::new(),
    };
    if breaks.windows(2).any(|w| w[0].partial_cmp(&w[1]) != Some(Ordering::Less)) {
        return Err(Message::BreaksNotSorted.into());
    }
    if breaks.len() < 2 {
        return Err(Message::InvalidArgument("breaks".to_string()).into());
    }

    let right = casts::flag("right")
        .default_if_missing(Value::lgl(true))
        .apply(interp, args.get("right"))?;
    let include_lowest = casts::flag("include.lowest")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("include.lowest"))?;
    let right = to_bool(&right).unwrap_or(true);
    let include_lowest = to_bool(&include_lowest).unwrap_or(false);

    let x = vector_arg(&args.get("x"), "x")?;
    let codes = doubles(interp, &x)?
        .into_iter()
        .map(|v| bin_of(v, &breaks, right, include_lowest).map_or(NA_INTEGER, |k| k as i32 + 1))
        .collect();
    Ok(Value::Vector(Vector::new(VectorData::Integer(codes))))
}

/// Zero-based bin of `x`, `None` when outside every bin
///
/// Bins are `(b[i], b[i+1]]` when `right`, `[b[i], b[i+1])` otherwise. The
/// outermost open boundary is closed when `include_lowest` is set.
pub(crate) fn bin_of(x: f64, breaks: &[f64], right: bool, include_lowest: bool) -> Option<usize> {
    if x.is_nan() {
        return None;
    }
    let (mut lo, mut hi) = (0, breaks.len() - 1);
    if x < breaks[lo] || breaks[hi] < x {
        return None;
    }
    let border = if right { breaks[lo] } else { breaks[hi] };
    if x == border && !include_lowest {
        return None;
    }
    while hi - lo >= 2 {
        let mid = (hi + lo) / 2;
        if x > breaks[mid] || (!right && x == breaks[mid]) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(lo)
}

fn builtin_tabulate(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let bin = vector_arg(&args.get("bin"), "bin")?;
    let bins = integers(interp, &bin)?;

    let default = bins.iter().copied().filter(|&b| b != NA_INTEGER).fold(1, i32::max);
    let nbins = casts::int_scalar("nbins")
        .default_if_missing(Value::int(default))
        .apply(interp, args.get("nbins"))?;
    let nbins = match to_int(&nbins) {
        Some(n) if n != NA_INTEGER && n >= 0 => n as usize,
        _ => return Err(Message::InvalidArgument("nbins".to_string()).into()),
    };

    let mut counts = vec![0usize; nbins];
    for b in bins {
        if b != NA_INTEGER && b >= 1 && (b as usize) <= nbins {
            counts[b as usize - 1] += 1;
        }
    }
    Ok(Value::Vector(int_vector(counts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::eval;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ints(v: &[i32]) -> Value {
        Value::Vector(Vector::integer(v.to_vec()))
    }

    const NA: i32 = NA_INTEGER;

    #[rstest]
    #[case("bincode(c(0, 1, 1.5, 2, 3), c(0, 1, 2))", &[NA, 1, 2, 2, NA])]
    #[case("bincode(c(0, 1, 1.5, 2, 3), c(0, 1, 2), include.lowest = TRUE)", &[1, 1, 2, 2, NA])]
    #[case("bincode(c(0, 1, 1.5, 2), c(0, 1, 2), right = FALSE)", &[1, 2, 2, NA])]
    #[case("bincode(c(0, 1, 1.5, 2), c(0, 1, 2), FALSE, TRUE)", &[1, 2, 2, 2])]
    #[case("bincode(c(NA, NaN, 0.5), c(0, 1))", &[NA, NA, 1])]
    #[case("bincode(1:10, c(0, 2.5, 5, 7.5, 10))", &[1, 1, 2, 2, 2, 3, 3, 4, 4, 4])]
    fn test_bincode(#[case] source: &str, #[case] expected: &[i32]) {
        assert_eq!(eval(source).unwrap(), ints(expected));
    }

    #[rstest]
    #[case("bincode(1, c(2, 1))", "'breaks' is not sorted")]
    #[case("bincode(1, c(1, 1))", "'breaks' is not sorted")]
    #[case("bincode(1, 1)", "invalid 'breaks' argument")]
    #[case("bincode(1, c(0, 2), right = NA)", "invalid 'right' argument")]
    #[case("bincode(1, c(0, 2), include.lowest = logical(0))", "invalid 'include.lowest' argument")]
    fn test_bincode_errors(#[case] source: &str, #[case] message: &str) {
        assert_eq!(eval(source).unwrap_err().message.to_string(), message);
    }

    #[test]
    fn test_unsorted_breaks_checked_first() {
        // the sort check runs before the flags are looked at
        let err = eval("bincode(1, c(3, 2, 1), right = NA)").unwrap_err();
        assert_eq!(err.message, Message::BreaksNotSorted);
    }

    #[rstest]
    #[case("tabulate(c(1, 2, 2, 5))", &[1, 2, 0, 0, 1])]
    #[case("tabulate(c(2, 3, 3, 5), nbins = 3)", &[0, 1, 2])]
    #[case("tabulate(c(-1L, 0L, NA, 2L))", &[0, 1])]
    #[case("tabulate(integer(0))", &[0])]
    fn test_tabulate(#[case] source: &str, #[case] expected: &[i32]) {
        assert_eq!(eval(source).unwrap(), ints(expected));
    }
}
