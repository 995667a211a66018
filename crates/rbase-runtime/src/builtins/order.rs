//! Ordering: `order`, `rank`, `sort`, `rev`
//!
//! Sorting is stable everywhere. NaN is treated as missing for ordering
//! purposes; strings compare bytewise.

use crate::args::Args;
use crate::builtins::{complexes, doubles, force_dots, names_of, strings, BuiltinSpec};
use crate::casts::{self, to_bool, to_str};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::{na_real, NA_INTEGER};
use crate::value::{Kind, RStr, Value, Vector, VectorData};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("order", &["...", "na.last", "decreasing"], builtin_order),
    BuiltinSpec::eager("rank", &["x", "ties.method"], builtin_rank),
    BuiltinSpec::eager("sort", &["x", "decreasing"], builtin_sort),
    BuiltinSpec::eager("rev", &["x"], builtin_rev),
];

/// Sort key column; `None` marks a missing element
#[derive(Debug, Clone)]
pub(crate) enum SortKey {
    Number(Vec<Option<OrderedFloat<f64>>>),
    Complex(Vec<Option<(OrderedFloat<f64>, OrderedFloat<f64>)>>),
    Text(Vec<Option<RStr>>),
}

impl SortKey {
    pub(crate) fn from_vector(interp: &mut Interpreter, v: &Vector) -> RResult<SortKey> {
        let number = |x: f64| if x.is_nan() { None } else { Some(OrderedFloat(x)) };
        match v.kind() {
            Kind::Raw => Err(Message::RawSort.into()),
            Kind::List => Err(Message::MustBeAtomic("x".to_string()).into()),
            Kind::Character => Ok(SortKey::Text(strings(interp, v)?)),
            Kind::Complex => Ok(SortKey::Complex(
                complexes(interp, v)?
                    .into_iter()
                    .map(|z| Some((number(z.re)?, number(z.im)?)))
                    .collect(),
            )),
            _ => Ok(SortKey::Number(doubles(interp, v)?.into_iter().map(number).collect())),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            SortKey::Number(v) => v.len(),
            SortKey::Complex(v) => v.len(),
            SortKey::Text(v) => v.len(),
        }
    }

    pub(crate) fn is_na(&self, i: usize) -> bool {
        match self {
            SortKey::Number(v) => v[i].is_none(),
            SortKey::Complex(v) => v[i].is_none(),
            SortKey::Text(v) => v[i].is_none(),
        }
    }

    /// Compare two present elements
    fn cmp_present(&self, a: usize, b: usize) -> Ordering {
        match self {
            SortKey::Number(v) => v[a].cmp(&v[b]),
            SortKey::Complex(v) => v[a].cmp(&v[b]),
            SortKey::Text(v) => v[a].as_deref().map(str::as_bytes).cmp(&v[b].as_deref().map(str::as_bytes)),
        }
    }

    /// Compare with missing values placed last (or first)
    pub(crate) fn compare(&self, a: usize, b: usize, decreasing: bool, na_last: bool) -> Ordering {
        match (self.is_na(a), self.is_na(b)) {
            (true, true) => Ordering::Equal,
            (true, false) => {
                if na_last {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (false, true) => {
                if na_last {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (false, false) => {
                let ord = self.cmp_present(a, b);
                if decreasing {
                    ord.reverse()
                } else {
                    ord
                }
            }
        }
    }
}

/// Zero-based stable order over several key columns; `na_last = None` drops
/// positions missing in any key
pub(crate) fn order_indices(keys: &[SortKey], na_last: Option<bool>, decreasing: bool) -> Vec<usize> {
    let n = keys.first().map_or(0, SortKey::len);
    let mut idx: Vec<usize> = (0..n)
        .filter(|&i| na_last.is_some() || !keys.iter().any(|k| k.is_na(i)))
        .collect();
    let na_last = na_last.unwrap_or(true);
    idx.sort_by(|&a, &b| {
        keys.iter()
            .map(|k| k.compare(a, b, decreasing, na_last))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    idx
}

fn decreasing_arg(interp: &mut Interpreter, args: &Args) -> RResult<bool> {
    let decreasing = casts::flag("decreasing")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("decreasing"))?;
    Ok(to_bool(&decreasing).unwrap_or(false))
}

fn builtin_order(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let na_last = casts::Cast::new("na.last")
        .default_if_missing(Value::lgl(true))
        .as_logical()
        .must(|v| !v.is_empty(), Message::InvalidArgument("na.last".to_string()))
        .first_element()
        .apply(interp, args.get("na.last"))?;
    let na_last = to_bool(&na_last);
    let decreasing = decreasing_arg(interp, args)?;

    let mut keys = Vec::new();
    for dot in force_dots(interp, args)? {
        match dot.value {
            Value::Null => {}
            Value::Vector(v) => keys.push(SortKey::from_vector(interp, &v)?),
            other => return Err(Message::InvalidTypeOfArgument(other.type_name().to_string()).into()),
        }
    }
    if let Some(first) = keys.first() {
        if keys.iter().any(|k| k.len() != first.len()) {
            return Err(Message::ArgumentLengthsDiffer.into());
        }
    }

    let order = order_indices(&keys, na_last, decreasing);
    let data = order.into_iter().map(|i| i as i32 + 1).collect();
    Ok(Value::Vector(Vector::with_completeness(VectorData::Integer(data), true)))
}

// ============================================================================
// Ranking
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ties {
    Average,
    Min,
    Max,
    First,
    Last,
}

impl Ties {
    fn parse(name: &str) -> Option<Ties> {
        match name {
            "average" => Some(Ties::Average),
            "min" => Some(Ties::Min),
            "max" => Some(Ties::Max),
            "first" => Some(Ties::First),
            "last" => Some(Ties::Last),
            _ => None,
        }
    }
}

/// Ranks of the present elements; missing elements stay `None`
pub(crate) fn rank(key: &SortKey, ties: Ties) -> Vec<Option<f64>> {
    let order = order_indices(std::slice::from_ref(key), None, false);
    let mut ranks = vec![None; key.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && key.compare(order[start], order[end + 1], false, true) == Ordering::Equal {
            end += 1;
        }
        for (offset, &i) in order[start..=end].iter().enumerate() {
            let r = match ties {
                Ties::Average => (start + end) as f64 / 2.0 + 1.0,
                Ties::Min => (start + 1) as f64,
                Ties::Max => (end + 1) as f64,
                Ties::First => (start + offset + 1) as f64,
                Ties::Last => (end - offset + 1) as f64,
            };
            ranks[i] = Some(r);
        }
        start = end + 1;
    }
    ranks
}

fn builtin_rank(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match args.get("x") {
        Value::Vector(v) => v,
        Value::Null => Vector::empty(Kind::Logical),
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        other => return Err(Message::InvalidTypeOfArgument(other.type_name().to_string()).into()),
    };
    let method = casts::string_scalar("ties.method")
        .default_if_missing(Value::str("average"))
        .apply(interp, args.get("ties.method"))?;
    let ties = to_str(&method)
        .as_deref()
        .and_then(Ties::parse)
        .ok_or_else(|| Message::InvalidArgument("ties.method".to_string()))?;

    let key = SortKey::from_vector(interp, &x)?;
    let ranks = rank(&key, ties);
    let data = if ties == Ties::Average {
        VectorData::Double(ranks.into_iter().map(|r| r.unwrap_or_else(na_real)).collect())
    } else {
        VectorData::Integer(ranks.into_iter().map(|r| r.map_or(NA_INTEGER, |r| r as i32)).collect())
    };
    let mut out = Vector::new(data);
    if let Some(names) = names_of(&x) {
        out.set_names(Some(names));
    }
    Ok(Value::Vector(out))
}

// ============================================================================
// Sorting and reversal
// ============================================================================

fn builtin_sort(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match args.get("x") {
        Value::Vector(v) => v,
        Value::Null => return Ok(Value::Null),
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        _ => return Err(Message::MustBeAtomic("x".to_string()).into()),
    };
    let decreasing = decreasing_arg(interp, args)?;
    let key = SortKey::from_vector(interp, &x)?;
    let order = order_indices(std::slice::from_ref(&key), None, decreasing);
    Ok(Value::Vector(reorder(&x, &order)))
}

/// Elements (and names) of `x` at `positions`; other attributes are dropped
pub(crate) fn reorder(x: &Vector, positions: &[usize]) -> Vector {
    let mut out = Vector::new(x.data().take(positions));
    if let Some(names) = x.names() {
        out.set_names(Some(positions.iter().map(|&i| names[i].clone()).collect()));
    }
    out
}

fn builtin_rev(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    match args.get("x") {
        Value::Vector(x) => {
            let positions: Vec<usize> = (0..x.len()).rev().collect();
            Ok(Value::Vector(reorder(&x, &positions)))
        }
        Value::Null => Ok(Value::Null),
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        other => Err(Message::InvalidTypeOfArgument(other.type_name().to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::eval;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn ints(v: &[i32]) -> Value {
        Value::Vector(Vector::integer(v.to_vec()))
    }

    #[rstest]
    #[case("order(c(3, 1, 2))", &[2, 3, 1])]
    #[case("order(c(3, 1, NA, 2))", &[2, 4, 1, 3])]
    #[case("order(c(3, 1, NA, 2), na.last = FALSE)", &[3, 2, 4, 1])]
    #[case("order(c(3, 1, NA, 2), na.last = NA)", &[2, 4, 1])]
    #[case("order(c(3, 1, 2), decreasing = TRUE)", &[1, 3, 2])]
    #[case("order(c(1, 1, 2, 2), c(4, 3, 2, 1))", &[2, 1, 4, 3])]
    #[case("order(c(2, 1, 2, 1))", &[2, 4, 1, 3])]
    #[case("order(c(\"b\", \"B\", \"a\"))", &[2, 3, 1])]
    #[case("order(c(NaN, 1))", &[2, 1])]
    fn test_order(#[case] source: &str, #[case] expected: &[i32]) {
        assert_eq!(eval(source).unwrap(), ints(expected));
    }

    #[test]
    fn test_order_length_mismatch() {
        assert_eq!(eval("order(1:2, 1:3)").unwrap_err().message, Message::ArgumentLengthsDiffer);
    }

    #[test]
    fn test_order_raw_errors() {
        assert_eq!(eval("order(as.raw(1))").unwrap_err().message, Message::RawSort);
    }

    #[test]
    fn test_rank_average_keeps_names() {
        let out = eval("rank(c(a = 10, b = 20, c = 10))").unwrap();
        let mut expected = Vector::double(vec![1.5, 3.0, 1.5]);
        expected.set_names(Some(vec![Some("a".into()), Some("b".into()), Some("c".into())]));
        assert_eq!(out, Value::Vector(expected));
    }

    #[rstest]
    #[case("min", &[1, 3, 1])]
    #[case("max", &[2, 3, 2])]
    #[case("first", &[1, 3, 2])]
    #[case("last", &[2, 3, 1])]
    fn test_rank_ties(#[case] method: &str, #[case] expected: &[i32]) {
        let source = format!("rank(c(10, 20, 10), ties.method = \"{}\")", method);
        assert_eq!(eval(&source).unwrap(), ints(expected));
    }

    #[test]
    fn test_rank_na_kept() {
        assert_eq!(
            eval("rank(c(2, NA, 1), ties.method = \"min\")").unwrap(),
            ints(&[2, NA_INTEGER, 1])
        );
    }

    #[test]
    fn test_rank_unknown_method() {
        let err = eval("rank(1:3, ties.method = \"dense\")").unwrap_err();
        assert_eq!(err.message.to_string(), "invalid 'ties.method' argument");
    }

    #[test]
    fn test_sort_drops_na_and_moves_names() {
        let out = eval("sort(c(b = 2, a = NA, c = 1))").unwrap();
        let mut expected = Vector::double(vec![1.0, 2.0]);
        expected.set_names(Some(vec![Some("c".into()), Some("b".into())]));
        assert_eq!(out, Value::Vector(expected));
        assert_eq!(eval("sort(c(1L, 3L, 2L), decreasing = TRUE)").unwrap(), ints(&[3, 2, 1]));
    }

    #[test]
    fn test_rev() {
        let out = eval("rev(c(x = 1L, y = 2L))").unwrap();
        let mut expected = Vector::integer(vec![2, 1]);
        expected.set_names(Some(vec![Some("y".into()), Some("x".into())]));
        assert_eq!(out, Value::Vector(expected));
        assert_eq!(eval("rev(NULL)").unwrap(), Value::Null);
    }

    proptest! {
        #[test]
        fn order_sorts_and_is_stable(values in prop::collection::vec(-5i32..5, 0..40)) {
            let key = SortKey::Number(values.iter().map(|&v| Some(OrderedFloat(v as f64))).collect());
            let order = order_indices(std::slice::from_ref(&key), Some(true), false);
            prop_assert_eq!(order.len(), values.len());
            for w in order.windows(2) {
                let (a, b) = (values[w[0]], values[w[1]]);
                prop_assert!(a < b || (a == b && w[0] < w[1]));
            }
        }

        #[test]
        fn average_ranks_sum_to_triangle(values in prop::collection::vec(-5i32..5, 0..40)) {
            let key = SortKey::Number(values.iter().map(|&v| Some(OrderedFloat(v as f64))).collect());
            let total: f64 = rank(&key, Ties::Average).into_iter().flatten().sum();
            let n = values.len() as f64;
            prop_assert!((total - n * (n + 1.0) / 2.0).abs() < 1e-9);
        }
    }
}
