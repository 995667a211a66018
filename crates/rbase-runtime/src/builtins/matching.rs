//! Value and string matching: `match`, `%in%`, `pmatch`, `charmatch`

use crate::args::Args;
use crate::builtins::{logicals, strings, BuiltinSpec};
use crate::casts::{self, to_int};
use crate::coerce::common_kind;
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::{is_na_complex, is_na_real, NA_INTEGER};
use crate::value::{Kind, RStr, Value, Vector, VectorData};
use std::collections::{HashMap, HashSet};

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("match", &["x", "table", "nomatch", "incomparables"], builtin_match),
    BuiltinSpec::eager("%in%", &["x", "table"], builtin_in),
    BuiltinSpec::eager("pmatch", &["x", "table", "nomatch", "duplicates.ok"], builtin_pmatch),
    BuiltinSpec::eager("charmatch", &["x", "table", "nomatch"], builtin_charmatch),
];

// ============================================================================
// Hashable element keys
// ============================================================================

/// An element reduced to something hashable; NA and NaN stay distinct and
/// the two zeros collapse
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Key {
    Na,
    NaN,
    Logical(bool),
    Integer(i32),
    Double(u64),
    Complex(u64, u64),
    Str(RStr),
    Raw(u8),
}

fn double_bits(x: f64) -> u64 {
    if x == 0.0 {
        0.0f64.to_bits()
    } else {
        x.to_bits()
    }
}

fn double_key(x: f64) -> Key {
    if is_na_real(x) {
        Key::Na
    } else if x.is_nan() {
        Key::NaN
    } else {
        Key::Double(double_bits(x))
    }
}

/// Keys of every element; lists are not keyable
pub(crate) fn keys(data: &VectorData) -> Vec<Key> {
    match data {
        VectorData::Logical(v) => v.iter().map(|b| b.map_or(Key::Na, Key::Logical)).collect(),
        VectorData::Integer(v) => v
            .iter()
            .map(|&i| if i == NA_INTEGER { Key::Na } else { Key::Integer(i) })
            .collect(),
        VectorData::Double(v) => v.iter().map(|&x| double_key(x)).collect(),
        VectorData::Complex(v) => v
            .iter()
            .map(|&z| {
                if is_na_complex(z) {
                    Key::Na
                } else if z.re.is_nan() || z.im.is_nan() {
                    Key::NaN
                } else {
                    Key::Complex(double_bits(z.re), double_bits(z.im))
                }
            })
            .collect(),
        VectorData::Character(v) => v.iter().map(|s| s.clone().map_or(Key::Na, Key::Str)).collect(),
        VectorData::Raw(v) => v.iter().map(|&b| Key::Raw(b)).collect(),
        VectorData::List(v) => v.iter().map(|_| Key::Na).collect(),
    }
}

fn match_operand(value: Value) -> RResult<Vector> {
    match value {
        Value::Vector(v) => Ok(v),
        Value::Null => Ok(Vector::empty(Kind::Logical)),
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        _ => Err(Message::MatchRequiresVectors.into()),
    }
}

/// One-based position of each `x` in `table`, `None` when absent
pub(crate) fn match_positions(
    interp: &mut Interpreter,
    x: &Vector,
    table: &Vector,
    incomparables: Option<&Vector>,
) -> RResult<Vec<Option<usize>>> {
    let mut kind = common_kind([x.kind(), table.kind()]).unwrap_or(Kind::Logical);
    if kind == Kind::List {
        kind = Kind::Character;
    }
    let x = interp.coerce(x, kind)?;
    let table = interp.coerce(table, kind)?;

    let mut first: HashMap<Key, usize> = HashMap::with_capacity(table.len());
    for (i, key) in keys(table.data()).into_iter().enumerate() {
        first.entry(key).or_insert(i + 1);
    }

    let excluded: HashSet<Key> = match incomparables {
        Some(inc) => keys(interp.coerce(inc, kind)?.data()).into_iter().collect(),
        None => HashSet::new(),
    };

    Ok(keys(x.data())
        .into_iter()
        .map(|key| {
            if excluded.contains(&key) {
                None
            } else {
                first.get(&key).copied()
            }
        })
        .collect())
}

fn nomatch_arg(interp: &mut Interpreter, args: &Args) -> RResult<i32> {
    let nomatch = casts::int_scalar("nomatch")
        .default_if_missing(Value::int(NA_INTEGER))
        .apply(interp, args.get("nomatch"))?;
    Ok(to_int(&nomatch).unwrap_or(NA_INTEGER))
}

fn positions_vector(positions: impl IntoIterator<Item = Option<usize>>, nomatch: i32) -> Value {
    let data = positions
        .into_iter()
        .map(|p| p.map_or(nomatch, |p| p as i32))
        .collect();
    Value::Vector(Vector::new(VectorData::Integer(data)))
}

fn builtin_match(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match_operand(args.get("x"))?;
    let table = match_operand(args.get("table"))?;
    let nomatch = nomatch_arg(interp, args)?;

    // `incomparables = FALSE` means none
    let incomparables = match args.get("incomparables") {
        Value::Vector(v) if v.kind() == Kind::Logical && v.len() == 1 => {
            if logicals(interp, &v)?.first().copied().flatten() == Some(false) {
                None
            } else {
                Some(v)
            }
        }
        Value::Vector(v) => Some(v),
        _ => None,
    };

    let positions = match_positions(interp, &x, &table, incomparables.as_ref())?;
    Ok(positions_vector(positions, nomatch))
}

fn builtin_in(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match_operand(args.get("x"))?;
    let table = match_operand(args.get("table"))?;
    let found = match_positions(interp, &x, &table, None)?
        .into_iter()
        .map(|p| Some(p.is_some()))
        .collect();
    Ok(Value::Vector(Vector::with_completeness(VectorData::Logical(found), true)))
}

// ============================================================================
// Partial matching
// ============================================================================

/// Strings for partial matching; NA reads as "NA"
fn match_strings(interp: &mut Interpreter, value: Value, name: &str) -> RResult<Vec<String>> {
    let v = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Vector(v) if v.kind().is_atomic() => v,
        Value::Missing => return Err(Message::ArgumentMissing(name.to_string()).into()),
        _ => return Err(Message::InvalidArgument(name.to_string()).into()),
    };
    Ok(strings(interp, &v)?
        .into_iter()
        .map(|s| s.map_or_else(|| "NA".to_string(), |s| s.to_string()))
        .collect())
}

/// Two passes: exact matches first, then unique prefixes
pub(crate) fn pmatch(x: &[String], table: &[String], duplicates_ok: bool) -> Vec<Option<usize>> {
    let mut result = vec![None; x.len()];
    let mut used = vec![false; table.len()];

    for (i, input) in x.iter().enumerate() {
        if input.is_empty() {
            continue;
        }
        let hit = table
            .iter()
            .enumerate()
            .position(|(j, entry)| (duplicates_ok || !used[j]) && entry == input);
        if let Some(j) = hit {
            result[i] = Some(j);
            if !duplicates_ok {
                used[j] = true;
            }
        }
    }

    for (i, input) in x.iter().enumerate() {
        if input.is_empty() || result[i].is_some() {
            continue;
        }
        let mut candidates = table
            .iter()
            .enumerate()
            .filter(|(_, entry)| *entry != input && entry.starts_with(input.as_str()));
        let (Some((j, _)), None) = (candidates.next(), candidates.next()) else {
            continue;
        };
        if duplicates_ok || !used[j] {
            result[i] = Some(j);
            if !duplicates_ok {
                used[j] = true;
            }
        }
    }

    result.into_iter().map(|p| p.map(|j| j + 1)).collect()
}

/// Ambiguous input is reported as `Some(0)`
pub(crate) fn charmatch(input: &str, table: &[String]) -> Option<usize> {
    if input.is_empty() {
        return None;
    }
    let mut exact = table.iter().enumerate().filter(|(_, entry)| *entry == input);
    match (exact.next(), exact.next()) {
        (Some((j, _)), None) => return Some(j + 1),
        (Some(_), Some(_)) => return Some(0),
        _ => {}
    }
    let mut partial = table
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.starts_with(input));
    match (partial.next(), partial.next()) {
        (Some((j, _)), None) => Some(j + 1),
        (Some(_), Some(_)) => Some(0),
        _ => None,
    }
}

fn builtin_pmatch(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match_strings(interp, args.get("x"), "x")?;
    let table = match_strings(interp, args.get("table"), "table")?;
    let nomatch = nomatch_arg(interp, args)?;
    let duplicates_ok = casts::flag("duplicates.ok")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("duplicates.ok"))?;
    let duplicates_ok = casts::to_bool(&duplicates_ok).unwrap_or(false);
    Ok(positions_vector(pmatch(&x, &table, duplicates_ok), nomatch))
}

fn builtin_charmatch(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match_strings(interp, args.get("x"), "x")?;
    let table = match_strings(interp, args.get("table"), "table")?;
    let nomatch = nomatch_arg(interp, args)?;
    Ok(positions_vector(x.iter().map(|input| charmatch(input, &table)), nomatch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::eval;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const NA: i32 = NA_INTEGER;

    fn ints(v: &[i32]) -> Value {
        Value::Vector(Vector::integer(v.to_vec()))
    }

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("match(c(2, 5), c(5, 2, 2))", &[2, 1])]
    #[case("match(3L, c(1, 2, 3))", &[3])]
    #[case("match(\"b\", c(\"a\", \"b\"))", &[2])]
    #[case("match(c(1, 9), 1:3, nomatch = 0)", &[1, 0])]
    #[case("match(c(NA, 1), c(1, NA))", &[2, 1])]
    #[case("match(NaN, c(NA, NaN))", &[2])]
    #[case("match(c(1, 2), c(1, 2), incomparables = 1)", &[NA, 2])]
    #[case("match(1, 1, incomparables = FALSE)", &[1])]
    #[case("match(TRUE, c(\"x\", \"TRUE\"))", &[2])]
    #[case("match(NULL, 1)", &[])]
    fn test_match(#[case] source: &str, #[case] expected: &[i32]) {
        assert_eq!(eval(source).unwrap(), ints(expected));
    }

    #[test]
    fn test_in() {
        assert_eq!(
            eval("c(1, 4) %in% 1:3").unwrap(),
            Value::Vector(Vector::logical(vec![Some(true), Some(false)]))
        );
    }

    #[test]
    fn test_match_requires_vectors() {
        let err = eval("match(sum, 1)").unwrap_err();
        assert_eq!(err.message, Message::MatchRequiresVectors);
    }

    #[rstest]
    #[case(&["me", "mo"], &["mean", "median", "mode"], false, vec![None, Some(3)])]
    #[case(&["mea"], &["mean", "median"], false, vec![Some(1)])]
    #[case(&["mean", "mean"], &["mean", "mean2"], false, vec![Some(1), Some(2)])]
    #[case(&["mean", "mean"], &["mean"], true, vec![Some(1), Some(1)])]
    #[case(&["mean", "mean"], &["mean"], false, vec![Some(1), None])]
    #[case(&["", "a"], &["", "ab"], false, vec![None, Some(2)])]
    #[case(&["ab", "a"], &["abc"], false, vec![Some(1), None])]
    fn test_pmatch(
        #[case] x: &[&str],
        #[case] table: &[&str],
        #[case] duplicates_ok: bool,
        #[case] expected: Vec<Option<usize>>,
    ) {
        assert_eq!(pmatch(&owned(x), &owned(table), duplicates_ok), expected);
    }

    #[test]
    fn test_pmatch_builtin() {
        assert_eq!(eval("pmatch(c(\"me\", \"mo\"), c(\"mean\", \"median\", \"mode\"), nomatch = 0L)").unwrap(), ints(&[0, 3]));
        assert_eq!(eval("pmatch(\"x\", \"y\")").unwrap(), ints(&[NA]));
    }

    #[rstest]
    #[case("m", &["mean", "median"], Some(0))]
    #[case("med", &["mean", "median"], Some(2))]
    #[case("mean", &["mean", "meant"], Some(1))]
    #[case("mean", &["mean", "mean"], Some(0))]
    #[case("x", &["mean"], None)]
    #[case("", &["", "a"], None)]
    fn test_charmatch(#[case] input: &str, #[case] table: &[&str], #[case] expected: Option<usize>) {
        assert_eq!(charmatch(input, &owned(table)), expected);
    }

    #[test]
    fn test_charmatch_builtin() {
        assert_eq!(
            eval("charmatch(c(\"\", \"m\", \"med\", \"z\"), c(\"mean\", \"median\"), nomatch = -1)").unwrap(),
            ints(&[-1, 0, 2, -1])
        );
    }
}
