//! Subsetting: `[`, `[[`, `$` and their replacement forms
//!
//! Subscripts may be positive or negative numbers, logical masks (recycled)
//! or names. Matrices also take a row and a column subscript. `$` selects
//! list elements and environment bindings by name, matching list names
//! partially when the prefix is unique.

use crate::args::Args;
use crate::ast::Expr;
use crate::builtins::matrix::{dimnames_pair, set_dimnames_pair};
use crate::builtins::{assign_element, doubles, force_dots, BuiltinSpec};
use crate::casts;
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::value::{Kind, RStr, Value, Vector, VectorData};
use std::collections::HashSet;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("[", &["x", "...", "drop"], builtin_subset),
    BuiltinSpec::eager("[[", &["x", "...", "exact"], builtin_subset2),
    BuiltinSpec::eager("[<-", &["x", "...", "value"], builtin_subassign),
    BuiltinSpec::eager("[[<-", &["x", "...", "value"], builtin_subassign2),
    BuiltinSpec::eager("$", &["x", "name"], builtin_dollar),
    BuiltinSpec::eager("$<-", &["x", "name", "value"], builtin_dollar_assign),
];

/// Positions picked by one subscript
#[derive(Debug, Default)]
struct Subscript {
    /// Zero-based positions; `None` is an NA subscript. Positions may lie
    /// past the end of the vector.
    positions: Vec<Option<usize>>,
    /// Names for the positions past the end created by unmatched names
    appended: Vec<RStr>,
}

fn all_positions(n: usize) -> Subscript {
    Subscript {
        positions: (0..n).map(Some).collect(),
        appended: Vec::new(),
    }
}

/// Resolve `index` against a vector of length `n`
///
/// Unmatched names point one past the end; when `assign` is set each distinct
/// unmatched name gets its own new position.
fn resolve(
    interp: &mut Interpreter,
    index: &Value,
    n: usize,
    names: Option<&[Option<RStr>]>,
    assign: bool,
) -> RResult<Subscript> {
    let index = match index {
        Value::Missing => return Ok(all_positions(n)),
        Value::Null => return Ok(Subscript::default()),
        Value::Vector(v) => v,
        other => return Err(Message::InvalidSubscriptType(other.type_name().to_string()).into()),
    };
    match index.data() {
        VectorData::Logical(mask) => {
            if mask.is_empty() {
                return Ok(Subscript::default());
            }
            let len = n.max(mask.len());
            let positions = (0..len)
                .filter_map(|i| match mask[i % mask.len()] {
                    Some(true) => Some(Some(i)),
                    Some(false) => None,
                    None => Some(None),
                })
                .collect();
            Ok(Subscript {
                positions,
                appended: Vec::new(),
            })
        }
        VectorData::Integer(_) | VectorData::Double(_) => {
            let values = doubles(interp, index)?;
            Ok(Subscript {
                positions: numeric_positions(&values, n)?,
                appended: Vec::new(),
            })
        }
        VectorData::Character(keys) => {
            let mut appended: Vec<RStr> = Vec::new();
            let mut positions = Vec::with_capacity(keys.len());
            for key in keys {
                let Some(key) = key else {
                    positions.push(None);
                    continue;
                };
                let found = names.and_then(|names| {
                    names
                        .iter()
                        .position(|name| !key.is_empty() && name.as_deref() == Some(key.as_ref()))
                });
                let position = match found {
                    Some(i) => i,
                    None if assign => match appended.iter().position(|a| a == key) {
                        Some(k) => n + k,
                        None => {
                            appended.push(key.clone());
                            n + appended.len() - 1
                        }
                    },
                    None => n,
                };
                positions.push(Some(position));
            }
            Ok(Subscript { positions, appended })
        }
        _ => Err(Message::InvalidSubscriptType(index.kind().type_name().to_string()).into()),
    }
}

/// Positive subscripts select, negative ones exclude, zeros are dropped
fn numeric_positions(values: &[f64], n: usize) -> RResult<Vec<Option<usize>>> {
    let negative = values.iter().any(|&x| x.trunc() < 0.0);
    if negative {
        if values.iter().any(|&x| x.is_nan() || x.trunc() > 0.0) {
            return Err(Message::MixedSubscripts.into());
        }
        let mut keep = vec![true; n];
        for &x in values {
            let k = (-x.trunc()) as usize;
            if (1..=n).contains(&k) {
                keep[k - 1] = false;
            }
        }
        return Ok((0..n).filter(|&i| keep[i]).map(Some).collect());
    }
    Ok(values
        .iter()
        .filter_map(|&x| {
            if x.is_nan() {
                return Some(None);
            }
            let k = x.trunc();
            if k == 0.0 {
                None
            } else {
                Some(Some(k as usize - 1))
            }
        })
        .collect())
}

fn index_values(interp: &mut Interpreter, args: &Args) -> RResult<Vec<Value>> {
    Ok(force_dots(interp, args)?.into_iter().map(|d| d.value).collect())
}

// ============================================================================
// Extraction
// ============================================================================

fn builtin_subset(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let indices = index_values(interp, args)?;
    let drop = casts::flag("drop")
        .default_if_missing(Value::lgl(true))
        .apply(interp, args.get("drop"))?;
    let drop = casts::to_bool(&drop).unwrap_or(true);
    let x = match args.get("x") {
        Value::Vector(v) => v,
        Value::Null => return Ok(Value::Null),
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        other => return Err(Message::NotSubsettable(other.type_name().to_string()).into()),
    };
    match indices.as_slice() {
        [] | [Value::Missing] => Ok(Value::Vector(x)),
        [index] => Ok(Value::Vector(extract(interp, &x, index)?)),
        [i, j] => match x.matrix_dims() {
            Some(dims) => Ok(Value::Vector(extract_matrix(interp, &x, dims, i, j, drop)?)),
            None => Err(Message::IncorrectDimensions.into()),
        },
        _ => Err(Message::IncorrectDimensions.into()),
    }
}

fn extract(interp: &mut Interpreter, x: &Vector, index: &Value) -> RResult<Vector> {
    let n = x.len();
    let sub = resolve(interp, index, n, x.names(), false)?;
    let positions: Vec<Option<usize>> = sub.positions.iter().map(|p| p.filter(|&i| i < n)).collect();
    let mut out = Vector::new(x.data().select(&positions));
    if let Some(names) = x.names() {
        let picked = positions
            .iter()
            .map(|p| match p {
                Some(i) => names[*i].clone(),
                None => Some(RStr::from("<NA>")),
            })
            .collect();
        out.set_names(Some(picked));
    }
    Ok(out)
}

/// Matrix positions for a row and a column subscript
fn matrix_positions(
    interp: &mut Interpreter,
    x: &Vector,
    (nrow, ncol): (usize, usize),
    i: &Value,
    j: &Value,
) -> RResult<(Vec<Option<usize>>, Vec<Option<usize>>)> {
    let (rownames, colnames) = dimnames_pair(x);
    let rows = resolve(interp, i, nrow, rownames.as_deref(), false)?.positions;
    let cols = resolve(interp, j, ncol, colnames.as_deref(), false)?.positions;
    let out_of_range = |positions: &[Option<usize>], extent: usize| positions.iter().flatten().any(|&p| p >= extent);
    if out_of_range(&rows, nrow) || out_of_range(&cols, ncol) {
        return Err(Message::SubscriptOutOfBounds.into());
    }
    Ok((rows, cols))
}

fn extract_matrix(
    interp: &mut Interpreter,
    x: &Vector,
    dims: (usize, usize),
    i: &Value,
    j: &Value,
    drop: bool,
) -> RResult<Vector> {
    let nrow = dims.0;
    let (rows, cols) = matrix_positions(interp, x, dims, i, j)?;
    let positions: Vec<Option<usize>> = cols
        .iter()
        .flat_map(|c| rows.iter().map(move |r| r.zip(*c).map(|(r, c)| r + c * nrow)))
        .collect();
    let mut out = Vector::new(x.data().select(&positions));

    let (rownames, colnames) = dimnames_pair(x);
    let pick = |names: Option<Vec<Option<RStr>>>, at: &[Option<usize>]| {
        names.map(|names| {
            at.iter()
                .map(|p| p.and_then(|p| names.get(p).cloned().flatten()))
                .collect::<Vec<_>>()
        })
    };
    let rownames = pick(rownames, &rows);
    let colnames = pick(colnames, &cols);

    if drop && (rows.len() == 1 || cols.len() == 1) {
        let names = match (rows.len(), cols.len()) {
            (1, 1) => None,
            (1, _) => colnames,
            _ => rownames,
        };
        if let Some(names) = names {
            out.set_names(Some(names));
        }
        return Ok(out);
    }
    out.set_dim(&[rows.len(), cols.len()]);
    set_dimnames_pair(&mut out, rownames, colnames);
    Ok(out)
}

fn builtin_subset2(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let indices = index_values(interp, args)?;
    match args.get("x") {
        Value::Null => Ok(Value::Null),
        Value::Env(env) => {
            let name = single_name(&indices)?;
            match env.get_local(&name) {
                Some(value) => interp.force_value(value),
                None => Ok(Value::Null),
            }
        }
        Value::Lang(expr) => {
            let [index] = indices.as_slice() else {
                return Err(Message::IncorrectDimensions.into());
            };
            language_element(interp, &expr, index)
        }
        Value::Vector(x) => {
            let position = match indices.as_slice() {
                [index] => single_position(interp, &x, index)?,
                [i, j] => {
                    let dims = x.matrix_dims().ok_or(Message::IncorrectSubscriptsMatrix)?;
                    let (rows, cols) = matrix_positions(interp, &x, dims, i, j)?;
                    match (rows.as_slice(), cols.as_slice()) {
                        ([Some(r)], [Some(c)]) => Some(r + c * dims.0),
                        _ => return Err(Message::SubscriptOutOfBounds.into()),
                    }
                }
                [] => return Err(Message::InvalidSubscriptType("symbol".to_string()).into()),
                _ => return Err(Message::IncorrectSubscriptsMatrix.into()),
            };
            match position {
                Some(p) => Ok(x.data().element(p)),
                None if x.kind() == Kind::List => Ok(Value::Null),
                None => Err(Message::SubscriptOutOfBounds.into()),
            }
        }
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        other => Err(Message::NotSubsettable(other.type_name().to_string()).into()),
    }
}

/// Position selected by a `[[` subscript; `None` for an unmatched name
fn single_position(interp: &mut Interpreter, x: &Vector, index: &Value) -> RResult<Option<usize>> {
    let index = match index {
        Value::Vector(v) => v,
        Value::Null => return Err(Message::SelectLessThanOne.into()),
        Value::Missing => return Err(Message::InvalidSubscriptType("symbol".to_string()).into()),
        other => return Err(Message::InvalidSubscriptType(other.type_name().to_string()).into()),
    };
    match index.len() {
        0 => return Err(Message::SelectLessThanOne.into()),
        1 => {}
        _ => return Err(Message::SelectMoreThanOne.into()),
    }
    match index.data() {
        VectorData::Character(keys) => Ok(keys[0].as_ref().and_then(|key| {
            x.names()
                .and_then(|names| names.iter().position(|name| name.as_deref() == Some(key.as_ref())))
        })),
        VectorData::Logical(_) | VectorData::Integer(_) | VectorData::Double(_) => {
            let k = doubles(interp, index)?[0].trunc();
            if k.is_nan() || k < 1.0 || k > x.len() as f64 {
                return Err(Message::SubscriptOutOfBounds.into());
            }
            Ok(Some(k as usize - 1))
        }
        _ => Err(Message::InvalidSubscriptType(index.kind().type_name().to_string()).into()),
    }
}

fn single_name(indices: &[Value]) -> RResult<String> {
    match indices {
        [index] => casts::to_str(index)
            .filter(|_| index.length() == 1)
            .ok_or_else(|| Message::WrongArgsForSubsettingEnv.into()),
        _ => Err(Message::WrongArgsForSubsettingEnv.into()),
    }
}

/// `quote(f(a, b))[[1]]` is `f`, `[[2]]` is `a`
fn language_element(interp: &mut Interpreter, expr: &Expr, index: &Value) -> RResult<Value> {
    let parts: Vec<Expr> = match expr {
        Expr::Call(head, args) => std::iter::once(head.as_ref().clone())
            .chain(args.iter().map(|a| a.value.clone()))
            .collect(),
        other => vec![other.clone()],
    };
    let index = match index {
        Value::Vector(v) if v.len() == 1 && v.kind().is_numeric() => v,
        _ => return Err(Message::SubscriptOutOfBounds.into()),
    };
    let k = doubles(interp, index)?[0].trunc();
    if k.is_nan() || k < 1.0 || k > parts.len() as f64 {
        return Err(Message::SubscriptOutOfBounds.into());
    }
    Ok(parts[k as usize - 1].clone().into_value())
}

fn dollar_name(args: &Args) -> RResult<String> {
    let name = args.get("name");
    casts::to_str(&name)
        .filter(|_| name.length() == 1)
        .ok_or_else(|| Message::InvalidSubscriptType(name.type_name().to_string()).into())
}

/// Exact match first, then a unique prefix
fn dollar_position(x: &Vector, name: &str) -> Option<usize> {
    let names = x.names()?;
    if let Some(i) = names.iter().position(|n| n.as_deref() == Some(name)) {
        return Some(i);
    }
    let mut prefixed = names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.as_deref().is_some_and(|n| n.starts_with(name)))
        .map(|(i, _)| i);
    match (prefixed.next(), prefixed.next()) {
        (Some(i), None) => Some(i),
        _ => None,
    }
}

fn builtin_dollar(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let name = dollar_name(args)?;
    match args.get("x") {
        Value::Null => Ok(Value::Null),
        Value::Env(env) => match env.get_local(&name) {
            Some(value) => interp.force_value(value),
            None => Ok(Value::Null),
        },
        Value::Vector(x) if x.kind() == Kind::List => {
            Ok(dollar_position(&x, &name).map_or(Value::Null, |i| x.data().element(i)))
        }
        Value::Vector(_) => Err(Message::DollarOnAtomic.into()),
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        other => Err(Message::NotSubsettable(other.type_name().to_string()).into()),
    }
}

fn builtin_dollar_assign(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let name = dollar_name(args)?;
    let value = args.get("value");
    let list = match args.get("x") {
        Value::Env(env) => {
            env.define(&name, value)?;
            return Ok(Value::Env(env));
        }
        Value::Null => Vector::empty(Kind::List),
        Value::Vector(x) if x.kind() == Kind::List => x,
        Value::Vector(x) => {
            interp.warning(Message::CoercingLhsToList);
            let mut list = interp.coerce(&x, Kind::List)?;
            list.set_attributes(x.attributes().cloned());
            list
        }
        Value::Missing => return Err(Message::ArgumentMissing("x".to_string()).into()),
        other => return Err(Message::NotSubsettable(other.type_name().to_string()).into()),
    };

    let old_len = list.len();
    let attributes = list.attributes().cloned();
    let mut names: Vec<Option<RStr>> = match list.names() {
        Some(names) => names.to_vec(),
        None => vec![Some(RStr::from("")); old_len],
    };
    let mut items = match list.into_data() {
        VectorData::List(items) => items,
        _ => Vec::new(),
    };
    // replacement matches names exactly
    match (names.iter().position(|n| n.as_deref() == Some(name.as_str())), value) {
        (Some(i), Value::Null) => {
            items.remove(i);
            names.remove(i);
        }
        (None, Value::Null) => {}
        (Some(i), value) => items[i] = value,
        (None, value) => {
            items.push(value);
            names.push(Some(RStr::from(name.as_str())));
        }
    }

    let mut out = Vector::list(items);
    out.set_attributes(attributes);
    if out.len() != old_len {
        out.remove_attr("dim");
        out.remove_attr("dimnames");
    }
    out.set_names(Some(names));
    Ok(Value::Vector(out))
}

// ============================================================================
// Replacement
// ============================================================================

fn target_vector(x: Value, value: &Value) -> RResult<Vector> {
    match x {
        Value::Vector(v) => Ok(v),
        Value::Null => Ok(match value {
            Value::Vector(v) => Vector::empty(v.kind()),
            Value::Null => Vector::empty(Kind::Logical),
            _ => Vector::empty(Kind::List),
        }),
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        other => Err(Message::NotSubsettable(other.type_name().to_string()).into()),
    }
}

fn builtin_subassign(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let value = args.get("value");
    let indices = index_values(interp, args)?;
    let x = target_vector(args.get("x"), &value)?;
    let sub = match indices.as_slice() {
        [] => all_positions(x.len()),
        [index] => resolve(interp, index, x.len(), x.names(), true)?,
        [i, j] => {
            let dims = x.matrix_dims().ok_or(Message::IncorrectSubscriptsMatrix)?;
            let (rows, cols) = matrix_positions(interp, &x, dims, i, j)?;
            let positions = cols
                .iter()
                .flat_map(|c| rows.iter().map(move |r| r.zip(*c).map(|(r, c)| r + c * dims.0)))
                .collect();
            Subscript {
                positions,
                appended: Vec::new(),
            }
        }
        _ => return Err(Message::IncorrectSubscriptsMatrix.into()),
    };
    if x.kind() == Kind::List && value.is_null() {
        return Ok(Value::Vector(remove_positions(&x, &sub.positions)));
    }
    assign_positions(interp, x, sub, &value)
}

/// Write `value` (recycled) into `positions`, growing `x` when needed
fn assign_positions(interp: &mut Interpreter, x: Vector, sub: Subscript, value: &Value) -> RResult<Value> {
    let source = match value {
        Value::Vector(v) => v.clone(),
        Value::Null => Vector::empty(Kind::Logical),
        other => Vector::list(vec![other.clone()]),
    };
    if sub.positions.is_empty() {
        return Ok(Value::Vector(x));
    }
    if source.is_empty() {
        return Err(Message::ReplacementLengthZero.into());
    }
    if source.len() > 1 && sub.positions.iter().any(Option::is_none) {
        return Err(Message::NaInSubscriptedAssignment.into());
    }
    if sub.positions.len() % source.len() != 0 {
        interp.warning(Message::ReplacementNotMultiple);
    }

    let old_len = x.len();
    let new_len = sub.positions.iter().flatten().map(|&p| p + 1).max().unwrap_or(0).max(old_len);
    let kind = x.kind().max(source.kind());
    let target = interp.coerce(&x, kind)?;
    let source = interp.coerce(&source, kind)?;

    let mut data = if new_len > old_len {
        let grown: Vec<Option<usize>> = (0..new_len).map(Some).collect();
        target.data().select(&grown)
    } else {
        target.into_data()
    };
    for (k, position) in sub.positions.iter().enumerate() {
        if let Some(i) = position {
            assign_element(&mut data, *i, source.data(), k % source.len());
        }
    }

    let mut out = Vector::new(data);
    out.set_attributes(x.attributes().cloned());
    if new_len > old_len {
        out.remove_attr("dim");
        out.remove_attr("dimnames");
        if x.names().is_some() || !sub.appended.is_empty() {
            let mut names: Vec<Option<RStr>> = match x.names() {
                Some(names) => names.to_vec(),
                None => vec![Some(RStr::from("")); old_len],
            };
            names.resize(new_len, Some(RStr::from("")));
            for (k, name) in sub.appended.into_iter().enumerate() {
                names[old_len + k] = Some(name);
            }
            out.set_names(Some(names));
        }
    }
    Ok(Value::Vector(out))
}

fn remove_positions(x: &Vector, positions: &[Option<usize>]) -> Vector {
    let dropped: HashSet<usize> = positions.iter().flatten().copied().collect();
    let keep: Vec<usize> = (0..x.len()).filter(|i| !dropped.contains(i)).collect();
    let mut out = Vector::new(x.data().take(&keep));
    if let Some(names) = x.names() {
        out.set_names(Some(keep.iter().map(|&i| names[i].clone()).collect()));
    }
    out
}

fn builtin_subassign2(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let value = args.get("value");
    let indices = index_values(interp, args)?;
    let x = match args.get("x") {
        Value::Env(env) => {
            let name = single_name(&indices)?;
            env.define(&name, value)?;
            return Ok(Value::Env(env));
        }
        // a NULL target grows into a vector for scalars, a list otherwise
        Value::Null => match &value {
            Value::Vector(v) if v.kind().is_atomic() && v.len() == 1 => Vector::empty(v.kind()),
            _ => Vector::empty(Kind::List),
        },
        other => target_vector(other, &value)?,
    };

    let sub = match indices.as_slice() {
        [index] => {
            if index.length() != 1 {
                return Err(if index.length() == 0 {
                    Message::SelectLessThanOne
                } else {
                    Message::SelectMoreThanOne
                }
                .into());
            }
            resolve(interp, index, x.len(), x.names(), true)?
        }
        [i, j] => {
            let dims = x.matrix_dims().ok_or(Message::IncorrectSubscriptsMatrix)?;
            let (rows, cols) = matrix_positions(interp, &x, dims, i, j)?;
            match (rows.as_slice(), cols.as_slice()) {
                ([Some(r)], [Some(c)]) => Subscript {
                    positions: vec![Some(r + c * dims.0)],
                    appended: Vec::new(),
                },
                _ => return Err(Message::SubscriptOutOfBounds.into()),
            }
        }
        [] => return Err(Message::InvalidSubscriptType("symbol".to_string()).into()),
        _ => return Err(Message::IncorrectSubscriptsMatrix.into()),
    };
    if sub.positions.len() != 1 {
        return Err(Message::SelectMoreThanOne.into());
    }

    if x.kind() == Kind::List {
        if value.is_null() {
            return Ok(Value::Vector(remove_positions(&x, &sub.positions)));
        }
        return assign_positions(interp, x, sub, &Value::Vector(Vector::list(vec![value])));
    }
    match &value {
        Value::Vector(v) if v.kind().is_atomic() => match v.len() {
            0 => Err(Message::ReplacementLengthZero.into()),
            1 => assign_positions(interp, x, sub, &value),
            _ => Err(Message::MoreElementsSupplied.into()),
        },
        Value::Null => Err(Message::ReplacementLengthZero.into()),
        // anything else turns the target into a list
        _ => {
            let mut list = interp.coerce(&x, Kind::List)?;
            list.set_attributes(x.attributes().cloned());
            assign_positions(interp, list, sub, &Value::Vector(Vector::list(vec![value])))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::builtins::testing::{eval, eval_in};
    use crate::error::Message;
    use crate::interpreter::Interpreter;
    use crate::value::{Value, Vector};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn dbls(v: &[f64]) -> Value {
        Value::Vector(Vector::double(v.to_vec()))
    }

    #[rstest]
    #[case("x <- c(10, 20, 30)\nx[2]", dbls(&[20.0]))]
    #[case("x <- c(10, 20, 30)\nx[-1]", dbls(&[20.0, 30.0]))]
    #[case("x <- c(10, 20, 30)\nx[c(TRUE, FALSE)]", dbls(&[10.0, 30.0]))]
    #[case("x <- c(10, 20, 30)\nx[0]", dbls(&[]))]
    #[case("x <- c(10, 20, 30)\nx[c(3, 1)]", dbls(&[30.0, 10.0]))]
    #[case("x <- c(a = 1, b = 2)\nx[[\"b\"]]", dbls(&[2.0]))]
    #[case("x <- list(1, \"a\")\nx[[2]]", Value::str("a"))]
    #[case("x <- list(a = 1)\nx[[\"zz\"]]", Value::Null)]
    #[case("m <- matrix(1:6, 2)\nm[2, 3]", Value::int(6))]
    #[case("quote(f(a, b))[[1]]", Value::Lang(std::rc::Rc::new(crate::ast::Expr::symbol("f"))))]
    fn test_extract(#[case] source: &str, #[case] expected: Value) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[test]
    fn test_extract_out_of_range_is_na() {
        let out = eval("x <- c(1, 2)\nis.na(x[5])").unwrap();
        assert_eq!(out, Value::lgl(true));
    }

    #[test]
    fn test_extract_keeps_names() {
        let out = eval("x <- c(a = 1, b = 2, c = 3)\nnames(x[c(\"c\", \"a\")])").unwrap();
        assert_eq!(out, eval("c(\"c\", \"a\")").unwrap());
    }

    #[test]
    fn test_matrix_row_and_column() {
        assert_eq!(
            eval("m <- matrix(1:6, 2)\nm[2, ]").unwrap(),
            Value::Vector(Vector::integer(vec![2, 4, 6]))
        );
        assert_eq!(
            eval("m <- matrix(1:6, 2)\ndim(m[, 2:3])").unwrap(),
            Value::Vector(Vector::integer(vec![2, 2]))
        );
        assert_eq!(
            eval("m <- matrix(1:6, 2)\ndim(m[1, , drop = FALSE])").unwrap(),
            Value::Vector(Vector::integer(vec![1, 3]))
        );
    }

    #[rstest]
    #[case("x <- c(1, 2)\nx[c(-1, 1)]", Message::MixedSubscripts)]
    #[case("x <- c(1, 2)\nx[[3]]", Message::SubscriptOutOfBounds)]
    #[case("x <- c(1, 2)\nx[[c(1, 2)]]", Message::SelectMoreThanOne)]
    #[case("x <- c(1, 2)\nx[1, 2]", Message::IncorrectDimensions)]
    #[case("sum[1]", Message::NotSubsettable("builtin".to_string()))]
    #[case("m <- matrix(1:4, 2)\nm[3, 1]", Message::SubscriptOutOfBounds)]
    #[case("x <- c(1, 2)\nx[[1]] <- c(1, 2)", Message::MoreElementsSupplied)]
    #[case("x <- c(1, 2)\nx[1] <- numeric(0)", Message::ReplacementLengthZero)]
    fn test_subset_errors(#[case] source: &str, #[case] expected: Message) {
        assert_eq!(eval(source).unwrap_err().message, expected);
    }

    #[rstest]
    #[case("x <- c(1, 2, 3)\nx[2] <- 9\nx", dbls(&[1.0, 9.0, 3.0]))]
    #[case("x <- c(1, 2)\nx[4] <- 5\nis.na(x)", Value::Vector(Vector::logical(vec![Some(false), Some(false), Some(true), Some(false)])))]
    #[case("x <- 1:3\nx[2] <- 0.5\nx", dbls(&[1.0, 0.5, 3.0]))]
    #[case("x <- c(1, 2, 3, 4)\nx[c(TRUE, FALSE)] <- 0\nx", dbls(&[0.0, 2.0, 0.0, 4.0]))]
    #[case("x <- NULL\nx[[\"a\"]] <- 1\nx", {
        let mut v = Vector::double(vec![1.0]);
        v.set_names(Some(vec![Some("a".into())]));
        Value::Vector(v)
    })]
    #[case("x <- list(a = 1, b = 2)\nx[[\"a\"]] <- NULL\nnames(x)", Value::str("b"))]
    #[case("m <- matrix(0, 2, 2)\nm[1, 2] <- 7\nm[[3]]", dbls(&[7.0]))]
    fn test_replace(#[case] source: &str, #[case] expected: Value) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[test]
    fn test_replace_by_new_name_appends() {
        let out = eval("x <- c(a = 1)\nx[\"b\"] <- 2\nnames(x)").unwrap();
        assert_eq!(out, eval("c(\"a\", \"b\")").unwrap());
    }

    #[test]
    fn test_nested_replacement() {
        let out = eval("x <- c(a = 1, b = 2)\nnames(x)[2] <- \"z\"\nnames(x)").unwrap();
        assert_eq!(out, eval("c(\"a\", \"z\")").unwrap());
    }

    #[test]
    fn test_environment_double_bracket() {
        let out = eval("e <- new.env()\ne[[\"k\"]] <- 3\ne[[\"k\"]]").unwrap();
        assert_eq!(out, Value::dbl(3.0));
    }

    #[rstest]
    #[case("l <- list(alpha = 1, beta = \"b\")\nl$beta", Value::str("b"))]
    #[case("l <- list(alpha = 1, beta = 2)\nl$al", Value::dbl(1.0))]
    #[case("l <- list(ab = 1, ac = 2)\nl$a", Value::Null)]
    #[case("l <- list(a = 1)\nl$zz", Value::Null)]
    #[case("NULL$a", Value::Null)]
    #[case(".Machine$integer.max", Value::int(i32::MAX))]
    #[case(".Platform$file.sep", Value::str("/"))]
    #[case("l <- list(a = c(5, 6))\nl$a[2]", Value::dbl(6.0))]
    #[case("e <- new.env()\nassign(\"k\", 4, envir = e)\ne$k", Value::dbl(4.0))]
    fn test_dollar(#[case] source: &str, #[case] expected: Value) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[test]
    fn test_dollar_on_atomic_vector() {
        let err = eval("x <- c(a = 1)\nx$a").unwrap_err();
        assert_eq!(err.message, Message::DollarOnAtomic);
    }

    #[test]
    fn test_dollar_assignment() {
        let out = eval("l <- list(a = 1)\nl$b <- \"new\"\nl$a <- 2\nl").unwrap();
        assert_eq!(out, eval("list(a = 2, b = \"new\")").unwrap());
        let out = eval("l <- list(a = 1, b = 2)\nl$a <- NULL\nnames(l)").unwrap();
        assert_eq!(out, Value::str("b"));
        let out = eval("x <- NULL\nx$k <- 1\nx").unwrap();
        assert_eq!(out, eval("list(k = 1)").unwrap());
        let out = eval("e <- new.env()\ne$v <- 9\nget(\"v\", e)").unwrap();
        assert_eq!(out, Value::dbl(9.0));
    }

    #[test]
    fn test_dollar_assignment_coerces_atomic_target() {
        let mut it = Interpreter::new();
        let out = eval_in(&mut it, "x <- c(a = 1)\nx$b <- 2\nx").unwrap();
        assert_eq!(out, eval("list(a = 1, b = 2)").unwrap());
        assert_eq!(it.ctx.warnings()[0].message, Message::CoercingLhsToList);
    }
}
