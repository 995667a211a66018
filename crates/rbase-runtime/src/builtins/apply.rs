//! Apply family: `lapply`, `sapply`, `vapply`, `apply`, `do.call`, `Reduce`,
//! `Filter`
//!
//! `FUN` is called once per element with the caller's `...` appended. Calls
//! are attributed as `FUN(X[[i]], ...)` so errors raised inside name the
//! element being processed.

use crate::args::{Args, Supplied};
use crate::ast::{Arg, Expr};
use crate::builtins::coerce::to_list;
use crate::builtins::matrix::set_dimnames_pair;
use crate::builtins::order::reorder;
use crate::builtins::seq::combine;
use crate::builtins::{logicals, names_of, BuiltinSpec};
use crate::casts::{self, to_bool};
use crate::deparse::deparse_value;
use crate::env::Environment;
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::value::{DotArg, Function, Kind, RStr, Value, Vector, VectorData};
use std::rc::Rc;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("lapply", &["X", "FUN", "..."], builtin_lapply),
    BuiltinSpec::eager("sapply", &["X", "FUN", "...", "simplify", "USE.NAMES"], builtin_sapply),
    BuiltinSpec::eager("vapply", &["X", "FUN", "FUN.VALUE", "...", "USE.NAMES"], builtin_vapply),
    BuiltinSpec::eager("apply", &["X", "MARGIN", "FUN", "..."], builtin_apply),
    BuiltinSpec::eager("do.call", &["what", "args", "envir"], builtin_do_call),
    BuiltinSpec::eager("Reduce", &["f", "x", "init", "accumulate"], builtin_reduce),
    BuiltinSpec::eager("Filter", &["f", "x"], builtin_filter),
];

type Names = Option<Vec<Option<RStr>>>;

/// Resolve a function argument given as a function, a string or a symbol
pub(crate) fn match_fun(interp: &mut Interpreter, value: Value, env: &Environment) -> RResult<Function> {
    match value {
        Value::Function(f) => Ok(f),
        Value::Vector(v) if v.kind() == Kind::Character && v.len() == 1 => match v.data() {
            VectorData::Character(s) => match &s[0] {
                Some(name) => interp.find_function(name, env),
                None => Err(Message::NotFunctionCharacterSymbol(deparse_value(&Value::Vector(v.clone()))).into()),
            },
            _ => Err(Message::NotAFunction.into()),
        },
        Value::Lang(expr) => match expr.as_symbol() {
            Some(name) => interp.find_function(name, env),
            None => Err(Message::NotFunctionCharacterSymbol(deparse_value(&Value::Lang(expr.clone()))).into()),
        },
        Value::Missing => Err(Message::ArgumentMissing("FUN".to_string()).into()),
        other => Err(Message::NotFunctionCharacterSymbol(deparse_value(&other)).into()),
    }
}

/// Elements of `X` and their names, after `as.list`
fn elements(interp: &mut Interpreter, x: Value) -> RResult<(Vec<Value>, Names)> {
    let list = match to_list(interp, x)? {
        Value::Vector(v) => v,
        _ => Vector::list(Vec::new()),
    };
    let names = names_of(&list);
    let items = match list.into_data() {
        VectorData::List(items) => items,
        _ => Vec::new(),
    };
    Ok((items, names))
}

/// `FUN(X[[i]], ...)`
fn call_fun(
    interp: &mut Interpreter,
    fun: &Function,
    item: Value,
    index: usize,
    dots: &[DotArg],
    env: &Environment,
) -> RResult<Value> {
    let element = Expr::call(
        "[[",
        vec![
            Arg::positional(Expr::symbol("X")),
            Arg::positional(Expr::Constant(Value::int(index as i32 + 1))),
        ],
    );
    let call = Expr::call(
        "FUN",
        vec![Arg::positional(element), Arg::positional(Expr::symbol("..."))],
    );
    let mut supplied = vec![Supplied::positional(item)];
    supplied.extend(dots.iter().map(|d| Supplied::new(d.name.clone(), d.value.clone())));
    interp.apply_values(fun, Rc::new(call), supplied, env)
}

fn map_elements(interp: &mut Interpreter, args: &Args, fun_formal: &str) -> RResult<(Vec<Value>, Names, Value)> {
    let fun = match_fun(interp, args.get(fun_formal), &args.env)?;
    let x = args.get("X");
    let (items, names) = elements(interp, x.clone())?;
    let mut results = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        results.push(call_fun(interp, &fun, item, i, args.dots(), &args.env)?);
    }
    Ok((results, names, x))
}

fn named_list(values: Vec<Value>, names: Names) -> Vector {
    let mut out = Vector::list(values);
    if names.is_some() {
        out.set_names(names);
    }
    out
}

/// Names for the result: `X`'s own names, else `X` itself when it is character
fn use_names(x: &Value, names: Names) -> Names {
    names.or_else(|| match x.as_vector().map(Vector::data) {
        Some(VectorData::Character(s)) => Some(s.clone()),
        _ => None,
    })
}

/// Length-one results become a vector, equal-length results the columns of
/// a matrix; anything else stays a list
fn simplify(interp: &mut Interpreter, results: Vec<Value>, names: Names) -> RResult<Value> {
    if results.is_empty() {
        return Ok(Value::Vector(named_list(results, names)));
    }
    let lengths: Vec<Option<usize>> = results
        .iter()
        .map(|r| r.as_vector().map(Vector::len))
        .collect();
    let common = lengths[0].filter(|_| lengths.iter().all(|&l| l == lengths[0]));
    match common {
        Some(1) => {
            let tagged: Vec<DotArg> = results
                .into_iter()
                .enumerate()
                .map(|(i, value)| DotArg {
                    name: names
                        .as_ref()
                        .and_then(|n| n[i].as_deref())
                        .filter(|n| !n.is_empty())
                        .map(str::to_string),
                    value,
                })
                .collect();
            combine(interp, &tagged)
        }
        Some(k) if k > 1 => {
            let rows = results[0].as_vector().and_then(names_of);
            let n = results.len();
            let untagged: Vec<DotArg> = results
                .into_iter()
                .map(|value| DotArg {
                    name: None,
                    value: match value {
                        Value::Vector(v) => Value::Vector(v.strip_attributes()),
                        other => other,
                    },
                })
                .collect();
            let mut out = match combine(interp, &untagged)? {
                Value::Vector(v) => v,
                other => return Ok(other),
            };
            out.set_dim(&[k, n]);
            set_dimnames_pair(&mut out, rows, names);
            Ok(Value::Vector(out))
        }
        _ => Ok(Value::Vector(named_list(results, names))),
    }
}

fn builtin_lapply(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let (results, names, _) = map_elements(interp, args, "FUN")?;
    Ok(Value::Vector(named_list(results, names)))
}

fn builtin_sapply(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let simplify_results = casts::flag("simplify")
        .default_if_missing(Value::lgl(true))
        .apply(interp, args.get("simplify"))?;
    let use_names_flag = casts::flag("USE.NAMES")
        .default_if_missing(Value::lgl(true))
        .apply(interp, args.get("USE.NAMES"))?;
    let (results, names, x) = map_elements(interp, args, "FUN")?;
    let names = if to_bool(&use_names_flag).unwrap_or(true) {
        use_names(&x, names)
    } else {
        None
    };
    if to_bool(&simplify_results).unwrap_or(true) {
        simplify(interp, results, names)
    } else {
        Ok(Value::Vector(named_list(results, names)))
    }
}

/// Kind a result of `from` may be stored as when the template is `to`
fn fits_template(from: Kind, to: Kind) -> bool {
    from == to
        || matches!(
            (from, to),
            (Kind::Logical, Kind::Integer | Kind::Double) | (Kind::Integer, Kind::Double)
        )
}

fn builtin_vapply(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let template = match args.get("FUN.VALUE") {
        Value::Vector(v) => v,
        Value::Missing => return Err(Message::ArgumentMissing("FUN.VALUE".to_string()).into()),
        _ => return Err(Message::MustBeVector("FUN.VALUE".to_string()).into()),
    };
    let use_names_flag = casts::flag("USE.NAMES")
        .default_if_missing(Value::lgl(true))
        .apply(interp, args.get("USE.NAMES"))?;
    let (results, names, x) = map_elements(interp, args, "FUN")?;
    let kind = template.kind();
    let k = template.len();

    let mut parts = Vec::with_capacity(results.len());
    for (i, result) in results.iter().enumerate() {
        let (len, result_kind, type_name) = match result {
            Value::Vector(v) => (v.len(), Some(v.kind()), v.kind().type_name()),
            other => (other.length(), None, other.type_name()),
        };
        if len != k {
            return Err(Message::VapplyLength(k, i + 1, len).into());
        }
        match (result, result_kind) {
            (Value::Vector(v), Some(from)) if fits_template(from, kind) => {
                parts.push(interp.coerce(v, kind)?.into_data());
            }
            _ => {
                return Err(Message::VapplyType(kind.type_name().to_string(), i + 1, type_name.to_string()).into());
            }
        }
    }

    let names = if to_bool(&use_names_flag).unwrap_or(true) {
        use_names(&x, names)
    } else {
        None
    };
    let n = parts.len();
    let mut out = Vector::new(crate::builtins::concat(kind, parts));
    if k == 1 {
        if names.is_some() {
            out.set_names(names);
        }
    } else {
        out.set_dim(&[k, n]);
        set_dimnames_pair(&mut out, names_of(&template), names);
    }
    Ok(Value::Vector(out))
}

/// Rows (`MARGIN = 1`) or columns (`MARGIN = 2`) of a matrix
fn builtin_apply(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = match args.get("X") {
        Value::Vector(v) if v.matrix_dims().is_some() => v,
        Value::Missing => return Err(Message::ArgumentMissing("X".to_string()).into()),
        _ => return Err(Message::DimMustBePositive.into()),
    };
    let margin = casts::int_scalar("MARGIN").apply(interp, args.get("MARGIN"))?;
    let margin = casts::to_int(&margin);
    let fun = match_fun(interp, args.get("FUN"), &args.env)?;
    let (nr, nc) = x.matrix_dims().unwrap_or((0, 0));
    let (row_names, col_names) = crate::builtins::matrix::dimnames_pair(&x);

    let (count, slice_names, margin_names): (usize, Names, Names) = match margin {
        Some(1) => (nr, col_names, row_names),
        Some(2) => (nc, row_names, col_names),
        _ => return Err(Message::InvalidArgument("MARGIN".to_string()).into()),
    };
    let mut results = Vec::with_capacity(count);
    for i in 0..count {
        let positions: Vec<usize> = if margin == Some(1) {
            (0..nc).map(|j| i + j * nr).collect()
        } else {
            (0..nr).map(|j| j + i * nr).collect()
        };
        let mut slice = Vector::new(x.data().take(&positions));
        if slice_names.is_some() {
            slice.set_names(slice_names.clone());
        }
        results.push(call_fun(interp, &fun, Value::Vector(slice), i, args.dots(), &args.env)?);
    }
    simplify(interp, results, margin_names)
}

fn builtin_do_call(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let env = match args.get("envir") {
        Value::Missing => args.env.clone(),
        Value::Env(env) => env,
        _ => return Err(Message::InvalidArgument("envir".to_string()).into()),
    };
    let what = args.get("what");
    let head = match &what {
        Value::Vector(v) if v.kind() == Kind::Character => match v.data() {
            VectorData::Character(s) if s.len() == 1 => s[0].as_deref().map(Expr::symbol),
            _ => None,
        },
        _ => None,
    };
    let fun = match (&what, &head) {
        (Value::Function(f), _) => f.clone(),
        (_, Some(Expr::Symbol(name))) => interp.find_function(name, &env)?,
        _ => return Err(Message::WhatMustBeFunction.into()),
    };
    let list = match args.get("args") {
        Value::Vector(v) if v.kind() == Kind::List => v,
        Value::Missing => Vector::list(Vec::new()),
        _ => return Err(Message::SecondArgumentMustBeList.into()),
    };
    let names = names_of(&list);
    let items = match list.data() {
        VectorData::List(items) => items.clone(),
        _ => Vec::new(),
    };
    let values: Vec<(Option<String>, Value)> = items
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let name = names
                .as_ref()
                .and_then(|n| n[i].as_deref())
                .filter(|n| !n.is_empty())
                .map(str::to_string);
            (name, value)
        })
        .collect();
    let call_args = values
        .iter()
        .map(|(name, value)| Arg {
            name: name.clone(),
            value: Expr::from_value(value),
        })
        .collect();
    let head = head.unwrap_or_else(|| Expr::Constant(what.clone()));
    let call = Expr::Call(Box::new(head), call_args);
    interp.call_with(&fun, call, values, &env)
}

/// Left fold; with `accumulate` every intermediate value is kept
fn builtin_reduce(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let f = match_fun(interp, args.get("f"), &args.env)?;
    let accumulate = casts::flag("accumulate")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("accumulate"))?;
    let accumulate = to_bool(&accumulate).unwrap_or(false);
    let (mut items, _) = elements(interp, args.get("x"))?;
    if !args.is_missing("init") {
        items.insert(0, args.get("init"));
    }
    let mut items = items.into_iter();
    let Some(mut acc) = items.next() else {
        return Ok(if accumulate {
            Value::Vector(Vector::list(Vec::new()))
        } else {
            Value::Null
        });
    };
    let mut steps = vec![acc.clone()];
    let call = Expr::call(
        "f",
        vec![Arg::positional(Expr::symbol("init")), Arg::positional(Expr::symbol("x"))],
    );
    for item in items {
        acc = interp.call_with(&f, call.clone(), vec![(None, acc), (None, item)], &args.env)?;
        if accumulate {
            steps.push(acc.clone());
        }
    }
    if accumulate {
        return simplify(interp, steps, None);
    }
    Ok(acc)
}

fn builtin_filter(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let f = match_fun(interp, args.get("f"), &args.env)?;
    let x = match args.get("x") {
        Value::Vector(v) => v,
        Value::Null => return Ok(Value::Null),
        other => return Err(Message::InvalidArgument(format!("x ({})", other.type_name())).into()),
    };
    let (items, _) = elements(interp, Value::Vector(x.clone()))?;
    let mut keep = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        let flag = match call_fun(interp, &f, item, i, &[], &args.env)? {
            Value::Vector(v) => logicals(interp, &v)?.first().copied().flatten(),
            _ => None,
        };
        if flag == Some(true) {
            keep.push(i);
        }
    }
    Ok(Value::Vector(reorder(&x, &keep)))
}
