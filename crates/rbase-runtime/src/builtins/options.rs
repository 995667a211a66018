//! `options` and `getOption`

use crate::args::Args;
use crate::builtins::{force_dots, BuiltinSpec};
use crate::casts::{self, to_str};
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::value::{Value, Vector, VectorData};

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("options", &["..."], builtin_options).custom_visibility(),
    BuiltinSpec::eager("getOption", &["x", "default"], builtin_get_option),
];

enum Request {
    Query(String),
    Set(String, Value),
}

/// Flatten `...` into queries and assignments, in argument order
fn requests(interp: &mut Interpreter, args: &Args) -> RResult<Vec<Request>> {
    let mut out = Vec::new();
    for dot in force_dots(interp, args)? {
        match (dot.name, dot.value) {
            (Some(name), value) if !name.is_empty() => out.push(Request::Set(name, value)),
            (_, Value::Null) => {}
            (_, Value::Vector(v)) => match v.data() {
                VectorData::Character(names) => {
                    out.extend(names.iter().flatten().map(|n| Request::Query(n.to_string())));
                }
                VectorData::List(items) => {
                    let names = v.names().ok_or(Message::ListHasNoValidNames)?;
                    let mut any = false;
                    for (name, item) in names.iter().zip(items) {
                        if let Some(name) = name.as_deref().filter(|n| !n.is_empty()) {
                            out.push(Request::Set(name.to_string(), item.clone()));
                            any = true;
                        }
                    }
                    if !any && !items.is_empty() {
                        return Err(Message::ListHasNoValidNames.into());
                    }
                }
                _ => return Err(Message::InvalidArgument("options".to_string()).into()),
            },
            _ => return Err(Message::InvalidArgument("options".to_string()).into()),
        }
    }
    Ok(out)
}

fn builtin_options(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    interp.ctx.visible = true;
    if args.dots().is_empty() {
        return Ok(interp.ctx.options.as_list());
    }

    let mut entries = Vec::new();
    let mut changed = false;
    for request in requests(interp, args)? {
        match request {
            Request::Query(name) => {
                let value = interp.ctx.options.get(&name).cloned().unwrap_or(Value::Null);
                entries.push((name, value));
            }
            Request::Set(name, value) => {
                let old = interp.ctx.options.set(&name, value)?;
                entries.push((name, old));
                changed = true;
            }
        }
    }
    interp.ctx.visible = !changed;
    Ok(Value::Vector(Vector::named_list(entries)))
}

fn builtin_get_option(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let x = casts::string_scalar("x").apply(interp, args.get("x"))?;
    let name = to_str(&x).ok_or_else(|| Message::InvalidArgument("x".to_string()))?;
    match interp.ctx.options.get(&name) {
        Some(value) => Ok(value.clone()),
        None => match args.get("default") {
            Value::Missing => Ok(Value::Null),
            default => Ok(default),
        },
    }
}
