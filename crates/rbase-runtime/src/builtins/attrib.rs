//! Attribute access: `attr`, `attributes`, `names`, `dim`, `dimnames`,
//! `class` and friends, plus `structure`, `length`, `nrow` and `ncol`
//!
//! `names`, `dim`, `dimnames` and `class` are validated whenever they are
//! set, whichever entry point sets them.

use crate::args::Args;
use crate::ast::Expr;
use crate::builtins::matrix::apply_dimnames;
use crate::builtins::{force_dots, int_vector, names_of, BuiltinSpec};
use crate::casts::{self, to_bool};
use crate::coerce;
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::na::NA_INTEGER;
use crate::value::{Kind, RStr, Value, Vector, VectorData};

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("attr", &["x", "which", "exact"], builtin_attr),
    BuiltinSpec::eager("attr<-", &["x", "which", "value"], builtin_attr_assign),
    BuiltinSpec::eager("attributes", &["x"], builtin_attributes),
    BuiltinSpec::eager("attributes<-", &["x", "value"], builtin_attributes_assign),
    BuiltinSpec::eager("names", &["x"], builtin_names),
    BuiltinSpec::eager("names<-", &["x", "value"], builtin_names_assign),
    BuiltinSpec::eager("dim", &["x"], builtin_dim),
    BuiltinSpec::eager("dim<-", &["x", "value"], builtin_dim_assign),
    BuiltinSpec::eager("dimnames", &["x"], builtin_dimnames),
    BuiltinSpec::eager("dimnames<-", &["x", "value"], builtin_dimnames_assign),
    BuiltinSpec::eager("levels", &["x"], builtin_levels),
    BuiltinSpec::eager("class", &["x"], builtin_class),
    BuiltinSpec::eager("oldClass", &["x"], builtin_old_class),
    BuiltinSpec::eager("class<-", &["x", "value"], builtin_class_assign),
    BuiltinSpec::eager("oldClass<-", &["x", "value"], builtin_class_assign),
    BuiltinSpec::eager("unclass", &["x"], builtin_unclass),
    BuiltinSpec::eager("inherits", &["x", "what", "which"], builtin_inherits),
    BuiltinSpec::eager("structure", &[".Data", "..."], builtin_structure),
    BuiltinSpec::eager("length", &["x"], builtin_length),
    BuiltinSpec::eager("nrow", &["x"], builtin_nrow),
    BuiltinSpec::eager("ncol", &["x"], builtin_ncol),
];

// ============================================================================
// Validated setters
// ============================================================================

/// Set one attribute on `x`, routing the reserved names through their checks
pub(crate) fn set_attribute(x: &mut Vector, name: &str, value: Value) -> RResult<()> {
    match name {
        "names" => set_names(x, value),
        "dim" => set_dim(x, value),
        "dimnames" => apply_dimnames(x, &value),
        "class" => set_class(x, value),
        _ => {
            x.set_attr(name, value);
            Ok(())
        }
    }
}

/// `names(x) <- value`; a shorter value is padded with NA
pub(crate) fn set_names(x: &mut Vector, value: Value) -> RResult<()> {
    let names = match value {
        Value::Null => {
            x.set_names(None);
            return Ok(());
        }
        Value::Vector(v) => coerce::coerce(&v, Kind::Character)?.vector,
        other => return Err(Message::CannotCoerce(other.type_name().to_string(), "character".to_string()).into()),
    };
    if names.len() > x.len() {
        return Err(Message::NamesLength(names.len(), x.len()).into());
    }
    let mut entries = match names.into_data() {
        VectorData::Character(c) => c,
        _ => Vec::new(),
    };
    entries.resize(x.len(), None);
    x.set_names(Some(entries));
    Ok(())
}

/// `dim(x) <- value`; names and dimnames are dropped
pub(crate) fn set_dim(x: &mut Vector, value: Value) -> RResult<()> {
    let dims = match value {
        Value::Null => {
            x.remove_attr("dim");
            x.remove_attr("dimnames");
            return Ok(());
        }
        Value::Vector(v) if v.kind().is_numeric() => coerce::coerce(&v, Kind::Integer)?.vector,
        _ => return Err(Message::DimsInvalid.into()),
    };
    let dims = match dims.data() {
        VectorData::Integer(d) => d.clone(),
        _ => Vec::new(),
    };
    if dims.is_empty() || dims.iter().any(|&d| d == NA_INTEGER || d < 0) {
        return Err(Message::DimsInvalid.into());
    }
    let product: i64 = dims.iter().map(|&d| d as i64).product();
    if product != x.len() as i64 {
        return Err(Message::DimsProduct(product, x.len()).into());
    }
    x.set_names(None);
    x.remove_attr("dimnames");
    x.set_attr("dim", Value::Vector(Vector::integer(dims)));
    Ok(())
}

/// `class(x) <- value`; `NULL` or a zero-length value removes the class
pub(crate) fn set_class(x: &mut Vector, value: Value) -> RResult<()> {
    match value {
        Value::Null => {
            x.remove_attr("class");
            Ok(())
        }
        Value::Vector(v) if v.is_empty() => {
            x.remove_attr("class");
            Ok(())
        }
        Value::Vector(v) if v.kind() == Kind::Character => {
            x.set_attr("class", Value::Vector(v.strip_attributes()));
            Ok(())
        }
        _ => Err(Message::InvalidClassAttribute.into()),
    }
}

/// Target of a replacement function; only vectors carry attributes
fn attribute_target(value: Value) -> RResult<Vector> {
    match value {
        Value::Vector(v) => Ok(v),
        other => Err(Message::CannotSetAttribute(other.type_name().to_string()).into()),
    }
}

fn which_arg(interp: &mut Interpreter, args: &Args) -> RResult<String> {
    let which = casts::Cast::new("which")
        .must_not_be_missing()
        .must_be(
            |v| matches!(v, Value::Vector(x) if x.kind() == Kind::Character && x.len() == 1),
            Message::ExactlyOneWhich,
        )
        .apply(interp, args.get("which"))?;
    casts::to_str(&which).ok_or_else(|| Message::ExactlyOneWhich.into())
}

// ============================================================================
// attr, attributes
// ============================================================================

/// Exact lookup, then a unique partial match unless `exact`
pub(crate) fn lookup_attr(x: &Vector, which: &str, exact: bool) -> Value {
    let Some(attributes) = x.attributes() else {
        return Value::Null;
    };
    if let Some(value) = attributes.get(which) {
        return value.clone();
    }
    if exact {
        return Value::Null;
    }
    let mut partial = attributes.iter().filter(|(name, _)| name.starts_with(which));
    match (partial.next(), partial.next()) {
        (Some((_, value)), None) => value.clone(),
        _ => Value::Null,
    }
}

fn builtin_attr(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let which = which_arg(interp, args)?;
    let exact = casts::flag("exact")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("exact"))?;
    match args.get("x") {
        Value::Vector(x) => Ok(lookup_attr(&x, &which, to_bool(&exact).unwrap_or(false))),
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        _ => Ok(Value::Null),
    }
}

fn builtin_attr_assign(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let which = which_arg(interp, args)?;
    let value = args.get("value");
    let mut x = match args.get("x") {
        Value::Null if value.is_null() => return Ok(Value::Null),
        other => attribute_target(other)?,
    };
    set_attribute(&mut x, &which, value)?;
    Ok(Value::Vector(x))
}

/// All attributes as a named list, `names` first
pub(crate) fn attributes_list(x: &Vector) -> Value {
    let Some(attributes) = x.attributes() else {
        return Value::Null;
    };
    if attributes.is_empty() {
        return Value::Null;
    }
    let mut entries: Vec<(String, Value)> = Vec::with_capacity(attributes.len());
    if let Some(names) = attributes.get("names") {
        entries.push(("names".to_string(), names.clone()));
    }
    entries.extend(
        attributes
            .iter()
            .filter(|(name, _)| *name != "names")
            .map(|(name, value)| (name.to_string(), value.clone())),
    );
    Value::Vector(Vector::named_list(entries))
}

fn builtin_attributes(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    match args.get("x") {
        Value::Vector(x) => Ok(attributes_list(&x)),
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        _ => Ok(Value::Null),
    }
}

/// Named entries of a list value, `dim` moved to the front
fn named_entries(value: &Vector) -> RResult<Vec<(String, Value)>> {
    let names = names_of(value).unwrap_or_default();
    let items: Vec<Value> = (0..value.len()).map(|i| value.data().element(i)).collect();
    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match names.get(i).cloned().flatten() {
            Some(name) if !name.is_empty() => entries.push((name.to_string(), item)),
            _ => return Err(Message::AttributesMustBeNamed.into()),
        }
    }
    entries.sort_by_key(|(name, _)| name != "dim");
    Ok(entries)
}

fn builtin_attributes_assign(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let value = args.get("value");
    let mut x = match args.get("x") {
        Value::Null if value.is_null() => return Ok(Value::Null),
        Value::Null => Vector::list(Vec::new()),
        other => attribute_target(other)?,
    };
    x.set_attributes(None);
    match value {
        Value::Null => {}
        Value::Vector(list) if list.kind() == Kind::List || list.is_empty() => {
            for (name, item) in named_entries(&list)? {
                set_attribute(&mut x, &name, item)?;
            }
        }
        _ => return Err(Message::AttributesMustBeNamed.into()),
    }
    Ok(Value::Vector(x))
}

// ============================================================================
// names, dim, dimnames, levels
// ============================================================================

fn builtin_names(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    match args.get("x") {
        Value::Vector(x) => {
            if let Some(names) = x.names() {
                return Ok(Value::Vector(Vector::character(names.to_vec())));
            }
            // one-dimensional arrays report their dimnames
            if x.dim().map_or(false, |d| d.len() == 1) {
                if let Some(Value::Vector(dn)) = x.attr("dimnames") {
                    return Ok(dn.data().element(0));
                }
            }
            Ok(Value::Null)
        }
        Value::Env(env) => {
            let mut names = env.names(true);
            names.sort();
            Ok(Value::Vector(Vector::strings(names)))
        }
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        _ => Ok(Value::Null),
    }
}

fn builtin_names_assign(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let value = args.get("value");
    let mut x = match args.get("x") {
        Value::Null => return Ok(Value::Null),
        other => attribute_target(other)?,
    };
    set_names(&mut x, value)?;
    Ok(Value::Vector(x))
}

fn builtin_dim(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(args.get("x").attr("dim").cloned().unwrap_or(Value::Null))
}

fn builtin_dim_assign(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let value = args.get("value");
    let mut x = match args.get("x") {
        Value::Null if value.is_null() => return Ok(Value::Null),
        other => attribute_target(other)?,
    };
    set_dim(&mut x, value)?;
    Ok(Value::Vector(x))
}

fn builtin_dimnames(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(args.get("x").attr("dimnames").cloned().unwrap_or(Value::Null))
}

fn builtin_dimnames_assign(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let value = args.get("value");
    let mut x = match args.get("x") {
        Value::Null if value.is_null() => return Ok(Value::Null),
        other => attribute_target(other)?,
    };
    apply_dimnames(&mut x, &value)?;
    Ok(Value::Vector(x))
}

fn builtin_levels(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(args.get("x").attr("levels").cloned().unwrap_or(Value::Null))
}

// ============================================================================
// Classes
// ============================================================================

fn type_class(value: &Value) -> &'static str {
    match value {
        Value::Null => "NULL",
        Value::Vector(v) => match v.kind() {
            Kind::Raw => "raw",
            Kind::Logical => "logical",
            Kind::Integer => "integer",
            Kind::Double => "numeric",
            Kind::Complex => "complex",
            Kind::Character => "character",
            Kind::List => "list",
        },
        Value::Function(_) => "function",
        Value::Env(_) => "environment",
        Value::Lang(expr) => match expr.as_ref() {
            Expr::Symbol(_) => "name",
            Expr::Call(head, _) => match head.as_ref() {
                Expr::Symbol(s) if s == "if" => "if",
                Expr::Symbol(s) if s == "{" => "{",
                Expr::Symbol(s) if s == "(" => "(",
                Expr::Symbol(s) if s == "<-" => "<-",
                Expr::Symbol(s) if s == "=" => "=",
                _ => "call",
            },
            _ => "call",
        },
        Value::Missing => "name",
        Value::Dots(_) => "...",
        Value::Promise(_) => "promise",
    }
}

fn array_class(value: &Value) -> Option<&'static [&'static str]> {
    let dim = value.as_vector()?.dim()?;
    Some(if dim.len() == 2 { &["matrix", "array"] } else { &["array"] })
}

/// `class(x)`: the class attribute, or the implicit class
pub(crate) fn class_of(value: &Value) -> Vec<RStr> {
    if let Some(class) = value.as_vector().and_then(Vector::class) {
        return class.iter().map(|c| c.clone().unwrap_or_else(|| RStr::from("NA"))).collect();
    }
    match array_class(value) {
        Some(classes) => classes.iter().map(|&c| RStr::from(c)).collect(),
        None => vec![RStr::from(type_class(value))],
    }
}

/// Class vector used by `inherits`: arrays also inherit their element type
fn dispatch_class(value: &Value) -> Vec<RStr> {
    let mut class = class_of(value);
    if value.as_vector().and_then(Vector::class).is_none() && array_class(value).is_some() {
        class.push(RStr::from(type_class(value)));
    }
    class
}

fn builtin_class(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let class = class_of(&args.get("x"));
    Ok(Value::Vector(Vector::character(class.into_iter().map(Some).collect())))
}

fn builtin_old_class(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(args.get("x").attr("class").cloned().unwrap_or(Value::Null))
}

fn builtin_class_assign(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let value = args.get("value");
    let mut x = match args.get("x") {
        Value::Null if value.is_null() => return Ok(Value::Null),
        other => attribute_target(other)?,
    };
    set_class(&mut x, value)?;
    Ok(Value::Vector(x))
}

fn builtin_unclass(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    match args.get("x") {
        Value::Vector(mut x) => {
            if x.attr("class").is_some() {
                x.remove_attr("class");
            }
            Ok(Value::Vector(x))
        }
        other => Ok(other),
    }
}

fn builtin_inherits(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let what = match args.get("what") {
        Value::Vector(v) if v.kind() == Kind::Character => v,
        _ => return Err(Message::WhatMustBeCharacter.into()),
    };
    let which = casts::flag("which")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("which"))?;
    let which = to_bool(&which).unwrap_or(false);

    let class = dispatch_class(&args.get("x"));
    let what = match what.data() {
        VectorData::Character(w) => w.clone(),
        _ => Vec::new(),
    };
    let positions = what.iter().map(|w| {
        w.as_ref()
            .and_then(|w| class.iter().position(|c| c == w))
            .map_or(0, |p| p + 1)
    });
    if which {
        Ok(Value::Vector(int_vector(positions)))
    } else {
        Ok(Value::lgl(positions.into_iter().any(|p| p > 0)))
    }
}

// ============================================================================
// structure, length, nrow, ncol
// ============================================================================

fn reserved_name(name: &str) -> &str {
    match name {
        ".Names" => "names",
        ".Dim" => "dim",
        ".Dimnames" => "dimnames",
        ".Label" => "levels",
        other => other,
    }
}

fn builtin_structure(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let data = args.get(".Data");
    if data.is_missing() {
        return Err(Message::ArgumentMissing(".Data".to_string()).into());
    }
    let attributes = force_dots(interp, args)?;
    if attributes.is_empty() {
        return Ok(data);
    }
    let mut x = match data {
        Value::Null => Vector::list(Vec::new()),
        other => attribute_target(other)?,
    };
    for dot in attributes {
        let name = match &dot.name {
            Some(name) if !name.is_empty() => reserved_name(name).to_string(),
            _ => return Err(Message::AttributesMustBeNamed.into()),
        };
        set_attribute(&mut x, &name, dot.value)?;
    }
    Ok(Value::Vector(x))
}

fn builtin_length(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let n = args.get("x").length();
    if n > i32::MAX as usize {
        return Ok(Value::dbl(n as f64));
    }
    Ok(Value::int(n as i32))
}

fn dim_entry(args: &Args, k: usize) -> Value {
    match args.get("x").as_vector().and_then(Vector::dim) {
        Some(d) if d.len() > k => Value::int(d[k] as i32),
        _ => Value::Null,
    }
}

fn builtin_nrow(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(dim_entry(args, 0))
}

fn builtin_ncol(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(dim_entry(args, 1))
}
