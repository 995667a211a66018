//! Environments, the search path and call-stack reflection

use crate::args::Args;
use crate::ast::{Arg, Expr};
use crate::builtins::lang::match_special;
use crate::builtins::{strings, BuiltinSpec};
use crate::casts::{self, to_bool, to_int, to_str};
use crate::deparse::deparse_expr;
use crate::env::Environment;
use crate::error::{Message, RResult};
use crate::interpreter::Interpreter;
use crate::value::{Function, Kind, RStr, Value, Vector, VectorData};
use tracing::debug;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::eager("environment", &["fun"], builtin_environment),
    BuiltinSpec::eager("new.env", &["hash", "parent", "size"], builtin_new_env),
    BuiltinSpec::eager("globalenv", &[], builtin_globalenv),
    BuiltinSpec::eager("emptyenv", &[], builtin_emptyenv),
    BuiltinSpec::eager("baseenv", &[], builtin_baseenv),
    BuiltinSpec::eager("parent.env", &["env"], builtin_parent_env),
    BuiltinSpec::eager("parent.frame", &["n"], builtin_parent_frame),
    BuiltinSpec::eager("environmentName", &["env"], builtin_environment_name),
    BuiltinSpec::eager("get", &["x", "envir", "mode", "inherits"], builtin_get),
    BuiltinSpec::eager("get0", &["x", "envir", "mode", "inherits", "ifnotfound"], builtin_get0),
    BuiltinSpec::eager("exists", &["x", "envir", "mode", "inherits"], builtin_exists),
    BuiltinSpec::eager("assign", &["x", "value", "envir", "inherits"], builtin_assign).invisible(),
    BuiltinSpec::eager("ls", &["name", "envir", "all.names", "sorted"], builtin_ls),
    BuiltinSpec::special("rm", &["...", "list", "envir", "inherits"], builtin_rm).invisible(),
    BuiltinSpec::eager("attach", &["what", "pos", "name"], builtin_attach).invisible(),
    BuiltinSpec::eager("detach", &["name", "pos"], builtin_detach).invisible(),
    BuiltinSpec::eager("search", &[], builtin_search),
    BuiltinSpec::eager("lockEnvironment", &["env", "bindings"], builtin_lock_environment).invisible(),
    BuiltinSpec::eager("environmentIsLocked", &["env"], builtin_environment_is_locked),
    BuiltinSpec::eager("lockBinding", &["sym", "env"], builtin_lock_binding).invisible(),
    BuiltinSpec::eager("unlockBinding", &["sym", "env"], builtin_unlock_binding).invisible(),
    BuiltinSpec::eager("bindingIsLocked", &["sym", "env"], builtin_binding_is_locked),
    BuiltinSpec::eager("sys.function", &["which"], builtin_sys_function),
    BuiltinSpec::eager("sys.call", &["which"], builtin_sys_call),
    BuiltinSpec::eager("nargs", &[], builtin_nargs),
];

fn env_arg(value: Value, default: &Environment) -> RResult<Environment> {
    match value {
        Value::Missing => Ok(default.clone()),
        Value::Env(env) => Ok(env),
        Value::Null => Err(Message::NullEnvironment.into()),
        _ => Err(Message::NotAnEnvironment.into()),
    }
}

/// Name given as a string or a quoted symbol
fn name_arg(interp: &mut Interpreter, value: Value, formal: &'static str) -> RResult<String> {
    if let Value::Lang(expr) = &value {
        if let Some(name) = expr.as_symbol() {
            return Ok(name.to_string());
        }
    }
    let name = casts::string_scalar(formal).apply(interp, value)?;
    to_str(&name).ok_or_else(|| Message::InvalidArgument(formal.to_string()).into())
}

fn inherits_arg(interp: &mut Interpreter, args: &Args, default: bool) -> RResult<bool> {
    let inherits = casts::flag("inherits")
        .default_if_missing(Value::lgl(default))
        .apply(interp, args.get("inherits"))?;
    Ok(to_bool(&inherits).unwrap_or(default))
}

// ============================================================================
// Constructors and accessors
// ============================================================================

fn builtin_environment(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    match args.get("fun") {
        Value::Missing | Value::Null => Ok(Value::Env(args.env.clone())),
        Value::Function(Function::Closure(closure)) => Ok(Value::Env(closure.env.clone())),
        _ => Ok(Value::Null),
    }
}

fn builtin_new_env(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let parent = env_arg(args.get("parent"), &args.env)?;
    casts::int_scalar("size")
        .default_if_missing(Value::int(29))
        .apply(interp, args.get("size"))?;
    Ok(Value::Env(Environment::new(Some(parent))))
}

fn builtin_globalenv(interp: &mut Interpreter, _args: &Args) -> RResult<Value> {
    Ok(Value::Env(interp.ctx.global().clone()))
}

fn builtin_emptyenv(interp: &mut Interpreter, _args: &Args) -> RResult<Value> {
    Ok(Value::Env(interp.ctx.empty().clone()))
}

fn builtin_baseenv(interp: &mut Interpreter, _args: &Args) -> RResult<Value> {
    Ok(Value::Env(interp.ctx.base().clone()))
}

fn builtin_parent_env(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let env = env_arg(args.get("env"), &args.env)?;
    env.parent()
        .map(Value::Env)
        .ok_or_else(|| Message::EmptyEnvHasNoParent.into())
}

/// Environment the `n`-th enclosing closure call was made from
fn builtin_parent_frame(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let n = casts::int_scalar("n")
        .default_if_missing(Value::int(1))
        .apply(interp, args.get("n"))?;
    let n = match to_int(&n) {
        Some(n) if n >= 1 => n,
        _ => return Err(Message::InvalidArgument("n".to_string()).into()),
    };
    let mut env = args.env.clone();
    for _ in 0..n {
        match interp.frame_of(&env) {
            Some(frame) => env = frame.caller.clone(),
            None => return Ok(Value::Env(interp.ctx.global().clone())),
        }
    }
    Ok(Value::Env(env))
}

/// Reported name of the well-known environments, `""` otherwise
fn builtin_environment_name(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let name = match args.get("env") {
        Value::Env(env) if env.ptr_eq(interp.ctx.global()) => "R_GlobalEnv".to_string(),
        Value::Env(env) => env.name().unwrap_or_default(),
        _ => String::new(),
    };
    Ok(Value::str(&name))
}

// ============================================================================
// Lookup and assignment
// ============================================================================

/// Whether `value` has storage mode `mode`
fn mode_matches(value: &Value, mode: &str) -> bool {
    match mode {
        "any" => true,
        "function" => matches!(value, Value::Function(_)),
        "environment" => matches!(value, Value::Env(_)),
        "NULL" => value.is_null(),
        "name" | "symbol" => matches!(value, Value::Lang(e) if e.as_symbol().is_some()),
        "call" | "language" => matches!(value, Value::Lang(e) if e.as_symbol().is_none()),
        "numeric" => matches!(value, Value::Vector(v) if matches!(v.kind(), Kind::Integer | Kind::Double)),
        mode => match (value, Kind::from_mode(mode)) {
            (Value::Vector(v), Some(kind)) => v.kind() == kind,
            _ => false,
        },
    }
}

/// Search for `name` of `mode`, forcing promises on the way
fn find(interp: &mut Interpreter, name: &str, env: &Environment, mode: &str, inherits: bool) -> RResult<Option<Value>> {
    let mut current = Some(env.clone());
    while let Some(frame) = current {
        if let Some(value) = frame.get_local(name) {
            let value = interp.force_value(value)?;
            if mode_matches(&value, mode) {
                return Ok(Some(value));
            }
        }
        if !inherits {
            break;
        }
        current = frame.parent();
    }
    Ok(None)
}

struct Lookup {
    name: String,
    env: Environment,
    mode: String,
    inherits: bool,
}

fn lookup_args(interp: &mut Interpreter, args: &Args) -> RResult<Lookup> {
    let name = name_arg(interp, args.get("x"), "x")?;
    let env = env_arg(args.get("envir"), &args.env)?;
    let mode = casts::string_scalar("mode")
        .default_if_missing(Value::str("any"))
        .apply(interp, args.get("mode"))?;
    let mode = to_str(&mode).unwrap_or_else(|| "any".to_string());
    let inherits = inherits_arg(interp, args, true)?;
    Ok(Lookup {
        name,
        env,
        mode,
        inherits,
    })
}

fn builtin_get(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let l = lookup_args(interp, args)?;
    match find(interp, &l.name, &l.env, &l.mode, l.inherits)? {
        Some(value) => Ok(value),
        None if l.mode == "any" => Err(Message::ObjectNotFound(l.name).into()),
        None => Err(Message::ObjectOfModeNotFound(l.name, l.mode).into()),
    }
}

fn builtin_get0(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let l = lookup_args(interp, args)?;
    match find(interp, &l.name, &l.env, &l.mode, l.inherits)? {
        Some(value) => Ok(value),
        None => match args.get("ifnotfound") {
            Value::Missing => Ok(Value::Null),
            other => Ok(other),
        },
    }
}

fn builtin_exists(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let l = lookup_args(interp, args)?;
    let found = find(interp, &l.name, &l.env, &l.mode, l.inherits)?.is_some();
    Ok(Value::lgl(found))
}

fn builtin_assign(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let name = name_arg(interp, args.get("x"), "x")?;
    let value = match args.get("value") {
        Value::Missing => return Err(Message::ArgumentMissing("value".to_string()).into()),
        value => value,
    };
    let env = env_arg(args.get("envir"), &args.env)?;
    if inherits_arg(interp, args, false)? {
        env.assign_inherited(&name, value.clone(), &env)?;
    } else {
        env.define(&name, value.clone())?;
    }
    Ok(value)
}

fn builtin_ls(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let env = match (args.get("name"), args.get("envir")) {
        (Value::Env(env), _) => env,
        (_, envir) => env_arg(envir, &args.env)?,
    };
    let all = casts::flag("all.names")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("all.names"))?;
    // bindings are kept in name order, so `sorted` needs no work
    casts::flag("sorted")
        .default_if_missing(Value::lgl(true))
        .apply(interp, args.get("sorted"))?;
    Ok(Value::Vector(Vector::strings(env.names(to_bool(&all).unwrap_or(false)))))
}

/// Names from `...` (symbols or strings) and `list`
fn builtin_rm(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    let matched = match_special(&["...", "list", "envir", "inherits"], args, env)?;
    let mut names = Vec::new();
    for (_, expr) in &matched.dots {
        match expr {
            Expr::Symbol(name) => names.push(name.clone()),
            Expr::Constant(Value::Vector(v)) if v.kind() == Kind::Character => {
                if let VectorData::Character(s) = v.data() {
                    names.extend(s.iter().flatten().map(|s| s.to_string()));
                }
            }
            _ => return Err(Message::DotsMustBeNames.into()),
        }
    }
    let eval_slot = |interp: &mut Interpreter, i: usize| -> RResult<Value> {
        match &matched.values[i] {
            Some(expr) => interp.eval(expr, env),
            None => Ok(Value::Missing),
        }
    };
    match eval_slot(interp, 1)? {
        Value::Missing | Value::Null => {}
        Value::Vector(v) if v.kind() == Kind::Character => {
            names.extend(strings(interp, &v)?.into_iter().flatten().map(|s| s.to_string()));
        }
        _ => return Err(Message::InvalidFirstArgument.into()),
    }
    let target = env_arg(eval_slot(interp, 2)?, env)?;
    let inherits = match eval_slot(interp, 3)? {
        Value::Missing => false,
        other => to_bool(&casts::flag("inherits").apply(interp, other)?).unwrap_or(false),
    };

    for name in names {
        let owner = if inherits {
            target.lookup(&name).map(|(_, owner)| owner)
        } else {
            Some(target.clone())
        };
        let removed = match owner {
            Some(owner) if owner.ptr_eq(interp.ctx.base()) => {
                return Err(Message::EnvRemoveVariables("base".to_string()).into());
            }
            Some(owner) if owner.ptr_eq(interp.ctx.empty()) => {
                return Err(Message::EnvRemoveVariables("empty".to_string()).into());
            }
            Some(owner) => owner.remove(&name)?,
            None => false,
        };
        if !removed {
            interp.warning(Message::ObjectNotFound(name));
        }
    }
    Ok(Value::Null)
}

// ============================================================================
// Search path
// ============================================================================

fn search_name(interp: &Interpreter, env: &Environment) -> String {
    if env.ptr_eq(interp.ctx.global()) {
        ".GlobalEnv".to_string()
    } else if env.ptr_eq(interp.ctx.base()) {
        "package:base".to_string()
    } else {
        env.name().unwrap_or_default()
    }
}

fn builtin_search(interp: &mut Interpreter, _args: &Args) -> RResult<Value> {
    let names: Vec<String> = interp
        .ctx
        .search_path()
        .iter()
        .map(|env| search_name(interp, env))
        .collect();
    Ok(Value::Vector(Vector::strings(names)))
}

/// Copy a list or environment into a fresh environment at position `pos`
fn builtin_attach(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let path = interp.ctx.search_path();
    let pos = casts::int_scalar("pos")
        .default_if_missing(Value::int(2))
        .apply(interp, args.get("pos"))?;
    let pos = match to_int(&pos) {
        Some(p) if p >= 2 && (p as usize) <= path.len() => p as usize,
        _ => return Err(Message::InvalidPos("pos".to_string()).into()),
    };
    let what = args.get("what");
    let default_name = match args.call.as_ref() {
        Expr::Call(_, call_args) => call_args
            .iter()
            .find(|a| a.name.is_none() || a.name.as_deref() == Some("what"))
            .map(|a| deparse_expr(&a.value))
            .unwrap_or_default(),
        _ => String::new(),
    };
    let name = match args.get("name") {
        Value::Missing => default_name,
        other => name_arg(interp, other, "name")?,
    };

    // insert between path[pos - 2] and path[pos - 1]
    let before = &path[pos - 2];
    let attached = Environment::named(name.clone(), before.parent());
    match &what {
        Value::Env(env) => {
            for (binding, value) in env.bindings() {
                attached.define(&binding, value)?;
            }
        }
        Value::Vector(v) if v.kind() == Kind::List => {
            let names = v.names().map(<[Option<RStr>]>::to_vec).unwrap_or_default();
            if let VectorData::List(items) = v.data() {
                for (item_name, value) in names.iter().zip(items) {
                    match item_name.as_deref() {
                        Some(n) if !n.is_empty() => attached.define(n, value.clone())?,
                        _ => {}
                    }
                }
            }
        }
        Value::Null => {}
        _ => return Err(Message::AttachBadType.into()),
    }

    before.set_parent(Some(attached.clone()));
    debug!(name = %name, pos, "attached environment");
    Ok(Value::Env(attached))
}

fn builtin_detach(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let path = interp.ctx.search_path();
    let index = match args.get("name") {
        Value::Missing => {
            let pos = casts::int_scalar("pos")
                .default_if_missing(Value::int(2))
                .apply(interp, args.get("pos"))?;
            to_int(&pos).filter(|&p| p >= 1).map(|p| p as usize - 1)
        }
        Value::Vector(v) if v.kind() == Kind::Character => {
            let name = to_str(&Value::Vector(v)).unwrap_or_default();
            path.iter().position(|env| search_name(interp, env) == name)
        }
        Value::Vector(v) if v.kind().is_numeric() => {
            let pos = casts::int_scalar("name").apply(interp, Value::Vector(v))?;
            to_int(&pos).filter(|&p| p >= 1).map(|p| p as usize - 1)
        }
        _ => return Err(Message::InvalidArgument("name".to_string()).into()),
    };
    let index = match index {
        Some(i) if i < path.len() => i,
        _ => return Err(Message::InvalidPos("name".to_string()).into()),
    };
    let env = &path[index];
    if env.ptr_eq(interp.ctx.base()) {
        return Err(Message::EnvDetachBase.into());
    }
    if index == 0 {
        return Err(Message::InvalidPos("name".to_string()).into());
    }
    path[index - 1].set_parent(env.parent());
    debug!(name = %search_name(interp, env), "detached environment");
    Ok(Value::Env(env.clone()))
}

// ============================================================================
// Locking
// ============================================================================

fn builtin_lock_environment(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let env = match args.get("env") {
        Value::Env(env) => env,
        _ => return Err(Message::NotAnEnvironment.into()),
    };
    let bindings = casts::flag("bindings")
        .default_if_missing(Value::lgl(false))
        .apply(interp, args.get("bindings"))?;
    env.lock(to_bool(&bindings).unwrap_or(false));
    Ok(Value::Null)
}

fn builtin_environment_is_locked(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    match args.get("env") {
        Value::Env(env) => Ok(Value::lgl(env.is_locked())),
        _ => Err(Message::NotAnEnvironment.into()),
    }
}

fn binding_args(interp: &mut Interpreter, args: &Args) -> RResult<(String, Environment)> {
    let name = name_arg(interp, args.get("sym"), "sym")?;
    match args.get("env") {
        Value::Env(env) => Ok((name, env)),
        _ => Err(Message::NotAnEnvironment.into()),
    }
}

fn builtin_lock_binding(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let (name, env) = binding_args(interp, args)?;
    env.lock_binding(&name)?;
    Ok(Value::Null)
}

fn builtin_unlock_binding(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let (name, env) = binding_args(interp, args)?;
    if !env.has_local(&name) {
        return Err(Message::NoBindingFor(name).into());
    }
    env.unlock_binding(&name);
    Ok(Value::Null)
}

fn builtin_binding_is_locked(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let (name, env) = binding_args(interp, args)?;
    if !env.has_local(&name) {
        return Err(Message::NoBindingFor(name).into());
    }
    Ok(Value::lgl(env.is_binding_locked(&name)))
}

// ============================================================================
// Call-stack reflection
// ============================================================================

/// Only the current frame (`which = 0`) is supported
fn current_frame_check(interp: &mut Interpreter, args: &Args) -> RResult<()> {
    let which = casts::int_scalar("which")
        .default_if_missing(Value::int(0))
        .apply(interp, args.get("which"))?;
    match to_int(&which) {
        Some(0) => Ok(()),
        _ => Err(Message::NotThatManyFrames.into()),
    }
}

fn builtin_sys_function(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    current_frame_check(interp, args)?;
    match interp.frame_of(&args.env) {
        Some(frame) => Ok(Value::Function(frame.function.clone())),
        None => Err(Message::NotThatManyFrames.into()),
    }
}

fn builtin_sys_call(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    current_frame_check(interp, args)?;
    Ok(interp
        .frame_of(&args.env)
        .map_or(Value::Null, |frame| Value::Lang(frame.call.clone())))
}

fn builtin_nargs(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let n = interp.frame_of(&args.env).map_or(0, |frame| frame.nargs);
    Ok(Value::int(n as i32))
}

#[cfg(test)]
mod tests {
    use crate::builtins::testing::{eval, eval_in};
    use crate::error::Message;
    use crate::interpreter::Interpreter;
    use crate::value::{Value, Vector};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("e <- new.env(); assign(\"x\", 3, envir = e); get(\"x\", envir = e)", "3")]
    #[case("x <- 1; f <- function() { x <- 2; get(\"x\") }; f()", "2")]
    #[case("x <- 1; f <- function() get(\"x\", inherits = TRUE); f()", "1")]
    #[case("f <- function() 1; sum <- 3; get(\"sum\", mode = \"function\")(1, 2)", "3")]
    #[case("get0(\"nope\", ifnotfound = 7)", "7")]
    #[case("exists(\"sum\")", "TRUE")]
    #[case("exists(\"nope\")", "FALSE")]
    #[case("e <- new.env(); exists(\"sum\", envir = e, inherits = FALSE)", "FALSE")]
    #[case("x <- 1; exists(\"x\", mode = \"character\")", "FALSE")]
    #[case("e <- new.env(); assign(\".h\", 1, envir = e); assign(\"b\", 2, envir = e); ls(e)", "\"b\"")]
    #[case("e <- new.env(); assign(\".h\", 1, envir = e); ls(e, all.names = TRUE)", "\".h\"")]
    #[case("environmentName(globalenv())", "\"R_GlobalEnv\"")]
    #[case("environmentName(baseenv())", "\"base\"")]
    #[case("environmentName(new.env())", "\"\"")]
    #[case("identical(parent.env(globalenv()), baseenv())", "TRUE")]
    #[case("f <- function() environment(); identical(parent.env(f()), globalenv())", "TRUE")]
    #[case("f <- function() parent.frame(); identical(f(), globalenv())", "TRUE")]
    #[case("f <- function(a, b) nargs(); f(1, 2)", "2L")]
    #[case("f <- function(x) sys.call(); deparse(f(1 + 2))", "\"f(1 + 2)\"")]
    #[case("f <- function() sys.function(); is.function(f())", "TRUE")]
    fn test_environments(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(eval(source).unwrap(), eval(expected).unwrap(), "{}", source);
    }

    #[test]
    fn test_get_missing_object() {
        assert_eq!(
            eval("get(\"nope\")").unwrap_err().message,
            Message::ObjectNotFound("nope".to_string())
        );
        assert_eq!(
            eval("get(\"pi\", mode = \"function\")").unwrap_err().message,
            Message::ObjectOfModeNotFound("pi".to_string(), "function".to_string())
        );
    }

    #[test]
    fn test_rm_symbols_and_list() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "a <- 1; b <- 2; c <- 3").unwrap();
        eval_in(&mut it, "rm(a, \"b\")").unwrap();
        assert!(!it.ctx.visible);
        eval_in(&mut it, "rm(list = \"c\")").unwrap();
        assert_eq!(eval_in(&mut it, "ls()").unwrap(), Value::Vector(Vector::empty(crate::value::Kind::Character)));
        eval_in(&mut it, "rm(zz)").unwrap();
        assert_eq!(it.ctx.warnings()[0].message, Message::ObjectNotFound("zz".to_string()));
    }

    #[test]
    fn test_locked_environment() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "e <- new.env(); assign(\"x\", 1, envir = e); lockEnvironment(e)").unwrap();
        assert_eq!(
            eval_in(&mut it, "assign(\"y\", 1, envir = e)").unwrap_err().message,
            Message::EnvAddBindings
        );
        eval_in(&mut it, "assign(\"x\", 2, envir = e)").unwrap();
        eval_in(&mut it, "lockBinding(\"x\", e)").unwrap();
        assert_eq!(eval_in(&mut it, "bindingIsLocked(\"x\", e)").unwrap(), Value::lgl(true));
        assert_eq!(
            eval_in(&mut it, "assign(\"x\", 3, envir = e)").unwrap_err().message,
            Message::EnvChangeBinding("x".to_string())
        );
        eval_in(&mut it, "unlockBinding(quote(x), e)").unwrap();
        eval_in(&mut it, "assign(\"x\", 3, envir = e)").unwrap();
        assert_eq!(eval_in(&mut it, "get(\"x\", e)").unwrap(), Value::dbl(3.0));
        assert_eq!(
            eval_in(&mut it, "assign(\"x\", 1, envir = emptyenv())").unwrap_err().message,
            Message::EnvAssignEmpty
        );
    }

    #[test]
    fn test_attach_and_detach() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "attach(list(zed = 42), name = \"mydata\")").unwrap();
        assert_eq!(
            eval_in(&mut it, "search()").unwrap(),
            Value::Vector(Vector::strings([".GlobalEnv", "mydata", "package:base"]))
        );
        assert_eq!(eval_in(&mut it, "zed").unwrap(), Value::dbl(42.0));
        eval_in(&mut it, "detach(\"mydata\")").unwrap();
        assert!(eval_in(&mut it, "zed").is_err());
        assert_eq!(
            eval_in(&mut it, "detach(\"package:base\")").unwrap_err().message,
            Message::EnvDetachBase
        );
        assert_eq!(
            eval_in(&mut it, "attach(list(), pos = 5)").unwrap_err().message,
            Message::InvalidPos("pos".to_string())
        );
    }

    #[test]
    fn test_attach_default_name() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "cfg <- list(k = 1); attach(cfg)").unwrap();
        assert_eq!(
            eval_in(&mut it, "search()[2]").unwrap(),
            Value::Vector(Vector::strings(["cfg"]))
        );
    }

    #[test]
    fn test_attach_environment_copies_bindings() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "e <- new.env(); assign(\"a\", 1, envir = e); attach(e)").unwrap();
        assert_eq!(eval_in(&mut it, "a").unwrap(), Value::dbl(1.0));
        assert_eq!(
            eval_in(&mut it, "search()").unwrap(),
            Value::Vector(Vector::strings([".GlobalEnv", "e", "package:base"]))
        );
    }
}
