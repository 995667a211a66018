//! Language builtins: assignment, control flow, quoting and conditions
//!
//! Most of these are specials; they see the call's argument expressions and
//! decide themselves what to evaluate.

use crate::args::{match_args, Args, Supplied};
use crate::ast::{Arg, Expr};
use crate::builtins::{force_dots, BuiltinSpec};
use crate::casts::{self, to_bool, to_str};
use crate::deparse::{deparse_expr, deparse_lines};
use crate::env::Environment;
use crate::error::{Message, RError, RResult};
use crate::interpreter::Interpreter;
use crate::value::{Function, Kind, Value, Vector, VectorData};
use std::rc::Rc;

pub(crate) static BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec::special("<-", &["x", "value"], builtin_assign).invisible(),
    BuiltinSpec::special("=", &["x", "value"], builtin_assign).invisible(),
    BuiltinSpec::special("<<-", &["x", "value"], builtin_super_assign).invisible(),
    BuiltinSpec::special("{", &["..."], builtin_brace).custom_visibility(),
    BuiltinSpec::special("(", &["x"], builtin_paren),
    BuiltinSpec::special("if", &["cond", "yes", "no"], builtin_if).custom_visibility(),
    BuiltinSpec::special("quote", &["expr"], builtin_quote),
    BuiltinSpec::special("substitute", &["expr", "env"], builtin_substitute),
    BuiltinSpec::special("switch", &["EXPR", "..."], builtin_switch).custom_visibility(),
    BuiltinSpec::special("on.exit", &["expr", "add", "after"], builtin_on_exit).invisible(),
    BuiltinSpec::special("missing", &["x"], builtin_missing),
    BuiltinSpec::eager("invisible", &["x"], builtin_invisible).invisible(),
    BuiltinSpec::eager("force", &["x"], builtin_identity),
    BuiltinSpec::eager("identity", &["x"], builtin_identity),
    BuiltinSpec::eager("stop", &["...", "call."], builtin_stop),
    BuiltinSpec::eager("warning", &["...", "call."], builtin_warning).invisible(),
    BuiltinSpec::eager("deparse", &["expr"], builtin_deparse),
    BuiltinSpec::eager("eval", &["expr", "envir"], builtin_eval).custom_visibility(),
];

// ============================================================================
// Special argument matching
// ============================================================================

/// Matched argument expressions of a special
pub(crate) struct SpecialArgs {
    /// One slot per formal; `None` when absent or empty
    pub values: Vec<Option<Expr>>,
    pub dots: Vec<(Option<String>, Expr)>,
}

/// Match unevaluated arguments against `formals`, splicing `...` from `env`
pub(crate) fn match_special(formals: &[&str], args: &[Arg], env: &Environment) -> RResult<SpecialArgs> {
    let mut supplied = Vec::with_capacity(args.len());
    for arg in args {
        if arg.value.as_symbol() == Some("...") {
            match env.lookup("...") {
                Some((Value::Dots(dots), _)) => {
                    for dot in dots {
                        let expr = match &dot.value {
                            Value::Promise(p) => p.expr().as_ref().clone(),
                            other => Expr::from_value(other),
                        };
                        supplied.push(Supplied::new(dot.name.clone(), quoted(expr)));
                    }
                }
                _ => return Err(Message::DotsOutsideFunction.into()),
            }
            continue;
        }
        supplied.push(Supplied::new(arg.name.clone(), quoted(arg.value.clone())));
    }
    let matched = match_args(formals, supplied)?;
    let values = matched
        .values
        .iter()
        .map(|v| match v {
            Value::Missing => None,
            other => Some(Expr::from_value(other)),
        })
        .collect();
    let dots = matched
        .dots
        .into_iter()
        .map(|d| (d.name, Expr::from_value(&d.value)))
        .collect();
    Ok(SpecialArgs { values, dots })
}

fn quoted(expr: Expr) -> Value {
    match expr {
        Expr::MissingArg => Value::Missing,
        other => Value::Lang(Rc::new(other)),
    }
}

/// Evaluate an optional flag argument of a special
fn eval_flag(
    interp: &mut Interpreter,
    expr: Option<&Expr>,
    name: &'static str,
    default: bool,
    env: &Environment,
) -> RResult<bool> {
    match expr {
        None => Ok(default),
        Some(expr) => {
            let value = interp.eval(expr, env)?;
            let value = casts::flag(name).apply(interp, value)?;
            Ok(to_bool(&value).unwrap_or(default))
        }
    }
}

// ============================================================================
// Assignment
// ============================================================================

fn builtin_assign(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    assign_op(interp, args, env, false)
}

fn builtin_super_assign(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    assign_op(interp, args, env, true)
}

fn assign_op(interp: &mut Interpreter, args: &[Arg], env: &Environment, inherited: bool) -> RResult<Value> {
    let [target, value] = args else {
        return Err(Message::InvalidAssignmentTarget.into());
    };
    let value = interp.eval(&value.value, env)?;
    assign_to(interp, &target.value, value.clone(), env, inherited)?;
    Ok(value)
}

/// Assign to a symbol, or rewrite `f(x, ...) <- v` as `x <- \`f<-\`(x, ..., value = v)`
fn assign_to(
    interp: &mut Interpreter,
    target: &Expr,
    value: Value,
    env: &Environment,
    inherited: bool,
) -> RResult<()> {
    match target {
        Expr::Symbol(name) => bind(interp, name, value, env, inherited),
        Expr::Constant(Value::Vector(v)) if v.kind() == Kind::Character && v.len() == 1 => {
            let name = to_str(&Value::Vector(v.clone())).ok_or(Message::InvalidAssignmentTarget)?;
            bind(interp, &name, value, env, inherited)
        }
        Expr::Call(head, call_args) => {
            let fname = match head.as_ref() {
                Expr::Symbol(name) => name.clone(),
                _ => return Err(Message::InvalidAssignmentTarget.into()),
            };
            let Some((object, rest)) = call_args.split_first() else {
                return Err(Message::InvalidAssignmentTarget.into());
            };
            let lookup_env = match (inherited, env.parent()) {
                (true, Some(parent)) => parent,
                _ => env.clone(),
            };
            let current = interp.eval(&object.value, &lookup_env)?;
            let replacement = interp.find_function(&format!("{}<-", fname), env)?;
            let mut supplied = vec![Supplied::positional(current)];
            for arg in rest {
                let v = match &arg.value {
                    Expr::MissingArg => Value::Missing,
                    other => interp.eval(other, env)?,
                };
                supplied.push(Supplied::new(arg.name.clone(), v));
            }
            supplied.push(Supplied::new(Some("value".to_string()), value));
            let call = interp
                .current_call()
                .unwrap_or_else(|| Rc::new(Expr::call(&format!("{}<-", fname), call_args.to_vec())));
            let updated = interp.apply_values(&replacement, call, supplied, env)?;
            assign_to(interp, &object.value, updated, env, inherited)
        }
        _ => Err(Message::InvalidAssignmentTarget.into()),
    }
}

fn bind(interp: &Interpreter, name: &str, value: Value, env: &Environment, inherited: bool) -> RResult<()> {
    if !inherited {
        return env.define(name, value);
    }
    match env.parent() {
        Some(parent) => parent.assign_inherited(name, value, interp.ctx.global()),
        None => interp.ctx.global().define(name, value),
    }
}

// ============================================================================
// Control flow
// ============================================================================

fn builtin_brace(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    interp.ctx.visible = true;
    let mut last = Value::Null;
    for arg in args {
        last = interp.eval(&arg.value, env)?;
    }
    Ok(last)
}

fn builtin_paren(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    match args {
        [inner] => interp.eval(&inner.value, env),
        _ => Err(Message::ArgumentMissing("x".to_string()).into()),
    }
}

fn builtin_if(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    let (cond, yes) = match args {
        [cond, yes, ..] => (cond, yes),
        _ => return Err(Message::ArgumentOfLengthZero.into()),
    };
    let test = interp.eval(&cond.value, env)?;
    if condition(interp, &test)? {
        interp.eval(&yes.value, env)
    } else if let Some(no) = args.get(2) {
        interp.eval(&no.value, env)
    } else {
        interp.ctx.visible = false;
        Ok(Value::Null)
    }
}

/// Truth value of an `if` / `&&` operand
pub(crate) fn condition(interp: &mut Interpreter, value: &Value) -> RResult<bool> {
    let v = match value {
        Value::Vector(v) => v,
        Value::Null => return Err(Message::ArgumentOfLengthZero.into()),
        _ => return Err(Message::NotInterpretableAsLogical.into()),
    };
    match v.len() {
        0 => return Err(Message::ArgumentOfLengthZero.into()),
        1 => {}
        _ => return Err(Message::ConditionLengthGreaterThanOne.into()),
    }
    let truth = match v.data() {
        VectorData::Character(s) => match &s[0] {
            None => None,
            Some(s) => Some(
                crate::coerce::parse_logical(s).ok_or(Message::NotInterpretableAsLogical)?,
            ),
        },
        VectorData::List(_) => return Err(Message::NotInterpretableAsLogical.into()),
        _ => {
            let logical = interp.coerce(v, Kind::Logical)?;
            match logical.data() {
                VectorData::Logical(b) => b[0],
                _ => None,
            }
        }
    };
    truth.ok_or_else(|| Message::MissingValueTrueFalse.into())
}

fn builtin_switch(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    let matched = match_special(&["EXPR", "..."], args, env)?;
    let Some(selector) = &matched.values[0] else {
        return Err(Message::ArgumentMissing("EXPR".to_string()).into());
    };
    let selector = interp.eval(selector, env)?;
    let selector = match &selector {
        Value::Vector(v) if v.len() == 1 && v.kind().is_atomic() => v.clone(),
        _ => return Err(Message::ExprNotLengthOne.into()),
    };
    let alternatives = &matched.dots;
    if alternatives.is_empty() {
        interp.warning(Message::SwitchNoAlternatives);
        interp.ctx.visible = false;
        return Ok(Value::Null);
    }

    if selector.kind() == Kind::Character {
        let key = to_str(&Value::Vector(selector)).unwrap_or_else(|| "NA".to_string());
        let mut default: Option<usize> = None;
        for (i, (name, expr)) in alternatives.iter().enumerate() {
            match name {
                Some(name) if *name == key => {
                    // fall through empty alternatives
                    let chosen = alternatives[i..]
                        .iter()
                        .map(|(_, e)| e)
                        .find(|e| !matches!(e, Expr::MissingArg));
                    return eval_alternative(interp, chosen, env);
                }
                Some(_) => {}
                None => {
                    if let Some(first) = default {
                        return Err(Message::DuplicateSwitchDefault(
                            deparse_expr(&alternatives[first].1),
                            deparse_expr(expr),
                        )
                        .into());
                    }
                    default = Some(i);
                }
            }
        }
        let chosen = default.map(|d| &alternatives[d].1);
        return eval_alternative(interp, chosen.filter(|e| !matches!(e, Expr::MissingArg)), env);
    }

    let index = interp.coerce(&selector, Kind::Integer)?;
    let index = match index.data() {
        VectorData::Integer(i) => i[0],
        _ => crate::na::NA_INTEGER,
    };
    if index >= 1 && (index as usize) <= alternatives.len() {
        let expr = &alternatives[index as usize - 1].1;
        if matches!(expr, Expr::MissingArg) {
            return Err(Message::EmptyNumericSwitch.into());
        }
        return eval_alternative(interp, Some(expr), env);
    }
    eval_alternative(interp, None, env)
}

fn eval_alternative(interp: &mut Interpreter, expr: Option<&Expr>, env: &Environment) -> RResult<Value> {
    match expr {
        Some(expr) => interp.eval(expr, env),
        None => {
            interp.ctx.visible = false;
            Ok(Value::Null)
        }
    }
}

fn builtin_on_exit(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    let matched = match_special(&["expr", "add", "after"], args, env)?;
    let add = eval_flag(interp, matched.values[1].as_ref(), "add", false, env)?;
    let after = eval_flag(interp, matched.values[2].as_ref(), "after", true, env)?;
    let Some(frame) = interp.frame_of_mut(env) else {
        return Ok(Value::Null);
    };
    if !add {
        frame.on_exit.clear();
    }
    if let Some(expr) = matched.values[0].clone() {
        if after {
            frame.on_exit.push(expr);
        } else {
            frame.on_exit.insert(0, expr);
        }
    }
    Ok(Value::Null)
}

// ============================================================================
// Quoting
// ============================================================================

fn builtin_quote(_interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    let matched = match_special(&["expr"], args, env)?;
    Ok(matched.values[0].clone().map_or(Value::Missing, Expr::into_value))
}

fn builtin_substitute(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    let matched = match_special(&["expr", "env"], args, env)?;
    let expr = matched.values[0].clone().unwrap_or(Expr::MissingArg);
    let target = match &matched.values[1] {
        None => env.clone(),
        Some(e) => match interp.eval(e, env)? {
            Value::Env(target) => target,
            Value::Vector(list) if list.kind() == Kind::List => list_env(&list, env.clone())?,
            _ => return Err(Message::InvalidArgument("env".to_string()).into()),
        },
    };
    if target.ptr_eq(interp.ctx.global()) {
        return Ok(expr.into_value());
    }
    Ok(substitute_expr(&expr, &target).into_value())
}

/// Environment holding the named elements of a list
fn list_env(list: &Vector, parent: Environment) -> RResult<Environment> {
    let env = Environment::new(Some(parent));
    if let (Some(names), VectorData::List(items)) = (list.names(), list.data()) {
        for (name, item) in names.iter().zip(items) {
            if let Some(name) = name.as_deref().filter(|n| !n.is_empty()) {
                env.define(name, item.clone())?;
            }
        }
    }
    Ok(env)
}

/// Replace symbols bound in `env`: promises by their expression, other
/// bindings by their value, `...` by the spliced arguments
pub(crate) fn substitute_expr(expr: &Expr, env: &Environment) -> Expr {
    match expr {
        Expr::Symbol(name) => match env.get_local(name) {
            Some(Value::Promise(p)) => p.expr().as_ref().clone(),
            None | Some(Value::Missing) | Some(Value::Dots(_)) => expr.clone(),
            Some(value) => Expr::from_value(&value),
        },
        Expr::Call(head, args) => {
            let head = substitute_expr(head, env);
            let mut out = Vec::with_capacity(args.len());
            for arg in args {
                if arg.value.as_symbol() == Some("...") {
                    if let Some(Value::Dots(dots)) = env.get_local("...") {
                        out.extend(dots.into_iter().map(|d| Arg {
                            name: d.name,
                            value: match d.value {
                                Value::Promise(p) => p.expr().as_ref().clone(),
                                other => Expr::from_value(&other),
                            },
                        }));
                        continue;
                    }
                }
                out.push(Arg {
                    name: arg.name.clone(),
                    value: substitute_expr(&arg.value, env),
                });
            }
            Expr::Call(Box::new(head), out)
        }
        Expr::Function { formals, body } => Expr::Function {
            formals: formals.clone(),
            body: Rc::new(substitute_expr(body, env)),
        },
        other => other.clone(),
    }
}

// ============================================================================
// Missing arguments
// ============================================================================

fn builtin_missing(interp: &mut Interpreter, args: &[Arg], env: &Environment) -> RResult<Value> {
    let name = match args {
        [arg] => match &arg.value {
            Expr::Symbol(name) => name.clone(),
            Expr::Constant(v @ Value::Vector(_)) => to_str(v).ok_or(Message::InvalidUseOfMissing)?,
            _ => return Err(Message::InvalidUseOfMissing.into()),
        },
        _ => return Err(Message::InvalidUseOfMissing.into()),
    };
    Ok(Value::lgl(is_missing_arg(interp, &name, env, true)?))
}

/// Whether formal `name` of the closure evaluating in `env` was not supplied,
/// following arguments passed down as bare symbols
fn is_missing_arg(interp: &Interpreter, name: &str, env: &Environment, strict: bool) -> RResult<bool> {
    let is_formal = interp.frame_of(env).is_some_and(|frame| match &frame.function {
        Function::Closure(c) => c.formals.iter().any(|f| f.name == name),
        Function::Builtin(_) => false,
    });
    if !is_formal {
        return if strict {
            Err(Message::MissingOnlyForArguments.into())
        } else {
            Ok(false)
        };
    }
    let defaulted = interp
        .frame_of(env)
        .is_some_and(|frame| frame.defaulted.iter().any(|d| d == name));
    match env.get_local(name) {
        Some(Value::Missing) => Ok(true),
        Some(Value::Dots(dots)) => Ok(dots.is_empty()),
        Some(Value::Promise(_)) if defaulted => Ok(true),
        Some(Value::Promise(p)) if !p.is_forced() => match (p.expr().as_symbol(), p.env()) {
            (Some(symbol), Some(origin)) => is_missing_arg(interp, symbol, &origin, false),
            _ => Ok(false),
        },
        _ => Ok(false),
    }
}

// ============================================================================
// Eager builtins
// ============================================================================

/// invisible(x = NULL) -> x
fn builtin_invisible(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    Ok(match args.get("x") {
        Value::Missing => Value::Null,
        other => other,
    })
}

fn builtin_identity(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    match args.get("x") {
        Value::Missing => Err(Message::ArgumentMissing("x".to_string()).into()),
        other => Ok(other),
    }
}

/// Concatenate `...` as character, no separator
fn condition_message(interp: &mut Interpreter, args: &Args) -> RResult<String> {
    let mut text = String::new();
    for dot in force_dots(interp, args)? {
        match dot.value {
            Value::Null => {}
            Value::Vector(v) => {
                let chars = interp.coerce(&v, Kind::Character)?;
                if let VectorData::Character(items) = chars.data() {
                    for item in items {
                        text.push_str(item.as_deref().unwrap_or("NA"));
                    }
                }
            }
            other => text.push_str(&crate::deparse::deparse_value(&other)),
        }
    }
    Ok(text)
}

fn call_flag(interp: &mut Interpreter, args: &Args) -> RResult<bool> {
    let value = casts::flag("call.")
        .default_if_missing(Value::lgl(true))
        .apply(interp, args.get("call."))?;
    Ok(to_bool(&value).unwrap_or(true))
}

/// stop(..., call. = TRUE)
fn builtin_stop(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let with_call = call_flag(interp, args)?;
    let message = Message::Custom(condition_message(interp, args)?);
    Err(match interp.frame_call().filter(|_| with_call) {
        Some(call) => RError::in_call(message, call),
        None => RError::without_call(message),
    })
}

/// warning(..., call. = TRUE)
fn builtin_warning(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let with_call = call_flag(interp, args)?;
    let text = condition_message(interp, args)?;
    let call = interp.frame_call().filter(|_| with_call);
    interp.warning_in(call, Message::Custom(text.clone()));
    Ok(Value::str(&text))
}

/// deparse(expr) -> character
fn builtin_deparse(_interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let lines: Vec<String> = match args.get("expr") {
        Value::Lang(expr) => deparse_expr(&expr).lines().map(str::to_string).collect(),
        Value::Missing => return Err(Message::ArgumentMissing("expr".to_string()).into()),
        other => deparse_lines(&other),
    };
    Ok(Value::Vector(Vector::strings(lines)))
}

/// eval(expr, envir = parent.frame())
fn builtin_eval(interp: &mut Interpreter, args: &Args) -> RResult<Value> {
    let env = match args.get("envir") {
        Value::Missing => args.env.clone(),
        Value::Env(env) => env,
        Value::Vector(list) if list.kind() == Kind::List => list_env(&list, args.env.clone())?,
        Value::Null => return Err(Message::NullEnvironment.into()),
        _ => return Err(Message::InvalidArgument("envir".to_string()).into()),
    };
    interp.ctx.visible = true;
    match args.get("expr") {
        Value::Lang(expr) => interp.eval(&expr, &env),
        Value::Missing => Err(Message::ArgumentMissing("expr".to_string()).into()),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use crate::builtins::testing::{eval, eval_in};
    use crate::error::Message;
    use crate::interpreter::Interpreter;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_assignment_is_invisible() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "x <- 5").unwrap();
        assert!(!it.ctx.visible);
        eval_in(&mut it, "x").unwrap();
        assert!(it.ctx.visible);
    }

    #[test]
    fn test_super_assignment_updates_enclosing() {
        let out = eval("counter <- 0\nf <- function() counter <<- counter + 1\nf(); f()\ncounter").unwrap();
        assert_eq!(out, Value::dbl(2.0));
    }

    #[test]
    fn test_replacement_assignment() {
        let out = eval("x <- c(1, 2)\nnames(x) <- c(\"a\", \"b\")\nnames(x)").unwrap();
        assert_eq!(out, eval("c(\"a\", \"b\")").unwrap());
    }

    #[rstest]
    #[case("if (TRUE) 1 else 2", Value::dbl(1.0))]
    #[case("if (0) 1 else 2", Value::dbl(2.0))]
    #[case("if (\"TRUE\") 1", Value::dbl(1.0))]
    #[case("if (FALSE) 1", Value::Null)]
    fn test_if(#[case] source: &str, #[case] expected: Value) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[rstest]
    #[case("if (NA) 1", Message::MissingValueTrueFalse)]
    #[case("if (logical(0)) 1", Message::ArgumentOfLengthZero)]
    #[case("if (c(TRUE, FALSE)) 1", Message::ConditionLengthGreaterThanOne)]
    #[case("if (\"yes\") 1", Message::NotInterpretableAsLogical)]
    fn test_if_errors(#[case] source: &str, #[case] expected: Message) {
        assert_eq!(eval(source).unwrap_err().message, expected);
    }

    #[test]
    fn test_if_error_names_the_call() {
        let err = eval("if (NA) 1").unwrap_err();
        assert_eq!(err.to_string(), "Error in if (NA) 1 : missing value where TRUE/FALSE needed");
    }

    #[rstest]
    #[case("switch(\"b\", a = , b = , c = 3, 4)", Value::dbl(3.0))]
    #[case("switch(\"z\", a = 1, 2)", Value::dbl(2.0))]
    #[case("switch(2, \"x\", \"y\")", Value::str("y"))]
    #[case("switch(\"z\", a = 1)", Value::Null)]
    #[case("switch(5, 1, 2)", Value::Null)]
    fn test_switch(#[case] source: &str, #[case] expected: Value) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[test]
    fn test_switch_errors() {
        let err = eval("switch(\"z\", 1, 2)").unwrap_err();
        assert_eq!(err.message, Message::DuplicateSwitchDefault("1".to_string(), "2".to_string()));
        let err = eval("switch(1, , 2)").unwrap_err();
        assert_eq!(err.message, Message::EmptyNumericSwitch);
        let err = eval("switch(c(1, 2), 1)").unwrap_err();
        assert_eq!(err.message, Message::ExprNotLengthOne);
    }

    #[test]
    fn test_switch_no_match_is_invisible() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "switch(\"q\", a = 1)").unwrap();
        assert!(!it.ctx.visible);
    }

    #[test]
    fn test_quote_and_deparse() {
        let out = eval("deparse(quote(x + y * 2))").unwrap();
        assert_eq!(out, Value::str("x + y * 2"));
    }

    #[test]
    fn test_substitute_returns_argument_expression() {
        let out = eval("f <- function(x) substitute(x)\ndeparse(f(a + b))").unwrap();
        assert_eq!(out, Value::str("a + b"));
    }

    #[test]
    fn test_substitute_splices_dots() {
        let out = eval("f <- function(...) substitute(g(...))\ndeparse(f(1, b = y))").unwrap();
        assert_eq!(out, Value::str("g(1, b = y)"));
    }

    #[test]
    fn test_substitute_in_global_is_identity() {
        let out = eval("x <- 1\ndeparse(substitute(x + 1))").unwrap();
        assert_eq!(out, Value::str("x + 1"));
    }

    #[test]
    fn test_substitute_from_list() {
        let out = eval("deparse(substitute(x + y, list(x = 1)))").unwrap();
        assert_eq!(out, Value::str("1 + y"));
    }

    #[test]
    fn test_missing() {
        let out = eval("f <- function(a, b = 2) c(missing(a), missing(b))\nf(1)").unwrap();
        assert_eq!(out, eval("c(FALSE, TRUE)").unwrap());
        let out = eval("g <- function(x) missing(x)\nh <- function(y) g(y)\nh()").unwrap();
        assert_eq!(out, Value::lgl(true));
        let err = eval("f <- function(a) missing(zz)\nf()").unwrap_err();
        assert_eq!(err.message, Message::MissingOnlyForArguments);
    }

    #[test]
    fn test_on_exit_runs_after_body_and_on_error() {
        let out = eval(
            "trail <- c()\nf <- function() { on.exit(trail <<- c(trail, \"exit\")); trail <<- c(trail, \"body\"); 1 }\nf()\ntrail",
        )
        .unwrap();
        assert_eq!(out, eval("c(\"body\", \"exit\")").unwrap());

        let mut it = Interpreter::new();
        let err = eval_in(
            &mut it,
            "done <- FALSE\ng <- function() { on.exit(done <<- TRUE); stop(\"boom\") }\ng()",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Error in g() : boom");
        assert_eq!(eval_in(&mut it, "done").unwrap(), Value::lgl(true));
    }

    #[test]
    fn test_on_exit_add_and_after() {
        let out = eval(
            "v <- c()\nf <- function() { on.exit(v <<- c(v, 1)); on.exit(v <<- c(v, 2), add = TRUE); on.exit(v <<- c(v, 0), add = TRUE, after = FALSE) }\nf()\nv",
        )
        .unwrap();
        assert_eq!(out, eval("c(0, 1, 2)").unwrap());
    }

    #[test]
    fn test_stop_call_flag() {
        let err = eval("f <- function() stop(\"bad \", 1L, call. = FALSE)\nf()").unwrap_err();
        assert_eq!(err.to_string(), "Error: bad 1");
        let err = eval("stop(\"top\")").unwrap_err();
        assert_eq!(err.to_string(), "Error: top");
    }

    #[test]
    fn test_warning_is_recorded() {
        let mut it = Interpreter::new();
        eval_in(&mut it, "f <- function() warning(\"careful\")\nf()").unwrap();
        let warnings = it.ctx.take_warnings();
        assert_eq!(warnings[0].to_string(), "Warning in f() : careful");
    }

    #[test]
    fn test_eval_in_list() {
        let out = eval("eval(quote(a + b), list(a = 1, b = 2))").unwrap();
        assert_eq!(out, Value::dbl(3.0));
    }

    #[test]
    fn test_invisible() {
        let mut it = Interpreter::new();
        let out = eval_in(&mut it, "invisible(3)").unwrap();
        assert_eq!(out, Value::dbl(3.0));
        assert!(!it.ctx.visible);
    }
}
