//! Tree-walking evaluator
//!
//! Calls wrap their arguments in promises, match them against the callee's
//! formals and dispatch. Eager builtins see their declared formals forced in
//! order while `...` stays lazy; specials receive the unevaluated argument
//! expressions. Closures get a fresh frame whose `on.exit` handlers run on
//! the way out, including when the body fails.

use crate::args::{match_args, Args, Supplied};
use crate::ast::{Arg, Expr};
use crate::builtins::{self, BuiltinKind, BuiltinSpec, EagerFn, Visibility};
use crate::coerce::{self, CoercionNotes};
use crate::context::Context;
use crate::deparse::deparse_expr;
use crate::env::Environment;
use crate::error::{Message, RError, RResult, RWarning};
use crate::promise::{Promise, PromiseState};
use crate::value::{Closure, Function, Kind, Value, Vector};
use std::rc::Rc;
use tracing::trace;

/// Upper bound on nested calls regardless of `options(expressions=)`
const MAX_CALL_DEPTH: usize = 256;

/// One active closure call
pub struct CallFrame {
    pub call: Rc<Expr>,
    pub function: Function,
    /// Evaluation frame of the closure body
    pub env: Environment,
    /// Environment the call was made from
    pub caller: Environment,
    pub on_exit: Vec<Expr>,
    /// Number of supplied, non-empty arguments
    pub nargs: usize,
    /// Formals that received no argument
    pub defaulted: Vec<String>,
}

/// Evaluator state
pub struct Interpreter {
    pub ctx: Context,
    frames: Vec<CallFrame>,
    /// Builtin calls in progress, innermost last; warnings are attributed to it
    builtin_calls: Vec<Rc<Expr>>,
    depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_context(Context::new())
    }

    /// Interpreter over an existing context; installs the base bindings
    pub fn with_context(ctx: Context) -> Self {
        let interp = Self {
            ctx,
            frames: Vec::new(),
            builtin_calls: Vec::new(),
            depth: 0,
        };
        builtins::install(interp.ctx.base());
        interp
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Evaluate a top-level expression in the global environment
    pub fn eval_toplevel(&mut self, expr: &Expr) -> RResult<Value> {
        let global = self.ctx.global().clone();
        self.ctx.visible = true;
        self.eval(expr, &global).map_err(RError::settle)
    }

    pub fn eval(&mut self, expr: &Expr, env: &Environment) -> RResult<Value> {
        match expr {
            Expr::Constant(value) => {
                self.ctx.visible = true;
                Ok(value.clone())
            }
            Expr::Symbol(name) => {
                self.ctx.visible = true;
                self.eval_symbol(name, env)
            }
            Expr::MissingArg => Err(self.frame_error(Message::ArgumentMissing(String::new()))),
            Expr::Function { formals, body } => {
                self.ctx.visible = true;
                Ok(Value::Function(Function::Closure(Rc::new(Closure {
                    formals: formals.clone(),
                    body: body.clone(),
                    env: env.clone(),
                }))))
            }
            Expr::Call(head, args) => {
                let function = match head.as_ref() {
                    Expr::Symbol(name) => self.find_function(name, env)?,
                    Expr::Constant(Value::Vector(v)) if v.kind() == Kind::Character && v.len() == 1 => {
                        let name = crate::casts::to_str(&Value::Vector(v.clone())).unwrap_or_default();
                        self.find_function(&name, env)?
                    }
                    other => match self.eval(other, env)? {
                        Value::Function(f) => f,
                        _ => return Err(self.frame_error(Message::ApplyNonFunction)),
                    },
                };
                self.apply(&function, Rc::new(expr.clone()), args, env)
            }
        }
    }

    fn eval_symbol(&mut self, name: &str, env: &Environment) -> RResult<Value> {
        if name == "..." {
            return Err(self.frame_error(Message::DotsOutsideFunction));
        }
        match env.lookup(name) {
            None => Err(self.frame_error(Message::ObjectNotFound(name.to_string()))),
            Some((Value::Promise(p), _)) => self.force(&p),
            Some((Value::Missing, _)) => Err(self.frame_error(Message::ArgumentMissing(name.to_string()))),
            Some((value, _)) => Ok(value),
        }
    }

    /// Find a function binding along the chain, skipping non-functions
    pub fn find_function(&mut self, name: &str, env: &Environment) -> RResult<Function> {
        let mut current = Some(env.clone());
        while let Some(frame) = current {
            if let Some(value) = frame.get_local(name) {
                let value = match value {
                    Value::Promise(p) => self.force(&p)?,
                    other => other,
                };
                if let Value::Function(f) = value {
                    return Ok(f);
                }
            }
            current = frame.parent();
        }
        Err(self.frame_error(Message::CouldNotFindFunction(name.to_string())))
    }

    /// Force a promise, at most once
    pub fn force(&mut self, promise: &Promise) -> RResult<Value> {
        match promise.state() {
            PromiseState::Evaluated { value, .. } => Ok(value),
            PromiseState::Forcing { .. } => Err(self.frame_error(Message::PromiseCycle)),
            PromiseState::Unevaluated { expr, env } => {
                trace!(expr = %deparse_expr(&expr), "forcing promise");
                promise.set_state(PromiseState::Forcing {
                    expr: expr.clone(),
                    env: env.clone(),
                });
                match self.eval(&expr, &env) {
                    Ok(value) => {
                        promise.set_state(PromiseState::Evaluated {
                            expr,
                            value: value.clone(),
                        });
                        Ok(value)
                    }
                    Err(err) => {
                        promise.set_state(PromiseState::Unevaluated { expr, env });
                        Err(err)
                    }
                }
            }
        }
    }

    /// Force if `value` is a promise
    pub fn force_value(&mut self, value: Value) -> RResult<Value> {
        match value {
            Value::Promise(p) => self.force(&p),
            other => Ok(other),
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Apply `function` to unevaluated call arguments
    pub fn apply(&mut self, function: &Function, call: Rc<Expr>, args: &[Arg], env: &Environment) -> RResult<Value> {
        match function {
            Function::Builtin(spec) => match spec.kind {
                BuiltinKind::Special(body) => self.run_builtin(spec, call, |it| body(it, args, env)),
                BuiltinKind::Eager(body) => {
                    let supplied = self.promise_args(args, env)?;
                    self.apply_builtin(spec, body, call, supplied, env)
                }
            },
            Function::Closure(closure) => {
                let supplied = self.promise_args(args, env)?;
                self.apply_closure(closure, call, supplied, env)
            }
        }
    }

    /// Apply `function` to arguments that are already values (or promises)
    pub fn apply_values(
        &mut self,
        function: &Function,
        call: Rc<Expr>,
        supplied: Vec<Supplied>,
        env: &Environment,
    ) -> RResult<Value> {
        match function {
            Function::Builtin(spec) => match spec.kind {
                BuiltinKind::Special(body) => {
                    let args: Vec<Arg> = supplied
                        .into_iter()
                        .map(|s| Arg {
                            name: s.name,
                            value: match s.value {
                                Value::Promise(p) => p.expr().as_ref().clone(),
                                other => Expr::from_value(&other),
                            },
                        })
                        .collect();
                    self.run_builtin(spec, call, |it| body(it, &args, env))
                }
                BuiltinKind::Eager(body) => self.apply_builtin(spec, body, call, supplied, env),
            },
            Function::Closure(closure) => self.apply_closure(closure, call, supplied, env),
        }
    }

    /// Call `function` with evaluated `values`, attributing the call to `call`
    pub fn call_with(
        &mut self,
        function: &Function,
        call: Expr,
        values: Vec<(Option<String>, Value)>,
        env: &Environment,
    ) -> RResult<Value> {
        let supplied = values
            .into_iter()
            .map(|(name, value)| Supplied::new(name, value))
            .collect();
        self.apply_values(function, Rc::new(call), supplied, env)
    }

    /// Wrap call arguments in promises, splicing `...`
    fn promise_args(&mut self, args: &[Arg], env: &Environment) -> RResult<Vec<Supplied>> {
        let mut supplied = Vec::with_capacity(args.len());
        for arg in args {
            match &arg.value {
                Expr::Symbol(name) if name == "..." => match env.lookup("...") {
                    Some((Value::Dots(dots), _)) => {
                        supplied.extend(dots.into_iter().map(|d| Supplied::new(d.name, d.value)));
                    }
                    _ => return Err(self.frame_error(Message::DotsOutsideFunction)),
                },
                Expr::MissingArg => supplied.push(Supplied::new(arg.name.clone(), Value::Missing)),
                Expr::Constant(value) => supplied.push(Supplied::new(arg.name.clone(), value.clone())),
                other => supplied.push(Supplied::new(
                    arg.name.clone(),
                    Value::Promise(Promise::new(Rc::new(other.clone()), env.clone())),
                )),
            }
        }
        Ok(supplied)
    }

    fn apply_builtin(
        &mut self,
        spec: &'static BuiltinSpec,
        body: EagerFn,
        call: Rc<Expr>,
        supplied: Vec<Supplied>,
        env: &Environment,
    ) -> RResult<Value> {
        let args_call = call.clone();
        self.run_builtin(spec, call, move |it| {
            let matched = match_args(spec.formals, supplied)?;
            let mut values = Vec::with_capacity(matched.values.len());
            for value in matched.values {
                values.push(it.force_value(value)?);
            }
            let args = Args::new(spec.formals, values, matched.dots, args_call, env.clone());
            body(it, &args)
        })
    }

    fn run_builtin(
        &mut self,
        spec: &'static BuiltinSpec,
        call: Rc<Expr>,
        body: impl FnOnce(&mut Self) -> RResult<Value>,
    ) -> RResult<Value> {
        self.enter()?;
        trace!(builtin = spec.name, "dispatch");
        self.builtin_calls.push(call.clone());
        self.ctx.visible = true;
        let result = body(self);
        self.builtin_calls.pop();
        self.depth -= 1;
        match spec.visibility {
            Visibility::On => self.ctx.visible = true,
            Visibility::Off => self.ctx.visible = false,
            Visibility::Custom => {}
        }
        result.map_err(|err| err.locate(|| deparse_expr(&call)))
    }

    fn apply_closure(
        &mut self,
        closure: &Rc<Closure>,
        call: Rc<Expr>,
        supplied: Vec<Supplied>,
        caller: &Environment,
    ) -> RResult<Value> {
        let nargs = supplied.iter().filter(|s| !s.value.is_missing()).count();
        let names: Vec<&str> = closure.formals.iter().map(|f| f.name.as_str()).collect();
        let matched = match_args(&names, supplied).map_err(|err| err.locate(|| deparse_expr(&call)))?;

        let env = Environment::new(Some(closure.env.clone()));
        let mut dots = Some(matched.dots);
        let mut defaulted = Vec::new();
        for (formal, value) in closure.formals.iter().zip(matched.values) {
            let bound = if formal.name == "..." {
                Value::Dots(dots.take().unwrap_or_default())
            } else if value.is_missing() {
                defaulted.push(formal.name.clone());
                match &formal.default {
                    Some(default) => Value::Promise(Promise::new(Rc::new(default.clone()), env.clone())),
                    None => Value::Missing,
                }
            } else {
                value
            };
            env.define(&formal.name, bound)?;
        }

        self.enter().map_err(|err| err.locate(|| deparse_expr(&call)))?;
        self.frames.push(CallFrame {
            call: call.clone(),
            function: Function::Closure(closure.clone()),
            env: env.clone(),
            caller: caller.clone(),
            on_exit: Vec::new(),
            nargs,
            defaulted,
        });
        let result = self.eval(&closure.body, &env);
        let result = self.run_on_exit(result);
        self.frames.pop();
        self.depth -= 1;
        result.map_err(|err| err.locate(|| deparse_expr(&call)))
    }

    /// Run the innermost frame's exit handlers; the first error wins
    fn run_on_exit(&mut self, result: RResult<Value>) -> RResult<Value> {
        let Some(frame) = self.frames.last_mut() else {
            return result;
        };
        let handlers = std::mem::take(&mut frame.on_exit);
        if handlers.is_empty() {
            return result;
        }
        let env = frame.env.clone();
        let visible = self.ctx.visible;
        let mut outcome = result;
        for handler in handlers {
            if let Err(err) = self.eval(&handler, &env) {
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        self.ctx.visible = visible;
        outcome
    }

    fn enter(&mut self) -> RResult<()> {
        let limit = self
            .ctx
            .options
            .int("expressions")
            .and_then(|n| usize::try_from(n).ok())
            .map_or(MAX_CALL_DEPTH, |n| n.min(MAX_CALL_DEPTH));
        if self.depth >= limit {
            return Err(RError::without_call(Message::NestingTooDeep));
        }
        self.depth += 1;
        Ok(())
    }

    // ========================================================================
    // Frames
    // ========================================================================

    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Closure frame whose evaluation environment is `env`
    pub fn frame_of(&self, env: &Environment) -> Option<&CallFrame> {
        self.frames.iter().rev().find(|f| f.env.ptr_eq(env))
    }

    pub fn frame_of_mut(&mut self, env: &Environment) -> Option<&mut CallFrame> {
        self.frames.iter_mut().rev().find(|f| f.env.ptr_eq(env))
    }

    /// Builtin call in progress, innermost
    pub fn current_call(&self) -> Option<Rc<Expr>> {
        self.builtin_calls.last().cloned()
    }

    /// Deparsed call of the innermost closure frame
    pub fn frame_call(&self) -> Option<String> {
        self.frames.last().map(|f| deparse_expr(&f.call))
    }

    /// Error attributed to the innermost closure call, or to none at top level
    pub fn frame_error(&self, message: Message) -> RError {
        match self.frame_call() {
            Some(call) => RError::in_call(message, call),
            None => RError::without_call(message),
        }
    }

    // ========================================================================
    // Warnings and coercion
    // ========================================================================

    /// Warning attributed to the builtin call in progress
    pub fn warning(&mut self, message: Message) {
        let call = self.builtin_calls.last().map(|c| deparse_expr(c));
        self.ctx.push_warning(RWarning::new(call, message));
    }

    pub fn warning_in(&mut self, call: Option<String>, message: Message) {
        self.ctx.push_warning(RWarning::new(call, message));
    }

    /// Raise the warnings a coercion recorded
    pub fn note(&mut self, notes: CoercionNotes) {
        for message in notes.warnings() {
            self.warning(message);
        }
    }

    /// Coerce, raising any coercion warnings
    pub fn coerce(&mut self, v: &Vector, kind: Kind) -> RResult<Vector> {
        let coerced = coerce::coerce(v, kind)?;
        self.note(coerced.notes);
        Ok(coerced.vector)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn run(interp: &mut Interpreter, source: &str) -> RResult<Value> {
        let mut last = Value::Null;
        for expr in parse_program(source).unwrap() {
            last = interp.eval_toplevel(&expr)?;
        }
        Ok(last)
    }

    #[test]
    fn test_constants_and_symbols() {
        let mut it = Interpreter::new();
        assert_eq!(run(&mut it, "x <- 2L; x").unwrap(), Value::int(2));
        let err = run(&mut it, "nope").unwrap_err();
        assert_eq!(err.to_string(), "Error: object 'nope' not found");
    }

    #[test]
    fn test_closure_error_is_located_at_call() {
        let mut it = Interpreter::new();
        let err = run(&mut it, "f <- function() undefined_thing; f()").unwrap_err();
        assert_eq!(err.to_string(), "Error in f() : object 'undefined_thing' not found");
    }

    #[test]
    fn test_promises_are_lazy_and_forced_once() {
        let mut it = Interpreter::new();
        let out = run(
            &mut it,
            "n <- 0\nbump <- function() { n <<- n + 1; n }\nf <- function(x) { x; x; 1 }\nf(bump())\nn",
        )
        .unwrap();
        assert_eq!(out, Value::dbl(1.0));
        let out = run(&mut it, "g <- function(x) 1\ng(stop('never'))").unwrap();
        assert_eq!(out, Value::dbl(1.0));
    }

    #[test]
    fn test_default_arguments_see_frame() {
        let mut it = Interpreter::new();
        let out = run(&mut it, "f <- function(x, y = x * 2) y\nf(4)").unwrap();
        assert_eq!(out, Value::dbl(8.0));
    }

    #[test]
    fn test_recursive_default_is_a_cycle() {
        let mut it = Interpreter::new();
        let err = run(&mut it, "f <- function(x = x) x\nf()").unwrap_err();
        assert_eq!(err.message, Message::PromiseCycle);
    }

    #[test]
    fn test_missing_argument_error() {
        let mut it = Interpreter::new();
        let err = run(&mut it, "f <- function(x) x\nf()").unwrap_err();
        assert_eq!(err.to_string(), "Error in f() : argument \"x\" is missing, with no default");
    }

    #[test]
    fn test_unused_argument_located() {
        let mut it = Interpreter::new();
        let err = run(&mut it, "f <- function(x) x\nf(1, 2)").unwrap_err();
        assert_eq!(err.to_string(), "Error in f(1, 2) : unused argument (2)");
    }

    #[test]
    fn test_dots_forwarding() {
        let mut it = Interpreter::new();
        let out = run(&mut it, "f <- function(...) sum(...)\nf(1, 2, 3)").unwrap();
        assert_eq!(out, Value::dbl(6.0));
    }

    #[test]
    fn test_nesting_limit() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| {
                let mut it = Interpreter::new();
                run(&mut it, "f <- function() f()\nf()").unwrap_err()
            })
            .unwrap();
        let err = handle.join().unwrap();
        assert_eq!(err.message, Message::NestingTooDeep);
        assert_eq!(err.call, None);
    }

    #[test]
    fn test_frames_unwound_after_error() {
        let mut it = Interpreter::new();
        assert!(run(&mut it, "f <- function() stop('x')\nf()").is_err());
        assert!(it.frames().is_empty());
        assert_eq!(run(&mut it, "1 + 1").unwrap(), Value::dbl(2.0));
    }

    #[test]
    fn test_warning_attributed_to_builtin_call() {
        let mut it = Interpreter::new();
        run(&mut it, "sqrt(-1)").unwrap();
        let warnings = it.ctx.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].to_string(), "Warning in sqrt(-1) : NaNs produced");
    }
}
