//! Embedding API
//!
//! A [`Session`] owns one interpreter: its global environment, options,
//! RNG stream and collected warnings persist across `eval` calls.

use crate::ast::{Arg, Expr};
use crate::context::Context;
use crate::env::Environment;
use crate::error::{Message, RError, RResult, RWarning};
use crate::interpreter::Interpreter;
use crate::parser::parse_program;
use crate::value::Value;
use rbase_config::Config;
use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// An interpreter session
///
/// # Examples
///
/// ```
/// use rbase_runtime::{Session, Value};
///
/// let session = Session::new();
/// let result = session.eval("sum(1:4)").unwrap();
/// assert_eq!(result, Value::int(10));
/// ```
pub struct Session {
    /// Interior mutability keeps the API `&self`, like a REPL handle
    interpreter: RefCell<Interpreter>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            interpreter: RefCell::new(Interpreter::new()),
        }
    }

    /// Session whose options, seed and temp dir come from `config`
    pub fn with_config(config: &Config) -> Self {
        debug!(project = ?config.project_root, "creating session from config");
        Self {
            interpreter: RefCell::new(Interpreter::with_context(Context::with_config(config))),
        }
    }

    /// Evaluate source text at top level
    ///
    /// Expressions run in order; the value of the last one is returned
    /// (`NULL` for empty source). The first error stops evaluation.
    ///
    /// ```
    /// use rbase_runtime::{Session, Value};
    ///
    /// let session = Session::new();
    /// session.eval("x <- c(a = 1, b = 2)").unwrap();
    /// assert_eq!(session.eval("x[['b']]").unwrap(), Value::dbl(2.0));
    /// ```
    pub fn eval(&self, source: &str) -> RResult<Value> {
        let program = parse_program(source)?;
        let mut interpreter = self.interpreter.borrow_mut();
        let mut last = Value::Null;
        for expr in &program {
            last = interpreter.eval_toplevel(expr)?;
        }
        Ok(last)
    }

    /// Evaluate an already parsed expression at top level
    pub fn eval_expr(&self, expr: &Expr) -> RResult<Value> {
        self.interpreter.borrow_mut().eval_toplevel(expr)
    }

    /// Evaluate a source file
    ///
    /// ```no_run
    /// use rbase_runtime::Session;
    ///
    /// let session = Session::new();
    /// let result = session.eval_file("analysis.R");
    /// ```
    pub fn eval_file(&self, path: impl AsRef<Path>) -> RResult<Value> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| RError::without_call(Message::CannotOpenFile(path.display().to_string(), e.to_string())))?;
        self.eval(&source)
    }

    /// Call a function visible from the global environment with evaluated
    /// arguments
    ///
    /// ```
    /// use rbase_runtime::{Session, Value};
    ///
    /// let session = Session::new();
    /// let args = vec![(None, Value::dbl(2.0)), (Some("digits".to_string()), Value::int(0))];
    /// assert_eq!(session.call("round", args).unwrap(), Value::dbl(2.0));
    /// ```
    pub fn call(&self, name: &str, args: Vec<(Option<String>, Value)>) -> RResult<Value> {
        let mut interpreter = self.interpreter.borrow_mut();
        let global = interpreter.ctx.global().clone();
        interpreter.ctx.visible = true;
        let function = interpreter.find_function(name, &global).map_err(RError::settle)?;
        let call = Expr::call(
            name,
            args.iter()
                .map(|(n, v)| Arg {
                    name: n.clone(),
                    value: Expr::from_value(v),
                })
                .collect(),
        );
        interpreter
            .call_with(&function, call, args, &global)
            .map_err(RError::settle)
    }

    /// Whether the last result should be printed
    pub fn visible(&self) -> bool {
        self.interpreter.borrow().ctx.visible
    }

    /// Bind `name` in the global environment
    pub fn define(&self, name: &str, value: Value) -> RResult<()> {
        self.interpreter.borrow().ctx.global().define(name, value)
    }

    /// Look `name` up from the global environment
    pub fn get(&self, name: &str) -> Option<Value> {
        self.global().lookup(name).map(|(value, _)| value)
    }

    pub fn global(&self) -> Environment {
        self.interpreter.borrow().ctx.global().clone()
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> Vec<RWarning> {
        self.interpreter.borrow().ctx.warnings().to_vec()
    }

    /// Drain the collected warnings
    pub fn take_warnings(&self) -> Vec<RWarning> {
        self.interpreter.borrow_mut().ctx.take_warnings()
    }

    /// Redirect console output (`system`, `file.show`)
    pub fn set_console(&self, console: Box<dyn Write>) {
        self.interpreter.borrow_mut().ctx.set_console(console);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Vector;
    use pretty_assertions::assert_eq;
    use rbase_config::Settings;

    #[test]
    fn test_eval_literal_and_arithmetic() {
        let session = Session::new();
        assert_eq!(session.eval("42").unwrap(), Value::dbl(42.0));
        assert_eq!(session.eval("1L + 2L").unwrap(), Value::int(3));
    }

    #[test]
    fn test_empty_source_is_null() {
        assert_eq!(Session::new().eval("").unwrap(), Value::Null);
        assert_eq!(Session::new().eval("# only a comment\n").unwrap(), Value::Null);
    }

    #[test]
    fn test_state_persists_between_evals() {
        let session = Session::new();
        session.eval("f <- function(x) x * 2").unwrap();
        assert_eq!(session.eval("f(21)").unwrap(), Value::dbl(42.0));
        assert!(session.get("f").is_some());
    }

    #[test]
    fn test_parse_error() {
        let err = Session::new().eval("f(1,").unwrap_err();
        assert!(matches!(err.message, Message::Parse(_)));
    }

    #[test]
    fn test_error_carries_call() {
        let err = Session::new().eval("bincode(1, c(2, 1), TRUE, FALSE)").unwrap_err();
        assert_eq!(err.to_string(), "Error in bincode(1, c(2, 1), TRUE, FALSE) : 'breaks' is not sorted");
    }

    #[test]
    fn test_visibility() {
        let session = Session::new();
        session.eval("x <- 1").unwrap();
        assert!(!session.visible());
        session.eval("x").unwrap();
        assert!(session.visible());
        session.eval("invisible(x)").unwrap();
        assert!(!session.visible());
    }

    #[test]
    fn test_call_with_values() {
        let session = Session::new();
        let x = Value::Vector(Vector::double(vec![3.0, 1.0, 2.0]));
        assert_eq!(
            session.call("cumsum", vec![(None, x)]).unwrap(),
            Value::Vector(Vector::double(vec![3.0, 4.0, 6.0]))
        );
        let err = session.call("no.such.function", Vec::new()).unwrap_err();
        assert_eq!(err.message, Message::CouldNotFindFunction("no.such.function".to_string()));
    }

    #[test]
    fn test_define_and_warnings() {
        let session = Session::new();
        session.define("v", Value::Vector(Vector::strings(["1", "x"]))).unwrap();
        session.eval("as.integer(v)").unwrap();
        assert_eq!(session.warnings().len(), 1);
        assert_eq!(session.take_warnings()[0].message, Message::NasIntroducedByCoercion);
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_eval_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.R");
        std::fs::write(&path, "a <- 2\nb <- a ^ 3\nb").unwrap();
        assert_eq!(Session::new().eval_file(&path).unwrap(), Value::dbl(8.0));
        assert!(Session::new().eval_file(dir.path().join("missing.R")).is_err());
    }

    #[test]
    fn test_with_config_seeds_options() {
        let settings = Settings::from_toml_str(
            "[options]\ndigits = 3\n\n[session]\nseed = 7\n",
            Path::new("rbase.toml"),
        )
        .unwrap();
        let config = Config {
            settings,
            env_options: Vec::new(),
            project_root: None,
        };
        let a = Session::with_config(&config);
        let b = Session::with_config(&config);
        assert_eq!(a.eval("getOption('digits')").unwrap(), Value::int(3));
        assert_eq!(a.eval("runif(3)").unwrap(), b.eval("runif(3)").unwrap());
    }
}
