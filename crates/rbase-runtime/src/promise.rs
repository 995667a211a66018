//! Promises: deferred, at-most-once argument evaluation
//!
//! A promise keeps its expression after forcing so `substitute` can still
//! recover it. Forcing itself lives in the interpreter because it re-enters
//! evaluation.

use crate::ast::Expr;
use crate::env::Environment;
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub(crate) enum PromiseState {
    Unevaluated { expr: Rc<Expr>, env: Environment },
    /// Being forced right now; forcing again is a cycle
    Forcing { expr: Rc<Expr>, env: Environment },
    Evaluated { expr: Rc<Expr>, value: Value },
}

#[derive(Clone)]
pub struct Promise(Rc<RefCell<PromiseState>>);

impl Promise {
    pub fn new(expr: Rc<Expr>, env: Environment) -> Self {
        Promise(Rc::new(RefCell::new(PromiseState::Unevaluated { expr, env })))
    }

    /// Already-forced promise, used for constants and supplied values
    pub fn evaluated(expr: Rc<Expr>, value: Value) -> Self {
        Promise(Rc::new(RefCell::new(PromiseState::Evaluated { expr, value })))
    }

    pub fn expr(&self) -> Rc<Expr> {
        match &*self.0.borrow() {
            PromiseState::Unevaluated { expr, .. }
            | PromiseState::Forcing { expr, .. }
            | PromiseState::Evaluated { expr, .. } => expr.clone(),
        }
    }

    /// Defining environment while unevaluated
    pub fn env(&self) -> Option<Environment> {
        match &*self.0.borrow() {
            PromiseState::Unevaluated { env, .. } | PromiseState::Forcing { env, .. } => {
                Some(env.clone())
            }
            PromiseState::Evaluated { .. } => None,
        }
    }

    pub fn value(&self) -> Option<Value> {
        match &*self.0.borrow() {
            PromiseState::Evaluated { value, .. } => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(&*self.0.borrow(), PromiseState::Evaluated { .. })
    }

    pub(crate) fn state(&self) -> PromiseState {
        self.0.borrow().clone()
    }

    pub(crate) fn set_state(&self, state: PromiseState) {
        *self.0.borrow_mut() = state;
    }

    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.0.borrow() {
            PromiseState::Unevaluated { .. } => "unevaluated",
            PromiseState::Forcing { .. } => "forcing",
            PromiseState::Evaluated { .. } => "evaluated",
        };
        write!(f, "<promise: {}>", state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluated_promise_keeps_expression() {
        let expr = Rc::new(Expr::symbol("x"));
        let p = Promise::evaluated(expr.clone(), Value::int(3));
        assert!(p.is_forced());
        assert_eq!(p.expr(), expr);
        assert_eq!(p.value(), Some(Value::int(3)));
        assert!(p.env().is_none());
    }

    #[test]
    fn test_unevaluated_promise() {
        let env = Environment::named("test", None);
        let p = Promise::new(Rc::new(Expr::symbol("y")), env.clone());
        assert!(!p.is_forced());
        assert!(p.env().unwrap().ptr_eq(&env));
        assert_eq!(p.value(), None);
    }
}
