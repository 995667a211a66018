//! Abstract syntax tree
//!
//! The language has a single expression form: constants, symbols, calls and
//! function literals. Operators and control flow (`+`, `if`, `{`, `<-`, ...)
//! are ordinary calls whose function position is a symbol, so quoting,
//! substitution and deparsing treat them uniformly.

use crate::value::Value;
use std::rc::Rc;

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value (number, string, logical, NULL)
    Constant(Value),
    /// Variable reference
    Symbol(String),
    /// Function call `f(args)`
    Call(Box<Expr>, Vec<Arg>),
    /// Empty argument slot, as in `f(x, )` or `switch(a, b = , 2)`
    MissingArg,
    /// `function(formals) body`
    Function {
        formals: Rc<Vec<Formal>>,
        body: Rc<Expr>,
    },
}

/// Call argument with an optional tag
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

impl Arg {
    pub fn positional(value: Expr) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// Formal parameter of a closure
#[derive(Debug, Clone, PartialEq)]
pub struct Formal {
    pub name: String,
    pub default: Option<Expr>,
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Expr {
        Expr::Symbol(name.into())
    }

    /// Call of a named function
    pub fn call(name: &str, args: Vec<Arg>) -> Expr {
        Expr::Call(Box::new(Expr::symbol(name)), args)
    }

    /// Name of the called function when it is a plain symbol
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Expr::Call(f, _) => match f.as_ref() {
                Expr::Symbol(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Wrap as a runtime value: constants unwrap, everything else is language
    pub fn into_value(self) -> Value {
        match self {
            Expr::Constant(v) => v,
            Expr::MissingArg => Value::Missing,
            other => Value::Lang(Rc::new(other)),
        }
    }

    /// Convert a runtime value back into an expression
    pub fn from_value(value: &Value) -> Expr {
        match value {
            Value::Lang(expr) => expr.as_ref().clone(),
            Value::Missing => Expr::MissingArg,
            other => Expr::Constant(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_name() {
        let call = Expr::call("sum", vec![Arg::positional(Expr::symbol("x"))]);
        assert_eq!(call.call_name(), Some("sum"));
        assert_eq!(Expr::symbol("x").call_name(), None);
    }

    #[test]
    fn test_into_value_round_trip() {
        let call = Expr::call("f", vec![]);
        let value = call.clone().into_value();
        assert_eq!(Expr::from_value(&value), call);
        assert_eq!(Expr::Constant(Value::int(1)).into_value(), Value::int(1));
    }
}
