//! rbase runtime - vector builtins for an R-like statistical language
//!
//! This library provides:
//! - the vector data model with NA sentinels, attributes and completeness
//! - coercion, argument casts and argument matching
//! - a small lexer, parser and lazy evaluator (promises, environments)
//! - the builtin registry and the builtins themselves
//! - an embedding API ([`Session`])

/// rbase runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod args;
pub mod ast;
pub mod builtins;
pub mod casts;
pub mod coerce;
pub mod context;
pub mod deparse;
pub mod env;
pub mod error;
pub mod format;
pub mod interpreter;
pub mod lexer;
pub mod na;
pub mod options;
pub mod parser;
pub mod promise;
pub mod runtime;
pub mod span;
pub mod token;
pub mod value;

// Re-export commonly used types
pub use args::{match_args, Args, Supplied};
pub use ast::{Arg, Expr, Formal};
pub use builtins::{BuiltinSpec, Visibility};
pub use casts::Cast;
pub use context::Context;
pub use env::Environment;
pub use error::{Message, ParseError, RError, RResult, RWarning};
pub use interpreter::Interpreter;
pub use lexer::Lexer;
pub use parser::{parse_program, Parser};
pub use runtime::Session;
pub use span::Span;
pub use token::{Token, TokenKind};
pub use value::{Function, Kind, RStr, Value, Vector, VectorData};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        assert_eq!(VERSION, "0.1.0");
        assert_eq!(Session::new().eval("length(letters)").unwrap(), Value::int(26));
    }
}
