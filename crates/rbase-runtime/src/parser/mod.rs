//! Parsing (tokens to AST)
//!
//! Pratt parsing for expressions. A program is a sequence of expressions
//! separated by newlines or semicolons. Inside parentheses and argument
//! lists newlines are insignificant; inside braces and at top level they end
//! an expression unless it is obviously incomplete.

use crate::ast::Expr;
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

mod expr;

/// Parser state for building AST from tokens
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) errors: Vec<ParseError>,
    /// `true` on top when newlines are insignificant
    pub(super) newline_modes: Vec<bool>,
}

/// Operator precedence levels for Pratt parsing, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    Lowest,
    Equal,       // = (right)
    LeftAssign,  // <- <<- (right)
    RightAssign, // ->
    Tilde,       // ~
    Or,          // | ||
    And,         // & &&
    Not,         // unary !
    Comparison,  // == != < > <= >=
    Sum,         // + -
    Product,     // * /
    Special,     // %op%
    Range,       // :
    Unary,       // unary + -
    Power,       // ^ (right)
    Call,        // f()
}

impl Precedence {
    /// Next lower level, used to make right-associative operators bind
    pub(super) fn below(self) -> Precedence {
        match self {
            Precedence::Lowest | Precedence::Equal => Precedence::Lowest,
            Precedence::LeftAssign => Precedence::Equal,
            Precedence::RightAssign => Precedence::LeftAssign,
            Precedence::Tilde => Precedence::RightAssign,
            Precedence::Or => Precedence::Tilde,
            Precedence::And => Precedence::Or,
            Precedence::Not => Precedence::And,
            Precedence::Comparison => Precedence::Not,
            Precedence::Sum => Precedence::Comparison,
            Precedence::Product => Precedence::Sum,
            Precedence::Special => Precedence::Product,
            Precedence::Range => Precedence::Special,
            Precedence::Unary => Precedence::Range,
            Precedence::Power => Precedence::Unary,
            Precedence::Call => Precedence::Power,
        }
    }
}

/// Lex and parse a whole program, stopping at the first error
pub fn parse_program(source: &str) -> Result<Vec<Expr>, ParseError> {
    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    if let Some(err) = lex_errors.into_iter().next() {
        return Err(err);
    }
    let (exprs, errors) = Parser::new(tokens).parse();
    match errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(exprs),
    }
}

impl Parser {
    /// Create a new parser for the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            newline_modes: vec![false],
        }
    }

    /// Parse tokens into a sequence of top-level expressions
    pub fn parse(&mut self) -> (Vec<Expr>, Vec<ParseError>) {
        let mut exprs = Vec::new();

        loop {
            self.skip_separators();
            if self.is_at_end() {
                break;
            }
            match self.parse_expression() {
                Ok(expr) => {
                    exprs.push(expr);
                    if !self.check(TokenKind::Newline)
                        && !self.check(TokenKind::Semicolon)
                        && !self.is_at_end()
                    {
                        let token = self.peek().clone();
                        self.error_at(&token, format!("unexpected '{}'", describe(&token)));
                        break;
                    }
                }
                Err(()) => break,
            }
        }

        (exprs, std::mem::take(&mut self.errors))
    }

    // === Token helpers ===

    pub(super) fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    pub(super) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(super) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume(&mut self, kind: TokenKind, what: &str) -> Result<Token, ()> {
        self.skip_insignificant_newlines();
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek().clone();
            self.error_at(&token, format!("expected {}, found '{}'", what, describe(&token)));
            Err(())
        }
    }

    pub(super) fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    pub(super) fn skip_separators(&mut self) {
        while self.check(TokenKind::Newline) || self.check(TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Skip newlines when inside parentheses
    pub(super) fn skip_insignificant_newlines(&mut self) {
        if self.newline_modes.last().copied().unwrap_or(false) {
            self.skip_newlines();
        }
    }

    pub(super) fn with_newline_mode<T>(&mut self, insignificant: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        self.newline_modes.push(insignificant);
        let result = f(self);
        self.newline_modes.pop();
        result
    }

    pub(super) fn error_at(&mut self, token: &Token, message: String) {
        self.errors.push(ParseError::new(message, token.span));
    }
}

pub(super) fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Newline => "newline".to_string(),
        _ => token.lexeme.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deparse::deparse_expr;
    use rstest::rstest;

    fn roundtrip(source: &str) -> String {
        let exprs = parse_program(source).unwrap();
        assert_eq!(exprs.len(), 1, "expected one expression in {:?}", source);
        deparse_expr(&exprs[0])
    }

    #[rstest]
    #[case("1 + 2 * 3", "1 + 2 * 3")]
    #[case("-2^2", "-2^2")]
    #[case("-1:3", "-1:3")]
    #[case("a %in% b", "a %in% b")]
    #[case("x <- y <- 1", "x <- y <- 1")]
    #[case("1 -> x", "x <- 1")]
    #[case("!a == b", "!a == b")]
    #[case("f(a, b = 2, )", "f(a, b = 2, )")]
    #[case("function(x, y = 2) x + y", "function(x, y = 2) x + y")]
    #[case("if (a) b else c", "if (a) b else c")]
    #[case("(a + b) * c", "(a + b) * c")]
    #[case("`my var` + 1", "`my var` + 1")]
    #[case("x[1]", "x[1]")]
    #[case("x[[\"a\"]][2, ]", "x[[\"a\"]][2, ]")]
    #[case("names(x)[2] <- \"b\"", "names(x)[2] <- \"b\"")]
    #[case("l$a$b", "l$a$b")]
    #[case("l$a[2]", "l$a[2]")]
    #[case("x$`my var` <- 1", "x$`my var` <- 1")]
    #[case(".Machine$double.eps", ".Machine$double.eps")]
    fn test_parse_roundtrip(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(roundtrip(source), expected);
    }

    #[test]
    fn test_precedence_structure() {
        let exprs = parse_program("1 + 2 * 3").unwrap();
        match &exprs[0] {
            Expr::Call(f, args) => {
                assert_eq!(f.as_symbol(), Some("+"));
                assert_eq!(args[1].value.call_name(), Some("*"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[rstest]
    #[case("m[2, ]", 3)]
    #[case("m[, 2]", 3)]
    #[case("m[, ]", 3)]
    #[case("m[]", 1)]
    fn test_empty_index_arguments_are_kept(#[case] source: &str, #[case] arity: usize) {
        let exprs = parse_program(source).unwrap();
        match &exprs[0] {
            Expr::Call(f, args) => {
                assert_eq!(f.as_symbol(), Some("["));
                assert_eq!(args.len(), arity);
                assert!(args[1..].iter().all(|a| matches!(a.value, Expr::MissingArg)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_newlines_separate_top_level() {
        let exprs = parse_program("x <- 1\ny <- 2; z").unwrap();
        assert_eq!(exprs.len(), 3);
    }

    #[test]
    fn test_newlines_inside_parens_ignored() {
        let exprs = parse_program("sum(1,\n 2\n)").unwrap();
        assert_eq!(exprs.len(), 1);
    }

    #[test]
    fn test_trailing_operator_continues() {
        let exprs = parse_program("x <- 1 +\n 2").unwrap();
        assert_eq!(deparse_expr(&exprs[0]), "x <- 1 + 2");
    }

    #[test]
    fn test_braces() {
        let exprs = parse_program("{\n a\n b; c\n}").unwrap();
        assert_eq!(deparse_expr(&exprs[0]), "{\n    a\n    b\n    c\n}");
    }

    #[test]
    fn test_else_on_next_line_inside_braces() {
        let exprs = parse_program("{ if (a) 1\n else 2 }").unwrap();
        assert_eq!(deparse_expr(&exprs[0]), "{\n    if (a) 1 else 2\n}");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_program("f(1,, ").unwrap_err();
        assert!(err.message.contains("end of input"));
        assert!(parse_program("1 +").is_err());
        assert!(parse_program("a b").is_err());
    }
}
