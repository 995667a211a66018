//! Expression parsing (Pratt parsing)

use crate::ast::{Arg, Expr, Formal};
use crate::na;
use crate::parser::{describe, Parser, Precedence};
use crate::token::{Token, TokenKind};
use crate::value::{Value, Vector};
use std::rc::Rc;

impl Parser {
    /// Parse an expression
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ()> {
        self.parse_precedence(Precedence::Lowest)
    }

    /// Parse expression with given precedence
    pub(super) fn parse_precedence(&mut self, precedence: Precedence) -> Result<Expr, ()> {
        let mut left = self.parse_prefix()?;

        loop {
            self.skip_insignificant_newlines();
            if precedence >= self.current_precedence() {
                break;
            }
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    /// Parse prefix expression
    fn parse_prefix(&mut self) -> Result<Expr, ()> {
        self.skip_newlines();
        let token = self.advance();
        match token.kind {
            TokenKind::Number => self.number_constant(&token),
            TokenKind::Integer => self.integer_constant(&token),
            TokenKind::Imaginary => {
                let im = self.parse_number_text(&token)?;
                Ok(Expr::Constant(Value::cplx(0.0, im)))
            }
            TokenKind::String => Ok(Expr::Constant(Value::str(&token.lexeme))),
            TokenKind::True => Ok(Expr::Constant(Value::lgl(true))),
            TokenKind::False => Ok(Expr::Constant(Value::lgl(false))),
            TokenKind::Null => Ok(Expr::Constant(Value::Null)),
            TokenKind::Na => Ok(Expr::Constant(Value::na_logical())),
            TokenKind::NaInteger => Ok(Expr::Constant(Value::int(na::NA_INTEGER))),
            TokenKind::NaReal => Ok(Expr::Constant(Value::dbl(na::na_real()))),
            TokenKind::NaCharacter => Ok(Expr::Constant(Value::Vector(Vector::character(vec![None])))),
            TokenKind::Inf => Ok(Expr::Constant(Value::dbl(f64::INFINITY))),
            TokenKind::NaN => Ok(Expr::Constant(Value::dbl(f64::NAN))),
            TokenKind::Identifier => Ok(Expr::Symbol(token.lexeme)),
            TokenKind::LeftParen => self.parse_group(),
            TokenKind::LeftBrace => self.parse_block(),
            TokenKind::Function => self.parse_function(),
            TokenKind::If => self.parse_if(),
            TokenKind::Minus | TokenKind::Plus => {
                let operand = self.parse_precedence(Precedence::Unary)?;
                Ok(Expr::call(&token.lexeme, vec![Arg::positional(operand)]))
            }
            TokenKind::Bang => {
                let operand = self.parse_precedence(Precedence::Not)?;
                Ok(Expr::call("!", vec![Arg::positional(operand)]))
            }
            TokenKind::Tilde => {
                let operand = self.parse_precedence(Precedence::Tilde)?;
                Ok(Expr::call("~", vec![Arg::positional(operand)]))
            }
            TokenKind::Error => Err(()),
            _ => {
                self.error_at(&token, format!("unexpected '{}'", describe(&token)));
                Err(())
            }
        }
    }

    /// Parse infix expression
    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ()> {
        let token = self.advance();
        let precedence = token_precedence(&token);
        match token.kind {
            TokenKind::LeftParen => self.parse_call(left),
            TokenKind::LeftBracket => self.parse_index(left),
            TokenKind::Dollar => self.parse_dollar(left),
            TokenKind::RightAssign => {
                self.skip_newlines();
                let right = self.parse_precedence(precedence)?;
                Ok(Expr::call("<-", vec![Arg::positional(right), Arg::positional(left)]))
            }
            TokenKind::Equal | TokenKind::LeftAssign | TokenKind::SuperAssign | TokenKind::Caret => {
                self.skip_newlines();
                let right = self.parse_precedence(precedence.below())?;
                Ok(binary(&token.lexeme, left, right))
            }
            _ => {
                self.skip_newlines();
                let right = self.parse_precedence(precedence)?;
                Ok(binary(&token.lexeme, left, right))
            }
        }
    }

    /// Get current token precedence
    pub(super) fn current_precedence(&self) -> Precedence {
        token_precedence(self.peek())
    }

    /// `( expr )`, kept as a call to `(`
    fn parse_group(&mut self) -> Result<Expr, ()> {
        let inner = self.with_newline_mode(true, |p| p.parse_expression())?;
        self.consume(TokenKind::RightParen, "')'")?;
        Ok(Expr::call("(", vec![Arg::positional(inner)]))
    }

    /// `{ expr; expr }`
    fn parse_block(&mut self) -> Result<Expr, ()> {
        self.with_newline_mode(false, |p| {
            let mut body = Vec::new();
            loop {
                p.skip_separators();
                if p.match_token(TokenKind::RightBrace) {
                    break;
                }
                if p.is_at_end() {
                    let token = p.peek().clone();
                    p.error_at(&token, "unexpected end of input: expected '}'".to_string());
                    return Err(());
                }
                body.push(Arg::positional(p.parse_expression()?));
                if !matches!(
                    p.peek_kind(),
                    TokenKind::Newline | TokenKind::Semicolon | TokenKind::RightBrace
                ) {
                    let token = p.peek().clone();
                    p.error_at(&token, format!("unexpected '{}'", describe(&token)));
                    return Err(());
                }
            }
            Ok(Expr::call("{", body))
        })
    }

    /// `if (cond) a else b`
    fn parse_if(&mut self) -> Result<Expr, ()> {
        self.consume(TokenKind::LeftParen, "'(' after if")?;
        let cond = self.with_newline_mode(true, |p| p.parse_expression())?;
        self.consume(TokenKind::RightParen, "')'")?;
        let then = self.parse_expression()?;

        let mut args = vec![Arg::positional(cond), Arg::positional(then)];
        let checkpoint = self.current;
        self.skip_newlines();
        if self.match_token(TokenKind::Else) {
            args.push(Arg::positional(self.parse_expression()?));
        } else {
            self.current = checkpoint;
        }
        Ok(Expr::call("if", args))
    }

    /// `function(formals) body`
    fn parse_function(&mut self) -> Result<Expr, ()> {
        self.consume(TokenKind::LeftParen, "'(' after function")?;
        let formals = self.with_newline_mode(true, |p| {
            let mut formals: Vec<Formal> = Vec::new();
            if p.match_token(TokenKind::RightParen) {
                return Ok(formals);
            }
            loop {
                let name = p.consume(TokenKind::Identifier, "formal argument name")?;
                if formals.iter().any(|f| f.name == name.lexeme) {
                    p.error_at(&name, format!("repeated formal argument '{}'", name.lexeme));
                    return Err(());
                }
                let default = if p.match_token(TokenKind::Equal) {
                    Some(p.parse_precedence(Precedence::Equal)?)
                } else {
                    None
                };
                formals.push(Formal {
                    name: name.lexeme,
                    default,
                });
                p.skip_newlines();
                if p.match_token(TokenKind::RightParen) {
                    return Ok(formals);
                }
                p.consume(TokenKind::Comma, "',' or ')'")?;
            }
        })?;
        let body = self.parse_expression()?;
        Ok(Expr::Function {
            formals: Rc::new(formals),
            body: Rc::new(body),
        })
    }

    /// Argument list after `(`
    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ()> {
        let args = self.with_newline_mode(true, |p| {
            let mut args = Vec::new();
            p.skip_newlines();
            if p.match_token(TokenKind::RightParen) {
                return Ok(args);
            }
            loop {
                p.skip_newlines();
                args.push(p.parse_argument()?);
                p.skip_newlines();
                if p.match_token(TokenKind::RightParen) {
                    return Ok(args);
                }
                p.consume(TokenKind::Comma, "',' or ')'")?;
            }
        })?;
        Ok(Expr::Call(Box::new(callee), args))
    }

    /// `x[i]` or `x[[i]]`, as calls to `[` and `[[`
    fn parse_index(&mut self, target: Expr) -> Result<Expr, ()> {
        let double = self.match_token(TokenKind::LeftBracket);
        let args = self.with_newline_mode(true, |p| {
            let mut args = vec![Arg::positional(target)];
            p.skip_newlines();
            if p.match_token(TokenKind::RightBracket) {
                return Ok(args);
            }
            // after a comma, `]` closes an empty trailing index as in `m[i, ]`
            loop {
                p.skip_newlines();
                args.push(p.parse_argument()?);
                p.skip_newlines();
                if p.match_token(TokenKind::RightBracket) {
                    return Ok(args);
                }
                p.consume(TokenKind::Comma, "',' or ']'")?;
            }
        })?;
        if double {
            self.consume(TokenKind::RightBracket, "']'")?;
        }
        Ok(Expr::call(if double { "[[" } else { "[" }, args))
    }

    /// `x$name`, with the name kept as a string constant
    fn parse_dollar(&mut self, target: Expr) -> Result<Expr, ()> {
        let token = self.advance();
        match token.kind {
            TokenKind::Identifier | TokenKind::String => Ok(Expr::call(
                "$",
                vec![Arg::positional(target), Arg::positional(Expr::Constant(Value::str(&token.lexeme)))],
            )),
            _ => {
                self.error_at(&token, format!("unexpected '{}'", describe(&token)));
                Err(())
            }
        }
    }

    /// One argument: `value`, `name = value`, `name = ` or empty
    fn parse_argument(&mut self) -> Result<Arg, ()> {
        if matches!(
            self.peek_kind(),
            TokenKind::Comma | TokenKind::RightParen | TokenKind::RightBracket
        ) {
            return Ok(Arg::positional(Expr::MissingArg));
        }

        let is_tag = matches!(
            self.peek_kind(),
            TokenKind::Identifier | TokenKind::String | TokenKind::Null
        ) && self
            .tokens
            .get(self.current + 1)
            .is_some_and(|t| t.kind == TokenKind::Equal);

        if is_tag {
            let name = self.advance().lexeme;
            self.advance(); // '='
            self.skip_newlines();
            if matches!(
                self.peek_kind(),
                TokenKind::Comma | TokenKind::RightParen | TokenKind::RightBracket
            ) {
                return Ok(Arg::named(name, Expr::MissingArg));
            }
            let value = self.parse_precedence(Precedence::Equal)?;
            return Ok(Arg::named(name, value));
        }

        Ok(Arg::positional(self.parse_precedence(Precedence::Equal)?))
    }

    // === Literals ===

    fn parse_number_text(&mut self, token: &Token) -> Result<f64, ()> {
        let text = token.lexeme.as_str();
        let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok().map(|v| v as f64),
            None => text.parse::<f64>().ok(),
        };
        match parsed {
            Some(x) => Ok(x),
            None => {
                self.error_at(token, format!("malformed number '{}'", text));
                Err(())
            }
        }
    }

    fn number_constant(&mut self, token: &Token) -> Result<Expr, ()> {
        let x = self.parse_number_text(token)?;
        Ok(Expr::Constant(Value::dbl(x)))
    }

    /// `1L`; non-integral or out-of-range values stay double
    fn integer_constant(&mut self, token: &Token) -> Result<Expr, ()> {
        let x = self.parse_number_text(token)?;
        if x.fract() == 0.0 && x.abs() <= i32::MAX as f64 {
            Ok(Expr::Constant(Value::int(x as i32)))
        } else {
            Ok(Expr::Constant(Value::dbl(x)))
        }
    }
}

fn binary(op: &str, left: Expr, right: Expr) -> Expr {
    Expr::call(op, vec![Arg::positional(left), Arg::positional(right)])
}

/// Binding power of an infix token
fn token_precedence(token: &Token) -> Precedence {
    match token.kind {
        TokenKind::Equal => Precedence::Equal,
        TokenKind::LeftAssign | TokenKind::SuperAssign => Precedence::LeftAssign,
        TokenKind::RightAssign => Precedence::RightAssign,
        TokenKind::Tilde => Precedence::Tilde,
        TokenKind::Pipe | TokenKind::PipePipe => Precedence::Or,
        TokenKind::Amp | TokenKind::AmpAmp => Precedence::And,
        TokenKind::EqualEqual
        | TokenKind::BangEqual
        | TokenKind::Less
        | TokenKind::LessEqual
        | TokenKind::Greater
        | TokenKind::GreaterEqual => Precedence::Comparison,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash => Precedence::Product,
        TokenKind::Special => Precedence::Special,
        TokenKind::Colon => Precedence::Range,
        TokenKind::Caret => Precedence::Power,
        TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::Dollar => Precedence::Call,
        _ => Precedence::Lowest,
    }
}
