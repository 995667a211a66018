//! Lexical analysis (tokenization)
//!
//! The lexer converts source text into a stream of tokens with span
//! information. Newlines are significant and emitted as tokens; the parser
//! decides where they terminate an expression.

use crate::error::ParseError;
use crate::span::Span;
use crate::token::{Token, TokenKind};

mod literals;

/// Operators scanned by longest match; the first entry that matches wins
const OPERATORS: &[(&str, TokenKind)] = &[
    ("<<-", TokenKind::SuperAssign),
    ("<-", TokenKind::LeftAssign),
    ("<=", TokenKind::LessEqual),
    ("->", TokenKind::RightAssign),
    (">=", TokenKind::GreaterEqual),
    ("==", TokenKind::EqualEqual),
    ("!=", TokenKind::BangEqual),
    ("&&", TokenKind::AmpAmp),
    ("||", TokenKind::PipePipe),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
    (":", TokenKind::Colon),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("^", TokenKind::Caret),
    ("$", TokenKind::Dollar),
    ("~", TokenKind::Tilde),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("=", TokenKind::Equal),
    ("!", TokenKind::Bang),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
];

/// Line and column of a character offset, both 1-indexed
#[derive(Debug, Clone, Copy)]
pub(super) struct Mark {
    pub(super) offset: usize,
    pub(super) line: u32,
    pub(super) column: u32,
}

impl Mark {
    fn origin() -> Self {
        Mark { offset: 0, line: 1, column: 1 }
    }
}

/// Scanner over the characters of one source text
pub struct Lexer {
    pub(super) chars: Vec<char>,
    /// Position of the next unread character
    pub(super) pos: Mark,
    /// Where the token being scanned began
    pub(super) start: Mark,
    pub(super) errors: Vec<ParseError>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: Mark::origin(),
            start: Mark::origin(),
            errors: Vec::new(),
        }
    }

    /// All tokens up to and including `Eof`, plus the lexical errors met on the way
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<ParseError>) {
        let mut tokens = Vec::new();
        while tokens.last().map_or(true, |t: &Token| t.kind != TokenKind::Eof) {
            tokens.push(self.next_token());
        }
        (tokens, std::mem::take(&mut self.errors))
    }

    fn next_token(&mut self) -> Token {
        self.skip_blanks();
        self.start = self.pos;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof, "");
        }
        if let Some(token) = self.operator() {
            return token;
        }

        let c = self.advance();
        match c {
            '\n' => {
                self.newline();
                self.make_token(TokenKind::Newline, "\n")
            }
            '%' => self.special_operator(),
            '"' | '\'' => self.string(c),
            '`' => self.backtick_name(),
            c if c.is_ascii_digit() => self.number(),
            '.' if self.peek().is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '.' => self.identifier(),
            _ => self.error_token(format!("unexpected input '{}'", c)),
        }
    }

    fn operator(&mut self) -> Option<Token> {
        let (text, kind) = OPERATORS.iter().find(|(op, _)| self.looking_at(op))?;
        for _ in text.chars() {
            self.advance();
        }
        Some(self.make_token(*kind, text))
    }

    /// `%op%`, which may not span lines
    fn special_operator(&mut self) -> Token {
        while !self.is_at_end() && self.peek() != '%' && self.peek() != '\n' {
            self.advance();
        }
        if self.peek() != '%' {
            return self.error_token("unexpected input '%'".to_string());
        }
        self.advance();
        let text = self.current_text();
        self.make_token(TokenKind::Special, &text)
    }

    fn skip_blanks(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\t' | '\r' | '\u{c}' => {
                    self.advance();
                }
                '#' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // === Character helpers ===

    pub(super) fn is_at_end(&self) -> bool {
        self.pos.offset >= self.chars.len()
    }

    pub(super) fn advance(&mut self) -> char {
        let c = self.peek();
        self.pos.offset += 1;
        self.pos.column += 1;
        c
    }

    pub(super) fn newline(&mut self) {
        self.pos.line += 1;
        self.pos.column = 1;
    }

    pub(super) fn peek(&self) -> char {
        self.chars.get(self.pos.offset).copied().unwrap_or('\0')
    }

    pub(super) fn peek_next(&self) -> char {
        self.chars.get(self.pos.offset + 1).copied().unwrap_or('\0')
    }

    pub(super) fn looking_at(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos.offset + i) == Some(&c))
    }

    pub(super) fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    pub(super) fn current_text(&self) -> String {
        let end = self.pos.offset.min(self.chars.len());
        self.chars[self.start.offset..end].iter().collect()
    }

    pub(super) fn span(&self) -> Span {
        Span::new(self.start.offset, self.pos.offset, self.start.line, self.start.column)
    }

    pub(super) fn make_token(&self, kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, self.span())
    }

    pub(super) fn error_token(&mut self, message: String) -> Token {
        let span = self.span();
        self.errors.push(ParseError::new(message.clone(), span));
        Token::new(TokenKind::Error, message, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::new(source).tokenize();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_assignment_operators() {
        assert_eq!(
            kinds("x <- 1; 2 -> y; z <<- 3"),
            vec![
                TokenKind::Identifier,
                TokenKind::LeftAssign,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Number,
                TokenKind::RightAssign,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Identifier,
                TokenKind::SuperAssign,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_less_than_negative_is_assignment() {
        assert_eq!(
            kinds("x<-1"),
            vec![TokenKind::Identifier, TokenKind::LeftAssign, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_dollar_access() {
        assert_eq!(
            kinds(".Machine$double.eps"),
            vec![TokenKind::Identifier, TokenKind::Dollar, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_special_operators() {
        let (tokens, _) = Lexer::new("a %in% b %/% c").tokenize();
        assert_eq!(tokens[1].lexeme, "%in%");
        assert_eq!(tokens[3].lexeme, "%/%");
    }

    #[test]
    fn test_comments_and_newlines() {
        assert_eq!(
            kinds("a # comment\nb"),
            vec![TokenKind::Identifier, TokenKind::Newline, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let (_, errors) = Lexer::new("a ? b").tokenize();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.column, 3);
    }
}
