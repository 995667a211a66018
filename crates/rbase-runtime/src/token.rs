//! Token types for lexical analysis

use crate::span::Span;

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// Source text, or the decoded value for strings and backtick names
    pub lexeme: String,
    /// Source location
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }
}

/// Classification of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// Double literal (`1`, `1.5`, `1e3`, `0x10`)
    Number,
    /// Integer literal (`1L`)
    Integer,
    /// Imaginary literal (`2i`)
    Imaginary,
    /// String literal
    String,
    /// Identifier, including backtick-quoted names and `...`
    Identifier,

    // Constants
    True,
    False,
    Null,
    Na,
    NaInteger,
    NaReal,
    NaCharacter,
    Inf,
    NaN,

    // Keywords
    Function,
    If,
    Else,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Newline,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Dollar,
    /// `%%`, `%/%`, `%in%` and other `%op%`
    Special,
    Colon,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Bang,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Tilde,
    /// `<-`
    LeftAssign,
    /// `<<-`
    SuperAssign,
    /// `->`
    RightAssign,
    /// `=`
    Equal,

    Error,
    Eof,
}

impl TokenKind {
    /// Tokens after which a newline cannot end the expression
    pub fn is_binary_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Caret
                | TokenKind::Special
                | TokenKind::Colon
                | TokenKind::EqualEqual
                | TokenKind::BangEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::Greater
                | TokenKind::GreaterEqual
                | TokenKind::Amp
                | TokenKind::AmpAmp
                | TokenKind::Pipe
                | TokenKind::PipePipe
                | TokenKind::Tilde
                | TokenKind::LeftAssign
                | TokenKind::SuperAssign
                | TokenKind::RightAssign
                | TokenKind::Equal
        )
    }
}
