//! Literal scanning for the lexer

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl Lexer {
    /// Scan a string literal delimited by `quote`
    pub(super) fn string(&mut self, quote: char) -> Token {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\n' {
                self.advance();
                self.newline();
                value.push('\n');
                continue;
            }

            if self.peek() != '\\' {
                value.push(self.advance());
                continue;
            }

            self.advance(); // backslash
            if self.is_at_end() {
                break;
            }
            let escape = self.advance();
            let decoded = match escape {
                'n' => Some('\n'),
                'r' => Some('\r'),
                't' => Some('\t'),
                '0' => Some('\0'),
                'a' => Some('\u{7}'),
                'b' => Some('\u{8}'),
                'f' => Some('\u{c}'),
                'v' => Some('\u{b}'),
                '\\' => Some('\\'),
                '"' => Some('"'),
                '\'' => Some('\''),
                '`' => Some('`'),
                ' ' => Some(' '),
                'x' => self.hex_escape(2),
                'u' => self.unicode_escape(4),
                'U' => self.unicode_escape(8),
                _ => None,
            };
            match decoded {
                Some(c) => value.push(c),
                None => {
                    return self.error_token(format!("'\\{}' is an unrecognized escape", escape));
                }
            }
        }

        if self.is_at_end() {
            return self.error_token("unexpected end of input: unterminated string".to_string());
        }

        self.advance(); // closing quote
        self.make_token(TokenKind::String, &value)
    }

    /// `\xhh`: one or two hex digits
    fn hex_escape(&mut self, max: usize) -> Option<char> {
        let mut digits = String::new();
        while digits.len() < max && self.peek().is_ascii_hexdigit() {
            digits.push(self.advance());
        }
        u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
    }

    /// `\uXXXX` or `\u{XXXX}`
    fn unicode_escape(&mut self, max: usize) -> Option<char> {
        if self.match_char('{') {
            let c = self.hex_escape(max);
            if !self.match_char('}') {
                return None;
            }
            c
        } else {
            self.hex_escape(max)
        }
    }

    /// Scan a numeric literal; the first character is already consumed
    pub(super) fn number(&mut self) -> Token {
        let first = self.chars[self.start.offset];
        if first == '0' && matches!(self.peek(), 'x' | 'X') {
            self.advance();
            while self.peek().is_ascii_hexdigit() {
                self.advance();
            }
            let text = self.current_text();
            return self.number_suffix(text);
        }

        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if first != '.' && self.peek() == '.' {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        if matches!(self.peek(), 'e' | 'E')
            && (self.peek_next().is_ascii_digit()
                || (matches!(self.peek_next(), '+' | '-')
                    && self.chars.get(self.pos.offset + 2).is_some_and(|c| c.is_ascii_digit())))
        {
            self.advance();
            if matches!(self.peek(), '+' | '-') {
                self.advance();
            }
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.current_text();
        self.number_suffix(text)
    }

    fn number_suffix(&mut self, text: String) -> Token {
        if self.match_char('L') {
            self.make_token(TokenKind::Integer, &text)
        } else if self.match_char('i') {
            self.make_token(TokenKind::Imaginary, &text)
        } else {
            self.make_token(TokenKind::Number, &text)
        }
    }

    /// Scan an identifier or keyword
    pub(super) fn identifier(&mut self) -> Token {
        while self.peek().is_alphanumeric() || self.peek() == '.' || self.peek() == '_' {
            self.advance();
        }

        let text = self.current_text();
        let kind = match text.as_str() {
            "TRUE" => TokenKind::True,
            "FALSE" => TokenKind::False,
            "NULL" => TokenKind::Null,
            "NA" => TokenKind::Na,
            "NA_integer_" => TokenKind::NaInteger,
            "NA_real_" => TokenKind::NaReal,
            "NA_character_" => TokenKind::NaCharacter,
            "Inf" => TokenKind::Inf,
            "NaN" => TokenKind::NaN,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            _ => TokenKind::Identifier,
        };
        self.make_token(kind, &text)
    }

    /// `` `any name` ``
    pub(super) fn backtick_name(&mut self) -> Token {
        let mut name = String::new();
        while !self.is_at_end() && self.peek() != '`' {
            if self.peek() == '\\' && self.peek_next() == '`' {
                self.advance();
            }
            name.push(self.advance());
        }
        if self.is_at_end() {
            return self.error_token("unexpected end of input: unterminated backtick name".to_string());
        }
        self.advance();
        self.make_token(TokenKind::Identifier, &name)
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::TokenKind;
    use rstest::rstest;

    fn single(source: &str) -> (TokenKind, String) {
        let (tokens, errors) = Lexer::new(source).tokenize();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        (tokens[0].kind, tokens[0].lexeme.clone())
    }

    #[rstest]
    #[case("42", TokenKind::Number, "42")]
    #[case("1.5e-3", TokenKind::Number, "1.5e-3")]
    #[case(".5", TokenKind::Number, ".5")]
    #[case("0x1F", TokenKind::Number, "0x1F")]
    #[case("7L", TokenKind::Integer, "7")]
    #[case("2i", TokenKind::Imaginary, "2")]
    #[case("NA_integer_", TokenKind::NaInteger, "NA_integer_")]
    #[case("na.rm", TokenKind::Identifier, "na.rm")]
    #[case("...", TokenKind::Identifier, "...")]
    #[case("`my var`", TokenKind::Identifier, "my var")]
    fn test_literal(#[case] source: &str, #[case] kind: TokenKind, #[case] lexeme: &str) {
        assert_eq!(single(source), (kind, lexeme.to_string()));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(single(r#""a\tb\n""#), (TokenKind::String, "a\tb\n".to_string()));
        assert_eq!(single(r"'it\'s'"), (TokenKind::String, "it's".to_string()));
        assert_eq!(single(r#""\x41é""#), (TokenKind::String, "Aé".to_string()));
    }

    #[test]
    fn test_unterminated_string() {
        let (_, errors) = Lexer::new("\"abc").tokenize();
        assert_eq!(errors.len(), 1);
    }
}
