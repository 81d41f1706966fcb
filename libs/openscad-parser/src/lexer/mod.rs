//! # OpenSCAD Lexer
//!
//! Tokenizes OpenSCAD source code. Tokenization is total: malformed input
//! (unterminated strings or comments, bad escapes, stray characters)
//! becomes [`TokenKind::Error`] tokens instead of failing, and the stream
//! always ends with [`TokenKind::Eof`].
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::lexer::{Lexer, TokenKind};
//!
//! let tokens = Lexer::new("cube(10);").tokenize();
//! assert_eq!(tokens[0].kind, TokenKind::Identifier);
//! assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
//! ```

mod cursor;
mod token;

pub use cursor::Cursor;
pub use token::{LexErrorKind, SpecialVariable, Token, TokenKind};

use openscad_ast::{Position, Span};

// =============================================================================
// LEXER
// =============================================================================

/// OpenSCAD lexer.
pub struct Lexer<'a> {
    /// Character cursor.
    cursor: Cursor<'a>,
    /// Collected tokens.
    tokens: Vec<Token>,
    /// Set right after `include` / `use`, where `<path>` is expected.
    expect_path: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            expect_path: false,
        }
    }

    /// Tokenize the entire source.
    ///
    /// ## Returns
    ///
    /// Vector of tokens ending with an EOF token.
    pub fn tokenize(mut self) -> Vec<Token> {
        loop {
            self.skip_whitespace_and_comments();
            if self.cursor.is_eof() {
                break;
            }
            self.scan_token();
        }

        let eof = self.cursor.position();
        self.tokens
            .push(Token::new(TokenKind::Eof, Span::point(eof), String::new()));
        self.tokens
    }

    fn push(&mut self, kind: TokenKind, start: Position) {
        let text = self.cursor.slice_from(start).to_string();
        self.tokens
            .push(Token::new(kind, Span::new(start, self.cursor.position()), text));
    }

    /// Skip whitespace and comments. An unterminated block comment is
    /// emitted as an error token.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.cursor.advance_while(char::is_whitespace);

            if self.cursor.peek() == Some('/') && self.cursor.peek_next() == Some('/') {
                self.cursor.advance_while(|c| c != '\n');
                continue;
            }

            if self.cursor.peek() == Some('/') && self.cursor.peek_next() == Some('*') {
                let start = self.cursor.position();
                self.cursor.advance();
                self.cursor.advance();
                let mut closed = false;
                while !self.cursor.is_eof() {
                    if self.cursor.peek() == Some('*') && self.cursor.peek_next() == Some('/') {
                        self.cursor.advance();
                        self.cursor.advance();
                        closed = true;
                        break;
                    }
                    self.cursor.advance();
                }
                if !closed {
                    self.push(TokenKind::Error(LexErrorKind::UnterminatedComment), start);
                }
                continue;
            }

            break;
        }
    }

    /// Scan a single token.
    fn scan_token(&mut self) {
        let start = self.cursor.position();
        let expect_path = std::mem::take(&mut self.expect_path);
        let Some(c) = self.cursor.advance() else {
            return;
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '#' => TokenKind::Hash,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '.' if self.cursor.peek().is_some_and(|n| n.is_ascii_digit()) => {
                return self.scan_number(start);
            }
            '.' => TokenKind::Dot,
            '=' if self.cursor.eat('=') => TokenKind::EqEq,
            '=' => TokenKind::Eq,
            '!' if self.cursor.eat('=') => TokenKind::BangEq,
            '!' => TokenKind::Bang,
            '<' if expect_path => return self.scan_path(start),
            '<' if self.cursor.eat('=') => TokenKind::LtEq,
            '<' => TokenKind::Lt,
            '>' if self.cursor.eat('=') => TokenKind::GtEq,
            '>' => TokenKind::Gt,
            '&' if self.cursor.eat('&') => TokenKind::AmpAmp,
            '|' if self.cursor.eat('|') => TokenKind::PipePipe,
            '"' => return self.scan_string(start),
            '0'..='9' => return self.scan_number(start),
            'a'..='z' | 'A'..='Z' | '_' => return self.scan_identifier(start),
            '$' => return self.scan_dollar_identifier(start),
            _ => TokenKind::Error(LexErrorKind::UnexpectedCharacter),
        };

        self.push(kind, start);
    }

    /// Scan a string literal, decoding escapes into the token text.
    fn scan_string(&mut self, start: Position) {
        let mut value = String::new();
        let mut error = None;

        loop {
            match self.cursor.advance() {
                None => {
                    error = Some(LexErrorKind::UnterminatedString);
                    break;
                }
                Some('"') => break,
                Some('\\') => match self.scan_escape() {
                    Some(decoded) => value.push(decoded),
                    None => {
                        error.get_or_insert(LexErrorKind::InvalidEscape);
                    }
                },
                Some(other) => value.push(other),
            }
        }

        let span = Span::new(start, self.cursor.position());
        let token = match error {
            Some(kind) => Token::new(
                TokenKind::Error(kind),
                span,
                self.cursor.slice_from(start).to_string(),
            ),
            None => Token::new(TokenKind::String, span, value),
        };
        self.tokens.push(token);
    }

    /// Decode the escape after a backslash. `None` for unknown escapes.
    fn scan_escape(&mut self) -> Option<char> {
        match self.cursor.advance()? {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '"' => Some('"'),
            '\\' => Some('\\'),
            '\'' => Some('\''),
            'x' => self.scan_hex_escape(2).filter(|c| (*c as u32) < 0x80),
            'u' => self.scan_hex_escape(4),
            'U' => self.scan_hex_escape(6),
            _ => None,
        }
    }

    fn scan_hex_escape(&mut self, digits: usize) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self.cursor.peek()?.to_digit(16)?;
            self.cursor.advance();
            code = code * 16 + digit;
        }
        char::from_u32(code)
    }

    /// Scan a number literal: `12`, `1.5`, `.5`, `1.`, `1e3`, `2.5E-2`.
    ///
    /// The exponent is only consumed when digits follow it, so `2e` is the
    /// number `2` followed by the identifier `e`.
    fn scan_number(&mut self, start: Position) {
        self.cursor.advance_while(|c| c.is_ascii_digit());

        let started_with_dot = self.cursor.slice_from(start).starts_with('.');
        if !started_with_dot && self.cursor.peek() == Some('.') {
            let after = self.cursor.peek_next();
            let is_fraction = match after {
                Some(n) if n.is_ascii_digit() => true,
                Some(n) => !(n.is_alphabetic() || n == '_' || n == '.'),
                None => true,
            };
            if is_fraction {
                self.cursor.advance();
                self.cursor.advance_while(|c| c.is_ascii_digit());
            }
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let has_digits = match self.cursor.peek_next() {
                Some(d) if d.is_ascii_digit() => true,
                Some('+' | '-') => self.cursor.peek_third().is_some_and(|d| d.is_ascii_digit()),
                _ => false,
            };
            if has_digits {
                self.cursor.advance();
                if matches!(self.cursor.peek(), Some('+' | '-')) {
                    self.cursor.advance();
                }
                self.cursor.advance_while(|c| c.is_ascii_digit());
            }
        }

        self.push(TokenKind::Number, start);
    }

    /// Scan an identifier or keyword.
    fn scan_identifier(&mut self, start: Position) {
        self.cursor.advance_while(|c| c.is_alphanumeric() || c == '_');

        let kind = match self.cursor.slice_from(start) {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "undef" => TokenKind::Undef,
            "module" => TokenKind::Module,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "let" => TokenKind::Let,
            "each" => TokenKind::Each,
            "include" => TokenKind::Include,
            "use" => TokenKind::Use,
            _ => TokenKind::Identifier,
        };
        self.expect_path = matches!(kind, TokenKind::Include | TokenKind::Use);

        self.push(kind, start);
    }

    /// Scan a `$` identifier; the four reserved names get their own kind.
    fn scan_dollar_identifier(&mut self, start: Position) {
        self.cursor.advance_while(|c| c.is_alphanumeric() || c == '_');

        let text = self.cursor.slice_from(start);
        let kind = if text == "$" {
            TokenKind::Error(LexErrorKind::UnexpectedCharacter)
        } else if SpecialVariable::from_name(text).is_some() {
            TokenKind::SpecialVariable
        } else {
            TokenKind::DollarIdentifier
        };
        self.push(kind, start);
    }

    /// Scan `<path>` after `include` / `use`; the token text is the path.
    fn scan_path(&mut self, start: Position) {
        let path_start = self.cursor.position();
        self.cursor.advance_while(|c| c != '>' && c != '\n');
        let path = self.cursor.slice_from(path_start).to_string();
        if self.cursor.eat('>') {
            let span = Span::new(start, self.cursor.position());
            self.tokens.push(Token::new(TokenKind::FilePath, span, path));
        } else {
            self.push(TokenKind::Error(LexErrorKind::UnterminatedPath), start);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_cube() {
        let tokens = Lexer::new("cube(10);").tokenize();
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "cube");
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].text, "10");
        assert_eq!(tokens[5].kind, TokenKind::Eof);
    }

    #[test]
    fn test_positions_are_one_based() {
        let tokens = Lexer::new("a = 1;\n  cube();").tokenize();
        assert_eq!((tokens[0].line(), tokens[0].column()), (1, 1));
        let cube = tokens.iter().find(|t| t.text == "cube").expect("cube token");
        assert_eq!((cube.line(), cube.column()), (2, 3));
    }

    #[test]
    fn test_comments_are_stripped() {
        assert_eq!(
            kinds("// line\ncube /* block */ ();"),
            vec![
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_is_error_token() {
        let tokens = Lexer::new("cube(); /* never closed").tokenize();
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Error(LexErrorKind::UnterminatedComment)));
        assert!(tokens.last().is_some_and(Token::is_eof));
    }

    #[test]
    fn test_special_variables() {
        let tokens = Lexer::new("$fn $fa $fs $t $extra").tokenize();
        assert_eq!(tokens[0].special_variable(), Some(SpecialVariable::Fn));
        assert_eq!(tokens[3].special_variable(), Some(SpecialVariable::T));
        assert_eq!(tokens[4].kind, TokenKind::DollarIdentifier);
    }

    #[test]
    fn test_numbers() {
        for source in ["12", "1.5", ".5", "1e3", "2.5E-2", "1."] {
            let tokens = Lexer::new(source).tokenize();
            assert_eq!(tokens.len(), 2, "{source} should be one token");
            assert_eq!(tokens[0].kind, TokenKind::Number);
            assert_eq!(tokens[0].text, source);
        }
    }

    #[test]
    fn test_exponent_needs_digits() {
        let tokens = Lexer::new("2e").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "2");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].text, "e");
    }

    #[test]
    fn test_number_then_member_access_is_not_fraction() {
        assert_eq!(
            kinds("v.x"),
            vec![TokenKind::Identifier, TokenKind::Dot, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_string_escapes_decoded() {
        let tokens = Lexer::new(r#""a\n\t\"b\\\x41☺""#).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "a\n\t\"b\\A\u{263A}");
    }

    #[test]
    fn test_unterminated_string_is_error_token() {
        let tokens = Lexer::new("x = \"abc").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Error(LexErrorKind::UnterminatedString));
        assert!(tokens[3].is_eof());
    }

    #[test]
    fn test_invalid_escape_is_error_token() {
        let tokens = Lexer::new(r#""bad\q" ;"#).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error(LexErrorKind::InvalidEscape));
        assert_eq!(tokens[1].kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_modifier_sigils() {
        assert_eq!(
            kinds("! # % *"),
            vec![
                TokenKind::Bang,
                TokenKind::Hash,
                TokenKind::Percent,
                TokenKind::Star,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != <= >= && || ^ ?:"),
            vec![
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Caret,
                TokenKind::Question,
                TokenKind::Colon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_include_path() {
        let tokens = Lexer::new("include <lib/gears.scad>").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Include);
        assert_eq!(tokens[1].kind, TokenKind::FilePath);
        assert_eq!(tokens[1].text, "lib/gears.scad");
    }

    #[test]
    fn test_stray_characters_do_not_stop_tokenizing() {
        let tokens = Lexer::new("a @ b & c").tokenize();
        let errors = tokens.iter().filter(|t| t.is_error()).count();
        assert_eq!(errors, 2);
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Identifier).count(), 3);
    }
}
