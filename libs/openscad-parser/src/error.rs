//! # Parse Errors
//!
//! Error types for the OpenSCAD tokenizer and parser. Every error carries
//! the span it was detected at; `line()` and `column()` are 1-based.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::parse_source;
//!
//! let result = parse_source("cube(;");
//! let error = &result.errors[0];
//! assert_eq!(error.line(), 1);
//! assert!(error.to_string().contains("line 1"));
//! ```

use openscad_ast::{Span, Spanned};
use thiserror::Error;

use crate::lexer::{LexErrorKind, Token};

// =============================================================================
// PARSE ERROR
// =============================================================================

/// A syntax error with location information.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at line {}, column {}", .span.start.line, .span.start.column)]
pub struct ParseError {
    /// Error kind with details.
    pub kind: ParseErrorKind,
    /// Source location of error.
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    pub const fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Error for `token` when `expected` was required.
    pub fn unexpected(token: &Token, expected: &str) -> Self {
        let kind = if token.is_eof() {
            ParseErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            }
        } else {
            ParseErrorKind::UnexpectedToken {
                found: token.text.clone(),
                expected: expected.to_string(),
            }
        };
        Self::new(kind, token.span)
    }

    /// Error for a lexical error token.
    pub fn lexical(token: &Token, kind: LexErrorKind) -> Self {
        let kind = match kind {
            LexErrorKind::UnterminatedString => ParseErrorKind::UnterminatedString,
            LexErrorKind::UnterminatedComment => ParseErrorKind::UnterminatedComment,
            LexErrorKind::InvalidEscape => ParseErrorKind::InvalidEscape,
            LexErrorKind::UnterminatedPath => ParseErrorKind::UnterminatedPath,
            LexErrorKind::UnexpectedCharacter => ParseErrorKind::UnexpectedCharacter {
                found: token.text.clone(),
            },
        };
        Self::new(kind, token.span)
    }

    /// Human-readable message without the position suffix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// 1-based line of the error.
    pub fn line(&self) -> usize {
        self.span.start.line
    }

    /// 1-based column of the error.
    pub fn column(&self) -> usize {
        self.span.start.column
    }
}

impl Spanned for ParseError {
    fn span(&self) -> Span {
        self.span
    }
}

// =============================================================================
// PARSE ERROR KIND
// =============================================================================

/// Kinds of syntax errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    /// Found a token the grammar does not allow here.
    #[error("expected {expected}, found '{found}'")]
    UnexpectedToken {
        /// Token that was found.
        found: String,
        /// Description of what was expected.
        expected: String,
    },

    /// Input ended early.
    #[error("expected {expected}, found end of file")]
    UnexpectedEof {
        /// Description of what was expected.
        expected: String,
    },

    /// Number literal that does not parse as a finite value.
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    /// String without a closing quote.
    #[error("unterminated string literal")]
    UnterminatedString,

    /// Block comment without `*/`.
    #[error("unterminated block comment")]
    UnterminatedComment,

    /// Unknown escape sequence in a string.
    #[error("invalid escape sequence in string literal")]
    InvalidEscape,

    /// `include <` without `>`.
    #[error("unterminated file path")]
    UnterminatedPath,

    /// Character that starts no token.
    #[error("unexpected character '{found}'")]
    UnexpectedCharacter {
        /// The offending text.
        found: String,
    },

    /// Modifier sigil in front of something other than a module invocation.
    #[error("modifier '{sigil}' must precede a module invocation")]
    MisplacedModifier {
        /// The sigil character.
        sigil: char,
    },

    /// Statements or expressions nested past the parser's limit.
    #[error("nesting exceeds {limit} levels")]
    NestingTooDeep {
        /// The nesting limit.
        limit: usize,
    },

    /// `include <...>` or `use <...>`.
    #[error("file inclusion is not supported: '{path}'")]
    FileInclusion {
        /// The requested path.
        path: String,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use openscad_ast::Position;

    use crate::lexer::TokenKind;

    #[test]
    fn test_display_includes_position() {
        let error = ParseError::new(
            ParseErrorKind::InvalidNumber("1e".into()),
            Span::point(Position::new(4, 2, 7)),
        );
        assert_eq!(error.to_string(), "invalid number literal '1e' at line 2, column 7");
        assert_eq!(error.message(), "invalid number literal '1e'");
    }

    #[test]
    fn test_unexpected_eof_kind() {
        let eof = Token::new(TokenKind::Eof, Span::default(), String::new());
        let error = ParseError::unexpected(&eof, "')'");
        assert!(matches!(error.kind, ParseErrorKind::UnexpectedEof { .. }));
    }
}
