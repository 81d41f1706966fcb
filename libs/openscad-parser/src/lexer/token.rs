//! # Tokens
//!
//! Token types for the OpenSCAD lexer.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::lexer::TokenKind;
//!
//! assert!(TokenKind::Module.is_keyword());
//! assert_eq!(TokenKind::LParen.display(), "(");
//! ```

use std::fmt;

use openscad_ast::{Span, Spanned};
use serde::{Deserialize, Serialize};

// =============================================================================
// TOKEN
// =============================================================================

/// A token produced by the lexer.
///
/// `text` is the source slice, except for string literals where it holds
/// the decoded contents (escapes resolved, quotes removed). The raw slice
/// is always recoverable through `span`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token type.
    pub kind: TokenKind,
    /// Source span.
    pub span: Span,
    /// Token text.
    pub text: String,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: String) -> Self {
        Self { kind, span, text }
    }

    /// 1-based line of the first character.
    pub fn line(&self) -> usize {
        self.span.start.line
    }

    /// 1-based column of the first character.
    pub fn column(&self) -> usize {
        self.span.start.column
    }

    /// Check if token is EOF.
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Check if token is a lexical error.
    pub fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_))
    }

    /// The reserved special variable this token names, if any.
    pub fn special_variable(&self) -> Option<SpecialVariable> {
        match self.kind {
            TokenKind::SpecialVariable => SpecialVariable::from_name(&self.text),
            _ => None,
        }
    }
}

impl Spanned for Token {
    fn span(&self) -> Span {
        self.span
    }
}

// =============================================================================
// SPECIAL VARIABLES
// =============================================================================

/// The four reserved `$` variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialVariable {
    /// `$fn` fragment count
    Fn,
    /// `$fa` minimum fragment angle
    Fa,
    /// `$fs` minimum fragment size
    Fs,
    /// `$t` animation time
    T,
}

impl SpecialVariable {
    /// Look up a reserved name, including its `$`.
    ///
    /// ```rust
    /// use openscad_parser::lexer::SpecialVariable;
    ///
    /// assert_eq!(SpecialVariable::from_name("$fn"), Some(SpecialVariable::Fn));
    /// assert_eq!(SpecialVariable::from_name("$other"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "$fn" => Some(Self::Fn),
            "$fa" => Some(Self::Fa),
            "$fs" => Some(Self::Fs),
            "$t" => Some(Self::T),
            _ => None,
        }
    }

    /// Source name including `$`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fn => "$fn",
            Self::Fa => "$fa",
            Self::Fs => "$fs",
            Self::T => "$t",
        }
    }
}

// =============================================================================
// LEXICAL ERRORS
// =============================================================================

/// Reason attached to an error token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LexErrorKind {
    /// String reaches end of input without a closing quote.
    UnterminatedString,
    /// Block comment reaches end of input without `*/`.
    UnterminatedComment,
    /// Unknown or malformed escape sequence in a string.
    InvalidEscape,
    /// Character that starts no token.
    UnexpectedCharacter,
    /// `include <` without a closing `>`.
    UnterminatedPath,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::UnterminatedString => "unterminated string literal",
            Self::UnterminatedComment => "unterminated block comment",
            Self::InvalidEscape => "invalid escape sequence",
            Self::UnexpectedCharacter => "unexpected character",
            Self::UnterminatedPath => "unterminated file path",
        };
        f.write_str(message)
    }
}

// =============================================================================
// TOKEN KIND
// =============================================================================

/// Types of tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Number literal like `10`, `3.14`, `.5` or `1e-3`
    Number,
    /// String literal like `"hello"`
    String,
    /// Boolean true
    True,
    /// Boolean false
    False,
    /// Undef value
    Undef,

    // Identifiers
    /// Identifier like `cube` or `myVar`
    Identifier,
    /// One of `$fn`, `$fa`, `$fs`, `$t`
    SpecialVariable,
    /// Any other `$name`
    DollarIdentifier,
    /// `<path>` following `include` or `use`
    FilePath,

    // Keywords
    /// `module` keyword
    Module,
    /// `function` keyword
    Function,
    /// `if` keyword
    If,
    /// `else` keyword
    Else,
    /// `for` keyword
    For,
    /// `let` keyword
    Let,
    /// `each` keyword
    Each,
    /// `include` keyword
    Include,
    /// `use` keyword
    Use,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*` (also the disable modifier)
    Star,
    /// `/`
    Slash,
    /// `%` (also the background modifier)
    Percent,
    /// `^`
    Caret,
    /// `!` (also the root modifier)
    Bang,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `?`
    Question,
    /// `:`
    Colon,

    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,

    // Modifiers
    /// `#` debug modifier
    Hash,

    // Meta
    /// End of file
    Eof,
    /// Lexical error
    Error(LexErrorKind),
}

impl TokenKind {
    /// Check if this is a literal token.
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Number | Self::String | Self::True | Self::False | Self::Undef)
    }

    /// Check if this is a keyword token.
    pub const fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Module
                | Self::Function
                | Self::If
                | Self::Else
                | Self::For
                | Self::Let
                | Self::Each
                | Self::Include
                | Self::Use
                | Self::True
                | Self::False
                | Self::Undef
        )
    }

    /// Identifiers usable as variable names.
    pub const fn is_name(&self) -> bool {
        matches!(self, Self::Identifier | Self::SpecialVariable | Self::DollarIdentifier)
    }

    /// Sigils that may prefix a module invocation.
    pub const fn is_modifier(&self) -> bool {
        matches!(self, Self::Bang | Self::Hash | Self::Percent | Self::Star)
    }

    /// Tokens that may begin an expression.
    pub const fn starts_expression(&self) -> bool {
        matches!(
            self,
            Self::Number
                | Self::String
                | Self::True
                | Self::False
                | Self::Undef
                | Self::Identifier
                | Self::SpecialVariable
                | Self::DollarIdentifier
                | Self::LParen
                | Self::LBracket
                | Self::Minus
                | Self::Plus
                | Self::Bang
                | Self::Let
                | Self::Function
        )
    }

    /// Get display string for error messages.
    pub const fn display(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::True => "true",
            Self::False => "false",
            Self::Undef => "undef",
            Self::Identifier => "identifier",
            Self::SpecialVariable => "special variable",
            Self::DollarIdentifier => "$ variable",
            Self::FilePath => "file path",
            Self::Module => "module",
            Self::Function => "function",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::Let => "let",
            Self::Each => "each",
            Self::Include => "include",
            Self::Use => "use",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Caret => "^",
            Self::Bang => "!",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::BangEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::Question => "?",
            Self::Colon => ":",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Hash => "#",
            Self::Eof => "end of file",
            Self::Error(_) => "error",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
