//! # OpenSCAD Parser (Pure Rust)
//!
//! Hand-written tokenizer and recursive-descent parser for the OpenSCAD
//! language, producing the shared `openscad-ast` tree.
//!
//! ## Architecture
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Vec<Statement> + Vec<ParseError>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::{parse, tokenize};
//!
//! let tokens = tokenize("cube(10);");
//! let result = parse(tokens);
//! assert!(result.success());
//! assert_eq!(result.ast[0].invocation_name(), Some("cube"));
//! ```
//!
//! ## Pipeline Integration
//!
//! ```text
//! openscad-parser → openscad-eval → geometry kernel → openscad-jobs
//! ```

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use lexer::{LexErrorKind, SpecialVariable, Token, TokenKind};
pub use parser::{ParseResult, Parser};

// =============================================================================
// PUBLIC API
// =============================================================================

/// Convert source text into tokens.
///
/// Never fails: malformed input becomes error tokens, and the result
/// always ends with an EOF token.
///
/// ```rust
/// use openscad_parser::{tokenize, TokenKind};
///
/// let tokens = tokenize("\"open");
/// assert!(tokens[0].is_error());
/// assert_eq!(tokens[1].kind, TokenKind::Eof);
/// ```
pub fn tokenize(source: &str) -> Vec<Token> {
    lexer::Lexer::new(source).tokenize()
}

/// Parse a token stream.
///
/// ## Returns
///
/// [`ParseResult`] holding every recovered statement and every syntax
/// error. `success()` is false when any error was recorded; the AST is
/// still populated for tooling.
pub fn parse(tokens: Vec<Token>) -> ParseResult {
    Parser::new(tokens).parse()
}

/// Tokenize and parse in one step.
///
/// ```rust
/// use openscad_parser::parse_source;
///
/// let result = parse_source("cube(; sphere(5);");
/// assert!(!result.success());
/// assert_eq!(result.ast[0].invocation_name(), Some("sphere"));
/// ```
pub fn parse_source(source: &str) -> ParseResult {
    parse(tokenize(source))
}
