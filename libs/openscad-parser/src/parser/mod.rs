//! # OpenSCAD Parser
//!
//! Recursive descent parser producing the shared AST. Syntax errors are
//! collected, the parser resynchronizes at the next statement boundary,
//! and parsing continues so one bad statement does not hide the rest.
//!
//! ## Example
//!
//! ```rust
//! use openscad_parser::lexer::Lexer;
//! use openscad_parser::parser::Parser;
//!
//! let tokens = Lexer::new("cube(10);").tokenize();
//! let result = Parser::new(tokens).parse();
//! assert!(result.success());
//! assert_eq!(result.ast.len(), 1);
//! ```

mod arguments;
mod collections;
mod control_flow;
mod declarations;
mod expressions;
mod operators;
mod statements;

use openscad_ast::{Position, Span, Statement};
use config::constants::{MAX_NESTING_DEPTH, STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};

use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Token, TokenKind};

// =============================================================================
// PARSE RESULT
// =============================================================================

/// Output of a parse: every statement that could be recovered plus every
/// syntax error found.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// Top-level statements.
    pub ast: Vec<Statement>,
    /// Syntax errors in source order.
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// True when no syntax error was recorded.
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

// =============================================================================
// PARSER
// =============================================================================

/// Recursive descent parser for OpenSCAD.
pub struct Parser {
    /// Token stream, always terminated by EOF.
    tokens: Vec<Token>,
    /// Current token index.
    current: usize,
    /// Collected parse errors.
    errors: Vec<ParseError>,
    /// Current nesting of statements, expressions and list elements.
    depth: usize,
}

impl Parser {
    /// Create a parser over a token stream.
    ///
    /// Lexical error tokens are reported as syntax errors up front and
    /// removed from the stream.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut errors = Vec::new();
        let mut stream: Vec<Token> = Vec::with_capacity(tokens.len() + 1);
        for token in tokens {
            match token.kind {
                TokenKind::Error(kind) => errors.push(ParseError::lexical(&token, kind)),
                TokenKind::Eof => {
                    stream.push(token);
                    break;
                }
                _ => stream.push(token),
            }
        }
        if !stream.last().is_some_and(Token::is_eof) {
            let end = stream.last().map(|t| t.span.end).unwrap_or_default();
            stream.push(Token::new(TokenKind::Eof, Span::point(end), String::new()));
        }

        Self {
            tokens: stream,
            current: 0,
            errors,
            depth: 0,
        }
    }

    /// Parse the whole token stream.
    pub fn parse(mut self) -> ParseResult {
        let mut ast = Vec::new();

        while !self.is_at_end() {
            if self.check(TokenKind::RBrace) {
                let token = self.peek().clone();
                self.errors.push(ParseError::unexpected(&token, "statement"));
                self.advance();
                continue;
            }
            self.parse_statement_into(&mut ast);
        }

        self.errors.sort_by_key(|e| e.span.start.byte);
        if !self.errors.is_empty() {
            tracing::debug!(errors = self.errors.len(), "parse finished with errors");
        }

        ParseResult {
            ast,
            errors: self.errors,
        }
    }

    /// Parse one statement into `out`, recording and recovering from
    /// any error.
    fn parse_statement_into(&mut self, out: &mut Vec<Statement>) {
        let before = self.current;
        match self.parse_statement() {
            Ok(Some(statement)) => out.push(statement),
            Ok(None) => {}
            Err(error) => {
                self.errors.push(error);
                self.synchronize(before);
            }
        }
    }

    // =========================================================================
    // TOKEN ACCESS
    // =========================================================================

    /// Get current token.
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// Token `offset` positions ahead, clamped to EOF.
    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.current + offset).min(last)]
    }

    /// Get current token kind.
    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Check if current token matches kind.
    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Check if at end of file.
    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    /// Get current position.
    fn current_position(&self) -> Position {
        self.peek().span.start
    }

    /// Advance to next token, returning the consumed one.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// Get previous token.
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Consume a token of `kind` or fail.
    fn expect(&mut self, kind: TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(self.peek(), &format!("'{}'", kind.display())))
        }
    }

    /// Consume a name token (identifier or `$` variable).
    fn expect_name(&mut self, what: &str) -> Result<String, ParseError> {
        if self.peek_kind().is_name() {
            Ok(self.advance().text.clone())
        } else {
            Err(ParseError::unexpected(self.peek(), what))
        }
    }

    /// Try to consume token if it matches.
    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // =========================================================================
    // ERROR RECOVERY
    // =========================================================================

    /// Skip to the next statement boundary after an error.
    ///
    /// Stops after a `;`, before a `}`, or before a keyword that starts a
    /// statement. Always consumes at least one token when the failed
    /// statement consumed none.
    fn synchronize(&mut self, statement_start: usize) {
        if self.current == statement_start && !self.is_at_end() && !self.check(TokenKind::RBrace) {
            self.advance();
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
        }

        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace
                | TokenKind::Module
                | TokenKind::Function
                | TokenKind::For
                | TokenKind::If
                | TokenKind::Include
                | TokenKind::Use => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Create span from start to the end of the previous token.
    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.previous().span.end)
    }

    /// Run a recursive parse step one nesting level deeper, on a stack
    /// that grows on demand.
    fn nested<T>(
        &mut self,
        step: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::new(
                ParseErrorKind::NestingTooDeep {
                    limit: MAX_NESTING_DEPTH,
                },
                self.peek().span,
            ));
        }
        self.depth += 1;
        let result =
            stacker::maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || step(self));
        self.depth -= 1;
        result
    }
}

// =============================================================================
// TESTS
// =============================================================================
