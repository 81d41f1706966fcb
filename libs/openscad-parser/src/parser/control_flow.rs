//! # Control Flow Parsing
//!
//! ## Grammar
//!
//! ```text
//! if_statement  = "if" "(" expression ")" child ("else" child)?
//! for_statement = ("for" | "intersection_for") "(" bindings ")" child
//! let_statement = "let" "(" bindings ")" child
//! ```

use openscad_ast::{ForStatement, IfStatement, LetStatement, Statement, StatementKind};

use super::Parser;
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl Parser {
    /// Parse `if (cond) then [else other]`. A dangling `else` binds to the
    /// nearest `if`.
    pub(super) fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.current_position();
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = self.parse_child()?;
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(self.parse_child()?)
        } else {
            None
        };

        Ok(Statement::new(
            StatementKind::If(IfStatement {
                condition,
                then_branch,
                else_branch,
            }),
            self.span_from(start),
        ))
    }

    /// Parse `for (...) body` or `intersection_for (...) body`.
    pub(super) fn parse_for_statement(&mut self, intersection: bool) -> Result<Statement, ParseError> {
        let start = self.current_position();
        self.advance();
        self.expect(TokenKind::LParen)?;
        let bindings = self.parse_bindings()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_child()?;

        Ok(Statement::new(
            StatementKind::For(ForStatement {
                bindings,
                body,
                intersection,
            }),
            self.span_from(start),
        ))
    }

    /// Parse `let (bindings) body`.
    pub(super) fn parse_let_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.current_position();
        self.expect(TokenKind::Let)?;
        self.expect(TokenKind::LParen)?;
        let bindings = self.parse_bindings()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_child()?;

        Ok(Statement::new(
            StatementKind::Let(LetStatement { bindings, body }),
            self.span_from(start),
        ))
    }
}
