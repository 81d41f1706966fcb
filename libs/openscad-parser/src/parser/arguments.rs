//! # Arguments and Bindings
//!
//! ## Grammar
//!
//! ```text
//! arguments = (argument ("," argument)*)? ","? ")"
//! argument  = NAME "=" expression | expression
//! bindings  = (NAME "=" expression ("," NAME "=" expression)*)? ","?
//! ```

use openscad_ast::{Argument, Assignment};

use super::Parser;
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl Parser {
    /// Parse call arguments after the opening `(`, consuming the `)`.
    pub(super) fn parse_arguments(&mut self) -> Result<Vec<Argument>, ParseError> {
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) {
            let start = self.current_position();
            let name = if self.peek_kind().is_name() && self.peek_at(1).kind == TokenKind::Eq {
                let name = self.advance().text.clone();
                self.advance();
                Some(name)
            } else {
                None
            };
            let value = self.parse_expression()?;
            args.push(Argument {
                name,
                value,
                span: self.span_from(start),
            });
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    /// Parse `name = value` pairs up to (not including) the closing token.
    pub(super) fn parse_bindings(&mut self) -> Result<Vec<Assignment>, ParseError> {
        let mut bindings = Vec::new();
        while self.peek_kind().is_name() {
            bindings.push(self.parse_binding()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(bindings)
    }

    /// Parse a single `name = value`.
    pub(super) fn parse_binding(&mut self) -> Result<Assignment, ParseError> {
        let start = self.current_position();
        let name = self.expect_name("variable name")?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        Ok(Assignment {
            name,
            value,
            span: self.span_from(start),
        })
    }
}
