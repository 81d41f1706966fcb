//! # Declaration Parsing
//!
//! ## Grammar
//!
//! ```text
//! module_def   = "module" IDENT "(" parameters ")" child
//! function_def = "function" IDENT "(" parameters ")" "=" expression ";"
//! parameters   = (parameter ("," parameter)*)? ","?
//! parameter    = NAME ("=" expression)?
//! ```

use openscad_ast::{FunctionDef, ModuleDef, Parameter, Statement, StatementKind};

use super::Parser;
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl Parser {
    /// Parse `module name(params) body`.
    pub(super) fn parse_module_definition(&mut self) -> Result<Statement, ParseError> {
        let start = self.current_position();
        self.expect(TokenKind::Module)?;
        let name = self.expect_identifier("module name")?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameters()?;
        let body = self.parse_child()?;

        Ok(Statement::new(
            StatementKind::ModuleDef(ModuleDef { name, params, body }),
            self.span_from(start),
        ))
    }

    /// Parse `function name(params) = expression;`.
    pub(super) fn parse_function_definition(&mut self) -> Result<Statement, ParseError> {
        let start = self.current_position();
        self.expect(TokenKind::Function)?;
        let name = self.expect_identifier("function name")?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameters()?;
        self.expect(TokenKind::Eq)?;
        let body = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Statement::new(
            StatementKind::FunctionDef(FunctionDef { name, params, body }),
            self.span_from(start),
        ))
    }

    /// Parse a parameter list after the opening `(`, consuming the `)`.
    pub(super) fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParseError> {
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) {
            let start = self.current_position();
            let name = self.expect_name("parameter name")?;
            let default = if self.match_token(TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            params.push(Parameter {
                name,
                default,
                span: self.span_from(start),
            });
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance().text.clone())
        } else {
            Err(ParseError::unexpected(self.peek(), what))
        }
    }
}
