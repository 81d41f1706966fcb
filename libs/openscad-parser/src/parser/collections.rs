//! # Collection Parsing
//!
//! Parses list literals, ranges and list comprehensions.
//!
//! ## Grammar
//!
//! ```text
//! list    = "[" "]"
//!         | "[" expression ":" expression (":" expression)? "]"
//!         | "[" element ("," element)* ","? "]"
//! element = "for" "(" bindings ")" element
//!         | "for" "(" bindings ";" expression ";" bindings ")" element
//!         | "if" "(" expression ")" element ("else" element)?
//!         | "let" "(" bindings ")" element
//!         | "each" element
//!         | expression
//! ```
//!
//! A list whose elements are all plain expressions becomes
//! `ExpressionKind::Vector`; anything with a generator becomes
//! `ExpressionKind::Comprehension`.

use openscad_ast::{Element, Expression, ExpressionKind};

use super::Parser;
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl Parser {
    /// Parse anything starting with `[`.
    pub(super) fn parse_list(&mut self) -> Result<Expression, ParseError> {
        let start = self.current_position();
        self.expect(TokenKind::LBracket)?;

        if self.match_token(TokenKind::RBracket) {
            return Ok(Expression::new(ExpressionKind::Vector(Vec::new()), self.span_from(start)));
        }

        let first = self.parse_element()?;

        if let Element::Expr(first_expr) = &first {
            if self.check(TokenKind::Colon) {
                let range_start = first_expr.clone();
                return self.parse_range(start, range_start);
            }
        }

        let mut elements = vec![first];
        while self.match_token(TokenKind::Comma) {
            if self.check(TokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_element()?);
        }
        self.expect(TokenKind::RBracket)?;

        let kind = if elements.iter().all(|e| matches!(e, Element::Expr(_))) {
            ExpressionKind::Vector(
                elements
                    .into_iter()
                    .filter_map(|e| match e {
                        Element::Expr(expr) => Some(expr),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            ExpressionKind::Comprehension(elements)
        };
        Ok(Expression::new(kind, self.span_from(start)))
    }

    /// Parse the rest of `[start : end]` or `[start : step : end]`.
    fn parse_range(
        &mut self,
        start: openscad_ast::Position,
        first: Expression,
    ) -> Result<Expression, ParseError> {
        self.expect(TokenKind::Colon)?;
        let second = self.parse_expression()?;
        let (step, end) = if self.match_token(TokenKind::Colon) {
            (Some(Box::new(second)), self.parse_expression()?)
        } else {
            (None, second)
        };
        self.expect(TokenKind::RBracket)?;

        Ok(Expression::new(
            ExpressionKind::Range {
                start: Box::new(first),
                step,
                end: Box::new(end),
            },
            self.span_from(start),
        ))
    }

    /// Parse one list element, generator or plain expression.
    fn parse_element(&mut self) -> Result<Element, ParseError> {
        self.nested(|p| p.parse_element_inner())
    }

    fn parse_element_inner(&mut self) -> Result<Element, ParseError> {
        match self.peek_kind() {
            TokenKind::For => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let bindings = self.parse_bindings()?;
                if self.match_token(TokenKind::Semicolon) {
                    let condition = self.parse_expression()?;
                    self.expect(TokenKind::Semicolon)?;
                    let update = self.parse_bindings()?;
                    self.expect(TokenKind::RParen)?;
                    let body = self.parse_element()?;
                    return Ok(Element::ForC {
                        init: bindings,
                        condition,
                        update,
                        body: Box::new(body),
                    });
                }
                self.expect(TokenKind::RParen)?;
                let body = self.parse_element()?;
                Ok(Element::For {
                    bindings,
                    body: Box::new(body),
                })
            }
            TokenKind::If => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let condition = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                let then_branch = self.parse_element()?;
                let else_branch = if self.match_token(TokenKind::Else) {
                    Some(Box::new(self.parse_element()?))
                } else {
                    None
                };
                Ok(Element::If {
                    condition,
                    then_branch: Box::new(then_branch),
                    else_branch,
                })
            }
            TokenKind::Let => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let bindings = self.parse_bindings()?;
                self.expect(TokenKind::RParen)?;
                let body = self.parse_element()?;
                Ok(Element::Let {
                    bindings,
                    body: Box::new(body),
                })
            }
            TokenKind::Each => {
                self.advance();
                let body = self.parse_element()?;
                Ok(Element::Each(Box::new(body)))
            }
            // Already one level down; a plain element is not a second one.
            _ => Ok(Element::Expr(self.parse_expression_inner()?)),
        }
    }
}
