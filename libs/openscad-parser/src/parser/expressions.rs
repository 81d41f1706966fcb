//! # Expression Parsing
//!
//! ## Grammar
//!
//! ```text
//! expression = "let" "(" bindings ")" expression
//!            | "function" "(" parameters ")" expression
//!            | ("echo" | "assert") "(" arguments ")" expression?
//!            | logic_or ("?" expression ":" expression)?
//! postfix    = primary ( "(" arguments | "[" expression "]" | "." IDENT )*
//! primary    = NUMBER | STRING | "true" | "false" | "undef" | NAME
//!            | "(" expression ")" | list
//! ```

use openscad_ast::{Expression, ExpressionKind, Literal, Position};

use super::operators::Precedence;
use super::Parser;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;

impl Parser {
    /// Parse a full expression.
    pub(super) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.nested(|p| p.parse_expression_inner())
    }

    pub(super) fn parse_expression_inner(&mut self) -> Result<Expression, ParseError> {
        let start = self.current_position();
        match self.peek_kind() {
            TokenKind::Let => return self.parse_let_expression(start),
            TokenKind::Function if self.peek_at(1).kind == TokenKind::LParen => {
                return self.parse_function_literal(start);
            }
            TokenKind::Identifier
                if matches!(self.peek().text.as_str(), "echo" | "assert")
                    && self.peek_at(1).kind == TokenKind::LParen =>
            {
                return self.parse_echo_or_assert(start);
            }
            _ => {}
        }

        let condition = self.parse_binary(Precedence::Or)?;
        if !self.match_token(TokenKind::Question) {
            return Ok(condition);
        }
        let then_expr = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        let else_expr = self.parse_expression()?;

        Ok(Expression::new(
            ExpressionKind::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            self.span_from(start),
        ))
    }

    fn parse_let_expression(&mut self, start: Position) -> Result<Expression, ParseError> {
        self.expect(TokenKind::Let)?;
        self.expect(TokenKind::LParen)?;
        let bindings = self.parse_bindings()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_expression()?;
        Ok(Expression::new(
            ExpressionKind::Let {
                bindings,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn parse_function_literal(&mut self, start: Position) -> Result<Expression, ParseError> {
        self.expect(TokenKind::Function)?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameters()?;
        let body = self.parse_expression()?;
        Ok(Expression::new(
            ExpressionKind::FunctionLiteral {
                params,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    /// `echo(args) [expr]` and `assert(args) [expr]`.
    fn parse_echo_or_assert(&mut self, start: Position) -> Result<Expression, ParseError> {
        let is_echo = self.advance().text == "echo";
        self.expect(TokenKind::LParen)?;
        let args = self.parse_arguments()?;
        let body = if self.peek_kind().starts_expression() {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        let kind = if is_echo {
            ExpressionKind::Echo { args, body }
        } else {
            ExpressionKind::Assert { args, body }
        };
        Ok(Expression::new(kind, self.span_from(start)))
    }

    /// Parse a primary followed by calls, indexing and member access.
    pub(super) fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let start = self.current_position();
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_arguments()?;
                    expr = Expression::new(
                        ExpressionKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expression::new(
                        ExpressionKind::Index {
                            target: Box::new(expr),
                            index: Box::new(index),
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = match self.peek_kind() {
                        TokenKind::Identifier => self.advance().text.clone(),
                        _ => return Err(ParseError::unexpected(self.peek(), "member name")),
                    };
                    expr = Expression::new(
                        ExpressionKind::Member {
                            target: Box::new(expr),
                            field,
                        },
                        self.span_from(start),
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let token = self.peek().clone();
        let kind = match token.kind {
            TokenKind::Number => {
                let value: f64 = token
                    .text
                    .parse()
                    .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber(token.text.clone()), token.span))?;
                ExpressionKind::Literal(Literal::Number(value))
            }
            TokenKind::String => ExpressionKind::Literal(Literal::String(token.text.clone())),
            TokenKind::True => ExpressionKind::Literal(Literal::Boolean(true)),
            TokenKind::False => ExpressionKind::Literal(Literal::Boolean(false)),
            TokenKind::Undef => ExpressionKind::Literal(Literal::Undef),
            TokenKind::Identifier | TokenKind::SpecialVariable | TokenKind::DollarIdentifier => {
                ExpressionKind::Identifier(token.text.clone())
            }
            TokenKind::LParen => {
                self.advance();
                let mut inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                inner.span = self.span_from(token.span.start);
                return Ok(inner);
            }
            TokenKind::LBracket => return self.parse_list(),
            _ => return Err(ParseError::unexpected(&token, "expression")),
        };
        self.advance();
        Ok(Expression::new(kind, token.span))
    }
}
