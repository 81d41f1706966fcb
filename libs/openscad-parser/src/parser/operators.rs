//! # Operator Parsing
//!
//! Binary operators use precedence climbing. Unary operators and `^` are
//! handled below the climbing loop so that `-2^2` is `-(2^2)` and
//! `2^3^2` is `2^(3^2)`.
//!
//! ## Operator Precedence
//!
//! | Precedence | Operators | Associativity |
//! |------------|-----------|---------------|
//! | 1 | ?: (ternary) | Right |
//! | 2 | \|\| | Left |
//! | 3 | && | Left |
//! | 4 | == != | Left |
//! | 5 | < > <= >= | Left |
//! | 6 | + - | Left |
//! | 7 | * / % | Left |
//! | 8 | ! - + (unary) | Right |
//! | 9 | ^ | Right |
//! | 10 | () [] . (postfix) | Left |

use openscad_ast::{BinaryOp, Expression, ExpressionKind, UnaryOp};

use super::Parser;
use crate::error::ParseError;
use crate::lexer::TokenKind;

// =============================================================================
// PRECEDENCE
// =============================================================================

/// Binary operator precedence levels handled by the climbing loop.
///
/// Higher values bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    /// Logical or: `||`
    Or = 1,
    /// Logical and: `&&`
    And = 2,
    /// Equality: `== !=`
    Equality = 3,
    /// Comparison: `< > <= >=`
    Comparison = 4,
    /// Addition/subtraction: `+ -`
    Term = 5,
    /// Multiplication/division: `* / %`
    Factor = 6,
}

impl Precedence {
    /// Precedence and AST operator for a binary operator token.
    pub(super) fn of_binary(kind: TokenKind) -> Option<(Self, BinaryOp)> {
        let entry = match kind {
            TokenKind::PipePipe => (Self::Or, BinaryOp::Or),
            TokenKind::AmpAmp => (Self::And, BinaryOp::And),
            TokenKind::EqEq => (Self::Equality, BinaryOp::Equal),
            TokenKind::BangEq => (Self::Equality, BinaryOp::NotEqual),
            TokenKind::Lt => (Self::Comparison, BinaryOp::Less),
            TokenKind::Gt => (Self::Comparison, BinaryOp::Greater),
            TokenKind::LtEq => (Self::Comparison, BinaryOp::LessEqual),
            TokenKind::GtEq => (Self::Comparison, BinaryOp::GreaterEqual),
            TokenKind::Plus => (Self::Term, BinaryOp::Add),
            TokenKind::Minus => (Self::Term, BinaryOp::Subtract),
            TokenKind::Star => (Self::Factor, BinaryOp::Multiply),
            TokenKind::Slash => (Self::Factor, BinaryOp::Divide),
            TokenKind::Percent => (Self::Factor, BinaryOp::Modulo),
            _ => return None,
        };
        Some(entry)
    }

    /// Next tighter level, used for the right operand of left-associative
    /// operators. `None` past the tightest level.
    pub(super) fn next(&self) -> Option<Self> {
        match self {
            Self::Or => Some(Self::And),
            Self::And => Some(Self::Equality),
            Self::Equality => Some(Self::Comparison),
            Self::Comparison => Some(Self::Term),
            Self::Term => Some(Self::Factor),
            Self::Factor => None,
        }
    }
}

// =============================================================================
// OPERATOR PARSING
// =============================================================================

impl Parser {
    /// Parse binary operators binding at least as tightly as `min_prec`.
    pub(super) fn parse_binary(&mut self, min_prec: Precedence) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some((prec, op)) = Precedence::of_binary(self.peek_kind()) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = match prec.next() {
                Some(tighter) => self.parse_binary(tighter)?,
                None => self.parse_unary()?,
            };
            let span = left.span.merge(right.span);
            left = Expression::new(
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    /// Parse `! - +` prefixes.
    pub(super) fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_exponent(),
        };
        let start = self.current_position();
        self.advance();
        let operand = self.nested(|p| p.parse_unary())?;
        Ok(Expression::new(
            ExpressionKind::Unary {
                op,
                operand: Box::new(operand),
            },
            self.span_from(start),
        ))
    }

    /// Parse `postfix ("^" unary)?`; the exponent is right-associative.
    fn parse_exponent(&mut self) -> Result<Expression, ParseError> {
        let base = self.parse_postfix()?;
        if !self.match_token(TokenKind::Caret) {
            return Ok(base);
        }
        let exponent = self.nested(|p| p.parse_unary())?;
        let span = base.span.merge(exponent.span);
        Ok(Expression::new(
            ExpressionKind::Binary {
                op: BinaryOp::Power,
                left: Box::new(base),
                right: Box::new(exponent),
            },
            span,
        ))
    }
}
