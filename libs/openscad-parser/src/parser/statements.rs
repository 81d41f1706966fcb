//! # Statement Parsing
//!
//! ## Grammar
//!
//! ```text
//! statement  = ";"
//!            | "{" statement* "}"
//!            | modifier* invocation
//!            | NAME "=" expression ";"
//!            | module_def | function_def
//!            | if_statement | for_statement | let_statement
//!            | ("include" | "use") PATH
//! invocation = IDENT "(" arguments ")" child
//! child      = ";" | "{" statement* "}" | statement
//! modifier   = "!" | "#" | "%" | "*"
//! ```

use openscad_ast::{Assignment, Invocation, Modifier, Statement, StatementKind};

use super::Parser;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;

impl Parser {
    /// Parse one statement. `Ok(None)` for statements that produce no node
    /// (the empty statement).
    pub(super) fn parse_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        self.nested(|p| p.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<Option<Statement>, ParseError> {
        if self.peek_kind().is_modifier() {
            return self.parse_modified_statement();
        }

        let statement = match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                return Ok(None);
            }
            TokenKind::LBrace => {
                let start = self.current_position();
                let body = self.parse_block()?;
                Statement::new(StatementKind::Block(body), self.span_from(start))
            }
            TokenKind::Module => self.parse_module_definition()?,
            TokenKind::Function => self.parse_function_definition()?,
            TokenKind::If => self.parse_if_statement()?,
            TokenKind::For => self.parse_for_statement(false)?,
            TokenKind::Let => self.parse_let_statement()?,
            TokenKind::Include | TokenKind::Use => return self.parse_inclusion(),
            TokenKind::Identifier
                if self.peek().text == "intersection_for"
                    && self.peek_at(1).kind == TokenKind::LParen =>
            {
                self.parse_for_statement(true)?
            }
            TokenKind::Identifier | TokenKind::SpecialVariable | TokenKind::DollarIdentifier
                if self.peek_at(1).kind == TokenKind::Eq =>
            {
                self.parse_assignment_statement()?
            }
            TokenKind::Identifier => self.parse_invocation(None)?,
            _ => return Err(ParseError::unexpected(self.peek(), "statement")),
        };

        Ok(Some(statement))
    }

    /// Parse sigils followed by a module invocation. When several sigils
    /// are stacked the last one wins.
    fn parse_modified_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        let mut modifier = None;
        let mut last_sigil = None;
        while self.peek_kind().is_modifier() {
            let token = self.advance();
            let sigil = token.text.chars().next().unwrap_or('*');
            last_sigil = Some((sigil, token.span));
            modifier = Modifier::from_sigil(sigil);
        }

        let is_invocation = self.check(TokenKind::Identifier)
            && self.peek_at(1).kind == TokenKind::LParen
            && self.peek().text != "intersection_for";
        if is_invocation {
            return self.parse_invocation(modifier).map(Some);
        }

        // Report the sigil, then keep the statement itself.
        if let Some((sigil, span)) = last_sigil {
            self.errors
                .push(ParseError::new(ParseErrorKind::MisplacedModifier { sigil }, span));
        }
        self.parse_statement()
    }

    /// Parse `name = expression ;`.
    fn parse_assignment_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.current_position();
        let name = self.expect_name("variable name")?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        let span = self.span_from(start);
        Ok(Statement::new(
            StatementKind::Assignment(Assignment { name, value, span }),
            span,
        ))
    }

    /// Parse `name(args) child` with an optional modifier already consumed.
    pub(super) fn parse_invocation(
        &mut self,
        modifier: Option<Modifier>,
    ) -> Result<Statement, ParseError> {
        let start = self.current_position();
        let name = self.expect_name("module name")?;
        self.expect(TokenKind::LParen)?;
        let args = self.parse_arguments()?;
        let children = self.parse_child()?;

        Ok(Statement::new(
            StatementKind::Invocation(Invocation {
                name,
                args,
                children,
                modifier,
            }),
            self.span_from(start),
        ))
    }

    /// Parse the child part of an invocation or the body of a control
    /// statement.
    ///
    /// `;` yields no children, `{ ... }` yields the block contents and a
    /// single statement yields itself.
    pub(super) fn parse_child(&mut self) -> Result<Vec<Statement>, ParseError> {
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(Vec::new())
            }
            TokenKind::LBrace => self.parse_block(),
            _ => Ok(self.parse_statement()?.into_iter().collect()),
        }
    }

    /// Parse `{ statement* }` with per-statement error recovery.
    pub(super) fn parse_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            self.parse_statement_into(&mut body);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(body)
    }

    /// `include <path>` / `use <path>`: recognized, then rejected.
    fn parse_inclusion(&mut self) -> Result<Option<Statement>, ParseError> {
        self.advance();
        let token = self.peek().clone();
        if token.kind != TokenKind::FilePath {
            return Err(ParseError::unexpected(&token, "'<path>'"));
        }
        self.advance();
        self.match_token(TokenKind::Semicolon);
        self.errors.push(ParseError::new(
            ParseErrorKind::FileInclusion { path: token.text },
            token.span,
        ));
        Ok(None)
    }
}
