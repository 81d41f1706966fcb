//! # Statement Evaluation
//!
//! A block runs in three phases:
//!
//! 1. function and module definitions are hoisted,
//! 2. assignments run in order, each pushing a new frame,
//! 3. the remaining statements are instantiated in order.
//!
//! Each instantiated statement yields at most one geometry, so an
//! explicit boolean operator gets one operand per child statement.

use std::collections::HashSet;

use openscad_ast::{Invocation, Modifier, Span, Statement, StatementKind};

use super::{Evaluator, Isolation};
use crate::error::EvalResult;
use crate::kernel::GeometryKernel;
use crate::output::Highlight;
use crate::scope::{Definitions, Scope};

/// True for statements that run in the instantiation phase.
pub(super) fn is_instantiation(statement: &Statement) -> bool {
    !matches!(
        statement.kind,
        StatementKind::Assignment(_) | StatementKind::FunctionDef(_) | StatementKind::ModuleDef(_)
    )
}

impl<K: GeometryKernel> Evaluator<'_, K> {
    /// Evaluate a block and return one geometry per producing statement.
    pub(super) fn evaluate_block<'a>(
        &mut self,
        statements: &'a [Statement],
        parent: &Scope<'a>,
        isolation: Isolation,
    ) -> EvalResult<Vec<K::Geometry>> {
        let scope = self.prepare_block(statements, parent, isolation)?;
        let mut parts = Vec::new();
        for statement in statements.iter().filter(|s| is_instantiation(s)) {
            let produced = match isolation {
                Isolation::PerStatement => self.evaluate_isolated(statement, &scope)?,
                Isolation::Propagate => self.evaluate_statement(statement, &scope)?,
            };
            parts.extend(produced);
        }
        Ok(parts)
    }

    /// Hoist definitions and run the assignments of a block.
    pub(super) fn prepare_block<'a>(
        &mut self,
        statements: &'a [Statement],
        parent: &Scope<'a>,
        isolation: Isolation,
    ) -> EvalResult<Scope<'a>> {
        let mut scope = parent.clone();
        scope.enter_block(self.next_block_id());
        if let Some(definitions) = Definitions::collect(statements) {
            scope.define(definitions);
        }

        let mut assigned: HashSet<&str> = HashSet::new();
        for statement in statements {
            let StatementKind::Assignment(assignment) = &statement.kind else {
                continue;
            };
            self.interrupt.check()?;
            let value = match self.evaluate_expression(&assignment.value, &scope) {
                Ok(value) => value,
                Err(error) => {
                    let error = error.or_span(statement.span);
                    match isolation {
                        Isolation::PerStatement => {
                            self.isolate(error)?;
                            continue;
                        }
                        Isolation::Propagate => return Err(error),
                    }
                }
            };
            let name = assignment.name.as_str();
            if !assigned.insert(name) {
                self.warn(format!(
                    "'{name}' was reassigned on line {}",
                    statement.span.start.line
                ));
            }
            if !scope.bind(name, value) {
                self.warn(format!(
                    "assignment to '{name}' ignored: overridden by the call's argument"
                ));
            }
        }
        Ok(scope)
    }

    /// Evaluate a statement, recording a runtime error instead of
    /// returning it.
    pub(super) fn evaluate_isolated<'a>(
        &mut self,
        statement: &'a Statement,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        match self.evaluate_statement(statement, scope) {
            Ok(geometry) => Ok(geometry),
            Err(error) => {
                self.isolate(error)?;
                Ok(None)
            }
        }
    }

    /// Evaluate one statement.
    pub(super) fn evaluate_statement<'a>(
        &mut self,
        statement: &'a Statement,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        stacker::maybe_grow(
            config::constants::STACKER_RED_ZONE_BYTES,
            config::constants::STACKER_STACK_SIZE_BYTES,
            || self.evaluate_statement_inner(statement, scope),
        )
        .map_err(|error| error.or_span(statement.span))
    }

    fn evaluate_statement_inner<'a>(
        &mut self,
        statement: &'a Statement,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        self.interrupt.check()?;
        match &statement.kind {
            StatementKind::Invocation(invocation) => {
                self.evaluate_invocation(invocation, statement.span, scope)
            }
            StatementKind::If(stmt) => {
                let condition = self.evaluate_expression(&stmt.condition, scope)?;
                let branch = if condition.is_truthy() {
                    Some(&stmt.then_branch)
                } else {
                    stmt.else_branch.as_ref()
                };
                match branch {
                    Some(body) => self.evaluate_group(body, scope),
                    None => Ok(None),
                }
            }
            StatementKind::For(stmt) => self.evaluate_for(stmt, scope),
            StatementKind::Let(stmt) => {
                let scope = self.bind_sequential(&stmt.bindings, scope)?;
                self.evaluate_group(&stmt.body, &scope)
            }
            StatementKind::Block(body) => self.evaluate_group(body, scope),
            StatementKind::Assignment(_)
            | StatementKind::FunctionDef(_)
            | StatementKind::ModuleDef(_) => Ok(None),
        }
    }

    /// Evaluate a nested block and union its results.
    pub(super) fn evaluate_group<'a>(
        &mut self,
        statements: &'a [Statement],
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        let parts = self.evaluate_block(statements, scope, Isolation::PerStatement)?;
        self.union_all(parts)
    }

    // =========================================================================
    // INVOCATIONS AND MODIFIERS
    // =========================================================================

    /// Evaluate a module invocation, honouring its modifier.
    fn evaluate_invocation<'a>(
        &mut self,
        invocation: &'a Invocation,
        span: Span,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        if let Some(modifier) = invocation.modifier {
            self.note_modifier(modifier);
        }
        if invocation.modifier == Some(Modifier::Disable) {
            return Ok(None);
        }

        let geometry = self.invoke_module(invocation, span, scope)?;

        match invocation.modifier {
            Some(Modifier::Background) => {
                if let Some(geometry) = geometry {
                    self.highlights.push(Highlight {
                        modifier: Modifier::Background,
                        geometry,
                        span,
                    });
                }
                Ok(None)
            }
            Some(Modifier::Debug) => {
                if let Some(geometry) = &geometry {
                    self.highlights.push(Highlight {
                        modifier: Modifier::Debug,
                        geometry: geometry.clone(),
                        span,
                    });
                }
                Ok(geometry)
            }
            Some(Modifier::Root) => {
                if self.root.is_none() {
                    self.root = geometry.clone();
                }
                Ok(geometry)
            }
            _ => Ok(geometry),
        }
    }
}
