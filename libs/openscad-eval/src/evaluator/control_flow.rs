//! # Loops and Bindings
//!
//! `for (i = [0:2], j = [0:1])` nests: the first binding is the outer
//! loop. Ranges are walked lazily, so a loop over `[0 : 1e9]` costs one
//! interrupt check per iteration and no allocation.

use config::LoopErrorPolicy;
use openscad_ast::{Assignment, ForStatement};

use super::{Evaluator, Isolation};
use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::kernel::GeometryKernel;
use crate::scope::Scope;
use crate::value::Value;

/// Whether iteration continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    Continue,
    Break,
}

/// Callback run once per combination of loop variables.
pub(super) type Visit<'v, 'a, E> = dyn FnMut(&mut E, &Scope<'a>) -> EvalResult<Flow> + 'v;

impl<K: GeometryKernel> Evaluator<'_, K> {
    /// `let`-style bindings: each sees the ones before it.
    pub(super) fn bind_sequential<'a>(
        &mut self,
        bindings: &'a [Assignment],
        scope: &Scope<'a>,
    ) -> EvalResult<Scope<'a>> {
        let mut scope = scope.clone();
        scope.enter_block(self.next_block_id());
        for binding in bindings {
            let value = self
                .evaluate_expression(&binding.value, &scope)
                .map_err(|e| e.or_span(binding.span))?;
            if !scope.bind(binding.name.as_str(), value) {
                self.warn(format!(
                    "binding of '{}' ignored: overridden by the call's argument",
                    binding.name
                ));
            }
        }
        Ok(scope)
    }

    /// Call `visit` with each element of an iterable value.
    pub(super) fn iterate<'a>(
        &mut self,
        iterable: Value<'a>,
        mut visit: impl FnMut(&mut Self, Value<'a>) -> EvalResult<Flow>,
    ) -> EvalResult<()> {
        match iterable {
            Value::Range(range) => {
                for n in range.iter() {
                    self.interrupt.check()?;
                    if visit(self, Value::Number(n))? == Flow::Break {
                        break;
                    }
                }
            }
            Value::Vector(items) => {
                for item in items.iter() {
                    self.interrupt.check()?;
                    if visit(self, item.clone())? == Flow::Break {
                        break;
                    }
                }
            }
            Value::String(text) => {
                let mut buffer = [0u8; 4];
                for ch in text.chars() {
                    self.interrupt.check()?;
                    if visit(self, Value::string(ch.encode_utf8(&mut buffer)))? == Flow::Break {
                        break;
                    }
                }
            }
            Value::Undef => {}
            Value::Function(_) => {
                return Err(EvalError::type_mismatch("for", "cannot iterate over a function"));
            }
            single @ (Value::Number(_) | Value::Bool(_)) => {
                self.interrupt.check()?;
                visit(self, single)?;
            }
        }
        Ok(())
    }

    /// Visit every combination of the loop variables, outermost first.
    pub(super) fn iterate_bindings<'a>(
        &mut self,
        bindings: &'a [Assignment],
        scope: &Scope<'a>,
        visit: &mut Visit<'_, 'a, Self>,
    ) -> EvalResult<Flow> {
        let Some((first, rest)) = bindings.split_first() else {
            return visit(self, scope);
        };
        let iterable = self
            .evaluate_expression(&first.value, scope)
            .map_err(|e| e.or_span(first.span))?;

        let mut flow = Flow::Continue;
        self.iterate(iterable, |this, value| {
            let mut inner = scope.clone();
            inner.bind(first.name.as_str(), value);
            flow = this.iterate_bindings(rest, &inner, &mut *visit)?;
            Ok(flow)
        })?;
        Ok(flow)
    }

    // =========================================================================
    // FOR STATEMENTS
    // =========================================================================

    /// `for` unions every iteration; `intersection_for` intersects them.
    pub(super) fn evaluate_for<'a>(
        &mut self,
        stmt: &'a ForStatement,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        let policy = self.config.loop_error_policy;
        let mut flat: Vec<K::Geometry> = Vec::new();
        let mut iterations: Vec<Vec<K::Geometry>> = Vec::new();

        self.iterate_bindings(&stmt.bindings, scope, &mut |this, iteration_scope| {
            match this.evaluate_block(&stmt.body, iteration_scope, Isolation::Propagate) {
                Ok(parts) if parts.is_empty() => Ok(Flow::Continue),
                Ok(parts) if stmt.intersection => {
                    iterations.push(parts);
                    Ok(Flow::Continue)
                }
                Ok(parts) => {
                    flat.extend(parts);
                    Ok(Flow::Continue)
                }
                Err(error)
                    if this.must_propagate(&error)
                        || matches!(error.kind, EvalErrorKind::RecursionLimit(_)) =>
                {
                    Err(error)
                }
                Err(error) => {
                    this.record(error);
                    Ok(match policy {
                        LoopErrorPolicy::SkipIteration => Flow::Continue,
                        LoopErrorPolicy::AbortLoop => Flow::Break,
                    })
                }
            }
        })?;

        if !stmt.intersection {
            return self.union_all(flat);
        }

        let mut operands = Vec::with_capacity(iterations.len());
        for parts in iterations {
            operands.extend(self.union_all(parts)?);
        }
        match operands.len() {
            0 => Ok(None),
            1 => Ok(operands.pop()),
            _ => self
                .kernel
                .intersection(operands)
                .map(Some)
                .map_err(EvalError::kernel),
        }
    }
}
