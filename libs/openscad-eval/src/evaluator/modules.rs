//! # Module Invocation
//!
//! Builtin and user modules share one name lookup: a user module
//! visible from the call site shadows a builtin of the same name.
//!
//! ## `children()`
//!
//! A user module body sees the invocation's child statements through a
//! [`ChildrenContext`]. The children run in the scope of the invocation
//! site, with the special variables in effect where `children()` is
//! called:
//!
//! ```text
//! module ring() { for (a = [0 : 90 : 270]) rotate(a) children(); }
//! ring() translate([5, 0, 0]) cube(1);
//! ```

use openscad_ast::{Invocation, ModuleDef, Span, Statement};

use super::statements::is_instantiation;
use super::{BuiltinModule, Evaluator, Isolation};
use crate::error::{EvalError, EvalResult};
use crate::kernel::GeometryKernel;
use crate::scope::{ChildrenContext, Env, Scope};
use crate::value::Value;

/// What a module name resolves to.
enum ModuleEntry<'a> {
    User(&'a ModuleDef, Env<'a>),
    Builtin(BuiltinModule),
}

impl<K: GeometryKernel> Evaluator<'_, K> {
    /// Evaluate a module invocation statement.
    pub(super) fn invoke_module<'a>(
        &mut self,
        invocation: &'a Invocation,
        span: Span,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        self.interrupt.check()?;
        let entry = match scope.lookup_module(&invocation.name) {
            Some((def, env)) => ModuleEntry::User(def, env),
            None => match BuiltinModule::from_name(&invocation.name) {
                Some(builtin) => ModuleEntry::Builtin(builtin),
                None => return Err(EvalError::undefined_module(&invocation.name, Some(span))),
            },
        };

        match entry {
            ModuleEntry::User(def, env) => self.call_user_module(def, env, invocation, scope),
            ModuleEntry::Builtin(builtin) => self.call_builtin_module(builtin, invocation, scope),
        }
    }

    // =========================================================================
    // USER MODULES
    // =========================================================================

    fn call_user_module<'a>(
        &mut self,
        def: &'a ModuleDef,
        env: Env<'a>,
        invocation: &'a Invocation,
        caller: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        let arguments = self.evaluate_arguments(&invocation.args, caller)?;
        self.enter_call()?;
        tracing::trace!(module = %def.name, depth = self.depth, "entering user module");

        let result = self
            .bind_parameters(&def.name, &def.params, arguments, &env, caller)
            .and_then(|mut body_scope| {
                let count = invocation
                    .children
                    .iter()
                    .filter(|s| is_instantiation(s))
                    .count();
                body_scope.bind_special("$children", Value::Number(count as f64));
                body_scope.set_children(ChildrenContext {
                    statements: &invocation.children,
                    caller: caller.clone(),
                });
                self.evaluate_block(&def.body, &body_scope, Isolation::PerStatement)
            });

        self.leave_call();
        self.union_all(result?)
    }

    // =========================================================================
    // CHILDREN
    // =========================================================================

    /// `children()`, `children(i)`, `children([i, j])` or
    /// `children([a : b])`.
    pub(super) fn evaluate_children<'a>(
        &mut self,
        selection: Option<&Value<'a>>,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        let Some(context) = scope.children().cloned() else {
            self.warn("children() called outside a module");
            return Ok(None);
        };
        let statements: &'a [Statement] = context.statements;
        let instantiations: Vec<&'a Statement> =
            statements.iter().filter(|s| is_instantiation(s)).collect();

        let indices = match selection {
            None => (0..instantiations.len()).collect(),
            Some(value) => self.child_indices(value, instantiations.len())?,
        };
        if indices.is_empty() {
            return Ok(None);
        }

        let base = Scope::for_children(&context.caller, scope);
        let child_scope = self.prepare_block(statements, &base, Isolation::PerStatement)?;
        let mut parts = Vec::with_capacity(indices.len());
        for index in indices {
            parts.extend(self.evaluate_isolated(instantiations[index], &child_scope)?);
        }
        self.union_all(parts)
    }

    /// Valid child indices named by a selection; out-of-range ones are
    /// dropped with a warning.
    fn child_indices(&mut self, selection: &Value<'_>, count: usize) -> EvalResult<Vec<usize>> {
        let requested: Vec<f64> = match selection {
            Value::Number(n) => vec![*n],
            Value::Vector(items) => items
                .iter()
                .map(Value::as_number)
                .collect::<Option<_>>()
                .ok_or_else(|| {
                    EvalError::invalid_argument("children", "index", "indices must be numbers")
                })?,
            Value::Range(range) => range.to_values(self.config.max_range_elements)?
                .iter()
                .filter_map(Value::as_number)
                .collect(),
            other => {
                return Err(EvalError::invalid_argument(
                    "children",
                    "index",
                    format!("expected a number, vector or range, got {}", other.type_name()),
                ))
            }
        };

        let mut indices = Vec::with_capacity(requested.len());
        for n in requested {
            if n >= 0.0 && n.fract() == 0.0 && (n as usize) < count {
                indices.push(n as usize);
            } else {
                self.warn(format!(
                    "children() index {n} out of range, module has {count} children"
                ));
            }
        }
        Ok(indices)
    }
}
