//! # List Comprehensions
//!
//! `[for (i = [0:3]) if (i % 2 == 0) i * i]` evaluates its element tree
//! into one flat output list. Every `for` binding opens a fresh scope, so
//! generated expressions never see each other's variables.

use openscad_ast::{Assignment, Element, Expression};

use super::control_flow::Flow;
use super::Evaluator;
use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::kernel::GeometryKernel;
use crate::scope::Scope;
use crate::value::Value;

impl<K: GeometryKernel> Evaluator<'_, K> {
    /// Append the values produced by `element` to `out`.
    pub(super) fn evaluate_element<'a>(
        &mut self,
        element: &'a Element,
        scope: &Scope<'a>,
        out: &mut Vec<Value<'a>>,
    ) -> EvalResult<()> {
        self.interrupt.check()?;
        match element {
            Element::Expr(expr) => {
                let value = self.evaluate_expression(expr, scope)?;
                self.push_element(out, value)
            }
            Element::For { bindings, body } => {
                self.iterate_bindings(bindings, scope, &mut |this, inner| {
                    this.evaluate_element(body, inner, out)?;
                    Ok(Flow::Continue)
                })?;
                Ok(())
            }
            Element::ForC {
                init,
                condition,
                update,
                body,
            } => self.evaluate_c_style(init, condition, update, body, scope, out),
            Element::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate_expression(condition, scope)?.is_truthy() {
                    self.evaluate_element(then_branch, scope, out)
                } else if let Some(otherwise) = else_branch {
                    self.evaluate_element(otherwise, scope, out)
                } else {
                    Ok(())
                }
            }
            Element::Let { bindings, body } => {
                let inner = self.bind_sequential(bindings, scope)?;
                self.evaluate_element(body, &inner, out)
            }
            Element::Each(body) => {
                let mut produced = Vec::new();
                self.evaluate_element(body, scope, &mut produced)?;
                for value in produced {
                    self.splice(out, value)?;
                }
                Ok(())
            }
        }
    }

    /// `for (init; condition; update) body`. The update expressions are
    /// all evaluated against the previous iteration's values.
    fn evaluate_c_style<'a>(
        &mut self,
        init: &'a [Assignment],
        condition: &'a Expression,
        update: &'a [Assignment],
        body: &'a Element,
        scope: &Scope<'a>,
        out: &mut Vec<Value<'a>>,
    ) -> EvalResult<()> {
        let mut current = self.bind_sequential(init, scope)?;
        let mut base = scope.clone();
        base.enter_block(self.next_block_id());
        let mut vars: Vec<(&'a str, Value<'a>)> = Vec::with_capacity(init.len());
        for assignment in init {
            let name = assignment.name.as_str();
            let value = current.lookup(name).unwrap_or_default();
            set_loop_var(&mut vars, name, value);
        }
        loop {
            self.interrupt.check()?;
            if !self.evaluate_expression(condition, &current)?.is_truthy() {
                return Ok(());
            }
            self.evaluate_element(body, &current, out)?;

            let mut next = Vec::with_capacity(update.len());
            for assignment in update {
                let value = self
                    .evaluate_expression(&assignment.value, &current)
                    .map_err(|e| e.or_span(assignment.span))?;
                next.push((assignment.name.as_str(), value));
            }
            for (name, value) in next {
                set_loop_var(&mut vars, name, value);
            }

            // Rebuilt from the base each iteration: the frame chain never
            // grows past the loop's own variables.
            current = base.clone();
            for (name, value) in &vars {
                current.bind(*name, value.clone());
            }
        }
    }

    /// `each` over a vector, range or string.
    fn splice<'a>(&mut self, out: &mut Vec<Value<'a>>, value: Value<'a>) -> EvalResult<()> {
        match value {
            Value::Vector(items) => {
                for item in items.iter() {
                    self.push_element(out, item.clone())?;
                }
                Ok(())
            }
            Value::Range(range) => {
                for n in range.iter() {
                    self.interrupt.check()?;
                    self.push_element(out, Value::Number(n))?;
                }
                Ok(())
            }
            Value::String(text) => {
                for ch in text.chars() {
                    self.push_element(out, Value::string(ch.to_string()))?;
                }
                Ok(())
            }
            other => self.push_element(out, other),
        }
    }

    fn push_element<'a>(&mut self, out: &mut Vec<Value<'a>>, value: Value<'a>) -> EvalResult<()> {
        let limit = self.config.max_list_elements;
        if out.len() >= limit {
            return Err(EvalError::new(
                EvalErrorKind::RangeTooLarge {
                    count: out.len() as u64 + 1,
                    limit,
                },
                None,
            ));
        }
        out.push(value);
        Ok(())
    }
}

fn set_loop_var<'a>(vars: &mut Vec<(&'a str, Value<'a>)>, name: &'a str, value: Value<'a>) {
    match vars.iter_mut().find(|(bound, _)| *bound == name) {
        Some(slot) => slot.1 = value,
        None => vars.push((name, value)),
    }
}
