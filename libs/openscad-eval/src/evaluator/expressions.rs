//! # Expression Evaluation

use std::rc::Rc;

use openscad_ast::{Argument, BinaryOp, Expression, ExpressionKind, Literal, UnaryOp};

use super::operators::{binary, unary};
use super::Evaluator;
use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::kernel::GeometryKernel;
use crate::scope::Scope;
use crate::value::{FunctionValue, RangeValue, Value};

impl<K: GeometryKernel> Evaluator<'_, K> {
    /// Evaluate an expression to a value.
    pub(super) fn evaluate_expression<'a>(
        &mut self,
        expr: &'a Expression,
        scope: &Scope<'a>,
    ) -> EvalResult<Value<'a>> {
        stacker::maybe_grow(
            config::constants::STACKER_RED_ZONE_BYTES,
            config::constants::STACKER_STACK_SIZE_BYTES,
            || self.evaluate_expression_inner(expr, scope),
        )
        .map_err(|error| error.or_span(expr.span))
    }

    fn evaluate_expression_inner<'a>(
        &mut self,
        expr: &'a Expression,
        scope: &Scope<'a>,
    ) -> EvalResult<Value<'a>> {
        match &expr.kind {
            ExpressionKind::Literal(literal) => Ok(match literal {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::string(s),
                Literal::Boolean(b) => Value::Bool(*b),
                Literal::Undef => Value::Undef,
            }),

            ExpressionKind::Identifier(name) => self.lookup_variable(name, scope),

            ExpressionKind::Unary { op, operand } => {
                let value = self.evaluate_expression(operand, scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    _ => unary(*op, &value),
                }
            }

            ExpressionKind::Binary { op, left, right } => {
                let left = self.evaluate_expression(left, scope)?;
                match op {
                    BinaryOp::And if !left.is_truthy() => Ok(Value::Bool(false)),
                    BinaryOp::Or if left.is_truthy() => Ok(Value::Bool(true)),
                    BinaryOp::And | BinaryOp::Or => {
                        let right = self.evaluate_expression(right, scope)?;
                        Ok(Value::Bool(right.is_truthy()))
                    }
                    _ => {
                        let right = self.evaluate_expression(right, scope)?;
                        binary(*op, &left, &right)
                    }
                }
            }

            ExpressionKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                let branch = if self.evaluate_expression(condition, scope)?.is_truthy() {
                    then_expr
                } else {
                    else_expr
                };
                self.evaluate_expression(branch, scope)
            }

            ExpressionKind::Vector(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate_expression(item, scope)?);
                }
                Value::checked_vector(values, self.config.max_vector_depth)
            }

            ExpressionKind::Range { start, step, end } => {
                let start = self.range_bound(start, scope, "start")?;
                let step = match step {
                    Some(step) => self.range_bound(step, scope, "step")?,
                    None => 1.0,
                };
                let end = self.range_bound(end, scope, "end")?;
                Ok(Value::Range(RangeValue::checked(start, step, end)?))
            }

            ExpressionKind::Comprehension(elements) => {
                let mut values = Vec::new();
                for element in elements {
                    self.evaluate_element(element, scope, &mut values)?;
                }
                Value::checked_vector(values, self.config.max_vector_depth)
            }

            ExpressionKind::Index { target, index } => {
                let target = self.evaluate_expression(target, scope)?;
                let index = self.evaluate_expression(index, scope)?;
                self.index_value(&target, &index)
            }

            ExpressionKind::Member { target, field } => {
                let target = self.evaluate_expression(target, scope)?;
                let position = match field.as_str() {
                    "x" => 0.0,
                    "y" => 1.0,
                    "z" => 2.0,
                    other => {
                        return Err(EvalError::type_mismatch(
                            "member access",
                            format!("unknown member '.{other}'"),
                        ))
                    }
                };
                self.index_value(&target, &Value::Number(position))
            }

            ExpressionKind::Call { callee, args } => self.evaluate_call(callee, args, scope),

            ExpressionKind::Let { bindings, body } => {
                let scope = self.bind_sequential(bindings, scope)?;
                self.evaluate_expression(body, &scope)
            }

            ExpressionKind::FunctionLiteral { params, body } => {
                Ok(Value::Function(Rc::new(FunctionValue {
                    params,
                    body,
                    env: scope.env().clone(),
                })))
            }

            ExpressionKind::Echo { args, body } => {
                let line = self.format_echo(args, scope)?;
                self.echo(line);
                match body {
                    Some(body) => self.evaluate_expression(body, scope),
                    None => Ok(Value::Undef),
                }
            }

            ExpressionKind::Assert { args, body } => {
                self.check_assertion(args, scope)?;
                match body {
                    Some(body) => self.evaluate_expression(body, scope),
                    None => Ok(Value::Undef),
                }
            }
        }
    }

    /// Resolve a variable, falling back to builtin constants.
    pub(super) fn lookup_variable<'a>(&mut self, name: &str, scope: &Scope<'a>) -> EvalResult<Value<'a>> {
        if let Some(value) = scope.lookup(name) {
            return Ok(value);
        }
        match name {
            "PI" => Ok(Value::Number(std::f64::consts::PI)),
            _ => Err(EvalError::undefined_variable(name, None)),
        }
    }

    fn range_bound<'a>(
        &mut self,
        expr: &'a Expression,
        scope: &Scope<'a>,
        part: &str,
    ) -> EvalResult<f64> {
        let value = self.evaluate_expression(expr, scope)?;
        value.as_number().ok_or_else(|| {
            EvalError::new(
                EvalErrorKind::InvalidRange(format!(
                    "{part} must be a number, got {}",
                    value.type_name()
                )),
                Some(expr.span),
            )
        })
    }

    /// `target[index]`; out of range gives `undef` with a warning.
    fn index_value<'a>(&mut self, target: &Value<'a>, index: &Value<'a>) -> EvalResult<Value<'a>> {
        let position = match index {
            Value::Number(n) => *n,
            other => {
                return Err(EvalError::type_mismatch(
                    "index",
                    format!("index must be a number, got {}", other.type_name()),
                ))
            }
        };
        let slot = (position >= 0.0 && position.is_finite()).then(|| position.floor() as usize);

        let found = match target {
            Value::Vector(items) => slot.and_then(|i| items.get(i).cloned()),
            Value::String(text) => slot
                .and_then(|i| text.chars().nth(i))
                .map(|ch| Value::string(ch.to_string())),
            Value::Range(range) => slot.and_then(|i| range.iter().nth(i)).map(Value::Number),
            other => {
                return Err(EvalError::type_mismatch(
                    "index",
                    format!("cannot index a {}", other.type_name()),
                ))
            }
        };
        Ok(found.unwrap_or_else(|| {
            self.warn(format!("index {position} out of bounds"));
            Value::Undef
        }))
    }

    // =========================================================================
    // ECHO AND ASSERT
    // =========================================================================

    /// `echo` arguments as printed: positional values, `name = value`
    /// for named ones.
    pub(super) fn format_echo<'a>(
        &mut self,
        args: &'a [Argument],
        scope: &Scope<'a>,
    ) -> EvalResult<String> {
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.evaluate_expression(&arg.value, scope)?;
            parts.push(match &arg.name {
                Some(name) => format!("{name} = {value}"),
                None => value.to_string(),
            });
        }
        Ok(parts.join(", "))
    }

    /// `assert(condition, message)`.
    pub(super) fn check_assertion<'a>(
        &mut self,
        args: &'a [Argument],
        scope: &Scope<'a>,
    ) -> EvalResult<()> {
        let Some(condition) = args.first() else {
            return Err(EvalError::invalid_argument("assert", "condition", "missing"));
        };
        if self.evaluate_expression(&condition.value, scope)?.is_truthy() {
            return Ok(());
        }
        let message = match args.get(1) {
            Some(message) => self.evaluate_expression(&message.value, scope)?.to_plain_string(),
            None => condition.value.to_string(),
        };
        Err(EvalError::new(EvalErrorKind::AssertionFailed(message), None))
    }
}
