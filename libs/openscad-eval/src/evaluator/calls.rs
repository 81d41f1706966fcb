//! # Function Calls
//!
//! `name(args)` resolves, in order, to a user function visible from the
//! call site, a builtin function, or a variable holding a function
//! value. Any other callee expression must evaluate to a function value.
//!
//! ## Tail calls
//!
//! A named user function whose body ends, through `?:` and `let`, in a
//! call to itself is run as a loop: the arguments are rebound and the
//! body re-entered without growing the call depth. This keeps idiomatic
//! accumulator recursion like
//!
//! ```text
//! function sum(v, i = 0, acc = 0) = i == len(v) ? acc : sum(v, i + 1, acc + v[i]);
//! ```
//!
//! within the recursion limit for any list length.

use std::rc::Rc;

use openscad_ast::{Argument, Expression, ExpressionKind, FunctionDef, Parameter};

use super::{Arguments, BuiltinFunction, Evaluator};
use crate::error::{EvalError, EvalResult};
use crate::kernel::GeometryKernel;
use crate::scope::{is_special, Env, Scope};
use crate::value::{FunctionValue, Value};

/// Outcome of evaluating a function body in tail position.
enum Tail<'a> {
    Value(Value<'a>),
    /// Self call with these arguments.
    Call(Arguments<'a>),
}

impl<K: GeometryKernel> Evaluator<'_, K> {
    /// Evaluate `callee(args)`.
    pub(super) fn evaluate_call<'a>(
        &mut self,
        callee: &'a Expression,
        args: &'a [Argument],
        scope: &Scope<'a>,
    ) -> EvalResult<Value<'a>> {
        let ExpressionKind::Identifier(name) = &callee.kind else {
            let target = self.evaluate_expression(callee, scope)?;
            let arguments = self.evaluate_arguments(args, scope)?;
            return self.call_value(&target, "function literal", arguments, scope);
        };

        if let Some((def, env)) = scope.lookup_function(name) {
            let arguments = self.evaluate_arguments(args, scope)?;
            return self.call_user_function(def, env, arguments, scope);
        }

        if let Some(builtin) = BuiltinFunction::from_name(name) {
            if builtin == BuiltinFunction::IsUndef {
                return self.evaluate_is_undef(args, scope);
            }
            let arguments = self.evaluate_arguments(args, scope)?;
            return self
                .call_builtin(builtin, name, arguments)
                .map_err(|e| e.or_span(callee.span));
        }

        match scope.lookup(name) {
            Some(target) => {
                let arguments = self.evaluate_arguments(args, scope)?;
                self.call_value(&target, name, arguments, scope)
            }
            None => Err(EvalError::undefined_function(name, Some(callee.span))),
        }
    }

    /// `is_undef(x)` is true for an unbound variable instead of failing.
    fn evaluate_is_undef<'a>(
        &mut self,
        args: &'a [Argument],
        scope: &Scope<'a>,
    ) -> EvalResult<Value<'a>> {
        let [arg] = args else {
            return Err(EvalError::wrong_arity("is_undef", 1, args.len()));
        };
        if let ExpressionKind::Identifier(name) = &arg.value.kind {
            if scope.lookup(name).is_none() && name != "PI" {
                return Ok(Value::Bool(true));
            }
        }
        let value = self.evaluate_expression(&arg.value, scope)?;
        Ok(Value::Bool(value.is_undef()))
    }

    /// Call a function value.
    pub(super) fn call_value<'a>(
        &mut self,
        target: &Value<'a>,
        name: &str,
        arguments: Arguments<'a>,
        caller: &Scope<'a>,
    ) -> EvalResult<Value<'a>> {
        let Value::Function(function) = target else {
            return Err(EvalError::type_mismatch(
                "call",
                format!("'{name}' is a {}, not a function", target.type_name()),
            ));
        };
        let function: Rc<FunctionValue<'a>> = Rc::clone(function);

        self.enter_call()?;
        let result = self
            .bind_parameters("function literal", function.params, arguments, &function.env, caller)
            .and_then(|body_scope| self.evaluate_expression(function.body, &body_scope));
        self.leave_call();
        result
    }

    // =========================================================================
    // USER FUNCTIONS
    // =========================================================================

    fn call_user_function<'a>(
        &mut self,
        def: &'a FunctionDef,
        env: Env<'a>,
        arguments: Arguments<'a>,
        caller: &Scope<'a>,
    ) -> EvalResult<Value<'a>> {
        self.enter_call()?;
        let result = self.run_user_function(def, &env, arguments, caller);
        self.leave_call();
        result
    }

    fn run_user_function<'a>(
        &mut self,
        def: &'a FunctionDef,
        env: &Env<'a>,
        mut arguments: Arguments<'a>,
        caller: &Scope<'a>,
    ) -> EvalResult<Value<'a>> {
        let mut caller = caller.clone();
        loop {
            self.interrupt.check()?;
            let body_scope = self.bind_parameters(&def.name, &def.params, arguments, env, &caller)?;
            match self.evaluate_tail(def, env, &def.body, &body_scope)? {
                Tail::Value(value) => return Ok(value),
                Tail::Call(next) => {
                    arguments = next;
                    caller = body_scope;
                }
            }
        }
    }

    /// Evaluate `expr` in tail position of `def`'s body.
    fn evaluate_tail<'a>(
        &mut self,
        def: &'a FunctionDef,
        env: &Env<'a>,
        expr: &'a Expression,
        scope: &Scope<'a>,
    ) -> EvalResult<Tail<'a>> {
        let result = match &expr.kind {
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
                self.evaluate_tail(def, env, branch, scope)
            }
            ExpressionKind::Let { bindings, body } => {
                let inner = self.bind_sequential(bindings, scope)?;
                self.evaluate_tail(def, env, body, &inner)
            }
            ExpressionKind::Call { callee, args } if is_self_call(def, env, callee, scope) => {
                self.evaluate_arguments(args, scope).map(Tail::Call)
            }
            _ => self.evaluate_expression(expr, scope).map(Tail::Value),
        };
        result.map_err(|e| e.or_span(expr.span))
    }

    // =========================================================================
    // PARAMETER BINDING
    // =========================================================================

    /// Build the body scope of a user function or module.
    ///
    /// Parameters bind positionally, then by name. Defaults are evaluated
    /// in the body scope in declaration order, so a default may refer to
    /// earlier parameters. `$` named arguments become special variables
    /// pinned for the whole body.
    pub(super) fn bind_parameters<'a>(
        &mut self,
        callee: &str,
        params: &'a [Parameter],
        arguments: Arguments<'a>,
        env: &Env<'a>,
        caller: &Scope<'a>,
    ) -> EvalResult<Scope<'a>> {
        if arguments.positional.len() > params.len() {
            return Err(EvalError::wrong_arity(
                callee,
                params.len(),
                arguments.positional.len(),
            ));
        }

        let mut scope = Scope::for_call(env.clone(), caller, self.next_block_id());
        let mut pinned = Vec::new();
        for (name, value) in arguments.specials() {
            scope.bind_special(name, value.clone());
            pinned.push(name);
        }

        let mut given: Vec<Option<Value<'a>>> = vec![None; params.len()];
        for (slot, value) in given.iter_mut().zip(arguments.positional) {
            *slot = Some(value);
        }
        for (name, value) in arguments.named {
            if is_special(name) {
                continue;
            }
            match params.iter().position(|param| param.name == name) {
                Some(index) => given[index] = Some(value),
                None => self.warn(format!("{callee}() has no parameter named '{name}'")),
            }
        }

        for (param, value) in params.iter().zip(given) {
            let value = match (value, &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self
                    .evaluate_expression(default, &scope)
                    .map_err(|e| e.or_span(param.span))?,
                (None, None) => Value::Undef,
            };
            if is_special(&param.name) {
                scope.bind_special(&param.name, value);
            } else {
                scope.bind(&param.name, value);
            }
        }

        scope.set_pinned(pinned);
        Ok(scope)
    }
}

/// True when `callee` names `def` as seen from its own body.
fn is_self_call<'a>(def: &FunctionDef, env: &Env<'a>, callee: &Expression, scope: &Scope<'a>) -> bool {
    let ExpressionKind::Identifier(name) = &callee.kind else {
        return false;
    };
    scope
        .lookup_function(name)
        .is_some_and(|(found, found_env)| std::ptr::eq(found, def) && Rc::ptr_eq(&found_env, env))
}

