//! # Call Arguments
//!
//! Evaluated arguments of a call and their binding to a builtin's
//! parameter list. Positional arguments fill parameters in order; named
//! arguments override. `$`-prefixed named arguments are special variable
//! overrides and never bind to parameters.

use openscad_ast::Argument;

use super::Evaluator;
use crate::error::{EvalError, EvalResult};
use crate::kernel::GeometryKernel;
use crate::scope::{is_special, Scope};
use crate::value::Value;

// =============================================================================
// ARGUMENTS
// =============================================================================

/// Arguments of one call, evaluated in the caller's scope.
#[derive(Debug, Clone, Default)]
pub struct Arguments<'a> {
    pub positional: Vec<Value<'a>>,
    pub named: Vec<(&'a str, Value<'a>)>,
}

impl<'a> Arguments<'a> {
    /// `$name = value` overrides passed with the call.
    pub fn specials(&self) -> impl Iterator<Item = (&'a str, &Value<'a>)> + '_ {
        self.named
            .iter()
            .filter(|(name, _)| is_special(name))
            .map(|(name, value)| (*name, value))
    }

    /// Bind to the parameters of a builtin.
    ///
    /// ## Returns
    ///
    /// [`Bound`] with one slot per parameter, or `WrongArity` when more
    /// positional arguments are given than there are parameters.
    pub fn bind(self, callee: &'a str, params: &'static [&'static str]) -> EvalResult<Bound<'a>> {
        if self.positional.len() > params.len() {
            return Err(EvalError::wrong_arity(
                callee,
                params.len(),
                self.positional.len(),
            ));
        }

        let mut slots: Vec<Value<'a>> = vec![Value::Undef; params.len()];
        for (slot, value) in slots.iter_mut().zip(self.positional) {
            *slot = value;
        }

        let mut unknown = Vec::new();
        for (name, value) in self.named {
            if is_special(name) {
                continue;
            }
            match params.iter().position(|param| *param == name) {
                Some(index) => slots[index] = value,
                None => unknown.push(name),
            }
        }

        Ok(Bound {
            callee,
            params,
            slots,
            unknown,
        })
    }
}

// =============================================================================
// BOUND
// =============================================================================

/// Arguments matched to a builtin's parameters.
///
/// An `undef` argument counts as not given.
#[derive(Debug, Clone)]
pub struct Bound<'a> {
    callee: &'a str,
    params: &'static [&'static str],
    slots: Vec<Value<'a>>,
    unknown: Vec<&'a str>,
}

impl<'a> Bound<'a> {
    pub fn callee(&self) -> &'a str {
        self.callee
    }

    /// Named arguments that match no parameter.
    pub fn unknown(&self) -> &[&'a str] {
        &self.unknown
    }

    /// The argument for `param`, if given.
    pub fn get(&self, param: &str) -> Option<&Value<'a>> {
        let index = self.params.iter().position(|p| *p == param)?;
        self.slots.get(index).filter(|value| !value.is_undef())
    }

    pub fn is_set(&self, param: &str) -> bool {
        self.get(param).is_some()
    }

    /// A numeric argument, `None` when absent.
    pub fn opt_number(&self, param: &str) -> EvalResult<Option<f64>> {
        match self.get(param) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(*n)),
            Some(other) => Err(self.invalid(param, format!("expected a number, got {}", other.type_name()))),
        }
    }

    pub fn number_or(&self, param: &str, default: f64) -> EvalResult<f64> {
        Ok(self.opt_number(param)?.unwrap_or(default))
    }

    /// A boolean option; any truthy value enables it.
    pub fn flag(&self, param: &str) -> bool {
        self.get(param).is_some_and(Value::is_truthy)
    }

    /// Error for an argument of the wrong shape.
    pub fn invalid(&self, param: &str, message: impl Into<String>) -> EvalError {
        EvalError::invalid_argument(self.callee, param, message)
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

impl<K: GeometryKernel> Evaluator<'_, K> {
    /// Evaluate call arguments in the caller's scope.
    pub(super) fn evaluate_arguments<'a>(
        &mut self,
        args: &'a [Argument],
        scope: &Scope<'a>,
    ) -> EvalResult<Arguments<'a>> {
        let mut arguments = Arguments::default();
        for arg in args {
            let value = self
                .evaluate_expression(&arg.value, scope)
                .map_err(|e| e.or_span(arg.span))?;
            match &arg.name {
                Some(name) => arguments.named.push((name.as_str(), value)),
                None => arguments.positional.push(value),
            }
        }
        Ok(arguments)
    }

    /// Warn about named arguments a builtin does not take.
    pub(super) fn warn_unknown(&mut self, bound: &Bound<'_>) {
        for name in bound.unknown() {
            self.warn(format!(
                "{}() has no parameter named '{name}'",
                bound.callee()
            ));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: &[&str] = &["size", "center"];

    #[test]
    fn test_named_overrides_positional() {
        let args = Arguments {
            positional: vec![Value::Number(1.0)],
            named: vec![("size", Value::Number(2.0)), ("center", Value::Bool(true))],
        };
        let bound = args.bind("cube", CUBE).unwrap();
        assert_eq!(bound.number_or("size", 0.0).unwrap(), 2.0);
        assert!(bound.flag("center"));
    }

    #[test]
    fn test_too_many_positional_is_arity_error() {
        let args = Arguments {
            positional: vec![Value::Number(1.0); 3],
            named: vec![],
        };
        let err = args.bind("cube", CUBE).unwrap_err();
        assert!(err.to_string().contains("at most 2"));
    }

    #[test]
    fn test_unknown_and_special_named() {
        let args = Arguments {
            positional: vec![],
            named: vec![("colour", Value::Number(1.0)), ("$fn", Value::Number(8.0))],
        };
        assert_eq!(args.specials().count(), 1);
        let bound = args.bind("cube", CUBE).unwrap();
        assert_eq!(bound.unknown(), &["colour"]);
        assert!(!bound.is_set("size"));
    }

    #[test]
    fn test_undef_counts_as_absent() {
        let args = Arguments {
            positional: vec![Value::Undef],
            named: vec![],
        };
        let bound = args.bind("cube", CUBE).unwrap();
        assert_eq!(bound.opt_number("size").unwrap(), None);
        assert_eq!(bound.number_or("size", 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_wrong_type_is_invalid_argument() {
        let args = Arguments {
            positional: vec![Value::from("big")],
            named: vec![],
        };
        let bound = args.bind("cube", CUBE).unwrap();
        assert!(bound.opt_number("size").is_err());
    }
}
