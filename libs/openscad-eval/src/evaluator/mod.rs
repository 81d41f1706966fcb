//! # Evaluator
//!
//! Walks the AST and drives a [`GeometryKernel`].
//!
//! ## Error isolation
//!
//! Each statement is an isolation boundary: a runtime error aborts that
//! statement, is recorded with its span, and evaluation moves on to the
//! next sibling. System errors (cancellation, timeout, kernel setup)
//! abort everything. A recursion-limit error unwinds to the top-level
//! statement so deep recursion is reported once.
//!
//! ## Example
//!
//! ```rust,ignore
//! let output = openscad_eval::evaluate(&ast, &kernel, EvalOptions::default());
//! if output.is_success() {
//!     render(output.geometry);
//! }
//! ```

mod arguments;
mod builtin_functions;
mod builtin_modules;
mod calls;
mod colors;
mod comprehension;
mod control_flow;
mod expressions;
mod modules;
mod operators;
mod statements;

pub use arguments::{Arguments, Bound};
pub use builtin_functions::BuiltinFunction;
pub use builtin_modules::BuiltinModule;

use config::constants::{DEFAULT_FA, DEFAULT_FN, DEFAULT_FS, DEFAULT_T};
use config::EngineConfig;
use openscad_ast::{Modifier, Statement};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::interrupt::Interrupt;
use crate::kernel::{GeometryKernel, Resolution};
use crate::output::{EvaluationOutput, Highlight};
use crate::scope::{BlockId, Scope};
use crate::value::Value;

/// Seed of the generator behind unseeded `rands()`.
const DEFAULT_RANDOM_SEED: u64 = 0x5eed;

// =============================================================================
// OPTIONS
// =============================================================================

/// Per-evaluation settings.
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// Limits and loop error policy.
    pub config: EngineConfig,
    /// Cancellation flag and deadline.
    pub interrupt: Interrupt,
    /// Value of `$t`, clamped to `[0, 1]`.
    pub animation_time: Option<f64>,
}

// =============================================================================
// EVALUATOR
// =============================================================================

/// Evaluation state for one run.
pub struct Evaluator<'k, K: GeometryKernel> {
    kernel: &'k K,
    config: EngineConfig,
    interrupt: Interrupt,
    animation_time: f64,
    /// Current nesting of user function and module calls.
    depth: usize,
    next_block: BlockId,
    rng: StdRng,
    root: Option<K::Geometry>,
    modifier: Option<Modifier>,
    highlights: Vec<Highlight<K::Geometry>>,
    errors: Vec<EvalError>,
    warnings: Vec<String>,
    echoes: Vec<String>,
}

impl<'k, K: GeometryKernel> Evaluator<'k, K> {
    /// Create an evaluator bound to a kernel.
    pub fn new(kernel: &'k K, options: EvalOptions) -> Self {
        Self {
            kernel,
            config: options.config,
            interrupt: options.interrupt,
            animation_time: options.animation_time.unwrap_or(DEFAULT_T).clamp(0.0, 1.0),
            depth: 0,
            next_block: 1,
            rng: StdRng::seed_from_u64(DEFAULT_RANDOM_SEED),
            root: None,
            modifier: None,
            highlights: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            echoes: Vec::new(),
        }
    }

    /// Evaluate top-level statements and collect the result.
    pub fn run(mut self, statements: &[Statement]) -> EvaluationOutput<K::Geometry> {
        if let Err(error) = self.kernel.ensure_initialized() {
            tracing::warn!(%error, "geometry kernel failed to initialize");
            self.errors.push(EvalError::kernel(error));
            return self.finish(None);
        }

        let scope = self.global_scope();
        let parts = match self.evaluate_block(statements, &scope, Isolation::PerStatement) {
            Ok(parts) => parts,
            Err(error) => {
                self.errors.push(error);
                Vec::new()
            }
        };

        let geometry = match self.root.take() {
            Some(root) => Some(root),
            None if self.errors.is_empty() => match self.union_all(parts) {
                Ok(geometry) => geometry,
                Err(error) => {
                    self.errors.push(error);
                    None
                }
            },
            None => None,
        };
        self.finish(geometry)
    }

    fn finish(self, geometry: Option<K::Geometry>) -> EvaluationOutput<K::Geometry> {
        let success = self.errors.is_empty();
        tracing::debug!(
            success,
            errors = self.errors.len(),
            warnings = self.warnings.len(),
            echoes = self.echoes.len(),
            "evaluation finished"
        );
        EvaluationOutput {
            geometry: if success { geometry } else { None },
            highlights: self.highlights,
            modifier: self.modifier,
            errors: self.errors,
            warnings: self.warnings,
            echoes: self.echoes,
        }
    }

    /// Scope holding the special variable defaults.
    fn global_scope<'a>(&self) -> Scope<'a> {
        let mut scope = Scope::global();
        scope.bind_special("$fn", Value::Number(DEFAULT_FN));
        scope.bind_special("$fa", Value::Number(DEFAULT_FA));
        scope.bind_special("$fs", Value::Number(DEFAULT_FS));
        scope.bind_special("$t", Value::Number(self.animation_time));
        scope.bind_special("$preview", Value::Bool(true));
        scope.bind_special("$children", Value::Number(0.0));
        scope
    }

    // =========================================================================
    // BOOKKEEPING
    // =========================================================================

    fn next_block_id(&mut self) -> BlockId {
        let id = self.next_block;
        self.next_block += 1;
        id
    }

    /// Record a runtime error.
    fn record(&mut self, error: EvalError) {
        tracing::debug!(%error, line = error.line(), "runtime error");
        self.errors.push(error);
    }

    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "evaluation warning");
        self.warnings.push(message);
    }

    fn echo(&mut self, line: String) {
        tracing::info!(target: "openscad::echo", "ECHO: {line}");
        self.echoes.push(line);
    }

    /// Errors that must unwind past the current statement.
    fn must_propagate(&self, error: &EvalError) -> bool {
        error.is_system()
            || (matches!(error.kind, EvalErrorKind::RecursionLimit(_)) && self.depth > 0)
    }

    /// Record `error` unless it must unwind further.
    fn isolate(&mut self, error: EvalError) -> EvalResult<()> {
        if self.must_propagate(&error) {
            Err(error)
        } else {
            self.record(error);
            Ok(())
        }
    }

    /// Enter a user function or module call.
    fn enter_call(&mut self) -> EvalResult<()> {
        self.interrupt.check()?;
        if self.depth >= self.config.max_recursion_depth {
            return Err(EvalError::new(
                EvalErrorKind::RecursionLimit(self.config.max_recursion_depth),
                None,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_call(&mut self) {
        self.depth -= 1;
    }

    fn note_modifier(&mut self, modifier: Modifier) {
        if self.modifier.map_or(true, |seen| modifier > seen) {
            self.modifier = Some(modifier);
        }
    }

    /// `$fn`, `$fa`, `$fs` in effect.
    fn resolution(&self, scope: &Scope<'_>) -> Resolution {
        let special = |name: &str, default: f64| {
            scope
                .lookup_special(name)
                .and_then(|value| value.as_number())
                .unwrap_or(default)
        };
        Resolution {
            fn_: special("$fn", DEFAULT_FN),
            fa: special("$fa", DEFAULT_FA),
            fs: special("$fs", DEFAULT_FS),
        }
    }

    /// Implicit union of sibling results.
    fn union_all(&mut self, mut parts: Vec<K::Geometry>) -> EvalResult<Option<K::Geometry>> {
        match parts.len() {
            0 => Ok(None),
            1 => Ok(parts.pop()),
            _ => self.kernel.union(parts).map(Some).map_err(EvalError::kernel),
        }
    }
}

/// How a block treats errors raised by its direct statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Isolation {
    /// Record the error and continue with the next statement.
    PerStatement,
    /// Fail the whole block; used for loop bodies.
    Propagate,
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Evaluate `statements` against `kernel`.
///
/// ## Parameters
///
/// - `statements`: parsed or built top-level statements
/// - `kernel`: geometry backend
/// - `options`: limits, interrupt and `$t`
///
/// ## Returns
///
/// The geometry (unless an error was recorded) with diagnostics.
pub fn evaluate<K: GeometryKernel>(
    statements: &[Statement],
    kernel: &K,
    options: EvalOptions,
) -> EvaluationOutput<K::Geometry> {
    Evaluator::new(kernel, options).run(statements)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;
