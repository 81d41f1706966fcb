//! # Evaluation Errors
//!
//! Every error carries a category so the job layer can tell a bad model
//! (runtime) from an aborted evaluation (system).
//!
//! ## Example
//!
//! ```rust
//! use openscad_eval::error::{ErrorCategory, EvalError};
//!
//! let err = EvalError::undefined_variable("x", None);
//! assert_eq!(err.category, ErrorCategory::Runtime);
//! assert!(err.to_string().contains("x"));
//! ```

use openscad_ast::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of an evaluation step.
pub type EvalResult<T> = Result<T, EvalError>;

// =============================================================================
// CATEGORY
// =============================================================================

/// Error taxonomy shared by parser, evaluator and job runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    /// Detected by the tokenizer or parser.
    Syntax,
    /// Detected while evaluating a statement; carries a span when known.
    Runtime,
    /// Aborts the whole evaluation and has no source position.
    System,
}

// =============================================================================
// ERROR
// =============================================================================

/// An evaluation error with its category and source span.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct EvalError {
    /// Category derived from `kind`.
    pub category: ErrorCategory,
    /// What went wrong.
    pub kind: EvalErrorKind,
    /// Where it went wrong, if attributable to source.
    pub span: Option<Span>,
}

/// Specific evaluation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalErrorKind {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    #[error("undefined module '{0}'")]
    UndefinedModule(String),

    #[error("'{name}' takes at most {expected} arguments, got {found}")]
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("type mismatch in {context}: {detail}")]
    TypeMismatch { context: String, detail: String },

    #[error("invalid argument '{argument}' to {name}: {message}")]
    InvalidArgument {
        name: String,
        argument: String,
        message: String,
    },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("range of {count} elements exceeds the limit of {limit}")]
    RangeTooLarge { count: u64, limit: usize },

    #[error("vector nesting of {depth} exceeds the limit of {limit}")]
    VectorTooDeep { depth: usize, limit: usize },

    #[error("recursion depth exceeded {0} calls")]
    RecursionLimit(usize),

    #[error("{0}() needs at least one child")]
    EmptyOperands(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("geometry kernel: {0}")]
    Kernel(String),

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("evaluation timed out")]
    TimedOut,

    #[error("geometry kernel initialization failed: {0}")]
    KernelInitialization(String),
}

impl EvalErrorKind {
    /// Category of this kind.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Cancelled | Self::TimedOut | Self::KernelInitialization(_) => {
                ErrorCategory::System
            }
            _ => ErrorCategory::Runtime,
        }
    }
}

impl EvalError {
    /// Create an error; the category follows from the kind.
    pub fn new(kind: EvalErrorKind, span: Option<Span>) -> Self {
        Self {
            category: kind.category(),
            kind,
            span,
        }
    }

    /// Attach a span if none is set yet.
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_synthetic() {
            self.span = Some(span);
        }
        self
    }

    /// True for errors that abort the whole evaluation.
    pub fn is_system(&self) -> bool {
        self.category == ErrorCategory::System
    }

    /// 1-based line, when the error has a real source position.
    pub fn line(&self) -> Option<usize> {
        self.span.filter(|s| !s.is_synthetic()).map(|s| s.start.line)
    }

    /// 1-based column, when the error has a real source position.
    pub fn column(&self) -> Option<usize> {
        self.span.filter(|s| !s.is_synthetic()).map(|s| s.start.column)
    }

    pub fn undefined_variable(name: &str, span: Option<Span>) -> Self {
        Self::new(EvalErrorKind::UndefinedVariable(name.to_string()), span)
    }

    pub fn undefined_function(name: &str, span: Option<Span>) -> Self {
        Self::new(EvalErrorKind::UndefinedFunction(name.to_string()), span)
    }

    pub fn undefined_module(name: &str, span: Option<Span>) -> Self {
        Self::new(EvalErrorKind::UndefinedModule(name.to_string()), span)
    }

    pub fn type_mismatch(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(
            EvalErrorKind::TypeMismatch {
                context: context.into(),
                detail: detail.into(),
            },
            None,
        )
    }

    pub fn invalid_argument(
        name: impl Into<String>,
        argument: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            EvalErrorKind::InvalidArgument {
                name: name.into(),
                argument: argument.into(),
                message: message.into(),
            },
            None,
        )
    }

    pub fn wrong_arity(name: &str, expected: usize, found: usize) -> Self {
        Self::new(
            EvalErrorKind::WrongArity {
                name: name.to_string(),
                expected,
                found,
            },
            None,
        )
    }

    pub fn kernel(error: KernelError) -> Self {
        match error {
            KernelError::Initialization(message) => {
                Self::new(EvalErrorKind::KernelInitialization(message), None)
            }
            other => Self::new(EvalErrorKind::Kernel(other.to_string()), None),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(EvalErrorKind::Cancelled, None)
    }

    pub fn timed_out() -> Self {
        Self::new(EvalErrorKind::TimedOut, None)
    }
}

// =============================================================================
// KERNEL ERROR
// =============================================================================

/// Errors returned by a [`GeometryKernel`](crate::kernel::GeometryKernel).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// One-time engine setup failed.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// The kernel does not implement this operation.
    #[error("{0} is not supported by this kernel")]
    Unsupported(String),

    /// Parameters the kernel cannot build geometry from.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// 2-D and 3-D operands mixed in one operation.
    #[error("cannot mix 2D and 3D geometry in {0}")]
    DimensionMismatch(String),
}

// =============================================================================
// TESTS
// =============================================================================
