//! # Job Errors
//!
//! Failures are classified the same way as evaluation errors: syntax,
//! runtime or system. System failures carry a [`SystemErrorKind`] so a
//! caller can tell a timeout from a crashed worker.

use openscad_eval::{ErrorCategory, EvalError, EvalErrorKind};
use openscad_parser::ParseError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a job.
pub type JobResult<T> = Result<T, JobError>;

/// One user-visible error, positioned when the source location is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub category: ErrorCategory,
}

impl ErrorInfo {
    /// Error without a source position.
    pub fn system(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            category: ErrorCategory::System,
        }
    }
}

impl From<&ParseError> for ErrorInfo {
    fn from(error: &ParseError) -> Self {
        Self {
            message: error.message(),
            line: Some(error.line()),
            column: Some(error.column()),
            category: ErrorCategory::Syntax,
        }
    }
}

impl From<&EvalError> for ErrorInfo {
    fn from(error: &EvalError) -> Self {
        let position = error.span.filter(|span| !span.is_synthetic());
        Self {
            message: error.to_string(),
            line: position.map(|span| span.start.line),
            column: position.map(|span| span.start.column),
            category: error.category,
        }
    }
}

/// Why a job was aborted as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemErrorKind {
    TimedOut,
    Cancelled,
    KernelInitialization,
    /// The worker thread died or dropped the job.
    Transport,
    /// The request could not be decoded.
    InvalidRequest,
}

/// A failed job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    #[error("syntax errors: {}", summary(.0))]
    Syntax(Vec<ErrorInfo>),

    #[error("runtime errors: {}", summary(.0))]
    Runtime(Vec<ErrorInfo>),

    #[error("{message}")]
    System {
        kind: SystemErrorKind,
        message: String,
    },
}

fn summary(errors: &[ErrorInfo]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl JobError {
    pub fn system(kind: SystemErrorKind, message: impl Into<String>) -> Self {
        Self::System {
            kind,
            message: message.into(),
        }
    }

    pub fn timed_out(timeout_ms: u64) -> Self {
        Self::system(
            SystemErrorKind::TimedOut,
            format!("evaluation timed out after {timeout_ms} ms; simplify the model or extend the timeout"),
        )
    }

    pub fn cancelled() -> Self {
        Self::system(SystemErrorKind::Cancelled, "job cancelled")
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::system(SystemErrorKind::Transport, message)
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Syntax(_) => ErrorCategory::Syntax,
            Self::Runtime(_) => ErrorCategory::Runtime,
            Self::System { .. } => ErrorCategory::System,
        }
    }

    pub fn system_kind(&self) -> Option<SystemErrorKind> {
        match self {
            Self::System { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True for timeouts, so callers can suggest simplifying the model or
    /// raising the limit.
    pub fn is_timeout(&self) -> bool {
        self.system_kind() == Some(SystemErrorKind::TimedOut)
    }

    pub fn is_cancelled(&self) -> bool {
        self.system_kind() == Some(SystemErrorKind::Cancelled)
    }

    /// The user-visible error list; never empty.
    pub fn errors(&self) -> Vec<ErrorInfo> {
        match self {
            Self::Syntax(errors) | Self::Runtime(errors) if !errors.is_empty() => errors.clone(),
            other => vec![ErrorInfo {
                category: other.category(),
                ..ErrorInfo::system(other.to_string())
            }],
        }
    }

    /// Classify the errors of a finished evaluation. A system error wins
    /// over any runtime errors recorded before it.
    pub fn from_evaluation(errors: &[EvalError], timeout_ms: u64) -> Self {
        if let Some(system) = errors.iter().find(|e| e.is_system()) {
            return match &system.kind {
                EvalErrorKind::TimedOut => Self::timed_out(timeout_ms),
                EvalErrorKind::Cancelled => Self::cancelled(),
                _ => Self::system(SystemErrorKind::KernelInitialization, system.to_string()),
            };
        }
        Self::Runtime(errors.iter().map(ErrorInfo::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_distinguished() {
        let err = JobError::timed_out(100);
        assert!(err.is_timeout());
        assert!(!JobError::cancelled().is_timeout());
        assert_eq!(err.category(), ErrorCategory::System);
        assert!(err.to_string().contains("100 ms"));
    }

    #[test]
    fn test_errors_never_empty() {
        assert_eq!(JobError::Runtime(Vec::new()).errors().len(), 1);
        let list = JobError::transport("worker crashed").errors();
        assert_eq!(list[0].message, "worker crashed");
        assert_eq!(list[0].line, None);
    }

    #[test]
    fn test_from_evaluation_prefers_system() {
        let errors = vec![
            EvalError::undefined_variable("x", None),
            EvalError::timed_out(),
        ];
        assert!(JobError::from_evaluation(&errors, 5).is_timeout());
        let runtime = JobError::from_evaluation(&errors[..1], 5);
        assert!(matches!(runtime, JobError::Runtime(ref list) if list.len() == 1));
    }
}
