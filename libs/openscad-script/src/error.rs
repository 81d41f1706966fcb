//! # Script Errors

use thiserror::Error;

/// Result of a script operation.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Failures decoding or validating a [`Program`](crate::Program).
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid program JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Assignment target that is not a valid identifier.
    #[error("invalid variable name {0:?}")]
    InvalidName(String),
}
