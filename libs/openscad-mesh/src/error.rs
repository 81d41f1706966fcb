//! # Mesh Errors
//!
//! Failures of mesh construction. The kernel converts them into
//! [`KernelError`] at the trait boundary.

use openscad_eval::KernelError;
use thiserror::Error;

/// Result of a mesh operation.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur while building geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// Input that cannot describe a solid or region.
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    /// Index or parameter out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 2-D and 3-D operands in one operation.
    #[error("{0}")]
    DimensionMismatch(String),

    /// Operation the kernel does not implement.
    #[error("{0}")]
    Unsupported(String),
}

impl MeshError {
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::Degenerate(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<MeshError> for KernelError {
    fn from(error: MeshError) -> Self {
        match error {
            MeshError::DimensionMismatch(op) => KernelError::DimensionMismatch(op),
            MeshError::Unsupported(op) => KernelError::Unsupported(op),
            other => KernelError::InvalidGeometry(other.to_string()),
        }
    }
}
