//! # Request and Response Shapes
//!
//! Wire shapes exchanged with the host, serialized with camelCase names:
//!
//! ```text
//! request  { code, language, t?, timeout?, progressDetail? }
//! response { success, geometry | null, errors: [{ message, line?, column? }], executionTime }
//! ```

use openscad_mesh::{MeshBuffers, MeshStats};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorInfo, JobError};

/// Which front end `code` is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Language {
    /// OpenSCAD source text.
    #[default]
    Declarative,
    /// JSON form of an `openscad_script::Program`.
    Scripting,
}

/// A job submission.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub code: String,
    #[serde(default)]
    pub language: Language,
    /// Animation parameter `$t`, clamped to `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    /// Milliseconds; clamped by the manager.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Attach statement and triangle counts to progress events.
    #[serde(default)]
    pub progress_detail: bool,
}

impl JobRequest {
    /// Declarative request with defaults.
    pub fn source(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Scripting request carrying a program's JSON.
    pub fn script(program_json: impl Into<String>) -> Self {
        Self {
            code: program_json.into(),
            language: Language::Scripting,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    pub fn with_time(mut self, t: f64) -> Self {
        self.t = Some(t);
        self
    }

    pub fn with_progress_detail(mut self) -> Self {
        self.progress_detail = true;
        self
    }
}

/// Mesh data of a successful job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryOutput {
    #[serde(flatten)]
    pub buffers: MeshBuffers,
    /// `[min, max]` corners, absent for empty geometry.
    pub bounds: Option<[[f64; 3]; 2]>,
    pub stats: MeshStats,
    /// True for flat 2D results.
    pub planar: bool,
}

/// Outcome of a job as delivered to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub success: bool,
    pub geometry: Option<GeometryOutput>,
    pub errors: Vec<ErrorInfo>,
    #[serde(rename = "executionTime")]
    pub execution_time_ms: u64,
    pub warnings: Vec<String>,
    pub echoes: Vec<String>,
}

impl JobResponse {
    /// The failed shape: no geometry and a non-empty error list.
    pub fn from_error(error: &JobError, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            geometry: None,
            errors: error.errors(),
            execution_time_ms,
            warnings: Vec::new(),
            echoes: Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
