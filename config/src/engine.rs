//! # Engine Configuration
//!
//! Runtime settings a host can override, typically loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::constants::{
    clamp_timeout_ms, DEFAULT_TIMEOUT_MS, MAX_LIST_ELEMENTS, MAX_RANGE_ELEMENTS,
    MAX_RECURSION_DEPTH, MAX_VECTOR_DEPTH,
};

// =============================================================================
// EXECUTION MODE
// =============================================================================

/// Where the job manager runs the evaluation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionMode {
    /// A dedicated worker thread owned by the job manager.
    #[default]
    Worker,
    /// Synchronously inside `submit`, on the caller's thread.
    Inline,
}

// =============================================================================
// LOOP ERROR POLICY
// =============================================================================

/// What a `for` loop does when one iteration raises a runtime error.
///
/// The error is recorded either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoopErrorPolicy {
    /// Drop the failing iteration and continue with the next one.
    #[default]
    SkipIteration,
    /// Stop the loop at the first failing iteration.
    AbortLoop,
}

// =============================================================================
// ENGINE CONFIG
// =============================================================================

/// Tunable limits for evaluation and job execution.
///
/// ## Example
///
/// ```rust
/// use config::{EngineConfig, ExecutionMode};
///
/// let cfg = EngineConfig::from_json_str(r#"{ "executionMode": "inline" }"#).unwrap();
/// assert_eq!(cfg.execution_mode, ExecutionMode::Inline);
/// assert_eq!(cfg.default_timeout_ms, config::constants::DEFAULT_TIMEOUT_MS);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum nesting of function and module calls.
    pub max_recursion_depth: usize,
    /// Maximum elements a range may materialize.
    pub max_range_elements: usize,
    /// Maximum elements a list comprehension may produce.
    pub max_list_elements: usize,
    /// Maximum nesting of vector values.
    pub max_vector_depth: usize,
    /// Timeout used when a request omits one.
    pub default_timeout_ms: u64,
    /// Worker thread or inline execution.
    pub execution_mode: ExecutionMode,
    /// Runtime error handling inside `for` loops.
    pub loop_error_policy: LoopErrorPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: MAX_RECURSION_DEPTH,
            max_range_elements: MAX_RANGE_ELEMENTS,
            max_list_elements: MAX_LIST_ELEMENTS,
            max_vector_depth: MAX_VECTOR_DEPTH,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            execution_mode: ExecutionMode::default(),
            loop_error_policy: LoopErrorPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON; missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Effective timeout for a request, clamped to the accepted bounds.
    ///
    /// ```rust
    /// use config::EngineConfig;
    ///
    /// let cfg = EngineConfig::default();
    /// assert_eq!(cfg.timeout_for(Some(0)), 1);
    /// ```
    pub fn timeout_for(&self, requested: Option<u64>) -> u64 {
        clamp_timeout_ms(Some(requested.unwrap_or(self.default_timeout_ms)))
    }

    /// Same settings with a different execution mode.
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }
}
