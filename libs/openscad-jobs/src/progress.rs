//! # Progress Events
//!
//! The pipeline reports the stage it enters; a [`ProgressRelay`] forwards
//! events to the host callback in strictly increasing stage order.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Queued,
    Tokenizing,
    Parsing,
    Evaluating,
    Meshing,
    Complete,
}

impl Stage {
    /// Overall completion when this stage starts.
    pub fn progress(self) -> f64 {
        match self {
            Stage::Queued => 0.0,
            Stage::Tokenizing => 0.05,
            Stage::Parsing => 0.15,
            Stage::Evaluating => 0.3,
            Stage::Meshing => 0.85,
            Stage::Complete => 1.0,
        }
    }
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job_id: Uuid,
    pub stage: Stage,
    /// `0.0..=1.0`
    pub progress: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Host callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Per-job forwarder that drops events arriving out of stage order.
#[derive(Clone)]
pub struct ProgressRelay {
    job_id: Uuid,
    callback: Option<ProgressCallback>,
    detail: bool,
    last: Arc<Mutex<Option<Stage>>>,
}

impl fmt::Debug for ProgressRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressRelay")
            .field("job_id", &self.job_id)
            .field("detail", &self.detail)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl ProgressRelay {
    pub fn new(job_id: Uuid, callback: Option<ProgressCallback>, detail: bool) -> Self {
        Self {
            job_id,
            callback,
            detail,
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// True when details were requested.
    pub fn wants_detail(&self) -> bool {
        self.detail
    }

    /// Report entering `stage`. Returns false when the event was dropped
    /// because an equal or later stage was already reported.
    pub fn report(&self, stage: Stage, message: impl Into<String>) -> bool {
        self.emit(stage, message.into(), None)
    }

    /// Report with details; they are dropped unless requested.
    pub fn report_with(
        &self,
        stage: Stage,
        message: impl Into<String>,
        details: impl FnOnce() -> serde_json::Value,
    ) -> bool {
        let details = self.detail.then(details);
        self.emit(stage, message.into(), details)
    }

    fn emit(&self, stage: Stage, message: String, details: Option<serde_json::Value>) -> bool {
        {
            let Ok(mut last) = self.last.lock() else {
                return false;
            };
            if last.is_some_and(|previous| previous >= stage) {
                tracing::debug!(job = %self.job_id, ?stage, "dropping out-of-order progress");
                return false;
            }
            *last = Some(stage);
        }
        if let Some(callback) = &self.callback {
            callback(ProgressEvent {
                job_id: self.job_id,
                stage,
                progress: stage.progress(),
                message,
                details,
            });
        }
        true
    }
}
