//! # Jobs
//!
//! Shared per-job state and the handle returned to the submitter. A job
//! settles exactly once: whichever of completion, cancellation or the
//! forced timeout gets there first decides the result, and later attempts
//! are ignored.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use config::constants::TIMEOUT_GRACE_MS;
use openscad_eval::Interrupt;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::{JobError, JobResult};
use crate::pipeline::elapsed_ms;
use crate::request::JobResponse;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Queued | JobState::Running)
    }

    fn from_result(result: &JobResult<JobResponse>) -> Self {
        match result {
            Ok(_) => JobState::Succeeded,
            Err(e) if e.is_timeout() => JobState::TimedOut,
            Err(e) if e.is_cancelled() => JobState::Cancelled,
            Err(_) => JobState::Failed,
        }
    }
}

type Settlement = oneshot::Sender<JobResult<JobResponse>>;

/// State shared by the handle, the manager registry and the worker.
#[derive(Debug)]
pub(crate) struct JobShared {
    pub(crate) id: Uuid,
    pub(crate) interrupt: Interrupt,
    pub(crate) timeout_ms: u64,
    pub(crate) submitted: Instant,
    state: Mutex<JobState>,
    sender: Mutex<Option<Settlement>>,
}

impl JobShared {
    pub(crate) fn new(id: Uuid, interrupt: Interrupt, timeout_ms: u64, sender: Settlement) -> Self {
        Self {
            id,
            interrupt,
            timeout_ms,
            submitted: Instant::now(),
            state: Mutex::new(JobState::Queued),
            sender: Mutex::new(Some(sender)),
        }
    }

    pub(crate) fn state(&self) -> JobState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(JobState::Failed)
    }

    /// Move a queued job to running. False when it already settled.
    pub(crate) fn start(&self) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        if *state != JobState::Queued {
            return false;
        }
        *state = JobState::Running;
        true
    }

    /// Deliver `result` unless the job already settled.
    pub(crate) fn settle(&self, result: JobResult<JobResponse>) -> bool {
        let Some(sender) = self.sender.lock().ok().and_then(|mut slot| slot.take()) else {
            return false;
        };
        let state = JobState::from_result(&result);
        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
        tracing::debug!(job = %self.id, ?state, "job settled");
        // The handle may already be gone.
        let _ = sender.send(result);
        true
    }

    /// Stop the evaluation and settle as cancelled.
    pub(crate) fn cancel(&self) -> bool {
        self.interrupt.cancel();
        self.settle(Err(JobError::cancelled()))
    }
}

/// Submitter's view of one job.
#[derive(Debug)]
pub struct JobHandle {
    shared: Arc<JobShared>,
    receiver: oneshot::Receiver<JobResult<JobResponse>>,
}

impl JobHandle {
    pub(crate) fn new(
        shared: Arc<JobShared>,
        receiver: oneshot::Receiver<JobResult<JobResponse>>,
    ) -> Self {
        Self { shared, receiver }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> JobState {
        self.shared.state()
    }

    /// Effective timeout after clamping.
    pub fn timeout_ms(&self) -> u64 {
        self.shared.timeout_ms
    }

    /// Cancel the job. Returns false when it had already settled.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Wait for the result.
    ///
    /// The evaluator stops itself at the deadline; if it has not settled a
    /// short grace period later, the job is failed as timed out here.
    pub async fn wait(self) -> JobResult<JobResponse> {
        let mut receiver = self.receiver;
        let deadline = self.shared.submitted
            + Duration::from_millis(self.shared.timeout_ms + TIMEOUT_GRACE_MS);
        match tokio::time::timeout_at(deadline.into(), &mut receiver).await {
            Ok(received) => received.unwrap_or_else(|_| Err(dropped())),
            Err(_) => {
                if self.shared.settle(Err(JobError::timed_out(self.shared.timeout_ms))) {
                    tracing::warn!(job = %self.shared.id, "job forced to time out");
                }
                receiver.await.unwrap_or_else(|_| Err(dropped()))
            }
        }
    }

    /// [`JobHandle::wait`], folding failures into the response shape.
    pub async fn wait_response(self) -> JobResponse {
        let submitted = self.shared.submitted;
        match self.wait().await {
            Ok(response) => response,
            Err(error) => JobResponse::from_error(&error, elapsed_ms(submitted)),
        }
    }

    /// The result if the job already settled.
    pub fn try_result(&mut self) -> Option<JobResult<JobResponse>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(dropped())),
        }
    }
}

fn dropped() -> JobError {
    JobError::transport("job was dropped before it settled")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(timeout_ms: u64) -> (Arc<JobShared>, JobHandle) {
        let (sender, receiver) = oneshot::channel();
        let shared = Arc::new(JobShared::new(
            Uuid::new_v4(),
            Interrupt::new(),
            timeout_ms,
            sender,
        ));
        (Arc::clone(&shared), JobHandle::new(shared, receiver))
    }

    #[test]
    fn test_settles_once() {
        let (shared, mut handle) = job(1_000);
        assert!(shared.start());
        assert!(handle.cancel());
        assert!(!shared.settle(Err(JobError::transport("late"))));
        assert!(!handle.cancel());
        assert_eq!(handle.state(), JobState::Cancelled);
        assert!(handle.try_result().unwrap().unwrap_err().is_cancelled());
    }

    #[test]
    fn test_cancelled_job_does_not_start() {
        let (shared, handle) = job(1_000);
        handle.cancel();
        assert!(shared.interrupt.is_cancelled());
        assert!(!shared.start());
    }

    #[test]
    fn test_try_result_pending() {
        let (_shared, mut handle) = job(1_000);
        assert!(handle.try_result().is_none());
        assert_eq!(handle.state(), JobState::Queued);
    }

    #[tokio::test]
    async fn test_wait_forces_timeout() {
        let (_shared, handle) = job(10);
        let err = handle.wait().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_wait_response_folds_errors() {
        let (shared, handle) = job(1_000);
        shared.settle(Err(JobError::transport("boom")));
        let response = handle.wait_response().await;
        assert!(!response.success);
        assert_eq!(response.errors[0].message, "boom");
    }
}
