//! # Worker Thread
//!
//! A dedicated OS thread that runs queued jobs one at a time. A panic in
//! the pipeline fails the running job and every queued one, and the
//! thread exits; the manager starts a fresh worker on the next submit.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use config::EngineConfig;

use crate::error::{JobError, JobResult};
use crate::job::JobShared;
use crate::pipeline::{RunContext, Runner};
use crate::progress::ProgressRelay;
use crate::request::{JobRequest, JobResponse};

/// A submitted job on its way to execution.
///
/// Dropping an unsettled item fails its job, so jobs stranded in the queue
/// of a dead worker still settle.
#[derive(Debug)]
pub(crate) struct WorkItem {
    pub(crate) shared: Arc<JobShared>,
    pub(crate) request: JobRequest,
    pub(crate) relay: ProgressRelay,
}

impl Drop for WorkItem {
    fn drop(&mut self) {
        if self.shared.settle(Err(JobError::transport("worker stopped before the job ran"))) {
            tracing::warn!(job = %self.shared.id, "job dropped by worker");
        }
    }
}

/// Run one item on the current thread, catching panics.
///
/// Returns the panic message when the pipeline panicked; the job has then
/// been failed with a transport error.
pub(crate) fn execute(item: &WorkItem, config: &EngineConfig, runner: &Runner) -> Option<String> {
    if !item.shared.start() {
        tracing::debug!(job = %item.shared.id, "skipping settled job");
        return None;
    }
    let context = RunContext {
        config: config.clone(),
        interrupt: item.shared.interrupt.clone(),
        relay: item.relay.clone(),
        timeout_ms: item.shared.timeout_ms,
    };
    let span = tracing::info_span!("job", id = %item.shared.id);
    let _entered = span.enter();

    let outcome: thread::Result<JobResult<JobResponse>> =
        catch_unwind(AssertUnwindSafe(|| runner(&item.request, &context)));
    match outcome {
        Ok(result) => {
            match &result {
                Ok(response) => tracing::info!(ms = response.execution_time_ms, "job succeeded"),
                Err(error) => tracing::info!(%error, "job failed"),
            }
            item.shared.settle(result);
            None
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(%message, "evaluation panicked");
            item.shared
                .settle(Err(JobError::transport(format!("worker crashed: {message}"))));
            Some(message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Handle to a running worker thread.
#[derive(Debug)]
pub(crate) struct Worker {
    sender: Sender<WorkItem>,
    alive: Arc<AtomicBool>,
}

impl Worker {
    /// Spawn a worker thread named after `name`.
    pub(crate) fn spawn(name: &str, config: EngineConfig, runner: Runner) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let alive = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&alive);
        thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || run_loop(receiver, config, runner, flag))?;
        tracing::info!(worker = name, "worker started");
        Ok(Self { sender, alive })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Queue an item; hands it back when the thread is gone.
    pub(crate) fn send(&self, item: WorkItem) -> Result<(), WorkItem> {
        if !self.is_alive() {
            return Err(item);
        }
        self.sender.send(item).map_err(|error| error.0)
    }
}

fn run_loop(
    receiver: Receiver<WorkItem>,
    config: EngineConfig,
    runner: Runner,
    alive: Arc<AtomicBool>,
) {
    while let Ok(item) = receiver.recv() {
        if let Some(message) = execute(&item, &config, &runner) {
            alive.store(false, Ordering::Release);
            drop(item);
            // Queued jobs settle as they are dropped.
            let stranded = receiver.try_iter().count();
            tracing::error!(%message, stranded, "worker exiting after panic");
            return;
        }
    }
    alive.store(false, Ordering::Release);
    tracing::debug!("worker queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use openscad_eval::Interrupt;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    use crate::job::{JobHandle, JobState};
    use crate::pipeline;

    fn mesh_runner() -> Runner {
        Arc::new(pipeline::run)
    }

    fn item(code: &str) -> (WorkItem, JobHandle) {
        let (sender, receiver) = oneshot::channel();
        let id = Uuid::new_v4();
        let shared = Arc::new(JobShared::new(id, Interrupt::new(), 5_000, sender));
        let item = WorkItem {
            shared: Arc::clone(&shared),
            request: JobRequest::source(code),
            relay: ProgressRelay::new(id, None, false),
        };
        (item, JobHandle::new(shared, receiver))
    }

    #[test]
    fn test_execute_settles_job() {
        let (item, mut handle) = item("cube(1);");
        assert_eq!(execute(&item, &EngineConfig::default(), &mesh_runner()), None);
        assert_eq!(handle.state(), JobState::Succeeded);
        assert!(handle.try_result().unwrap().is_ok());
    }

    #[test]
    fn test_dropped_item_fails_job() {
        let (item, mut handle) = item("cube(1);");
        drop(item);
        let err = handle.try_result().unwrap().unwrap_err();
        assert_eq!(err.system_kind(), Some(crate::SystemErrorKind::Transport));
    }

    #[test]
    fn test_panicking_run_fails_job_with_transport() {
        let runner: Runner =
            Arc::new(|_: &JobRequest, _: &RunContext| -> JobResult<JobResponse> {
                panic!("kernel fault")
            });
        let (item, mut handle) = item("cube(1);");
        let message = execute(&item, &EngineConfig::default(), &runner);
        assert_eq!(message.as_deref(), Some("kernel fault"));
        let err = handle.try_result().unwrap().unwrap_err();
        assert_eq!(err.system_kind(), Some(crate::SystemErrorKind::Transport));
        assert!(err.to_string().contains("kernel fault"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[tokio::test]
    async fn test_worker_runs_queue_in_order() {
        let worker =
            Worker::spawn("openscad-test-worker", EngineConfig::default(), mesh_runner()).unwrap();
        let (first, first_handle) = item("cube(1);");
        let (second, second_handle) = item("sphere(1);");
        worker.send(first).unwrap();
        worker.send(second).unwrap();
        assert!(first_handle.wait().await.is_ok());
        assert!(second_handle.wait().await.is_ok());
        assert!(worker.is_alive());
    }
}
