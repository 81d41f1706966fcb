//! # Job Manager
//!
//! Accepts requests, assigns ids and clamped deadlines, and runs jobs
//! either on its worker thread or inline on the caller's thread.
//!
//! ```rust,no_run
//! # async fn demo() {
//! use config::EngineConfig;
//! use openscad_jobs::{JobManager, JobOptions, JobRequest};
//!
//! let manager = JobManager::new(EngineConfig::default());
//! let handle = manager.submit(JobRequest::source("cube(10);"), JobOptions::default());
//! let response = handle.wait_response().await;
//! assert!(response.success);
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use config::{EngineConfig, ExecutionMode};
use openscad_eval::Interrupt;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::job::{JobHandle, JobShared, JobState};
use crate::pipeline::{self, Runner};
use crate::progress::{ProgressCallback, ProgressEvent, ProgressRelay, Stage};
use crate::request::JobRequest;
use crate::worker::{self, WorkItem, Worker};

/// Per-submission options.
#[derive(Clone, Default)]
pub struct JobOptions {
    pub progress: Option<ProgressCallback>,
}

impl JobOptions {
    pub fn with_progress(callback: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            progress: Some(Arc::new(callback)),
        }
    }
}

impl fmt::Debug for JobOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobOptions")
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Runs evaluation jobs.
pub struct JobManager {
    config: EngineConfig,
    name: String,
    runner: Runner,
    worker: Mutex<Option<Worker>>,
    jobs: Mutex<HashMap<Uuid, Weak<JobShared>>>,
}

impl JobManager {
    pub fn new(config: EngineConfig) -> Self {
        Self::named("openscad-worker", config)
    }

    /// Manager whose worker thread is called `name`.
    pub fn named(name: impl Into<String>, config: EngineConfig) -> Self {
        Self::with_runner(name, config, Arc::new(pipeline::run))
    }

    pub(crate) fn with_runner(name: impl Into<String>, config: EngineConfig, runner: Runner) -> Self {
        Self {
            config,
            name: name.into(),
            runner,
            worker: Mutex::new(None),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Queue a job. In inline mode the job has already settled when this
    /// returns.
    pub fn submit(&self, request: JobRequest, options: JobOptions) -> JobHandle {
        let id = Uuid::new_v4();
        let timeout_ms = self.config.timeout_for(request.timeout);
        let interrupt =
            Interrupt::new().with_deadline(Instant::now() + Duration::from_millis(timeout_ms));
        let (sender, receiver) = oneshot::channel();
        let shared = Arc::new(JobShared::new(id, interrupt, timeout_ms, sender));
        let relay = ProgressRelay::new(id, options.progress, request.progress_detail);

        self.register(&shared);
        tracing::info!(job = %id, timeout_ms, mode = ?self.config.execution_mode, "job submitted");
        relay.report(Stage::Queued, "queued");

        let item = WorkItem {
            shared: Arc::clone(&shared),
            request,
            relay,
        };
        match self.config.execution_mode {
            ExecutionMode::Inline => {
                if let Some(message) = worker::execute(&item, &self.config, &self.runner) {
                    tracing::error!(job = %id, %message, "inline job panicked");
                }
            }
            ExecutionMode::Worker => self.dispatch(item),
        }
        JobHandle::new(shared, receiver)
    }

    /// Hand `item` to the worker, starting one if none is running.
    fn dispatch(&self, item: WorkItem) {
        let Ok(mut slot) = self.worker.lock() else {
            return;
        };
        let mut item = item;
        for _ in 0..2 {
            if slot.as_ref().map_or(true, |worker| !worker.is_alive()) {
                if slot.is_some() {
                    tracing::warn!(worker = %self.name, "restarting dead worker");
                }
                match Worker::spawn(&self.name, self.config.clone(), Arc::clone(&self.runner)) {
                    Ok(worker) => *slot = Some(worker),
                    Err(error) => {
                        tracing::error!(%error, "failed to start worker");
                        *slot = None;
                        return;
                    }
                }
            }
            let Some(worker) = slot.as_ref() else {
                return;
            };
            match worker.send(item) {
                Ok(()) => return,
                Err(returned) => {
                    item = returned;
                    *slot = None;
                }
            }
        }
    }

    fn register(&self, shared: &Arc<JobShared>) {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.retain(|_, job| job.upgrade().is_some_and(|job| !job.state().is_terminal()));
            jobs.insert(shared.id, Arc::downgrade(shared));
        }
    }

    fn find(&self, id: Uuid) -> Option<Arc<JobShared>> {
        self.jobs.lock().ok()?.get(&id)?.upgrade()
    }

    /// Cancel job `id`. False when it is unknown or already settled.
    pub fn cancel(&self, id: Uuid) -> bool {
        let cancelled = self.find(id).is_some_and(|job| job.cancel());
        if cancelled {
            tracing::info!(job = %id, "job cancelled");
        }
        cancelled
    }

    /// Cancel every unsettled job; returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let jobs: Vec<Arc<JobShared>> = match self.jobs.lock() {
            Ok(jobs) => jobs.values().filter_map(Weak::upgrade).collect(),
            Err(_) => return 0,
        };
        let count = jobs.iter().filter(|job| job.cancel()).count();
        if count > 0 {
            tracing::info!(count, "cancelled all jobs");
        }
        count
    }

    /// State of job `id` while its handle is alive.
    pub fn state(&self, id: Uuid) -> Option<JobState> {
        self.find(id).map(|job| job.state())
    }

    /// Jobs queued or running.
    pub fn active_jobs(&self) -> usize {
        self.jobs.lock().map_or(0, |jobs| {
            jobs.values()
                .filter_map(Weak::upgrade)
                .filter(|job| !job.state().is_terminal())
                .count()
        })
    }
}

impl fmt::Debug for JobManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobManager")
            .field("config", &self.config)
            .field("name", &self.name)
            .field("worker", &self.worker)
            .field("jobs", &self.active_jobs())
            .finish_non_exhaustive()
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
