//! # Job Pool
//!
//! Several managers, each with its own worker thread, fed round-robin.

use std::sync::atomic::{AtomicUsize, Ordering};

use config::EngineConfig;
use uuid::Uuid;

use crate::job::{JobHandle, JobState};
use crate::manager::{JobManager, JobOptions};
use crate::request::JobRequest;

#[derive(Debug)]
pub struct JobPool {
    managers: Vec<JobManager>,
    next: AtomicUsize,
}

impl JobPool {
    /// Pool of `size` workers; at least one.
    pub fn new(config: EngineConfig, size: usize) -> Self {
        let managers = (0..size.max(1))
            .map(|index| JobManager::named(format!("openscad-worker-{index}"), config.clone()))
            .collect();
        Self {
            managers,
            next: AtomicUsize::new(0),
        }
    }

    pub fn size(&self) -> usize {
        self.managers.len()
    }

    pub fn submit(&self, request: JobRequest, options: JobOptions) -> JobHandle {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.managers.len();
        tracing::debug!(worker = index, "dispatching job");
        self.managers[index].submit(request, options)
    }

    pub fn cancel(&self, id: Uuid) -> bool {
        self.managers.iter().any(|manager| manager.cancel(id))
    }

    pub fn cancel_all(&self) -> usize {
        self.managers.iter().map(JobManager::cancel_all).sum()
    }

    pub fn state(&self, id: Uuid) -> Option<JobState> {
        self.managers.iter().find_map(|manager| manager.state(id))
    }

    pub fn active_jobs(&self) -> usize {
        self.managers.iter().map(JobManager::active_jobs).sum()
    }
}
