//! # OpenSCAD Jobs
//!
//! Runs the full pipeline (tokenize, parse, evaluate, mesh) as jobs with
//! a clamped timeout, cancellation by id and ordered progress events.
//!
//! ## Modules
//!
//! - [`request`] - camelCase request and response shapes
//! - [`error`] - syntax, runtime and system failures
//! - [`progress`] - stage events and the per-job relay
//! - [`job`] - exactly-once settlement and the submitter's handle
//! - [`pipeline`] - one job on the current thread
//! - [`manager`] - worker thread or inline execution
//! - [`pool`] - round-robin over several managers

pub mod error;
pub mod job;
pub mod manager;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod request;
mod worker;

pub use error::{ErrorInfo, JobError, JobResult, SystemErrorKind};
pub use job::{JobHandle, JobState};
pub use manager::{JobManager, JobOptions};
pub use pool::JobPool;
pub use progress::{ProgressCallback, ProgressEvent, ProgressRelay, Stage};
pub use request::{GeometryOutput, JobRequest, JobResponse, Language};
