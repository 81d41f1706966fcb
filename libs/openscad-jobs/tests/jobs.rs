//! End-to-end job tests on a real worker thread.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use config::constants::TIMEOUT_GRACE_MS;
use config::{EngineConfig, ExecutionMode};
use openscad_eval::ErrorCategory;
use openscad_jobs::{
    JobManager, JobOptions, JobPool, JobRequest, JobState, ProgressEvent, Stage, SystemErrorKind,
};
use openscad_script::{Program, Solid};

const SLOW: &str = "v = [for (i = [0:3000]) for (j = [0:3000]) i * j];";
const TEN_MILLION_STEPS: &str = "for (i = [1:10000000]) if (i < 0) cube(1);";
const HUNDRED_MILLION_STEPS: &str =
    "for (i = [1:10000]) for (j = [1:10000]) if (i * j < 0) cube(1);";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn manager() -> JobManager {
    init_tracing();
    JobManager::new(EngineConfig::default())
}

#[tokio::test]
async fn test_successful_job() {
    let manager = manager();
    let handle = manager.submit(JobRequest::source("cube([1, 2, 3]);"), JobOptions::default());
    let response = handle.wait().await.unwrap();
    assert!(response.success);
    let geometry = response.geometry.as_ref().unwrap();
    assert!((geometry.stats.volume - 6.0).abs() < 1e-9);
    assert_eq!(geometry.buffers.indices.len(), 36);

    let json: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
    assert!(json["geometry"]["positions"].is_array());
    assert!(json["executionTime"].is_u64());
}

#[tokio::test]
async fn test_syntax_error() {
    let manager = manager();
    let response = manager
        .submit(JobRequest::source("cube(1"), JobOptions::default())
        .wait_response()
        .await;
    assert!(!response.success);
    assert!(response.geometry.is_none());
    assert_eq!(response.errors[0].category, ErrorCategory::Syntax);
    assert_eq!(response.errors[0].line, Some(1));
}

#[tokio::test]
async fn test_runtime_error() {
    let manager = manager();
    let handle = manager.submit(JobRequest::source("cube(1);\nfoo();"), JobOptions::default());
    let id = handle.id();
    let err = handle.wait().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Runtime);
    assert_eq!(err.errors()[0].line, Some(2));
    assert_eq!(manager.state(id), None);
}

#[tokio::test]
async fn test_timeout() {
    let manager = manager();
    let handle = manager.submit(JobRequest::source(SLOW).with_timeout(20), JobOptions::default());
    let err = handle.wait().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(err.to_string().contains("20 ms"));

    // The worker stays usable.
    let next = manager.submit(JobRequest::source("cube(1);"), JobOptions::default());
    assert!(next.wait().await.is_ok());
}

#[tokio::test]
async fn test_timeout_overhead_is_bounded() {
    let manager = manager();
    let started = Instant::now();
    let handle = manager.submit(
        JobRequest::source(TEN_MILLION_STEPS).with_timeout(5),
        JobOptions::default(),
    );
    let err = handle.wait().await.unwrap_err();
    let elapsed = started.elapsed();
    assert!(err.is_timeout(), "{err:?}");
    let bound = Duration::from_millis(5 + TIMEOUT_GRACE_MS + 250);
    assert!(elapsed < bound, "timed out after {elapsed:?}");

    let next = manager.submit(JobRequest::source("cube(1);"), JobOptions::default());
    assert!(next.wait().await.is_ok());
}

#[tokio::test]
async fn test_cancel_while_queued() {
    let manager = manager();
    let handle = manager.submit(JobRequest::source(SLOW), JobOptions::default());
    let id = handle.id();
    assert!(manager.cancel(id));
    assert!(!manager.cancel(id));
    assert!(!handle.cancel());
    assert_eq!(handle.state(), JobState::Cancelled);
    let err = handle.wait().await.unwrap_err();
    assert_eq!(err.system_kind(), Some(SystemErrorKind::Cancelled));
}

#[tokio::test]
async fn test_cancel_during_evaluation() {
    let manager = Arc::new(manager());
    let cancelled_at = Arc::new(Mutex::new(None::<Instant>));
    let options = {
        let manager = Arc::clone(&manager);
        let cancelled_at = Arc::clone(&cancelled_at);
        JobOptions::with_progress(move |event| {
            if event.stage == Stage::Evaluating && manager.cancel(event.job_id) {
                *cancelled_at.lock().unwrap() = Some(Instant::now());
            }
        })
    };

    let handle = manager.submit(JobRequest::source(HUNDRED_MILLION_STEPS), options);
    let err = handle.wait().await.unwrap_err();
    assert_eq!(err.system_kind(), Some(SystemErrorKind::Cancelled));
    let cancelled_at = cancelled_at.lock().unwrap().expect("cancelled from the callback");

    // The worker has left the loop when the next job runs.
    let next = manager.submit(JobRequest::source("cube(1);"), JobOptions::default());
    assert!(next.wait().await.is_ok());
    assert!(cancelled_at.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_cancel_all_with_queue() {
    let manager = manager();
    let handles: Vec<_> = (0..3)
        .map(|_| manager.submit(JobRequest::source(SLOW), JobOptions::default()))
        .collect();
    assert_eq!(manager.active_jobs(), 3);
    assert_eq!(manager.cancel_all(), 3);
    for handle in handles {
        assert!(handle.wait().await.unwrap_err().is_cancelled());
    }
    assert_eq!(manager.active_jobs(), 0);
}

#[tokio::test]
async fn test_inline_mode() {
    init_tracing();
    let manager =
        JobManager::new(EngineConfig::default().with_execution_mode(ExecutionMode::Inline));
    let mut handle = manager.submit(JobRequest::source("square(2);"), JobOptions::default());
    let response = handle.try_result().unwrap().unwrap();
    let geometry = response.geometry.unwrap();
    assert!(geometry.planar);
    assert_eq!(geometry.stats.volume, 0.0);
}

#[tokio::test]
async fn test_scripting_job() {
    let manager = manager();
    let program = Program::new()
        .set("$fn", 12.0)
        .add(Solid::cube(4.0).difference(&Solid::cube(2.0)));
    let request = JobRequest::script(program.to_json().unwrap());
    let response = manager.submit(request, JobOptions::default()).wait().await.unwrap();
    assert!((response.geometry.unwrap().stats.volume - 56.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_animation_time() {
    let manager = manager();
    let request = JobRequest::source("echo($t);").with_time(0.25);
    let response = manager.submit(request, JobOptions::default()).wait().await.unwrap();
    assert_eq!(response.echoes, vec!["0.25".to_owned()]);
}

#[tokio::test]
async fn test_progress_order() {
    let manager = manager();
    let events = Arc::new(Mutex::new(Vec::<ProgressEvent>::new()));
    let sink = Arc::clone(&events);
    let options = JobOptions::with_progress(move |event| sink.lock().unwrap().push(event));

    let handle = manager.submit(JobRequest::source("sphere(2);").with_progress_detail(), options);
    let id = handle.id();
    handle.wait().await.unwrap();

    let events = events.lock().unwrap();
    let stages: Vec<Stage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Queued,
            Stage::Tokenizing,
            Stage::Parsing,
            Stage::Evaluating,
            Stage::Meshing,
            Stage::Complete
        ]
    );
    assert!(events.iter().all(|e| e.job_id == id));
    assert!(events.windows(2).all(|pair| pair[0].progress < pair[1].progress));
    assert!(events[4].details.as_ref().unwrap()["triangles"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_pool() {
    init_tracing();
    let pool = JobPool::new(EngineConfig::default(), 2);
    let handles: Vec<_> = (1..=4)
        .map(|size| pool.submit(JobRequest::source(format!("cube({size});")), JobOptions::default()))
        .collect();
    for (size, handle) in (1..=4).zip(handles) {
        let volume = handle.wait().await.unwrap().geometry.unwrap().stats.volume;
        assert!((volume - f64::from(size).powi(3)).abs() < 1e-9);
    }
    assert_eq!(pool.active_jobs(), 0);
}
