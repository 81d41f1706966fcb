//! # Evaluation Pipeline
//!
//! One job, start to finish: tokenize, parse, evaluate against a geometry
//! kernel and flatten the result into renderer buffers. Runs on whatever
//! thread calls it; the manager decides which.

use std::sync::Arc;
use std::time::Instant;

use config::EngineConfig;
use openscad_ast::Statement;
use openscad_eval::{evaluate, EvalOptions, GeometryKernel, Interrupt};
use openscad_mesh::{MeshKernel, Shape};
use openscad_script::Program;

use crate::error::{ErrorInfo, JobError, JobResult, SystemErrorKind};
use crate::progress::{ProgressRelay, Stage};
use crate::request::{GeometryOutput, JobRequest, JobResponse, Language};

/// Everything a pipeline run needs besides the request.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: EngineConfig,
    pub interrupt: Interrupt,
    pub relay: ProgressRelay,
    /// Effective timeout, for error messages.
    pub timeout_ms: u64,
}

/// A pipeline entry point as the worker calls it.
pub(crate) type Runner =
    Arc<dyn Fn(&JobRequest, &RunContext) -> JobResult<JobResponse> + Send + Sync>;

/// Run `request` to completion on a fresh [`MeshKernel`].
///
/// ## Returns
///
/// A successful [`JobResponse`], or the classified failure. A failed run
/// never carries partial geometry.
pub fn run(request: &JobRequest, context: &RunContext) -> JobResult<JobResponse> {
    run_with(request, context, &MeshKernel::new())
}

/// Run `request` against `kernel`.
pub fn run_with<K>(request: &JobRequest, context: &RunContext, kernel: &K) -> JobResult<JobResponse>
where
    K: GeometryKernel<Geometry = Shape>,
{
    let started = Instant::now();
    check(context)?;

    let statements = front_end(request, context)?;
    check(context)?;

    context.relay.report_with(Stage::Evaluating, "evaluating", || {
        serde_json::json!({ "statements": statements.len() })
    });
    let options = EvalOptions {
        config: context.config.clone(),
        interrupt: context.interrupt.clone(),
        animation_time: request.t,
    };
    let output = evaluate(&statements, kernel, options);
    for warning in &output.warnings {
        tracing::warn!(target: "openscad::eval", "{warning}");
    }
    if !output.is_success() {
        return Err(JobError::from_evaluation(&output.errors, context.timeout_ms));
    }
    check(context)?;

    let shape = output.geometry.unwrap_or_default();
    context.relay.report_with(Stage::Meshing, "building buffers", || {
        let stats = shape.stats();
        serde_json::json!({ "vertices": stats.vertex_count, "triangles": stats.face_count })
    });
    let geometry = geometry_output(&shape);
    check(context)?;

    let execution_time_ms = elapsed_ms(started);
    context.relay.report(Stage::Complete, "complete");
    Ok(JobResponse {
        success: true,
        geometry,
        errors: Vec::new(),
        execution_time_ms,
        warnings: output.warnings,
        echoes: output.echoes,
    })
}

/// Statements for either front end.
fn front_end(request: &JobRequest, context: &RunContext) -> JobResult<Vec<Statement>> {
    match request.language {
        Language::Declarative => {
            context.relay.report(Stage::Tokenizing, "tokenizing");
            let tokens = openscad_parser::tokenize(&request.code);
            check(context)?;

            context.relay.report_with(Stage::Parsing, "parsing", || {
                serde_json::json!({ "tokens": tokens.len() })
            });
            let parsed = openscad_parser::parse(tokens);
            if !parsed.success() {
                tracing::debug!(errors = parsed.errors.len(), "parse failed");
                return Err(JobError::Syntax(
                    parsed.errors.iter().map(ErrorInfo::from).collect(),
                ));
            }
            Ok(parsed.ast)
        }
        Language::Scripting => {
            context.relay.report(Stage::Parsing, "decoding program");
            let program = Program::from_json(&request.code)
                .map_err(|e| JobError::system(SystemErrorKind::InvalidRequest, e.to_string()))?;
            Ok(program.statements())
        }
    }
}

fn geometry_output(shape: &Shape) -> Option<GeometryOutput> {
    if shape.is_empty() {
        return None;
    }
    Some(GeometryOutput {
        buffers: shape.to_buffers(),
        bounds: shape
            .bounds()
            .map(|(min, max)| [min.to_array(), max.to_array()]),
        stats: shape.stats(),
        planar: !shape.is_solid(),
    })
}

/// Map a tripped interrupt to the job error.
fn check(context: &RunContext) -> JobResult<()> {
    if context.interrupt.is_cancelled() {
        return Err(JobError::cancelled());
    }
    if context.interrupt.is_expired() {
        return Err(JobError::timed_out(context.timeout_ms));
    }
    Ok(())
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
