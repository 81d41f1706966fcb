//! # Evaluation Output

use openscad_ast::{Modifier, Span};

use crate::error::EvalError;

/// A subtree marked with `#` or `%`, reported for the renderer.
#[derive(Debug, Clone)]
pub struct Highlight<G> {
    pub modifier: Modifier,
    pub geometry: G,
    pub span: Span,
}

/// Everything one evaluation produced.
///
/// `geometry` is the implicit union of the top-level results, or the
/// first `!` subtree when there is one. It is `None` when the model
/// produced nothing and whenever an error was recorded.
#[derive(Debug, Clone)]
pub struct EvaluationOutput<G> {
    pub geometry: Option<G>,
    pub highlights: Vec<Highlight<G>>,
    /// Highest-precedence modifier seen anywhere in the model.
    pub modifier: Option<Modifier>,
    pub errors: Vec<EvalError>,
    pub warnings: Vec<String>,
    /// Lines printed by `echo`.
    pub echoes: Vec<String>,
}

impl<G> EvaluationOutput<G> {
    /// True when no error was recorded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The system error that aborted evaluation, if any.
    pub fn system_error(&self) -> Option<&EvalError> {
        self.errors.iter().find(|e| e.is_system())
    }
}

impl<G> Default for EvaluationOutput<G> {
    fn default() -> Self {
        Self {
            geometry: None,
            highlights: Vec::new(),
            modifier: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            echoes: Vec::new(),
        }
    }
}
