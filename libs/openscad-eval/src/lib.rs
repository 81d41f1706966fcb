//! # OpenSCAD Eval
//!
//! Scoped evaluation of an OpenSCAD AST against a pluggable geometry
//! kernel.
//!
//! ## Architecture
//!
//! ```text
//! openscad-parser (AST) → openscad-eval → GeometryKernel → Geometry
//!                               ↑
//!                   Interrupt (cancel / deadline)
//! ```
//!
//! The evaluator owns no geometry code. A [`GeometryKernel`] turns
//! resolved parameters into opaque geometry; `openscad-mesh` provides the
//! default one.
//!
//! ## Example
//!
//! ```rust,ignore
//! use openscad_eval::{evaluate, EvalOptions};
//!
//! let parsed = openscad_parser::parse_source("cube(10);");
//! let output = evaluate(&parsed.ast, &kernel, EvalOptions::default());
//! assert!(output.is_success());
//! ```

pub mod error;
pub mod evaluator;
pub mod interrupt;
pub mod kernel;
pub mod math;
pub mod output;
pub mod scope;
pub mod value;

pub use error::{ErrorCategory, EvalError, EvalErrorKind, EvalResult, KernelError};
pub use evaluator::{evaluate, EvalOptions, Evaluator};
pub use interrupt::Interrupt;
pub use kernel::{GeometryKernel, KernelResult, Resolution};
pub use output::{EvaluationOutput, Highlight};
pub use scope::Scope;
pub use value::{RangeValue, Value, VectorItems};
