//! # OpenSCAD Script
//!
//! Programmatic front end. Models are built with the chainable [`Solid`]
//! builder or the [`dsl`] free functions and collected into a
//! [`Program`]; both compile to the same AST the text parser produces,
//! so the evaluator treats the two front ends identically.
//!
//! ## Architecture
//!
//! ```text
//! Solid / dsl ─→ Program ─→ Vec<Statement> ─→ openscad-eval
//!                  │
//!                  └─→ JSON (scripting job requests)
//! ```

pub mod dsl;
pub mod error;
pub mod program;
pub mod solid;

pub use error::{ScriptError, ScriptResult};
pub use program::{Item, Program};
pub use solid::{LinearExtrude, Solid};
