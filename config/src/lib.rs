//! # Config Crate
//!
//! Centralized configuration for the OpenSCAD front end and job runner.
//! Magic numbers live in [`constants`]; runtime knobs that a host may
//! override live in [`EngineConfig`].
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{EPSILON, DEFAULT_FN};
//! use config::EngineConfig;
//!
//! let value: f64 = 0.00000000001;
//! assert!(value.abs() < EPSILON);
//! assert_eq!(DEFAULT_FN, 0.0);
//!
//! let engine = EngineConfig::default();
//! assert_eq!(engine.max_recursion_depth, config::constants::MAX_RECURSION_DEPTH);
//! ```

pub mod constants;
mod engine;

pub use engine::{EngineConfig, ExecutionMode, LoopErrorPolicy};
