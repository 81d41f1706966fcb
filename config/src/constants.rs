//! # Configuration Constants
//!
//! Centralized constants for the evaluator, the reference geometry kernel
//! and the job manager.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point comparison tolerances
//! - **Resolution**: Default tessellation parameters ($fn, $fa, $fs, $t)
//! - **Evaluation limits**: Recursion and materialization bounds
//! - **Job limits**: Timeout clamping

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for floating-point comparisons.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f64, b: f64) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(1.0, 1.0 + 1e-11));
/// ```
pub const EPSILON: f64 = 1e-10;

/// Plane-side tolerance used by the BSP boolean classifier.
///
/// Coarser than [`EPSILON`] because vertices produced by repeated splits
/// accumulate rounding error.
pub const PLANE_EPSILON: f64 = 1e-5;

/// Epsilon for vertex deduplication when welding meshes.
pub const VERTEX_MERGE_EPSILON: f64 = 1e-8;

// =============================================================================
// RESOLUTION CONSTANTS (OpenSCAD $fn, $fa, $fs, $t)
// =============================================================================

/// Default value for $fn (fragment count override).
///
/// When $fn > 0 it fixes the fragment count for circular shapes.
/// When $fn = 0 the count is derived from $fa and $fs.
///
/// ```rust
/// use config::constants::DEFAULT_FN;
///
/// let user_fn: Option<f64> = None;
/// assert_eq!(user_fn.unwrap_or(DEFAULT_FN), 0.0);
/// ```
pub const DEFAULT_FN: f64 = 0.0;

/// Default value for $fa (minimum fragment angle in degrees).
pub const DEFAULT_FA: f64 = 12.0;

/// Default value for $fs (minimum fragment size).
pub const DEFAULT_FS: f64 = 2.0;

/// Default value for $t (animation time).
pub const DEFAULT_T: f64 = 0.0;

/// Minimum fragment count when derived from $fa/$fs.
pub const MIN_FRAGMENTS: u32 = 5;

/// Minimum fragment count when $fn is given explicitly.
pub const MIN_FN_FRAGMENTS: u32 = 3;

/// Maximum number of fragments for any circular shape.
pub const MAX_FRAGMENTS: u32 = 1000;

/// Radii below this value always tessellate with the minimum fragment count.
pub const GRID_FINE: f64 = 0.00000095367431640625;

// =============================================================================
// EVALUATION LIMITS
// =============================================================================

/// Maximum depth of nested function and module calls.
///
/// Exceeding it raises a runtime error instead of overflowing the host stack.
///
/// ```rust
/// use config::constants::MAX_RECURSION_DEPTH;
///
/// assert!(500 < MAX_RECURSION_DEPTH);
/// ```
pub const MAX_RECURSION_DEPTH: usize = 1000;

/// Remaining stack below which the evaluator switches to a fresh segment.
pub const STACKER_RED_ZONE_BYTES: usize = 128 * 1024;

/// Size of each stack segment allocated by `stacker::maybe_grow`.
pub const STACKER_STACK_SIZE_BYTES: usize = 4 * 1024 * 1024;

/// Maximum number of elements a single range may materialize.
///
/// `for (i = [0:1e12])` is rejected with a runtime error instead of
/// exhausting memory.
pub const MAX_RANGE_ELEMENTS: usize = 10_000_000;

/// Maximum number of elements a list comprehension may produce.
pub const MAX_LIST_ELEMENTS: usize = 10_000_000;

/// Maximum nesting of vector values built at runtime.
///
/// Nested vectors are compared, printed and freed recursively, so an
/// accumulator like `f(n - 1, [acc])` is stopped here.
pub const MAX_VECTOR_DEPTH: usize = 1000;

/// Maximum nesting of expressions and statements accepted by the parser.
///
/// ```rust
/// use config::constants::{MAX_NESTING_DEPTH, MAX_RECURSION_DEPTH};
///
/// assert!(MAX_NESTING_DEPTH <= MAX_RECURSION_DEPTH);
/// ```
pub const MAX_NESTING_DEPTH: usize = 1000;

// =============================================================================
// JOB LIMITS
// =============================================================================

/// Timeout applied when a request does not specify one (milliseconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Smallest accepted timeout (milliseconds).
pub const MIN_TIMEOUT_MS: u64 = 1;

/// Largest accepted timeout (milliseconds).
pub const MAX_TIMEOUT_MS: u64 = 600_000;

/// Extra time granted after the deadline before a waiting caller forces
/// the job into the timed-out state (milliseconds).
pub const TIMEOUT_GRACE_MS: u64 = 50;

// =============================================================================
// GEOMETRY CONSTANTS
// =============================================================================

/// Default number of slices for linear_extrude with twist.
pub const DEFAULT_EXTRUDE_SLICES: u32 = 1;

/// Upper bound on linear_extrude slices, given or derived from twist.
pub const MAX_EXTRUDE_SLICES: u32 = MAX_FRAGMENTS;

// =============================================================================
// COLOR CONSTANTS
// =============================================================================

/// Default color when none is specified (light gray), RGBA in [0.0, 1.0].
pub const DEFAULT_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Computes the number of fragments for a circular shape.
///
/// Follows OpenSCAD's resolution formula:
/// - radius below [`GRID_FINE`]: [`MIN_FN_FRAGMENTS`]
/// - `$fn > 0`: `max($fn, 3)`
/// - otherwise: `ceil(max(min(360/$fa, 2*PI*r/$fs), 5))`
///
/// The result never exceeds [`MAX_FRAGMENTS`].
///
/// # Example
///
/// ```rust
/// use config::constants::{compute_fragments, DEFAULT_FA, DEFAULT_FS};
///
/// assert_eq!(compute_fragments(10.0, 32.0, DEFAULT_FA, DEFAULT_FS), 32);
/// assert_eq!(compute_fragments(10.0, 0.0, DEFAULT_FA, DEFAULT_FS), 30);
/// assert_eq!(compute_fragments(1.0, 0.0, DEFAULT_FA, DEFAULT_FS), 5);
/// ```
pub fn compute_fragments(radius: f64, fn_value: f64, fa_value: f64, fs_value: f64) -> u32 {
    if radius.abs() < GRID_FINE || !radius.is_finite() {
        return MIN_FN_FRAGMENTS;
    }
    let fragments = if fn_value > 0.0 {
        (fn_value.floor() as u32).max(MIN_FN_FRAGMENTS)
    } else {
        let fa = if fa_value > 0.0 { fa_value } else { DEFAULT_FA };
        let fs = if fs_value > 0.0 { fs_value } else { DEFAULT_FS };
        let from_angle = 360.0 / fa;
        let from_size = radius.abs() * 2.0 * std::f64::consts::PI / fs;
        from_angle.min(from_size).max(MIN_FRAGMENTS as f64).ceil() as u32
    };
    fragments.min(MAX_FRAGMENTS)
}

/// Clamps a requested timeout into `[MIN_TIMEOUT_MS, MAX_TIMEOUT_MS]`.
///
/// `None` selects [`DEFAULT_TIMEOUT_MS`].
///
/// ```rust
/// use config::constants::{clamp_timeout_ms, MAX_TIMEOUT_MS, DEFAULT_TIMEOUT_MS};
///
/// assert_eq!(clamp_timeout_ms(Some(0)), 1);
/// assert_eq!(clamp_timeout_ms(Some(u64::MAX)), MAX_TIMEOUT_MS);
/// assert_eq!(clamp_timeout_ms(None), DEFAULT_TIMEOUT_MS);
/// ```
pub fn clamp_timeout_ms(requested: Option<u64>) -> u64 {
    requested
        .unwrap_or(DEFAULT_TIMEOUT_MS)
        .clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS)
}
