//! # Geometry Kernel Interface
//!
//! The evaluator never looks inside geometry. It resolves every
//! parameter to plain numbers and hands them to a [`GeometryKernel`],
//! which builds, transforms and combines opaque `Geometry` values.
//!
//! ## Operations
//!
//! | Group | Operations |
//! |-------|------------|
//! | 3D primitives | cube, sphere, cylinder, polyhedron, surface |
//! | 2D primitives | circle, square, polygon, text |
//! | Transforms | transform (copying), transform_in_place, translate, rotate, scale, mirror |
//! | Booleans | union, difference, intersection, hull, minkowski |
//! | Extrusions | linear_extrude, rotate_extrude |
//! | 2D ops | offset, projection |
//! | Other | color, bounds, ensure_initialized |

use config::constants::{
    compute_fragments, DEFAULT_EXTRUDE_SLICES, DEFAULT_FA, DEFAULT_FN, DEFAULT_FS,
};
use glam::{DMat4, DVec2, DVec3};

use crate::error::KernelError;
use crate::math::{mirror_matrix, rotation_about_axis, rotation_xyz};

/// Result of a kernel operation.
pub type KernelResult<T> = Result<T, KernelError>;

// =============================================================================
// PARAMETERS
// =============================================================================

/// `$fn`, `$fa`, `$fs` in effect for a curved primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub fn_: f64,
    pub fa: f64,
    pub fs: f64,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            fn_: DEFAULT_FN,
            fa: DEFAULT_FA,
            fs: DEFAULT_FS,
        }
    }
}

impl Resolution {
    /// Fixed segment count, as with `$fn = n`.
    pub fn segments(count: u32) -> Self {
        Self {
            fn_: count as f64,
            ..Self::default()
        }
    }

    /// Number of segments for a circle of `radius`.
    pub fn fragments(&self, radius: f64) -> u32 {
        compute_fragments(radius, self.fn_, self.fa, self.fs)
    }
}

/// `cylinder(h, r1, r2, center)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderParams {
    pub height: f64,
    pub bottom_radius: f64,
    pub top_radius: f64,
    pub center: bool,
}

/// `linear_extrude(height, center, twist, slices, scale)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearExtrudeParams {
    pub height: f64,
    pub center: bool,
    /// Total twist in degrees.
    pub twist: f64,
    pub slices: u32,
    /// Scale of the top outline relative to the bottom.
    pub scale: DVec2,
}

impl Default for LinearExtrudeParams {
    fn default() -> Self {
        Self {
            height: 1.0,
            center: false,
            twist: 0.0,
            slices: DEFAULT_EXTRUDE_SLICES,
            scale: DVec2::ONE,
        }
    }
}

/// `rotate_extrude(angle)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateExtrudeParams {
    /// Sweep in degrees, 360 for a closed solid.
    pub angle: f64,
    pub resolution: Resolution,
}

/// `offset(r)` or `offset(delta, chamfer)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Offset {
    /// Rounded offset by a radius.
    Round { radius: f64, resolution: Resolution },
    /// Sharp offset; `chamfer` cuts corners instead of extending them.
    Delta { delta: f64, chamfer: bool },
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    Top,
    Center,
    #[default]
    Baseline,
    Bottom,
}

/// `text(text, size, font, halign, valign, spacing)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub text: String,
    pub size: f64,
    pub font: Option<String>,
    pub halign: HAlign,
    pub valign: VAlign,
    pub spacing: f64,
}

// =============================================================================
// KERNEL TRAIT
// =============================================================================

/// A geometry backend.
///
/// Operations take already-evaluated numbers and geometries. Copying
/// transforms borrow their input; `transform_in_place` is the only
/// operation that mutates an existing geometry.
pub trait GeometryKernel {
    /// Opaque geometry handle.
    type Geometry: Clone + Send;

    /// One-time engine setup. Idempotent and safe to race.
    fn ensure_initialized(&self) -> KernelResult<()>;

    /// True once [`ensure_initialized`](Self::ensure_initialized) succeeded.
    fn is_initialized(&self) -> bool;

    // -------------------------------------------------------------------------
    // 3D primitives
    // -------------------------------------------------------------------------

    fn cube(&self, size: DVec3, center: bool) -> KernelResult<Self::Geometry>;

    fn sphere(&self, radius: f64, resolution: Resolution) -> KernelResult<Self::Geometry>;

    fn cylinder(
        &self,
        params: CylinderParams,
        resolution: Resolution,
    ) -> KernelResult<Self::Geometry>;

    fn polyhedron(
        &self,
        points: Vec<DVec3>,
        faces: Vec<Vec<usize>>,
    ) -> KernelResult<Self::Geometry>;

    /// Heightfield: `heights[row][col]` over a unit grid.
    fn surface(&self, heights: Vec<Vec<f64>>, center: bool) -> KernelResult<Self::Geometry>;

    // -------------------------------------------------------------------------
    // 2D primitives
    // -------------------------------------------------------------------------

    fn circle(&self, radius: f64, resolution: Resolution) -> KernelResult<Self::Geometry>;

    fn square(&self, size: DVec2, center: bool) -> KernelResult<Self::Geometry>;

    fn polygon(
        &self,
        points: Vec<DVec2>,
        paths: Option<Vec<Vec<usize>>>,
    ) -> KernelResult<Self::Geometry>;

    fn text(&self, params: TextParams) -> KernelResult<Self::Geometry> {
        let _ = params;
        Err(KernelError::Unsupported("text".to_string()))
    }

    // -------------------------------------------------------------------------
    // Transforms
    // -------------------------------------------------------------------------

    /// Apply a matrix, returning a new geometry.
    fn transform(&self, geometry: &Self::Geometry, matrix: DMat4)
        -> KernelResult<Self::Geometry>;

    /// Apply a matrix to an owned geometry.
    fn transform_in_place(&self, geometry: &mut Self::Geometry, matrix: DMat4) -> KernelResult<()> {
        *geometry = self.transform(geometry, matrix)?;
        Ok(())
    }

    fn translate(&self, geometry: &Self::Geometry, offset: DVec3) -> KernelResult<Self::Geometry> {
        self.transform(geometry, DMat4::from_translation(offset))
    }

    /// Rotate by Euler angles in degrees, X then Y then Z.
    fn rotate(&self, geometry: &Self::Geometry, degrees: DVec3) -> KernelResult<Self::Geometry> {
        self.transform(geometry, rotation_xyz(degrees))
    }

    /// Rotate by `degrees` about `axis`.
    fn rotate_about(
        &self,
        geometry: &Self::Geometry,
        degrees: f64,
        axis: DVec3,
    ) -> KernelResult<Self::Geometry> {
        self.transform(geometry, rotation_about_axis(degrees, axis))
    }

    fn scale(&self, geometry: &Self::Geometry, factors: DVec3) -> KernelResult<Self::Geometry> {
        self.transform(geometry, DMat4::from_scale(factors))
    }

    fn mirror(&self, geometry: &Self::Geometry, normal: DVec3) -> KernelResult<Self::Geometry> {
        self.transform(geometry, mirror_matrix(normal))
    }

    // -------------------------------------------------------------------------
    // Booleans
    // -------------------------------------------------------------------------

    fn union(&self, operands: Vec<Self::Geometry>) -> KernelResult<Self::Geometry>;

    /// First operand minus all others.
    fn difference(&self, operands: Vec<Self::Geometry>) -> KernelResult<Self::Geometry>;

    fn intersection(&self, operands: Vec<Self::Geometry>) -> KernelResult<Self::Geometry>;

    fn hull(&self, operands: Vec<Self::Geometry>) -> KernelResult<Self::Geometry>;

    fn minkowski(&self, operands: Vec<Self::Geometry>) -> KernelResult<Self::Geometry>;

    // -------------------------------------------------------------------------
    // Extrusions and 2D operations
    // -------------------------------------------------------------------------

    fn linear_extrude(
        &self,
        geometry: &Self::Geometry,
        params: LinearExtrudeParams,
    ) -> KernelResult<Self::Geometry>;

    fn rotate_extrude(
        &self,
        geometry: &Self::Geometry,
        params: RotateExtrudeParams,
    ) -> KernelResult<Self::Geometry>;

    fn offset(&self, geometry: &Self::Geometry, offset: Offset) -> KernelResult<Self::Geometry>;

    /// Flatten onto the XY plane; `cut` slices at z = 0 instead.
    fn projection(&self, geometry: &Self::Geometry, cut: bool) -> KernelResult<Self::Geometry>;

    // -------------------------------------------------------------------------
    // Other
    // -------------------------------------------------------------------------

    fn color(&self, geometry: Self::Geometry, rgba: [f32; 4]) -> KernelResult<Self::Geometry>;

    /// Axis-aligned bounds, `None` for empty geometry.
    fn bounds(&self, geometry: &Self::Geometry) -> Option<(DVec3, DVec3)>;
}

/// Scale factors that make `bounds` match `target`.
///
/// Zero target components keep their axis unless `auto` asks to scale it
/// with the largest requested factor.
pub fn resize_factors(min: DVec3, max: DVec3, target: DVec3, auto: [bool; 3]) -> DVec3 {
    let size = max - min;
    let mut factors = DVec3::ONE;
    let mut largest: f64 = 0.0;
    for axis in 0..3 {
        if target[axis] > 0.0 && size[axis] > 0.0 {
            factors[axis] = target[axis] / size[axis];
            largest = largest.max(factors[axis]);
        }
    }
    if largest > 0.0 {
        for axis in 0..3 {
            if target[axis] <= 0.0 && auto[axis] {
                factors[axis] = largest;
            }
        }
    }
    factors
}

// =============================================================================
// TESTS
// =============================================================================
