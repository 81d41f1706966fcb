//! # Free-Function DSL
//!
//! The [`Solid`] vocabulary as plain functions taking their operands
//! explicitly, for code that reads better as nested calls than as
//! method chains.
//!
//! ```rust
//! use openscad_script::dsl::*;
//!
//! let model = difference([
//!     cube(10.0),
//!     translate([5.0, 5.0, 0.0], cylinder(20.0, 2.0)),
//! ]);
//! assert_eq!(
//!     model.to_source(),
//!     "difference() { cube(10); translate([5, 5, 0]) cylinder(h = 20, r = 2); }",
//! );
//! ```

use openscad_ast::Expression;

use crate::solid::{LinearExtrude, Solid};

// =============================================================================
// PRIMITIVES
// =============================================================================

pub fn cube(size: impl Into<Expression>) -> Solid {
    Solid::cube(size)
}

pub fn sphere(radius: f64) -> Solid {
    Solid::sphere(radius)
}

pub fn cylinder(height: f64, radius: f64) -> Solid {
    Solid::cylinder(height, radius)
}

pub fn cone(height: f64, bottom_radius: f64, top_radius: f64) -> Solid {
    Solid::cone(height, bottom_radius, top_radius)
}

pub fn polyhedron(vertices: &[[f64; 3]], faces: &[Vec<usize>]) -> Solid {
    Solid::polyhedron(vertices, faces)
}

pub fn surface(heights: &[Vec<f64>]) -> Solid {
    Solid::surface(heights)
}

pub fn circle(radius: f64) -> Solid {
    Solid::circle(radius)
}

pub fn square(size: impl Into<Expression>) -> Solid {
    Solid::square(size)
}

pub fn polygon(outline: &[[f64; 2]]) -> Solid {
    Solid::polygon(outline)
}

pub fn polygon_with_paths(vertices: &[[f64; 2]], paths: &[Vec<usize>]) -> Solid {
    Solid::polygon_with_paths(vertices, paths)
}

pub fn text(text: &str, size: f64) -> Solid {
    Solid::text(text, size)
}

// =============================================================================
// TRANSFORMS
// =============================================================================

pub fn translate(offset: [f64; 3], child: Solid) -> Solid {
    child.translate(offset)
}

pub fn rotate(degrees: [f64; 3], child: Solid) -> Solid {
    child.rotate(degrees)
}

pub fn rotate_about(degrees: f64, axis: [f64; 3], child: Solid) -> Solid {
    child.rotate_about(degrees, axis)
}

pub fn scale(factors: [f64; 3], child: Solid) -> Solid {
    child.scale(factors)
}

pub fn mirror(normal: [f64; 3], child: Solid) -> Solid {
    child.mirror(normal)
}

pub fn multmatrix(rows: [[f64; 4]; 4], child: Solid) -> Solid {
    child.multmatrix(rows)
}

pub fn resize(size: [f64; 3], child: Solid) -> Solid {
    child.resize(size)
}

pub fn color(name: &str, child: Solid) -> Solid {
    child.color(name)
}

pub fn color_rgba(rgba: [f64; 4], child: Solid) -> Solid {
    child.color_rgba(rgba)
}

// =============================================================================
// BOOLEANS
// =============================================================================

pub fn union(children: impl IntoIterator<Item = Solid>) -> Solid {
    Solid::combine_all("union", children)
}

/// First child minus the rest.
pub fn difference(children: impl IntoIterator<Item = Solid>) -> Solid {
    Solid::combine_all("difference", children)
}

pub fn intersection(children: impl IntoIterator<Item = Solid>) -> Solid {
    Solid::combine_all("intersection", children)
}

pub fn hull(children: impl IntoIterator<Item = Solid>) -> Solid {
    Solid::combine_all("hull", children)
}

pub fn minkowski(children: impl IntoIterator<Item = Solid>) -> Solid {
    Solid::combine_all("minkowski", children)
}

// =============================================================================
// EXTRUSIONS AND 2D OPERATIONS
// =============================================================================

pub fn linear_extrude(height: f64, child: Solid) -> Solid {
    child.linear_extrude(height)
}

pub fn linear_extrude_with(params: LinearExtrude, child: Solid) -> Solid {
    child.linear_extrude_with(params)
}

pub fn rotate_extrude(degrees: f64, child: Solid) -> Solid {
    child.rotate_extrude(degrees)
}

pub fn offset_round(radius: f64, child: Solid) -> Solid {
    child.offset_round(radius)
}

pub fn offset_delta(delta: f64, chamfer: bool, child: Solid) -> Solid {
    child.offset_delta(delta, chamfer)
}

pub fn projection(cut: bool, child: Solid) -> Solid {
    child.projection(cut)
}
