//! # Primitives
//!
//! Mesh and region generation for the OpenSCAD primitives. Degenerate
//! sizes produce empty geometry rather than errors, matching how
//! OpenSCAD renders `cube(0)` or `circle(-1)`.

mod cube;
mod cylinder;
mod planar;
mod polyhedron;
mod sphere;
mod surface;

pub use cube::cube;
pub use cylinder::cylinder;
pub use planar::{circle, circle_points, polygon, square};
pub use polyhedron::polyhedron;
pub use sphere::sphere;
pub use surface::surface;
