//! # Mesh Operations
//!
//! Operations on meshes and regions: booleans (CSG), hull, Minkowski
//! sums, extrusions, offset, slicing and projection.

pub mod boolean;
pub mod extrude;
pub mod hull;
pub mod minkowski;
pub mod offset;
pub mod planar;
pub mod projection;
pub mod slice;

pub use boolean::{difference, intersection, union};
pub use planar::{difference_regions, intersection_regions, union_regions};
