//! # OpenSCAD Mesh
//!
//! Reference geometry kernel for the OpenSCAD evaluator. Solids are
//! triangle meshes, 2D shapes are planar regions.
//!
//! ## Architecture
//!
//! ```text
//! openscad-eval (GeometryKernel calls) → MeshKernel → Shape → MeshBuffers
//! ```
//!
//! ## Algorithms
//!
//! All algorithms are pure Rust:
//! - **Boolean Operations**: BSP trees (csg.js algorithm); 2D booleans run
//!   on thin slabs and are sliced back
//! - **Triangulation**: Ear clipping with hole bridging
//! - **Hull**: QuickHull (3D), monotone chain (2D)
//! - **Minkowski**: Hull of pairwise sums over convex pieces
//! - **Extrusion, offset, projection**: Direct construction
//!
//! ## Usage
//!
//! ```rust
//! use glam::DVec3;
//! use openscad_eval::GeometryKernel;
//! use openscad_mesh::{MeshKernel, Shape};
//!
//! let kernel = MeshKernel::new();
//! let cube = kernel.cube(DVec3::splat(10.0), false).unwrap();
//! let buffers = cube.to_buffers();
//! assert_eq!(buffers.indices.len(), 36);
//! assert!(matches!(cube, Shape::Solid(_)));
//! ```

pub mod error;
pub mod kernel;
pub mod mesh;
pub mod ops;
pub mod primitives;
pub mod region;
pub mod shape;
pub mod triangulate;

pub use error::{MeshError, MeshResult};
pub use kernel::MeshKernel;
pub use mesh::{Mesh, MeshBuffers, MeshStats};
pub use ops::boolean::{difference, intersection, union};
pub use region::Region;
pub use shape::Shape;
