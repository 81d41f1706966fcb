//! # Extrusion Operations
//!
//! 2D to 3D:
//! - **linear_extrude**: sweep a region along Z with optional twist and scale
//! - **rotate_extrude**: revolve a region in the XZ plane around Z
//!
//! ## OpenSCAD Compatibility
//!
//! - `linear_extrude(height, center, twist, slices, scale)`
//! - `rotate_extrude(angle)`; the profile's X must not change sign

mod linear;
mod rotate;

#[cfg(test)]
mod tests;

pub use linear::linear_extrude;
pub use rotate::rotate_extrude;
