//! # Shapes
//!
//! The geometry value handed to the evaluator: a solid mesh, a planar
//! region, or nothing.

use glam::{DMat4, DVec3};

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Mesh, MeshBuffers, MeshStats};
use crate::region::Region;
use crate::triangulate::triangulate;

/// Geometry of either dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Shape {
    Solid(Mesh),
    Planar(Region),
    #[default]
    Empty,
}

/// Dimension shared by a set of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Two,
    Three,
}

/// Operands split by dimension.
#[derive(Debug)]
pub enum Operands {
    Solids(Vec<Mesh>),
    Planar(Vec<Region>),
    None,
}

impl Shape {
    pub fn is_empty(&self) -> bool {
        match self {
            Shape::Solid(mesh) => mesh.is_empty(),
            Shape::Planar(region) => region.is_empty(),
            Shape::Empty => true,
        }
    }

    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            Shape::Solid(_) => Some(Dimension::Three),
            Shape::Planar(_) => Some(Dimension::Two),
            Shape::Empty => None,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.dimension() == Some(Dimension::Three)
    }

    pub fn color(&self) -> Option<[f32; 4]> {
        match self {
            Shape::Solid(mesh) => mesh.color(),
            Shape::Planar(region) => region.color(),
            Shape::Empty => None,
        }
    }

    pub fn set_color(&mut self, color: Option<[f32; 4]>) {
        match self {
            Shape::Solid(mesh) => mesh.set_color(color),
            Shape::Planar(region) => region.set_color(color),
            Shape::Empty => {}
        }
    }

    /// Wrap a mesh, collapsing empty results.
    pub fn solid(mesh: Mesh) -> Self {
        if mesh.is_empty() {
            Shape::Empty
        } else {
            Shape::Solid(mesh)
        }
    }

    /// Wrap a region, collapsing empty results.
    pub fn planar(region: Region) -> Self {
        if region.is_empty() {
            Shape::Empty
        } else {
            Shape::Planar(region)
        }
    }

    pub fn transform(&mut self, matrix: &DMat4) {
        match self {
            Shape::Solid(mesh) => mesh.transform(matrix),
            Shape::Planar(region) => region.transform(matrix),
            Shape::Empty => {}
        }
    }

    /// Axis-aligned bounds; regions are flat at z = 0.
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        match self {
            Shape::Solid(mesh) => mesh.bounds(),
            Shape::Planar(region) => region
                .bounds()
                .map(|(min, max)| (min.extend(0.0), max.extend(0.0))),
            Shape::Empty => None,
        }
    }

    /// Region as a flat, single-sided mesh facing +Z.
    pub fn to_mesh(&self) -> Mesh {
        match self {
            Shape::Solid(mesh) => mesh.clone(),
            Shape::Planar(region) => {
                let mut mesh = Mesh::from_triangles(
                    triangulate(region)
                        .into_iter()
                        .map(|tri| tri.map(|p| p.extend(0.0))),
                );
                mesh.set_color(region.color());
                mesh
            }
            Shape::Empty => Mesh::new(),
        }
    }

    pub fn stats(&self) -> MeshStats {
        match self {
            Shape::Solid(mesh) => mesh.stats(),
            other => MeshStats {
                volume: 0.0,
                ..other.to_mesh().stats()
            },
        }
    }

    /// Renderer buffers for either dimension.
    pub fn to_buffers(&self) -> MeshBuffers {
        match self {
            Shape::Solid(mesh) => mesh.to_buffers(),
            other => other.to_mesh().to_buffers(),
        }
    }
}

/// Drop empty operands and check the rest share a dimension.
pub fn split_operands(operation: &str, shapes: Vec<Shape>) -> MeshResult<Operands> {
    let mut solids = Vec::new();
    let mut regions = Vec::new();
    for shape in shapes {
        match shape {
            Shape::Solid(mesh) if !mesh.is_empty() => solids.push(mesh),
            Shape::Planar(region) if !region.is_empty() => regions.push(region),
            _ => {}
        }
    }
    match (solids.is_empty(), regions.is_empty()) {
        (true, true) => Ok(Operands::None),
        (false, true) => Ok(Operands::Solids(solids)),
        (true, false) => Ok(Operands::Planar(regions)),
        (false, false) => Err(MeshError::DimensionMismatch(format!(
            "{operation}: cannot mix 2D and 3D operands"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{cube, square};
    use glam::DVec2;

    #[test]
    fn test_split_rejects_mixed_dimensions() {
        let shapes = vec![
            Shape::Solid(cube(DVec3::ONE, false)),
            Shape::Planar(square(DVec2::ONE, false)),
        ];
        let err = split_operands("union", shapes).unwrap_err();
        assert!(err.to_string().contains("union"));
    }

    #[test]
    fn test_split_skips_empty() {
        let shapes = vec![Shape::Empty, Shape::Planar(square(DVec2::ONE, false))];
        assert!(matches!(
            split_operands("union", shapes),
            Ok(Operands::Planar(regions)) if regions.len() == 1
        ));
        assert!(matches!(
            split_operands("union", vec![Shape::Empty]),
            Ok(Operands::None)
        ));
    }

    #[test]
    fn test_planar_buffers_are_flat() {
        let shape = Shape::Planar(square(DVec2::new(2.0, 3.0), false));
        let buffers = shape.to_buffers();
        assert_eq!(buffers.indices.len(), 6);
        assert!(buffers.positions.chunks(3).all(|p| p[2] == 0.0));
        assert_eq!(shape.stats().face_count, 2);
        let (min, max) = shape.bounds().unwrap();
        assert_eq!(max - min, DVec3::new(2.0, 3.0, 0.0));
    }
}
