//! # Mesh Kernel
//!
//! [`GeometryKernel`] implementation over [`Shape`]. 3D operands are
//! triangle meshes, 2D operands are planar regions; operations refuse to
//! mix the two.

use std::sync::OnceLock;

use glam::{DMat4, DVec2, DVec3};
use openscad_eval::kernel::{
    CylinderParams, LinearExtrudeParams, Offset, RotateExtrudeParams,
};
use openscad_eval::{GeometryKernel, KernelError, KernelResult, Resolution};

use crate::error::MeshError;
use crate::ops::boolean::{difference_all, intersection_all, union_all};
use crate::ops::extrude::{linear_extrude, rotate_extrude};
use crate::ops::hull::{hull_meshes, hull_regions};
use crate::ops::minkowski::{minkowski_meshes, minkowski_regions};
use crate::ops::planar::{difference_regions, intersection_regions, union_regions};
use crate::ops::offset::offset as offset_region;
use crate::ops::projection::projection as project;
use crate::primitives;
use crate::region::Region;
use crate::shape::{split_operands, Operands, Shape};

/// Process-wide setup result, shared by every kernel instance.
static INITIALIZED: OnceLock<Result<(), String>> = OnceLock::new();

fn initialize() -> Result<(), String> {
    let threads = std::thread::available_parallelism().map_or(1, |n| n.get());
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("openscad-mesh-{i}"))
        .build_global()
    {
        Ok(()) => tracing::info!(threads, "mesh kernel initialized"),
        // The host configured rayon already; its pool serves as well.
        Err(error) => tracing::debug!(%error, "using existing rayon pool"),
    }
    Ok(())
}

/// Triangle-mesh geometry kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshKernel;

impl MeshKernel {
    pub fn new() -> Self {
        Self
    }
}

fn require_planar<'a>(operation: &str, shape: &'a Shape) -> KernelResult<Option<&'a Region>> {
    match shape {
        Shape::Planar(region) => Ok(Some(region)),
        Shape::Empty => Ok(None),
        Shape::Solid(_) => Err(MeshError::DimensionMismatch(format!(
            "{operation} requires 2D children"
        ))
        .into()),
    }
}

impl GeometryKernel for MeshKernel {
    type Geometry = Shape;

    fn ensure_initialized(&self) -> KernelResult<()> {
        INITIALIZED
            .get_or_init(initialize)
            .clone()
            .map_err(KernelError::Initialization)
    }

    fn is_initialized(&self) -> bool {
        matches!(INITIALIZED.get(), Some(Ok(())))
    }

    // -------------------------------------------------------------------------
    // Primitives
    // -------------------------------------------------------------------------

    fn cube(&self, size: DVec3, center: bool) -> KernelResult<Shape> {
        Ok(Shape::solid(primitives::cube(size, center)))
    }

    fn sphere(&self, radius: f64, resolution: Resolution) -> KernelResult<Shape> {
        Ok(Shape::solid(primitives::sphere(radius, resolution)))
    }

    fn cylinder(&self, params: CylinderParams, resolution: Resolution) -> KernelResult<Shape> {
        Ok(Shape::solid(primitives::cylinder(params, resolution)))
    }

    fn polyhedron(&self, points: Vec<DVec3>, faces: Vec<Vec<usize>>) -> KernelResult<Shape> {
        Ok(Shape::solid(primitives::polyhedron(&points, &faces)?))
    }

    fn surface(&self, heights: Vec<Vec<f64>>, center: bool) -> KernelResult<Shape> {
        Ok(Shape::solid(primitives::surface(&heights, center)?))
    }

    fn circle(&self, radius: f64, resolution: Resolution) -> KernelResult<Shape> {
        Ok(Shape::planar(primitives::circle(radius, resolution)))
    }

    fn square(&self, size: DVec2, center: bool) -> KernelResult<Shape> {
        Ok(Shape::planar(primitives::square(size, center)))
    }

    fn polygon(&self, points: Vec<DVec2>, paths: Option<Vec<Vec<usize>>>) -> KernelResult<Shape> {
        Ok(Shape::planar(primitives::polygon(
            &points,
            paths.as_deref(),
        )?))
    }

    // -------------------------------------------------------------------------
    // Transforms
    // -------------------------------------------------------------------------

    fn transform(&self, geometry: &Shape, matrix: DMat4) -> KernelResult<Shape> {
        let mut shape = geometry.clone();
        shape.transform(&matrix);
        Ok(shape)
    }

    fn transform_in_place(&self, geometry: &mut Shape, matrix: DMat4) -> KernelResult<()> {
        geometry.transform(&matrix);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Booleans
    // -------------------------------------------------------------------------

    fn union(&self, operands: Vec<Shape>) -> KernelResult<Shape> {
        let color = first_color(&operands);
        let shape = match split_operands("union", operands)? {
            Operands::Solids(meshes) => Shape::solid(union_all(meshes)),
            Operands::Planar(regions) => Shape::planar(union_regions(regions)),
            Operands::None => Shape::Empty,
        };
        Ok(with_color(shape, color))
    }

    fn difference(&self, operands: Vec<Shape>) -> KernelResult<Shape> {
        let mut operands = operands.into_iter();
        let Some(first) = operands.next() else {
            return Ok(Shape::Empty);
        };
        if first.is_empty() {
            return Ok(Shape::Empty);
        }
        let color = first.color();
        let shape = match (first, split_operands("difference", operands.collect())?) {
            (first, Operands::None) => first,
            (Shape::Solid(mesh), Operands::Solids(rest)) => {
                Shape::solid(difference_all(mesh, rest))
            }
            (Shape::Planar(region), Operands::Planar(rest)) => {
                Shape::planar(difference_regions(&region, &rest))
            }
            _ => return Err(mismatch("difference")),
        };
        Ok(with_color(shape, color))
    }

    fn intersection(&self, operands: Vec<Shape>) -> KernelResult<Shape> {
        if operands.iter().any(Shape::is_empty) {
            return Ok(Shape::Empty);
        }
        let color = first_color(&operands);
        let shape = match split_operands("intersection", operands)? {
            Operands::Solids(meshes) => Shape::solid(intersection_all(meshes)),
            Operands::Planar(regions) => Shape::planar(intersection_regions(&regions)),
            Operands::None => Shape::Empty,
        };
        Ok(with_color(shape, color))
    }

    fn hull(&self, operands: Vec<Shape>) -> KernelResult<Shape> {
        let color = first_color(&operands);
        let shape = match split_operands("hull", operands)? {
            Operands::Solids(meshes) => Shape::solid(hull_meshes(&meshes)?),
            Operands::Planar(regions) => Shape::planar(hull_regions(&regions)),
            Operands::None => Shape::Empty,
        };
        Ok(with_color(shape, color))
    }

    fn minkowski(&self, operands: Vec<Shape>) -> KernelResult<Shape> {
        let color = first_color(&operands);
        let shape = match split_operands("minkowski", operands)? {
            Operands::Solids(meshes) => Shape::solid(minkowski_meshes(meshes)?),
            Operands::Planar(regions) => Shape::planar(minkowski_regions(regions)),
            Operands::None => Shape::Empty,
        };
        Ok(with_color(shape, color))
    }

    // -------------------------------------------------------------------------
    // Extrusions and 2D operations
    // -------------------------------------------------------------------------

    fn linear_extrude(&self, geometry: &Shape, params: LinearExtrudeParams) -> KernelResult<Shape> {
        Ok(match require_planar("linear_extrude", geometry)? {
            Some(region) => Shape::solid(linear_extrude(region, &params)),
            None => Shape::Empty,
        })
    }

    fn rotate_extrude(&self, geometry: &Shape, params: RotateExtrudeParams) -> KernelResult<Shape> {
        Ok(match require_planar("rotate_extrude", geometry)? {
            Some(region) => Shape::solid(rotate_extrude(region, &params)?),
            None => Shape::Empty,
        })
    }

    fn offset(&self, geometry: &Shape, offset: Offset) -> KernelResult<Shape> {
        Ok(match require_planar("offset", geometry)? {
            Some(region) => Shape::planar(offset_region(region, &offset)),
            None => Shape::Empty,
        })
    }

    fn projection(&self, geometry: &Shape, cut: bool) -> KernelResult<Shape> {
        match geometry {
            Shape::Solid(mesh) => Ok(Shape::planar(project(mesh, cut))),
            Shape::Planar(_) => Err(MeshError::DimensionMismatch(
                "projection requires 3D children".to_string(),
            )
            .into()),
            Shape::Empty => Ok(Shape::Empty),
        }
    }

    // -------------------------------------------------------------------------
    // Other
    // -------------------------------------------------------------------------

    fn color(&self, mut geometry: Shape, rgba: [f32; 4]) -> KernelResult<Shape> {
        geometry.set_color(Some(rgba));
        Ok(geometry)
    }

    fn bounds(&self, geometry: &Shape) -> Option<(DVec3, DVec3)> {
        geometry.bounds()
    }
}

fn first_color(operands: &[Shape]) -> Option<[f32; 4]> {
    operands.iter().find(|s| !s.is_empty()).and_then(Shape::color)
}

fn with_color(mut shape: Shape, color: Option<[f32; 4]>) -> Shape {
    shape.set_color(color);
    shape
}

fn mismatch(operation: &str) -> KernelError {
    MeshError::DimensionMismatch(format!("{operation}: cannot mix 2D and 3D operands")).into()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn volume(shape: &Shape) -> f64 {
        match shape {
            Shape::Solid(mesh) => mesh.volume(),
            _ => 0.0,
        }
    }

    fn area(shape: &Shape) -> f64 {
        match shape {
            Shape::Planar(region) => region.area(),
            _ => 0.0,
        }
    }

    #[test]
    fn test_initialization_is_idempotent() {
        let kernel = MeshKernel::new();
        kernel.ensure_initialized().unwrap();
        kernel.ensure_initialized().unwrap();
        assert!(kernel.is_initialized());
        assert!(MeshKernel.is_initialized());
    }

    #[test]
    fn test_difference_with_itself_is_empty() {
        let kernel = MeshKernel::new();
        let a = kernel.cube(DVec3::splat(10.0), false).unwrap();
        let result = kernel.difference(vec![a.clone(), a]).unwrap();
        assert!(volume(&result).abs() < 1e-6);
    }

    #[test]
    fn test_translate_then_union() {
        let kernel = MeshKernel::new();
        let a = kernel.cube(DVec3::splat(2.0), false).unwrap();
        let b = kernel.translate(&a, DVec3::X).unwrap();
        let result = kernel.union(vec![a, b]).unwrap();
        assert_relative_eq!(volume(&result), 12.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let kernel = MeshKernel::new();
        let solid = kernel.cube(DVec3::ONE, false).unwrap();
        let flat = kernel.square(DVec2::ONE, false).unwrap();
        assert!(matches!(
            kernel.union(vec![solid.clone(), flat.clone()]),
            Err(KernelError::DimensionMismatch(_))
        ));
        assert!(matches!(
            kernel.difference(vec![solid.clone(), flat.clone()]),
            Err(KernelError::DimensionMismatch(_))
        ));
        assert!(kernel.linear_extrude(&solid, LinearExtrudeParams::default()).is_err());
        assert!(kernel.projection(&flat, false).is_err());
    }

    #[test]
    fn test_empty_operands() {
        let kernel = MeshKernel::new();
        let cube = kernel.cube(DVec3::ONE, false).unwrap();
        assert_eq!(kernel.union(vec![]).unwrap(), Shape::Empty);
        assert_eq!(kernel.difference(vec![Shape::Empty, cube.clone()]).unwrap(), Shape::Empty);
        assert_eq!(kernel.intersection(vec![cube.clone(), Shape::Empty]).unwrap(), Shape::Empty);
        assert_relative_eq!(volume(&kernel.union(vec![Shape::Empty, cube]).unwrap()), 1.0);
        assert_eq!(kernel.cube(DVec3::ZERO, false).unwrap(), Shape::Empty);
    }

    #[test]
    fn test_planar_pipeline() {
        let kernel = MeshKernel::new();
        let square = kernel.square(DVec2::splat(4.0), true).unwrap();
        let hole = kernel.circle(1.0, Resolution::segments(32)).unwrap();
        let plate = kernel.difference(vec![square, hole]).unwrap();
        assert!(area(&plate) < 16.0 && area(&plate) > 12.8);

        let params = LinearExtrudeParams {
            height: 2.0,
            ..LinearExtrudeParams::default()
        };
        let solid = kernel.linear_extrude(&plate, params).unwrap();
        assert_relative_eq!(volume(&solid), area(&plate) * 2.0, epsilon = 1e-6);

        let shadow = kernel.projection(&solid, false).unwrap();
        assert_relative_eq!(area(&shadow), area(&plate), epsilon = 1e-6);
    }

    #[test]
    fn test_color_carried_through_boolean() {
        let kernel = MeshKernel::new();
        let red = [1.0, 0.0, 0.0, 1.0];
        let a = kernel.color(kernel.cube(DVec3::ONE, false).unwrap(), red).unwrap();
        let b = kernel.cube(DVec3::splat(0.5), false).unwrap();
        let result = kernel.difference(vec![a, b]).unwrap();
        assert_eq!(result.color(), Some(red));
        assert!(result.is_solid());
    }

    #[test]
    fn test_text_is_unsupported() {
        let kernel = MeshKernel::new();
        let params = openscad_eval::kernel::TextParams {
            text: "hi".into(),
            size: 10.0,
            font: None,
            halign: Default::default(),
            valign: Default::default(),
            spacing: 1.0,
        };
        assert!(matches!(kernel.text(params), Err(KernelError::Unsupported(_))));
    }

    #[test]
    fn test_bounds() {
        let kernel = MeshKernel::new();
        let cube = kernel.cube(DVec3::new(1.0, 2.0, 3.0), true).unwrap();
        let (min, max) = kernel.bounds(&cube).unwrap();
        assert_eq!(min, DVec3::new(-0.5, -1.0, -1.5));
        assert_eq!(max, DVec3::new(0.5, 1.0, 1.5));
        assert!(kernel.bounds(&Shape::Empty).is_none());
    }
}
