//! Recording kernel for evaluator tests.
//!
//! Geometry is a tree of [`Node`]s mirroring the kernel calls, so tests
//! can assert on exactly what the evaluator asked for.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::{DMat4, DVec2, DVec3};

use crate::error::KernelError;
use crate::kernel::{
    CylinderParams, GeometryKernel, KernelResult, LinearExtrudeParams, Offset, Resolution,
    RotateExtrudeParams, TextParams,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Cube { size: DVec3, center: bool },
    Sphere { radius: f64, fragments: u32 },
    Cylinder { params: CylinderParams, fragments: u32 },
    Polyhedron { points: Vec<DVec3>, faces: Vec<Vec<usize>> },
    Surface { heights: Vec<Vec<f64>>, center: bool },
    Circle { radius: f64, fragments: u32 },
    Square { size: DVec2, center: bool },
    Polygon { points: Vec<DVec2>, paths: Option<Vec<Vec<usize>>> },
    Transform { matrix: DMat4, child: Box<Node> },
    Union(Vec<Node>),
    Difference(Vec<Node>),
    Intersection(Vec<Node>),
    Hull(Vec<Node>),
    Minkowski(Vec<Node>),
    LinearExtrude { params: LinearExtrudeParams, child: Box<Node> },
    RotateExtrude { angle: f64, fragments: u32, child: Box<Node> },
    Offset { offset: Offset, child: Box<Node> },
    Projection { cut: bool, child: Box<Node> },
    Color { rgba: [f32; 4], child: Box<Node> },
}

impl Node {
    /// The transform matrix and child, if this is a transform.
    pub fn as_transform(&self) -> Option<(DMat4, &Node)> {
        match self {
            Node::Transform { matrix, child } => Some((*matrix, child)),
            _ => None,
        }
    }

    /// Operands of a union.
    pub fn union_operands(&self) -> Option<&[Node]> {
        match self {
            Node::Union(children) => Some(children),
            _ => None,
        }
    }
}

/// Kernel building [`Node`] trees.
#[derive(Debug, Default)]
pub struct RecordingKernel {
    initialized: AtomicBool,
    fail_initialization: bool,
}

impl RecordingKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A kernel whose initialization always fails.
    pub fn broken() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            fail_initialization: true,
        }
    }
}

fn corners(min: DVec3, max: DVec3) -> [DVec3; 8] {
    let mut out = [DVec3::ZERO; 8];
    for (i, corner) in out.iter_mut().enumerate() {
        *corner = DVec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        );
    }
    out
}

fn merge(bounds: impl Iterator<Item = (DVec3, DVec3)>) -> Option<(DVec3, DVec3)> {
    bounds.reduce(|(amin, amax), (bmin, bmax)| (amin.min(bmin), amax.max(bmax)))
}

impl GeometryKernel for RecordingKernel {
    type Geometry = Node;

    fn ensure_initialized(&self) -> KernelResult<()> {
        if self.fail_initialization {
            return Err(KernelError::Initialization("recording kernel refused".into()));
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn cube(&self, size: DVec3, center: bool) -> KernelResult<Node> {
        Ok(Node::Cube { size, center })
    }

    fn sphere(&self, radius: f64, resolution: Resolution) -> KernelResult<Node> {
        Ok(Node::Sphere {
            radius,
            fragments: resolution.fragments(radius),
        })
    }

    fn cylinder(&self, params: CylinderParams, resolution: Resolution) -> KernelResult<Node> {
        Ok(Node::Cylinder {
            params,
            fragments: resolution.fragments(params.bottom_radius.max(params.top_radius)),
        })
    }

    fn polyhedron(&self, points: Vec<DVec3>, faces: Vec<Vec<usize>>) -> KernelResult<Node> {
        Ok(Node::Polyhedron { points, faces })
    }

    fn surface(&self, heights: Vec<Vec<f64>>, center: bool) -> KernelResult<Node> {
        Ok(Node::Surface { heights, center })
    }

    fn circle(&self, radius: f64, resolution: Resolution) -> KernelResult<Node> {
        Ok(Node::Circle {
            radius,
            fragments: resolution.fragments(radius),
        })
    }

    fn square(&self, size: DVec2, center: bool) -> KernelResult<Node> {
        Ok(Node::Square { size, center })
    }

    fn polygon(&self, points: Vec<DVec2>, paths: Option<Vec<Vec<usize>>>) -> KernelResult<Node> {
        Ok(Node::Polygon { points, paths })
    }

    fn text(&self, params: TextParams) -> KernelResult<Node> {
        Err(KernelError::Unsupported(format!("text(\"{}\")", params.text)))
    }

    fn transform(&self, geometry: &Node, matrix: DMat4) -> KernelResult<Node> {
        Ok(Node::Transform {
            matrix,
            child: Box::new(geometry.clone()),
        })
    }

    fn union(&self, operands: Vec<Node>) -> KernelResult<Node> {
        Ok(Node::Union(operands))
    }

    fn difference(&self, operands: Vec<Node>) -> KernelResult<Node> {
        Ok(Node::Difference(operands))
    }

    fn intersection(&self, operands: Vec<Node>) -> KernelResult<Node> {
        Ok(Node::Intersection(operands))
    }

    fn hull(&self, operands: Vec<Node>) -> KernelResult<Node> {
        Ok(Node::Hull(operands))
    }

    fn minkowski(&self, operands: Vec<Node>) -> KernelResult<Node> {
        Ok(Node::Minkowski(operands))
    }

    fn linear_extrude(&self, geometry: &Node, params: LinearExtrudeParams) -> KernelResult<Node> {
        Ok(Node::LinearExtrude {
            params,
            child: Box::new(geometry.clone()),
        })
    }

    fn rotate_extrude(&self, geometry: &Node, params: RotateExtrudeParams) -> KernelResult<Node> {
        Ok(Node::RotateExtrude {
            angle: params.angle,
            fragments: params.resolution.fragments(1.0),
            child: Box::new(geometry.clone()),
        })
    }

    fn offset(&self, geometry: &Node, offset: Offset) -> KernelResult<Node> {
        Ok(Node::Offset {
            offset,
            child: Box::new(geometry.clone()),
        })
    }

    fn projection(&self, geometry: &Node, cut: bool) -> KernelResult<Node> {
        Ok(Node::Projection {
            cut,
            child: Box::new(geometry.clone()),
        })
    }

    fn color(&self, geometry: Node, rgba: [f32; 4]) -> KernelResult<Node> {
        Ok(Node::Color {
            rgba,
            child: Box::new(geometry),
        })
    }

    fn bounds(&self, geometry: &Node) -> Option<(DVec3, DVec3)> {
        match geometry {
            Node::Cube { size, center } => {
                let min = if *center { -*size / 2.0 } else { DVec3::ZERO };
                Some((min, min + *size))
            }
            Node::Sphere { radius, .. } => Some((DVec3::splat(-radius), DVec3::splat(*radius))),
            Node::Square { size, center } => {
                let size = size.extend(0.0);
                let min = if *center { -size / 2.0 } else { DVec3::ZERO };
                Some((min, min + size))
            }
            Node::Transform { matrix, child } => {
                let (min, max) = self.bounds(child)?;
                merge(corners(min, max).into_iter().map(|c| {
                    let p = matrix.transform_point3(c);
                    (p, p)
                }))
            }
            Node::Color { child, .. } => self.bounds(child),
            Node::Union(children) | Node::Hull(children) => {
                merge(children.iter().filter_map(|c| self.bounds(c)))
            }
            _ => None,
        }
    }
}
