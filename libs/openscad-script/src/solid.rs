//! # Solid Builder
//!
//! Immutable, chainable wrapper around one module invocation.
//!
//! Every method borrows `self` and returns a new [`Solid`]; a value that
//! was handed out is never changed afterwards.
//!
//! ```rust
//! use openscad_script::Solid;
//!
//! let part = Solid::cube([10.0, 10.0, 2.0])
//!     .difference(&Solid::cylinder(4.0, 1.0).segments(32))
//!     .translate([0.0, 0.0, 5.0]);
//! assert_eq!(
//!     part.to_source(),
//!     "translate([0, 0, 5]) difference() { cube([10, 10, 2]); cylinder(h = 4, r = 1, $fn = 32); }",
//! );
//! ```

use std::fmt;

use openscad_ast::{
    print_statements, Argument, Expression, Modifier, Statement, StatementKind,
};
use serde::{Deserialize, Serialize};

/// A geometry expression built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Solid {
    statement: Statement,
}

/// Parameters of [`Solid::linear_extrude_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearExtrude {
    pub height: f64,
    pub center: bool,
    /// Degrees.
    pub twist: f64,
    pub slices: Option<u32>,
    pub scale: Option<[f64; 2]>,
}

impl Default for LinearExtrude {
    fn default() -> Self {
        Self {
            height: 1.0,
            center: false,
            twist: 0.0,
            slices: None,
            scale: None,
        }
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl Solid {
    /// Invocation of any module, builtin or user-defined.
    pub fn invoke(name: impl Into<String>, args: Vec<Argument>) -> Self {
        Self {
            statement: Statement::invocation(name, args, Vec::new()),
        }
    }

    /// Wrap an existing statement.
    pub fn from_statement(statement: Statement) -> Self {
        Self { statement }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn into_statement(self) -> Statement {
        self.statement
    }

    /// OpenSCAD source for this solid.
    pub fn to_source(&self) -> String {
        print_statements(std::slice::from_ref(&self.statement))
            .trim_end()
            .to_string()
    }

    fn call(&self) -> Option<&openscad_ast::Invocation> {
        match &self.statement.kind {
            StatementKind::Invocation(call) => Some(call),
            _ => None,
        }
    }

    /// Same solid with one more named argument; replaces an argument of
    /// the same name.
    pub fn with_arg(&self, name: &str, value: impl Into<Expression>) -> Self {
        let mut statement = self.statement.clone();
        if let StatementKind::Invocation(call) = &mut statement.kind {
            call.args.retain(|arg| arg.name.as_deref() != Some(name));
            call.args.push(Argument::named(name, value.into()));
        }
        Self { statement }
    }

    /// Wrap `children` in an invocation of `name`.
    fn wrap(name: &str, args: Vec<Argument>, children: Vec<Statement>) -> Self {
        Self {
            statement: Statement::invocation(name, args, children),
        }
    }

    /// Wrap this solid in a transform.
    fn apply(&self, name: &str, args: Vec<Argument>) -> Self {
        Self::wrap(name, args, vec![self.statement.clone()])
    }

    /// Combine with `other`, appending to an existing plain combinator of
    /// the same kind instead of nesting.
    fn combine(&self, name: &str, other: &Solid) -> Self {
        match self.call() {
            Some(call) if call.name == name && call.args.is_empty() && call.modifier.is_none() => {
                let mut children = call.children.clone();
                children.push(other.statement.clone());
                Self::wrap(name, Vec::new(), children)
            }
            _ => Self::wrap(
                name,
                Vec::new(),
                vec![self.statement.clone(), other.statement.clone()],
            ),
        }
    }

    /// Combinator over any number of solids.
    pub fn combine_all(name: &str, solids: impl IntoIterator<Item = Solid>) -> Self {
        Self::wrap(
            name,
            Vec::new(),
            solids.into_iter().map(Solid::into_statement).collect(),
        )
    }
}

fn positional(value: impl Into<Expression>) -> Vec<Argument> {
    vec![Argument::positional(value.into())]
}

fn named(name: &str, value: impl Into<Expression>) -> Argument {
    Argument::named(name, value.into())
}

fn points<const N: usize>(points: &[[f64; N]]) -> Expression {
    Expression::vector(points.iter().map(|p| Expression::numbers(p)).collect())
}

fn index_lists(lists: &[Vec<usize>]) -> Expression {
    Expression::vector(
        lists
            .iter()
            .map(|list| Expression::vector(list.iter().map(|&i| Expression::number(i as f64)).collect()))
            .collect(),
    )
}

// =============================================================================
// PRIMITIVES
// =============================================================================

impl Solid {
    /// `cube(size)`; a scalar or `[x, y, z]`.
    pub fn cube(size: impl Into<Expression>) -> Self {
        Self::invoke("cube", positional(size))
    }

    pub fn sphere(radius: f64) -> Self {
        Self::invoke("sphere", vec![named("r", radius)])
    }

    pub fn cylinder(height: f64, radius: f64) -> Self {
        Self::invoke("cylinder", vec![named("h", height), named("r", radius)])
    }

    /// Cone or frustum.
    pub fn cone(height: f64, bottom_radius: f64, top_radius: f64) -> Self {
        Self::invoke(
            "cylinder",
            vec![
                named("h", height),
                named("r1", bottom_radius),
                named("r2", top_radius),
            ],
        )
    }

    pub fn polyhedron(vertices: &[[f64; 3]], faces: &[Vec<usize>]) -> Self {
        Self::invoke(
            "polyhedron",
            vec![named("points", points(vertices)), named("faces", index_lists(faces))],
        )
    }

    /// Heightfield over a unit grid, `heights[row][col]`.
    pub fn surface(heights: &[Vec<f64>]) -> Self {
        let rows = heights.iter().map(|row| Expression::numbers(row)).collect();
        Self::invoke("surface", vec![named("heights", Expression::vector(rows))])
    }

    pub fn circle(radius: f64) -> Self {
        Self::invoke("circle", vec![named("r", radius)])
    }

    /// `square(size)`; a scalar or `[x, y]`.
    pub fn square(size: impl Into<Expression>) -> Self {
        Self::invoke("square", positional(size))
    }

    pub fn polygon(outline: &[[f64; 2]]) -> Self {
        Self::invoke("polygon", vec![named("points", points(outline))])
    }

    /// Polygon whose first path is the outline and the rest holes.
    pub fn polygon_with_paths(vertices: &[[f64; 2]], paths: &[Vec<usize>]) -> Self {
        Self::invoke(
            "polygon",
            vec![named("points", points(vertices)), named("paths", index_lists(paths))],
        )
    }

    pub fn text(text: &str, size: f64) -> Self {
        Self::invoke("text", vec![named("text", text), named("size", size)])
    }

    /// `center = true`.
    pub fn centered(&self) -> Self {
        self.with_arg("center", true)
    }

    /// `$fn` for this call only.
    pub fn segments(&self, count: u32) -> Self {
        self.with_arg("$fn", count as f64)
    }
}

// =============================================================================
// TRANSFORMS
// =============================================================================

impl Solid {
    pub fn translate(&self, offset: [f64; 3]) -> Self {
        self.apply("translate", positional(offset))
    }

    /// Euler angles in degrees, applied X then Y then Z.
    pub fn rotate(&self, degrees: [f64; 3]) -> Self {
        self.apply("rotate", positional(degrees))
    }

    /// Rotation by `degrees` about `axis`.
    pub fn rotate_about(&self, degrees: f64, axis: [f64; 3]) -> Self {
        self.apply("rotate", vec![named("a", degrees), named("v", axis)])
    }

    pub fn scale(&self, factors: [f64; 3]) -> Self {
        self.apply("scale", positional(factors))
    }

    /// Mirror across the plane through the origin with this normal.
    pub fn mirror(&self, normal: [f64; 3]) -> Self {
        self.apply("mirror", positional(normal))
    }

    /// Row-major 4x4 matrix.
    pub fn multmatrix(&self, rows: [[f64; 4]; 4]) -> Self {
        self.apply("multmatrix", positional(points(&rows)))
    }

    pub fn resize(&self, size: [f64; 3]) -> Self {
        self.apply("resize", positional(size))
    }

    /// Named colour or `#rrggbb` string.
    pub fn color(&self, name: &str) -> Self {
        self.apply("color", positional(name))
    }

    pub fn color_rgba(&self, rgba: [f64; 4]) -> Self {
        self.apply("color", positional(Expression::numbers(&rgba)))
    }
}

// =============================================================================
// BOOLEANS
// =============================================================================

impl Solid {
    pub fn union(&self, other: &Solid) -> Self {
        self.combine("union", other)
    }

    /// This solid minus `other`.
    pub fn difference(&self, other: &Solid) -> Self {
        self.combine("difference", other)
    }

    pub fn intersection(&self, other: &Solid) -> Self {
        self.combine("intersection", other)
    }

    pub fn hull(&self, other: &Solid) -> Self {
        self.combine("hull", other)
    }

    pub fn minkowski(&self, other: &Solid) -> Self {
        self.combine("minkowski", other)
    }
}

// =============================================================================
// EXTRUSIONS AND 2D OPERATIONS
// =============================================================================

impl Solid {
    pub fn linear_extrude(&self, height: f64) -> Self {
        self.apply("linear_extrude", vec![named("height", height)])
    }

    pub fn linear_extrude_with(&self, params: LinearExtrude) -> Self {
        let mut args = vec![named("height", params.height)];
        if params.center {
            args.push(named("center", true));
        }
        if params.twist != 0.0 {
            args.push(named("twist", params.twist));
        }
        if let Some(slices) = params.slices {
            args.push(named("slices", slices as f64));
        }
        if let Some(scale) = params.scale {
            args.push(named("scale", scale));
        }
        self.apply("linear_extrude", args)
    }

    /// Sweep around Z by `degrees`; 360 closes the solid.
    pub fn rotate_extrude(&self, degrees: f64) -> Self {
        self.apply("rotate_extrude", vec![named("angle", degrees)])
    }

    /// Rounded offset.
    pub fn offset_round(&self, radius: f64) -> Self {
        self.apply("offset", vec![named("r", radius)])
    }

    /// Sharp offset, optionally chamfered.
    pub fn offset_delta(&self, delta: f64, chamfer: bool) -> Self {
        self.apply(
            "offset",
            vec![named("delta", delta), named("chamfer", chamfer)],
        )
    }

    pub fn projection(&self, cut: bool) -> Self {
        self.apply("projection", vec![named("cut", cut)])
    }
}

// =============================================================================
// MODIFIERS
// =============================================================================

impl Solid {
    fn modified(&self, modifier: Modifier) -> Self {
        Self {
            statement: self.statement.clone().with_modifier(modifier),
        }
    }

    /// `!`: render only this subtree.
    pub fn root(&self) -> Self {
        self.modified(Modifier::Root)
    }

    /// `#`: keep and highlight.
    pub fn debug(&self) -> Self {
        self.modified(Modifier::Debug)
    }

    /// `%`: show but exclude from the result.
    pub fn background(&self) -> Self {
        self.modified(Modifier::Background)
    }

    /// `*`: skip entirely.
    pub fn disable(&self) -> Self {
        self.modified(Modifier::Disable)
    }
}

impl fmt::Display for Solid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statement)
    }
}

impl From<Solid> for Statement {
    fn from(solid: Solid) -> Self {
        solid.statement
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_is_immutable() {
        let base = Solid::cube(10.0);
        let moved = base.translate([1.0, 2.0, 3.0]);
        let centered = base.centered();
        assert_eq!(base.to_source(), "cube(10);");
        assert_eq!(moved.to_source(), "translate([1, 2, 3]) cube(10);");
        assert_eq!(centered.to_source(), "cube(10, center = true);");
    }

    #[test]
    fn test_chained_combinator_flattens() {
        let a = Solid::cube(1.0);
        let b = Solid::sphere(1.0);
        let c = Solid::circle(1.0).linear_extrude(1.0);
        let merged = a.union(&b).union(&c);
        assert_eq!(
            merged.to_source(),
            "union() { cube(1); sphere(r = 1); linear_extrude(height = 1) circle(r = 1); }"
        );
        // A transformed combinator is its own operand.
        let nested = a.union(&b).translate([1.0, 0.0, 0.0]).union(&c);
        assert!(nested.to_source().starts_with("union() { translate"));
    }

    #[test]
    fn test_with_arg_replaces() {
        let sphere = Solid::sphere(2.0).segments(8).segments(64);
        assert_eq!(sphere.to_source(), "sphere(r = 2, $fn = 64);");
    }

    #[test]
    fn test_modifiers() {
        assert_eq!(Solid::cube(1.0).debug().to_source(), "#cube(1);");
        assert_eq!(
            Solid::cube(1.0).translate([0.0, 0.0, 1.0]).disable().to_source(),
            "*translate([0, 0, 1]) cube(1);"
        );
    }

    #[test]
    fn test_polyhedron_and_extrude_args() {
        let tetra = Solid::polyhedron(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            &[vec![0, 1, 2], vec![0, 3, 1], vec![1, 3, 2], vec![0, 2, 3]],
        );
        assert!(tetra.to_source().contains("faces = [[0, 1, 2], [0, 3, 1]"));

        let twisted = Solid::square(2.0).linear_extrude_with(LinearExtrude {
            height: 5.0,
            twist: 90.0,
            slices: Some(10),
            ..LinearExtrude::default()
        });
        assert_eq!(
            twisted.to_source(),
            "linear_extrude(height = 5, twist = 90, slices = 10) square(2);"
        );
    }
}
