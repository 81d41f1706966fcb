//! # Builtin Modules
//!
//! Primitives, transforms, booleans, extrusions and 2D operations.
//! Every parameter is resolved to plain numbers here before the kernel
//! is called.
//!
//! `$fn`, `$fa` and `$fs` passed as arguments apply to the module itself
//! and to its children.
//!
//! ## OpenSCAD Signature
//!
//! ```text
//! cube(size = 1, center = false)          sphere(r = 1 | d)
//! cylinder(h = 1, r1, r2, center, r, d, d1, d2)
//! polyhedron(points, faces | triangles)   surface(heights, center)
//! circle(r = 1 | d)  square(size = 1, center = false)  polygon(points, paths)
//! text(text, size = 10, font, halign, valign, spacing = 1)
//! translate(v) rotate(a, v) scale(v) mirror(v) multmatrix(m) resize(newsize, auto)
//! color(c, alpha)
//! union() difference() intersection() hull() minkowski()
//! linear_extrude(height = 100, center, convexity, twist, slices, scale)
//! rotate_extrude(angle = 360, convexity)  offset(r | delta, chamfer)  projection(cut)
//! children(index) echo(...) assert(condition, message) group() render()
//! ```

use config::constants::{DEFAULT_EXTRUDE_SLICES, DEFAULT_FA, MAX_EXTRUDE_SLICES};
use glam::{DMat4, DVec2, DVec3};
use openscad_ast::Invocation;

use super::colors::parse_color_string;
use super::statements::is_instantiation;
use super::{Bound, Evaluator, Isolation};
use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::kernel::{
    resize_factors, CylinderParams, GeometryKernel, HAlign, KernelResult, LinearExtrudeParams,
    Offset, Resolution, RotateExtrudeParams, TextParams, VAlign,
};
use crate::math::{matrix_from_rows, mirror_matrix, rotation_about_axis, rotation_xyz};
use crate::scope::Scope;
use crate::value::Value;

// =============================================================================
// BUILTIN MODULE TABLE
// =============================================================================

/// Modules provided by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModule {
    Cube,
    Sphere,
    Cylinder,
    Polyhedron,
    Surface,
    Circle,
    Square,
    Polygon,
    Text,
    Translate,
    Rotate,
    Scale,
    Mirror,
    Multmatrix,
    Resize,
    Color,
    Union,
    Difference,
    Intersection,
    Hull,
    Minkowski,
    LinearExtrude,
    RotateExtrude,
    Offset,
    Projection,
    Children,
    Echo,
    Assert,
    Group,
    Render,
}

impl BuiltinModule {
    /// Look up a builtin module by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "cube" => Self::Cube,
            "sphere" => Self::Sphere,
            "cylinder" => Self::Cylinder,
            "polyhedron" => Self::Polyhedron,
            "surface" => Self::Surface,
            "circle" => Self::Circle,
            "square" => Self::Square,
            "polygon" => Self::Polygon,
            "text" => Self::Text,
            "translate" => Self::Translate,
            "rotate" => Self::Rotate,
            "scale" => Self::Scale,
            "mirror" => Self::Mirror,
            "multmatrix" => Self::Multmatrix,
            "resize" => Self::Resize,
            "color" => Self::Color,
            "union" => Self::Union,
            "difference" => Self::Difference,
            "intersection" => Self::Intersection,
            "hull" => Self::Hull,
            "minkowski" => Self::Minkowski,
            "linear_extrude" => Self::LinearExtrude,
            "rotate_extrude" => Self::RotateExtrude,
            "offset" => Self::Offset,
            "projection" => Self::Projection,
            "children" => Self::Children,
            "echo" => Self::Echo,
            "assert" => Self::Assert,
            "group" => Self::Group,
            "render" => Self::Render,
            _ => return None,
        })
    }

    fn params(self) -> &'static [&'static str] {
        match self {
            Self::Cube | Self::Square => &["size", "center"],
            Self::Sphere | Self::Circle => &["r", "d"],
            Self::Cylinder => &["h", "r1", "r2", "center", "r", "d", "d1", "d2"],
            Self::Polyhedron => &["points", "faces", "convexity", "triangles"],
            Self::Surface => &["heights", "center"],
            Self::Polygon => &["points", "paths", "convexity"],
            Self::Text => &["text", "size", "font", "halign", "valign", "spacing"],
            Self::Translate | Self::Scale | Self::Mirror => &["v"],
            Self::Rotate => &["a", "v"],
            Self::Multmatrix => &["m"],
            Self::Resize => &["newsize", "auto"],
            Self::Color => &["c", "alpha"],
            Self::LinearExtrude => &["height", "center", "convexity", "twist", "slices", "scale"],
            Self::RotateExtrude => &["angle", "convexity"],
            Self::Offset => &["r", "delta", "chamfer"],
            Self::Projection => &["cut"],
            Self::Children => &["index"],
            Self::Render => &["convexity"],
            Self::Union
            | Self::Difference
            | Self::Intersection
            | Self::Hull
            | Self::Minkowski
            | Self::Group => &[],
            Self::Echo | Self::Assert => &[],
        }
    }
}

/// Boolean operators that need at least one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
    Union,
    Difference,
    Intersection,
    Hull,
    Minkowski,
}

impl Combine {
    fn name(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Difference => "difference",
            Self::Intersection => "intersection",
            Self::Hull => "hull",
            Self::Minkowski => "minkowski",
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

impl<K: GeometryKernel> Evaluator<'_, K> {
    /// Evaluate a builtin module invocation.
    pub(super) fn call_builtin_module<'a>(
        &mut self,
        builtin: BuiltinModule,
        invocation: &'a Invocation,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        // echo and assert format their arguments in source order.
        match builtin {
            BuiltinModule::Echo => {
                let line = self.format_echo(&invocation.args, scope)?;
                self.echo(line);
                return self.evaluate_group(&invocation.children, scope);
            }
            BuiltinModule::Assert => {
                self.check_assertion(&invocation.args, scope)?;
                return self.evaluate_group(&invocation.children, scope);
            }
            _ => {}
        }

        let arguments = self.evaluate_arguments(&invocation.args, scope)?;
        let mut call_scope = scope.clone();
        for (name, value) in arguments.specials() {
            call_scope.bind_special(name, value.clone());
        }
        let bound = arguments.bind(&invocation.name, builtin.params())?;
        self.warn_unknown(&bound);
        let scope = &call_scope;

        match builtin {
            BuiltinModule::Cube => {
                let size = size3(&bound, "size", DVec3::ONE)?;
                self.build(self.kernel.cube(size, bound.flag("center")))
            }
            BuiltinModule::Sphere => {
                let radius = radius(&bound, "r", "d")?.unwrap_or(1.0);
                let resolution = self.resolution(scope);
                self.build(self.kernel.sphere(radius, resolution))
            }
            BuiltinModule::Cylinder => {
                let params = cylinder_params(&bound)?;
                let resolution = self.resolution(scope);
                self.build(self.kernel.cylinder(params, resolution))
            }
            BuiltinModule::Polyhedron => {
                let points = point_list(&bound, "points", 3)?
                    .into_iter()
                    .map(|p| DVec3::new(p[0], p[1], p[2]))
                    .collect::<Vec<_>>();
                let faces_param = if bound.is_set("faces") { "faces" } else { "triangles" };
                let faces = index_lists(&bound, faces_param, points.len())?
                    .ok_or_else(|| bound.invalid("faces", "missing"))?;
                self.build(self.kernel.polyhedron(points, faces))
            }
            BuiltinModule::Surface => {
                let heights = height_map(&bound)?;
                self.build(self.kernel.surface(heights, bound.flag("center")))
            }
            BuiltinModule::Circle => {
                let radius = radius(&bound, "r", "d")?.unwrap_or(1.0);
                let resolution = self.resolution(scope);
                self.build(self.kernel.circle(radius, resolution))
            }
            BuiltinModule::Square => {
                let size = size3(&bound, "size", DVec3::ONE)?;
                self.build(self.kernel.square(DVec2::new(size.x, size.y), bound.flag("center")))
            }
            BuiltinModule::Polygon => {
                let points = point_list(&bound, "points", 2)?
                    .into_iter()
                    .map(|p| DVec2::new(p[0], p[1]))
                    .collect::<Vec<_>>();
                let paths = index_lists(&bound, "paths", points.len())?;
                self.build(self.kernel.polygon(points, paths))
            }
            BuiltinModule::Text => {
                let params = text_params(&bound)?;
                self.build(self.kernel.text(params))
            }

            BuiltinModule::Translate => {
                let offset = vector3(&bound, "v")?.unwrap_or(DVec3::ZERO);
                self.transform_children(invocation, scope, DMat4::from_translation(offset))
            }
            BuiltinModule::Rotate => {
                let matrix = rotation(&bound)?;
                self.transform_children(invocation, scope, matrix)
            }
            BuiltinModule::Scale => {
                let factors = match bound.get("v") {
                    None => DVec3::ONE,
                    Some(Value::Number(n)) => DVec3::splat(*n),
                    Some(value) => match value.as_numbers().as_deref() {
                        Some([x, y]) => DVec3::new(*x, *y, 1.0),
                        Some([x, y, z, ..]) => DVec3::new(*x, *y, *z),
                        _ => return Err(bound.invalid("v", "expected a number or vector")),
                    },
                };
                self.transform_children(invocation, scope, DMat4::from_scale(factors))
            }
            BuiltinModule::Mirror => {
                let normal = vector3(&bound, "v")?.unwrap_or(DVec3::X);
                self.transform_children(invocation, scope, mirror_matrix(normal))
            }
            BuiltinModule::Multmatrix => {
                let matrix = match bound.get("m") {
                    None => DMat4::IDENTITY,
                    Some(value) => value
                        .as_vector()
                        .and_then(|rows| rows.iter().map(Value::as_numbers).collect::<Option<Vec<_>>>())
                        .and_then(|rows| matrix_from_rows(&rows))
                        .ok_or_else(|| bound.invalid("m", "expected a 3x4 or 4x4 matrix"))?,
                };
                self.transform_children(invocation, scope, matrix)
            }
            BuiltinModule::Resize => self.resize(&bound, invocation, scope),
            BuiltinModule::Color => self.color(&bound, invocation, scope),

            BuiltinModule::Union => self.combine(Combine::Union, invocation, scope),
            BuiltinModule::Difference => self.combine(Combine::Difference, invocation, scope),
            BuiltinModule::Intersection => self.combine(Combine::Intersection, invocation, scope),
            BuiltinModule::Hull => self.combine(Combine::Hull, invocation, scope),
            BuiltinModule::Minkowski => self.combine(Combine::Minkowski, invocation, scope),

            BuiltinModule::LinearExtrude => {
                let resolution = self.resolution(scope);
                let params = linear_extrude_params(&bound, resolution)?;
                let Some(shape) = self.evaluate_group(&invocation.children, scope)? else {
                    return Ok(None);
                };
                self.build(self.kernel.linear_extrude(&shape, params))
            }
            BuiltinModule::RotateExtrude => {
                let params = RotateExtrudeParams {
                    angle: bound.number_or("angle", 360.0)?.clamp(-360.0, 360.0),
                    resolution: self.resolution(scope),
                };
                let Some(shape) = self.evaluate_group(&invocation.children, scope)? else {
                    return Ok(None);
                };
                self.build(self.kernel.rotate_extrude(&shape, params))
            }
            BuiltinModule::Offset => {
                let offset = match (bound.opt_number("r")?, bound.opt_number("delta")?) {
                    (Some(radius), _) => Offset::Round {
                        radius,
                        resolution: self.resolution(scope),
                    },
                    (None, delta) => Offset::Delta {
                        delta: delta.unwrap_or(1.0),
                        chamfer: bound.flag("chamfer"),
                    },
                };
                let Some(shape) = self.evaluate_group(&invocation.children, scope)? else {
                    return Ok(None);
                };
                self.build(self.kernel.offset(&shape, offset))
            }
            BuiltinModule::Projection => {
                let Some(shape) = self.evaluate_group(&invocation.children, scope)? else {
                    return Ok(None);
                };
                self.build(self.kernel.projection(&shape, bound.flag("cut")))
            }

            BuiltinModule::Children => self.evaluate_children(bound.get("index"), scope),
            BuiltinModule::Group | BuiltinModule::Render => {
                self.evaluate_group(&invocation.children, scope)
            }
            BuiltinModule::Echo | BuiltinModule::Assert => {
                self.evaluate_group(&invocation.children, scope)
            }
        }
    }

    /// Wrap a kernel result.
    fn build(&self, result: KernelResult<K::Geometry>) -> EvalResult<Option<K::Geometry>> {
        result.map(Some).map_err(EvalError::kernel)
    }

    fn transform_children<'a>(
        &mut self,
        invocation: &'a Invocation,
        scope: &Scope<'a>,
        matrix: DMat4,
    ) -> EvalResult<Option<K::Geometry>> {
        let Some(mut geometry) = self.evaluate_group(&invocation.children, scope)? else {
            return Ok(None);
        };
        self.kernel
            .transform_in_place(&mut geometry, matrix)
            .map_err(EvalError::kernel)?;
        Ok(Some(geometry))
    }

    /// Explicit booleans get one operand per child statement.
    fn combine<'a>(
        &mut self,
        op: Combine,
        invocation: &'a Invocation,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        if !invocation.children.iter().any(is_instantiation) {
            return Err(EvalError::new(
                EvalErrorKind::EmptyOperands(op.name().to_string()),
                None,
            ));
        }
        let mut operands =
            self.evaluate_block(&invocation.children, scope, Isolation::PerStatement)?;
        if operands.is_empty() {
            return Ok(None);
        }
        if operands.len() == 1 && op != Combine::Hull {
            return Ok(operands.pop());
        }
        let result = match op {
            Combine::Union => self.kernel.union(operands),
            Combine::Difference => self.kernel.difference(operands),
            Combine::Intersection => self.kernel.intersection(operands),
            Combine::Hull => self.kernel.hull(operands),
            Combine::Minkowski => self.kernel.minkowski(operands),
        };
        self.build(result)
    }

    fn resize<'a>(
        &mut self,
        bound: &Bound<'a>,
        invocation: &'a Invocation,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        let target = size3(bound, "newsize", DVec3::ZERO)?;
        let auto = match bound.get("auto") {
            None => [false; 3],
            Some(Value::Vector(items)) => {
                let flag = |i: usize| items.get(i).is_some_and(Value::is_truthy);
                [flag(0), flag(1), flag(2)]
            }
            Some(value) => [value.is_truthy(); 3],
        };
        let Some(mut geometry) = self.evaluate_group(&invocation.children, scope)? else {
            return Ok(None);
        };
        let Some((min, max)) = self.kernel.bounds(&geometry) else {
            return Ok(Some(geometry));
        };
        let factors = resize_factors(min, max, target, auto);
        self.kernel
            .transform_in_place(&mut geometry, DMat4::from_scale(factors))
            .map_err(EvalError::kernel)?;
        Ok(Some(geometry))
    }

    fn color<'a>(
        &mut self,
        bound: &Bound<'a>,
        invocation: &'a Invocation,
        scope: &Scope<'a>,
    ) -> EvalResult<Option<K::Geometry>> {
        let rgba = match bound.get("c") {
            None => None,
            Some(Value::String(text)) => {
                let parsed = parse_color_string(text);
                if parsed.is_none() {
                    self.warn(format!("color(): unknown color \"{text}\""));
                }
                parsed
            }
            Some(value) => match value.as_numbers().as_deref() {
                Some([r, g, b]) => Some([*r as f32, *g as f32, *b as f32, 1.0]),
                Some([r, g, b, a, ..]) => Some([*r as f32, *g as f32, *b as f32, *a as f32]),
                _ => return Err(bound.invalid("c", "expected a color name or [r, g, b, a]")),
            },
        };
        let alpha = bound.opt_number("alpha")?;

        let Some(geometry) = self.evaluate_group(&invocation.children, scope)? else {
            return Ok(None);
        };
        let Some(mut rgba) = rgba else {
            return Ok(Some(geometry));
        };
        if let Some(alpha) = alpha {
            rgba[3] = alpha as f32;
        }
        self.build(self.kernel.color(geometry, rgba))
    }
}

// =============================================================================
// PARAMETER HELPERS
// =============================================================================

/// A number (all axes) or a 2- or 3-vector; a missing z is 0.
fn size3(bound: &Bound<'_>, param: &str, default: DVec3) -> EvalResult<DVec3> {
    match bound.get(param) {
        None => Ok(default),
        Some(Value::Number(n)) => Ok(DVec3::splat(*n)),
        Some(value) => value
            .as_dvec3()
            .ok_or_else(|| bound.invalid(param, format!("expected a number or vector, got {value}"))),
    }
}

fn vector3(bound: &Bound<'_>, param: &str) -> EvalResult<Option<DVec3>> {
    match bound.get(param) {
        None => Ok(None),
        Some(value) => value
            .as_dvec3()
            .map(Some)
            .ok_or_else(|| bound.invalid(param, format!("expected a vector, got {value}"))),
    }
}

/// Radius from `r`, or half of the diameter `d`; `d` wins when both are
/// given.
fn radius(bound: &Bound<'_>, r: &str, d: &str) -> EvalResult<Option<f64>> {
    if let Some(diameter) = bound.opt_number(d)? {
        return Ok(Some(diameter / 2.0));
    }
    bound.opt_number(r)
}

fn cylinder_params(bound: &Bound<'_>) -> EvalResult<CylinderParams> {
    let common = radius(bound, "r", "d")?;
    let bottom = radius(bound, "r1", "d1")?.or(common).unwrap_or(1.0);
    let top = radius(bound, "r2", "d2")?.or(common).unwrap_or(1.0);
    Ok(CylinderParams {
        height: bound.number_or("h", 1.0)?,
        bottom_radius: bottom,
        top_radius: top,
        center: bound.flag("center"),
    })
}

fn rotation(bound: &Bound<'_>) -> EvalResult<DMat4> {
    match bound.get("a") {
        None => Ok(DMat4::IDENTITY),
        Some(Value::Number(angle)) => match vector3(bound, "v")? {
            Some(axis) => Ok(rotation_about_axis(*angle, axis)),
            None => Ok(rotation_xyz(DVec3::new(0.0, 0.0, *angle))),
        },
        Some(value) => match value.as_numbers().as_deref() {
            Some([x]) => Ok(rotation_xyz(DVec3::new(*x, 0.0, 0.0))),
            Some([x, y]) => Ok(rotation_xyz(DVec3::new(*x, *y, 0.0))),
            Some([x, y, z, ..]) => Ok(rotation_xyz(DVec3::new(*x, *y, *z))),
            _ => Err(bound.invalid("a", format!("expected a number or vector, got {value}"))),
        },
    }
}

/// A list of points with at least `dims` numeric coordinates each.
fn point_list(bound: &Bound<'_>, param: &str, dims: usize) -> EvalResult<Vec<Vec<f64>>> {
    let value = bound.get(param).ok_or_else(|| bound.invalid(param, "missing"))?;
    value
        .as_vector()
        .and_then(|points| {
            points
                .iter()
                .map(|p| p.as_numbers().filter(|coords| coords.len() >= dims))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| bound.invalid(param, format!("expected a list of {dims}D points")))
}

/// Lists of point indices, each below `count`.
fn index_lists(bound: &Bound<'_>, param: &str, count: usize) -> EvalResult<Option<Vec<Vec<usize>>>> {
    let Some(value) = bound.get(param) else {
        return Ok(None);
    };
    let invalid = || bound.invalid(param, format!("expected lists of indices below {count}"));
    let lists = value.as_vector().ok_or_else(invalid)?;
    lists
        .iter()
        .map(|list| -> EvalResult<Vec<usize>> {
            let numbers = list.as_numbers().ok_or_else(invalid)?;
            numbers
                .into_iter()
                .map(|n| {
                    if n >= 0.0 && n.fract() == 0.0 && (n as usize) < count {
                        Ok(n as usize)
                    } else {
                        Err(invalid())
                    }
                })
                .collect()
        })
        .collect::<EvalResult<Vec<_>>>()
        .map(Some)
}

fn height_map(bound: &Bound<'_>) -> EvalResult<Vec<Vec<f64>>> {
    let invalid = || bound.invalid("heights", "expected a rectangular matrix of numbers");
    let rows = bound
        .get("heights")
        .and_then(Value::as_vector)
        .ok_or_else(invalid)?
        .iter()
        .map(|row| row.as_numbers().ok_or_else(invalid))
        .collect::<EvalResult<Vec<_>>>()?;
    let width = rows.first().map_or(0, Vec::len);
    if rows.len() < 2 || width < 2 || rows.iter().any(|row| row.len() != width) {
        return Err(invalid());
    }
    Ok(rows)
}

fn text_params(bound: &Bound<'_>) -> EvalResult<TextParams> {
    let text = bound
        .get("text")
        .map(Value::to_plain_string)
        .ok_or_else(|| bound.invalid("text", "missing"))?;
    let halign = match bound.get("halign").and_then(Value::as_str) {
        None | Some("left") => HAlign::Left,
        Some("center") => HAlign::Center,
        Some("right") => HAlign::Right,
        Some(other) => return Err(bound.invalid("halign", format!("unknown alignment \"{other}\""))),
    };
    let valign = match bound.get("valign").and_then(Value::as_str) {
        None | Some("baseline") => VAlign::Baseline,
        Some("top") => VAlign::Top,
        Some("center") => VAlign::Center,
        Some("bottom") => VAlign::Bottom,
        Some(other) => return Err(bound.invalid("valign", format!("unknown alignment \"{other}\""))),
    };
    Ok(TextParams {
        text,
        size: bound.number_or("size", 10.0)?,
        font: bound.get("font").and_then(Value::as_str).map(str::to_string),
        halign,
        valign,
        spacing: bound.number_or("spacing", 1.0)?,
    })
}

fn linear_extrude_params(bound: &Bound<'_>, resolution: Resolution) -> EvalResult<LinearExtrudeParams> {
    let twist = bound.number_or("twist", 0.0)?;
    let max_slices = f64::from(MAX_EXTRUDE_SLICES);
    let slices = match bound.opt_number("slices")? {
        Some(n) => n.max(1.0).min(max_slices) as u32,
        None if twist != 0.0 => {
            let per_turn = if resolution.fn_ > 0.0 {
                resolution.fn_
            } else {
                360.0 / resolution.fa.max(DEFAULT_FA / 4.0)
            };
            (twist.abs() / 360.0 * per_turn).ceil().max(1.0).min(max_slices) as u32
        }
        None => DEFAULT_EXTRUDE_SLICES,
    };
    let scale = match bound.get("scale") {
        None => DVec2::ONE,
        Some(Value::Number(n)) => DVec2::splat(*n),
        Some(value) => value
            .as_dvec2()
            .ok_or_else(|| bound.invalid("scale", "expected a number or [x, y]"))?,
    };
    Ok(LinearExtrudeParams {
        height: bound.number_or("height", 100.0)?,
        center: bound.flag("center"),
        twist,
        slices,
        scale,
    })
}
