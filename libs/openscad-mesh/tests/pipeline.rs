//! Source text through the parser, evaluator and mesh kernel.

use approx::assert_relative_eq;
use openscad_eval::{evaluate, EvalOptions, EvaluationOutput};
use openscad_mesh::{MeshKernel, Shape};

fn render(source: &str) -> EvaluationOutput<Shape> {
    let parsed = openscad_parser::parse_source(source);
    assert!(parsed.success(), "parse errors: {:?}", parsed.errors);
    evaluate(&parsed.ast, &MeshKernel::new(), EvalOptions::default())
}

fn solid_volume(source: &str) -> f64 {
    let output = render(source);
    assert!(output.is_success(), "errors: {:?}", output.errors);
    match output.geometry {
        Some(Shape::Solid(mesh)) => {
            assert!(mesh.is_closed(), "mesh of {source:?} is not closed");
            mesh.volume()
        }
        other => panic!("expected a solid, got {other:?}"),
    }
}

#[test]
fn cube_volume() {
    assert_relative_eq!(solid_volume("cube([2, 3, 4]);"), 24.0, epsilon = 1e-9);
}

#[test]
fn self_difference_is_empty() {
    let output = render("difference() { cube(10); cube(10); }");
    assert!(output.is_success());
    let volume = match output.geometry {
        Some(Shape::Solid(mesh)) => mesh.volume(),
        _ => 0.0,
    };
    assert!(volume.abs() < 1e-6);
}

#[test]
fn implicit_union_of_loop() {
    let volume = solid_volume("for (i = [0:2]) translate([i * 2, 0, 0]) cube(1);");
    assert_relative_eq!(volume, 3.0, epsilon = 1e-9);
}

#[test]
fn hollow_box() {
    let volume = solid_volume(
        "difference() { cube(4, center = true); cube([2, 2, 8], center = true); }",
    );
    assert_relative_eq!(volume, 48.0, epsilon = 1e-6);
}

#[test]
fn user_module_with_extrusion() {
    let source = "
        module plate(w, h) linear_extrude(height = h) square(w, center = true);
        plate(3, 2);
    ";
    assert_relative_eq!(solid_volume(source), 18.0, epsilon = 1e-9);
}

#[test]
fn rotate_extrude_ring() {
    let source = "$fn = 64; rotate_extrude() translate([3, 0]) square(1);";
    let volume = solid_volume(source);
    // Pappus: area 1 swept around a centroid radius of 3.5.
    let exact = 2.0 * std::f64::consts::PI * 3.5;
    assert!((volume - exact).abs() / exact < 0.01, "volume {volume}");
}

#[test]
fn hull_of_two_cubes() {
    let volume = solid_volume("hull() { cube(1); translate([3, 0, 0]) cube(1); }");
    assert_relative_eq!(volume, 4.0, epsilon = 1e-9);
}

#[test]
fn planar_model_stays_planar() {
    let output = render("difference() { square(4); translate([1, 1]) square(2); }");
    match output.geometry {
        Some(Shape::Planar(region)) => assert_relative_eq!(region.area(), 12.0, epsilon = 1e-6),
        other => panic!("expected a region, got {other:?}"),
    }
}

#[test]
fn mixing_dimensions_is_a_runtime_error() {
    let output = render("union() { cube(1); square(1); }");
    assert!(!output.is_success());
    assert!(output.geometry.is_none());
}

#[test]
fn text_reports_unsupported() {
    let output = render("text(\"hello\");");
    assert!(!output.is_success());
    assert!(output.errors[0].to_string().contains("text"));
}

fn buffers(source: &str) -> openscad_mesh::MeshBuffers {
    let output = render(source);
    assert!(output.is_success(), "errors: {:?}", output.errors);
    output.geometry.expect("geometry").to_buffers()
}

fn bits(values: &[f32]) -> Vec<u32> {
    values.iter().map(|v| v.to_bits()).collect()
}

fn assert_identical_runs(source: &str) {
    let first = buffers(source);
    let second = buffers(source);
    assert!(!first.indices.is_empty());
    assert_eq!(bits(&first.positions), bits(&second.positions));
    assert_eq!(bits(&first.normals), bits(&second.normals));
    assert_eq!(bits(&first.colors), bits(&second.colors));
    assert_eq!(first.indices, second.indices);
}

#[test]
fn repeated_runs_produce_identical_buffers() {
    assert_identical_runs(
        "
        $fn = 24;
        difference() {
            union() {
                for (i = [0:5]) translate([i * 3, 0, 0]) sphere(2);
                cube([18, 2, 2]);
                cylinder(h = 6, r = 1.5, $fn = 7);
            }
            translate([0, 0, -1]) cylinder(h = 10, r = 1);
        }
        ",
    );
}

#[test]
fn repeated_hull_and_projection_are_identical() {
    assert_identical_runs("hull() { sphere(3, $fn = 16); translate([8, 2, 1]) cube(2); }");
    assert_identical_runs(
        "projection() union() { sphere(4, $fn = 12); translate([3, 0, 0]) cube(4, center = true); }",
    );
}
