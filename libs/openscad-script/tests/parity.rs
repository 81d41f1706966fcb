//! The builder, the DSL and the text parser must drive the evaluator the
//! same way.

use approx::assert_relative_eq;
use openscad_eval::{evaluate, EvalOptions, EvaluationOutput};
use openscad_mesh::{MeshKernel, Shape};
use openscad_script::dsl;
use openscad_script::{Program, Solid};

fn run_program(program: &Program) -> EvaluationOutput<Shape> {
    evaluate(&program.statements(), &MeshKernel::new(), EvalOptions::default())
}

fn run_source(source: &str) -> EvaluationOutput<Shape> {
    let parsed = openscad_parser::parse_source(source);
    assert!(parsed.success(), "parse errors: {:?}", parsed.errors);
    evaluate(&parsed.ast, &MeshKernel::new(), EvalOptions::default())
}

fn stats(output: EvaluationOutput<Shape>) -> (usize, usize, f64) {
    assert!(output.is_success(), "errors: {:?}", output.errors);
    let stats = output.geometry.expect("geometry").stats();
    (stats.vertex_count, stats.face_count, stats.volume)
}

#[test]
fn cube_built_three_ways() {
    let from_text = stats(run_source("cube(10);"));
    let from_builder = stats(run_program(&Program::new().add(Solid::cube(10.0))));
    let from_dsl = stats(run_program(&Program::new().add(dsl::cube(10.0))));
    assert_eq!(from_text.0, 8);
    assert_eq!(from_text, from_builder);
    assert_eq!(from_text, from_dsl);
}

#[test]
fn special_variables_follow_the_same_precedence() {
    let source = "$fn = 8; sphere(r = 5); translate([20, 0, 0]) sphere(r = 5, $fn = 16);";
    let program = Program::new()
        .set("$fn", 8.0)
        .add(Solid::sphere(5.0))
        .add(Solid::sphere(5.0).segments(16).translate([20.0, 0.0, 0.0]));
    assert_eq!(program.to_source().replace('\n', " ").trim_end(), source);
    assert_eq!(stats(run_source(source)), stats(run_program(&program)));
}

#[test]
fn siblings_in_a_combinator_are_unioned() {
    let program = Program::new().add(
        Solid::cube(4.0)
            .difference(&Solid::cube([2.0, 2.0, 8.0]).translate([1.0, 1.0, -1.0])),
    );
    let (_, _, volume) = stats(run_program(&program));
    assert_relative_eq!(volume, 48.0, epsilon = 1e-6);
}

#[test]
fn json_program_evaluates() {
    let program = Program::new()
        .set("w", 3.0)
        .add(Solid::square(openscad_ast::Expression::identifier("w")).linear_extrude(2.0));
    let decoded = Program::from_json(&program.to_json().unwrap()).unwrap();
    let (_, _, volume) = stats(run_program(&decoded));
    assert_relative_eq!(volume, 18.0, epsilon = 1e-9);
}
