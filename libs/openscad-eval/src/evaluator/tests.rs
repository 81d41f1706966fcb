//! Source-level evaluator tests against the recording kernel.

use std::time::{Duration, Instant};

use config::constants::MAX_EXTRUDE_SLICES;
use config::{EngineConfig, LoopErrorPolicy};
use glam::{DMat4, DVec3};
use openscad_ast::Modifier;

use super::testing::{Node, RecordingKernel};
use super::{evaluate, EvalOptions};
use crate::error::{ErrorCategory, EvalErrorKind};
use crate::interrupt::Interrupt;
use crate::output::EvaluationOutput;

fn run_with(source: &str, options: EvalOptions) -> EvaluationOutput<Node> {
    let parsed = openscad_parser::parse_source(source);
    assert!(parsed.success(), "parse errors: {:?}", parsed.errors);
    evaluate(&parsed.ast, &RecordingKernel::new(), options)
}

fn run(source: &str) -> EvaluationOutput<Node> {
    run_with(source, EvalOptions::default())
}

fn with_config(config: EngineConfig) -> EvalOptions {
    EvalOptions {
        config,
        ..EvalOptions::default()
    }
}

fn first_error_kind(output: &EvaluationOutput<Node>) -> &EvalErrorKind {
    &output.errors.first().expect("an error was recorded").kind
}

// =============================================================================
// PRIMITIVES AND SPECIAL VARIABLES
// =============================================================================

#[test]
fn test_single_primitive() {
    let output = run("cube([1, 2, 3], center = true);");
    assert!(output.is_success());
    assert_eq!(
        output.geometry,
        Some(Node::Cube {
            size: DVec3::new(1.0, 2.0, 3.0),
            center: true
        })
    );
}

#[test]
fn test_top_level_results_are_unioned() {
    let output = run("cube(1); sphere(2);");
    let operands = output.geometry.as_ref().and_then(Node::union_operands).unwrap();
    assert_eq!(operands.len(), 2);
}

#[test]
fn test_default_resolution() {
    let output = run("sphere(5);");
    assert_eq!(
        output.geometry,
        Some(Node::Sphere {
            radius: 5.0,
            fragments: 16
        })
    );
}

#[test]
fn test_call_argument_overrides_global_fn() {
    let output = run("$fn = 8; sphere(5, $fn = 32);");
    assert_eq!(
        output.geometry,
        Some(Node::Sphere {
            radius: 5.0,
            fragments: 32
        })
    );
}

#[test]
fn test_global_fn_applies_without_argument() {
    let output = run("$fn = 8; sphere(d = 4);");
    assert_eq!(
        output.geometry,
        Some(Node::Sphere {
            radius: 2.0,
            fragments: 8
        })
    );
}

#[test]
fn test_pinned_special_ignores_local_assignment() {
    let output = run("module m() { $fn = 8; sphere(1); } m($fn = 32);");
    assert_eq!(
        output.geometry,
        Some(Node::Sphere {
            radius: 1.0,
            fragments: 32
        })
    );
    assert!(output.warnings.iter().any(|w| w.contains("$fn")));
}

#[test]
fn test_local_special_assignment_without_argument() {
    let output = run("module m() { $fn = 8; sphere(1); } m();");
    assert_eq!(
        output.geometry,
        Some(Node::Sphere {
            radius: 1.0,
            fragments: 8
        })
    );
}

#[test]
fn test_transform_wraps_child() {
    let output = run("translate([1, 2, 3]) cube(1);");
    let geometry = output.geometry.unwrap();
    let (matrix, child) = geometry.as_transform().unwrap();
    assert_eq!(matrix, DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0)));
    assert!(matches!(child, Node::Cube { .. }));
}

#[test]
fn test_transform_without_children_is_empty() {
    let output = run("translate([1, 0, 0]);");
    assert!(output.is_success());
    assert_eq!(output.geometry, None);
}

#[test]
fn test_resize_uses_bounds() {
    let output = run("resize([20, 0, 0], auto = [false, true, false]) cube([10, 5, 2]);");
    let geometry = output.geometry.unwrap();
    let (matrix, _) = geometry.as_transform().unwrap();
    assert_eq!(matrix, DMat4::from_scale(DVec3::new(2.0, 2.0, 1.0)));
}

#[test]
fn test_linear_extrude_slices_are_clamped() {
    let slices_of = |source: &str| match run(source).geometry {
        Some(Node::LinearExtrude { params, .. }) => params.slices,
        other => panic!("expected an extrusion, got {other:?}"),
    };
    assert_eq!(
        slices_of("linear_extrude(height = 1, slices = 1e9) square(1);"),
        MAX_EXTRUDE_SLICES
    );
    assert_eq!(
        slices_of("linear_extrude(height = 1, twist = 1e9) square(1);"),
        MAX_EXTRUDE_SLICES
    );
    assert_eq!(slices_of("linear_extrude(height = 1, slices = 0) square(1);"), 1);
    assert_eq!(slices_of("linear_extrude(height = 1, slices = 7) square(1);"), 7);
}

#[test]
fn test_named_color() {
    let output = run("color(\"red\") cube(1);");
    match output.geometry {
        Some(Node::Color { rgba, child }) => {
            assert_eq!(rgba, [1.0, 0.0, 0.0, 1.0]);
            assert!(matches!(*child, Node::Cube { .. }));
        }
        other => panic!("expected a colored cube, got {other:?}"),
    }
}

#[test]
fn test_unknown_color_warns_and_keeps_geometry() {
    let output = run("color(\"nosuchcolor\") cube(1);");
    assert!(output.is_success());
    assert!(matches!(output.geometry, Some(Node::Cube { .. })));
    assert!(output.warnings.iter().any(|w| w.contains("nosuchcolor")));
}

// =============================================================================
// BOOLEANS
// =============================================================================

#[test]
fn test_empty_union_is_an_error() {
    let output = run("union() {}");
    assert_eq!(
        first_error_kind(&output),
        &EvalErrorKind::EmptyOperands("union".to_string())
    );
    assert_eq!(output.geometry, None);
}

#[test]
fn test_difference_gets_one_operand_per_child() {
    let output = run("difference() { cube(10); translate([1, 1, 1]) cube(2); sphere(1); }");
    match output.geometry {
        Some(Node::Difference(operands)) => assert_eq!(operands.len(), 3),
        other => panic!("expected a difference, got {other:?}"),
    }
}

#[test]
fn test_single_operand_passes_through() {
    let output = run("intersection() { cube(1); }");
    assert!(matches!(output.geometry, Some(Node::Cube { .. })));
}

#[test]
fn test_intersection_for_intersects_iterations() {
    let output = run("intersection_for (i = [0 : 2]) translate([i, 0, 0]) cube(5);");
    match output.geometry {
        Some(Node::Intersection(operands)) => assert_eq!(operands.len(), 3),
        other => panic!("expected an intersection, got {other:?}"),
    }
}

#[test]
fn test_empty_iterations_contribute_nothing() {
    let output = run("intersection_for (i = [0 : 3]) if (i % 2 == 0) translate([i, 0, 0]) cube(5);");
    match output.geometry {
        Some(Node::Intersection(operands)) => assert_eq!(operands.len(), 2),
        other => panic!("expected an intersection, got {other:?}"),
    }

    let output = run("for (i = [0 : 3]) if (i == 2) cube(i);");
    assert!(matches!(output.geometry, Some(Node::Cube { .. })));

    let output = run("for (i = [0 : 99999]) {} cube(1);");
    assert!(output.is_success(), "{:?}", output.errors);
    assert!(matches!(output.geometry, Some(Node::Cube { .. })));
}

// =============================================================================
// USER MODULES AND CHILDREN
// =============================================================================

#[test]
fn test_children_selection() {
    let output = run("module second() { children(1); } second() { cube(1); sphere(2); }");
    assert!(matches!(output.geometry, Some(Node::Sphere { radius, .. }) if radius == 2.0));
}

#[test]
fn test_all_children_are_unioned() {
    let output = run("module all() { children(); } all() { cube(1); sphere(2); }");
    let operands = output.geometry.as_ref().and_then(Node::union_operands).unwrap();
    assert_eq!(operands.len(), 2);
}

#[test]
fn test_children_count_and_out_of_range_index() {
    let output = run("module m() { echo($children); children(5); } m() { cube(1); cube(2); }");
    assert_eq!(output.echoes, vec!["2"]);
    assert_eq!(output.geometry, None);
    assert!(output.warnings.iter().any(|w| w.contains("out of range")));
}

#[test]
fn test_children_see_specials_of_the_module_call() {
    let output = run("module m() { children(); } $fn = 8; m($fn = 32) sphere(1);");
    assert_eq!(
        output.geometry,
        Some(Node::Sphere {
            radius: 1.0,
            fragments: 32
        })
    );
}

#[test]
fn test_children_use_caller_variables() {
    let output = run("size = 3; module m() { size = 10; children(); } m() cube(size);");
    assert_eq!(
        output.geometry,
        Some(Node::Cube {
            size: DVec3::splat(3.0),
            center: false
        })
    );
}

#[test]
fn test_user_module_shadows_builtin() {
    let output = run("module cube(s) { sphere(s); } cube(4);");
    assert!(matches!(output.geometry, Some(Node::Sphere { radius, .. }) if radius == 4.0));
}

#[test]
fn test_definitions_are_hoisted() {
    let output = run("echo(double(4)); function double(x) = 2 * x;");
    assert_eq!(output.echoes, vec!["8"]);
}

// =============================================================================
// FUNCTIONS AND EXPRESSIONS
// =============================================================================

#[test]
fn test_echo_formats_named_arguments() {
    let output = run("echo(\"a\", x = 1 + 1, v = [1, 2.5]);");
    assert_eq!(output.echoes, vec!["\"a\", x = 2, v = [1, 2.5]"]);
}

#[test]
fn test_closures_capture_their_environment() {
    let output = run("add = function(a) function(b) a + b; echo(add(2)(3));");
    assert_eq!(output.echoes, vec!["5"]);
}

#[test]
fn test_default_parameter_sees_earlier_parameter() {
    let output = run("function f(a, b = a * 2) = a + b; echo(f(1), f(1, b = 5));");
    assert_eq!(output.echoes, vec!["3, 6"]);
}

#[test]
fn test_tail_recursive_sum_over_long_list() {
    let source = "function sum(v, i = 0, acc = 0) = i == len(v) ? acc : sum(v, i + 1, acc + v[i]);\n\
                  echo(sum([for (i = [1 : 5000]) i]));";
    let output = run(source);
    assert!(output.is_success(), "{:?}", output.errors);
    assert_eq!(output.echoes, vec!["12502500"]);
}

#[test]
fn test_recursion_limit_reported_once() {
    let mut config = EngineConfig::default();
    config.max_recursion_depth = 50;
    let output = run_with(
        "function f(n) = n <= 0 ? 0 : 1 + f(n - 1); x = f(500); cube(1);",
        with_config(config),
    );
    assert_eq!(output.errors.len(), 1);
    assert_eq!(first_error_kind(&output), &EvalErrorKind::RecursionLimit(50));
}

#[test]
fn test_module_recursion_limit() {
    let mut config = EngineConfig::default();
    config.max_recursion_depth = 20;
    let output = run_with("module r(n) { r(n + 1); } r(0);", with_config(config));
    assert_eq!(output.errors.len(), 1);
    assert_eq!(first_error_kind(&output), &EvalErrorKind::RecursionLimit(20));
}

#[test]
fn test_tail_call_accumulator_stops_at_vector_depth() {
    let output = run("function f(n, acc = []) = n == 0 ? acc : f(n - 1, [acc]); v = f(100000); cube(1);");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(
        first_error_kind(&output),
        &EvalErrorKind::VectorTooDeep {
            depth: 1001,
            limit: 1000
        }
    );
    assert!(output.geometry.is_some());
}

#[test]
fn test_vector_depth_limit_is_configurable() {
    let mut config = EngineConfig::default();
    config.max_vector_depth = 3;
    let output = run_with("echo([[[1]]]); echo([for (i = [0 : 1]) [[[i]]]]);", with_config(config));
    assert_eq!(output.echoes, vec!["[[[1]]]"]);
    assert!(matches!(
        first_error_kind(&output),
        EvalErrorKind::VectorTooDeep { depth: 4, limit: 3 }
    ));
}

#[test]
fn test_long_closure_chain_is_released() {
    let output = run("function wrap(n, acc) = n == 0 ? acc : wrap(n - 1, function() acc); g = wrap(100000, 0); echo(g()()()); cube(1);");
    assert!(output.is_success(), "{:?}", output.errors);
    assert_eq!(output.echoes, vec!["function()"]);
}

#[test]
fn test_too_many_arguments() {
    let output = run("function f(a) = a; x = f(1, 2);");
    assert!(matches!(
        first_error_kind(&output),
        EvalErrorKind::WrongArity { expected: 1, found: 2, .. }
    ));
}

#[test]
fn test_is_undef_accepts_unbound_names() {
    let output = run("echo(is_undef(nope), is_undef(1), is_undef(undef));");
    assert!(output.is_success());
    assert_eq!(output.echoes, vec!["true, false, true"]);
}

#[test]
fn test_rands_is_deterministic() {
    let source = "echo(rands(0, 1, 3, 42)); echo(rands(0, 1, 3, 42)); echo(rands(0, 1, 2));";
    let first = run(source);
    let second = run(source);
    assert_eq!(first.echoes[0], first.echoes[1]);
    assert_eq!(first.echoes, second.echoes);
}

#[test]
fn test_list_comprehension_forms() {
    let output = run(
        "echo([for (i = [0 : 5]) if (i % 2 == 0) i * i]);\n\
         echo([for (i = 0; i < 3; i = i + 1) i]);\n\
         echo([each [1, 2], each \"ab\"]);\n\
         echo([for (a = [1, 2], b = [10, 20]) a + b]);",
    );
    assert!(output.is_success(), "{:?}", output.errors);
    assert_eq!(
        output.echoes,
        vec![
            "[0, 4, 16]",
            "[0, 1, 2]",
            "[1, 2, \"a\", \"b\"]",
            "[11, 21, 12, 22]"
        ]
    );
}

#[test]
fn test_c_style_updates_use_previous_values() {
    let output = run("echo([for (a = 0, b = 1; a < 10; a = b, b = a + b) a]);");
    assert!(output.is_success(), "{:?}", output.errors);
    assert_eq!(output.echoes, vec!["[0, 1, 1, 2, 3, 5, 8]"]);
}

#[test]
fn test_long_c_style_comprehension() {
    let output = run("v = [for (i = 0; i < 500000; i = i + 1) if (false) 0]; echo(len(v)); cube(1);");
    assert!(output.is_success(), "{:?}", output.errors);
    assert_eq!(output.echoes, vec!["0"]);
}

#[test]
fn test_reassignment_warns_and_last_value_wins() {
    let output = run("x = 1; echo(x); x = 2;");
    assert_eq!(output.echoes, vec!["2"]);
    assert!(output.warnings.iter().any(|w| w.contains("reassigned")));
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_undefined_variable_has_line() {
    let output = run("x = 1;\ncube(y);\nsphere(1);");
    let error = &output.errors[0];
    assert_eq!(error.kind, EvalErrorKind::UndefinedVariable("y".to_string()));
    assert_eq!(error.category, ErrorCategory::Runtime);
    assert_eq!(error.line(), Some(2));
    assert_eq!(output.geometry, None);
}

#[test]
fn test_undefined_module_has_line() {
    let output = run("cube(1);\n\nnosuch(1);");
    let error = &output.errors[0];
    assert_eq!(error.kind, EvalErrorKind::UndefinedModule("nosuch".to_string()));
    assert_eq!(error.line(), Some(3));
}

#[test]
fn test_errors_are_isolated_per_statement() {
    let output = run("echo(1); cube(nope); echo(2);");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.echoes, vec!["1", "2"]);
}

#[test]
fn test_assertion_message() {
    let output = run("assert(1 > 2, \"too small\");");
    assert_eq!(
        first_error_kind(&output),
        &EvalErrorKind::AssertionFailed("too small".to_string())
    );
}

#[test]
fn test_loop_skips_failing_iteration() {
    let output = run("for (i = [0 : 3]) { assert(i != 1); echo(i); }");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.echoes, vec!["0", "2", "3"]);
}

#[test]
fn test_loop_aborts_on_failing_iteration() {
    let mut config = EngineConfig::default();
    config.loop_error_policy = LoopErrorPolicy::AbortLoop;
    let output = run_with(
        "for (i = [0 : 3]) { assert(i != 1); echo(i); }",
        with_config(config),
    );
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.echoes, vec!["0"]);
}

#[test]
fn test_broken_kernel_fails_before_evaluation() {
    let parsed = openscad_parser::parse_source("echo(1); cube(1);");
    let output = evaluate(&parsed.ast, &RecordingKernel::broken(), EvalOptions::default());
    assert!(output.echoes.is_empty());
    assert!(matches!(
        first_error_kind(&output),
        EvalErrorKind::KernelInitialization(_)
    ));
    assert!(output.system_error().is_some());
}

#[test]
fn test_text_unsupported_by_kernel() {
    let output = run("text(\"hi\");");
    assert!(matches!(first_error_kind(&output), EvalErrorKind::Kernel(_)));
}

// =============================================================================
// MODIFIERS
// =============================================================================

#[test]
fn test_disable_modifier_skips_subtree() {
    let output = run("*cube(1); sphere(1);");
    assert!(matches!(output.geometry, Some(Node::Sphere { .. })));
    assert_eq!(output.modifier, Some(Modifier::Disable));
}

#[test]
fn test_background_is_highlighted_not_rendered() {
    let output = run("%cube(1); sphere(1);");
    assert!(matches!(output.geometry, Some(Node::Sphere { .. })));
    assert_eq!(output.highlights.len(), 1);
    assert_eq!(output.highlights[0].modifier, Modifier::Background);
}

#[test]
fn test_debug_is_highlighted_and_rendered() {
    let output = run("#cube(1);");
    assert!(matches!(output.geometry, Some(Node::Cube { .. })));
    assert_eq!(output.highlights[0].modifier, Modifier::Debug);
    assert_eq!(output.modifier, Some(Modifier::Debug));
}

#[test]
fn test_root_modifier_replaces_result() {
    let output = run("sphere(1); !cube(1); %cylinder(1);");
    assert!(matches!(output.geometry, Some(Node::Cube { .. })));
    assert_eq!(output.modifier, Some(Modifier::Root));
}

// =============================================================================
// INTERRUPTS
// =============================================================================

#[test]
fn test_cancelled_before_start() {
    let interrupt = Interrupt::new();
    interrupt.cancel();
    let output = run_with(
        "cube(1);",
        EvalOptions {
            interrupt,
            ..EvalOptions::default()
        },
    );
    assert_eq!(first_error_kind(&output), &EvalErrorKind::Cancelled);
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.geometry, None);
}

#[test]
fn test_expired_deadline_stops_long_loop() {
    let interrupt = Interrupt::new().with_deadline(Instant::now() - Duration::from_millis(1));
    let output = run_with(
        "for (i = [0 : 1e9]) echo(i);",
        EvalOptions {
            interrupt,
            ..EvalOptions::default()
        },
    );
    assert_eq!(first_error_kind(&output), &EvalErrorKind::TimedOut);
    assert!(output.echoes.is_empty());
    assert!(output.system_error().is_some());
}

#[test]
fn test_animation_time_is_clamped() {
    let output = run_with(
        "echo($t);",
        EvalOptions {
            animation_time: Some(2.0),
            ..EvalOptions::default()
        },
    );
    assert_eq!(output.echoes, vec!["1"]);
}
