//! # AST Tests
//!
//! Constructors, modifier ordering, printing and serde shape.

use crate::*;

// =============================================================================
// CONSTRUCTOR TESTS
// =============================================================================

#[test]
fn test_invocation_constructor() {
    let stmt = Statement::invocation("cube", vec![Argument::positional(10.0.into())], vec![]);
    match &stmt.kind {
        StatementKind::Invocation(call) => {
            assert_eq!(call.name, "cube");
            assert_eq!(call.args.len(), 1);
            assert_eq!(call.args[0].value.as_number(), Some(10.0));
            assert!(call.modifier.is_none());
        }
        other => panic!("expected invocation, got {other:?}"),
    }
    assert!(stmt.span.is_synthetic());
}

#[test]
fn test_with_modifier_only_affects_invocations() {
    let cube = Statement::invocation("cube", vec![], vec![]).with_modifier(Modifier::Debug);
    assert!(matches!(
        cube.kind,
        StatementKind::Invocation(Invocation { modifier: Some(Modifier::Debug), .. })
    ));

    let assign = Statement::assignment("a", 1.0.into()).with_modifier(Modifier::Root);
    assert!(matches!(assign.kind, StatementKind::Assignment(_)));
}

// =============================================================================
// MODIFIER TESTS
// =============================================================================

#[test]
fn test_modifier_precedence_order() {
    let mut all = vec![Modifier::Debug, Modifier::Disable, Modifier::Root, Modifier::Background];
    all.sort();
    assert_eq!(
        all,
        vec![Modifier::Disable, Modifier::Background, Modifier::Debug, Modifier::Root]
    );
}

#[test]
fn test_modifier_sigils_roundtrip() {
    for sigil in ['!', '#', '%', '*'] {
        let modifier = Modifier::from_sigil(sigil).expect("known sigil");
        assert_eq!(modifier.sigil(), sigil);
    }
    assert_eq!(Modifier::from_sigil('@'), None);
}

// =============================================================================
// PRINTER TESTS
// =============================================================================

#[test]
fn test_print_nested_invocation() {
    let stmt = Statement::invocation(
        "translate",
        vec![Argument::positional([1.0, 2.0, 3.0].into())],
        vec![Statement::invocation(
            "cube",
            vec![Argument::positional(10.0.into()), Argument::named("center", true.into())],
            vec![],
        )],
    );
    assert_eq!(stmt.to_string(), "translate([1, 2, 3]) cube(10, center = true);");
}

#[test]
fn test_print_block_children_and_modifier() {
    let stmt = Statement::invocation(
        "union",
        vec![],
        vec![
            Statement::invocation("cube", vec![], vec![]),
            Statement::invocation("sphere", vec![], vec![]),
        ],
    )
    .with_modifier(Modifier::Background);
    assert_eq!(stmt.to_string(), "%union() { cube(); sphere(); }");
}

#[test]
fn test_print_parenthesizes_operators() {
    let expr = Expression::binary(
        BinaryOp::Multiply,
        Expression::binary(BinaryOp::Add, 1.0.into(), 2.0.into()),
        Expression::number(-3.0),
    );
    assert_eq!(expr.to_string(), "((1 + 2) * (-3))");
}

#[test]
fn test_print_string_escapes() {
    let expr = Expression::string("a\"b\\c\n");
    assert_eq!(expr.to_string(), r#""a\"b\\c\n""#);
}

#[test]
fn test_print_range_and_comprehension() {
    let range = Expression::range(0.0.into(), None, 5.0.into());
    let comp = Expression::new(
        ExpressionKind::Comprehension(vec![Element::For {
            bindings: vec![Assignment::new("i", range.clone())],
            body: Box::new(Element::Expr(Expression::identifier("i"))),
        }]),
        Span::default(),
    );
    assert_eq!(range.to_string(), "[0 : 5]");
    assert_eq!(comp.to_string(), "[for (i = [0 : 5]) i]");
}

// =============================================================================
// SERDE TESTS
// =============================================================================

#[test]
fn test_statement_json_roundtrip() {
    let stmt = Statement::invocation(
        "sphere",
        vec![Argument::named("$fn", 32.0.into())],
        vec![],
    );
    let json = serde_json::to_string(&stmt).expect("serialize");
    let back: Statement = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(stmt, back);
}
