//! Tests for filter rewriting with ModulatorConditionVisitor.

use metrics_query::prelude::*;
use metrics_query::query::{func, Expression};

fn projects() -> Vec<Project> {
    vec![Project::new(1, "proj-a"), Project::new(42, "my-proj")]
}

fn modulators() -> ModulatorSet {
    ModulatorSet::new(vec![
        Modulator::project(),
        Modulator::new("env", "environment"),
    ])
    .unwrap()
}

#[test]
fn test_project_slug_rewritten_to_id() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let out = visitor.visit(&col("project").eq("my-proj")).unwrap();
    assert_eq!(out, col("project_id").eq(42));
    assert_eq!(visitor.applied().len(), 1);
}

#[test]
fn test_unmatched_condition_unchanged() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let filter = col("other_field").eq("x");
    assert_eq!(visitor.visit(&filter).unwrap(), filter);
    assert!(visitor.applied().is_empty());
}

#[test]
fn test_operator_preserved() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let out = visitor.visit(&col("env").neq("prod")).unwrap();
    assert_eq!(out, col("environment").neq("prod"));

    let out = visitor
        .visit(&col("project").not_in(vec!["proj-a", "my-proj"]))
        .unwrap();
    assert_eq!(out, col("project_id").not_in(vec![1, 42]));
}

#[test]
fn test_null_checks_rename_key_only() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let out = visitor.visit(&col("project").is_null()).unwrap();
    assert_eq!(out, col("project_id").is_null());

    let out = visitor.visit(&col("env").is_not_null()).unwrap();
    assert_eq!(out, col("environment").is_not_null());

    assert_eq!(
        visitor.applied().key_pairs(),
        vec![("project", "project_id"), ("env", "environment")]
    );
}

#[test]
fn test_boolean_condition_keeps_all_children_in_order() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let filter = or(vec![
        col("project").eq("proj-a"),
        col("transaction").eq("/home"),
        col("env").eq("prod"),
        col("project").eq("my-proj"),
    ]);
    let out = visitor.visit(&filter).unwrap();

    let Filter::Boolean(boolean) = out else {
        panic!("expected a boolean condition");
    };
    assert_eq!(boolean.op, BooleanOp::Or);
    assert_eq!(
        boolean.conditions,
        vec![
            col("project_id").eq(1),
            col("transaction").eq("/home"),
            col("environment").eq("prod"),
            col("project_id").eq(42),
        ]
    );
    assert_eq!(visitor.applied().len(), 3);
}

#[test]
fn test_nested_boolean_conditions() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let filter = col("env")
        .eq("prod")
        .and(col("project").eq("proj-a").or(col("project").eq("my-proj")));
    let out = visitor.visit(&filter).unwrap();

    assert_eq!(
        out,
        col("environment")
            .eq("prod")
            .and(col("project_id").eq(1).or(col("project_id").eq(42)))
    );
}

#[test]
fn test_function_lhs_is_not_modulated() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let filter = func("ifnull", vec![col("env").into(), "".into()]).eq("prod");
    assert_eq!(visitor.visit(&filter).unwrap(), filter);
}

#[test]
fn test_expression_rhs_is_not_modulated() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let filter = Filter::Condition(Condition::new(
        col("env"),
        Op::Eq,
        Expression::Column(col("default_env")),
    ));
    assert_eq!(visitor.visit(&filter).unwrap(), filter);
    assert!(visitor.applied().is_empty());
}

#[test]
fn test_lookup_error_inside_boolean_propagates() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let filter = col("env").eq("prod").and(col("project").eq("unknown"));
    let err = visitor.visit(&filter).unwrap_err();
    assert!(err.is_lookup());
}

#[test]
fn test_visit_group() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let filters = vec![col("env").eq("prod"), col("release").is_null()];
    let out = visitor.visit_group(Some(filters.as_slice())).unwrap();
    assert_eq!(
        out,
        Some(vec![col("environment").eq("prod"), col("release").is_null()])
    );
    assert_eq!(visitor.visit_group(None).unwrap(), None);
}

#[test]
fn test_depth_limit() {
    let projects = projects();
    let modulators = modulators();

    let mut filter = col("env").eq("prod");
    for _ in 0..6 {
        filter = filter.and(col("env").eq("dev"));
    }

    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators).with_max_depth(5);
    let err = visitor.visit(&filter).unwrap_err();
    assert_eq!(err, ModulationError::DepthExceeded { max_depth: 5 });

    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators).with_max_depth(6);
    assert!(visitor.visit(&filter).is_ok());
}

#[test]
fn test_custom_closure_transform() {
    let projects = projects();
    let modulators = ModulatorSet::new(vec![Modulator::new("env", "environment").with_fn(
        "lowercase",
        |value, _| match value {
            ScalarValue::String(s) => Ok(ScalarValue::String(s.to_lowercase())),
            other => Err(ModulationError::lookup("env", other)),
        },
    )])
    .unwrap();
    let mut visitor = ModulatorConditionVisitor::new(&projects, &modulators);

    let out = visitor.visit(&col("env").eq("PROD")).unwrap();
    assert_eq!(out, col("environment").eq("prod"));

    let err = visitor.visit(&col("env").eq(3)).unwrap_err();
    assert!(err.is_lookup());
}
