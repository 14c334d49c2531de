//! Tests for rewriting formulas and time series with ModulatorVisitor.

use metrics_query::prelude::*;

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

fn duration() -> Timeseries {
    Timeseries::new("d:transactions/duration@millisecond", "avg")
}

#[test]
fn test_scenario_formula_filters_and_groupby() {
    let formula = Formula::new(
        ArithmeticOperator::Plus,
        vec![duration().into(), ScalarValue::Int(1).into()],
    )
    .filter(col("project").eq("proj-a").and(col("env").eq("prod")))
    .group_by(col("project"));

    let modulated = modulate_query(&formula.into(), &projects(), &modulators()).unwrap();

    assert_eq!(
        modulated.expression.filters(),
        Some(&[col("project_id").eq(1).and(col("environment").eq("prod"))][..])
    );
    assert_eq!(
        modulated.expression.groupby(),
        Some(&[GroupBy::from(col("project_id"))][..])
    );
}

#[test]
fn test_empty_modulator_set_is_identity() {
    let formula = Formula::new(
        ArithmeticOperator::Divide,
        vec![
            duration()
                .filter(col("project").eq("proj-a"))
                .group_by(aliased("project", "p"))
                .into(),
            duration().into(),
        ],
    )
    .filter(col("env").eq("prod").or(col("env").eq("dev")))
    .group_by(col("transaction"));
    let expr = QueryExpression::from(formula);

    let modulated = modulate_query(&expr, &projects(), &ModulatorSet::empty()).unwrap();
    assert_eq!(modulated.expression, expr);
    assert!(modulated.applied.is_empty());
}

#[test]
fn test_groupby_cardinality_and_unmatched_passthrough() {
    let ts = duration()
        .group_by(col("unrelated"))
        .group_by(col("project"))
        .group_by(aliased("env", "Environment"))
        .group_by(col("transaction"));

    let modulated = modulate_query(&ts.into(), &projects(), &modulators()).unwrap();
    let groupby = modulated.expression.groupby().unwrap();

    assert_eq!(groupby.len(), 4);
    assert_eq!(groupby[0], GroupBy::from(col("unrelated")));
    assert_eq!(groupby[1], GroupBy::from(col("project_id")));
    assert_eq!(groupby[2], GroupBy::from(aliased("environment", "Environment")));
    assert_eq!(groupby[3], GroupBy::from(col("transaction")));
}

#[test]
fn test_applied_modulators_count_every_site() {
    let ts = duration()
        .filter(col("project").eq("my-proj"))
        .group_by(col("project"));

    let modulated = modulate_query(&ts.into(), &projects(), &modulators()).unwrap();
    assert_eq!(
        modulated.applied.key_pairs(),
        vec![("project", "project_id"), ("project", "project_id")]
    );
    assert_eq!(modulated.applied.unique().len(), 1);
}

#[test]
fn test_filters_recorded_before_groupby() {
    let ts = duration()
        .filter(col("env").eq("prod"))
        .group_by(col("project"));

    let modulated = modulate_query(&ts.into(), &projects(), &modulators()).unwrap();
    assert_eq!(
        modulated.applied.key_pairs(),
        vec![("env", "environment"), ("project", "project_id")]
    );
}

#[test]
fn test_unresolvable_value_fails_the_visit() {
    let ts = duration()
        .filter(col("env").eq("prod"))
        .filter(col("project").eq("does-not-exist"))
        .group_by(col("project"));

    let err = modulate_query(&ts.into(), &projects(), &modulators()).unwrap_err();
    assert_eq!(err, ModulationError::lookup("project", "\"does-not-exist\""));
}

#[test]
fn test_project_null_check_in_timeseries_filter() {
    let ts = duration().filter(col("project").is_null());

    let modulated = modulate_query(&ts.into(), &projects(), &modulators()).unwrap();
    insta::assert_snapshot!(
        modulated.expression.to_string(),
        @"avg(d:transactions/duration@millisecond){project_id IS NULL}"
    );
    assert_eq!(modulated.applied.len(), 1);
}

#[test]
fn test_absent_and_empty_clauses() {
    let absent = duration();
    let modulated = modulate_query(&absent.clone().into(), &projects(), &modulators()).unwrap();
    assert_eq!(modulated.expression, QueryExpression::from(absent));

    let empty = duration()
        .with_filters(Some(vec![]))
        .with_groupby(Some(vec![]));
    let modulated = modulate_query(&empty.into(), &projects(), &modulators()).unwrap();
    assert_eq!(modulated.expression.filters(), Some(&[][..]));
    assert_eq!(modulated.expression.groupby(), Some(&[][..]));
}

#[test]
fn test_nested_formula_parameters_are_modulated() {
    let inner = Formula::new(
        ArithmeticOperator::Minus,
        vec![
            duration().filter(col("project").eq("proj-a")).into(),
            duration().group_by(col("env")).into(),
        ],
    );
    let outer = Formula::new(
        ArithmeticOperator::Multiply,
        vec![inner.into(), ScalarValue::Int(100).into()],
    );

    let modulated = modulate_query(&outer.into(), &projects(), &modulators()).unwrap();
    insta::assert_snapshot!(
        modulated.expression.to_string(),
        @r#"multiply(minus(avg(d:transactions/duration@millisecond){project_id = 1}, avg(d:transactions/duration@millisecond) by (environment)), 100)"#
    );
    assert_eq!(modulated.applied.len(), 2);
}

#[test]
fn test_untouched_fields_pass_through() {
    let mut ts = Timeseries::new("d:spans/exclusive_time@millisecond", "quantiles")
        .filter(col("project").eq("proj-a"));
    ts.aggregate_params = Some(vec![ScalarValue::Float(0.5)]);
    ts.metric.public_name = Some("span.exclusive_time".to_string());

    let modulated = modulate_query(&ts.clone().into(), &projects(), &modulators()).unwrap();
    let QueryExpression::Timeseries(out) = modulated.expression else {
        panic!("expected a timeseries");
    };
    assert_eq!(out.metric, ts.metric);
    assert_eq!(out.aggregate, "quantiles");
    assert_eq!(out.aggregate_params, ts.aggregate_params);
}

#[test]
fn test_visitor_instance_accumulates_across_visits() {
    let projects = projects();
    let modulators = modulators();
    let mut visitor = ModulatorVisitor::new(&projects, &modulators);

    let first = QueryExpression::from(duration().group_by(col("project")));
    let second = QueryExpression::from(duration().group_by(col("env")));
    visitor.visit(&first).unwrap();
    visitor.visit(&second).unwrap();

    assert_eq!(
        visitor.into_applied().key_pairs(),
        vec![("project", "project_id"), ("env", "environment")]
    );
}

#[test]
fn test_max_depth_bounds_formula_nesting() {
    let projects = projects();
    let modulators = modulators();

    let mut formula = Formula::new(ArithmeticOperator::Plus, vec![duration().into()]);
    for _ in 0..10 {
        formula = Formula::new(ArithmeticOperator::Plus, vec![formula.into()]);
    }
    let expr = QueryExpression::from(formula);

    let mut shallow = ModulatorVisitor::new(&projects, &modulators).with_max_depth(8);
    let err = shallow.visit(&expr).unwrap_err();
    assert!(err.is_structural());

    let mut deep = ModulatorVisitor::new(&projects, &modulators).with_max_depth(16);
    assert!(deep.visit(&expr).is_ok());
}

#[test]
fn test_reverse_translation_of_result_groups() {
    use std::collections::BTreeMap;

    let projects = projects();
    let ts = duration().group_by(col("project")).group_by(col("env"));
    let modulated = modulate_query(&ts.into(), &projects, &modulators()).unwrap();

    let row = BTreeMap::from([
        ("project_id".to_string(), ScalarValue::Int(42)),
        ("environment".to_string(), ScalarValue::from("prod")),
    ]);
    let public = modulated.applied.demodulate_group(&row, &projects).unwrap();
    assert_eq!(public.get("project"), Some(&ScalarValue::from("my-proj")));
    assert_eq!(public.get("env"), Some(&ScalarValue::from("prod")));
    assert!(!public.contains_key("project_id"));
}

#[test]
fn test_concurrent_visits_with_separate_instances() {
    let projects = projects();
    let modulators = modulators();

    std::thread::scope(|scope| {
        let handles: Vec<_> = ["proj-a", "my-proj"]
            .into_iter()
            .map(|slug| {
                let projects = &projects;
                let modulators = &modulators;
                scope.spawn(move || {
                    let ts = duration().filter(col("project").eq(slug));
                    modulate_query(&ts.into(), projects, modulators).unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results[0].expression.filters(),
            Some(&[col("project_id").eq(1)][..])
        );
        assert_eq!(
            results[1].expression.filters(),
            Some(&[col("project_id").eq(42)][..])
        );
    });
}
