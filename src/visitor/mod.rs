//! Visitor framework for the query AST.
//!
//! Two traits split the work the way queries are shaped:
//!
//! - [`ConditionVisitor`] rewrites filters. Implementors handle single
//!   [`Condition`]s; the default walk rebuilds [`BooleanCondition`]s from
//!   every rewritten child.
//! - [`ExpressionVisitor`] rewrites [`QueryExpression`]s. The default
//!   formula walk visits each formula and time series parameter.
//!
//! The `walk_*` functions hold the default traversal so that an override can
//! still run it, the way a subclass calls its parent.
//!
//! Both walks count nesting depth and fail with
//! [`ModulationError::DepthExceeded`] past [`max_depth`](ConditionVisitor::max_depth).

mod modulation;

pub use modulation::{modulate_query, Modulated, ModulatorConditionVisitor, ModulatorVisitor};

use crate::error::{ModulationError, ModulationResult};
use crate::query::{
    BooleanCondition, Condition, Filter, Formula, FormulaParameter, QueryExpression, Timeseries,
};

/// Depth limit applied when a visitor does not choose its own.
pub const DEFAULT_MAX_DEPTH: usize = 128;

// =============================================================================
// Conditions
// =============================================================================

/// Rewrites filter trees.
pub trait ConditionVisitor {
    fn max_depth(&self) -> usize {
        DEFAULT_MAX_DEPTH
    }

    /// Rewrite a single condition.
    fn visit_condition(&mut self, condition: &Condition) -> ModulationResult<Condition>;

    /// Rewrite a boolean condition found at `depth`.
    fn visit_boolean_condition(
        &mut self,
        condition: &BooleanCondition,
        depth: usize,
    ) -> ModulationResult<BooleanCondition> {
        walk_boolean_condition(self, condition, depth)
    }

    /// Rewrite one filter entry.
    fn visit(&mut self, filter: &Filter) -> ModulationResult<Filter> {
        walk_filter(self, filter, 0)
    }

    /// Rewrite a filter list, entry by entry.
    ///
    /// `None` stays `None` and an empty list stays empty.
    fn visit_group(
        &mut self,
        filters: Option<&[Filter]>,
    ) -> ModulationResult<Option<Vec<Filter>>> {
        filters
            .map(|filters| filters.iter().map(|f| self.visit(f)).collect())
            .transpose()
    }
}

/// Dispatch a filter to the visitor, enforcing the depth limit.
pub fn walk_filter<V: ConditionVisitor + ?Sized>(
    visitor: &mut V,
    filter: &Filter,
    depth: usize,
) -> ModulationResult<Filter> {
    check_depth(depth, visitor.max_depth())?;
    match filter {
        Filter::Condition(c) => visitor.visit_condition(c).map(Filter::Condition),
        Filter::Boolean(b) => visitor.visit_boolean_condition(b, depth).map(Filter::Boolean),
    }
}

/// Rebuild a boolean condition with every child rewritten, in order.
pub fn walk_boolean_condition<V: ConditionVisitor + ?Sized>(
    visitor: &mut V,
    condition: &BooleanCondition,
    depth: usize,
) -> ModulationResult<BooleanCondition> {
    if condition.conditions.len() < 2 {
        return Err(ModulationError::Malformed(format!(
            "{} condition needs at least two operands, found {}",
            condition.op,
            condition.conditions.len()
        )));
    }
    let conditions = condition
        .conditions
        .iter()
        .map(|child| walk_filter(visitor, child, depth + 1))
        .collect::<ModulationResult<Vec<_>>>()?;
    Ok(BooleanCondition {
        op: condition.op,
        conditions,
    })
}

// =============================================================================
// Query expressions
// =============================================================================

/// Rewrites formulas and time series.
pub trait ExpressionVisitor {
    fn max_depth(&self) -> usize {
        DEFAULT_MAX_DEPTH
    }

    /// Rewrite a formula found at `depth`.
    fn visit_formula(&mut self, formula: &Formula, depth: usize) -> ModulationResult<Formula> {
        walk_formula(self, formula, depth)
    }

    /// Rewrite a time series. The default leaves it unchanged.
    fn visit_timeseries(&mut self, timeseries: &Timeseries) -> ModulationResult<Timeseries> {
        Ok(timeseries.clone())
    }

    /// Rewrite a whole query.
    fn visit(&mut self, expression: &QueryExpression) -> ModulationResult<QueryExpression> {
        walk_expression(self, expression, 0)
    }
}

/// Dispatch a query expression to the visitor, enforcing the depth limit.
pub fn walk_expression<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expression: &QueryExpression,
    depth: usize,
) -> ModulationResult<QueryExpression> {
    check_depth(depth, visitor.max_depth())?;
    match expression {
        QueryExpression::Formula(f) => {
            visitor.visit_formula(f, depth).map(QueryExpression::Formula)
        }
        QueryExpression::Timeseries(ts) => {
            visitor.visit_timeseries(ts).map(QueryExpression::Timeseries)
        }
    }
}

/// Rebuild a formula with each formula and time series parameter visited.
/// Scalar parameters are kept as they are.
pub fn walk_formula<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    formula: &Formula,
    depth: usize,
) -> ModulationResult<Formula> {
    if formula.parameters.is_empty() {
        return Err(ModulationError::Malformed(format!(
            "formula '{}' has no parameters",
            formula.function_name
        )));
    }
    let parameters = formula
        .parameters
        .iter()
        .map(|param| walk_parameter(visitor, param, depth + 1))
        .collect::<ModulationResult<Vec<_>>>()?;
    Ok(formula.clone().with_parameters(parameters))
}

fn walk_parameter<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    parameter: &FormulaParameter,
    depth: usize,
) -> ModulationResult<FormulaParameter> {
    check_depth(depth, visitor.max_depth())?;
    match parameter {
        FormulaParameter::Formula(f) => {
            visitor.visit_formula(f, depth).map(FormulaParameter::Formula)
        }
        FormulaParameter::Timeseries(ts) => {
            visitor.visit_timeseries(ts).map(FormulaParameter::Timeseries)
        }
        FormulaParameter::Scalar(v) => Ok(FormulaParameter::Scalar(v.clone())),
    }
}

fn check_depth(depth: usize, max_depth: usize) -> ModulationResult<()> {
    if depth > max_depth {
        return Err(ModulationError::DepthExceeded { max_depth });
    }
    Ok(())
}
