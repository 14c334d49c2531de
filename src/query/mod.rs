//! Structured metrics query AST.
//!
//! A query is a [`QueryExpression`]: either a [`Timeseries`] (one aggregated
//! metric) or a [`Formula`] combining time series, scalars and other
//! formulas. Both carry optional filter and group-by clauses.
//!
//! All node kinds are closed enums, so every visitor must handle every
//! variant. Nodes are plain values; rewriting produces new trees.

mod condition;
mod expr;
mod formula;

pub use condition::{
    and, or, BooleanCondition, BooleanOp, Condition, ConditionExt, Filter, GroupBy, Op,
};
pub use expr::{
    aliased, col, func, AliasedExpression, Column, Expression, Function, Operand, ScalarValue,
};
pub use formula::{
    ArithmeticOperator, Formula, FormulaParameter, Metric, QueryExpression, Timeseries,
};
