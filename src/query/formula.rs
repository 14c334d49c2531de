//! Top-level query shapes: time series and formulas over them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::{Filter, GroupBy};
use super::expr::ScalarValue;

/// The metric a time series reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metric {
    /// Metric resource identifier, e.g. `d:transactions/duration@millisecond`.
    pub mri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_name: Option<String>,
}

impl Metric {
    pub fn new(mri: impl Into<String>) -> Self {
        Self {
            mri: mri.into(),
            public_name: None,
        }
    }
}

/// An aggregation of one metric over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeseries {
    pub metric: Metric,
    pub aggregate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_params: Option<Vec<ScalarValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groupby: Option<Vec<GroupBy>>,
}

impl Timeseries {
    pub fn new(mri: &str, aggregate: &str) -> Self {
        Self {
            metric: Metric::new(mri),
            aggregate: aggregate.to_string(),
            aggregate_params: None,
            filters: None,
            groupby: None,
        }
    }

    pub fn with_filters(self, filters: Option<Vec<Filter>>) -> Self {
        Self { filters, ..self }
    }

    pub fn with_groupby(self, groupby: Option<Vec<GroupBy>>) -> Self {
        Self { groupby, ..self }
    }

    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filters.get_or_insert_with(Vec::new).push(filter.into());
        self
    }

    pub fn group_by(mut self, group: impl Into<GroupBy>) -> Self {
        self.groupby.get_or_insert_with(Vec::new).push(group.into());
        self
    }
}

impl fmt::Display for Timeseries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.aggregate, self.metric.mri)?;
        if let Some(params) = &self.aggregate_params {
            for param in params {
                write!(f, ", {}", param)?;
            }
        }
        write!(f, ")")?;
        write_clauses(f, self.filters.as_deref(), self.groupby.as_deref())
    }
}

/// Arithmetic applied by a formula to its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithmeticOperator::Plus => "plus",
            ArithmeticOperator::Minus => "minus",
            ArithmeticOperator::Multiply => "multiply",
            ArithmeticOperator::Divide => "divide",
        })
    }
}

/// One operand of a formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaParameter {
    Formula(Formula),
    Timeseries(Timeseries),
    Scalar(ScalarValue),
}

impl fmt::Display for FormulaParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaParameter::Formula(formula) => write!(f, "{}", formula),
            FormulaParameter::Timeseries(ts) => write!(f, "{}", ts),
            FormulaParameter::Scalar(v) => write!(f, "{}", v),
        }
    }
}

impl From<Formula> for FormulaParameter {
    fn from(formula: Formula) -> Self {
        FormulaParameter::Formula(formula)
    }
}

impl From<Timeseries> for FormulaParameter {
    fn from(ts: Timeseries) -> Self {
        FormulaParameter::Timeseries(ts)
    }
}

impl From<ScalarValue> for FormulaParameter {
    fn from(v: ScalarValue) -> Self {
        FormulaParameter::Scalar(v)
    }
}

/// Arithmetic over time series, scalars and other formulas.
///
/// Filters and group-by set on a formula apply to every time series
/// underneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub function_name: ArithmeticOperator,
    pub parameters: Vec<FormulaParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groupby: Option<Vec<GroupBy>>,
}

impl Formula {
    pub fn new(function_name: ArithmeticOperator, parameters: Vec<FormulaParameter>) -> Self {
        Self {
            function_name,
            parameters,
            filters: None,
            groupby: None,
        }
    }

    pub fn with_parameters(self, parameters: Vec<FormulaParameter>) -> Self {
        Self { parameters, ..self }
    }

    pub fn with_filters(self, filters: Option<Vec<Filter>>) -> Self {
        Self { filters, ..self }
    }

    pub fn with_groupby(self, groupby: Option<Vec<GroupBy>>) -> Self {
        Self { groupby, ..self }
    }

    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filters.get_or_insert_with(Vec::new).push(filter.into());
        self
    }

    pub fn group_by(mut self, group: impl Into<GroupBy>) -> Self {
        self.groupby.get_or_insert_with(Vec::new).push(group.into());
        self
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function_name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")?;
        write_clauses(f, self.filters.as_deref(), self.groupby.as_deref())
    }
}

/// The root of a metrics query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryExpression {
    Formula(Formula),
    Timeseries(Timeseries),
}

impl QueryExpression {
    pub fn filters(&self) -> Option<&[Filter]> {
        match self {
            QueryExpression::Formula(f) => f.filters.as_deref(),
            QueryExpression::Timeseries(ts) => ts.filters.as_deref(),
        }
    }

    pub fn groupby(&self) -> Option<&[GroupBy]> {
        match self {
            QueryExpression::Formula(f) => f.groupby.as_deref(),
            QueryExpression::Timeseries(ts) => ts.groupby.as_deref(),
        }
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryExpression::Formula(formula) => write!(f, "{}", formula),
            QueryExpression::Timeseries(ts) => write!(f, "{}", ts),
        }
    }
}

impl From<Formula> for QueryExpression {
    fn from(formula: Formula) -> Self {
        QueryExpression::Formula(formula)
    }
}

impl From<Timeseries> for QueryExpression {
    fn from(ts: Timeseries) -> Self {
        QueryExpression::Timeseries(ts)
    }
}

/// Render `{f1 AND f2} by (g1, g2)`; empty clauses are omitted.
fn write_clauses(
    f: &mut fmt::Formatter<'_>,
    filters: Option<&[Filter]>,
    groupby: Option<&[GroupBy]>,
) -> fmt::Result {
    if let Some(filters) = filters.filter(|fs| !fs.is_empty()) {
        write!(f, "{{")?;
        for (i, filter) in filters.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", filter)?;
        }
        write!(f, "}}")?;
    }
    if let Some(groupby) = groupby.filter(|gs| !gs.is_empty()) {
        write!(f, " by (")?;
        for (i, group) in groupby.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", group)?;
        }
        write!(f, ")")?;
    }
    Ok(())
}
