//! Filter and group-by nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::expr::{AliasedExpression, Column, Expression, Function, Operand, ScalarValue};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Neq => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::IsNull => "IS NULL",
            Op::IsNotNull => "IS NOT NULL",
        }
    }

    /// Unary operators take no right-hand side.
    pub fn is_unary(&self) -> bool {
        matches!(self, Op::IsNull | Op::IsNotNull)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BooleanOp {
    And,
    Or,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanOp::And => f.write_str("AND"),
            BooleanOp::Or => f.write_str("OR"),
        }
    }
}

/// A single predicate: `lhs op rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub lhs: Expression,
    pub op: Op,
    #[serde(default)]
    pub rhs: Operand,
}

impl Condition {
    pub fn new(lhs: impl Into<Expression>, op: Op, rhs: impl Into<Operand>) -> Self {
        Self {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op.is_unary() {
            write!(f, "{} {}", self.lhs, self.op)
        } else {
            write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
        }
    }
}

/// Conditions combined with AND / OR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanCondition {
    pub op: BooleanOp,
    pub conditions: Vec<Filter>,
}

impl fmt::Display for BooleanCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.op)?;
            }
            write!(f, "{}", condition)?;
        }
        write!(f, ")")
    }
}

/// One entry of a filter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Boolean(BooleanCondition),
    Condition(Condition),
}

impl Filter {
    /// Combine this filter with another using AND.
    pub fn and(self, other: impl Into<Filter>) -> Filter {
        and(vec![self, other.into()])
    }

    /// Combine this filter with another using OR.
    pub fn or(self, other: impl Into<Filter>) -> Filter {
        or(vec![self, other.into()])
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Boolean(b) => write!(f, "{}", b),
            Filter::Condition(c) => write!(f, "{}", c),
        }
    }
}

impl From<Condition> for Filter {
    fn from(c: Condition) -> Self {
        Filter::Condition(c)
    }
}

impl From<BooleanCondition> for Filter {
    fn from(b: BooleanCondition) -> Self {
        Filter::Boolean(b)
    }
}

/// One entry of a group-by list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupBy {
    Aliased(AliasedExpression),
    Column(Column),
}

impl GroupBy {
    /// Name of the column being grouped on.
    pub fn column_name(&self) -> &str {
        match self {
            GroupBy::Aliased(a) => &a.exp.name,
            GroupBy::Column(c) => &c.name,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Aliased(a) => write!(f, "{}", a),
            GroupBy::Column(c) => write!(f, "{}", c),
        }
    }
}

impl From<Column> for GroupBy {
    fn from(c: Column) -> Self {
        GroupBy::Column(c)
    }
}

impl From<AliasedExpression> for GroupBy {
    fn from(a: AliasedExpression) -> Self {
        GroupBy::Aliased(a)
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Combine filters with AND.
pub fn and(conditions: Vec<Filter>) -> Filter {
    Filter::Boolean(BooleanCondition {
        op: BooleanOp::And,
        conditions,
    })
}

/// Combine filters with OR.
pub fn or(conditions: Vec<Filter>) -> Filter {
    Filter::Boolean(BooleanCondition {
        op: BooleanOp::Or,
        conditions,
    })
}

/// Extension trait for building conditions fluently from a left-hand side.
pub trait ConditionExt: Sized {
    fn into_lhs(self) -> Expression;

    fn compare(self, op: Op, rhs: impl Into<Operand>) -> Filter {
        Filter::Condition(Condition {
            lhs: self.into_lhs(),
            op,
            rhs: rhs.into(),
        })
    }

    fn eq(self, rhs: impl Into<Operand>) -> Filter {
        self.compare(Op::Eq, rhs)
    }

    fn neq(self, rhs: impl Into<Operand>) -> Filter {
        self.compare(Op::Neq, rhs)
    }

    fn gt(self, rhs: impl Into<Operand>) -> Filter {
        self.compare(Op::Gt, rhs)
    }

    fn gte(self, rhs: impl Into<Operand>) -> Filter {
        self.compare(Op::Gte, rhs)
    }

    fn lt(self, rhs: impl Into<Operand>) -> Filter {
        self.compare(Op::Lt, rhs)
    }

    fn lte(self, rhs: impl Into<Operand>) -> Filter {
        self.compare(Op::Lte, rhs)
    }

    fn like(self, pattern: &str) -> Filter {
        self.compare(Op::Like, pattern)
    }

    fn is_in<T: Into<ScalarValue>>(self, values: Vec<T>) -> Filter {
        self.compare(Op::In, ScalarValue::from(values))
    }

    fn not_in<T: Into<ScalarValue>>(self, values: Vec<T>) -> Filter {
        self.compare(Op::NotIn, ScalarValue::from(values))
    }

    fn is_null(self) -> Filter {
        self.compare(Op::IsNull, ScalarValue::Null)
    }

    fn is_not_null(self) -> Filter {
        self.compare(Op::IsNotNull, ScalarValue::Null)
    }
}

impl ConditionExt for Column {
    fn into_lhs(self) -> Expression {
        Expression::Column(self)
    }
}

impl ConditionExt for Function {
    fn into_lhs(self) -> Expression {
        Expression::Function(self)
    }
}

impl ConditionExt for Expression {
    fn into_lhs(self) -> Expression {
        self
    }
}
