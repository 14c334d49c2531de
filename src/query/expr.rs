//! Leaf expressions of the query AST: scalars, columns and function calls.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Scalars
// =============================================================================

/// A literal value on the right-hand side of a condition.
///
/// Lists count as scalars: they are the operand of `IN` / `NOT IN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ScalarValue>),
}

impl ScalarValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(n) => write!(f, "{}", n),
            ScalarValue::Float(x) => write!(f, "{}", x),
            ScalarValue::String(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            ScalarValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Int(n)
    }
}

impl From<i32> for ScalarValue {
    fn from(n: i32) -> Self {
        ScalarValue::Int(n as i64)
    }
}

impl From<f64> for ScalarValue {
    fn from(x: f64) -> Self {
        ScalarValue::Float(x)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

impl<T: Into<ScalarValue>> From<Vec<T>> for ScalarValue {
    fn from(items: Vec<T>) -> Self {
        ScalarValue::List(items.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Columns and expressions
// =============================================================================

/// A reference to a field of the underlying dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A column exposed under a display alias, as used in group-by clauses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AliasedExpression {
    pub exp: Column,
    pub alias: String,
}

impl AliasedExpression {
    pub fn new(exp: Column, alias: impl Into<String>) -> Self {
        Self {
            exp,
            alias: alias.into(),
        }
    }

    /// Replace the wrapped column, keeping the alias.
    pub fn with_exp(&self, exp: Column) -> Self {
        Self {
            exp,
            alias: self.alias.clone(),
        }
    }
}

impl fmt::Display for AliasedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.exp, self.alias)
    }
}

/// A function applied to operands, e.g. `ifnull(release, "")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub function: String,
    #[serde(default)]
    pub parameters: Vec<Operand>,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

/// A non-literal expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Column(Column),
    Function(Function),
}

impl Expression {
    /// The column this expression refers to directly, if any.
    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Expression::Column(c) => Some(c),
            Expression::Function(_) => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(c) => write!(f, "{}", c),
            Expression::Function(func) => write!(f, "{}", func),
        }
    }
}

impl From<Column> for Expression {
    fn from(c: Column) -> Self {
        Expression::Column(c)
    }
}

impl From<Function> for Expression {
    fn from(func: Function) -> Self {
        Expression::Function(func)
    }
}

/// Either a literal or an expression. Used for condition right-hand sides
/// and function parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Scalar(ScalarValue),
    Expression(Expression),
}

impl Operand {
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Operand::Scalar(v) => Some(v),
            Operand::Expression(_) => None,
        }
    }
}

impl Default for Operand {
    fn default() -> Self {
        Operand::Scalar(ScalarValue::Null)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Scalar(v) => write!(f, "{}", v),
            Operand::Expression(e) => write!(f, "{}", e),
        }
    }
}

impl From<ScalarValue> for Operand {
    fn from(v: ScalarValue) -> Self {
        Operand::Scalar(v)
    }
}

impl From<Expression> for Operand {
    fn from(e: Expression) -> Self {
        Operand::Expression(e)
    }
}

impl From<Column> for Operand {
    fn from(c: Column) -> Self {
        Operand::Expression(Expression::Column(c))
    }
}

impl From<Function> for Operand {
    fn from(func: Function) -> Self {
        Operand::Expression(Expression::Function(func))
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Scalar(s.into())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Scalar(s.into())
    }
}

impl From<i64> for Operand {
    fn from(n: i64) -> Self {
        Operand::Scalar(n.into())
    }
}

impl From<i32> for Operand {
    fn from(n: i32) -> Self {
        Operand::Scalar(n.into())
    }
}

impl From<f64> for Operand {
    fn from(x: f64) -> Self {
        Operand::Scalar(x.into())
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Operand::Scalar(b.into())
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Create a column reference.
pub fn col(name: &str) -> Column {
    Column::new(name)
}

/// Create an aliased column for a group-by clause.
pub fn aliased(name: &str, alias: &str) -> AliasedExpression {
    AliasedExpression::new(Column::new(name), alias)
}

/// Create a function call expression.
pub fn func(name: &str, parameters: Vec<Operand>) -> Function {
    Function {
        function: name.to_string(),
        parameters,
    }
}
