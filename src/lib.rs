//! # metrics-query
//!
//! Rewrites structured metrics queries from the field names a public API
//! accepts into the keys the storage layer understands.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          QueryExpression (public keys and values)        │
//! │   formula / timeseries + filters + group-by              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [ModulatorVisitor]
//! ┌─────────────────────────────────────────────────────────┐
//! │  filters  ── ModulatorConditionVisitor (key + value)     │
//! │  group-by ── inline rename (key only, alias kept)        │
//! │  formula parameters ── recursive visit                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │  QueryExpression (internal keys)  +  AppliedModulators   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [demodulate_group]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Result groups mapped back to public keys        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use metrics_query::prelude::*;
//!
//! let projects = vec![Project::new(1, "proj-a")];
//! let modulators = ModulatorSet::new(vec![
//!     Modulator::project(),
//!     Modulator::new("env", "environment"),
//! ])
//! .unwrap();
//!
//! let query = Timeseries::new("d:transactions/duration@millisecond", "avg")
//!     .filter(col("project").eq("proj-a").and(col("env").eq("prod")))
//!     .group_by(col("project"));
//!
//! let modulated = modulate_query(&query.into(), &projects, &modulators).unwrap();
//! assert_eq!(
//!     modulated.expression.to_string(),
//!     "avg(d:transactions/duration@millisecond)\
//!      {(project_id = 1 AND environment = \"prod\")} by (project_id)"
//! );
//! assert_eq!(modulated.applied.len(), 3);
//! ```

pub mod config;
pub mod error;
pub mod modulator;
pub mod query;
pub mod visitor;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::error::{ModulationError, ModulationResult};
    pub use crate::modulator::{AppliedModulators, Modulator, ModulatorSet, Project};
    pub use crate::query::{
        aliased, and, col, func, or, AliasedExpression, ArithmeticOperator, BooleanCondition,
        BooleanOp, Column, Condition, ConditionExt, Filter, Formula, GroupBy, Op,
        QueryExpression, ScalarValue, Timeseries,
    };
    pub use crate::visitor::{
        modulate_query, ConditionVisitor, ExpressionVisitor, Modulated,
        ModulatorConditionVisitor, ModulatorVisitor,
    };
}

// Also export at crate root for convenience
pub use error::{ModulationError, ModulationResult};
pub use modulator::{Modulator, ModulatorSet, Project};
pub use visitor::{modulate_query, Modulated, ModulatorVisitor};
