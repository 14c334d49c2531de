//! Error types for query modulation.
//!
//! Every failure in this crate is one of three kinds:
//! - a value that cannot be resolved against the projects in scope,
//! - a modulator list that is inconsistent,
//! - a query tree that is malformed or nested too deeply.

use thiserror::Error;

/// Result type for modulation operations.
pub type ModulationResult<T> = Result<T, ModulationError>;

/// Errors raised while building modulators or rewriting a query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModulationError {
    /// A value transform could not resolve its input.
    #[error("cannot resolve value {value} for '{key}'")]
    Lookup {
        /// The key whose value was being translated.
        key: String,
        /// The rendered value that failed to resolve.
        value: String,
    },

    /// Two modulators share the same `from_key`.
    #[error("duplicate modulator for key '{0}'")]
    DuplicateKey(String),

    /// A modulator's `to_key` clashes with another modulator's keys.
    #[error("modulator '{from_key}' targets '{to_key}', which is already mapped by another modulator")]
    KeyCollision { from_key: String, to_key: String },

    /// The query tree nests deeper than the visitor allows.
    #[error("query nesting exceeds the maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },

    /// The query tree violates a structural rule.
    #[error("malformed query: {0}")]
    Malformed(String),
}

impl ModulationError {
    /// Create a lookup error for a key and the value that failed.
    pub fn lookup(key: impl Into<String>, value: impl ToString) -> Self {
        Self::Lookup {
            key: key.into(),
            value: value.to_string(),
        }
    }

    /// Check if this error came from a value transform.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup { .. })
    }

    /// Check if this error indicates an inconsistent modulator list.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::DuplicateKey(_) | Self::KeyCollision { .. })
    }

    /// Check if this error indicates a malformed or too deeply nested query.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::DepthExceeded { .. } | Self::Malformed(_))
    }
}
