//! Value transforms applied by modulators.
//!
//! A transform receives one non-list scalar at a time; list handling lives in
//! [`Modulator`](super::Modulator).

use std::fmt;

use crate::error::{ModulationError, ModulationResult};
use crate::query::ScalarValue;

use super::project::{find_by_id, find_by_slug, Project};

/// Translates a single value between its public and internal form.
///
/// Implementations must be pure: the same input and project list always
/// produce the same output, with no caching or other side effects.
pub trait ValueTransform: fmt::Debug + Send + Sync {
    /// Short name used in logs and configuration.
    fn name(&self) -> &str;

    /// Public value to internal value.
    fn modulate(
        &self,
        key: &str,
        value: &ScalarValue,
        projects: &[Project],
    ) -> ModulationResult<ScalarValue>;

    /// Internal value back to public value. Defaults to the identity.
    fn demodulate(
        &self,
        _key: &str,
        value: &ScalarValue,
        _projects: &[Project],
    ) -> ModulationResult<ScalarValue> {
        Ok(value.clone())
    }
}

/// Resolves project slugs to project ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectSlugTransform;

impl ValueTransform for ProjectSlugTransform {
    fn name(&self) -> &str {
        "project_slug"
    }

    fn modulate(
        &self,
        key: &str,
        value: &ScalarValue,
        projects: &[Project],
    ) -> ModulationResult<ScalarValue> {
        value
            .as_str()
            .and_then(|slug| find_by_slug(projects, slug))
            .and_then(|project| i64::try_from(project.id).ok())
            .map(ScalarValue::Int)
            .ok_or_else(|| ModulationError::lookup(key, value))
    }

    fn demodulate(
        &self,
        key: &str,
        value: &ScalarValue,
        projects: &[Project],
    ) -> ModulationResult<ScalarValue> {
        value
            .as_int()
            .and_then(|id| u64::try_from(id).ok())
            .and_then(|id| find_by_id(projects, id))
            .map(|project| ScalarValue::String(project.slug.clone()))
            .ok_or_else(|| ModulationError::lookup(key, value))
    }
}

type TransformFn =
    dyn Fn(&ScalarValue, &[Project]) -> ModulationResult<ScalarValue> + Send + Sync;

/// A forward-only transform backed by a closure.
pub struct FnTransform {
    name: String,
    func: Box<TransformFn>,
}

impl FnTransform {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&ScalarValue, &[Project]) -> ModulationResult<ScalarValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for FnTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ValueTransform for FnTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn modulate(
        &self,
        _key: &str,
        value: &ScalarValue,
        projects: &[Project],
    ) -> ModulationResult<ScalarValue> {
        (self.func)(value, projects)
    }
}
