//! Modulators: translation rules between public query fields and their
//! internal storage representation.
//!
//! A [`Modulator`] renames a key (`project` -> `project_id`) and optionally
//! translates the values compared against it (a project slug into a project
//! id). Modulators are grouped in a validated [`ModulatorSet`] before a
//! visitor may use them.
//!
//! # Example
//!
//! ```
//! use metrics_query::modulator::{Modulator, ModulatorSet, Project};
//! use metrics_query::query::ScalarValue;
//!
//! let set = ModulatorSet::new(vec![
//!     Modulator::project(),
//!     Modulator::new("env", "environment"),
//! ])
//! .unwrap();
//!
//! let projects = vec![Project::new(42, "my-proj")];
//! let project = set.find("project").unwrap();
//! assert_eq!(
//!     project.modulate(&"my-proj".into(), &projects).unwrap(),
//!     ScalarValue::Int(42)
//! );
//! ```

mod applied;
mod project;
mod transform;

pub use applied::AppliedModulators;
pub use project::{find_by_id, find_by_slug, Project};
pub use transform::{FnTransform, ProjectSlugTransform, ValueTransform};

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ModulationError, ModulationResult};
use crate::query::ScalarValue;

/// A key mapping with an optional value transform.
///
/// Cloning is cheap: the transform is shared.
#[derive(Debug, Clone)]
pub struct Modulator {
    from_key: String,
    to_key: String,
    transform: Option<Arc<dyn ValueTransform>>,
}

impl Modulator {
    /// A key-only modulator; values pass through unchanged.
    pub fn new(from_key: impl Into<String>, to_key: impl Into<String>) -> Self {
        Self {
            from_key: from_key.into(),
            to_key: to_key.into(),
            transform: None,
        }
    }

    /// The standard `project` -> `project_id` modulator resolving slugs to ids.
    pub fn project() -> Self {
        Self::new("project", "project_id").with_transform(ProjectSlugTransform)
    }

    pub fn with_transform(mut self, transform: impl ValueTransform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Attach a closure as a forward-only value transform.
    pub fn with_fn<F>(self, name: &str, func: F) -> Self
    where
        F: Fn(&ScalarValue, &[Project]) -> ModulationResult<ScalarValue> + Send + Sync + 'static,
    {
        self.with_transform(FnTransform::new(name, func))
    }

    pub fn from_key(&self) -> &str {
        &self.from_key
    }

    pub fn to_key(&self) -> &str {
        &self.to_key
    }

    /// Name of the value transform, or `identity` when there is none.
    pub fn transform_name(&self) -> &str {
        self.transform.as_deref().map_or("identity", |t| t.name())
    }

    /// Translate a public value into its internal form.
    ///
    /// Lists are translated element by element; the first element that
    /// fails fails the whole call.
    pub fn modulate(
        &self,
        value: &ScalarValue,
        projects: &[Project],
    ) -> ModulationResult<ScalarValue> {
        let Some(transform) = &self.transform else {
            return Ok(value.clone());
        };
        match value {
            ScalarValue::List(items) => items
                .iter()
                .map(|item| transform.modulate(&self.from_key, item, projects))
                .collect::<ModulationResult<Vec<_>>>()
                .map(ScalarValue::List),
            _ => transform.modulate(&self.from_key, value, projects),
        }
    }

    /// Translate an internal value back into its public form.
    pub fn demodulate(
        &self,
        value: &ScalarValue,
        projects: &[Project],
    ) -> ModulationResult<ScalarValue> {
        let Some(transform) = &self.transform else {
            return Ok(value.clone());
        };
        match value {
            ScalarValue::List(items) => items
                .iter()
                .map(|item| transform.demodulate(&self.to_key, item, projects))
                .collect::<ModulationResult<Vec<_>>>()
                .map(ScalarValue::List),
            _ => transform.demodulate(&self.to_key, value, projects),
        }
    }
}

impl PartialEq for Modulator {
    fn eq(&self, other: &Self) -> bool {
        self.from_key == other.from_key
            && self.to_key == other.to_key
            && self.transform_name() == other.transform_name()
    }
}

/// An ordered list of modulators with unique source keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModulatorSet {
    modulators: Vec<Modulator>,
}

impl ModulatorSet {
    /// Validate and wrap a modulator list.
    ///
    /// Rejects a `from_key` used twice, and a `to_key` that is another
    /// modulator's `from_key` or another modulator's `to_key`. A modulator
    /// whose `to_key` equals its own `from_key` is allowed.
    pub fn new(modulators: Vec<Modulator>) -> ModulationResult<Self> {
        let mut from_keys = HashSet::new();
        for m in &modulators {
            if !from_keys.insert(m.from_key.as_str()) {
                return Err(ModulationError::DuplicateKey(m.from_key.clone()));
            }
        }

        let mut to_keys = HashSet::new();
        for m in &modulators {
            let targets_other_source =
                m.to_key != m.from_key && from_keys.contains(m.to_key.as_str());
            if targets_other_source || !to_keys.insert(m.to_key.as_str()) {
                return Err(ModulationError::KeyCollision {
                    from_key: m.from_key.clone(),
                    to_key: m.to_key.clone(),
                });
            }
        }

        Ok(Self { modulators })
    }

    /// An empty set: visiting with it leaves queries unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// First modulator whose `from_key` matches.
    pub fn find(&self, from_key: &str) -> Option<&Modulator> {
        self.modulators.iter().find(|m| m.from_key == from_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modulator> {
        self.modulators.iter()
    }

    pub fn len(&self) -> usize {
        self.modulators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modulators.is_empty()
    }
}
