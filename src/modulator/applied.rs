//! Record of modulator applications made during one visit.

use std::collections::BTreeMap;

use crate::error::ModulationResult;
use crate::query::ScalarValue;

use super::project::Project;
use super::Modulator;

/// Modulators in the order they were applied.
///
/// Every application site is recorded, so a modulator matching both a
/// filter and a group-by appears twice. Use [`unique`](Self::unique) for the
/// de-duplicated view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedModulators {
    entries: Vec<Modulator>,
}

impl AppliedModulators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, modulator: Modulator) {
        self.entries.push(modulator);
    }

    /// Append everything another record holds, keeping its order.
    pub fn extend(&mut self, other: AppliedModulators) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modulator> {
        self.entries.iter()
    }

    /// Applied modulators with repeats removed, in first-application order.
    pub fn unique(&self) -> Vec<&Modulator> {
        let mut seen: Vec<&Modulator> = Vec::new();
        for m in &self.entries {
            if !seen.iter().any(|s| s.from_key() == m.from_key()) {
                seen.push(m);
            }
        }
        seen
    }

    /// `(from_key, to_key)` pairs for every application, in order.
    pub fn key_pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|m| (m.from_key(), m.to_key()))
            .collect()
    }

    /// Map one result group back to public keys and values.
    ///
    /// Keys written by an applied modulator are renamed to its `from_key`
    /// and their values demodulated. Other keys are copied as-is.
    pub fn demodulate_group(
        &self,
        group: &BTreeMap<String, ScalarValue>,
        projects: &[Project],
    ) -> ModulationResult<BTreeMap<String, ScalarValue>> {
        let applied = self.unique();
        let mut out = BTreeMap::new();
        for (key, value) in group {
            match applied.iter().find(|m| m.to_key() == key) {
                Some(m) => {
                    out.insert(m.from_key().to_string(), m.demodulate(value, projects)?);
                }
                None => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(out)
    }
}

impl IntoIterator for AppliedModulators {
    type Item = Modulator;
    type IntoIter = std::vec::IntoIter<Modulator>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
