//! TOML-based configuration for query modulation.
//!
//! Example configuration:
//! ```toml
//! [visitor]
//! max_depth = 64
//!
//! [[modulators]]
//! from_key = "project"
//! to_key = "project_id"
//! transform = "project_slug"
//!
//! [[modulators]]
//! from_key = "env"
//! to_key = "environment"
//! ```
//!
//! Without a `[[modulators]]` list the standard `project -> project_id`
//! modulator is used.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ModulationError;
use crate::modulator::{Modulator, ModulatorSet, ProjectSlugTransform};
use crate::visitor::DEFAULT_MAX_DEPTH;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid modulators: {0}")]
    Modulators(#[from] ModulationError),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Traversal settings.
    pub visitor: VisitorSettings,

    /// Modulators, in lookup order.
    pub modulators: Vec<ModulatorSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            visitor: VisitorSettings::default(),
            modulators: vec![ModulatorSettings {
                from_key: "project".to_string(),
                to_key: "project_id".to_string(),
                transform: TransformKind::ProjectSlug,
            }],
        }
    }
}

/// Traversal settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VisitorSettings {
    /// Deepest nesting of boolean conditions or formulas accepted.
    pub max_depth: usize,
}

impl Default for VisitorSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One modulator entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModulatorSettings {
    pub from_key: String,
    pub to_key: String,

    /// Value transform applied to compared values.
    #[serde(default)]
    pub transform: TransformKind,
}

impl ModulatorSettings {
    /// Build the modulator this entry describes.
    pub fn to_modulator(&self) -> Modulator {
        let modulator = Modulator::new(&self.from_key, &self.to_key);
        match self.transform {
            TransformKind::Identity => modulator,
            TransformKind::ProjectSlug => modulator.with_transform(ProjectSlugTransform),
        }
    }
}

/// Value transforms selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// Rename the key only.
    #[default]
    Identity,
    /// Resolve project slugs to project ids.
    ProjectSlug,
}

impl Settings {
    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            modulators = settings.modulators.len(),
            "loaded modulation settings"
        );
        Ok(settings)
    }

    /// Parse settings from a TOML string.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values the types alone cannot rule out.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.visitor.max_depth == 0 {
            return Err(SettingsError::InvalidConfig(
                "visitor.max_depth must be at least 1".to_string(),
            ));
        }
        for m in &self.modulators {
            if m.from_key.is_empty() || m.to_key.is_empty() {
                return Err(SettingsError::InvalidConfig(format!(
                    "modulator keys must not be empty (from_key = {:?}, to_key = {:?})",
                    m.from_key, m.to_key
                )));
            }
        }
        Ok(())
    }

    /// Build the validated modulator set.
    pub fn modulator_set(&self) -> Result<ModulatorSet, SettingsError> {
        let modulators = self
            .modulators
            .iter()
            .map(ModulatorSettings::to_modulator)
            .collect();
        Ok(ModulatorSet::new(modulators)?)
    }
}
