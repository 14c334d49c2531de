//! Configuration module.
//!
//! Loads the modulator list and traversal limits from TOML.

mod settings;

pub use settings::{ModulatorSettings, Settings, SettingsError, TransformKind, VisitorSettings};
