//! Project configuration module.
//!
//! Handles loading, validating, and merging `kestrel.toml`. The file lives at
//! the project root and is layered over stock defaults, so it only needs the
//! keys it wants to change.
//!
//! ## Project Layout
//!
//! ```text
//! site/
//! ├── kestrel.toml             # Project config (optional)
//! ├── contents/                # Markdown + front matter, one item per directory
//! ├── types/                   # Content type definitions (*.yml)
//! └── pipelines/               # Pipeline declarations (*.yml)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [contents]
//! path = "contents"               # Content directory, relative to the project
//!
//! [types]
//! path = "types"                  # Content type definitions
//!
//! [pipelines]
//! path = "pipelines"              # Pipeline declarations
//!
//! [date]
//! input_format = "%Y-%m-%d %H:%M:%S"  # Front matter dates (chrono strftime)
//! output_format = "%Y-%m-%d"          # Dates in render contexts
//!
//! [processing]
//! max_processes = 4               # Parallel parsers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::date;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name looked up in the project root.
pub const CONFIG_FILE: &str = "kestrel.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `kestrel.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub contents: PathConfig,
    pub types: PathConfig,
    pub pipelines: PathConfig,
    pub date: DateConfig,
    pub processing: ProcessingConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            contents: PathConfig::new("contents"),
            types: PathConfig::new("types"),
            pipelines: PathConfig::new("pipelines"),
            date: DateConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, paths) in [
            ("contents", &self.contents),
            ("types", &self.types),
            ("pipelines", &self.pipelines),
        ] {
            if paths.path.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{section}.path must not be empty"
                )));
            }
        }
        for (key, format) in [
            ("date.input_format", &self.date.input_format),
            ("date.output_format", &self.date.output_format),
        ] {
            if format.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            if !date::is_valid_format(format) {
                return Err(ConfigError::Validation(format!(
                    "{key} is not a valid date format: {format:?}"
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn contents_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.contents.path)
    }

    pub fn types_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.types.path)
    }

    pub fn pipelines_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.pipelines.path)
    }
}

/// A directory relative to the project root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathConfig {
    pub path: String,
}

impl PathConfig {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

/// Date formats, chrono strftime syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DateConfig {
    /// Format of front matter dates without a per-property format.
    pub input_format: String,
    /// Format of `formatted` dates in render contexts.
    pub output_format: String,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            input_format: "%Y-%m-%d %H:%M:%S".to_string(),
            output_format: "%Y-%m-%d".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel content parsers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ProjectConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `kestrel.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ProjectConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ProjectConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the project config from `root`, falling back to stock defaults.
pub fn load_config(root: &Path) -> Result<ProjectConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `kestrel.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Kestrel Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the project root as kestrel.toml.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Project directories, relative to the project root
# ---------------------------------------------------------------------------

[contents]
# One content item per directory: index.md (front matter + markdown)
# or index.yml for data-only items.
path = "contents"

[types]
# Content type definitions, one YAML file per type.
path = "types"

[pipelines]
# Pipeline declarations, one YAML file per pipeline.
path = "pipelines"

# ---------------------------------------------------------------------------
# Dates (chrono strftime syntax)
# ---------------------------------------------------------------------------
[date]
# Front matter dates for properties without their own `format`.
# A property's own `format` in its content type takes precedence.
input_format = "%Y-%m-%d %H:%M:%S"

# Dates exposed to templates as `formatted`.
output_format = "%Y-%m-%d"

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel content parsers.
# Omit to use all available CPU cores. Values above the core count are clamped.
# max_processes = 4
"##
}
