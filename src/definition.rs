//! Content type definitions.
//!
//! Each file in the project's `types/` directory declares one content type:
//!
//! ```yaml
//! id: post
//! paths:
//!   - blog/posts
//! properties:
//!   title:
//!     type: string
//!   publication:
//!     type: date
//!     format: "%Y-%m-%d"
//!   featured:
//!     type: bool
//!     default: false
//! relations:
//!   authors:
//!     references: author
//!     type: many
//!     order:
//!       key: name
//! queries:
//!   related:
//!     contentType: post
//!     limit: 3
//!     filter:
//!       key: tags
//!       operator: matching
//!       value: "{{tags}}"
//! ```
//!
//! `id` defaults to the file stem. Exactly one type across the project must
//! set `default: true`; [`ContentTypeRegistry`](crate::registry::ContentTypeRegistry)
//! enforces this when it is built.

use crate::query::{Order, Query};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid content type {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Int,
    Double,
    Bool,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub kind: PropertyType,
    /// Input format for `date` properties; the project default applies otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Used when the front matter omits the property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Missing required properties are reported but still stored as `Null`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationSpec {
    /// Target content type id.
    pub references: String,
    #[serde(rename = "type")]
    pub cardinality: Cardinality,
    /// Sort applied to the referenced contents when rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentDefinition {
    pub id: String,
    /// Origin path prefixes that imply this type.
    pub paths: Vec<String>,
    pub properties: BTreeMap<String, PropertySpec>,
    pub relations: BTreeMap<String, RelationSpec>,
    /// Named sub-queries evaluated per content at render time.
    pub queries: BTreeMap<String, Query>,
    pub default: bool,
}

impl ContentDefinition {
    /// A type that exists only as an id, declared by a pipeline.
    pub fn virtual_type(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether a declared key (property or relation) is claimed by this type.
    pub fn declares(&self, key: &str) -> bool {
        self.properties.contains_key(key) || self.relations.contains_key(key)
    }
}

/// Parse a single definition; an empty `id` falls back to `stem`.
pub fn parse_definition(yaml: &str, stem: &str) -> Result<ContentDefinition, serde_yaml::Error> {
    let mut definition: ContentDefinition = serde_yaml::from_str(yaml)?;
    if definition.id.is_empty() {
        definition.id = stem.to_string();
    }
    Ok(definition)
}

/// Load every `*.yml` / `*.yaml` file in `dir`, sorted by file name.
///
/// A missing directory yields no definitions.
pub fn load_definitions(dir: &Path) -> Result<Vec<ContentDefinition>, DefinitionError> {
    yaml_files(dir)?
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path)?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            parse_definition(&content, &stem).map_err(|source| DefinitionError::Yaml {
                path: path.clone(),
                source,
            })
        })
        .collect()
}

/// YAML files directly inside `dir`, sorted. Hidden files are skipped.
pub(crate) fn yaml_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let hidden = p
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true);
            p.is_file()
                && !hidden
                && p.extension()
                    .map(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}
