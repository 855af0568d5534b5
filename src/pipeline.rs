//! Pipeline declarations.
//!
//! A pipeline decides which contents one rendering pass sees and how they are
//! exposed to templates. Each file in `pipelines/` declares one:
//!
//! ```yaml
//! id: html
//! contentTypes:
//!   exclude: [rss]
//!   lastUpdate: [post]
//! dataTypes: [sitemap]
//! filterRules:
//!   "*":
//!     key: draft
//!     operator: notEquals
//!     value: true
//!   post:
//!     key: publication
//!     operator: lessThanOrEquals
//!     value: "{{date.now}}"
//! iterators:
//!   post.pagination:
//!     contentType: post
//!     limit: 10
//!     scope: list
//! queries:
//!   featured:
//!     contentType: post
//!     filter: { key: featured, operator: equals, value: true }
//! scopes:
//!   post:
//!     list:
//!       context: [properties]
//!       fields: [title, slug]
//! output:
//!   path: "{{slug}}"
//!   file: index
//!   ext: html
//! ```
//!
//! Keys for `filterRules` and `scopes` are content type ids or `*`, which
//! applies to every type without its own entry.

use crate::definition::yaml_files;
use crate::query::{Condition, Query};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key matching every content type in `filterRules` and `scopes`.
pub const WILDCARD: &str = "*";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid pipeline {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Pipeline `{0}` is defined more than once")]
    Duplicate(String),
}

/// Parts of a content a scope exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextPart {
    Properties,
    Relations,
    Contents,
    Queries,
    UserDefined,
}

/// A named view of a content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scope {
    pub context: Vec<ContextPart>,
    /// Top-level keys to keep. Empty keeps everything.
    pub fields: Vec<String>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::detail()
    }
}

impl Scope {
    pub const REFERENCE: &'static str = "reference";
    pub const LIST: &'static str = "list";
    pub const DETAIL: &'static str = "detail";

    pub fn new(context: &[ContextPart]) -> Self {
        Self {
            context: context.to_vec(),
            fields: Vec::new(),
        }
    }

    fn reference() -> Self {
        Self::new(&[ContextPart::Properties])
    }

    fn list() -> Self {
        Self::new(&[ContextPart::Properties, ContextPart::Relations])
    }

    fn detail() -> Self {
        Self::new(&[
            ContextPart::Properties,
            ContextPart::Relations,
            ContextPart::Contents,
            ContextPart::Queries,
            ContextPart::UserDefined,
        ])
    }

    /// Built-in scope for a well-known name; unknown names get `detail`.
    pub fn builtin(name: &str) -> Self {
        match name {
            Self::REFERENCE => Self::reference(),
            Self::LIST => Self::list(),
            _ => Self::detail(),
        }
    }

    pub fn includes(&self, part: ContextPart) -> bool {
        self.context.contains(&part)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ContentTypes {
    /// Types to keep. Empty keeps every type.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Types whose newest `lastUpdate` is reported for the pipeline.
    pub last_update: Vec<String>,
}

impl ContentTypes {
    pub fn accepts(&self, type_id: &str) -> bool {
        (self.include.is_empty() || self.include.iter().any(|t| t == type_id))
            && !self.exclude.iter().any(|t| t == type_id)
    }
}

/// Output location templates, reported to renderers as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Output {
    pub path: String,
    pub file: String,
    pub ext: String,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            path: "{{slug}}".to_string(),
            file: "index".to_string(),
            ext: "html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Pipeline {
    pub id: String,
    /// Content type (or `*`) → scope name → scope.
    pub scopes: BTreeMap<String, BTreeMap<String, Scope>>,
    /// Pipeline-level queries exposed to every render.
    pub queries: BTreeMap<String, Query>,
    /// Virtual content types that exist only for this pipeline.
    pub data_types: Vec<String>,
    pub content_types: ContentTypes,
    pub iterators: BTreeMap<String, Query>,
    /// Content type (or `*`) → condition a content must satisfy.
    pub filter_rules: BTreeMap<String, Condition>,
    pub output: Output,
}

impl Pipeline {
    /// Scope lookup: type entry, then `*` entry, then the built-in scope.
    pub fn scope(&self, type_id: &str, name: &str) -> Scope {
        [type_id, WILDCARD]
            .iter()
            .find_map(|key| self.scopes.get(*key).and_then(|scopes| scopes.get(name)))
            .cloned()
            .unwrap_or_else(|| Scope::builtin(name))
    }

    /// The filter rule for a type; a type-specific rule replaces `*`.
    pub fn filter_rule(&self, type_id: &str) -> Option<&Condition> {
        self.filter_rules
            .get(type_id)
            .or_else(|| self.filter_rules.get(WILDCARD))
    }
}

/// Parse a single pipeline; an empty `id` falls back to `stem`.
pub fn parse_pipeline(yaml: &str, stem: &str) -> Result<Pipeline, serde_yaml::Error> {
    let mut pipeline: Pipeline = serde_yaml::from_str(yaml)?;
    if pipeline.id.is_empty() {
        pipeline.id = stem.to_string();
    }
    Ok(pipeline)
}

/// Load every pipeline file in `dir`, sorted by file name.
pub fn load_pipelines(dir: &Path) -> Result<Vec<Pipeline>, PipelineError> {
    let mut pipelines: Vec<Pipeline> = Vec::new();
    for path in yaml_files(dir)? {
        let content = fs::read_to_string(&path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let pipeline = parse_pipeline(&content, &stem).map_err(|source| PipelineError::Yaml {
            path: path.clone(),
            source,
        })?;
        if pipelines.iter().any(|p| p.id == pipeline.id) {
            return Err(PipelineError::Duplicate(pipeline.id));
        }
        pipelines.push(pipeline);
    }
    Ok(pipelines)
}
