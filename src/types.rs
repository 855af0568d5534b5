//! Raw content records shared between discovery and conversion.
//!
//! These are produced by [`scan`](crate::scan) and consumed by
//! [`convert`](crate::convert). They carry decoded data only; no schema has
//! been applied yet.

use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Where a raw content item was discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    /// Source path relative to the content root, `/`-separated
    /// (e.g. `blog/posts/[01]hello/index.md`).
    pub path: String,
    /// URL key derived from the directory path (e.g. `blog/posts/hello`).
    pub slug: String,
}

impl Origin {
    pub fn new(path: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            slug: slug.into(),
        }
    }
}

/// One discovered content item before schema resolution.
#[derive(Debug, Clone, Serialize)]
pub struct RawContent {
    pub origin: Origin,
    /// Decoded YAML front matter.
    pub front_matter: BTreeMap<String, Value>,
    /// Markdown body following the front matter.
    pub markdown: String,
    /// Modification time of the source file(s), in epoch seconds.
    pub last_modification_date: f64,
    /// Directory holding the item's assets, relative to the content root.
    pub assets_path: String,
    /// Asset file names relative to `assets_path`, sorted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<String>,
}
