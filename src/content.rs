//! Typed content records.
//!
//! A [`Content`] is a [`RawContent`] after its content type has been resolved
//! and its front matter split into declared properties, declared relations and
//! everything else (`user_defined`). Contents are values: the iterator
//! expander derives new contents from old ones instead of editing them.

use crate::definition::{Cardinality, ContentDefinition};
use crate::types::RawContent;
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A resolved relation: which type it points at and the referenced ids.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationValue {
    pub content_type: String,
    pub cardinality: Cardinality,
    /// Target ids. At most one entry for [`Cardinality::One`].
    pub identifiers: Vec<String>,
}

/// Pagination state attached to an expanded iterator page.
#[derive(Debug, Clone)]
pub struct IteratorInfo {
    /// 1-based page number.
    pub current: usize,
    /// Number of pages.
    pub total: usize,
    /// Items per page.
    pub limit: usize,
    /// Contents on this page.
    pub items: Vec<Content>,
    /// Page links, filled in by renderers that need them.
    pub links: Vec<Value>,
    /// Scope the items render in.
    pub scope: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Content {
    pub definition: Arc<ContentDefinition>,
    pub id: String,
    pub slug: String,
    pub raw: RawContent,
    /// Declared properties, dates already converted to epoch seconds.
    pub properties: BTreeMap<String, Value>,
    pub relations: BTreeMap<String, RelationValue>,
    /// Front matter not claimed by `id`/`type`/`slug` or a declared key.
    pub user_defined: BTreeMap<String, Value>,
    pub iterator_info: Option<IteratorInfo>,
}

impl Content {
    pub fn content_type(&self) -> &str {
        &self.definition.id
    }

    pub fn is_iterator(&self) -> bool {
        self.iterator_info.is_some()
    }

    /// Flatten into the field map queries filter and sort on.
    ///
    /// Properties pass through; a `one` relation becomes its id (or null), a
    /// `many` relation an array of ids. `id`, `slug`, `lastUpdate` and
    /// `iterator` are synthesized and take precedence over same-named
    /// properties.
    pub fn query_fields(&self) -> BTreeMap<String, Value> {
        let mut fields = self.properties.clone();
        for (key, relation) in &self.relations {
            let value = match relation.cardinality {
                Cardinality::One => relation
                    .identifiers
                    .first()
                    .map(|id| Value::from(id.as_str()))
                    .unwrap_or(Value::Null),
                Cardinality::Many => Value::from(relation.identifiers.clone()),
            };
            fields.insert(key.clone(), value);
        }
        fields.insert("id".into(), Value::from(self.id.as_str()));
        fields.insert("slug".into(), Value::from(self.slug.as_str()));
        fields.insert(
            "lastUpdate".into(),
            Value::Double(self.raw.last_modification_date),
        );
        fields.insert("iterator".into(), Value::Bool(self.is_iterator()));
        fields
    }

    /// Derive an iterator page: every text field passed through `rewrite`,
    /// pagination state attached.
    ///
    /// Rewrites `id`, `slug`, string-valued properties and user-defined
    /// fields, and the markdown body. `self` is left untouched.
    pub fn with_iterator_page(&self, rewrite: impl Fn(&str) -> String, info: IteratorInfo) -> Self {
        let rewrite_values = |values: &BTreeMap<String, Value>| -> BTreeMap<String, Value> {
            values
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => Value::String(rewrite(s)),
                        other => other.clone(),
                    };
                    (key.clone(), value)
                })
                .collect()
        };

        Self {
            definition: Arc::clone(&self.definition),
            id: rewrite(&self.id),
            slug: rewrite(&self.slug),
            raw: RawContent {
                markdown: rewrite(&self.raw.markdown),
                ..self.raw.clone()
            },
            properties: rewrite_values(&self.properties),
            relations: self.relations.clone(),
            user_defined: rewrite_values(&self.user_defined),
            iterator_info: Some(info),
        }
    }
}
