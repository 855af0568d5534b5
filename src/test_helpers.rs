//! Shared test utilities for the kestrel test suite.
//!
//! Provides builders for typed contents, raw content fixtures, and lookup
//! helpers that panic with the list of available items on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let post = definition("post");
//! let contents = vec![
//!     content(&post, "hello").slug("blog/hello").property("rank", 1).build(),
//!     content(&post, "bye").property("rank", 2).build(),
//! ];
//! assert_eq!(ids(&contents), vec!["hello", "bye"]);
//! assert_eq!(find_content(&contents, "blog/hello").id, "hello");
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing_subscriber::layer::{Context, SubscriberExt};

use crate::content::{Content, IteratorInfo, RelationValue};
use crate::definition::{Cardinality, ContentDefinition};
use crate::types::{Origin, RawContent};
use crate::value::Value;

// =========================================================================
// Definitions and contents
// =========================================================================

/// A content type with only an id.
pub fn definition(id: &str) -> Arc<ContentDefinition> {
    Arc::new(ContentDefinition::virtual_type(id))
}

/// Start building a content of type `definition`. The slug defaults to `id`.
pub fn content(definition: &Arc<ContentDefinition>, id: &str) -> ContentBuilder {
    ContentBuilder {
        definition: Arc::clone(definition),
        id: id.to_string(),
        slug: None,
        markdown: String::new(),
        last_update: 0.0,
        properties: BTreeMap::new(),
        relations: BTreeMap::new(),
        user_defined: BTreeMap::new(),
        iterator_info: None,
    }
}

pub struct ContentBuilder {
    definition: Arc<ContentDefinition>,
    id: String,
    slug: Option<String>,
    markdown: String,
    last_update: f64,
    properties: BTreeMap<String, Value>,
    relations: BTreeMap<String, RelationValue>,
    user_defined: BTreeMap<String, Value>,
    iterator_info: Option<IteratorInfo>,
}

impl ContentBuilder {
    pub fn slug(mut self, slug: &str) -> Self {
        self.slug = Some(slug.to_string());
        self
    }

    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn relation(
        mut self,
        key: &str,
        target_type: &str,
        cardinality: Cardinality,
        identifiers: &[&str],
    ) -> Self {
        self.relations.insert(
            key.to_string(),
            RelationValue {
                content_type: target_type.to_string(),
                cardinality,
                identifiers: identifiers.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn user_defined(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.user_defined.insert(key.to_string(), value.into());
        self
    }

    pub fn markdown(mut self, markdown: &str) -> Self {
        self.markdown = markdown.to_string();
        self
    }

    pub fn last_update(mut self, timestamp: f64) -> Self {
        self.last_update = timestamp;
        self
    }

    pub fn iterator(mut self, info: IteratorInfo) -> Self {
        self.iterator_info = Some(info);
        self
    }

    pub fn build(self) -> Content {
        let slug = self.slug.unwrap_or_else(|| self.id.clone());
        Content {
            raw: RawContent {
                origin: Origin::new(format!("{slug}/index.md"), slug.as_str()),
                front_matter: BTreeMap::new(),
                markdown: self.markdown,
                last_modification_date: self.last_update,
                assets_path: format!("{slug}/assets"),
                assets: Vec::new(),
            },
            definition: self.definition,
            id: self.id,
            slug,
            properties: self.properties,
            relations: self.relations,
            user_defined: self.user_defined,
            iterator_info: self.iterator_info,
        }
    }
}

/// A raw content whose front matter is decoded from `front_matter_yaml`.
pub fn raw(path: &str, slug: &str, front_matter_yaml: &str) -> RawContent {
    let front_matter = if front_matter_yaml.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_yaml::from_str(front_matter_yaml).unwrap()
    };
    RawContent {
        origin: Origin::new(path, slug),
        front_matter,
        markdown: String::new(),
        last_modification_date: 0.0,
        assets_path: String::new(),
        assets: Vec::new(),
    }
}

// =========================================================================
// Lookups and extractors
// =========================================================================

/// Content ids in order.
pub fn ids(contents: &[Content]) -> Vec<&str> {
    contents.iter().map(|c| c.id.as_str()).collect()
}

/// Find a content by slug. Panics if not found.
pub fn find_content<'a>(contents: &'a [Content], slug: &str) -> &'a Content {
    contents.iter().find(|c| c.slug == slug).unwrap_or_else(|| {
        let slugs: Vec<&str> = contents.iter().map(|c| c.slug.as_str()).collect();
        panic!("content '{slug}' not found. Available: {slugs:?}")
    })
}

// =========================================================================
// Logging
// =========================================================================

#[derive(Clone, Default)]
struct WarningCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarningCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Number of warnings logged on this thread while `f` runs.
pub fn count_warnings(f: impl FnOnce()) -> usize {
    let counter = WarningCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    tracing::subscriber::with_default(subscriber, f);
    counter.0.load(Ordering::SeqCst)
}
