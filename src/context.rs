//! Render contexts handed to template and JSON engines.
//!
//! A context is a `Value::Map` describing one content in one scope. The scope
//! (see [`Scope`]) decides which parts are included:
//!
//! ```text
//! always      id, slug, lastUpdate, isIterator, iterator?
//! properties  properties.<key>          dates → { timestamp, formatted }
//! relations   relations.<key>           referenced contents, `reference` scope
//! contents    contents.{html, raw}      markdown rendered with pulldown-cmark
//! queries     queries.<key>             the type's sub-queries, `{{field}}` bound
//! userDefined <key>                     merged at the top level
//! ```
//!
//! Relations, iterator items and sub-query results are contexts themselves.
//! Nesting stops at [`MAX_DEPTH`]; beyond it relations render as bare ids and
//! queries are skipped.
//!
//! Contexts are memoized in a [`ContextCache`] for one build. The same author
//! referenced from a hundred posts is rendered once per pipeline, scope and
//! depth.

use crate::content::Content;
use crate::date::DateFormatter;
use crate::definition::{Cardinality, PropertyType};
use crate::pipeline::{ContextPart, Pipeline, Scope};
use crate::query::{self, Parameters, Query};
use crate::value::Value;
use pulldown_cmark::{Parser, html as md_html};
use std::collections::{BTreeMap, HashMap};

/// Deepest nesting level at which relations and queries are still expanded.
pub const MAX_DEPTH: usize = 2;

/// Memo key for one rendered context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub pipeline: String,
    pub content_type: String,
    pub id: String,
    pub slug: String,
    pub scope: String,
    pub depth: usize,
}

/// Contexts computed during one build, discarded afterwards.
#[derive(Debug, Default)]
pub struct ContextCache {
    entries: HashMap<ContextKey, Value>,
    hits: usize,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }

    fn get(&mut self, key: &ContextKey) -> Option<Value> {
        let value = self.entries.get(key).cloned();
        if value.is_some() {
            self.hits += 1;
        }
        value
    }

    fn insert(&mut self, key: ContextKey, value: Value) {
        self.entries.insert(key, value);
    }
}

/// Builds contexts for the contents of one pipeline.
pub struct ContextBuilder<'a> {
    pipeline: &'a Pipeline,
    contents: &'a [Content],
    dates: &'a DateFormatter,
    parameters: &'a Parameters,
    cache: &'a mut ContextCache,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(
        pipeline: &'a Pipeline,
        contents: &'a [Content],
        dates: &'a DateFormatter,
        parameters: &'a Parameters,
        cache: &'a mut ContextCache,
    ) -> Self {
        Self {
            pipeline,
            contents,
            dates,
            parameters,
            cache,
        }
    }

    /// Context of `content` in the named scope.
    pub fn context(&mut self, content: &Content, scope: &str, depth: usize) -> Value {
        let key = ContextKey {
            pipeline: self.pipeline.id.clone(),
            content_type: content.content_type().to_string(),
            id: content.id.clone(),
            slug: content.slug.clone(),
            scope: scope.to_string(),
            depth,
        };
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }
        let value = self.build(content, scope, depth);
        self.cache.insert(key, value.clone());
        value
    }

    /// Pipeline-level queries, each rendered in its own scope (default `list`).
    pub fn pipeline_queries(&mut self) -> Value {
        let pipeline = self.pipeline;
        let parameters = self.parameters;
        let mut out = BTreeMap::new();
        for (key, query) in &pipeline.queries {
            out.insert(key.clone(), self.query_results(query, parameters, 1));
        }
        Value::Map(out)
    }

    fn build(&mut self, content: &Content, scope_name: &str, depth: usize) -> Value {
        let scope = self.pipeline.scope(content.content_type(), scope_name);
        let mut map = BTreeMap::new();

        map.insert("id".into(), Value::from(content.id.as_str()));
        map.insert("slug".into(), Value::from(content.slug.as_str()));
        map.insert(
            "lastUpdate".into(),
            self.date_value(content.raw.last_modification_date),
        );
        map.insert("isIterator".into(), Value::Bool(content.is_iterator()));
        if let Some(info) = &content.iterator_info {
            let item_scope = info.scope.as_deref().unwrap_or(Scope::LIST);
            let items: Vec<Value> = info
                .items
                .iter()
                .map(|item| self.context(item, item_scope, depth + 1))
                .collect();
            let mut iterator = BTreeMap::new();
            iterator.insert("current".into(), Value::from(info.current));
            iterator.insert("total".into(), Value::from(info.total));
            iterator.insert("limit".into(), Value::from(info.limit));
            iterator.insert("items".into(), Value::Array(items));
            iterator.insert("links".into(), Value::Array(info.links.clone()));
            map.insert("iterator".into(), Value::Map(iterator));
        }

        if scope.includes(ContextPart::Properties) {
            map.insert("properties".into(), self.properties(content));
        }
        if scope.includes(ContextPart::Relations) {
            let relations = self.relations(content, depth);
            map.insert("relations".into(), relations);
        }
        if scope.includes(ContextPart::Contents) {
            map.insert("contents".into(), contents(&content.raw.markdown));
        }
        if scope.includes(ContextPart::Queries) && depth < MAX_DEPTH {
            let queries = self.content_queries(content, depth);
            map.insert("queries".into(), queries);
        }
        if scope.includes(ContextPart::UserDefined) {
            for (key, value) in &content.user_defined {
                map.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        if !scope.fields.is_empty() {
            map.retain(|key, _| scope.fields.iter().any(|f| f == key));
        }
        Value::Map(map)
    }

    fn date_value(&self, timestamp: f64) -> Value {
        date_context(self.dates, timestamp)
    }

    fn properties(&self, content: &Content) -> Value {
        let map = content
            .properties
            .iter()
            .map(|(key, value)| {
                let is_date = content
                    .definition
                    .properties
                    .get(key)
                    .is_some_and(|spec| spec.kind == PropertyType::Date);
                let value = match value.as_double() {
                    Some(timestamp) if is_date => self.date_value(timestamp),
                    _ => value.clone(),
                };
                (key.clone(), value)
            })
            .collect();
        Value::Map(map)
    }

    fn relations(&mut self, content: &Content, depth: usize) -> Value {
        let all = self.contents;
        let mut out = BTreeMap::new();
        for (key, relation) in &content.relations {
            if depth >= MAX_DEPTH {
                let ids = Value::from(relation.identifiers.clone());
                out.insert(key.clone(), ids);
                continue;
            }

            let mut targets: Vec<Content> = relation
                .identifiers
                .iter()
                .filter_map(|id| {
                    all.iter()
                        .find(|c| c.content_type() == relation.content_type && &c.id == id)
                })
                .cloned()
                .collect();
            let order = content
                .definition
                .relations
                .get(key)
                .and_then(|spec| spec.order.clone());
            if let Some(order) = order {
                let query = Query {
                    order_by: vec![order],
                    ..Query::new(relation.content_type.as_str())
                };
                targets = query::run(&targets, &query, self.parameters);
            }

            let rendered: Vec<Value> = targets
                .iter()
                .map(|target| self.context(target, Scope::REFERENCE, depth + 1))
                .collect();
            let value = match relation.cardinality {
                Cardinality::One => rendered.into_iter().next().unwrap_or(Value::Null),
                Cardinality::Many => Value::Array(rendered),
            };
            out.insert(key.clone(), value);
        }
        Value::Map(out)
    }

    /// Run the content type's sub-queries with the content's own fields bound
    /// as placeholders on top of the runtime parameters.
    fn content_queries(&mut self, content: &Content, depth: usize) -> Value {
        let mut parameters = self.parameters.clone();
        parameters.extend(content.query_fields());
        let definition = std::sync::Arc::clone(&content.definition);
        let mut out = BTreeMap::new();
        for (key, query) in &definition.queries {
            out.insert(key.clone(), self.query_results(query, &parameters, depth + 1));
        }
        Value::Map(out)
    }

    fn query_results(&mut self, query: &Query, parameters: &Parameters, depth: usize) -> Value {
        let scope = query.scope.as_deref().unwrap_or(Scope::LIST);
        let results = query::run(self.contents, query, parameters);
        Value::Array(
            results
                .iter()
                .map(|item| self.context(item, scope, depth))
                .collect(),
        )
    }
}

/// `{ timestamp, formatted }` map for an epoch-seconds date.
pub fn date_context(dates: &DateFormatter, timestamp: f64) -> Value {
    let mut date = BTreeMap::new();
    date.insert("timestamp".into(), Value::Double(timestamp));
    date.insert("formatted".into(), Value::from(dates.format(timestamp, None)));
    Value::Map(date)
}

/// Markdown body as rendered HTML plus the raw source.
fn contents(markdown: &str) -> Value {
    let mut html = String::new();
    md_html::push_html(&mut html, Parser::new(markdown));
    let mut map = BTreeMap::new();
    map.insert("html".into(), Value::String(html));
    map.insert("raw".into(), Value::from(markdown));
    Value::Map(map)
}
