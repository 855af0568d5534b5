//! Raw content → typed [`Content`].
//!
//! The converter applies the resolved content type to one [`RawContent`]:
//!
//! | Front matter | Ends up in |
//! |--------------|------------|
//! | `type` | content type lookup |
//! | `id` | `Content::id` (default: parent directory name) |
//! | `slug` | `Content::slug` (default: origin slug; `""` is honored) |
//! | declared property | `properties` (dates as epoch seconds) |
//! | declared relation | `relations` |
//! | anything else | `user_defined` |
//!
//! Declared keys are visited in sorted order so warnings come out in the same
//! order on every run. A date that fails to parse is logged and its key left
//! out; it never aborts the build.

use crate::content::{Content, RelationValue};
use crate::date::DateFormatter;
use crate::definition::{Cardinality, ContentDefinition, PropertyType};
use crate::naming;
use crate::registry::{ContentTypeRegistry, RegistryError};
use crate::types::{Origin, RawContent};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Front matter keys consumed by the converter itself.
const RESERVED_KEYS: &[&str] = &["id", "type", "slug"];

#[derive(Error, Debug)]
pub enum ContentResolverError {
    #[error("Unknown content type `{type_id}` in {}", .origin.path)]
    MissingContentType { type_id: String, origin: Origin },
    #[error("Cannot convert {}: {message}", .origin.path)]
    Unknown { origin: Origin, message: String },
}

pub struct ContentConverter<'a> {
    registry: &'a ContentTypeRegistry,
    dates: &'a DateFormatter,
}

impl<'a> ContentConverter<'a> {
    pub fn new(registry: &'a ContentTypeRegistry, dates: &'a DateFormatter) -> Self {
        Self { registry, dates }
    }

    /// Convert every raw item, stopping at the first hard error.
    pub fn convert_all(&self, raws: Vec<RawContent>) -> Result<Vec<Content>, ContentResolverError> {
        raws.into_iter().map(|raw| self.convert(raw)).collect()
    }

    pub fn convert(&self, raw: RawContent) -> Result<Content, ContentResolverError> {
        let explicit_type = match raw.front_matter.get("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id.as_str()),
            Some(other) => {
                return Err(ContentResolverError::Unknown {
                    origin: raw.origin.clone(),
                    message: format!("`type` must be a string, found {}", other.kind()),
                });
            }
        };

        let definition = self
            .registry
            .resolve(&raw.origin, explicit_type)
            .map_err(|err| match err {
                RegistryError::MissingContentType(type_id) => {
                    ContentResolverError::MissingContentType {
                        type_id,
                        origin: raw.origin.clone(),
                    }
                }
                other => ContentResolverError::Unknown {
                    origin: raw.origin.clone(),
                    message: other.to_string(),
                },
            })?;
        let definition = Arc::clone(definition);

        let slug = match raw.front_matter.get("slug") {
            Some(Value::String(slug)) => slug.clone(),
            _ => raw.origin.slug.clone(),
        };
        let id = match raw.front_matter.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => naming::id_from_origin_path(&raw.origin.path),
        };

        let properties = self.convert_properties(&definition, &raw, &slug);
        let relations = convert_relations(&definition, &raw.front_matter);
        let user_defined = raw
            .front_matter
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()) && !definition.declares(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Content {
            definition,
            id,
            slug,
            raw,
            properties,
            relations,
            user_defined,
            iterator_info: None,
        })
    }

    fn convert_properties(
        &self,
        definition: &ContentDefinition,
        raw: &RawContent,
        slug: &str,
    ) -> BTreeMap<String, Value> {
        let mut properties = BTreeMap::new();
        for (key, spec) in &definition.properties {
            let value = raw
                .front_matter
                .get(key)
                .or(spec.default.as_ref())
                .cloned()
                .unwrap_or_default();

            if spec.required && value.is_null() {
                tracing::warn!(
                    key = %key,
                    slug = %slug,
                    content_type = %definition.id,
                    "Missing required property"
                );
            }

            if spec.kind != PropertyType::Date || value.is_null() {
                properties.insert(key.clone(), value);
                continue;
            }

            let parsed = value
                .as_str()
                .and_then(|s| self.dates.parse(s, spec.format.as_deref()));
            match parsed {
                Some(timestamp) => {
                    properties.insert(key.clone(), Value::Double(timestamp));
                }
                None => {
                    tracing::warn!(
                        key = %key,
                        value = ?value,
                        slug = %slug,
                        content_type = %definition.id,
                        "Invalid date property, skipping"
                    );
                }
            }
        }
        properties
    }
}

fn convert_relations(
    definition: &ContentDefinition,
    front_matter: &BTreeMap<String, Value>,
) -> BTreeMap<String, RelationValue> {
    definition
        .relations
        .iter()
        .map(|(key, spec)| {
            let identifiers = match (spec.cardinality, front_matter.get(key)) {
                (Cardinality::One, Some(Value::String(id))) => vec![id.clone()],
                (Cardinality::Many, Some(Value::Array(items))) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(String::from))
                    .collect(),
                _ => Vec::new(),
            };
            let relation = RelationValue {
                content_type: spec.references.clone(),
                cardinality: spec.cardinality,
                identifiers,
            };
            (key.clone(), relation)
        })
        .collect()
}
