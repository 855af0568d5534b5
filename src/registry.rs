//! Content type resolution.
//!
//! The registry holds every content type of a build: the definitions loaded
//! from `types/` plus the virtual types pipelines declare under `dataTypes`.
//! Types are kept sorted by id, which is also the order path prefixes are
//! tried in.
//!
//! ## Resolution order
//!
//! 1. An explicit `type:` in front matter must name a known type.
//! 2. Otherwise the first type whose `paths` contains a prefix of the origin path.
//! 3. Otherwise the single `default: true` type.
//!
//! Step 3 cannot fail: [`ContentTypeRegistry::new`] refuses to build a
//! registry without exactly one default type.

use crate::definition::ContentDefinition;
use crate::types::Origin;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("No content type is marked `default: true`")]
    NoDefaultType,
    #[error("Only one content type may be marked `default: true`, found: {}", .0.join(", "))]
    MultipleDefaultTypes(Vec<String>),
    #[error("Content type `{0}` is defined more than once")]
    DuplicateType(String),
    #[error("Unknown content type `{0}`")]
    MissingContentType(String),
}

#[derive(Debug, Clone)]
pub struct ContentTypeRegistry {
    definitions: Vec<Arc<ContentDefinition>>,
    default_index: usize,
}

impl ContentTypeRegistry {
    /// Merge real definitions with virtual type ids and validate the result.
    ///
    /// A virtual id that matches a real definition is ignored.
    pub fn new(
        definitions: Vec<ContentDefinition>,
        virtual_types: &[String],
    ) -> Result<Self, RegistryError> {
        let mut seen = BTreeSet::new();
        for def in &definitions {
            if !seen.insert(def.id.clone()) {
                return Err(RegistryError::DuplicateType(def.id.clone()));
            }
        }

        let mut all = definitions;
        for id in virtual_types {
            if seen.insert(id.clone()) {
                all.push(ContentDefinition::virtual_type(id.as_str()));
            }
        }
        all.sort_by(|a, b| a.id.cmp(&b.id));

        let defaults: Vec<usize> = all
            .iter()
            .enumerate()
            .filter(|(_, d)| d.default)
            .map(|(i, _)| i)
            .collect();
        let default_index = match defaults.as_slice() {
            [] => return Err(RegistryError::NoDefaultType),
            [index] => *index,
            many => {
                return Err(RegistryError::MultipleDefaultTypes(
                    many.iter().map(|&i| all[i].id.clone()).collect(),
                ));
            }
        };

        Ok(Self {
            definitions: all.into_iter().map(Arc::new).collect(),
            default_index,
        })
    }

    /// Pick the content type for an item.
    pub fn resolve(
        &self,
        origin: &Origin,
        explicit_type: Option<&str>,
    ) -> Result<&Arc<ContentDefinition>, RegistryError> {
        if let Some(id) = explicit_type {
            return self
                .get(id)
                .ok_or_else(|| RegistryError::MissingContentType(id.to_string()));
        }

        let by_path = self.definitions.iter().find(|def| {
            def.paths
                .iter()
                .any(|prefix| origin.path.starts_with(prefix.as_str()))
        });

        Ok(by_path.unwrap_or(&self.definitions[self.default_index]))
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ContentDefinition>> {
        self.definitions.iter().find(|def| def.id == id)
    }

    /// All types, sorted by id.
    pub fn definitions(&self) -> &[Arc<ContentDefinition>] {
        &self.definitions
    }
}
