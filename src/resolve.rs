//! Whole-project resolution.
//!
//! Ties the stages together for one build:
//!
//! ```text
//! kestrel.toml ─┐
//! types/*.yml ──┼─ load_project ─→ Project
//! pipelines/ ───┤
//! contents/ ────┘   (scan, in parallel)
//!
//! Project ─ convert once ─→ [Content] ─┬─ pipeline "html" ─→ ResolvedPipeline
//!                                      └─ pipeline "api"  ─→ ResolvedPipeline
//! ```
//!
//! Every pipeline's `dataTypes` join one registry, so contents are converted a
//! single time. Each pipeline then runs its own steps over that shared list:
//!
//! 1. keep the content types its `contentTypes` lists accept
//! 2. apply `filterRules` (type rule, else `*` rule) with the runtime parameters
//! 3. expand iterator templates into pages
//! 4. build `detail` contexts for every content plus the pipeline-level queries
//!
//! Runtime parameters currently hold `date.now`, the build timestamp.

use crate::config::{self, ConfigError, ProjectConfig};
use crate::content::Content;
use crate::context::{self, ContextBuilder, ContextCache};
use crate::convert::{ContentConverter, ContentResolverError};
use crate::date::DateFormatter;
use crate::definition::{self, ContentDefinition, DefinitionError};
use crate::iterator;
use crate::pipeline::{self, Output, Pipeline, PipelineError, Scope};
use crate::query::{Condition, Parameters};
use crate::registry::{ContentTypeRegistry, RegistryError};
use crate::scan::{self, ScanError};
use crate::types::RawContent;
use crate::value::Value;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Content error: {0}")]
    Content(#[from] ContentResolverError),
    #[error("Unknown pipeline `{0}`")]
    UnknownPipeline(String),
}

/// Everything read from disk for one build.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub definitions: Vec<ContentDefinition>,
    pub pipelines: Vec<Pipeline>,
    pub raw: Vec<RawContent>,
}

/// Load config, content types, pipelines and raw contents under `root`.
pub fn load_project(root: &Path) -> Result<Project, ResolveError> {
    let config = config::load_config(root)?;
    load_project_with(root, config)
}

/// Same as [`load_project`] with an already loaded config.
pub fn load_project_with(root: &Path, config: ProjectConfig) -> Result<Project, ResolveError> {
    let definitions = definition::load_definitions(&config.types_dir(root))?;
    let pipelines = pipeline::load_pipelines(&config.pipelines_dir(root))?;
    let raw = scan::scan(&config.contents_dir(root))?;
    tracing::info!(
        root = %root.display(),
        types = definitions.len(),
        pipelines = pipelines.len(),
        contents = raw.len(),
        "Loaded project"
    );
    Ok(Project {
        root: root.to_path_buf(),
        config,
        definitions,
        pipelines,
        raw,
    })
}

impl Project {
    pub fn pipeline(&self, id: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.id == id)
    }
}

/// One content of a resolved pipeline with its `detail` context.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedContent {
    pub id: String,
    pub slug: String,
    pub content_type: String,
    pub is_iterator: bool,
    pub context: Value,
}

/// The output of one pipeline, ready for a renderer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPipeline {
    pub id: String,
    pub output: Output,
    /// Newest `lastUpdate` among the pipeline's `contentTypes.lastUpdate`
    /// types, as `{ timestamp, formatted }`, or null.
    pub last_update: Value,
    pub contents: Vec<ResolvedContent>,
    /// Pipeline-level queries, rendered.
    pub queries: Value,
}

impl ResolvedPipeline {
    /// Content counts per type, sorted by type id.
    pub fn type_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for content in &self.contents {
            *counts.entry(content.content_type.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn iterator_pages(&self) -> usize {
        self.contents.iter().filter(|c| c.is_iterator).count()
    }
}

/// Result of resolving a project.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Number of contents after conversion, before any pipeline filtering.
    pub converted: usize,
    pub pipelines: Vec<ResolvedPipeline>,
    /// Distinct contexts built across all pipelines.
    pub contexts: usize,
    /// Context requests answered from the cache.
    pub cache_hits: usize,
}

impl Resolution {
    pub fn pipeline(&self, id: &str) -> Option<&ResolvedPipeline> {
        self.pipelines.iter().find(|p| p.id == id)
    }
}

/// Resolve every pipeline of `project`, or only `only` when given.
///
/// `now` is the build time in epoch seconds, bound to `{{date.now}}`.
pub fn resolve(
    project: &Project,
    only: Option<&str>,
    now: f64,
) -> Result<Resolution, ResolveError> {
    let selected: Vec<&Pipeline> = match only {
        Some(id) => vec![
            project
                .pipeline(id)
                .ok_or_else(|| ResolveError::UnknownPipeline(id.to_string()))?,
        ],
        None => project.pipelines.iter().collect(),
    };

    let virtual_types: Vec<String> = project
        .pipelines
        .iter()
        .flat_map(|p| p.data_types.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let registry = ContentTypeRegistry::new(project.definitions.clone(), &virtual_types)?;
    let dates = DateFormatter::from_config(&project.config.date);
    let contents = ContentConverter::new(&registry, &dates).convert_all(project.raw.clone())?;
    tracing::debug!(count = contents.len(), "Converted contents");

    let parameters = runtime_parameters(now);
    let mut cache = ContextCache::new();
    let pipelines = selected
        .into_iter()
        .map(|pipeline| resolve_pipeline(pipeline, &contents, &dates, &parameters, &mut cache))
        .collect();

    Ok(Resolution {
        converted: contents.len(),
        pipelines,
        contexts: cache.len(),
        cache_hits: cache.hits(),
    })
}

/// Placeholder values available to filter rules and queries.
pub fn runtime_parameters(now: f64) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert("date.now".into(), Value::Double(now));
    parameters
}

/// Contents a pipeline keeps: accepted types that pass their filter rule.
pub fn filter_contents(
    pipeline: &Pipeline,
    contents: &[Content],
    parameters: &Parameters,
) -> Vec<Content> {
    let mut rules: BTreeMap<&str, Option<Condition>> = BTreeMap::new();
    contents
        .iter()
        .filter(|content| pipeline.content_types.accepts(content.content_type()))
        .filter(|content| {
            let rule = rules
                .entry(content.content_type())
                .or_insert_with(|| {
                    pipeline
                        .filter_rule(content.content_type())
                        .map(|condition| condition.resolve(parameters))
                });
            rule.as_ref()
                .is_none_or(|condition| condition.matches(&content.query_fields()))
        })
        .cloned()
        .collect()
}

/// Slugs used by more than one content, in first-seen order.
fn duplicate_slugs(contents: &[Content]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for content in contents {
        let slug = content.slug.as_str();
        if !seen.insert(slug) && !duplicates.contains(&slug) {
            duplicates.push(slug);
        }
    }
    duplicates
}

fn resolve_pipeline(
    pipeline: &Pipeline,
    contents: &[Content],
    dates: &DateFormatter,
    parameters: &Parameters,
    cache: &mut ContextCache,
) -> ResolvedPipeline {
    let filtered = filter_contents(pipeline, contents, parameters);
    let expanded = iterator::expand(&filtered, &pipeline.iterators, parameters);

    let last_update = expanded
        .iter()
        .filter(|c| {
            pipeline
                .content_types
                .last_update
                .iter()
                .any(|t| t == c.content_type())
        })
        .map(|c| c.raw.last_modification_date)
        .reduce(f64::max)
        .map(|timestamp| context::date_context(dates, timestamp))
        .unwrap_or_default();

    for slug in duplicate_slugs(&expanded) {
        tracing::warn!(pipeline = %pipeline.id, slug = %slug, "Several contents share a slug");
    }

    let mut builder = ContextBuilder::new(pipeline, &expanded, dates, parameters, cache);
    let resolved: Vec<ResolvedContent> = expanded
        .iter()
        .map(|content| ResolvedContent {
            id: content.id.clone(),
            slug: content.slug.clone(),
            content_type: content.content_type().to_string(),
            is_iterator: content.is_iterator(),
            context: builder.context(content, Scope::DETAIL, 0),
        })
        .collect();
    let queries = builder.pipeline_queries();

    tracing::info!(
        pipeline = %pipeline.id,
        kept = filtered.len(),
        contents = resolved.len(),
        "Resolved pipeline"
    );

    ResolvedPipeline {
        id: pipeline.id.clone(),
        output: pipeline.output.clone(),
        last_update,
        contents: resolved,
        queries,
    }
}
