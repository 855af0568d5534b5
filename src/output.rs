//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity is shown by its identity first (slug, type id, pipeline id)
//! with its source as an indented secondary line, so the output reads as a
//! content inventory that can still be traced back to files.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Content types
//! 001 author
//!     Paths: authors
//! 002 page (default)
//!
//! Pipelines
//! 001 html → {{slug}}/index.html
//!     Iterators: post.pagination
//!
//! Contents
//! 001 / (page)
//!     Source: [home]/index.md
//! 002 blog/hello (post)
//!     Source: blog/[01]hello/index.md
//!     Assets: 2
//! ```
//!
//! ## Resolve
//!
//! ```text
//! html → {{slug}}/index.html
//!     page: 2, post: 5
//!     Last update: 2024-01-02
//!     001 / (page)
//!     002 blog/hello (post)
//!     003 blog/page/1 (page, page 1 of 2)
//!
//! Resolved 7 contents into 1 pipeline (19 contexts, 6 cache hits)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function returning `Vec<String>` for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::pipeline::Output;
use crate::resolve::{Project, Resolution, ResolvedContent, ResolvedPipeline};
use crate::value::Value;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// The root slug is empty; show it as `/`.
fn display_slug(slug: &str) -> &str {
    if slug.is_empty() { "/" } else { slug }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Output templates joined the way a renderer would lay them out.
///
/// ```text
/// {{slug}}/index.html
/// feed.xml            // empty path
/// ```
fn output_pattern(output: &Output) -> String {
    let file = format!("{}.{}", output.file, output.ext);
    if output.path.is_empty() {
        file
    } else {
        format!("{}/{}", output.path, file)
    }
}

// ============================================================================
// Check
// ============================================================================

/// Inventory of a loaded project: types, pipelines and raw contents.
pub fn format_project(project: &Project) -> Vec<String> {
    let mut lines = vec!["Content types".to_string()];
    for (i, def) in project.definitions.iter().enumerate() {
        let marker = if def.default { " (default)" } else { "" };
        lines.push(format!("{} {}{}", format_index(i + 1), def.id, marker));
        if !def.paths.is_empty() {
            lines.push(format!("{}Paths: {}", indent(1), def.paths.join(", ")));
        }
    }

    lines.push(String::new());
    lines.push("Pipelines".to_string());
    for (i, pipeline) in project.pipelines.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            pipeline.id,
            output_pattern(&pipeline.output)
        ));
        if !pipeline.data_types.is_empty() {
            lines.push(format!(
                "{}Data types: {}",
                indent(1),
                pipeline.data_types.join(", ")
            ));
        }
        if !pipeline.iterators.is_empty() {
            let ids: Vec<&str> = pipeline.iterators.keys().map(String::as_str).collect();
            lines.push(format!("{}Iterators: {}", indent(1), ids.join(", ")));
        }
    }

    lines.push(String::new());
    lines.push("Contents".to_string());
    for (i, raw) in project.raw.iter().enumerate() {
        let type_hint = raw
            .front_matter
            .get("type")
            .and_then(Value::as_str)
            .map(|t| format!(" ({t})"))
            .unwrap_or_default();
        lines.push(format!(
            "{} {}{}",
            format_index(i + 1),
            display_slug(&raw.origin.slug),
            type_hint
        ));
        lines.push(format!("{}Source: {}", indent(1), raw.origin.path));
        if !raw.assets.is_empty() {
            lines.push(format!("{}Assets: {}", indent(1), raw.assets.len()));
        }
    }
    lines
}

pub fn print_project(project: &Project) {
    for line in format_project(project) {
        println!("{}", line);
    }
}

// ============================================================================
// Resolve
// ============================================================================

fn content_line(index: usize, content: &ResolvedContent) -> String {
    let page = content
        .context
        .as_map()
        .and_then(|ctx| ctx.get("iterator"))
        .and_then(Value::as_map)
        .and_then(|it| Some((it.get("current")?.as_int()?, it.get("total")?.as_int()?)));
    match page {
        Some((current, total)) => format!(
            "{} {} ({}, page {} of {})",
            format_index(index),
            display_slug(&content.slug),
            content.content_type,
            current,
            total
        ),
        None => format!(
            "{} {} ({})",
            format_index(index),
            display_slug(&content.slug),
            content.content_type
        ),
    }
}

/// One pipeline: header, per-type counts, last update and optionally every content.
pub fn format_pipeline(pipeline: &ResolvedPipeline, list_contents: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "{} → {}",
        pipeline.id,
        output_pattern(&pipeline.output)
    )];

    let counts: Vec<String> = pipeline
        .type_counts()
        .iter()
        .map(|(type_id, n)| format!("{type_id}: {n}"))
        .collect();
    if counts.is_empty() {
        lines.push(format!("{}(no contents)", indent(1)));
    } else {
        lines.push(format!("{}{}", indent(1), counts.join(", ")));
    }

    let formatted = pipeline
        .last_update
        .as_map()
        .and_then(|date| date.get("formatted"))
        .and_then(Value::as_str);
    if let Some(date) = formatted {
        lines.push(format!("{}Last update: {}", indent(1), date));
    }

    if list_contents {
        for (i, content) in pipeline.contents.iter().enumerate() {
            lines.push(format!("{}{}", indent(1), content_line(i + 1, content)));
        }
    }
    lines
}

pub fn format_resolution(resolution: &Resolution, list_contents: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for pipeline in &resolution.pipelines {
        lines.extend(format_pipeline(pipeline, list_contents));
        lines.push(String::new());
    }
    lines.push(format!(
        "Resolved {} into {} ({}, {})",
        plural(resolution.converted, "content"),
        plural(resolution.pipelines.len(), "pipeline"),
        plural(resolution.contexts, "context"),
        plural(resolution.cache_hits, "cache hit"),
    ));
    lines
}

pub fn print_resolution(resolution: &Resolution, list_contents: bool) {
    for line in format_resolution(resolution, list_contents) {
        println!("{}", line);
    }
}
