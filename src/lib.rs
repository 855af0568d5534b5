//! # Kestrel
//!
//! The content engine of a Markdown static site generator. Content lives in
//! directories of Markdown with YAML front matter; content types give it a
//! schema; pipelines decide what each rendering pass sees. Kestrel resolves all
//! of that into render contexts, plain `Value` maps a template or JSON engine
//! consumes. Rendering itself happens elsewhere.
//!
//! # Architecture
//!
//! ```text
//! 1. Scan       contents/   →  [RawContent]     (filesystem → front matter + body)
//! 2. Convert    RawContent  →  [Content]        (type resolution, typed properties)
//! 3. Pipeline   [Content]   →  [Content]        (type lists, filter rules)
//! 4. Expand     [Content]   →  [Content]        (iterator templates → pages)
//! 5. Contexts   [Content]   →  Value maps       (scopes, relations, sub-queries)
//! ```
//!
//! Stages 2 to 5 are pure functions over in-memory data; only the scan touches
//! the filesystem. Contents are never mutated once converted: iterator pages
//! are new values derived from their template.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the content directory, splits front matter, lists assets |
//! | [`types`] | Raw records shared between scan and conversion (`Origin`, `RawContent`) |
//! | [`naming`] | Slug and id derivation from directory names |
//! | [`value`] | Dynamic value model with non-failing typed accessors |
//! | [`definition`] | Content type schemas loaded from `types/*.yml` |
//! | [`registry`] | Picks the content type of an item: explicit, path prefix, default |
//! | [`convert`] | Applies a content type to a raw item |
//! | [`content`] | Typed content records and the fields queries see |
//! | [`query`] | Condition trees, ordering and paging over contents |
//! | [`iterator`] | Expansion of `{{iterator}}` slugs into paginated pages |
//! | [`pipeline`] | Pipeline declarations from `pipelines/*.yml` |
//! | [`context`] | Scope-driven render contexts with a per-build cache |
//! | [`date`] | Date parsing and formatting |
//! | [`config`] | `kestrel.toml` loading, merging and validation |
//! | [`resolve`] | Runs a whole project through every pipeline |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Schema-Driven Front Matter
//!
//! Front matter keys a content type declares become typed properties or
//! relations; everything else is kept as `user_defined` and passed through to
//! templates untouched. A malformed date is logged and left out rather than
//! failing the build, so one bad file never blocks a site.
//!
//! ## Placeholders, Not Expressions
//!
//! Queries and filter rules compare fields against literals or whole-value
//! placeholders such as `"{{date.now}}"` or, inside a content type's own
//! queries, `"{{id}}"`. There is no expression language to evaluate.
//!
//! ## One Registry Per Build
//!
//! Virtual types declared by any pipeline join a single registry, so every
//! item is converted once and pipelines only filter and expand the shared list.

pub mod config;
pub mod content;
pub mod context;
pub mod convert;
pub mod date;
pub mod definition;
pub mod iterator;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod query;
pub mod registry;
pub mod resolve;
pub mod scan;
pub mod types;
pub mod value;

#[cfg(test)]
pub(crate) mod test_helpers;
