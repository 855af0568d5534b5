//! Content discovery.
//!
//! Stage 1 of a build. Walks the content directory and turns every content
//! item into a [`RawContent`]; no schema is applied here.
//!
//! ## Directory Structure
//!
//! ```text
//! contents/
//! ├── [home]/
//! │   └── index.md                 # slug ""
//! ├── blog/
//! │   ├── index.md                 # slug "blog"
//! │   └── [01]hello/
//! │       ├── index.md             # slug "blog/hello"
//! │       └── assets/              # listed, never scanned for items
//! │           ├── cover.jpg
//! │           └── img/diagram.png
//! ├── authors/jane/
//! │   └── index.yml                # YAML only, empty body
//! └── .drafts/                     # hidden, skipped
//! ```
//!
//! A directory is a content item when it holds `index.md`, `index.yml` or
//! `index.yaml` (checked in that order). Markdown files carry optional front
//! matter between two `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! tags: [rust, web]
//! ---
//! # Body starts here
//! ```
//!
//! Front matter must decode to a mapping; anything else is an error naming
//! the file. Items are parsed in parallel and returned sorted by origin path.

use crate::naming;
use crate::types::{Origin, RawContent};
use crate::value::Value;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Content directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("Invalid front matter in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Front matter is not a mapping: {0}")]
    FrontMatterNotMapping(PathBuf),
}

/// Item file names, in priority order.
const INDEX_FILES: &[&str] = &["index.md", "index.yml", "index.yaml"];

/// Per-item directory whose files are listed as assets.
pub const ASSETS_DIR: &str = "assets";

const FRONT_MATTER_FENCE: &str = "---";

pub fn scan(root: &Path) -> Result<Vec<RawContent>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let items = find_items(root)?;
    let mut contents = items
        .par_iter()
        .map(|path| parse_item(root, path))
        .collect::<Result<Vec<_>, _>>()?;
    contents.sort_by(|a, b| a.origin.path.cmp(&b.origin.path));

    tracing::debug!(root = %root.display(), count = contents.len(), "Scanned contents");
    Ok(contents)
}

/// Index file of every item directory under `root`.
fn find_items(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    let mut items = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        if let Some(index) = INDEX_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
        {
            items.push(index);
        }
    }
    Ok(items)
}

fn is_skipped(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && name == ASSETS_DIR)
}

fn parse_item(root: &Path, path: &Path) -> Result<RawContent, ScanError> {
    let dir = path.parent().unwrap_or(root);
    let rel_dir = relative(root, dir);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let text = fs::read_to_string(path)?;
    let is_markdown = path.extension().is_some_and(|e| e == "md");
    let (yaml, markdown) = if is_markdown {
        split_front_matter(&text)
    } else {
        (Some(text.as_str()), "")
    };
    let front_matter = match yaml {
        Some(yaml) => decode_front_matter(yaml, path)?,
        None => BTreeMap::new(),
    };

    let assets_dir = dir.join(ASSETS_DIR);
    let assets = list_assets(&assets_dir)?;

    Ok(RawContent {
        origin: Origin::new(join(&rel_dir, &file_name), naming::slug_from_dir(&rel_dir)),
        front_matter,
        markdown: markdown.to_string(),
        last_modification_date: modification_time(path)?,
        assets_path: join(&rel_dir, ASSETS_DIR),
        assets,
    })
}

/// Split a Markdown document into its front matter block and body.
///
/// Front matter is present only when the first line is `---` and a later
/// line closes it with `---`. Without a closing fence the whole text is body.
///
/// ```text
/// "---\ntitle: A\n---\nBody"  → (Some("title: A\n"), "Body")
/// "# Just markdown"           → (None, "# Just markdown")
/// ```
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text
        .strip_prefix(FRONT_MATTER_FENCE)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            let body = &rest[offset + line.len()..];
            return (Some(&rest[..offset]), body);
        }
        offset += line.len();
    }
    (None, text)
}

fn decode_front_matter(yaml: &str, path: &Path) -> Result<BTreeMap<String, Value>, ScanError> {
    if yaml.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let value: Value = serde_yaml::from_str(yaml).map_err(|source| ScanError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Map(map) => Ok(map),
        Value::Null => Ok(BTreeMap::new()),
        _ => Err(ScanError::FrontMatterNotMapping(path.to_path_buf())),
    }
}

/// Files under `dir`, relative to it with `/` separators, sorted.
fn list_assets(dir: &Path) -> Result<Vec<String>, ScanError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut assets = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            assets.push(relative(dir, entry.path()));
        }
    }
    assets.sort();
    Ok(assets)
}

fn modification_time(path: &Path) -> Result<f64, ScanError> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default())
}

/// `path` relative to `base`, `/`-separated. Empty when they are equal.
fn relative(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn find<'a>(contents: &'a [RawContent], path: &str) -> &'a RawContent {
        contents
            .iter()
            .find(|c| c.origin.path == path)
            .unwrap_or_else(|| {
                let paths: Vec<&str> = contents.iter().map(|c| c.origin.path.as_str()).collect();
                panic!("content '{path}' not found. Available: {paths:?}")
            })
    }

    // =========================================================================
    // Front matter splitting
    // =========================================================================

    #[test]
    fn splits_front_matter_from_body() {
        let (yaml, body) = split_front_matter("---\ntitle: A\n---\n# Body\n");
        assert_eq!(yaml, Some("title: A\n"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn no_front_matter_is_all_body() {
        assert_eq!(split_front_matter("# Title"), (None, "# Title"));
    }

    #[test]
    fn unclosed_front_matter_is_all_body() {
        let text = "---\ntitle: A\n# Body";
        assert_eq!(split_front_matter(text), (None, text));
    }

    #[test]
    fn empty_front_matter_block() {
        assert_eq!(split_front_matter("---\n---\nBody"), (Some(""), "Body"));
    }

    #[test]
    fn handles_crlf_fences() {
        let (yaml, body) = split_front_matter("---\r\ntitle: A\r\n---\r\nBody");
        assert_eq!(yaml, Some("title: A\r\n"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn dashes_inside_body_are_not_fences() {
        let (yaml, body) = split_front_matter("Intro\n---\nMore");
        assert_eq!(yaml, None);
        assert_eq!(body, "Intro\n---\nMore");
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    #[test]
    fn discovers_items_with_slugs_and_front_matter() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "[home]/index.md", "---\ntitle: Home\n---\nWelcome");
        write(tmp.path(), "blog/[01]hello/index.md", "---\ntags: [a, b]\n---\n# Hi");
        write(tmp.path(), "blog/index.md", "Blog root");

        let contents = scan(tmp.path()).unwrap();
        let paths: Vec<&str> = contents.iter().map(|c| c.origin.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["[home]/index.md", "blog/[01]hello/index.md", "blog/index.md"]
        );

        let home = find(&contents, "[home]/index.md");
        assert_eq!(home.origin.slug, "");
        assert_eq!(home.front_matter["title"], Value::from("Home"));
        assert_eq!(home.markdown, "Welcome");

        let hello = find(&contents, "blog/[01]hello/index.md");
        assert_eq!(hello.origin.slug, "blog/hello");
        assert_eq!(hello.front_matter["tags"], Value::from(vec!["a", "b"]));
        assert!(hello.last_modification_date > 0.0);
    }

    #[test]
    fn root_index_has_empty_slug() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "index.md", "Root");
        let contents = scan(tmp.path()).unwrap();
        assert_eq!(contents[0].origin.path, "index.md");
        assert_eq!(contents[0].origin.slug, "");
        assert_eq!(contents[0].assets_path, "assets");
    }

    #[test]
    fn yaml_only_items_have_empty_body() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "authors/jane/index.yml", "name: Jane\n");
        let contents = scan(tmp.path()).unwrap();
        let jane = find(&contents, "authors/jane/index.yml");
        assert_eq!(jane.front_matter["name"], Value::from("Jane"));
        assert_eq!(jane.markdown, "");
        assert_eq!(jane.origin.slug, "authors/jane");
    }

    #[test]
    fn markdown_index_wins_over_yaml() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/index.md", "Body");
        write(tmp.path(), "a/index.yml", "title: ignored\n");
        let contents = scan(tmp.path()).unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].origin.path, "a/index.md");
    }

    #[test]
    fn lists_assets_recursively() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "post/index.md", "Body");
        write(tmp.path(), "post/assets/cover.jpg", "");
        write(tmp.path(), "post/assets/img/diagram.png", "");
        write(tmp.path(), "post/assets/index.md", "not an item");

        let contents = scan(tmp.path()).unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].assets_path, "post/assets");
        assert_eq!(
            contents[0].assets,
            vec!["cover.jpg", "img/diagram.png", "index.md"]
        );
    }

    #[test]
    fn skips_hidden_directories() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), ".drafts/index.md", "Hidden");
        write(tmp.path(), "visible/index.md", "Shown");
        let contents = scan(tmp.path()).unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].origin.path, "visible/index.md");
    }

    #[test]
    fn directories_without_index_are_not_items() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "blog/notes.md", "Loose file");
        write(tmp.path(), "blog/post/index.md", "Item");
        let contents = scan(tmp.path()).unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].origin.slug, "blog/post");
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn non_mapping_front_matter_is_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/index.md", "---\n- one\n- two\n---\nBody");
        let err = scan(tmp.path()).unwrap_err();
        assert!(matches!(err, ScanError::FrontMatterNotMapping(_)));
        assert!(err.to_string().contains("index.md"));
    }

    #[test]
    fn invalid_yaml_names_the_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/index.md", "---\ntitle: [unclosed\n---\nBody");
        let err = scan(tmp.path()).unwrap_err();
        assert!(matches!(err, ScanError::Yaml { .. }));
        assert!(err.to_string().contains("index.md"));
    }

    #[test]
    fn missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = scan(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, ScanError::MissingRoot(_)));
    }

    #[test]
    fn empty_front_matter_decodes_to_empty_map() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/index.md", "---\n---\nBody");
        let contents = scan(tmp.path()).unwrap();
        assert!(contents[0].front_matter.is_empty());
        assert_eq!(contents[0].markdown, "Body");
    }
}
