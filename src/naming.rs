//! Slug and id derivation from content directory names.
//!
//! Directories may carry bracketed segments that exist only for ordering or
//! grouping on disk and never reach a URL:
//!
//! ```text
//! contents/
//! ├── [home]/index.md              → slug ""
//! ├── blog/
//! │   ├── [01]hello-world/index.md → slug "blog/hello-world", id "hello-world"
//! │   └── page/{{post.pagination}}/index.md
//! └── about%20us/index.md          → slug "about us", id "about us"
//! ```
//!
//! Percent-encoded names are decoded before brackets are removed. A segment
//! that is empty after stripping is dropped from the slug entirely.

/// Remove every `[...]` substring from a single path segment.
///
/// An unclosed `[` is kept verbatim along with everything after it.
///
/// - `"[01]hello"` → `"hello"`
/// - `"a[x]b[y]c"` → `"abc"`
/// - `"[home]"` → `""`
/// - `"open[ended"` → `"open[ended"`
pub fn strip_bracketed(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(start) = rest.find('[') {
        match rest[start..].find(']') {
            Some(len) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + len + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Percent-decode a segment, falling back to the raw text on invalid UTF-8.
fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Decoded, bracket-stripped, non-empty segments of a `/`-separated path.
fn clean_segments(path: &str) -> impl Iterator<Item = String> + '_ {
    path.split('/')
        .map(|segment| strip_bracketed(&decode(segment)))
        .filter(|segment| !segment.is_empty())
}

/// Build a slug from a directory path relative to the content root.
///
/// - `"blog/[01]hello"` → `"blog/hello"`
/// - `"[home]"` → `""`
pub fn slug_from_dir(rel_dir: &str) -> String {
    clean_segments(rel_dir).collect::<Vec<_>>().join("/")
}

/// Default content id: the last clean segment of the origin's parent directory.
///
/// - `"blog/[01]hello/index.md"` → `"hello"`
/// - `"blog/[draft]/index.md"` → `"blog"`
/// - `"index.md"` → `""`
pub fn id_from_origin_path(origin_path: &str) -> String {
    let parent = match origin_path.rfind('/') {
        Some(pos) => &origin_path[..pos],
        None => "",
    };
    clean_segments(parent).last().unwrap_or_default()
}
