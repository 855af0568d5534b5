//! Expansion of iterator contents into paginated pages.
//!
//! A content whose slug contains `{{name}}` is an iterator template bound to
//! the pipeline iterator `name`:
//!
//! ```text
//! slug: blog/page/{{post.pagination}}      iterators:
//!                                            post.pagination:
//!                                              contentType: post
//!                                              limit: 3
//! ```
//!
//! With 7 matching posts this yields three contents, `blog/page/1` to
//! `blog/page/3`, holding 3, 3 and 1 items. In every text field of the copy
//! `{{name}}` and `{{number}}` become the page number and `{{total}}` the page
//! count.
//!
//! A template whose name matches no iterator is dropped. An iterator query
//! that matches nothing produces no pages at all, so the template disappears
//! from the output as well.

use crate::content::{Content, IteratorInfo};
use crate::query::{self, Parameters, Query};
use std::collections::BTreeMap;

/// Page size used when an iterator query has no limit.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// The identifier between the first `{{` of `slug` and the next `}}`.
pub fn iterator_id(slug: &str) -> Option<&str> {
    let start = slug.find("{{")? + 2;
    let len = slug[start..].find("}}")?;
    Some(&slug[start..start + len])
}

/// Replace iterator templates with their pages; other contents pass through.
pub fn expand(
    contents: &[Content],
    iterators: &BTreeMap<String, Query>,
    parameters: &Parameters,
) -> Vec<Content> {
    let mut expanded = Vec::with_capacity(contents.len());
    for content in contents {
        let Some(id) = iterator_id(&content.slug) else {
            expanded.push(content.clone());
            continue;
        };
        let Some(query) = iterators.get(id) else {
            tracing::debug!(
                iterator = %id,
                slug = %content.slug,
                "Dropping content bound to an unknown iterator"
            );
            continue;
        };
        expanded.extend(expand_one(content, id, query, contents, parameters));
    }
    expanded
}

fn expand_one(
    template: &Content,
    id: &str,
    query: &Query,
    contents: &[Content],
    parameters: &Parameters,
) -> Vec<Content> {
    let total = query::run(contents, &query.with_window(None, None), parameters).len();
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let pages = total.div_ceil(limit);

    let token = format!("{{{{{id}}}}}");
    (1..=pages)
        .map(|page| {
            let items = query::run_window(
                contents,
                &query.with_window(Some(limit), Some((page - 1) * limit)),
                parameters,
            );
            let info = IteratorInfo {
                current: page,
                total: pages,
                limit,
                items,
                links: Vec::new(),
                scope: query.scope.clone(),
            };
            let number = page.to_string();
            let count = pages.to_string();
            template.with_iterator_page(
                |text| {
                    text.replace(&token, &number)
                        .replace("{{number}}", &number)
                        .replace("{{total}}", &count)
                },
                info,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Direction, Order};
    use crate::test_helpers::*;
    use crate::value::Value;

    fn setup(post_count: i64) -> Vec<Content> {
        let post = definition("post");
        let page = definition("page");
        let mut contents: Vec<Content> = (0..post_count)
            .map(|n| {
                content(&post, &format!("p{n}"))
                    .property("rank", Value::Int(n))
                    .build()
            })
            .collect();
        contents.push(
            content(&page, "blog-{{post.pagination}}")
                .slug("blog/page/{{post.pagination}}")
                .property("title", "Page {{number}} of {{total}}")
                .markdown("Archive page {{post.pagination}}")
                .build(),
        );
        contents
    }

    fn iterators(limit: Option<usize>) -> BTreeMap<String, Query> {
        let mut map = BTreeMap::new();
        map.insert(
            "post.pagination".to_string(),
            Query {
                limit,
                scope: Some("list".into()),
                ..Query::new("post")
            },
        );
        map
    }

    fn pages(expanded: &[Content]) -> Vec<&Content> {
        expanded.iter().filter(|c| c.is_iterator()).collect()
    }

    #[test]
    fn finds_first_placeholder() {
        assert_eq!(iterator_id("blog/{{a}}/{{b}}"), Some("a"));
        assert_eq!(iterator_id("blog/{{}}"), Some(""));
        assert_eq!(iterator_id("blog/{{open"), None);
        assert_eq!(iterator_id("blog/plain"), None);
    }

    #[test]
    fn seven_items_three_per_page_gives_three_pages() {
        let contents = setup(7);
        let expanded = expand(&contents, &iterators(Some(3)), &Parameters::new());
        let pages = pages(&expanded);

        assert_eq!(pages.len(), 3);
        let sizes: Vec<usize> = pages
            .iter()
            .map(|p| p.iterator_info.as_ref().unwrap().items.len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);

        let info = pages[2].iterator_info.as_ref().unwrap();
        assert_eq!(info.current, 3);
        assert_eq!(info.total, 3);
        assert_eq!(info.limit, 3);
        assert_eq!(info.scope.as_deref(), Some("list"));
        assert!(info.links.is_empty());
        assert_eq!(ids(&info.items), vec!["p6"]);
    }

    #[test]
    fn missing_sort_key_is_reported_once_per_expansion() {
        let mut iterators = iterators(Some(2));
        if let Some(query) = iterators.get_mut("post.pagination") {
            query.order_by = vec![Order::new("published", Direction::Desc)];
        }
        let contents = setup(5);

        let warnings = count_warnings(|| {
            assert_eq!(pages(&expand(&contents, &iterators, &Parameters::new())).len(), 3);
        });
        assert_eq!(warnings, 1);
    }

    #[test]
    fn zero_items_gives_zero_pages() {
        let contents = setup(0);
        let expanded = expand(&contents, &iterators(Some(3)), &Parameters::new());
        assert!(expanded.is_empty());
    }

    #[test]
    fn template_is_replaced_not_kept() {
        let contents = setup(4);
        let expanded = expand(&contents, &iterators(Some(2)), &Parameters::new());
        assert_eq!(expanded.len(), 4 + 2);
        assert!(expanded.iter().all(|c| !c.slug.contains("{{")));
    }

    #[test]
    fn rewrites_tokens_in_text_fields() {
        let contents = setup(5);
        let expanded = expand(&contents, &iterators(Some(2)), &Parameters::new());
        let second = find_content(&expanded, "blog/page/2");

        assert_eq!(second.id, "blog-2");
        assert_eq!(second.iterator_info.as_ref().unwrap().current, 2);
        assert_eq!(second.properties["title"], Value::from("Page 2 of 3"));
        assert_eq!(second.raw.markdown, "Archive page 2");
    }

    #[test]
    fn missing_limit_uses_default_page_size() {
        let contents = setup(25);
        let expanded = expand(&contents, &iterators(None), &Parameters::new());
        let pages = pages(&expanded);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].iterator_info.as_ref().unwrap().limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn zero_limit_is_clamped_to_one() {
        let contents = setup(2);
        let expanded = expand(&contents, &iterators(Some(0)), &Parameters::new());
        assert_eq!(pages(&expanded).len(), 2);
    }

    #[test]
    fn unknown_iterator_drops_content() {
        let contents = setup(3);
        let expanded = expand(&contents, &BTreeMap::new(), &Parameters::new());
        assert_eq!(expanded.len(), 3);
        assert!(expanded.iter().all(|c| c.content_type() == "post"));
    }

    #[test]
    fn plain_contents_pass_through_unchanged() {
        let contents = setup(2);
        let expanded = expand(&contents, &iterators(Some(5)), &Parameters::new());
        assert_eq!(ids(&expanded[..2]), vec!["p0", "p1"]);
        assert!(!expanded[0].is_iterator());
    }

    #[test]
    fn page_items_follow_query_order() {
        let contents = setup(5);
        let mut its = iterators(Some(2));
        its.get_mut("post.pagination").unwrap().order_by = vec![crate::query::Order::new(
            "rank",
            crate::query::Direction::Desc,
        )];
        let expanded = expand(&contents, &its, &Parameters::new());
        let first = pages(&expanded)[0];
        assert_eq!(ids(&first.iterator_info.as_ref().unwrap().items), vec!["p4", "p3"]);
    }
}
