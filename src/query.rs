//! Filter, sort and paginate content collections.
//!
//! A [`Query`] names a content type and optionally carries a [`Condition`]
//! tree, a list of sort keys and an offset/limit window. [`run`] evaluates it
//! against an in-memory slice of [`Content`]:
//!
//! ```text
//! contents ─► type filter ─► resolve placeholders ─► condition filter
//!          ─► stable sort (last key first) ─► offset ─► limit
//! ```
//!
//! Queries are declared in YAML, either on a content type (`queries:`), on a
//! pipeline (`queries:`, `iterators:`) or as pipeline filter rules:
//!
//! ```yaml
//! contentType: post
//! scope: list
//! limit: 10
//! filter:
//!   and:
//!     - key: draft
//!       operator: equals
//!       value: false
//!     - key: publication
//!       operator: lessThanOrEquals
//!       value: "{{date.now}}"
//! orderBy:
//!   - key: publication
//!     direction: desc
//! ```
//!
//! ## Placeholders
//!
//! A condition value that is exactly `"{{name}}"` is replaced by the runtime
//! parameter `name` before evaluation. Unknown names are left as literal
//! strings, which simply fail to match non-string fields.
//!
//! ## Sorting
//!
//! Sort keys are applied in reverse declaration order with a stable sort, so
//! the first declared key ends up as the primary key. Numbers sort before
//! strings; contents missing the key (or holding a non-sortable value) keep
//! their relative order after every sortable content, in both directions.

use crate::content::Content;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Runtime values available to `{{name}}` placeholders.
pub type Parameters = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanOrEquals,
    GreaterThanOrEquals,
    /// Field string contains the operand string.
    Like,
    CaseInsensitiveLike,
    /// Field scalar is one of the operand array's elements.
    In,
    /// Field array holds the operand scalar.
    Contains,
    /// Field array and operand array share at least one element.
    Matching,
}

impl Operator {
    /// Evaluate `field <op> operand`.
    pub fn apply(self, field: &Value, operand: &Value) -> bool {
        match self {
            Operator::Equals => field.loosely_equals(operand),
            Operator::NotEquals => {
                matches!(field.coerced_ordering(operand), Some(o) if o != Ordering::Equal)
            }
            Operator::LessThan => field.coerced_ordering(operand) == Some(Ordering::Less),
            Operator::GreaterThan => field.coerced_ordering(operand) == Some(Ordering::Greater),
            Operator::LessThanOrEquals => matches!(
                field.coerced_ordering(operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::GreaterThanOrEquals => matches!(
                field.coerced_ordering(operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Like => match (field.as_str(), operand.as_str()) {
                (Some(haystack), Some(needle)) => haystack.contains(needle),
                _ => false,
            },
            Operator::CaseInsensitiveLike => match (field.as_str(), operand.as_str()) {
                (Some(haystack), Some(needle)) => haystack
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                _ => false,
            },
            Operator::In => operand
                .as_array()
                .is_some_and(|items| items.iter().any(|item| field.loosely_equals(item))),
            Operator::Contains => field
                .as_array()
                .is_some_and(|items| items.iter().any(|item| item.loosely_equals(operand))),
            Operator::Matching => match (field.as_array(), operand.as_array()) {
                (Some(left), Some(right)) => left
                    .iter()
                    .any(|l| right.iter().any(|r| l.loosely_equals(r))),
                _ => false,
            },
        }
    }
}

/// Boolean filter tree over a content's query fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConditionFields", into = "ConditionRepr")]
pub enum Condition {
    Field {
        key: String,
        operator: Operator,
        value: Value,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

/// YAML shape of a condition: `{key, operator, value}`, `{and: [...]}` or `{or: [...]}`.
#[derive(Serialize)]
#[serde(untagged)]
enum ConditionRepr {
    Field {
        key: String,
        operator: Operator,
        value: Value,
    },
    And {
        and: Vec<Condition>,
    },
    Or {
        or: Vec<Condition>,
    },
}

/// Every key a condition map may carry; the shape is checked afterwards.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConditionFields {
    key: Option<String>,
    operator: Option<Operator>,
    value: Option<Value>,
    and: Option<Vec<Condition>>,
    or: Option<Vec<Condition>>,
}

impl TryFrom<ConditionFields> for Condition {
    type Error = String;

    fn try_from(fields: ConditionFields) -> Result<Self, Self::Error> {
        let has_field_keys =
            fields.key.is_some() || fields.operator.is_some() || fields.value.is_some();
        match (fields.and, fields.or) {
            (Some(_), Some(_)) => Err("condition has both `and` and `or`".into()),
            (Some(_), None) | (None, Some(_)) if has_field_keys => {
                Err("condition mixes `and`/`or` with `key`/`operator`/`value`".into())
            }
            (Some(and), None) => Ok(Condition::And(and)),
            (None, Some(or)) => Ok(Condition::Or(or)),
            (None, None) => match (fields.key, fields.operator) {
                (Some(key), Some(operator)) => Ok(Condition::Field {
                    key,
                    operator,
                    value: fields.value.unwrap_or_default(),
                }),
                (Some(key), None) => Err(format!("condition on `{key}` has no `operator`")),
                (None, _) => Err(
                    "condition needs `key` and `operator`, or an `and`/`or` list".into(),
                ),
            },
        }
    }
}

impl From<Condition> for ConditionRepr {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Field {
                key,
                operator,
                value,
            } => ConditionRepr::Field {
                key,
                operator,
                value,
            },
            Condition::And(and) => ConditionRepr::And { and },
            Condition::Or(or) => ConditionRepr::Or { or },
        }
    }
}

impl Condition {
    pub fn field(key: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Condition::Field {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }

    /// Replace `"{{name}}"` operands with the matching parameter.
    pub fn resolve(&self, parameters: &Parameters) -> Condition {
        match self {
            Condition::Field {
                key,
                operator,
                value,
            } => {
                let value = placeholder_name(value)
                    .and_then(|name| parameters.get(name))
                    .unwrap_or(value)
                    .clone();
                Condition::Field {
                    key: key.clone(),
                    operator: *operator,
                    value,
                }
            }
            Condition::And(children) => {
                Condition::And(children.iter().map(|c| c.resolve(parameters)).collect())
            }
            Condition::Or(children) => {
                Condition::Or(children.iter().map(|c| c.resolve(parameters)).collect())
            }
        }
    }

    /// Evaluate against a flattened field map. Missing fields fail their leaf.
    pub fn matches(&self, fields: &BTreeMap<String, Value>) -> bool {
        match self {
            Condition::Field {
                key,
                operator,
                value,
            } => fields
                .get(key)
                .is_some_and(|field| operator.apply(field, value)),
            Condition::And(children) => children.iter().all(|c| c.matches(fields)),
            Condition::Or(children) => children.iter().any(|c| c.matches(fields)),
        }
    }
}

/// Extract `name` from a value of the exact form `"{{name}}"`.
fn placeholder_name(value: &Value) -> Option<&str> {
    value
        .as_str()?
        .strip_prefix("{{")?
        .strip_suffix("}}")
        .filter(|name| !name.is_empty())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub key: String,
    #[serde(default)]
    pub direction: Direction,
}

impl Order {
    pub fn new(key: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Query {
    pub content_type: String,
    /// Scope used when rendering the results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Order>,
}

impl Query {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            ..Self::default()
        }
    }

    /// Copy with a different offset/limit window.
    pub fn with_window(&self, limit: Option<usize>, offset: Option<usize>) -> Self {
        Self {
            limit,
            offset,
            ..self.clone()
        }
    }
}

/// Run `query` over `contents`.
///
/// Contents missing a sort key are reported in one warning per key.
pub fn run(contents: &[Content], query: &Query, parameters: &Parameters) -> Vec<Content> {
    run_reporting(contents, query, parameters, true)
}

/// [`run`] for repeated windows over a query already run once: missing sort
/// keys are only logged at debug level.
pub fn run_window(contents: &[Content], query: &Query, parameters: &Parameters) -> Vec<Content> {
    run_reporting(contents, query, parameters, false)
}

fn run_reporting(
    contents: &[Content],
    query: &Query,
    parameters: &Parameters,
    warn: bool,
) -> Vec<Content> {
    let filter = query.filter.as_ref().map(|c| c.resolve(parameters));

    let mut rows: Vec<(&Content, BTreeMap<String, Value>)> = contents
        .iter()
        .filter(|content| content.content_type() == query.content_type)
        .map(|content| (content, content.query_fields()))
        .filter(|(_, fields)| filter.as_ref().is_none_or(|f| f.matches(fields)))
        .collect();

    for order in query.order_by.iter().rev() {
        report_missing_sort_key(&rows, query, order, warn);
        rows.sort_by(|(_, a), (_, b)| {
            compare_for_sort(a.get(&order.key), b.get(&order.key), order.direction)
        });
    }

    rows.into_iter()
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .map(|(content, _)| content.clone())
        .collect()
}

fn report_missing_sort_key(
    rows: &[(&Content, BTreeMap<String, Value>)],
    query: &Query,
    order: &Order,
    warn: bool,
) {
    let missing: Vec<&str> = rows
        .iter()
        .filter(|(_, fields)| fields.get(&order.key).is_none_or(Value::is_null))
        .map(|(content, _)| content.slug.as_str())
        .collect();
    if missing.is_empty() {
        return;
    }
    if warn {
        tracing::warn!(
            key = %order.key,
            content_type = %query.content_type,
            slugs = ?missing,
            "Missing sort property"
        );
    } else {
        tracing::debug!(
            key = %order.key,
            content_type = %query.content_type,
            slugs = ?missing,
            "Missing sort property"
        );
    }
}

/// Sort class: numbers, then strings, then bools, then everything unsortable.
fn sort_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Int(_) | Value::Double(_)) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Bool(_)) => 2,
        _ => 3,
    }
}

/// Total order used for sorting; unsortable values compare equal among
/// themselves and after every sortable value regardless of direction.
fn compare_for_sort(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
    let (rank_a, rank_b) = (sort_rank(a), sort_rank(b));
    if rank_a == 3 || rank_b == 3 {
        return rank_a.cmp(&rank_b);
    }
    let ordering = match (a, b) {
        (Some(Value::Int(x)), Some(Value::Int(y))) => x.cmp(y),
        (Some(x), Some(y)) if rank_a == 0 && rank_b == 0 => {
            let (x, y) = (x.as_double().unwrap_or(0.0), y.as_double().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank_a.cmp(&rank_b),
    };
    match direction {
        Direction::Asc => ordering,
        Direction::Desc => ordering.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn fields(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn numbered_posts(count: i64) -> Vec<Content> {
        let def = definition("post");
        (0..count)
            .map(|n| {
                content(&def, &format!("p{n}"))
                    .property("rank", Value::Int(n))
                    .build()
            })
            .collect()
    }

    // =========================================================================
    // Condition evaluation
    // =========================================================================

    #[test]
    fn empty_and_is_true_empty_or_is_false() {
        let f = fields(&[]);
        assert!(Condition::And(vec![]).matches(&f));
        assert!(!Condition::Or(vec![]).matches(&f));
    }

    #[test]
    fn missing_field_fails_leaf() {
        let f = fields(&[("title", Value::from("Hello"))]);
        assert!(!Condition::field("draft", Operator::Equals, false).matches(&f));
        assert!(!Condition::field("draft", Operator::NotEquals, true).matches(&f));
    }

    #[test]
    fn and_or_compose() {
        let f = fields(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        let a1 = Condition::field("a", Operator::Equals, 1);
        let b3 = Condition::field("b", Operator::Equals, 3);
        assert!(!Condition::And(vec![a1.clone(), b3.clone()]).matches(&f));
        assert!(Condition::Or(vec![a1, b3]).matches(&f));
    }

    #[test]
    fn comparison_operators_coerce_numbers() {
        let f = fields(&[("n", Value::Double(5.0))]);
        assert!(Condition::field("n", Operator::Equals, 5).matches(&f));
        assert!(Condition::field("n", Operator::LessThan, 6).matches(&f));
        assert!(Condition::field("n", Operator::GreaterThanOrEquals, 5.0).matches(&f));
        assert!(!Condition::field("n", Operator::GreaterThan, 5).matches(&f));
    }

    #[test]
    fn incomparable_types_are_false_for_every_comparison() {
        let f = fields(&[("n", Value::Int(5))]);
        for op in [
            Operator::Equals,
            Operator::NotEquals,
            Operator::LessThan,
            Operator::GreaterThanOrEquals,
        ] {
            assert!(!Condition::field("n", op, "5").matches(&f), "{op:?}");
        }
    }

    #[test]
    fn like_operators() {
        let f = fields(&[("title", Value::from("Hello World"))]);
        assert!(Condition::field("title", Operator::Like, "World").matches(&f));
        assert!(!Condition::field("title", Operator::Like, "world").matches(&f));
        assert!(Condition::field("title", Operator::CaseInsensitiveLike, "world").matches(&f));
    }

    #[test]
    fn in_and_contains() {
        let f = fields(&[
            ("category", Value::from("rust")),
            ("tags", Value::from(vec!["a", "b"])),
        ]);
        assert!(Condition::field("category", Operator::In, vec!["go", "rust"]).matches(&f));
        assert!(!Condition::field("category", Operator::In, "rust").matches(&f));
        assert!(Condition::field("tags", Operator::Contains, "b").matches(&f));
        assert!(!Condition::field("tags", Operator::Contains, "c").matches(&f));
    }

    #[test]
    fn matching_requires_shared_element() {
        let def = definition("post");
        let post = content(&def, "a")
            .property("tags", Value::from(vec!["a", "b"]))
            .build();
        let f = post.query_fields();
        assert!(Condition::field("tags", Operator::Matching, vec!["b", "c"]).matches(&f));
        assert!(!Condition::field("tags", Operator::Matching, vec!["x", "y"]).matches(&f));
    }

    // =========================================================================
    // Placeholders
    // =========================================================================

    #[test]
    fn placeholder_resolves_like_literal() {
        let now = Value::Double(1_700_000_000.0);
        let f = fields(&[("date.published", Value::Double(1_600_000_000.0))]);
        let mut params = Parameters::new();
        params.insert("date.now".into(), now.clone());

        let templated =
            Condition::field("date.published", Operator::LessThanOrEquals, "{{date.now}}");
        let literal = Condition::field("date.published", Operator::LessThanOrEquals, now);

        assert_eq!(templated.resolve(&params), literal);
        assert_eq!(
            templated.resolve(&params).matches(&f),
            literal.matches(&f)
        );
        assert!(literal.matches(&f));
    }

    #[test]
    fn unresolved_placeholder_stays_literal() {
        let cond = Condition::field("slug", Operator::Equals, "{{missing}}");
        assert_eq!(cond.resolve(&Parameters::new()), cond);
        let f = fields(&[("slug", Value::from("{{missing}}"))]);
        assert!(cond.matches(&f));
    }

    #[test]
    fn placeholders_resolve_inside_nested_conditions() {
        let mut params = Parameters::new();
        params.insert("id".into(), Value::from("x"));
        let cond = Condition::Or(vec![Condition::And(vec![Condition::field(
            "author",
            Operator::Equals,
            "{{id}}",
        )])]);
        let expected = Condition::Or(vec![Condition::And(vec![Condition::field(
            "author",
            Operator::Equals,
            "x",
        )])]);
        assert_eq!(cond.resolve(&params), expected);
    }

    // =========================================================================
    // YAML shape
    // =========================================================================

    #[test]
    fn query_decodes_from_yaml() {
        let yaml = r#"
contentType: post
scope: list
limit: 5
offset: 1
filter:
  or:
    - key: featured
      operator: equals
      value: true
    - and:
        - key: tags
          operator: contains
          value: rust
orderBy:
  - key: publication
    direction: desc
  - key: title
"#;
        let query: Query = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(query.content_type, "post");
        assert_eq!(query.scope.as_deref(), Some("list"));
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, Some(1));
        assert_eq!(
            query.filter,
            Some(Condition::Or(vec![
                Condition::field("featured", Operator::Equals, true),
                Condition::And(vec![Condition::field("tags", Operator::Contains, "rust")]),
            ]))
        );
        assert_eq!(
            query.order_by,
            vec![
                Order::new("publication", Direction::Desc),
                Order::new("title", Direction::Asc),
            ]
        );
    }

    #[test]
    fn malformed_conditions_name_the_problem() {
        let err = |yaml: &str| serde_yaml::from_str::<Condition>(yaml).unwrap_err().to_string();

        assert!(err("and: []\nor: []\n").contains("both `and` and `or`"));
        assert!(err("and: []\nkey: draft\n").contains("mixes"));
        assert!(err("key: draft\nvalue: true\n").contains("no `operator`"));
        assert!(err("value: true\n").contains("needs `key` and `operator`"));
        assert!(err("nor: []\n").contains("unknown field `nor`"));
    }

    #[test]
    fn condition_value_defaults_to_null() {
        let condition: Condition =
            serde_yaml::from_str("key: draft\noperator: notEquals\n").unwrap();
        assert_eq!(condition, Condition::field("draft", Operator::NotEquals, Value::Null));
        let empty: Condition = serde_yaml::from_str("and: []\n").unwrap();
        assert_eq!(empty, Condition::And(Vec::new()));
    }

    // =========================================================================
    // run()
    // =========================================================================

    #[test]
    fn unfiltered_query_returns_type_set_in_order() {
        let post = definition("post");
        let page = definition("page");
        let contents = vec![
            content(&post, "b").build(),
            content(&page, "x").build(),
            content(&post, "a").build(),
            content(&post, "c").build(),
        ];
        let result = run(&contents, &Query::new("post"), &Parameters::new());
        assert_eq!(ids(&result), vec!["b", "a", "c"]);
    }

    #[test]
    fn filters_by_condition() {
        let post = definition("post");
        let contents = vec![
            content(&post, "a").property("draft", Value::Bool(true)).build(),
            content(&post, "b").property("draft", Value::Bool(false)).build(),
        ];
        let query = Query {
            filter: Some(Condition::field("draft", Operator::Equals, false)),
            ..Query::new("post")
        };
        assert_eq!(ids(&run(&contents, &query, &Parameters::new())), vec!["b"]);
    }

    #[test]
    fn multi_key_sort_is_stable_with_first_key_primary() {
        let post = definition("post");
        let contents = vec![
            content(&post, "x").property("group", 2).property("n", 1).build(),
            content(&post, "y").property("group", 1).property("n", 1).build(),
            content(&post, "z").property("group", 1).property("n", 1).build(),
            content(&post, "w").property("group", 1).property("n", 0).build(),
        ];
        let query = Query {
            order_by: vec![
                Order::new("group", Direction::Asc),
                Order::new("n", Direction::Desc),
            ],
            ..Query::new("post")
        };
        let result = run(&contents, &query, &Parameters::new());
        assert_eq!(ids(&result), vec!["y", "z", "w", "x"]);
    }

    #[test]
    fn ties_preserve_insertion_order() {
        let post = definition("post");
        let contents = vec![
            content(&post, "first").property("group", 1).build(),
            content(&post, "second").property("group", 1).build(),
            content(&post, "third").property("group", 1).build(),
        ];
        let query = Query {
            order_by: vec![Order::new("group", Direction::Desc)],
            ..Query::new("post")
        };
        assert_eq!(
            ids(&run(&contents, &query, &Parameters::new())),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn missing_sort_key_goes_last_in_both_directions() {
        let post = definition("post");
        let contents = vec![
            content(&post, "none").build(),
            content(&post, "two").property("n", 2).build(),
            content(&post, "one").property("n", 1).build(),
        ];
        for (direction, expected) in [
            (Direction::Asc, vec!["one", "two", "none"]),
            (Direction::Desc, vec!["two", "one", "none"]),
        ] {
            let query = Query {
                order_by: vec![Order::new("n", direction)],
                ..Query::new("post")
            };
            assert_eq!(ids(&run(&contents, &query, &Parameters::new())), expected);
        }
    }

    #[test]
    fn missing_sort_keys_warn_once_per_key() {
        let post = definition("post");
        let contents = vec![
            content(&post, "a").build(),
            content(&post, "b").build(),
            content(&post, "c").property("n", 1).build(),
        ];
        let query = Query {
            order_by: vec![Order::new("n", Direction::Asc), Order::new("m", Direction::Asc)],
            ..Query::new("post")
        };
        let params = Parameters::new();

        assert_eq!(count_warnings(|| drop(run(&contents, &query, &params))), 2);
        assert_eq!(count_warnings(|| drop(run_window(&contents, &query, &params))), 0);
    }

    #[test]
    fn sorts_strings_by_byte_order() {
        let post = definition("post");
        let contents = vec![
            content(&post, "a").property("title", "beta").build(),
            content(&post, "b").property("title", "Alpha").build(),
            content(&post, "c").property("title", "alpha").build(),
        ];
        let query = Query {
            order_by: vec![Order::new("title", Direction::Asc)],
            ..Query::new("post")
        };
        assert_eq!(
            ids(&run(&contents, &query, &Parameters::new())),
            vec!["b", "c", "a"]
        );
    }

    #[test]
    fn offset_and_limit_apply_after_sorting() {
        let mut contents = numbered_posts(10);
        contents.reverse();
        let query = Query {
            order_by: vec![Order::new("rank", Direction::Asc)],
            offset: Some(2),
            limit: Some(3),
            ..Query::new("post")
        };
        assert_eq!(
            ids(&run(&contents, &query, &Parameters::new())),
            vec!["p2", "p3", "p4"]
        );
    }

    #[test]
    fn offset_past_end_is_empty() {
        let query = Query {
            offset: Some(20),
            ..Query::new("post")
        };
        assert!(run(&numbered_posts(3), &query, &Parameters::new()).is_empty());
    }

    #[test]
    fn synthesized_fields_are_queryable() {
        let post = definition("post");
        let contents = vec![content(&post, "a").slug("blog/a").build()];
        let query = Query {
            filter: Some(Condition::And(vec![
                Condition::field("slug", Operator::Equals, "blog/a"),
                Condition::field("iterator", Operator::Equals, false),
            ])),
            ..Query::new("post")
        };
        assert_eq!(ids(&run(&contents, &query, &Parameters::new())), vec!["a"]);
    }
}
