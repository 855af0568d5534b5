//! Dynamic values decoded from front matter, schema defaults and query operands.
//!
//! Everything the engine reads from YAML ends up as a [`Value`]: a closed
//! tagged union with typed accessors that return `Option` instead of failing.
//! Consumers pattern-match the variant explicitly; there is no "any" escape
//! hatch.
//!
//! ## Coercion
//!
//! The accessors double as the coercion rules used by query comparisons:
//!
//! | Accessor | Accepts |
//! |----------|---------|
//! | [`Value::as_bool`] | `Bool` |
//! | [`Value::as_int`] | `Int`, `Double` without a fractional part |
//! | [`Value::as_double`] | `Double`, `Int` |
//! | [`Value::as_str`] | `String` |
//!
//! [`Value::coerced_ordering`] tries Bool, then Int, then Double, then String;
//! the first type both operands coerce to decides the result.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A heterogeneous value with an explicit variant tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view. Doubles qualify only when they are whole numbers in range.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Double(d)
                if d.fract() == 0.0 && *d >= i64::MIN as f64 && *d <= i64::MAX as f64 =>
            {
                Some(*d as i64)
            }
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short variant name, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Compare two values under the Bool → Int → Double → String coercion chain.
    ///
    /// Returns `None` when the operands share no coercible type (or when a
    /// double comparison involves NaN).
    pub fn coerced_ordering(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_bool(), other.as_bool()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_int(), other.as_int()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_double(), other.as_double()) {
            return a.partial_cmp(&b);
        }
        if let (Some(a), Some(b)) = (self.as_str(), other.as_str()) {
            return Some(a.cmp(b));
        }
        None
    }

    /// Equality under the coercion chain. Values with no common type are unequal.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        self.coerced_ordering(other) == Some(Ordering::Equal)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}
