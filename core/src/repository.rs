//! Persistence contract consumed by command bodies.
//!
//! The pipeline never talks to storage itself. Commands receive a
//! repository at construction and surface its failures through `?`;
//! [`RepositoryError`] converts into the pipeline's two-tier failure type
//! (a missing item becomes a classified `NotFound`, everything else stays
//! unclassified).
//!
//! Repositories are **query/command interfaces**, not implementations. An
//! in-memory implementation lives in `commander-testing`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// Something with a unique string identifier.
pub trait Identifiable {
    /// Unique identifier.
    fn id(&self) -> &str;
}

/// Repository failure.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No item matched.
    #[error("{0}")]
    NotFound(String),

    /// A lookup expected to be unique matched several items.
    #[error("Multiple items found with {property}:{value}")]
    Duplicate {
        /// Property that was queried.
        property: String,
        /// Value that was queried.
        value: String,
    },

    /// The backing store failed.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl RepositoryError {
    /// Create a [`NotFound`](Self::NotFound) error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// A secondary index: its name and the property it is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Indexed property.
    pub property: String,
}

impl Index {
    /// Create an index descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property: property.into(),
        }
    }
}

/// Value a [`Filter`] compares against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Boolean value.
    Bool(bool),
    /// Text value.
    Text(String),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Comparison operator for a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `<>`
    #[serde(rename = "<>")]
    Ne,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
}

impl Comparator {
    const fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => matches!(ordering, Ordering::Equal),
            Self::Ne => !matches!(ordering, Ordering::Equal),
            Self::Lt => matches!(ordering, Ordering::Less),
            Self::Le => !matches!(ordering, Ordering::Greater),
            Self::Gt => matches!(ordering, Ordering::Greater),
            Self::Ge => !matches!(ordering, Ordering::Less),
        }
    }
}

/// How several filters combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionOperator {
    /// Every filter must match.
    #[default]
    And,
    /// At least one filter must match.
    Or,
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "AND",
            Self::Or => "OR",
        })
    }
}

/// A property filter.
///
/// With a `comparator` the property is compared against `value`. Without
/// one, a `strict` filter requires equality and a non-strict text filter
/// requires the property to contain `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Property name.
    pub name: String,
    /// Value to compare against.
    pub value: FilterValue,
    /// Require exact equality.
    #[serde(default)]
    pub strict: bool,
    /// Explicit comparison operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparator: Option<Comparator>,
}

impl Filter {
    /// Exact-match filter.
    #[must_use]
    pub fn equals(name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            strict: true,
            comparator: None,
        }
    }

    /// Substring filter.
    #[must_use]
    pub fn contains(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FilterValue::Text(value.into()),
            strict: false,
            comparator: None,
        }
    }

    /// Filter with an explicit comparator.
    #[must_use]
    pub fn compare(name: impl Into<String>, comparator: Comparator, value: impl Into<FilterValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            strict: true,
            comparator: Some(comparator),
        }
    }

    /// Whether `document` (a JSON object) satisfies this filter.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        let Some(field) = document.get(&self.name) else {
            return false;
        };
        match (&self.value, self.comparator) {
            (value, Some(comparator)) => {
                compare(field, value).is_some_and(|ordering| comparator.accepts(ordering))
            }
            (FilterValue::Text(needle), None) if !self.strict => {
                field.as_str().is_some_and(|text| text.contains(needle.as_str()))
            }
            (value, None) => compare(field, value) == Some(Ordering::Equal),
        }
    }
}

fn compare(field: &Value, value: &FilterValue) -> Option<Ordering> {
    match (field, value) {
        (Value::Bool(field), FilterValue::Bool(value)) => Some(field.cmp(value)),
        (Value::String(field), FilterValue::Text(value)) => Some(field.as_str().cmp(value)),
        (Value::Number(field), FilterValue::Text(value)) => {
            let value: f64 = value.parse().ok()?;
            field.as_f64()?.partial_cmp(&value)
        }
        _ => None,
    }
}

/// Combine filters with `operator` against one document.
#[must_use]
pub fn matches_all(filters: &[Filter], operator: ConditionOperator, document: &Value) -> bool {
    match operator {
        ConditionOperator::And => filters.iter().all(|filter| filter.matches(document)),
        ConditionOperator::Or => filters.iter().any(|filter| filter.matches(document)),
    }
}

/// Partial update: property name to new value.
pub type Delta = serde_json::Map<String, Value>;

/// Remove empty strings and nulls from a JSON object graph, recursively.
///
/// Backing stores commonly reject empty attribute values, so items are
/// pruned before every write.
pub fn prune_empty(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, child| {
                prune_empty(child);
                !matches!(child, Value::Null) && child.as_str() != Some("")
            });
        }
        Value::Array(items) => items.iter_mut().for_each(prune_empty),
        _ => {}
    }
}

/// Read side of a repository.
pub trait ReadOnlyRepository<T>: Send + Sync {
    /// Get an item by id.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] if no item has that id
    /// - [`RepositoryError::Transport`] if the store fails
    fn get(&self, id: &str) -> impl Future<Output = Result<T, RepositoryError>> + Send;

    /// Get the single item whose indexed property equals `query`.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] if nothing matches
    /// - [`RepositoryError::Duplicate`] if more than one item matches
    /// - [`RepositoryError::Transport`] if the store fails
    fn get_by_index(
        &self,
        query: &str,
        index: &Index,
    ) -> impl Future<Output = Result<T, RepositoryError>> + Send;

    /// Whether an item exists, by id or by indexed property.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if the store fails.
    fn exists(
        &self,
        query: &str,
        index: Option<&Index>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Count items; all of them, or those whose indexed property equals `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if the store fails.
    fn count(
        &self,
        query: Option<(&str, &Index)>,
    ) -> impl Future<Output = Result<usize, RepositoryError>> + Send;

    /// All items whose indexed property equals `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if the store fails.
    fn query(
        &self,
        query: &str,
        index: &Index,
    ) -> impl Future<Output = Result<Vec<T>, RepositoryError>> + Send;

    /// Every item.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if the store fails.
    fn list(&self) -> impl Future<Output = Result<Vec<T>, RepositoryError>> + Send;

    /// Items matching `filter`.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] if nothing matches
    /// - [`RepositoryError::Transport`] if the store fails
    fn scan(&self, filter: &Filter) -> impl Future<Output = Result<Vec<T>, RepositoryError>> + Send;
}

/// Full read/write repository.
pub trait Repository<T>: ReadOnlyRepository<T> {
    /// Store a new item (pruned of empty values) and return it.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if the store fails.
    fn create(&self, item: T) -> impl Future<Output = Result<T, RepositoryError>> + Send;

    /// Replace an item.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if the store fails.
    fn update(&self, item: T) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Apply a partial update to the item with `id`.
    ///
    /// A delta holding a single empty-string value removes that property.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] if no item has that id
    /// - [`RepositoryError::Transport`] if the store fails
    fn update_delta(
        &self,
        id: &str,
        delta: Delta,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete the item with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if the store fails.
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Items matching the combination of `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if the store fails.
    fn exists_one(
        &self,
        filters: &[Filter],
        operator: ConditionOperator,
    ) -> impl Future<Output = Result<Vec<T>, RepositoryError>> + Send;

    /// Items whose indexed property equals `query` and that also match `filters`.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] if nothing matches
    /// - [`RepositoryError::Transport`] if the store fails
    fn get_all_by_property(
        &self,
        query: &str,
        index: &Index,
        filters: &[Filter],
        operator: ConditionOperator,
    ) -> impl Future<Output = Result<Vec<T>, RepositoryError>> + Send;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prune_empty_is_recursive() {
        let mut item = json!({
            "id": "1",
            "name": "",
            "phone": null,
            "address": {"line1": "", "city": "Leeds"},
            "tags": [{"a": ""}, "x"]
        });

        prune_empty(&mut item);

        assert_eq!(
            item,
            json!({"id": "1", "address": {"city": "Leeds"}, "tags": [{}, "x"]})
        );
    }

    #[test]
    fn test_strict_and_contains_filters() {
        let doc = json!({"email": "ada@example.com", "active": true});

        assert!(Filter::equals("email", "ada@example.com").matches(&doc));
        assert!(!Filter::equals("email", "example.com").matches(&doc));
        assert!(Filter::contains("email", "example.com").matches(&doc));
        assert!(Filter::equals("active", true).matches(&doc));
        assert!(!Filter::equals("missing", "x").matches(&doc));
    }

    #[test]
    fn test_comparators_on_numbers_and_text() {
        let doc = json!({"age": 36, "name": "m"});

        assert!(Filter::compare("age", Comparator::Ge, "36").matches(&doc));
        assert!(Filter::compare("age", Comparator::Lt, "40").matches(&doc));
        assert!(!Filter::compare("age", Comparator::Gt, "36").matches(&doc));
        assert!(Filter::compare("name", Comparator::Ne, "n").matches(&doc));
        assert!(!Filter::compare("age", Comparator::Eq, "not a number").matches(&doc));
    }

    #[test]
    fn test_condition_operators() {
        let doc = json!({"a": "1", "b": "2"});
        let filters = [Filter::equals("a", "1"), Filter::equals("b", "3")];

        assert!(!matches_all(&filters, ConditionOperator::And, &doc));
        assert!(matches_all(&filters, ConditionOperator::Or, &doc));
    }

    #[test]
    fn test_comparator_wire_names() {
        let filter: Filter =
            serde_json::from_value(json!({"name": "age", "value": "3", "comparator": "<="})).unwrap();
        assert_eq!(filter.comparator, Some(Comparator::Le));
        assert!(!filter.strict);
    }
}
