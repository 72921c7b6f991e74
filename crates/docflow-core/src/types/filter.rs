//! Filter groups for dynamic document queries.
//!
//! A query is a list of [`FilterGroup`]s: conditions inside a group are
//! AND-ed, groups are OR-ed. Field names are resolved against a column
//! whitelist by the database layer and values are always bound as
//! parameters.

use serde::{Deserialize, Serialize};

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Case-insensitive substring match.
    Contains,
    /// List membership.
    In,
    /// `IS NULL` check.
    IsNull,
    /// `IS NOT NULL` check.
    IsNotNull,
}

impl FilterOp {
    /// Whether the operator takes no value.
    pub fn is_unary(&self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

/// A dynamic filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A boolean value.
    Boolean(bool),
    /// An integer value.
    Integer(i64),
    /// A string value (dates travel as ISO-8601 strings).
    String(String),
    /// A list of integers (for `In`).
    IntegerList(Vec<i64>),
    /// A list of strings (for `In`).
    StringList(Vec<String>),
    /// No value (for unary operators).
    Null,
}

/// A single condition on a named field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterField {
    /// The logical field name.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against.
    #[serde(default = "null_value")]
    pub value: FilterValue,
}

impl FilterField {
    /// Create a new filter field.
    pub fn new(field: impl Into<String>, op: FilterOp, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Shorthand for an integer equality filter.
    pub fn eq_int(field: impl Into<String>, value: i64) -> Self {
        Self::new(field, FilterOp::Eq, FilterValue::Integer(value))
    }

    /// Shorthand for a substring filter.
    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Contains, FilterValue::String(needle.into()))
    }
}

/// Conditions AND-ed together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterGroup {
    /// The conditions of this group.
    pub conditions: Vec<FilterField>,
}

impl FilterGroup {
    /// Create a group from conditions.
    pub fn all(conditions: Vec<FilterField>) -> Self {
        Self { conditions }
    }

    /// Add a condition to the group.
    pub fn and(mut self, field: FilterField) -> Self {
        self.conditions.push(field);
        self
    }
}

fn null_value() -> FilterValue {
    FilterValue::Null
}
