//! Record trait and index filters

use std::collections::HashMap;

/// A value stored in a record's index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for IndexValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Comparison applied by a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
}

/// Filter on one indexed field
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: IndexValue,
}

impl Filter {
    /// Shorthand for an equality filter
    pub fn eq(field: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Check this filter against a record's index.
    ///
    /// A record without the field never matches `Eq` and always matches `Ne`.
    pub fn matches(&self, fields: &HashMap<String, IndexValue>) -> bool {
        match (self.op, fields.get(&self.field)) {
            (FilterOp::Eq, Some(v)) => *v == self.value,
            (FilterOp::Eq, None) => false,
            (FilterOp::Ne, Some(v)) => *v != self.value,
            (FilterOp::Ne, None) => true,
        }
    }
}

/// Anything the [`Store`](crate::Store) can hold
pub trait Record {
    /// Unique key within the collection
    fn id(&self) -> &str;

    /// Last modification time (unix ms)
    fn updated_at(&self) -> i64;

    /// Collection this record type lives in
    fn collection_name() -> &'static str;

    /// Fields available to [`Filter`]s
    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::new()
    }
}
