//! Hydrated object and raw row shapes returned by storage.
//!
//! # Invariants
//! - A record's identity lives in its `id` field.
//! - `class` names the mapping the record belongs to and never changes.

use super::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name holding the identifier of every mapped record.
pub const IDENTIFIER_FIELD: &str = "id";

/// One raw result row keyed by column name (or select alias).
pub type Row = BTreeMap<String, Value>;

/// Dynamic object of a mapped class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    class: String,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty, not yet persisted record of `class`.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns the identifier, or `None` when the record was never persisted.
    pub fn id(&self) -> Option<&Value> {
        self.fields
            .get(IDENTIFIER_FIELD)
            .filter(|value| !value.is_null())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub(crate) fn from_row(class: impl Into<String>, row: Row) -> Self {
        Self {
            class: class.into(),
            fields: row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Record;
    use crate::model::value::Value;

    #[test]
    fn null_identifier_counts_as_unsaved() {
        let record = Record::new("page").with("id", Value::Null);
        assert!(record.id().is_none());

        let saved = Record::new("page").with("id", 7);
        assert_eq!(saved.id(), Some(&Value::Integer(7)));
    }

    #[test]
    fn set_overwrites_existing_field() {
        let mut record = Record::new("page").with("title", "draft");
        record.set("title", "final");
        assert_eq!(record.get("title").and_then(Value::as_str), Some("final"));
        assert_eq!(record.fields().count(), 1);
    }
}
