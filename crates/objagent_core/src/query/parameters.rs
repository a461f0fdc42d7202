//! Named parameters bound alongside a compiled predicate.
//!
//! # Invariants
//! - Parameter names are field names with `.` replaced by `_`.
//! - Fields that collide after that substitution share one name; the last
//!   registered value wins.
//! - A list value (`NotIn`) is expanded at execution wherever its token
//!   appears, so a scalar comparison sharing that name ends up comparing
//!   against a list and the statement fails instead of silently matching.

use crate::model::value::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    values: BTreeMap<String, Value>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `field` and returns the bind token (`:name`).
    pub fn register(&mut self, field: &str, value: Value) -> String {
        let name = parameter_name(field);
        let token = format!(":{name}");
        self.values.insert(name, value);
        token
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Merges `other` into this map; `other` wins on name collisions.
    pub fn extend(&mut self, other: ParameterMap) {
        self.values.extend(other.values);
    }
}

/// Derives the parameter name for `field` (`a.title` -> `a_title`).
pub fn parameter_name(field: &str) -> String {
    field.replace('.', "_")
}
