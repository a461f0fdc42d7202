//! SQL predicate fragments for the query builder.
//!
//! Fragments are plain SQL text. Operands are passed in already rendered
//! (qualified column, bind token or literal).

use crate::model::value::Value;

/// Stateless factory for SQL predicate fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionBuilder;

impl ExpressionBuilder {
    pub fn comparison(&self, x: &str, operator: &str, y: &str) -> String {
        format!("{x} {operator} {y}")
    }

    pub fn eq(&self, x: &str, y: &str) -> String {
        self.comparison(x, "=", y)
    }

    pub fn neq(&self, x: &str, y: &str) -> String {
        self.comparison(x, "<>", y)
    }

    pub fn lt(&self, x: &str, y: &str) -> String {
        self.comparison(x, "<", y)
    }

    pub fn lte(&self, x: &str, y: &str) -> String {
        self.comparison(x, "<=", y)
    }

    pub fn gt(&self, x: &str, y: &str) -> String {
        self.comparison(x, ">", y)
    }

    pub fn gte(&self, x: &str, y: &str) -> String {
        self.comparison(x, ">=", y)
    }

    pub fn in_list(&self, x: &str, items: &[String]) -> String {
        format!("{x} IN ({})", items.join(", "))
    }

    /// `y` is a single bind token; list values are expanded at execution.
    pub fn not_in(&self, x: &str, y: &str) -> String {
        format!("{x} NOT IN ({y})")
    }

    pub fn like(&self, x: &str, y: &str) -> String {
        self.comparison(x, "LIKE", y)
    }

    pub fn not_like(&self, x: &str, y: &str) -> String {
        self.comparison(x, "NOT LIKE", y)
    }

    pub fn is_null(&self, x: &str) -> String {
        format!("{x} IS NULL")
    }

    pub fn is_not_null(&self, x: &str) -> String {
        format!("{x} IS NOT NULL")
    }

    /// Conjunction of `parts`; a single part is returned unwrapped.
    pub fn and_x(&self, parts: Vec<String>) -> Option<String> {
        composite(parts, "AND")
    }

    /// Disjunction of `parts`; a single part is returned unwrapped.
    pub fn or_x(&self, parts: Vec<String>) -> Option<String> {
        composite(parts, "OR")
    }

    /// Renders `value` as an inline SQL literal.
    pub fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(value) => i64::from(*value).to_string(),
            Value::Integer(value) => value.to_string(),
            Value::Real(value) if value.is_finite() => value.to_string(),
            // SQLite has no literal for inf/NaN.
            Value::Real(_) => "NULL".to_string(),
            Value::Text(value) => format!("'{}'", value.replace('\'', "''")),
            Value::List(items) => items
                .iter()
                .map(|item| self.literal(item))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn composite(parts: Vec<String>, operator: &str) -> Option<String> {
    match parts.len() {
        0 => None,
        1 => parts.into_iter().next(),
        _ => Some(format!("({})", parts.join(&format!(") {operator} (")))),
    }
}
