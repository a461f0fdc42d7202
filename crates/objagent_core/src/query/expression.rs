//! Generic boolean expression tree.
//!
//! # Responsibility
//! - Describe filters independently of any storage backend.
//! - Parse stable comparator/composite names used by generic callers.
//!
//! # Invariants
//! - Composition is explicit in the tree; there is no flat list of mixed
//!   boolean operators, so no precedence rules apply.

use super::error::QueryError;
use crate::model::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Comparison operator of a leaf expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Comparator {
    #[serde(rename = "eq")]
    Equals,
    #[serde(rename = "neq")]
    NotEquals,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "lte")]
    LessThanEqual,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "gte")]
    GreaterThanEqual,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "nin")]
    NotIn,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "ncontains")]
    NotContains,
    #[serde(rename = "null")]
    Null,
    #[serde(rename = "nnull")]
    NotNull,
}

impl Comparator {
    pub const ALL: [Comparator; 12] = [
        Self::Equals,
        Self::NotEquals,
        Self::LessThan,
        Self::LessThanEqual,
        Self::GreaterThan,
        Self::GreaterThanEqual,
        Self::In,
        Self::NotIn,
        Self::Contains,
        Self::NotContains,
        Self::Null,
        Self::NotNull,
    ];

    /// Stable string id used by generic callers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::NotEquals => "neq",
            Self::LessThan => "lt",
            Self::LessThanEqual => "lte",
            Self::GreaterThan => "gt",
            Self::GreaterThanEqual => "gte",
            Self::In => "in",
            Self::NotIn => "nin",
            Self::Contains => "contains",
            Self::NotContains => "ncontains",
            Self::Null => "null",
            Self::NotNull => "nnull",
        }
    }
}

impl Display for Comparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparator {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|comparator| comparator.as_str() == value)
            .ok_or_else(|| QueryError::UnknownComparator(value.to_string()))
    }
}

impl TryFrom<String> for Comparator {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Leaf expression: `field <comparator> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: String,
    pub comparator: Comparator,
    /// List for `In`/`NotIn`; ignored for `Null`/`NotNull`.
    #[serde(default = "null_value")]
    pub value: Value,
}

fn null_value() -> Value {
    Value::Null
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum CompositeType {
    And,
    Or,
}

impl FromStr for CompositeType {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            other => Err(QueryError::UnrecognizedExpression(format!(
                "composite `{other}`"
            ))),
        }
    }
}

impl TryFrom<String> for CompositeType {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Boolean combination of child expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    #[serde(rename = "type")]
    pub kind: CompositeType,
    #[serde(default)]
    pub children: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expression {
    Comparison(Comparison),
    Composite(Composite),
}

impl Expression {
    pub fn comparison(
        comparator: Comparator,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::Comparison(Comparison {
            field: field.into(),
            comparator,
            value: value.into(),
        })
    }

    pub fn composite(kind: CompositeType, children: Vec<Expression>) -> Self {
        Self::Composite(Composite { kind, children })
    }

    pub fn and(children: Vec<Expression>) -> Self {
        Self::composite(CompositeType::And, children)
    }

    pub fn or(children: Vec<Expression>) -> Self {
        Self::composite(CompositeType::Or, children)
    }
}
