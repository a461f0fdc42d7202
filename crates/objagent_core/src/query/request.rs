//! Generic query request: target class, filter, ordering, paging,
//! projections and joins.

use super::error::QueryError;
use super::expression::Expression;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(QueryError::UnknownDirection(value.to_string())),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    pub direction: Direction,
}

/// Custom projection `name AS alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Select {
    pub name: String,
    pub alias: String,
}

impl Select {
    /// Projection aliased under its own name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum JoinType {
    Inner,
    Left,
}

impl FromStr for JoinType {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "inner" => Ok(Self::Inner),
            "left" => Ok(Self::Left),
            other => Err(QueryError::UnknownJoinType(other.to_string())),
        }
    }
}

impl TryFrom<String> for JoinType {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Join of another mapped class into the query.
///
/// `condition` is required for inner joins and ignored for left joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    #[serde(rename = "type")]
    pub join_type: JoinType,
    /// Alias the join hangs off (the source alias or an earlier join alias).
    pub from: String,
    /// Joined class.
    pub target: String,
    pub alias: String,
    #[serde(default)]
    pub condition: Option<String>,
}

impl Join {
    pub fn inner(
        from: impl Into<String>,
        target: impl Into<String>,
        alias: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            join_type: JoinType::Inner,
            from: from.into(),
            target: target.into(),
            alias: alias.into(),
            condition: Some(condition.into()),
        }
    }

    pub fn left(
        from: impl Into<String>,
        target: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            join_type: JoinType::Left,
            from: from.into(),
            target: target.into(),
            alias: alias.into(),
            condition: None,
        }
    }
}

/// Generic query over one mapped class.
///
/// `first_result`/`max_results` of `None` impose no offset/limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub class: String,
    #[serde(default)]
    pub expression: Option<Expression>,
    #[serde(default)]
    pub orderings: Vec<Ordering>,
    #[serde(default)]
    pub first_result: Option<u64>,
    #[serde(default)]
    pub max_results: Option<u64>,
    #[serde(default)]
    pub selects: Vec<Select>,
    #[serde(default)]
    pub joins: Vec<Join>,
}

impl Query {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            expression: None,
            orderings: Vec::new(),
            first_result: None,
            max_results: None,
            selects: Vec::new(),
            joins: Vec::new(),
        }
    }

    pub fn with_expression(mut self, expression: Expression) -> Self {
        self.expression = Some(expression);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orderings.push(Ordering {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn first_result(mut self, first_result: u64) -> Self {
        self.first_result = Some(first_result);
        self
    }

    pub fn max_results(mut self, max_results: u64) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn select(mut self, select: Select) -> Self {
        self.selects.push(select);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, JoinType, Query, Select};
    use crate::query::error::QueryError;

    #[test]
    fn direction_parsing_is_case_insensitive() {
        assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Desc);
        assert_eq!(" asc ".parse::<Direction>().unwrap(), Direction::Asc);
        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(QueryError::UnknownDirection(_))
        ));
    }

    #[test]
    fn unknown_join_type_is_reported_by_name() {
        let err = "cross".parse::<JoinType>().unwrap_err();
        assert_eq!(err, QueryError::UnknownJoinType("cross".to_string()));
    }

    #[test]
    fn select_alias_defaults_to_name() {
        assert_eq!(Select::new("title").alias, "title");
        assert_eq!(Select::aliased("a.title", "headline").alias, "headline");
    }

    #[test]
    fn minimal_json_query_uses_defaults() {
        let query: Query = serde_json::from_str(r#"{"class": "page"}"#).unwrap();
        assert_eq!(query, Query::new("page"));
    }

    #[test]
    fn json_unknown_join_type_and_direction_report_query_errors() {
        let err = serde_json::from_str::<Query>(
            r#"{"class": "page", "joins": [{"type": "cross", "from": "a", "target": "author", "alias": "w"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown join type: cross"));

        let err = serde_json::from_str::<Query>(
            r#"{"class": "page", "orderings": [{"field": "title", "direction": "sideways"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown ordering direction: sideways"));

        let query: Query = serde_json::from_str(
            r#"{"class": "page", "orderings": [{"field": "title", "direction": "DESC"}]}"#,
        )
        .unwrap();
        assert_eq!(query.orderings[0].direction, Direction::Desc);
    }

    #[test]
    fn json_query_reads_orderings_paging_and_joins() {
        let query: Query = serde_json::from_str(
            r#"{
                "class": "page",
                "orderings": [{"field": "title", "direction": "desc"}],
                "first_result": 3,
                "max_results": 2,
                "joins": [{"type": "left", "from": "a", "target": "author", "alias": "w"}]
            }"#,
        )
        .unwrap();
        assert_eq!(query.orderings[0].direction, Direction::Desc);
        assert_eq!(query.first_result, Some(3));
        assert_eq!(query.max_results, Some(2));
        assert_eq!(query.joins[0].join_type, JoinType::Left);
        assert!(query.joins[0].condition.is_none());
    }
}
