//! SQL SELECT builder over one mapped class.
//!
//! # Invariants
//! - The source table is always aliased; joins may only hang off the
//!   source alias or an alias introduced by an earlier join.
//! - An offset without a limit renders `LIMIT -1 OFFSET n`.

use super::expression_builder::ExpressionBuilder;
use super::{StorageError, StorageResult};
use crate::query::parameters::ParameterMap;
use crate::query::request::Direction;

#[derive(Debug, Clone, PartialEq, Eq)]
enum JoinClause {
    Inner {
        table: String,
        alias: String,
        condition: String,
    },
    Left {
        table: String,
        alias: String,
    },
}

/// Mutable SELECT builder, created by an entity manager for one class.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    class: String,
    table: String,
    alias: String,
    selects: Vec<String>,
    joins: Vec<JoinClause>,
    predicate: Option<String>,
    parameters: ParameterMap,
    order_by: Vec<String>,
    first_result: Option<u64>,
    max_results: Option<u64>,
}

impl QueryBuilder {
    pub fn new(
        class: impl Into<String>,
        table: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            table: table.into(),
            alias: alias.into(),
            selects: Vec::new(),
            joins: Vec::new(),
            predicate: None,
            parameters: ParameterMap::new(),
            order_by: Vec::new(),
            first_result: None,
            max_results: None,
        }
    }

    pub fn expr(&self) -> ExpressionBuilder {
        ExpressionBuilder
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    /// Replaces the projection list.
    pub fn select(&mut self, selects: Vec<String>) -> &mut Self {
        self.selects = selects;
        self
    }

    pub fn add_select(&mut self, select: impl Into<String>) -> &mut Self {
        self.selects.push(select.into());
        self
    }

    /// Replaces the WHERE predicate.
    pub fn where_clause(&mut self, predicate: impl Into<String>) -> &mut Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn set_parameters(&mut self, parameters: ParameterMap) -> &mut Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn add_order_by(&mut self, sort: impl Into<String>, direction: Direction) -> &mut Self {
        self.order_by
            .push(format!("{} {}", sort.into(), direction.as_sql()));
        self
    }

    pub fn set_first_result(&mut self, first_result: u64) -> &mut Self {
        self.first_result = Some(first_result);
        self
    }

    pub fn set_max_results(&mut self, max_results: u64) -> &mut Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn inner_join(
        &mut self,
        from: &str,
        table: impl Into<String>,
        alias: impl Into<String>,
        condition: impl Into<String>,
    ) -> StorageResult<&mut Self> {
        self.ensure_known_alias(from)?;
        self.joins.push(JoinClause::Inner {
            table: table.into(),
            alias: alias.into(),
            condition: condition.into(),
        });
        Ok(self)
    }

    pub fn left_join(
        &mut self,
        from: &str,
        table: impl Into<String>,
        alias: impl Into<String>,
    ) -> StorageResult<&mut Self> {
        self.ensure_known_alias(from)?;
        self.joins.push(JoinClause::Left {
            table: table.into(),
            alias: alias.into(),
        });
        Ok(self)
    }

    /// Renders the SELECT statement with named `:param` placeholders.
    pub fn to_sql(&self) -> String {
        let projection = if self.selects.is_empty() {
            format!("{}.*", self.alias)
        } else {
            self.selects.join(", ")
        };
        let mut sql = format!("SELECT {projection} FROM {} {}", self.table, self.alias);

        for join in &self.joins {
            match join {
                JoinClause::Inner {
                    table,
                    alias,
                    condition,
                } => sql.push_str(&format!(" INNER JOIN {table} {alias} ON {condition}")),
                JoinClause::Left { table, alias } => {
                    sql.push_str(&format!(" LEFT JOIN {table} {alias}"))
                }
            }
        }

        if let Some(predicate) = &self.predicate {
            sql.push_str(&format!(" WHERE {predicate}"));
        }

        if !self.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by.join(", ")));
        }

        match (self.max_results, self.first_result) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        sql
    }

    fn ensure_known_alias(&self, from: &str) -> StorageResult<()> {
        let known = from == self.alias
            || self.joins.iter().any(|join| match join {
                JoinClause::Inner { alias, .. } | JoinClause::Left { alias, .. } => alias == from,
            });
        if known {
            Ok(())
        } else {
            Err(StorageError::UnknownAlias(from.to_string()))
        }
    }
}
