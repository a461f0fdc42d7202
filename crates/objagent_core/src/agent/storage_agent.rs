//! Persistence agent over an entity manager.
//!
//! # Responsibility
//! - Implement [`ObjectAgent`] by delegating to an [`EntityManager`].
//! - Translate generic queries into query builders via the expression
//!   compiler.
//! - Normalize "absent" lookups and unsupported operations into
//!   [`AgentError`] values.
//!
//! # Invariants
//! - The query source is always aliased [`SOURCE_ALIAS`].
//! - The identifier field is always [`IDENTIFIER_FIELD`].
//! - No state is kept across calls.

use super::{AgentError, AgentResult, Capabilities, ObjectAgent};
use crate::model::record::{Record, Row, IDENTIFIER_FIELD};
use crate::model::value::Value;
use crate::query::compiler::{qualify_field, ExpressionCompiler};
use crate::query::error::QueryError;
use crate::query::expression::{Comparator, Expression};
use crate::query::request::{JoinType, Query};
use crate::storage::{EntityManager, QueryBuilder, StorageError};
use log::{debug, error};
use std::time::Instant;

/// Alias of the queried class in every generated statement.
pub const SOURCE_ALIAS: &str = "a";

/// Agent implementation backed by an entity manager.
pub struct StorageAgent<M: EntityManager> {
    manager: M,
}

impl<M: EntityManager> StorageAgent<M> {
    pub fn new(manager: M) -> Self {
        Self { manager }
    }

    /// Returns the underlying entity manager.
    pub fn entity_manager(&self) -> &M {
        &self.manager
    }

    /// Builder for `query.class` with the compiled filter applied.
    fn filtered_builder(&self, query: &Query) -> AgentResult<QueryBuilder> {
        let mut builder = self
            .manager
            .create_query_builder(&query.class, SOURCE_ALIAS)?;

        if let Some(expression) = &query.expression {
            let compiled = ExpressionCompiler::new(SOURCE_ALIAS).compile(expression)?;
            if let Some(predicate) = compiled.predicate {
                builder.where_clause(predicate);
            }
            builder.set_parameters(compiled.parameters);
        }

        Ok(builder)
    }

    /// Builder with filter, orderings, paging and joins applied.
    fn shaped_builder(&self, query: &Query) -> AgentResult<QueryBuilder> {
        let mut builder = self.filtered_builder(query)?;

        for ordering in &query.orderings {
            builder.add_order_by(
                qualify_field(SOURCE_ALIAS, &ordering.field),
                ordering.direction,
            );
        }

        if let Some(first_result) = query.first_result {
            builder.set_first_result(first_result);
        }

        if let Some(max_results) = query.max_results {
            builder.set_max_results(max_results);
        }

        for join in &query.joins {
            let table = self
                .manager
                .class_metadata(&join.target)
                .ok_or_else(|| StorageError::UnmappedClass(join.target.clone()))?
                .table()
                .to_string();

            match join.join_type {
                JoinType::Inner => {
                    let condition = join
                        .condition
                        .as_deref()
                        .ok_or_else(|| QueryError::MissingJoinCondition(join.alias.clone()))?;
                    builder.inner_join(&join.from, table, join.alias.as_str(), condition)?;
                }
                JoinType::Left => {
                    builder.left_join(&join.from, table, join.alias.as_str())?;
                }
            }
        }

        Ok(builder)
    }

    fn require_class<'c>(class: Option<&'c str>, operation: &'static str) -> AgentResult<&'c str> {
        class.ok_or(AgentError::MissingClassArgument(operation))
    }
}

impl<M: EntityManager> ObjectAgent for StorageAgent<M> {
    fn capabilities(&self) -> Capabilities {
        Capabilities::new(false, true, Comparator::ALL)
    }

    fn find(&self, identifier: &Value, class: Option<&str>) -> AgentResult<Record> {
        let class = Self::require_class(class, "find")?;

        // Storage reports absence as `None`; callers get an error instead.
        self.manager
            .find(class, identifier)?
            .ok_or_else(|| AgentError::ObjectNotFound {
                class: class.to_string(),
                identifier: identifier.clone(),
            })
    }

    fn find_many(&self, identifiers: &[Value], class: Option<&str>) -> AgentResult<Vec<Record>> {
        let class = Self::require_class(class, "find_many")?;

        let query = Query::new(class).with_expression(Expression::comparison(
            Comparator::In,
            IDENTIFIER_FIELD,
            Value::List(identifiers.to_vec()),
        ));
        let builder = self.filtered_builder(&query)?;

        Ok(self.manager.find_with(&builder)?)
    }

    fn persist(&self, object: &mut Record) -> AgentResult<()> {
        Ok(self.manager.save(object)?)
    }

    fn remove(&self, object: &Record) -> AgentResult<()> {
        Ok(self.manager.delete(object)?)
    }

    fn flush(&self) -> AgentResult<()> {
        Ok(())
    }

    fn identifier(&self, _object: &Record) -> &'static str {
        IDENTIFIER_FIELD
    }

    fn set_parent(&self, _object: &mut Record, _parent: &Record) -> AgentResult<()> {
        Err(AgentError::UnsupportedOperation(
            "storage is not hierarchical, cannot set parent".to_string(),
        ))
    }

    fn supports(&self, class: &str) -> bool {
        self.manager.class_metadata(class).is_some()
    }

    fn query(&self, query: &Query) -> AgentResult<Vec<Record>> {
        if !query.selects.is_empty() {
            return Err(AgentError::UnsupportedOperation(
                "custom selects return raw rows; use query_rows".to_string(),
            ));
        }

        let started_at = Instant::now();
        let result = self
            .shaped_builder(query)
            .and_then(|builder| Ok(self.manager.find_with(&builder)?));
        log_outcome("agent_query", &query.class, started_at, &result, Vec::len);
        result
    }

    fn query_rows(&self, query: &Query) -> AgentResult<Vec<Row>> {
        let started_at = Instant::now();
        let result = self.shaped_builder(query).and_then(|mut builder| {
            builder.select(
                query
                    .selects
                    .iter()
                    .map(|select| {
                        format!(
                            "{} AS {}",
                            qualify_field(SOURCE_ALIAS, &select.name),
                            select.alias
                        )
                    })
                    .collect(),
            );
            Ok(self.manager.execute(&builder)?)
        });
        log_outcome("agent_query_rows", &query.class, started_at, &result, Vec::len);
        result
    }

    fn query_count(&self, query: &Query) -> AgentResult<u64> {
        let started_at = Instant::now();
        let result = self.filtered_builder(query).and_then(|mut builder| {
            builder.select(vec![format!("count({SOURCE_ALIAS}.{IDENTIFIER_FIELD})")]);
            match self.manager.fetch_column(&builder)? {
                Some(Value::Integer(count)) => u64::try_from(count).map_err(|_| {
                    AgentError::Storage(StorageError::InvalidData(format!(
                        "negative count `{count}`"
                    )))
                }),
                other => Err(AgentError::Storage(StorageError::InvalidData(format!(
                    "count query returned `{}`",
                    other.unwrap_or(Value::Null)
                )))),
            }
        });
        log_outcome("agent_query_count", &query.class, started_at, &result, |count| {
            usize::try_from(*count).unwrap_or(usize::MAX)
        });
        result
    }
}

fn log_outcome<T>(
    event: &str,
    class: &str,
    started_at: Instant,
    result: &AgentResult<T>,
    size: impl Fn(&T) -> usize,
) {
    match result {
        Ok(value) => debug!(
            "event={} module=agent status=ok class={} rows={} duration_ms={}",
            event,
            class,
            size(value),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={} module=agent status=error class={} duration_ms={} error={}",
            event,
            class,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
