//! SQLite-backed entity manager.
//!
//! # Responsibility
//! - Execute query builders against a rusqlite connection.
//! - Hydrate rows into records of mapped classes.
//! - Insert/update/delete records by identifier.
//!
//! # Invariants
//! - List-valued parameters are expanded to one placeholder per element
//!   before binding; quoted SQL literals are never rewritten.
//! - Only parameters referenced by the statement are bound.
//! - Logging carries metadata only, never bound values.

use super::mapping::{ClassMetadata, Mapper};
use super::query_builder::QueryBuilder;
use super::{EntityManager, StorageError, StorageResult};
use crate::model::record::{Record, Row, IDENTIFIER_FIELD};
use crate::model::value::Value;
use crate::query::parameters::ParameterMap;
use log::{debug, error};
use regex::{Captures, Regex};
use rusqlite::{params_from_iter, Connection};
use std::time::Instant;

const FIND_ALIAS: &str = "a";

/// Column names plus positional values of each result row.
struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    fn into_rows(self) -> Vec<Row> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect())
            .collect()
    }
}

/// Entity manager over a borrowed SQLite connection.
pub struct SqliteEntityManager<'conn> {
    conn: &'conn Connection,
    mapper: Mapper,
}

impl<'conn> SqliteEntityManager<'conn> {
    /// Creates a manager; tables for `mapper` must already exist
    /// (see [`crate::db::open_db`]).
    pub fn new(conn: &'conn Connection, mapper: Mapper) -> Self {
        Self { conn, mapper }
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    fn metadata_for(&self, class: &str) -> StorageResult<&ClassMetadata> {
        self.mapper
            .class_metadata(class)
            .ok_or_else(|| StorageError::UnmappedClass(class.to_string()))
    }

    fn run(&self, builder: &QueryBuilder) -> StorageResult<ResultSet> {
        let started_at = Instant::now();
        let (sql, bindings) = expand_list_parameters(&builder.to_sql(), builder.parameters())?;

        match self.run_sql(&sql, &bindings) {
            Ok(result) => {
                debug!(
                    "event=storage_execute module=storage status=ok class={} rows={} duration_ms={}",
                    builder.class(),
                    result.rows.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(result)
            }
            Err(err) => {
                error!(
                    "event=storage_execute module=storage status=error class={} duration_ms={} error={}",
                    builder.class(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn run_sql(&self, sql: &str, bindings: &[(String, Value)]) -> StorageResult<ResultSet> {
        let mut stmt = self.conn.prepare(sql)?;
        for (name, value) in bindings {
            if let Some(index) = stmt.parameter_index(&format!(":{name}"))? {
                stmt.raw_bind_parameter(index, value)?;
            }
        }

        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut rows = stmt.raw_query();
        let mut values = Vec::new();

        while let Some(row) = rows.next()? {
            let mut row_values = Vec::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                let value = Value::from_sql_ref(row.get_ref(index)?).ok_or_else(|| {
                    StorageError::InvalidData(format!("unsupported BLOB value in column `{column}`"))
                })?;
                row_values.push(value);
            }
            values.push(row_values);
        }

        Ok(ResultSet {
            columns,
            rows: values,
        })
    }

    /// Splits `record` into mapped column names and values, skipping `id`.
    fn mapped_columns(
        &self,
        metadata: &ClassMetadata,
        record: &Record,
    ) -> StorageResult<(Vec<String>, Vec<Value>)> {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for (field, value) in record.fields() {
            if field == IDENTIFIER_FIELD {
                continue;
            }
            if !metadata.has_field(field) {
                return Err(StorageError::UnknownField {
                    class: metadata.class().to_string(),
                    field: field.to_string(),
                });
            }
            columns.push(field.to_string());
            values.push(value.clone());
        }
        Ok((columns, values))
    }
}

impl EntityManager for SqliteEntityManager<'_> {
    fn find(&self, class: &str, id: &Value) -> StorageResult<Option<Record>> {
        let mut builder = self.create_query_builder(class, FIND_ALIAS)?;
        let mut parameters = ParameterMap::new();
        let token = parameters.register(IDENTIFIER_FIELD, id.clone());
        let predicate = builder
            .expr()
            .eq(&format!("{FIND_ALIAS}.{IDENTIFIER_FIELD}"), &token);
        builder
            .where_clause(predicate)
            .set_parameters(parameters)
            .set_max_results(1);

        Ok(self.find_with(&builder)?.into_iter().next())
    }

    fn create_query_builder(&self, class: &str, alias: &str) -> StorageResult<QueryBuilder> {
        let metadata = self.metadata_for(class)?;
        Ok(QueryBuilder::new(class, metadata.table(), alias))
    }

    fn find_with(&self, builder: &QueryBuilder) -> StorageResult<Vec<Record>> {
        let mut hydrating = builder.clone();
        hydrating.select(vec![format!("{}.*", builder.alias())]);
        let class = builder.class();

        Ok(self
            .run(&hydrating)?
            .into_rows()
            .into_iter()
            .map(|row| Record::from_row(class, row))
            .collect())
    }

    fn execute(&self, builder: &QueryBuilder) -> StorageResult<Vec<Row>> {
        Ok(self.run(builder)?.into_rows())
    }

    fn fetch_column(&self, builder: &QueryBuilder) -> StorageResult<Option<Value>> {
        let result = self.run(builder)?;
        Ok(result
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next()))
    }

    fn save(&self, record: &mut Record) -> StorageResult<()> {
        let metadata = self.metadata_for(record.class())?;
        let (mut columns, mut values) = self.mapped_columns(metadata, record)?;
        let table = metadata.table();

        match record.id().cloned() {
            Some(id) => {
                let updates = if columns.is_empty() {
                    "DO NOTHING".to_string()
                } else {
                    format!(
                        "DO UPDATE SET {}",
                        columns
                            .iter()
                            .map(|column| format!("{column} = excluded.{column}"))
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                };
                columns.insert(0, IDENTIFIER_FIELD.to_string());
                values.insert(0, id);
                let sql = format!(
                    "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT({IDENTIFIER_FIELD}) {updates};",
                    columns.join(", "),
                    placeholders(columns.len())
                );
                self.conn.execute(&sql, params_from_iter(values))?;
            }
            None => {
                let sql = if columns.is_empty() {
                    format!("INSERT INTO {table} DEFAULT VALUES;")
                } else {
                    format!(
                        "INSERT INTO {table} ({}) VALUES ({});",
                        columns.join(", "),
                        placeholders(columns.len())
                    )
                };
                self.conn.execute(&sql, params_from_iter(values))?;
                record.set(IDENTIFIER_FIELD, self.conn.last_insert_rowid());
            }
        }

        debug!(
            "event=storage_save module=storage status=ok class={}",
            record.class()
        );
        Ok(())
    }

    fn delete(&self, record: &Record) -> StorageResult<()> {
        let metadata = self.metadata_for(record.class())?;
        let id = record
            .id()
            .ok_or_else(|| StorageError::MissingIdentifier(record.class().to_string()))?;

        let changed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {IDENTIFIER_FIELD} = ?1;",
                metadata.table()
            ),
            [id],
        )?;

        debug!(
            "event=storage_delete module=storage status=ok class={} changed={}",
            record.class(),
            changed
        );
        Ok(())
    }

    fn class_metadata(&self, class: &str) -> Option<&ClassMetadata> {
        self.mapper.class_metadata(class)
    }
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrites `:name` of every list parameter into `:name_0, :name_1, ...`
/// and flattens the bindings accordingly.
fn expand_list_parameters(
    sql: &str,
    parameters: &ParameterMap,
) -> StorageResult<(String, Vec<(String, Value)>)> {
    let mut sql = sql.to_string();
    let mut bindings = Vec::with_capacity(parameters.len());

    for (name, value) in parameters.iter() {
        let Some(items) = value.as_list() else {
            bindings.push((name.to_string(), value.clone()));
            continue;
        };

        let names = (0..items.len())
            .map(|index| format!("{name}_{index}"))
            .collect::<Vec<_>>();
        let expanded = names
            .iter()
            .map(|expanded_name| format!(":{expanded_name}"))
            .collect::<Vec<_>>()
            .join(", ");
        // Quoted literals match first and are put back untouched.
        let pattern = Regex::new(&format!(r"'(?:[^']|'')*'|:{}\b", regex::escape(name)))
            .map_err(|err| {
                StorageError::InvalidData(format!("invalid parameter name `{name}`: {err}"))
            })?;
        sql = pattern
            .replace_all(&sql, |captures: &Captures<'_>| {
                let matched = &captures[0];
                if matched.starts_with('\'') {
                    matched.to_string()
                } else {
                    expanded.clone()
                }
            })
            .into_owned();
        bindings.extend(names.into_iter().zip(items.iter().cloned()));
    }

    Ok((sql, bindings))
}
