//! Storage collaborator contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define what the agent needs from an entity manager: lookup by class
//!   and identifier, query builders, execution, writes and mapping metadata.
//! - Keep SQL details out of the agent.
//!
//! # Invariants
//! - `find` reports absence as `Ok(None)`, never as an error.
//! - Execution failures are surfaced unchanged; nothing here retries.

use crate::db::DbError;
use crate::model::record::{Record, Row};
use crate::model::value::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod expression_builder;
pub mod mapping;
pub mod query_builder;
pub mod sqlite;

pub use mapping::{ClassMetadata, Mapper};
pub use query_builder::QueryBuilder;
pub use sqlite::SqliteEntityManager;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Class has no mapping information.
    UnmappedClass(String),
    UnknownField {
        class: String,
        field: String,
    },
    /// Join attached to an alias the query does not define.
    UnknownAlias(String),
    /// Operation needs a persisted record.
    MissingIdentifier(String),
    InvalidMapping(String),
    InvalidData(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UnmappedClass(class) => write!(f, "class has no mapping information: {class}"),
            Self::UnknownField { class, field } => {
                write!(f, "field `{field}` is not mapped for class `{class}`")
            }
            Self::UnknownAlias(alias) => write!(f, "unknown query alias: {alias}"),
            Self::MissingIdentifier(class) => {
                write!(f, "record of class `{class}` has no identifier")
            }
            Self::InvalidMapping(message) => write!(f, "invalid class mapping: {message}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Entity manager the persistence agent delegates to.
pub trait EntityManager {
    /// Looks up one record; `Ok(None)` when no record has `id`.
    fn find(&self, class: &str, id: &Value) -> StorageResult<Option<Record>>;

    /// Creates a builder selecting from `class` under `alias`.
    fn create_query_builder(&self, class: &str, alias: &str) -> StorageResult<QueryBuilder>;

    /// Executes `builder` and hydrates records of the builder's class.
    fn find_with(&self, builder: &QueryBuilder) -> StorageResult<Vec<Record>>;

    /// Executes `builder` and returns raw rows keyed by column name.
    fn execute(&self, builder: &QueryBuilder) -> StorageResult<Vec<Row>>;

    /// Executes `builder` and returns the first column of the first row.
    fn fetch_column(&self, builder: &QueryBuilder) -> StorageResult<Option<Value>>;

    /// Inserts or updates `record`; assigns its identifier on insert.
    fn save(&self, record: &mut Record) -> StorageResult<()>;

    fn delete(&self, record: &Record) -> StorageResult<()>;

    fn class_metadata(&self, class: &str) -> Option<&ClassMetadata>;
}
