//! Generic object persistence agent contract.
//!
//! # Responsibility
//! - Define the storage-agnostic agent operations generic callers use.
//! - Normalize storage semantics into one error vocabulary.
//!
//! # Invariants
//! - Absence is reported as `ObjectNotFound`, never as an empty value.
//! - Precondition violations fail before storage is contacted.
//! - Storage failures propagate unchanged; nothing here retries.

use crate::model::record::{Record, Row};
use crate::model::value::Value;
use crate::query::error::QueryError;
use crate::query::request::Query;
use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod capabilities;
pub mod storage_agent;

pub use capabilities::Capabilities;
pub use storage_agent::StorageAgent;

pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug)]
pub enum AgentError {
    /// Identifier lookup called without the mandatory class argument.
    MissingClassArgument(&'static str),
    ObjectNotFound {
        class: String,
        identifier: Value,
    },
    /// Operation has no meaning for this backend.
    UnsupportedOperation(String),
    Query(QueryError),
    Storage(StorageError),
}

impl Display for AgentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingClassArgument(operation) => {
                write!(f, "the class argument is mandatory for `{operation}`")
            }
            Self::ObjectNotFound { class, identifier } => write!(
                f,
                "Could not find object of class `{class}` with identifier `{identifier}`"
            ),
            Self::UnsupportedOperation(message) => write!(f, "unsupported operation: {message}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AgentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueryError> for AgentError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

impl From<StorageError> for AgentError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Storage-agnostic persistence contract.
pub trait ObjectAgent {
    fn capabilities(&self) -> Capabilities;

    /// Finds one object. `class` is mandatory despite being optional here.
    fn find(&self, identifier: &Value, class: Option<&str>) -> AgentResult<Record>;

    /// Finds all objects whose identifier is in `identifiers`.
    ///
    /// Result order follows storage, not `identifiers`.
    fn find_many(&self, identifiers: &[Value], class: Option<&str>) -> AgentResult<Vec<Record>>;

    fn persist(&self, object: &mut Record) -> AgentResult<()>;

    fn remove(&self, object: &Record) -> AgentResult<()>;

    /// Writes pending changes; agents with synchronous writes do nothing.
    fn flush(&self) -> AgentResult<()>;

    /// Name of the identifier field of `object`.
    fn identifier(&self, object: &Record) -> &'static str;

    fn set_parent(&self, object: &mut Record, parent: &Record) -> AgentResult<()>;

    fn supports(&self, class: &str) -> bool;

    /// Runs `query` and returns hydrated objects.
    fn query(&self, query: &Query) -> AgentResult<Vec<Record>>;

    /// Runs `query` with its custom selects and returns raw rows.
    fn query_rows(&self, query: &Query) -> AgentResult<Vec<Row>>;

    /// Counts objects matching the query filter; ordering, paging,
    /// selects and joins are ignored.
    fn query_count(&self, query: &Query) -> AgentResult<u64>;
}
