//! Object persistence agent over a SQLite entity manager.
//! Generic callers describe filters as expression trees; this crate compiles
//! them into SQL predicates and normalizes storage semantics.

pub mod agent;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod storage;

pub use agent::storage_agent::SOURCE_ALIAS;
pub use agent::{AgentError, AgentResult, Capabilities, ObjectAgent, StorageAgent};
pub use logging::{
    default_log_level, init_logging, init_logging_with, logging_status, LoggingConfig, LoggingError,
};
pub use model::record::{Record, Row, IDENTIFIER_FIELD};
pub use model::value::Value;
pub use query::compiler::{CompiledExpression, ExpressionCompiler};
pub use query::error::{QueryError, QueryResult};
pub use query::expression::{Comparator, Comparison, Composite, CompositeType, Expression};
pub use query::parameters::ParameterMap;
pub use query::request::{Direction, Join, JoinType, Ordering, Query, Select};
pub use storage::{
    ClassMetadata, EntityManager, Mapper, QueryBuilder, SqliteEntityManager, StorageError,
    StorageResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
