//! Errors raised while building or compiling generic queries.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type QueryResult<T> = Result<T, QueryError>;

/// Caller/configuration errors in a generic query. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Comparator name has no compiler handler.
    UnknownComparator(String),
    /// Expression variant (or composite type) the compiler does not handle.
    UnrecognizedExpression(String),
    UnknownJoinType(String),
    UnknownDirection(String),
    /// Inner join without an ON condition; carries the join alias.
    MissingJoinCondition(String),
    /// List comparator received a scalar value.
    NonListValue { field: String, comparator: String },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownComparator(name) => write!(f, "unknown comparator: {name}"),
            Self::UnrecognizedExpression(kind) => write!(f, "unknown expression: {kind}"),
            Self::UnknownJoinType(kind) => write!(f, "unknown join type: {kind}"),
            Self::UnknownDirection(direction) => {
                write!(f, "unknown ordering direction: {direction}")
            }
            Self::MissingJoinCondition(alias) => {
                write!(f, "inner join `{alias}` requires a condition")
            }
            Self::NonListValue { field, comparator } => write!(
                f,
                "comparator `{comparator}` on field `{field}` requires a list value"
            ),
        }
    }
}

impl Error for QueryError {}
