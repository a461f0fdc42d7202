//! Storage-agnostic query description and its SQL compiler.
//!
//! # Responsibility
//! - Model generic filters (comparisons, AND/OR composites) and queries.
//! - Compile filters into a SQL predicate plus bound parameters.
//!
//! # Invariants
//! - Query values are read-only inputs; compilation never mutates them.

pub mod compiler;
pub mod error;
pub mod expression;
pub mod parameters;
pub mod request;
