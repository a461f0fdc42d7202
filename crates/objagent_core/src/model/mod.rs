//! Dynamic object model shared by the agent and the storage layer.
//!
//! # Responsibility
//! - Define the value type carried through expressions and parameters.
//! - Define hydrated records and raw rows returned by storage.
//!
//! # Invariants
//! - Every persisted record is identified by its `id` field.

pub mod record;
pub mod value;
