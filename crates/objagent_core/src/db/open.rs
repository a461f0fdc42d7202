//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by the storage layer.
//! - Create tables for mapped classes before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have a table for every class in the mapper.

use super::schema::apply_schema;
use super::DbResult;
use crate::storage::mapping::Mapper;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and creates tables for `mapper`.
///
/// # Side effects
/// - Performs connection bootstrap and schema setup.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, mapper: &Mapper) -> DbResult<Connection> {
    open_with("file", mapper, || Connection::open(path))
}

/// Opens an in-memory SQLite database and creates tables for `mapper`.
///
/// # Side effects
/// - Performs connection bootstrap and schema setup.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory(mapper: &Mapper) -> DbResult<Connection> {
    open_with("memory", mapper, Connection::open_in_memory)
}

fn open_with(
    mode: &str,
    mapper: &Mapper,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, mapper) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, mapper: &Mapper) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_schema(conn, mapper)?;
    Ok(())
}
