//! Table creation for mapped classes.
//!
//! # Invariants
//! - Every table has `id INTEGER PRIMARY KEY AUTOINCREMENT`.
//! - Mapped columns are untyped; SQLite affinity follows stored values.
//! - All tables are created in one transaction.

use super::DbResult;
use crate::model::record::IDENTIFIER_FIELD;
use crate::storage::mapping::{ClassMetadata, Mapper};
use rusqlite::Connection;

/// Creates missing tables for every class registered in `mapper`.
pub fn apply_schema(conn: &mut Connection, mapper: &Mapper) -> DbResult<()> {
    let tx = conn.transaction()?;
    for metadata in mapper.classes() {
        tx.execute_batch(&create_table_sql(metadata))?;
    }
    tx.commit()?;
    Ok(())
}

/// Returns whether `table` exists on `conn`.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn create_table_sql(metadata: &ClassMetadata) -> String {
    let mut columns = vec![format!("{IDENTIFIER_FIELD} INTEGER PRIMARY KEY AUTOINCREMENT")];
    columns.extend(metadata.fields().iter().cloned());
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        metadata.table(),
        columns.join(", ")
    )
}
