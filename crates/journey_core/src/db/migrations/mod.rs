//! Schema steps for the entry database.
//!
//! # Invariants
//! - Steps are listed in ascending version order, starting at 1.
//! - Each step commits together with its `user_version` bump, so an
//!   interrupted upgrade resumes at the first unapplied step.
//! - The entry blob carries no version of its own; only the table layout
//!   around it is migrated here.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, sql)` pairs applied in order.
const STEPS: &[(u32, &str)] = &[(1, include_str!("0001_kv_items.sql"))];

/// Latest schema version this binary can produce.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Reads the schema version recorded in the database file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Applies every step newer than the recorded schema version.
///
/// # Errors
/// - `SchemaTooNew` when the file is ahead of this binary.
/// - `Migration` naming the step that failed; earlier steps stay applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    for &(version, sql) in STEPS.iter().filter(|(version, _)| *version > found) {
        apply_step(conn, version, sql).map_err(|source| DbError::Migration { version, source })?;
        info!("event=db_migrate module=db status=ok version={version}");
    }
    Ok(())
}

fn apply_step(conn: &mut Connection, version: u32, sql: &str) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(sql)?;
    tx.pragma_update(None, "user_version", version)?;
    tx.commit()
}
