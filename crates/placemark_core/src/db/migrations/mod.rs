//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Every migration script is idempotent (`IF NOT EXISTS`), so the marked
//!   places script doubles as the gateway's `ensure_schema` statement.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema for the durable marked-places mirror.
pub const MARKED_PLACES_SCHEMA_SQL: &str = include_str!("0001_marked_places.sql");

/// Schema for the persisted anonymous identity slot.
pub const ANONYMOUS_IDENTITY_SCHEMA_SQL: &str = include_str!("0002_anonymous_identity.sql");

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: MARKED_PLACES_SCHEMA_SQL,
    },
    Migration {
        version: 2,
        sql: ANONYMOUS_IDENTITY_SCHEMA_SQL,
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
    {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
