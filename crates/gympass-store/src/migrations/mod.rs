//! Database migration runner.
//!
//! Migrations are executed in order on every [`Database::open_at`] call.
//! Each migration is guarded by a `user_version` pragma so it runs exactly
//! once.
//!
//! [`Database::open_at`]: crate::Database::open_at

pub mod v001_initial;
pub mod v002_single_active_barcode;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Up = fn(&Connection) -> rusqlite::Result<()>;

/// Every migration in order. Versions are contiguous from 1.
const MIGRATIONS: &[(u32, &str, Up)] = &[
    (1, "v001_initial", v001_initial::up),
    (2, "v002_single_active_barcode", v002_single_active_barcode::up),
];

/// Current schema version.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Run all pending migrations against the open connection.
///
/// Each migration and its `user_version` bump commit together, so a failed
/// step leaves the database at the previous version.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    for &(version, name, up) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        tracing::info!(version, "applying migration {name}");

        let tx = conn.unchecked_transaction()?;
        up(&tx).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }

    Ok(())
}
