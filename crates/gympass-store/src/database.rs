//! The gym's SQLite file.
//!
//! A [`Database`] is only handed out after the schema has been migrated to
//! [`CURRENT_VERSION`](crate::migrations::CURRENT_VERSION), with WAL journaling
//! and foreign keys switched on.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// One open connection. Not `Sync`; each process opens its own.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database in the per-user data directory, creating it on
    /// first run:
    /// - Linux:   `~/.local/share/gympass/gympass.db`
    /// - macOS:   `~/Library/Application Support/com.gympass.gympass/gympass.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\gympass\gympass\data\gympass.db`
    pub fn open_default() -> Result<Self> {
        Self::open_at(&default_path()?)
    }

    /// Open `path`, creating the file and any missing parent directories.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// The raw connection, for the per-table `impl Database` blocks.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// `None` for in-memory connections.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}

/// Location of the default database file.
pub fn default_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("com", "gympass", "gympass").ok_or(StoreError::NoDataDir)?;
    Ok(project_dirs.data_dir().join("gympass.db"))
}
