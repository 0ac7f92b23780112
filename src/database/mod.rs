//! Database module for gesture-ctrl.
//!
//! Provides SQLite connection management and migrations for the URL preset
//! store. Database is stored at `~/.gesture-ctrl/gesture.db`.

pub mod migrations;
pub mod presets;
pub mod schema;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::database::migrations::run_migrations;

pub use presets::{UrlPreset, UrlStore, DEFAULT_URL, URL_LIMIT};

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to create database directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Maximum of {0} URLs reached")]
    LimitReached(usize),

    #[error("A URL named {0:?} already exists")]
    NameExists(String),

    #[error("No URL named {0:?}")]
    NotFound(String),
}

/// Returns the path to the database file (~/.gesture-ctrl/gesture.db).
pub fn get_database_path() -> Result<PathBuf, DatabaseError> {
    let home = dirs::home_dir().ok_or_else(|| {
        DatabaseError::DirectoryCreation(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        ))
    })?;

    Ok(home.join(".gesture-ctrl").join("gesture.db"))
}

/// Opens a database file, creating its directory and applying migrations.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            tracing::info!("Created database directory at {:?}", dir);
        }
    }

    tracing::info!("Database path: {:?}", path);
    let mut conn = Connection::open(path)?;
    run_migrations(&mut conn)?;
    Ok(conn)
}
