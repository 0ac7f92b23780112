//! URL preset store.
//!
//! Named URLs (at most [`URL_LIMIT`]) plus the name of the "active" preset,
//! which is what a plain `OPEN_URL` action opens. The store implements
//! [`UrlResolver`] so the dispatcher can resolve `OPEN_URL:<name>` at
//! execution time and always see the latest edits.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

use crate::bindings::DEFAULT_URL_PRESET;
use crate::database::migrations::run_migrations;
use crate::database::schema::ACTIVE_URL_KEY;
use crate::database::{get_database_path, open_database, DatabaseError};
use crate::dispatch::UrlResolver;

/// Maximum number of stored presets.
pub const URL_LIMIT: usize = 10;

/// URL seeded on first use and returned when the active preset is missing.
pub const DEFAULT_URL: &str = "https://www.youtube.com/";

/// A stored URL preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlPreset {
    pub id: i64,
    pub name: String,
    pub url: String,
}

/// SQLite-backed URL presets with an active selection.
pub struct UrlStore {
    conn: Mutex<Connection>,
}

impl UrlStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Self::from_connection(open_database(path)?)
    }

    /// Opens the store at `~/.gesture-ctrl/gesture.db`.
    pub fn open_default() -> Result<Self, DatabaseError> {
        Self::open(&get_database_path()?)
    }

    /// An in-memory store, seeded like a fresh database.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let mut conn = Connection::open_in_memory()?;
        run_migrations(&mut conn)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        if store.count()? == 0 {
            tracing::info!("Seeding default URL preset {}", DEFAULT_URL_PRESET);
            store.add(DEFAULT_URL_PRESET, DEFAULT_URL)?;
            store.set_active(DEFAULT_URL_PRESET)?;
        }
        Ok(store)
    }

    /// All presets in insertion order.
    pub fn list(&self) -> Result<Vec<UrlPreset>, DatabaseError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, name, url FROM urls ORDER BY id ASC")?;
        let presets = stmt
            .query_map([], |row| {
                Ok(UrlPreset {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    url: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(presets)
    }

    /// Preset names in insertion order.
    pub fn names(&self) -> Result<Vec<String>, DatabaseError> {
        let conn = self.conn.lock();
        list_names(&conn)
    }

    pub fn get_url(&self, name: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn.lock();
        get_url(&conn, name)
    }

    pub fn count(&self) -> Result<usize, DatabaseError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Adds a preset. Fails once [`URL_LIMIT`] presets exist or the name is taken.
    pub fn add(&self, name: &str, url: &str) -> Result<(), DatabaseError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;
        if count as usize >= URL_LIMIT {
            return Err(DatabaseError::LimitReached(URL_LIMIT));
        }
        if get_url(&conn, name)?.is_some() {
            return Err(DatabaseError::NameExists(name.to_string()));
        }

        conn.execute("INSERT INTO urls (name, url) VALUES (?1, ?2)", params![name, url])?;
        tracing::info!("Added URL preset {} -> {}", name, url);
        Ok(())
    }

    /// Renames and/or re-points a preset.
    ///
    /// If the renamed preset was active, the active selection follows it.
    pub fn update(
        &self,
        old_name: &str,
        new_name: &str,
        new_url: &str,
    ) -> Result<(), DatabaseError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        if get_url(&tx, old_name)?.is_none() {
            return Err(DatabaseError::NotFound(old_name.to_string()));
        }
        if old_name != new_name && get_url(&tx, new_name)?.is_some() {
            return Err(DatabaseError::NameExists(new_name.to_string()));
        }

        tx.execute(
            "UPDATE urls SET name = ?1, url = ?2 WHERE name = ?3",
            params![new_name, new_url, old_name],
        )?;
        if get_active_setting(&tx)?.as_deref() == Some(old_name) {
            set_active_setting(&tx, new_name)?;
        }
        tx.commit()?;

        tracing::info!("Updated URL preset {} -> {} ({})", old_name, new_name, new_url);
        Ok(())
    }

    /// Removes a preset.
    ///
    /// Deleting the active preset moves the selection to the first remaining
    /// one, or to the default name if none are left.
    pub fn delete(&self, name: &str) -> Result<(), DatabaseError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM urls WHERE name = ?1", params![name])?;
        if get_active_setting(&tx)?.as_deref() == Some(name) {
            let fallback = list_names(&tx)?
                .into_iter()
                .next()
                .unwrap_or_else(|| DEFAULT_URL_PRESET.to_string());
            tracing::info!("Active URL preset deleted, falling back to {}", fallback);
            set_active_setting(&tx, &fallback)?;
        }
        tx.commit()?;

        if removed > 0 {
            tracing::info!("Deleted URL preset {}", name);
        }
        Ok(())
    }

    /// Selects the preset opened by plain `OPEN_URL`.
    pub fn set_active(&self, name: &str) -> Result<(), DatabaseError> {
        let conn = self.conn.lock();
        if get_url(&conn, name)?.is_none() {
            return Err(DatabaseError::NotFound(name.to_string()));
        }
        set_active_setting(&conn, name)?;
        tracing::info!("Active URL preset set to {}", name);
        Ok(())
    }

    pub fn active_name(&self) -> Result<String, DatabaseError> {
        let conn = self.conn.lock();
        Ok(get_active_setting(&conn)?.unwrap_or_else(|| DEFAULT_URL_PRESET.to_string()))
    }

    /// URL of the active preset, or [`DEFAULT_URL`] if it no longer exists.
    pub fn active_url(&self) -> Result<String, DatabaseError> {
        let conn = self.conn.lock();
        let name = get_active_setting(&conn)?.unwrap_or_else(|| DEFAULT_URL_PRESET.to_string());
        Ok(get_url(&conn, &name)?.unwrap_or_else(|| DEFAULT_URL.to_string()))
    }

    /// Adds the preset unless one with this name already exists.
    pub fn ensure(&self, name: &str, url: &str) -> Result<(), DatabaseError> {
        if self.get_url(name)?.is_some() {
            return Ok(());
        }
        self.add(name, url)
    }
}

impl UrlResolver for UrlStore {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get_url(name).unwrap_or_else(|e| {
            tracing::error!("Failed to look up URL preset {}: {}", name, e);
            None
        })
    }

    fn active_url(&self) -> Option<String> {
        UrlStore::active_url(self)
            .map_err(|e| tracing::error!("Failed to read active URL preset: {}", e))
            .ok()
    }
}

fn list_names(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT name FROM urls ORDER BY id ASC")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

fn get_url(conn: &Connection, name: &str) -> Result<Option<String>, DatabaseError> {
    let url = conn
        .query_row("SELECT url FROM urls WHERE name = ?1", params![name], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(url)
}

fn get_active_setting(conn: &Connection) -> Result<Option<String>, DatabaseError> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![ACTIVE_URL_KEY],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn set_active_setting(conn: &Connection, name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![ACTIVE_URL_KEY, name],
    )?;
    Ok(())
}
