//! Filesystem layout, SQLite configuration and schema, shared app state.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use chrono::Utc;
use dirs::{config_dir, data_dir};
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension};
use tokio_rusqlite::Connection as AsyncConn;

use crate::{books::BookStore, settings::SettingsStore};

pub static APP_NAME: &str = "Libretto";

pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    if let Ok(dir) = std::env::var("LIBRETTO_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let base = data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_NAME)
});

pub static CONFIG_DIR: Lazy<PathBuf> = Lazy::new(|| {
    if let Ok(dir) = std::env::var("LIBRETTO_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let base = config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_NAME)
});

pub static DB_PATH: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("library.db"));

pub fn configure_sqlite(conn: &Connection) -> anyhow::Result<()> {
    conn.busy_timeout(Duration::from_millis(5_000))
        .context("sqlite busy_timeout 5s")?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("sqlite journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("sqlite synchronous=NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("sqlite foreign_keys=ON")?;
    Ok(())
}

/// Current database schema version. Increment when making schema changes.
const SCHEMA_VERSION: i64 = 1;

pub fn init_database(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("create data dir")?;
    }
    let conn = Connection::open(db_path).context("open sqlite")?;
    configure_sqlite(&conn).context("configure sqlite init")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            component TEXT PRIMARY KEY,
            version INTEGER NOT NULL,
            applied_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS book (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT,
            description TEXT,
            published_year INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )
    .context("apply migrations")?;

    record_schema_version(&conn, "library", SCHEMA_VERSION).context("record schema version")?;
    Ok(())
}

fn record_schema_version(conn: &Connection, component: &str, version: i64) -> anyhow::Result<()> {
    let now = Utc::now().timestamp();
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (component, version, applied_at)
         VALUES (?1, ?2, ?3)",
        params![component, version, now],
    )
    .context("record schema version")?;
    Ok(())
}

pub fn schema_version(conn: &Connection, component: &str) -> anyhow::Result<Option<i64>> {
    let version = conn
        .query_row(
            "SELECT version FROM schema_version WHERE component = ?1",
            params![component],
            |row| row.get(0),
        )
        .optional()
        .context("query schema version")?;
    Ok(version)
}

/// Everything the commands need, managed by the Tauri runtime.
pub struct AppState {
    pub db_path: PathBuf,
    pub books: Arc<BookStore>,
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    pub fn new(
        db_path: PathBuf,
        db_ro: AsyncConn,
        db_rw: AsyncConn,
        config_dir: PathBuf,
        default_db_dir: PathBuf,
    ) -> Self {
        Self {
            db_path,
            books: Arc::new(BookStore::new(db_ro, db_rw)),
            settings: Arc::new(SettingsStore::new(config_dir, default_db_dir)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_book_table_and_records_version() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("library.db");
        init_database(&db_path).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let table: String = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'book'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table, "book");
        assert_eq!(schema_version(&conn, "library").unwrap(), Some(1));
    }

    #[test]
    fn init_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("library.db");
        init_database(&db_path).unwrap();
        init_database(&db_path).unwrap();
    }
}
