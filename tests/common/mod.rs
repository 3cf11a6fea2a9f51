//! Shared harness: the production schema over a tempdir-backed database and
//! config directory, driven through the same string-envelope path the
//! webview uses.

use std::sync::Arc;

use libretto::books::BookStore;
use libretto::client::Client;
use libretto::schema::{build_schema, AppSchema};
use libretto::settings::SettingsStore;
use tempfile::TempDir;
use tokio_rusqlite::Connection as AsyncConn;

pub struct TestApp {
    pub client: Client,
    pub schema: AppSchema,
    pub tmp: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let db_path = tmp.path().join("library.db");
    libretto::init_database(&db_path).expect("init database");

    let db_rw = AsyncConn::open(&db_path).await.expect("open rw connection");
    let db_ro = AsyncConn::open(&db_path).await.expect("open ro connection");

    let books = Arc::new(BookStore::new(db_ro, db_rw));
    let settings = Arc::new(SettingsStore::new(
        tmp.path().join("config"),
        tmp.path().join("data"),
    ));
    let schema = build_schema(books, settings);
    let client = Client::for_schema(schema.clone());

    TestApp {
        client,
        schema,
        tmp,
    }
}
