//! Libretto — a desktop personal book library.
//!
//! The webview front-end talks to this crate through a single bridge
//! command, `graphql_request`, which carries `{query, variables,
//! operationName}` / `{data, errors}` JSON envelopes. Behind the command sit
//! an async-graphql schema, a SQLite-backed book store, and a file-backed
//! settings store. Core logic lives here rather than in `main.rs` so the
//! desktop entry point and the tests share the same wiring.

pub mod books;
pub mod client;
pub mod commands;
pub mod core;
pub mod envelope;
pub mod schema;
pub mod settings;

pub use crate::core::{configure_sqlite, init_database, AppState, CONFIG_DIR, DATA_DIR, DB_PATH};
pub use envelope::{QueryRequest, QueryResponse};
pub use schema::{build_schema, AppSchema};

use tokio_rusqlite::Connection as AsyncConn;
use tracing_subscriber::EnvFilter;

/// Build and run the Tauri application.
pub fn run() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let db_path = DB_PATH.clone();

    // Initialize the schema and ensure directories exist BEFORE opening
    // resident connections.
    if let Err(err) = init_database(&db_path) {
        tracing::error!(target: "libretto", error = ?err, "failed to initialize database");
        std::process::exit(1);
    }

    // One writer, one read-only connection, configured once on startup.
    let db_rw = tauri::async_runtime::block_on(AsyncConn::open(&db_path))
        .expect("open sqlite rw connection");
    let db_ro = tauri::async_runtime::block_on(AsyncConn::open_with_flags(
        &db_path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
    ))
    .expect("open sqlite ro connection");
    tauri::async_runtime::block_on(async {
        let _ = db_rw
            .call(|conn| {
                configure_sqlite(conn).map_err(|err| tokio_rusqlite::Error::Other(err.into()))
            })
            .await;
        let _ = db_ro
            .call(|conn| {
                conn.busy_timeout(std::time::Duration::from_millis(5_000))
                    .map_err(tokio_rusqlite::Error::from)
            })
            .await;
    });

    let state = AppState::new(
        db_path,
        db_ro,
        db_rw,
        CONFIG_DIR.clone(),
        DATA_DIR.clone(),
    );
    let schema = build_schema(state.books.clone(), state.settings.clone());

    tauri::Builder::default()
        .manage(state)
        .manage(schema)
        .plugin(tauri_plugin_dialog::init())
        .setup(|_app| {
            for dir in [&*DATA_DIR, &*CONFIG_DIR] {
                if let Err(err) = std::fs::create_dir_all(dir) {
                    tracing::error!(
                        target: "libretto",
                        error = ?err,
                        dir = %dir.display(),
                        "create app dir failed"
                    );
                }
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::graphql_request,
            commands::get_db_status,
            commands::get_paths,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
