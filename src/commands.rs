//! Tauri commands: the bridge surface exposed to the webview.

use tauri::State;

use crate::core::{AppState, DATA_DIR};
use crate::envelope::QueryRequest;
use crate::schema::AppSchema;

/// Shared core of the bridge: parse the request envelope, execute it against
/// the schema, and serialize the response envelope. Transport/parse failures
/// reject; application-level GraphQL errors ride in the `errors` array of a
/// successful reply.
pub async fn execute_request(schema: &AppSchema, raw: &str) -> Result<String, String> {
    let request =
        QueryRequest::from_json(raw).map_err(|err| format!("Failed to parse request: {err}"))?;
    tracing::debug!(
        target: "libretto",
        operation = request.operation_name.as_deref().unwrap_or(""),
        "executing graphql request"
    );
    let response = schema.execute(async_graphql::Request::from(request)).await;
    serde_json::to_string(&response).map_err(|err| format!("Failed to serialize response: {err}"))
}

#[tauri::command]
pub async fn graphql_request(
    schema: State<'_, AppSchema>,
    request: String,
) -> Result<String, String> {
    execute_request(&schema, &request).await
}

/// Connectivity probe the frontend polls while the splash screen is up.
#[tauri::command]
pub async fn get_db_status(state: State<'_, AppState>) -> Result<String, String> {
    state
        .books
        .ping()
        .await
        .map(|()| "Connected".to_string())
        .map_err(|err| format!("Database unavailable: {err}"))
}

#[tauri::command]
pub async fn get_paths(state: State<'_, AppState>) -> Result<serde_json::Value, String> {
    // Return canonical string paths so downstream logic receives stable values.
    Ok(serde_json::json!({
        "dataDir": DATA_DIR.display().to_string(),
        "dbPath": state.db_path.display().to_string(),
        "settingsPath": state.settings.file_path().display().to_string(),
    }))
}
