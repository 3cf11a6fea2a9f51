//! Typed client for the closed operation surface.
//!
//! Each operation of the app (list/get/create/update/delete book, get/update
//! each settings group) is a fixed GraphQL document with a fixed variable
//! shape. The client serializes the request envelope, hands the JSON string
//! to a [`Bridge`], and parses the JSON string that comes back — the same
//! path the webview takes through the `graphql_request` command. A `Client`
//! is an explicitly constructed instance that gets passed down, never a
//! module-level singleton.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::books::{Book, BookDraft, BookPatch};
use crate::commands::execute_request;
use crate::envelope::{EnvelopeError, QueryRequest, QueryResponse};
use crate::schema::AppSchema;

/// Shown when the server reports an error without a usable message.
pub const GRAPHQL_ERROR_FALLBACK: &str = "GraphQL error occurred";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The bridge call itself was rejected (transport failure, unparseable
    /// request, serialization failure).
    #[error("bridge call failed: {0}")]
    Bridge(String),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    /// The response envelope carried a non-empty `errors` array.
    #[error("{0}")]
    Graphql(String),
    #[error("response data had unexpected shape: {0}")]
    Shape(String),
}

/// The mechanism by which the UI process reaches the data service: one
/// procedure taking a JSON request envelope and returning a JSON response
/// envelope.
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn call(&self, request: String) -> Result<String, String>;
}

/// In-process bridge executing against the app schema, exactly as the
/// `graphql_request` command does.
pub struct SchemaBridge {
    schema: AppSchema,
}

impl SchemaBridge {
    pub fn new(schema: AppSchema) -> Self {
        Self { schema }
    }
}

#[async_trait]
impl Bridge for SchemaBridge {
    async fn call(&self, request: String) -> Result<String, String> {
        execute_request(&self.schema, &request).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneralSettingsView {
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppearanceSettingsView {
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSettingsView {
    pub database_directory: String,
}

const BOOK_FIELDS: &str = "id title author description publishedYear";

pub struct Client {
    bridge: Arc<dyn Bridge>,
}

impl Client {
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self { bridge }
    }

    pub fn for_schema(schema: AppSchema) -> Self {
        Self::new(Arc::new(SchemaBridge::new(schema)))
    }

    /// Execute a raw envelope. Application-level GraphQL errors come back in
    /// the response's `errors` array without failing the call; the typed
    /// wrappers below convert them into [`ClientError::Graphql`].
    pub async fn execute(&self, request: &QueryRequest) -> Result<QueryResponse, ClientError> {
        let payload = request
            .to_json()
            .map_err(|err| ClientError::Bridge(err.to_string()))?;
        let raw = self.bridge.call(payload).await.map_err(ClientError::Bridge)?;
        Ok(QueryResponse::from_json(&raw)?)
    }

    async fn run<T: DeserializeOwned>(
        &self,
        request: QueryRequest,
        path: &[&str],
    ) -> Result<T, ClientError> {
        let response = self.execute(&request).await?;
        if !response.errors.is_empty() {
            let message = response
                .first_error_message()
                .unwrap_or(GRAPHQL_ERROR_FALLBACK)
                .to_string();
            return Err(ClientError::Graphql(message));
        }
        let mut node = response
            .data
            .as_ref()
            .ok_or_else(|| ClientError::Shape("missing data".into()))?;
        for key in path {
            node = node
                .get(key)
                .ok_or_else(|| ClientError::Shape(format!("missing field `{key}`")))?;
        }
        serde_json::from_value(node.clone()).map_err(|err| ClientError::Shape(err.to_string()))
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, ClientError> {
        let query =
            format!("query ListBooks {{ library {{ books {{ {BOOK_FIELDS} }} }} }}");
        self.run(QueryRequest::new(query), &["library", "books"])
            .await
    }

    pub async fn get_book(&self, id: i32) -> Result<Option<Book>, ClientError> {
        let query = format!(
            "query GetBook($id: Int!) {{ library {{ book(id: $id) {{ {BOOK_FIELDS} }} }} }}"
        );
        let mut variables = Map::new();
        variables.insert("id".into(), Value::from(id));
        self.run(
            QueryRequest::new(query).with_variables(variables),
            &["library", "book"],
        )
        .await
    }

    pub async fn create_book(&self, draft: &BookDraft) -> Result<Book, ClientError> {
        let query = format!(
            "mutation CreateBook($title: String!, $author: String, $description: String, $publishedYear: Int) \
             {{ library {{ createBook(title: $title, author: $author, description: $description, publishedYear: $publishedYear) {{ {BOOK_FIELDS} }} }} }}"
        );
        let mut variables = Map::new();
        variables.insert("title".into(), Value::from(draft.title.clone()));
        if let Some(author) = &draft.author {
            variables.insert("author".into(), Value::from(author.clone()));
        }
        if let Some(description) = &draft.description {
            variables.insert("description".into(), Value::from(description.clone()));
        }
        if let Some(year) = draft.published_year {
            variables.insert("publishedYear".into(), Value::from(year));
        }
        self.run(
            QueryRequest::new(query).with_variables(variables),
            &["library", "createBook"],
        )
        .await
    }

    /// Fields absent from the patch are omitted from the variable map, so
    /// the server leaves them unchanged.
    pub async fn update_book(&self, id: i32, patch: &BookPatch) -> Result<Book, ClientError> {
        let query = format!(
            "mutation UpdateBook($id: Int!, $title: String, $author: String, $description: String, $publishedYear: Int) \
             {{ library {{ updateBook(id: $id, title: $title, author: $author, description: $description, publishedYear: $publishedYear) {{ {BOOK_FIELDS} }} }} }}"
        );
        let mut variables = Map::new();
        variables.insert("id".into(), Value::from(id));
        if let Some(title) = &patch.title {
            variables.insert("title".into(), Value::from(title.clone()));
        }
        if let Some(author) = &patch.author {
            variables.insert("author".into(), Value::from(author.clone()));
        }
        if let Some(description) = &patch.description {
            variables.insert("description".into(), Value::from(description.clone()));
        }
        if let Some(year) = patch.published_year {
            variables.insert("publishedYear".into(), Value::from(year));
        }
        self.run(
            QueryRequest::new(query).with_variables(variables),
            &["library", "updateBook"],
        )
        .await
    }

    pub async fn delete_book(&self, id: i32) -> Result<bool, ClientError> {
        let query = "mutation DeleteBook($id: Int!) { library { deleteBook(id: $id) } }";
        let mut variables = Map::new();
        variables.insert("id".into(), Value::from(id));
        self.run(
            QueryRequest::new(query).with_variables(variables),
            &["library", "deleteBook"],
        )
        .await
    }

    pub async fn general_settings(&self) -> Result<GeneralSettingsView, ClientError> {
        let query = "query GeneralSettings { settings { generalSettings { language } } }";
        self.run(QueryRequest::new(query), &["settings", "generalSettings"])
            .await
    }

    pub async fn appearance_settings(&self) -> Result<AppearanceSettingsView, ClientError> {
        let query = "query AppearanceSettings { settings { appearanceSettings { theme } } }";
        self.run(
            QueryRequest::new(query),
            &["settings", "appearanceSettings"],
        )
        .await
    }

    pub async fn database_settings(&self) -> Result<DatabaseSettingsView, ClientError> {
        let query =
            "query DatabaseSettings { settings { databaseSettings { databaseDirectory } } }";
        self.run(QueryRequest::new(query), &["settings", "databaseSettings"])
            .await
    }

    pub async fn update_general_settings(
        &self,
        language: &str,
    ) -> Result<GeneralSettingsView, ClientError> {
        let query = "mutation UpdateGeneralSettings($language: String) \
                     { settings { updateGeneralSettings(language: $language) { language } } }";
        let mut variables = Map::new();
        variables.insert("language".into(), Value::from(language));
        self.run(
            QueryRequest::new(query).with_variables(variables),
            &["settings", "updateGeneralSettings"],
        )
        .await
    }

    pub async fn update_appearance_settings(
        &self,
        theme: &str,
    ) -> Result<AppearanceSettingsView, ClientError> {
        let query = "mutation UpdateAppearanceSettings($theme: String) \
                     { settings { updateAppearanceSettings(theme: $theme) { theme } } }";
        let mut variables = Map::new();
        variables.insert("theme".into(), Value::from(theme));
        self.run(
            QueryRequest::new(query).with_variables(variables),
            &["settings", "updateAppearanceSettings"],
        )
        .await
    }

    pub async fn update_database_settings(
        &self,
        database_directory: &str,
    ) -> Result<DatabaseSettingsView, ClientError> {
        let query = "mutation UpdateDatabaseSettings($databaseDirectory: String) \
                     { settings { updateDatabaseSettings(databaseDirectory: $databaseDirectory) { databaseDirectory } } }";
        let mut variables = Map::new();
        variables.insert("databaseDirectory".into(), Value::from(database_directory));
        self.run(
            QueryRequest::new(query).with_variables(variables),
            &["settings", "updateDatabaseSettings"],
        )
        .await
    }

    pub async fn reset_settings(&self) -> Result<bool, ClientError> {
        let query = "mutation ResetSettings { settings { resetSettings } }";
        self.run(QueryRequest::new(query), &["settings", "resetSettings"])
            .await
    }
}
