//! The bridge contract itself: envelope shape on the wire, fail-fast
//! parsing, and the client's single error-surfacing convention.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::spawn_app;
use libretto::client::{Bridge, Client, ClientError, GRAPHQL_ERROR_FALLBACK};
use libretto::commands::execute_request;
use libretto::envelope::QueryRequest;
use serde_json::{json, Value};

/// Bridge that rejects every call, simulating a transport failure.
struct FailingBridge;

#[async_trait]
impl Bridge for FailingBridge {
    async fn call(&self, _request: String) -> Result<String, String> {
        Err("bridge unavailable".into())
    }
}

/// Bridge that answers every call with a canned response body.
struct CannedBridge(&'static str);

#[async_trait]
impl Bridge for CannedBridge {
    async fn call(&self, _request: String) -> Result<String, String> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn wire_envelope_has_exactly_query_and_variables() {
    let mut variables = serde_json::Map::new();
    variables.insert("id".into(), json!(42));
    let request = QueryRequest::new("query GetBook($id: Int!) { library { book(id: $id) { id } } }")
        .with_variables(variables);

    let wire: Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
    let object = wire.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object.contains_key("query"));
    assert_eq!(object["variables"], json!({ "id": 42 }));
    assert!(!object.contains_key("operationName"));
}

#[tokio::test]
async fn malformed_request_is_rejected_by_the_command() {
    let app = spawn_app().await;

    let err = execute_request(&app.schema, "not json at all").await.unwrap_err();
    assert!(err.starts_with("Failed to parse request:"), "{err}");

    let err = execute_request(&app.schema, r#"{"query": ""}"#).await.unwrap_err();
    assert!(err.contains("empty query"), "{err}");
}

#[tokio::test]
async fn syntactically_invalid_query_surfaces_in_errors_array() {
    let app = spawn_app().await;

    // The envelope is well-formed, so the bridge accepts it; the GraphQL
    // parse failure rides in `errors`.
    let response = app
        .client
        .execute(&QueryRequest::new("query {{{"))
        .await
        .unwrap();
    assert!(!response.errors.is_empty());
    assert!(response.first_error_message().is_some());
}

#[tokio::test]
async fn operation_name_selects_the_operation() {
    let app = spawn_app().await;

    let request = QueryRequest::new(
        "query Books { library { books { id } } } \
         query General { settings { generalSettings { language } } }",
    )
    .with_operation_name("General");
    let response = app.client.execute(&request).await.unwrap();
    assert!(response.errors.is_empty());
    let language = response
        .data
        .as_ref()
        .and_then(|data| data.pointer("/settings/generalSettings/language"))
        .and_then(Value::as_str);
    assert_eq!(language, Some("ja"));
}

#[tokio::test]
async fn bridge_rejection_propagates_with_its_message() {
    let client = Client::new(Arc::new(FailingBridge));
    let err = client.list_books().await.unwrap_err();
    match err {
        ClientError::Bridge(message) => assert!(message.contains("bridge unavailable")),
        other => panic!("expected bridge error, got {other:?}"),
    }
}

#[tokio::test]
async fn graphql_error_message_comes_from_first_error() {
    let client = Client::new(Arc::new(CannedBridge(
        r#"{"data":null,"errors":[{"message":"no such book"},{"message":"second"}]}"#,
    )));
    let err = client.get_book(1).await.unwrap_err();
    match err {
        ClientError::Graphql(message) => assert_eq!(message, "no such book"),
        other => panic!("expected graphql error, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_error_messages_fall_back_to_the_fixed_string() {
    let client = Client::new(Arc::new(CannedBridge(
        r#"{"data":null,"errors":[{"message":""}]}"#,
    )));
    let err = client.list_books().await.unwrap_err();
    match err {
        ClientError::Graphql(message) => assert_eq!(message, GRAPHQL_ERROR_FALLBACK),
        other => panic!("expected graphql error, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_response_fails_at_parse_time() {
    let client = Client::new(Arc::new(CannedBridge("{nonsense")));
    let err = client.list_books().await.unwrap_err();
    assert!(matches!(err, ClientError::Envelope(_)));
}

#[tokio::test]
async fn unexpected_data_shape_is_reported_not_propagated() {
    let client = Client::new(Arc::new(CannedBridge(r#"{"data":{"wrong":{}}}"#)));
    let err = client.list_books().await.unwrap_err();
    assert!(matches!(err, ClientError::Shape(_)));
}

#[tokio::test]
async fn command_response_is_a_valid_envelope_string() {
    let app = spawn_app().await;

    let raw = execute_request(
        &app.schema,
        r#"{"query":"query { library { books { id } } }"}"#,
    )
    .await
    .unwrap();
    let response = libretto::QueryResponse::from_json(&raw).unwrap();
    assert!(response.errors.is_empty());
    assert_eq!(
        response
            .data
            .as_ref()
            .and_then(|data| data.pointer("/library/books")),
        Some(&json!([]))
    );
}
