//! GraphQL request/response envelopes exchanged over the bridge.
//!
//! The webview serializes a `{query, variables, operationName}` object to a
//! JSON string and hands it to the `graphql_request` command; the command
//! answers with a JSON-encoded `{data, errors}` envelope. Both shapes are
//! modeled here explicitly so malformed payloads fail at the boundary
//! instead of leaking loosely-typed JSON into the rest of the app.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed request envelope: {0}")]
    MalformedRequest(serde_json::Error),
    #[error("request envelope has an empty query document")]
    EmptyQuery,
    #[error("malformed response envelope: {0}")]
    MalformedResponse(serde_json::Error),
}

/// Request side of the bridge contract.
///
/// Serialization omits `variables` and `operationName` entirely when absent,
/// so the wire form of a bare query is exactly `{"query": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Parse an incoming envelope, rejecting payloads without a usable query
    /// document.
    pub fn from_json(raw: &str) -> Result<Self, EnvelopeError> {
        let request: Self = serde_json::from_str(raw).map_err(EnvelopeError::MalformedRequest)?;
        if request.query.trim().is_empty() {
            return Err(EnvelopeError::EmptyQuery);
        }
        Ok(request)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<QueryRequest> for async_graphql::Request {
    fn from(envelope: QueryRequest) -> Self {
        let mut request = async_graphql::Request::new(envelope.query);
        if let Some(variables) = envelope.variables {
            request = request.variables(async_graphql::Variables::from_json(Value::Object(
                variables,
            )));
        }
        if let Some(name) = envelope.operation_name {
            request = request.operation_name(name);
        }
        request
    }
}

/// Response side of the bridge contract. `data` and `errors` may both be
/// present under partial-failure policies; callers must check both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,
}

impl QueryResponse {
    pub fn from_json(raw: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(raw).map_err(EnvelopeError::MalformedResponse)
    }

    /// First non-empty error message, if any.
    pub fn first_error_message(&self) -> Option<&str> {
        self.errors
            .iter()
            .map(|err| err.message.as_str())
            .find(|message| !message.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<ErrorLocation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: u32,
    pub column: u32,
}
