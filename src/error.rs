use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value as JsonValue};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl Error {
    /// JSON value describing the failure, suitable for the `details` field of
    /// an error body.
    pub fn details(&self) -> JsonValue {
        match self {
            Error::Store(err) => err.details(),
            other => json!({ "message": other.to_string() }),
        }
    }
}

/// Failure talking to the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store rejected the query with status {status}")]
    Rejected { status: u16, body: JsonValue },

    #[error("unexpected row shape: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn details(&self) -> JsonValue {
        match self {
            StoreError::Transport(err) => json!({ "message": err.to_string() }),
            StoreError::Rejected { body, .. } => body.clone(),
            StoreError::Decode(msg) => json!({ "message": msg }),
        }
    }

    /// PostgREST error code (`PGRST116`, `42P01`, ...) when the store sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Rejected { body, .. } => body.get("code").and_then(JsonValue::as_str),
            _ => None,
        }
    }
}

/// Error body returned by the HTTP layer: `{ "error": ..., "details"?: ... }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<JsonValue>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            .with_details(JsonValue::String(details.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}
