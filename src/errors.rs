//! Typed error hierarchy for the taskboard client.
//!
//! Top-level enums per layer:
//! - `GatewayError`: REST calls to the board API
//! - `ReorderError`: drag-and-drop engine precondition failures
//! - `ValidationError`: user input rejected before any network call
//! - `StoreError`: store actions, wrapping the three above
//! - `ConfigError`: startup configuration problems

use thiserror::Error;

/// Errors from the REST gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Session expired, sign in again")]
    SessionExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl GatewayError {
    /// The message shown to the user and recorded in the store slice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Rejected(message) | Self::NotFound(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Precondition failures in the reorder engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("Column {id} is not on this board")]
    UnknownColumn { id: String },

    #[error("Task {id} is not on this board")]
    UnknownTask { id: String },

    #[error("Task {task_id} is not in column {column_id}")]
    TaskNotInSource { task_id: String, column_id: String },

    #[error("Target index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Input rejected by validation before reaching the API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors from store actions.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Reorder(#[from] ReorderError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("No board is loaded")]
    NoActiveBoard,

    #[error("Board {requested} is not the active board")]
    BoardMismatch { requested: String },
}

impl StoreError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Gateway(GatewayError::SessionExpired))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Gateway(GatewayError::NotFound(_)))
    }

    /// Message recorded in the store slice after a rollback.
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Errors while resolving configuration. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API base URL is not set (use --api-url, TASKBOARD_API_URL or api_url in {path})")]
    MissingApiUrl { path: String },

    #[error("Invalid API base URL '{url}': {message}")]
    InvalidApiUrl { url: String, message: String },

    #[error("Failed to read config file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
