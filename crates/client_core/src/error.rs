use reqwest::{Method, StatusCode};
use shared::error::ApiException;
use thiserror::Error;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("{method} {url} failed: {source}")]
    Network {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        #[source]
        detail: ApiException,
    },
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no form dialog is open")]
    DialogClosed,
}

impl ClientError {
    /// Status code for non-2xx responses, if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

/// Form problems detected before any request is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field '{field}' is required")]
    MissingField { field: &'static str },
    #[error("field '{field}' expects a number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field '{field}' expects a date as yyyy-mm-dd, got '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("field '{field}' must be one of {allowed:?}, got '{value}'")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
    #[error("field '{field}' expects true or false, got '{value}'")]
    InvalidFlag { field: &'static str, value: String },
    #[error("unknown field '{field}'")]
    UnknownField { field: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::InvalidNumber { field, .. }
            | ValidationError::InvalidDate { field, .. }
            | ValidationError::InvalidChoice { field, .. }
            | ValidationError::InvalidFlag { field, .. } => field,
            ValidationError::UnknownField { field } => field,
        }
    }
}
