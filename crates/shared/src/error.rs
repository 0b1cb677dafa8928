use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the backend on non-2xx responses.
///
/// The backend's default error document carries more fields (timestamp, trace)
/// that are ignored here; every field is optional because empty error bodies
/// are common.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorBody {
    /// Parses an error body leniently; anything that is not the expected JSON
    /// document is kept as the message when non-blank.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Self>(raw) {
            Ok(body) => body,
            Err(_) => {
                let trimmed = raw.trim();
                Self {
                    message: (!trimmed.is_empty()).then(|| trimmed.to_string()),
                    ..Self::default()
                }
            }
        }
    }

    /// Most specific human-readable description available.
    pub fn summary(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|message| !message.is_empty())
            .or(self.error.as_deref())
    }
}

#[derive(Debug, Error)]
#[error("{status}: {}", body.summary().unwrap_or("no details"))]
pub struct ApiException {
    pub status: u16,
    pub body: ApiErrorBody,
}

impl ApiException {
    pub fn new(status: u16, raw_body: &str) -> Self {
        Self {
            status,
            body: ApiErrorBody::parse(raw_body),
        }
    }
}
