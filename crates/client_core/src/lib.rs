use async_trait::async_trait;
use shared::domain::EntityKind;

pub mod dashboard;
pub mod draft;
pub mod endpoint;
pub mod entity;
pub mod error;
pub mod screen;

pub use dashboard::load_dashboard;
pub use draft::{DraftValue, FormDraft};
pub use endpoint::{CollectionEndpoint, HttpCollectionEndpoint};
pub use entity::{Entity, FieldKind, FieldSpec};
pub use error::{ClientError, ValidationError};
pub use screen::{
    fetch_collection, filter_records, EntityScreen, ReferenceOptions, RemoveOutcome, ScreenMode,
    SubmitOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient user-facing message (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: "Success".into(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: "Error".into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    Notification(Notification),
    CollectionReloaded { kind: EntityKind, count: usize },
    DialogOpened { kind: EntityKind, editing: Option<i64> },
    DialogClosed { kind: EntityKind },
}

/// Interactive yes/no prompt shown before destructive actions.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Accepts every prompt; used for non-interactive runs.
pub struct AutoConfirm;

#[async_trait]
impl Confirmation for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

pub struct DeclineAll;

#[async_trait]
impl Confirmation for DeclineAll {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
