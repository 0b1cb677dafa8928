//! List/dialog state container shared by every entity screen.
//!
//! A screen owns the cached collection and the open form draft. Every mutation
//! is followed by a full reload; the cache is never patched locally, so it
//! always mirrors the last successful fetch.

use std::sync::Arc;

use futures::try_join;
use shared::protocol::{Course, Enrollment, Person};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::{
    draft::{DraftValue, FormDraft},
    endpoint::CollectionEndpoint,
    entity::Entity,
    error::{ClientError, Result},
    Confirmation, Notification, ScreenEvent,
};

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenMode {
    Idle,
    Loading,
    CreateDialog,
    EditDialog(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    Cancelled,
}

/// People and courses offered by the enrollment form selectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceOptions {
    pub people: Vec<Person>,
    pub courses: Vec<Course>,
}

pub struct EntityScreen<E: Entity> {
    endpoint: Arc<dyn CollectionEndpoint>,
    records: Vec<E>,
    loading: bool,
    dialog: Option<FormDraft>,
    events: broadcast::Sender<ScreenEvent>,
}

impl<E: Entity> EntityScreen<E> {
    /// Creates an unloaded screen; the loading flag stays set until the first
    /// [`load`](Self::load) finishes.
    pub fn new(endpoint: Arc<dyn CollectionEndpoint>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            endpoint,
            records: Vec::new(),
            loading: true,
            dialog: None,
            events,
        }
    }

    /// Creates the screen and performs the initial fetch. A failed fetch
    /// leaves the screen usable with an empty cache.
    pub async fn mount(endpoint: Arc<dyn CollectionEndpoint>) -> Self {
        let mut screen = Self::new(endpoint);
        let _ = screen.load().await;
        screen
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScreenEvent> {
        self.events.subscribe()
    }

    pub fn records(&self) -> &[E] {
        &self.records
    }

    pub fn record(&self, id: i64) -> Option<&E> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn mode(&self) -> ScreenMode {
        if self.loading {
            return ScreenMode::Loading;
        }
        match self.dialog.as_ref().map(FormDraft::editing) {
            None => ScreenMode::Idle,
            Some(None) => ScreenMode::CreateDialog,
            Some(Some(id)) => ScreenMode::EditDialog(id),
        }
    }

    pub fn draft(&self) -> Option<&FormDraft> {
        self.dialog.as_ref()
    }

    /// Updates one input of the open dialog.
    pub fn set_field(&mut self, name: &str, value: impl Into<DraftValue>) -> Result<()> {
        let draft = self.dialog.as_mut().ok_or(ClientError::DialogClosed)?;
        draft.set(name, value)?;
        Ok(())
    }

    /// Replaces the cache with the endpoint's current collection.
    ///
    /// On failure the previous cache is kept and an error notification is
    /// published.
    pub async fn load(&mut self) -> Result<usize> {
        self.loading = true;
        let result = fetch_collection::<E>(self.endpoint.as_ref()).await;
        self.loading = false;

        match result {
            Ok(records) => {
                let count = records.len();
                self.records = records;
                info!(entity = %E::KIND, count, "collection loaded");
                self.publish(ScreenEvent::CollectionReloaded {
                    kind: E::KIND,
                    count,
                });
                Ok(count)
            }
            Err(err) => {
                error!(entity = %E::KIND, error = %err, "failed to load collection");
                self.notify(Notification::error(format!(
                    "Could not load the {}.",
                    E::KIND.plural_label()
                )));
                Err(err)
            }
        }
    }

    /// Opens the dialog in create mode with a default draft, discarding any
    /// draft that was open.
    pub fn start_create(&mut self) {
        self.dialog = Some(FormDraft::for_create::<E>());
        self.publish(ScreenEvent::DialogOpened {
            kind: E::KIND,
            editing: None,
        });
    }

    pub fn start_edit(&mut self, record: &E) {
        let draft = FormDraft::for_edit(record);
        let editing = draft.editing();
        self.dialog = Some(draft);
        self.publish(ScreenEvent::DialogOpened {
            kind: E::KIND,
            editing,
        });
    }

    /// Starts editing a cached record; returns `false` when the id is unknown.
    pub fn start_edit_by_id(&mut self, id: i64) -> bool {
        let Some(record) = self.record(id).cloned() else {
            return false;
        };
        self.start_edit(&record);
        true
    }

    pub fn close_dialog(&mut self) {
        if self.dialog.take().is_some() {
            self.publish(ScreenEvent::DialogClosed { kind: E::KIND });
        }
    }

    /// Validates and sends the open draft, then reloads the collection.
    ///
    /// Validation and request failures keep the dialog open with the draft
    /// untouched.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let draft = self.dialog.as_ref().ok_or(ClientError::DialogClosed)?;
        let editing = draft.editing();
        let label = E::KIND.singular_label();

        let payload = match draft.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(entity = %E::KIND, field = err.field(), error = %err, "form rejected");
                self.notify(Notification::error(err.to_string()));
                return Err(err.into());
            }
        };

        let result = match editing {
            None => self.endpoint.create(E::KIND, &payload).await,
            Some(id) => self.endpoint.update(E::KIND, id, &payload).await,
        };
        let verb = if editing.is_some() { "update" } else { "create" };
        if let Err(err) = result {
            error!(entity = %E::KIND, id = ?editing, error = %err, "failed to {verb} record");
            self.notify(Notification::error(format!("Could not {verb} the {label}.")));
            return Err(err);
        }

        let outcome = match editing {
            None => SubmitOutcome::Created,
            Some(id) => SubmitOutcome::Updated(id),
        };
        info!(entity = %E::KIND, ?outcome, "record saved");
        self.notify(Notification::success(format!(
            "The {label} was {}.",
            if editing.is_some() { "updated" } else { "created" }
        )));
        self.close_dialog();
        let _ = self.load().await;
        Ok(outcome)
    }

    /// Deletes a record after confirmation, then reloads the collection.
    pub async fn remove(
        &mut self,
        id: i64,
        confirmation: &dyn Confirmation,
    ) -> Result<RemoveOutcome> {
        let label = E::KIND.singular_label();
        let prompt = match self.record(id) {
            Some(record) => format!("Delete the {label} '{}'?", record.display_name()),
            None => format!("Delete this {label}?"),
        };
        if !confirmation.confirm(&prompt).await {
            info!(entity = %E::KIND, id, "delete cancelled");
            return Ok(RemoveOutcome::Cancelled);
        }

        if let Err(err) = self.endpoint.delete(E::KIND, id).await {
            error!(entity = %E::KIND, id, error = %err, "failed to delete record");
            self.notify(Notification::error(format!("Could not delete the {label}.")));
            return Err(err);
        }

        info!(entity = %E::KIND, id, "record deleted");
        self.notify(Notification::success(format!("The {label} was deleted.")));
        let _ = self.load().await;
        Ok(RemoveOutcome::Removed)
    }

    pub fn filter(&self, term: &str) -> Vec<&E> {
        filter_records(&self.records, term)
    }

    fn notify(&self, notification: Notification) {
        self.publish(ScreenEvent::Notification(notification));
    }

    fn publish(&self, event: ScreenEvent) {
        let _ = self.events.send(event);
    }
}

impl EntityScreen<Course> {
    /// Flips the course's `ativo` flag on the server and reloads; returns the
    /// new flag.
    pub async fn toggle_status(&mut self, course: &Course) -> Result<bool> {
        let active = !course.active;
        let flag = active.to_string();
        if let Err(err) = self
            .endpoint
            .patch(Course::KIND, course.id.0, &["status", flag.as_str()], None)
            .await
        {
            error!(id = course.id.0, error = %err, "failed to change course status");
            self.notify(Notification::error("Could not change the course status."));
            return Err(err);
        }

        info!(id = course.id.0, active, "course status changed");
        let _ = self.load().await;
        Ok(active)
    }
}

impl EntityScreen<Enrollment> {
    /// Loads the people and courses offered by the form selectors. Failures
    /// are logged only.
    pub async fn load_reference_options(&self) -> Result<ReferenceOptions> {
        let endpoint = self.endpoint.as_ref();
        let result = try_join!(
            fetch_collection::<Person>(endpoint),
            fetch_collection::<Course>(endpoint)
        );
        match result {
            Ok((people, courses)) => Ok(ReferenceOptions { people, courses }),
            Err(err) => {
                error!(error = %err, "failed to load enrollment form options");
                Err(err)
            }
        }
    }
}

/// Reads and decodes the whole collection of `E`.
pub async fn fetch_collection<E: Entity>(endpoint: &dyn CollectionEndpoint) -> Result<Vec<E>> {
    let raw = endpoint.list(E::KIND).await?;
    serde_json::from_value(raw).map_err(|source| ClientError::Decode {
        what: format!("{} list", E::KIND),
        source,
    })
}

/// Records whose search fields contain `term`, ignoring case; an empty term
/// keeps everything. Order is preserved.
pub fn filter_records<'a, E: Entity>(records: &'a [E], term: &str) -> Vec<&'a E> {
    if term.is_empty() {
        return records.iter().collect();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| record.matches_lowercase(&needle))
        .collect()
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
