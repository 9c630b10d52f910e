use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::activity::Activity;
use crate::export::export_note;
use crate::notify::Notification;
use crate::remote::NoteService;
use crate::session::Session;
use crate::{now_millis, Note, NoteError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Loading,
    Loaded(Vec<Note>),
    LoadedEmpty,
    /// The remote fetch failed. `fallback` holds the cached notes on display.
    Error {
        message: String,
        fallback: Vec<Note>,
    },
}

impl ListState {
    pub fn items(&self) -> &[Note] {
        match self {
            ListState::Loaded(notes) => notes,
            ListState::Error { fallback, .. } => fallback,
            ListState::Loading | ListState::LoadedEmpty => &[],
        }
    }
}

/// Drives the notes overview: loading, creating and deleting notes, and
/// the order and filter notes are shown in.
///
/// The visible list only changes after a server round trip. Nothing is
/// inserted or removed locally ahead of the server.
pub struct NoteListController<S> {
    session: Session<S>,
    state: ListState,
    add_disabled: bool,
    activity: Activity,
}

impl<S: NoteService> NoteListController<S> {
    pub fn new(session: Session<S>) -> Self {
        Self {
            session,
            state: ListState::Loading,
            add_disabled: false,
            activity: Activity::new(),
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn items(&self) -> &[Note] {
        self.state.items()
    }

    /// Whether the add affordance is offered. A network failure on create
    /// hides it until the next successful load.
    pub fn can_add(&self) -> bool {
        !self.add_disabled
    }

    pub fn is_busy(&self) -> bool {
        self.activity.is_active()
    }

    pub fn activity(&self) -> Activity {
        self.activity.clone()
    }

    /// Fetches the list. Stays `Loading` until a user is signed in.
    pub async fn load(&mut self) -> &ListState {
        let _busy = self.activity.begin();

        let Some(outcome) = self.session.fetch_notes().await else {
            self.state = ListState::Loading;
            return &self.state;
        };

        debug!(source = ?outcome.source, count = outcome.notes.len(), "notes loaded");
        self.state = match outcome.error {
            Some(e) => {
                self.session.notify(Notification::error(e.to_string()));
                ListState::Error {
                    message: e.to_string(),
                    fallback: outcome.notes,
                }
            }
            None => {
                self.add_disabled = false;
                if outcome.notes.is_empty() {
                    ListState::LoadedEmpty
                } else {
                    ListState::Loaded(outcome.notes)
                }
            }
        };
        &self.state
    }

    /// Notes sorted newest first, then filtered by `query`.
    pub fn visible(&self, query: &str) -> Vec<Note> {
        let mut notes = self.items().to_vec();
        // sort_by is stable, ties keep their fetched order
        notes.sort_by(|a, b| b.last_update.cmp(&a.last_update));
        self.session.search_filter().apply(notes, query)
    }

    /// Creates a note with the default title and content. Returns it once
    /// the server accepted it; the list itself is refreshed by refetching.
    pub async fn add_note(&mut self) -> Option<Note> {
        let messages = &self.session.settings().messages;
        let note = Note::new(
            messages.default_title.clone(),
            messages.default_content.clone(),
            now_millis(),
        );

        let result = {
            let _busy = self.activity.begin();
            self.session.service().create(&note).await
        };

        match result {
            Ok(()) => {
                info!(id = %note.id, "note created");
                let created = self.session.settings().messages.created.clone();
                self.session.notify(Notification::success(created));
                self.load().await;
                Some(note)
            }
            Err(e) => {
                error!(id = %note.id, error = %e, "failed to create note");
                if e.is_network() {
                    self.add_disabled = true;
                }
                self.session.notify(Notification::error(e.to_string()));
                None
            }
        }
    }

    /// Deletes a note. Returns whether the server accepted the delete.
    pub async fn remove_note(&mut self, id: Uuid) -> bool {
        let result = {
            let _busy = self.activity.begin();
            self.session.service().remove(id).await
        };

        match result {
            Ok(()) => {
                info!(%id, "note deleted");
                let deleted = self.session.settings().messages.deleted.clone();
                self.session.notify(Notification::success(deleted));
                self.load().await;
                true
            }
            Err(e) => {
                error!(%id, error = %e, "failed to delete note");
                self.session.notify(Notification::error(e.to_string()));
                false
            }
        }
    }

    /// Downloads a loaded note as a markdown file into `dir`.
    pub async fn export(&self, id: Uuid, dir: &Path) -> Result<PathBuf> {
        let note = self.session.notes().get(id).ok_or(NoteError::NotFound(id))?;
        let path = export_note(&note, dir).await?;
        info!(%id, path = %path.display(), "note exported");
        Ok(path)
    }
}
