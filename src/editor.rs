use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::activity::Activity;
use crate::debounce::Debouncer;
use crate::notify::Notification;
use crate::remote::NoteService;
use crate::session::Session;
use crate::{now_millis, Note, NoteField, NoteUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Loading,
    Ready,
}

/// Edits a single note. Keystrokes update the local copy immediately and
/// are sent to the server once the field has been quiet for the debounce
/// period.
pub struct NoteEditor<S> {
    session: Session<S>,
    note_id: Uuid,
    state: EditorState,
    buffer: Option<Note>,
    pending: Debouncer<(Uuid, NoteField)>,
    syncing: Activity,
    // Serializes outgoing updates for this note
    write_lock: Arc<Mutex<()>>,
}

impl<S: NoteService> NoteEditor<S> {
    /// Loads the note, fetching the collection first when the session has
    /// not loaded it yet. An unknown id leaves the editor without a note.
    pub async fn open(session: Session<S>, note_id: Uuid) -> Self {
        let mut editor = Self {
            pending: Debouncer::new(session.settings().debounce()),
            session,
            note_id,
            state: EditorState::Loading,
            buffer: None,
            syncing: Activity::new(),
            write_lock: Arc::new(Mutex::new(())),
        };
        editor.load().await;
        editor
    }

    async fn load(&mut self) {
        self.state = EditorState::Loading;

        if !self.session.notes().is_loaded() {
            if let Some(outcome) = self.session.fetch_notes().await {
                if let Some(e) = outcome.error {
                    error!(error = %e, "failed to load notes for editor");
                    self.session.notify(Notification::error(e.to_string()));
                }
            }
        }

        self.buffer = self.session.notes().get(self.note_id);
        if self.buffer.is_none() {
            debug!(note_id = %self.note_id, "note not found, nothing selected");
        }
        self.state = EditorState::Ready;
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn note_id(&self) -> Uuid {
        self.note_id
    }

    /// The editable copy, if the note was found.
    pub fn note(&self) -> Option<&Note> {
        self.buffer.as_ref()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.is_active()
    }

    pub fn syncing(&self) -> Activity {
        self.syncing.clone()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.pending() > 0
    }

    pub fn edit_title(&mut self, value: impl Into<String>) {
        self.edit(NoteField::Title, value.into());
    }

    pub fn edit_content(&mut self, value: impl Into<String>) {
        self.edit(NoteField::Content, value.into());
    }

    pub fn edit(&mut self, field: NoteField, value: String) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        buffer.set_field(field, value.clone());

        let task = sync_field(
            self.session.clone(),
            self.note_id,
            field,
            value,
            self.syncing.clone(),
            Arc::clone(&self.write_lock),
        );
        self.pending.schedule((self.note_id, field), task);
    }

    /// Sends pending edits now instead of waiting out the quiet period.
    pub async fn flush(&mut self) {
        self.pending.flush().await;
        if let Some(note) = self.session.notes().get(self.note_id) {
            self.buffer = Some(note);
        }
    }
}

async fn sync_field<S: NoteService>(
    session: Session<S>,
    note_id: Uuid,
    field: NoteField,
    value: String,
    syncing: Activity,
    write_lock: Arc<Mutex<()>>,
) {
    if session.notes().get(note_id).is_none() {
        debug!(%note_id, "note left the store before sync, skipping");
        return;
    }

    let _write = write_lock.lock().await;
    let _syncing = syncing.begin();

    let now = now_millis();
    let update = NoteUpdate::new(note_id, now).with_field(field, value.clone());

    match session.service().update(&update).await {
        Ok(()) => info!(%note_id, field = field.as_str(), "note synced"),
        Err(e) => {
            error!(%note_id, field = field.as_str(), error = %e, "failed to sync note");
            session.notify(Notification::error(e.to_string()));
        }
    }

    // Last write wins locally whether or not the server took it
    session.notes().patch_one(note_id, |note| {
        note.last_update = now;
        note.set_field(field, value);
    });
}
