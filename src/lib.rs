use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod activity;
pub mod cache;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod export;
pub mod list;
pub mod notify;
pub mod remote;
pub mod search;
pub mod session;
pub mod settings;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use activity::{Activity, ActivityGuard};
pub use cache::LocalCache;
pub use editor::{EditorState, NoteEditor};
pub use error::{NoteError, Result};
pub use export::export_note;
pub use list::{ListState, NoteListController};
pub use notify::{LogNotifier, Notification, NotificationKind, Notifier};
pub use remote::{HttpNoteService, NoteService};
pub use search::{matches, similarity, SearchFilter};
pub use session::{FetchOutcome, NoteSource, Session};
pub use settings::Settings;
pub use store::NotesStore;

// Full note as stored remotely and in the local cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub last_update: i64,
}

impl Note {
    /// Mints a new note with a fresh id. Both timestamps are set to `now`.
    pub fn new(title: impl Into<String>, content: impl Into<String>, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            last_update: now,
        }
    }

    pub fn field(&self, field: NoteField) -> &str {
        match field {
            NoteField::Title => &self.title,
            NoteField::Content => &self.content,
        }
    }

    pub fn set_field(&mut self, field: NoteField, value: impl Into<String>) {
        match field {
            NoteField::Title => self.title = value.into(),
            NoteField::Content => self.content = value.into(),
        }
    }
}

// Editable attribute of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteField {
    Title,
    Content,
}

impl NoteField {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteField::Title => "title",
            NoteField::Content => "content",
        }
    }
}

/// Partial note sent on update. Only the changed attribute is serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    pub id: Uuid,
    pub last_update: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NoteUpdate {
    pub fn new(id: Uuid, last_update: i64) -> Self {
        Self {
            id,
            last_update,
            title: None,
            content: None,
        }
    }

    pub fn with_field(mut self, field: NoteField, value: impl Into<String>) -> Self {
        match field {
            NoteField::Title => self.title = Some(value.into()),
            NoteField::Content => self.content = Some(value.into()),
        }
        self
    }

    /// An update must change at least one attribute.
    pub fn validate(&self) -> Result<()> {
        if self.title.is_none() && self.content.is_none() {
            return Err(NoteError::Validation(format!(
                "update for note {} carries no field",
                self.id
            )));
        }
        Ok(())
    }
}

// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
