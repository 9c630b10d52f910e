use std::sync::RwLock;

use tokio::sync::watch;
use uuid::Uuid;

use crate::Note;

/// Session-wide notes collection shared by every controller.
///
/// All mutation goes through `replace_all`, `patch_one` and `clear`. Each one
/// bumps the version and publishes it to subscribers.
#[derive(Debug)]
pub struct NotesStore {
    state: RwLock<StoreState>,
    version_tx: watch::Sender<u64>,
}

#[derive(Debug, Default)]
struct StoreState {
    notes: Option<Vec<Note>>,
    version: u64,
}

impl Default for NotesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotesStore {
    pub fn new() -> Self {
        let (version_tx, _) = watch::channel(0);
        Self {
            state: RwLock::new(StoreState::default()),
            version_tx,
        }
    }

    /// Whether the collection has been populated since creation or `clear`.
    pub fn is_loaded(&self) -> bool {
        self.state.read().expect("notes store read lock").notes.is_some()
    }

    pub fn version(&self) -> u64 {
        self.state.read().expect("notes store read lock").version
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version_tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .expect("notes store read lock")
            .notes
            .as_ref()
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<Note> {
        self.state
            .read()
            .expect("notes store read lock")
            .notes
            .clone()
            .unwrap_or_default()
    }

    pub fn get(&self, id: Uuid) -> Option<Note> {
        let state = self.state.read().expect("notes store read lock");
        state.notes.as_ref()?.iter().find(|note| note.id == id).cloned()
    }

    pub fn replace_all(&self, notes: Vec<Note>) -> u64 {
        let version = {
            let mut state = self.state.write().expect("notes store write lock");
            state.notes = Some(notes);
            state.version += 1;
            state.version
        };
        self.version_tx.send_replace(version);
        version
    }

    /// Mutates one note in place. Returns the patched note, or `None` when
    /// the id is not in the collection.
    pub fn patch_one<F>(&self, id: Uuid, patch: F) -> Option<Note>
    where
        F: FnOnce(&mut Note),
    {
        let (patched, version) = {
            let mut state = self.state.write().expect("notes store write lock");
            let note = state.notes.as_mut()?.iter_mut().find(|note| note.id == id)?;
            patch(note);
            let patched = note.clone();
            state.version += 1;
            (patched, state.version)
        };
        self.version_tx.send_replace(version);
        Some(patched)
    }

    pub fn clear(&self) {
        let version = {
            let mut state = self.state.write().expect("notes store write lock");
            state.notes = None;
            state.version += 1;
            state.version
        };
        self.version_tx.send_replace(version);
    }
}
