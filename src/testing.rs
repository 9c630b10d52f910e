use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::cache::LocalCache;
use crate::remote::NoteService;
use crate::session::Session;
use crate::settings::Settings;
use crate::{Note, NoteError, NoteUpdate, Notification, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    Network,
    Rejected,
}

impl Failure {
    fn into_error(self) -> NoteError {
        match self {
            Failure::Network => NoteError::Network(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Failure::Rejected => NoteError::rejected("server said no"),
        }
    }
}

/// In-memory note service that records every call.
#[derive(Debug, Default)]
pub(crate) struct FakeNoteService {
    pub notes: Mutex<Vec<Note>>,
    pub omit_items: Mutex<bool>,
    pub list_failure: Mutex<Option<Failure>>,
    pub create_failure: Mutex<Option<Failure>>,
    pub update_failure: Mutex<Option<Failure>>,
    pub remove_failure: Mutex<Option<Failure>>,
    pub list_calls: AtomicUsize,
    pub created: Mutex<Vec<Note>>,
    pub updates: Mutex<Vec<NoteUpdate>>,
    pub removed: Mutex<Vec<Uuid>>,
    // While set, every call waits here until the gate opens
    gate: Mutex<Option<Arc<Notify>>>,
    held: AtomicUsize,
}

impl FakeNoteService {
    pub fn with_notes(notes: Vec<Note>) -> Self {
        let service = Self::default();
        *service.notes.lock().unwrap() = notes;
        service
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> Vec<NoteUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// Holds every following call open until `open_gate`.
    pub fn close_gate(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn open_gate(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_waiters();
        }
    }

    /// Yields until `count` calls are waiting at the gate.
    pub async fn wait_until_held(&self, count: usize) {
        while self.held.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let opened = gate.notified();
            tokio::pin!(opened);
            opened.as_mut().enable();
            self.held.fetch_add(1, Ordering::SeqCst);
            opened.await;
            self.held.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl NoteService for FakeNoteService {
    async fn list(&self, _user_id: &str) -> Result<Option<Vec<Note>>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        if let Some(failure) = *self.list_failure.lock().unwrap() {
            return Err(failure.into_error());
        }
        if *self.omit_items.lock().unwrap() {
            return Ok(None);
        }
        Ok(Some(self.notes.lock().unwrap().clone()))
    }

    async fn create(&self, note: &Note) -> Result<()> {
        self.pass_gate().await;
        if let Some(failure) = *self.create_failure.lock().unwrap() {
            return Err(failure.into_error());
        }
        self.created.lock().unwrap().push(note.clone());
        self.notes.lock().unwrap().push(note.clone());
        Ok(())
    }

    async fn update(&self, update: &NoteUpdate) -> Result<()> {
        self.pass_gate().await;
        self.updates.lock().unwrap().push(update.clone());
        if let Some(failure) = *self.update_failure.lock().unwrap() {
            return Err(failure.into_error());
        }
        let mut notes = self.notes.lock().unwrap();
        if let Some(note) = notes.iter_mut().find(|n| n.id == update.id) {
            note.last_update = update.last_update;
            if let Some(title) = &update.title {
                note.title = title.clone();
            }
            if let Some(content) = &update.content {
                note.content = content.clone();
            }
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        self.pass_gate().await;
        if let Some(failure) = *self.remove_failure.lock().unwrap() {
            return Err(failure.into_error());
        }
        self.removed.lock().unwrap().push(id);
        self.notes.lock().unwrap().retain(|n| n.id != id);
        Ok(())
    }
}

pub(crate) struct Harness {
    pub session: Session<FakeNoteService>,
    pub service: Arc<FakeNoteService>,
    pub notifications: UnboundedReceiver<Notification>,
    pub _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(service: FakeNoteService) -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings {
            cache_dir: Some(dir.path().to_path_buf()),
            user_id: Some("user-1".to_string()),
            ..Settings::default()
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Arc::new(service);
        let session = Session::from_parts(
            settings,
            Arc::clone(&service),
            LocalCache::new(dir.path()),
            tx,
        );

        Self {
            session,
            service,
            notifications: rx,
            _dir: dir,
        }
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }
}
