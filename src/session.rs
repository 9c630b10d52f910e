use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::cache::LocalCache;
use crate::notify::{Notification, Notifier};
use crate::remote::NoteService;
use crate::search::SearchFilter;
use crate::settings::Settings;
use crate::store::NotesStore;
use crate::{Note, NoteError};

/// Where the notes of a fetch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSource {
    Remote,
    Cache,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub notes: Vec<Note>,
    pub source: NoteSource,
    pub error: Option<NoteError>,
}

/// Account container shared by the list and editor controllers.
///
/// Clones are cheap handles onto the same state.
pub struct Session<S> {
    inner: Arc<SessionInner<S>>,
}

struct SessionInner<S> {
    settings: Settings,
    service: Arc<S>,
    cache: LocalCache,
    notes: NotesStore,
    notifier: Box<dyn Notifier>,
    user_id: RwLock<Option<String>>,
}

impl<S> Clone for Session<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: NoteService> Session<S> {
    pub fn new(settings: Settings, service: S, notifier: impl Notifier + 'static) -> Self {
        let cache = LocalCache::new(settings.resolved_cache_dir());
        Self::from_parts(settings, Arc::new(service), cache, notifier)
    }

    pub fn from_parts(
        settings: Settings,
        service: Arc<S>,
        cache: LocalCache,
        notifier: impl Notifier + 'static,
    ) -> Self {
        let user_id = settings.user_id.clone();
        Self {
            inner: Arc::new(SessionInner {
                settings,
                service,
                cache,
                notes: NotesStore::new(),
                notifier: Box::new(notifier),
                user_id: RwLock::new(user_id),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn service(&self) -> &S {
        &self.inner.service
    }

    pub fn cache(&self) -> &LocalCache {
        &self.inner.cache
    }

    pub fn notes(&self) -> &NotesStore {
        &self.inner.notes
    }

    pub fn search_filter(&self) -> SearchFilter {
        SearchFilter::new(self.inner.settings.search_threshold)
    }

    pub fn notify(&self, notification: Notification) {
        self.inner.notifier.notify(notification);
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.user_id.read().expect("session user lock").clone()
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!(%user_id, "signed in");
        *self.inner.user_id.write().expect("session user lock") = Some(user_id);
    }

    /// Forgets the user, drops the in-memory notes and removes the cached
    /// copy so the next user never sees them offline.
    pub async fn sign_out(&self) {
        let previous = self.inner.user_id.write().expect("session user lock").take();
        self.inner.notes.clear();
        if let Err(e) = self.cache().remove(&self.inner.settings.notes_key).await {
            warn!(error = %e, "failed to clear cached notes");
        }
        if let Some(user_id) = previous {
            info!(%user_id, "signed out");
        }
    }

    /// Fetches the user's notes, remote first with the local cache as
    /// fallback, and replaces the shared store with the result.
    ///
    /// Returns `None` without fetching when nobody is signed in.
    pub async fn fetch_notes(&self) -> Option<FetchOutcome> {
        let user_id = self.user_id()?;
        let key = &self.inner.settings.notes_key;

        let outcome = match self.service().list(&user_id).await {
            Ok(Some(items)) => {
                if let Err(e) = self.cache().write(key, &items).await {
                    warn!(error = %e, "failed to persist notes to cache");
                }
                FetchOutcome {
                    notes: items,
                    source: NoteSource::Remote,
                    error: None,
                }
            }
            Ok(None) => FetchOutcome {
                notes: self.cache().read(key, Vec::new()).await,
                source: NoteSource::Cache,
                error: None,
            },
            Err(e) => {
                warn!(%user_id, error = %e, "failed to fetch notes, falling back to cache");
                FetchOutcome {
                    notes: self.cache().read(key, Vec::new()).await,
                    source: NoteSource::Cache,
                    error: Some(e),
                }
            }
        };

        self.notes().replace_all(outcome.notes.clone());
        Some(outcome)
    }
}
