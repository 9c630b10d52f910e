use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

struct Scheduled {
    fire: Arc<Notify>,
    handle: JoinHandle<()>,
}

/// At most one pending task per key. Scheduling again for a key cancels the
/// previous timer; work that has already started runs to completion.
///
/// Dropping the debouncer cancels every pending timer.
pub struct Debouncer<K> {
    quiet: Duration,
    tasks: HashMap<K, Scheduled>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + std::fmt::Debug,
{
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            tasks: HashMap::new(),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Runs `work` once `key` has been quiet for the full period.
    pub fn schedule<F>(&mut self, key: K, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.tasks.remove(&key) {
            previous.handle.abort();
        }

        debug!(?key, quiet_ms = self.quiet.as_millis() as u64, "debounce scheduled");

        let fire = Arc::new(Notify::new());
        let quiet = self.quiet;
        let signal = Arc::clone(&fire);
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = sleep(quiet) => {}
                _ = signal.notified() => {}
            }
            // Run the work on its own task so a later abort of this timer
            // cannot cut an in-flight call short.
            let _ = tokio::spawn(work).await;
        });

        // Drop finished entries so the map only tracks live keys
        self.tasks.retain(|_, scheduled| !scheduled.handle.is_finished());
        self.tasks.insert(key, Scheduled { fire, handle });
    }

    /// Number of scheduled tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.tasks
            .values()
            .filter(|scheduled| !scheduled.handle.is_finished())
            .count()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.tasks
            .get(key)
            .is_some_and(|scheduled| !scheduled.handle.is_finished())
    }

    /// Fires every pending task now and waits for all of them.
    pub async fn flush(&mut self) {
        let tasks: Vec<Scheduled> = self.tasks.drain().map(|(_, scheduled)| scheduled).collect();
        for scheduled in &tasks {
            scheduled.fire.notify_one();
        }
        for scheduled in tasks {
            let _ = scheduled.handle.await;
        }
    }

    pub fn cancel_all(&mut self) {
        for (key, scheduled) in self.tasks.drain() {
            if !scheduled.handle.is_finished() {
                debug!(?key, "debounce cancelled");
            }
            scheduled.handle.abort();
        }
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for (_, scheduled) in self.tasks.drain() {
            scheduled.handle.abort();
        }
    }
}
