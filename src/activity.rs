use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts operations in flight. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct Activity {
    count: Arc<AtomicUsize>,
}

/// RAII guard that counts as in flight from creation until drop
#[derive(Debug)]
pub struct ActivityGuard {
    count: Arc<AtomicUsize>,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> ActivityGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        ActivityGuard {
            count: Arc::clone(&self.count),
        }
    }

    pub fn is_active(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_tracks_nested_operations() {
        let activity = Activity::new();
        assert!(!activity.is_active());

        let first = activity.begin();
        let second = activity.clone().begin();
        assert_eq!(activity.in_flight(), 2);

        drop(first);
        assert!(activity.is_active());
        drop(second);
        assert!(!activity.is_active());
    }
}
