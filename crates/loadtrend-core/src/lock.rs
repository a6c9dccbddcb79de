//! Per-job mutual exclusion for trend refreshes.
//!
//! The lock is a set of held keys behind a single mutex. Acquisition never
//! blocks: a caller that loses the race is told so immediately and is
//! expected to report "refresh in progress" instead of waiting. State lives
//! in memory only, so a crash never leaves a key stuck.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Non-blocking, non-reentrant set of held refresh keys.
#[derive(Debug, Default)]
pub struct RefreshLock {
    held: Mutex<HashSet<String>>,
}

impl RefreshLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as held. Returns `false` if anyone already holds it.
    pub fn try_acquire(&self, key: &str) -> bool {
        let mut held = self.held.lock();
        if held.contains(key) {
            return false;
        }
        held.insert(key.to_string());
        true
    }

    /// Releases `key`. Releasing a key that is not held is a no-op.
    pub fn release(&self, key: &str) {
        self.held.lock().remove(key);
    }

    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.held.lock().contains(key)
    }

    /// Acquires `key` and returns a guard that releases it on drop.
    #[must_use]
    pub fn try_guard(self: &Arc<Self>, key: &str) -> Option<RefreshGuard> {
        self.try_acquire(key).then(|| RefreshGuard {
            lock: Arc::clone(self),
            key: key.to_string(),
        })
    }
}

/// Holds a refresh key until dropped.
#[derive(Debug)]
pub struct RefreshGuard {
    lock: Arc<RefreshLock>,
    key: String,
}

impl RefreshGuard {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.lock.release(&self.key);
    }
}
