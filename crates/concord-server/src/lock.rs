use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Advisory per-key async locks for the push-pull critical section.
///
/// The registry itself is guarded by a short synchronous lock; the returned
/// handle is awaited outside it and may be held across storage awaits.
#[derive(Default)]
pub(crate) struct KeyLocker {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
