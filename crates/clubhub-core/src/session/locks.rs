//! Per-session mutual exclusion.
//!
//! `SessionLocks` is a `DashMap` of async mutexes keyed by session id. The
//! map guard is dropped before awaiting the mutex; holding a `DashMap` `Ref`
//! across `.await` would block the shard. An entry lives only while some
//! turn holds or waits for it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = DashMap<Uuid, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    inner: Arc<LockMap>,
}

/// Exclusive hold on one session. Releasing the last hold forgets the
/// session's map entry.
#[derive(Debug)]
pub struct SessionGuard {
    session_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // Unlock first so the guard's own `Arc` no longer counts.
        drop(self.guard.take());
        // The map holds one reference; any other is a waiter that will
        // take the lock next.
        self.locks
            .remove_if(&self.session_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn holds `session_id`, then hold it until the
    /// guard is dropped. Different sessions never contend.
    pub async fn acquire(&self, session_id: Uuid) -> SessionGuard {
        let lock = self
            .inner
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        SessionGuard {
            session_id,
            guard: Some(lock.lock_owned().await),
            locks: self.inner.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
