use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

/// What the next message from a user is expected to be.
///
/// At most one expectation is live at a time; setting one replaces the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pending {
    #[default]
    Idle,
    /// Next non-command text becomes the name of a nominee in this nomination.
    AwaitingNomineeName(i64),
    /// Next photo or video is attached to this nominee.
    AwaitingMedia(i64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    /// Room the user last joined with a valid password. Never cleared.
    pub active_room: Option<i64>,
    pub pending: Pending,
}

impl Session {
    pub fn awaiting_media(&self) -> Option<i64> {
        match self.pending {
            Pending::AwaitingMedia(nominee_id) => Some(nominee_id),
            _ => None,
        }
    }

    pub fn awaiting_nominee_name(&self) -> Option<i64> {
        match self.pending {
            Pending::AwaitingNomineeName(nomination_id) => Some(nomination_id),
            _ => None,
        }
    }
}

/// In-memory, per-user interaction state. Built once at start-up and shared
/// by handle; one mutex covers the whole map.
pub struct SessionStore {
    inner: Mutex<LruCache<i64, Session>>,
}

impl SessionStore {
    /// Unbounded store: one entry per user ever seen.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Keeps at most `capacity` users, dropping the least recently active one
    /// when a new user arrives.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Snapshot of the user's session, creating an idle one on first access.
    pub fn get(&self, user_id: i64) -> Session {
        *self.lock().get_or_insert_mut(user_id, Session::default)
    }

    /// Mutates the user's session under the store lock.
    pub fn update<R>(&self, user_id: i64, f: impl FnOnce(&mut Session) -> R) -> R {
        f(self.lock().get_or_insert_mut(user_id, Session::default))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<i64, Session>> {
        // Sessions are plain data; a panic elsewhere can't leave them half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
