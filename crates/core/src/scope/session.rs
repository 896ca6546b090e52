use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::scope::entry::ScopeEntry;
use crate::scope::identity::DependencyIdentity;

/// Identity of one established user session.
///
/// Unlike a window key this is no surrogate: the session exists before any
/// session-scoped dependency can be requested, so the handle is simply
/// carried by the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mint a fresh session id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Cache of session-scoped singletons, one entry per session.
///
/// Same shape and locking discipline as the window scope, but the handle is
/// passed explicitly on every call: there is no construction-order problem
/// for sessions and therefore no registry fallback and no failure path in
/// `get`. Constructed once at process start and shared by reference; there
/// is deliberately no lazily-initialized global accessor.
pub struct SessionScope {
    entries: RwLock<HashMap<SessionId, Arc<ScopeEntry>>>,
}

impl SessionScope {
    /// Create an empty session scope
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the session-scoped instance of `T`, constructing it on first
    /// access for this session.
    pub fn get<T, F>(&self, session: SessionId, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.get_identified(session, DependencyIdentity::of::<T>(), factory)
    }

    /// Get the session-scoped instance of `T` under a qualifier
    pub fn get_qualified<T, F>(&self, session: SessionId, qualifier: &str, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.get_identified(session, DependencyIdentity::qualified::<T>(qualifier), factory)
    }

    pub(crate) fn get_identified<T, F>(
        &self,
        session: SessionId,
        identity: DependencyIdentity,
        factory: F,
    ) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.entry_for(session).get_or_create(identity, factory)
    }

    fn entry_for(&self, session: SessionId) -> Arc<ScopeEntry> {
        if let Some(entry) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&session)
        {
            return entry.clone();
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(session)
            .or_insert_with(|| {
                tracing::debug!(%session, "creating session scope entry");
                Arc::new(ScopeEntry::new())
            })
            .clone()
    }

    /// Pre-create an empty entry for `session`
    pub fn start_scope(&self, session: SessionId) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(session).or_insert_with(|| {
            tracing::debug!(%session, "session scope started");
            Arc::new(ScopeEntry::new())
        });
    }

    /// Check if an entry exists for `session`
    pub fn has_entry_for(&self, session: SessionId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&session)
    }

    /// Drop the entry for `session`. Releasing an unknown session is a
    /// no-op; the return value reports whether an entry was removed.
    pub fn release(&self, session: SessionId) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&session)
            .is_some();

        if removed {
            tracing::debug!(%session, "session scope released");
        } else {
            tracing::debug!(%session, "release for unknown session ignored");
        }
        removed
    }

    /// Drop every entry
    pub fn flush(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(entries = dropped, "session scope flushed");
    }

    /// Number of live entries
    pub fn entry_count(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of constructed instances cached for `session`, zero if no
    /// entry exists
    pub fn instance_count_for(&self, session: SessionId) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&session)
            .map_or(0, |entry| entry.instance_count())
    }

    /// Total constructed instances across all entries
    pub fn instance_count(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|entry| entry.instance_count())
            .sum()
    }
}

impl Default for SessionScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionScope")
            .field("entry_count", &self.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_idempotence_within_a_session() {
        let scope = SessionScope::new();
        let session = SessionId::new();
        let calls = AtomicUsize::new(0);

        let first: Arc<String> = scope.get(session, || {
            calls.fetch_add(1, Ordering::SeqCst);
            "preferences".to_string()
        });
        let second: Arc<String> = scope.get(session, || {
            calls.fetch_add(1, Ordering::SeqCst);
            "preferences".to_string()
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_isolation_across_sessions() {
        let scope = SessionScope::new();
        let alice = SessionId::new();
        let bob = SessionId::new();

        let for_alice: Arc<String> = scope.get(alice, || "basket".to_string());
        let for_bob: Arc<String> = scope.get(bob, || "basket".to_string());

        assert!(!Arc::ptr_eq(&for_alice, &for_bob));
    }

    #[test]
    fn test_release_then_get_constructs_fresh_instance() {
        let scope = SessionScope::new();
        let session = SessionId::new();

        let before: Arc<u32> = scope.get(session, || 1);
        assert!(scope.release(session));
        assert!(!scope.release(session));

        let after: Arc<u32> = scope.get(session, || 2);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_start_scope_and_counts() {
        let scope = SessionScope::new();
        let session = SessionId::new();

        scope.start_scope(session);
        assert!(scope.has_entry_for(session));
        assert_eq!(scope.instance_count_for(session), 0);

        let _prefs: Arc<String> = scope.get(session, || "prefs".to_string());
        assert_eq!(scope.instance_count_for(session), 1);

        scope.flush();
        assert_eq!(scope.entry_count(), 0);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
