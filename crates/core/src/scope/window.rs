use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::errors::ScopeError;
use crate::scope::entry::ScopeEntry;
use crate::scope::identity::DependencyIdentity;
use crate::scope::key::WindowKey;
use crate::scope::kind::ScopeKind;
use crate::scope::registry::ContextRegistry;

/// A window object that has, or will have, a surrogate key bound to it.
///
/// Returns `None` while the window is still under construction; during that
/// phase the key is resolvable only through the [`ContextRegistry`].
pub trait WindowOwner {
    fn window_key(&self) -> Option<WindowKey>;
}

/// Cache of window-scoped singletons, one entry per logical window.
///
/// Shared by all threads servicing all windows; get-or-create is atomic at
/// both levels, so concurrent first access for one key converges on a single
/// entry and a single instance per identity.
pub struct WindowScope {
    entries: RwLock<HashMap<WindowKey, Arc<ScopeEntry>>>,
}

impl WindowScope {
    /// Create an empty window scope
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the window key for a request made on behalf of `owner`.
    ///
    /// The owner's own bound key wins when it carries one; otherwise the key
    /// currently published in the [`ContextRegistry`] is used, which covers
    /// dependencies requested while the owner itself is still being
    /// constructed. No key from either source is a fatal wiring defect, as
    /// is an owner whose bound key disagrees with the registry.
    pub fn resolve_key(
        &self,
        owner: Option<&dyn WindowOwner>,
        identity: &DependencyIdentity,
    ) -> Result<WindowKey, ScopeError> {
        let bound = owner.and_then(WindowOwner::window_key);
        let current = ContextRegistry::current_window();

        match (bound, current) {
            (Some(bound), Some(current)) if bound != current => Err(ScopeError::desynchronized(
                identity.to_string(),
                bound,
                current,
            )),
            (Some(bound), _) => Ok(bound),
            (None, Some(current)) => Ok(current),
            (None, None) => Err(ScopeError::missing_context(
                ScopeKind::Window,
                identity.to_string(),
            )),
        }
    }

    /// Get the window-scoped instance of `T`, constructing it on first
    /// access for the resolved window.
    pub fn get<T, F>(&self, owner: Option<&dyn WindowOwner>, factory: F) -> Result<Arc<T>, ScopeError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.get_identified(owner, DependencyIdentity::of::<T>(), factory)
    }

    /// Get the window-scoped instance of `T` under a qualifier
    pub fn get_qualified<T, F>(
        &self,
        owner: Option<&dyn WindowOwner>,
        qualifier: &str,
        factory: F,
    ) -> Result<Arc<T>, ScopeError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.get_identified(owner, DependencyIdentity::qualified::<T>(qualifier), factory)
    }

    pub(crate) fn get_identified<T, F>(
        &self,
        owner: Option<&dyn WindowOwner>,
        identity: DependencyIdentity,
        factory: F,
    ) -> Result<Arc<T>, ScopeError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let key = self.resolve_key(owner, &identity)?;
        Ok(self.entry_for(key).get_or_create(identity, factory))
    }

    /// Get the window-scoped instance of `T` for a key the caller already
    /// holds. Cannot fail: resolution has already happened.
    pub fn get_with_key<T, F>(&self, key: WindowKey, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.entry_for(key).get_or_create(DependencyIdentity::of::<T>(), factory)
    }

    fn entry_for(&self, key: WindowKey) -> Arc<ScopeEntry> {
        if let Some(entry) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return entry.clone();
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(%key, "creating window scope entry");
                Arc::new(ScopeEntry::new())
            })
            .clone()
    }

    /// Pre-create an empty entry for `key`.
    ///
    /// Later lookups then need not distinguish "no entry yet" from "no
    /// instance yet".
    pub fn start_scope(&self, key: WindowKey) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(key).or_insert_with(|| {
            tracing::debug!(%key, "window scope started");
            Arc::new(ScopeEntry::new())
        });
    }

    /// Check if an entry exists for `key`
    pub fn has_entry_for(&self, key: WindowKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
    }

    /// Drop the entry for `key`, releasing every instance cached for that
    /// window. Releasing a key that was never started is a no-op; the return
    /// value reports whether an entry was actually removed.
    pub fn release(&self, key: WindowKey) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
            .is_some();

        if removed {
            tracing::debug!(%key, "window scope released");
        } else {
            tracing::debug!(%key, "release for unknown window key ignored");
        }
        removed
    }

    /// Drop every entry
    pub fn flush(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(entries = dropped, "window scope flushed");
    }

    /// Number of live entries
    pub fn entry_count(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of constructed instances cached for `key`, zero if no entry
    /// exists
    pub fn instance_count_for(&self, key: WindowKey) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
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

impl Default for WindowScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WindowScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowScope")
            .field("entry_count", &self.entry_count())
            .finish()
    }
}
