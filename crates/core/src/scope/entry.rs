use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::scope::identity::DependencyIdentity;

type InstanceSlot = Arc<OnceLock<Arc<dyn Any + Send + Sync>>>;

/// Identity-to-instance table owned by exactly one context handle.
///
/// Created lazily on first access (or pre-created by `start_scope`) and
/// dropped as a whole when the handle is released. The slot map lock is held
/// only long enough to get or insert a slot; construction runs outside it,
/// so a factory may resolve further dependencies of the same scope without
/// deadlocking. The slot itself serializes first construction: concurrent
/// callers for one identity all observe the single instance the winner
/// built.
pub struct ScopeEntry {
    slots: Mutex<HashMap<DependencyIdentity, InstanceSlot>>,
}

impl ScopeEntry {
    /// Create an empty entry
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cached instance for `identity`, constructing it via `factory`
    /// if this is the first request.
    ///
    /// The factory runs at most once per identity for the lifetime of the
    /// entry.
    pub fn get_or_create<T, F>(&self, identity: DependencyIdentity, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let type_name = identity.type_name();
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(identity).or_default().clone()
        };

        let instance = slot
            .get_or_init(|| Arc::new(factory()) as Arc<dyn Any + Send + Sync>)
            .clone();

        // The typed accessors derive the identity from T, so a slot can only
        // ever hold a T for that identity.
        instance
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("scope slot for {} holds a different type", type_name))
    }

    /// Check if an instance is cached for `identity`
    pub fn contains(&self, identity: &DependencyIdentity) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of constructed instances in this entry
    pub fn instance_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }
}

impl Default for ScopeEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScopeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeEntry")
            .field("instance_count", &self.instance_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_repeated_lookup_returns_identical_instance() {
        let entry = ScopeEntry::new();
        let calls = AtomicUsize::new(0);

        let first: Arc<String> = entry.get_or_create(DependencyIdentity::of::<String>(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            "navigator".to_string()
        });
        let second: Arc<String> = entry.get_or_create(DependencyIdentity::of::<String>(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            "navigator".to_string()
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_qualified_identities_cache_separately() {
        let entry = ScopeEntry::new();

        let left: Arc<String> = entry.get_or_create(
            DependencyIdentity::qualified::<String>("left"),
            || "left panel".to_string(),
        );
        let right: Arc<String> = entry.get_or_create(
            DependencyIdentity::qualified::<String>("right"),
            || "right panel".to_string(),
        );

        assert!(!Arc::ptr_eq(&left, &right));
        assert_eq!(entry.instance_count(), 2);
    }

    #[test]
    fn test_contains_reflects_constructed_instances_only() {
        let entry = ScopeEntry::new();
        let identity = DependencyIdentity::of::<u32>();

        assert!(!entry.contains(&identity));
        let _value: Arc<u32> = entry.get_or_create(identity.clone(), || 7);
        assert!(entry.contains(&identity));
    }

    #[test]
    fn test_factory_may_reenter_for_other_identities() {
        let entry = ScopeEntry::new();

        let composed: Arc<String> = entry.get_or_create(DependencyIdentity::of::<String>(), || {
            let inner: Arc<u32> = entry.get_or_create(DependencyIdentity::of::<u32>(), || 9);
            format!("depends on {}", inner)
        });

        assert_eq!(&*composed, "depends on 9");
        assert_eq!(entry.instance_count(), 2);
    }
}
