use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::scope::identity::DependencyIdentity;

thread_local! {
    static THREAD_CACHE: RefCell<HashMap<DependencyIdentity, Arc<dyn Any + Send + Sync>>> =
        RefCell::new(HashMap::new());
}

/// Accessor for the calling thread's private scope cache.
///
/// The cache lives in thread-local storage and is created lazily on first
/// use in each thread, so no locking is needed and instances never cross
/// threads. In pooled-worker environments the host must call [`reset`] at
/// the boundary between logical requests, or a recycled worker leaks the
/// previous request's instances into the next one.
///
/// [`reset`]: ThreadScope::reset
#[derive(Debug, Default)]
pub struct ThreadScope;

impl ThreadScope {
    /// Create an accessor; all accessors on one thread address the same
    /// cache
    pub fn new() -> Self {
        Self
    }

    /// Get the thread-scoped instance of `T`, constructing it on first
    /// access in the calling thread.
    pub fn get<T, F>(&self, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.get_identified(DependencyIdentity::of::<T>(), factory)
    }

    /// Get the thread-scoped instance of `T` under a qualifier
    pub fn get_qualified<T, F>(&self, qualifier: &str, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.get_identified(DependencyIdentity::qualified::<T>(qualifier), factory)
    }

    pub(crate) fn get_identified<T, F>(&self, identity: DependencyIdentity, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let type_name = identity.type_name();

        let existing = THREAD_CACHE.with(|cache| cache.borrow().get(&identity).cloned());
        let instance = match existing {
            Some(instance) => instance,
            None => {
                // The factory runs with no borrow held, so it may resolve
                // further thread-scoped dependencies; or_insert keeps the
                // first insertion if it did so for this same identity.
                let created: Arc<dyn Any + Send + Sync> = Arc::new(factory());
                THREAD_CACHE.with(|cache| {
                    cache
                        .borrow_mut()
                        .entry(identity)
                        .or_insert(created)
                        .clone()
                })
            }
        };

        instance
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("thread scope slot for {} holds a different type", type_name))
    }

    /// Clear the calling thread's cache.
    ///
    /// Other threads' caches are untouched.
    pub fn reset(&self) {
        THREAD_CACHE.with(|cache| {
            let mut cache = cache.borrow_mut();
            let dropped = cache.len();
            cache.clear();
            tracing::debug!(instances = dropped, "thread scope reset");
        });
    }

    /// Number of instances cached for the calling thread
    pub fn instance_count(&self) -> usize {
        THREAD_CACHE.with(|cache| cache.borrow().len())
    }
}
