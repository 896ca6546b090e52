use std::sync::Arc;

use crate::errors::ScopeError;
use crate::scope::identity::DependencyIdentity;
use crate::scope::kind::ScopeKind;
use crate::scope::registry::ContextRegistry;
use crate::scope::session::SessionScope;
use crate::scope::thread::ThreadScope;
use crate::scope::window::WindowScope;

/// Factory producing the underlying unscoped instance
pub type UnscopedFactory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// The call surface a dependency injection container uses in place of the
/// ordinary unscoped factory.
///
/// Each implementation supplies its scope's handle-resolution rule; the
/// get-or-create control flow behind it is shared. A call may trigger
/// construction of the underlying dependency graph, exactly once per
/// (scope, handle, identity) triple.
pub trait ScopedProvider<T: Send + Sync + 'static>: Send + Sync {
    /// Resolve the active context handle and return the memoized instance
    fn get(&self) -> Result<Arc<T>, ScopeError>;

    /// The scope this provider binds instances to
    fn scope_kind(&self) -> ScopeKind;
}

/// Memoizes instances per logical window.
///
/// The handle is resolved from the owning window instance published in the
/// [`ContextRegistry`], falling back to the registry's current window key
/// while that owner is still under construction.
pub struct WindowScopedProvider<T> {
    scope: Arc<WindowScope>,
    identity: DependencyIdentity,
    factory: UnscopedFactory<T>,
}

impl<T: Send + Sync + 'static> WindowScopedProvider<T> {
    pub fn new(scope: Arc<WindowScope>, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            scope,
            identity: DependencyIdentity::of::<T>(),
            factory: Arc::new(factory),
        }
    }

    pub fn qualified(
        scope: Arc<WindowScope>,
        qualifier: impl Into<String>,
        factory: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            scope,
            identity: DependencyIdentity::qualified::<T>(qualifier),
            factory: Arc::new(factory),
        }
    }
}

impl<T: Send + Sync + 'static> ScopedProvider<T> for WindowScopedProvider<T> {
    fn get(&self) -> Result<Arc<T>, ScopeError> {
        let owner = ContextRegistry::current_owner();
        let factory = self.factory.clone();
        self.scope
            .get_identified(owner.as_deref(), self.identity.clone(), move || factory())
    }

    fn scope_kind(&self) -> ScopeKind {
        ScopeKind::Window
    }
}

/// Memoizes instances per session.
///
/// The handle is the session currently published in the
/// [`ContextRegistry`]; an unset session is a fatal wiring defect.
pub struct SessionScopedProvider<T> {
    scope: Arc<SessionScope>,
    identity: DependencyIdentity,
    factory: UnscopedFactory<T>,
}

impl<T: Send + Sync + 'static> SessionScopedProvider<T> {
    pub fn new(scope: Arc<SessionScope>, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            scope,
            identity: DependencyIdentity::of::<T>(),
            factory: Arc::new(factory),
        }
    }

    pub fn qualified(
        scope: Arc<SessionScope>,
        qualifier: impl Into<String>,
        factory: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            scope,
            identity: DependencyIdentity::qualified::<T>(qualifier),
            factory: Arc::new(factory),
        }
    }
}

impl<T: Send + Sync + 'static> ScopedProvider<T> for SessionScopedProvider<T> {
    fn get(&self) -> Result<Arc<T>, ScopeError> {
        let session = ContextRegistry::current_session().ok_or_else(|| {
            ScopeError::missing_context(ScopeKind::Session, self.identity.to_string())
        })?;
        let factory = self.factory.clone();
        Ok(self
            .scope
            .get_identified(session, self.identity.clone(), move || factory()))
    }

    fn scope_kind(&self) -> ScopeKind {
        ScopeKind::Session
    }
}

/// Memoizes instances per executing thread.
///
/// The handle is implicit; resolution cannot fail.
pub struct ThreadScopedProvider<T> {
    scope: ThreadScope,
    identity: DependencyIdentity,
    factory: UnscopedFactory<T>,
}

impl<T: Send + Sync + 'static> ThreadScopedProvider<T> {
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            scope: ThreadScope::new(),
            identity: DependencyIdentity::of::<T>(),
            factory: Arc::new(factory),
        }
    }

    pub fn qualified(
        qualifier: impl Into<String>,
        factory: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            scope: ThreadScope::new(),
            identity: DependencyIdentity::qualified::<T>(qualifier),
            factory: Arc::new(factory),
        }
    }
}

impl<T: Send + Sync + 'static> ScopedProvider<T> for ThreadScopedProvider<T> {
    fn get(&self) -> Result<Arc<T>, ScopeError> {
        let factory = self.factory.clone();
        Ok(self
            .scope
            .get_identified(self.identity.clone(), move || factory()))
    }

    fn scope_kind(&self) -> ScopeKind {
        ScopeKind::Thread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::key::SurrogateKeyIssuer;
    use crate::scope::session::SessionId;

    #[test]
    fn test_window_provider_without_context_fails() {
        let provider =
            WindowScopedProvider::new(Arc::new(WindowScope::new()), || "navigator".to_string());

        let result = provider.get();
        assert!(matches!(
            result,
            Err(ScopeError::MissingContextHandle { .. })
        ));
        assert!(provider.scope_kind().is_window());
    }

    #[test]
    fn test_window_provider_memoizes_per_current_key() {
        let scope = Arc::new(WindowScope::new());
        let issuer = SurrogateKeyIssuer::new();
        let provider = WindowScopedProvider::new(scope.clone(), || "navigator".to_string());

        let first_window = issuer.next_key();
        let second_window = issuer.next_key();

        let (a, b) = {
            let _guard = ContextRegistry::enter_window(first_window);
            (provider.get().unwrap(), provider.get().unwrap())
        };
        let c = {
            let _guard = ContextRegistry::enter_window(second_window);
            provider.get().unwrap()
        };

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_session_provider_requires_current_session() {
        let scope = Arc::new(SessionScope::new());
        let provider = SessionScopedProvider::new(scope.clone(), || 42u32);

        assert!(matches!(
            provider.get(),
            Err(ScopeError::MissingContextHandle { .. })
        ));

        let _guard = ContextRegistry::enter_session(SessionId::new());
        let first = provider.get().unwrap();
        let second = provider.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_thread_provider_cannot_fail() {
        let provider = ThreadScopedProvider::new(|| "connection".to_string());

        let first = provider.get().unwrap();
        let second = provider.get().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(provider.scope_kind().is_thread());
        ThreadScope::new().reset();
    }

    #[test]
    fn test_qualified_providers_bind_distinct_instances() {
        let scope = Arc::new(SessionScope::new());
        let primary = SessionScopedProvider::qualified(scope.clone(), "primary", || 1u32);
        let replica = SessionScopedProvider::qualified(scope, "replica", || 2u32);

        let _guard = ContextRegistry::enter_session(SessionId::new());
        assert_eq!(*primary.get().unwrap(), 1);
        assert_eq!(*replica.get().unwrap(), 2);
    }
}
