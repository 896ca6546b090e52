use std::sync::Arc;

use crate::scope::key::{SurrogateKeyIssuer, WindowKey};
use crate::scope::registry::ContextRegistry;
use crate::scope::session::{SessionId, SessionScope};
use crate::scope::thread::ThreadScope;
use crate::scope::window::WindowScope;

/// Owns the shared scope caches and exposes the lifecycle hooks the hosting
/// environment drives.
///
/// Constructed once at process start and threaded through to every
/// consumer; the scopes have no global accessor and no lazy initialization.
pub struct ScopeLifecycleManager {
    issuer: SurrogateKeyIssuer,
    window: Arc<WindowScope>,
    session: Arc<SessionScope>,
    thread: ThreadScope,
}

impl ScopeLifecycleManager {
    /// Create the manager with empty scopes
    pub fn new() -> Self {
        Self {
            issuer: SurrogateKeyIssuer::new(),
            window: Arc::new(WindowScope::new()),
            session: Arc::new(SessionScope::new()),
            thread: ThreadScope::new(),
        }
    }

    /// Shared handle to the window scope, for wiring providers
    pub fn window_scope(&self) -> Arc<WindowScope> {
        self.window.clone()
    }

    /// Shared handle to the session scope, for wiring providers
    pub fn session_scope(&self) -> Arc<SessionScope> {
        self.session.clone()
    }

    /// The surrogate key issuer
    pub fn key_issuer(&self) -> &SurrogateKeyIssuer {
        &self.issuer
    }

    /// Called when the host is about to create a window: issues the
    /// surrogate key and pre-creates its cache entry.
    ///
    /// The host publishes the returned key through
    /// [`ContextRegistry::enter_window`] before constructing the window
    /// object, then binds the key to the constructed window.
    pub fn open_window(&self) -> WindowKey {
        let key = self.issuer.next_key();
        self.window.start_scope(key);
        tracing::info!(%key, "window scope opened");
        key
    }

    /// Called when a window is closed or detached
    pub fn close_window(&self, key: WindowKey) -> bool {
        let removed = self.window.release(key);
        if removed {
            tracing::info!(%key, "window scope closed");
        } else {
            tracing::warn!(%key, "close requested for unknown window key");
        }
        removed
    }

    /// Called by the session layer on session creation; mints the id and
    /// pre-creates the cache entry.
    pub fn start_session(&self) -> SessionId {
        let session = SessionId::new();
        self.session_started(session);
        session
    }

    /// Called by the session layer when a session created elsewhere begins
    pub fn session_started(&self, session: SessionId) {
        self.session.start_scope(session);
        tracing::info!(%session, "session scope started");
    }

    /// Called by the session layer on session destruction
    pub fn end_session(&self, session: SessionId) -> bool {
        let removed = self.session.release(session);
        if removed {
            tracing::info!(%session, "session scope ended");
        } else {
            tracing::warn!(%session, "end requested for unknown session");
        }
        removed
    }

    /// Called on a pooled worker thread between logical requests: clears
    /// the calling thread's scope cache and every handle published on it.
    pub fn recycle_worker_thread(&self) {
        self.thread.reset();
        ContextRegistry::clear_all();
    }

    /// Full reset of the shared caches, plus the calling thread's cache.
    ///
    /// Other threads' caches are cleared at their own recycle points. Meant
    /// for test teardown and host shutdown.
    pub fn flush_all(&self) {
        self.window.flush();
        self.session.flush();
        self.thread.reset();
        tracing::info!("all scope caches flushed");
    }

    /// Snapshot of live handles and cached instances
    pub fn statistics(&self) -> ScopeStatistics {
        ScopeStatistics {
            active_windows: self.window.entry_count(),
            active_sessions: self.session.entry_count(),
            window_instances: self.window.instance_count(),
            session_instances: self.session.instance_count(),
            keys_issued: self.issuer.issued(),
        }
    }
}

impl Default for ScopeLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScopeLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.statistics();
        f.debug_struct("ScopeLifecycleManager")
            .field("active_windows", &stats.active_windows)
            .field("active_sessions", &stats.active_sessions)
            .field("keys_issued", &stats.keys_issued)
            .finish()
    }
}

/// Scope cache counters for monitoring and debugging
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScopeStatistics {
    pub active_windows: usize,
    pub active_sessions: usize,
    pub window_instances: usize,
    pub session_instances: usize,
    pub keys_issued: u64,
}
