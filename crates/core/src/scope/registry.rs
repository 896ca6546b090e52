use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::scope::key::WindowKey;
use crate::scope::session::SessionId;
use crate::scope::window::WindowOwner;

thread_local! {
    static CURRENT_WINDOW: RefCell<Option<WindowKey>> = RefCell::new(None);
    static CURRENT_OWNER: RefCell<Option<Arc<dyn WindowOwner>>> = RefCell::new(None);
    static CURRENT_SESSION: RefCell<Option<SessionId>> = RefCell::new(None);
}

/// Thread-local registry of the "current" context handles.
///
/// The hosting environment publishes the window key it is about to construct
/// a window for, the owning window instance once one exists, and the session
/// the request belongs to. The registry is per-thread by construction and is
/// never shared between two concurrent requests.
///
/// Prefer the `enter_*` guards, which restore the previous value on drop;
/// the explicit set/clear accessors exist for host integrations that cannot
/// hold a guard across a callback boundary.
pub struct ContextRegistry;

impl ContextRegistry {
    /// Current window key for the calling thread
    pub fn current_window() -> Option<WindowKey> {
        CURRENT_WINDOW.with(|current| *current.borrow())
    }

    /// Publish the current window key for the calling thread
    pub fn set_current_window(key: WindowKey) {
        CURRENT_WINDOW.with(|current| *current.borrow_mut() = Some(key));
    }

    /// Clear the current window key for the calling thread
    pub fn clear_current_window() {
        CURRENT_WINDOW.with(|current| *current.borrow_mut() = None);
    }

    /// Publish `key` for the duration of the returned guard.
    ///
    /// The previous key, if any, is restored when the guard drops, so window
    /// construction may nest.
    #[must_use]
    pub fn enter_window(key: WindowKey) -> WindowContextGuard {
        let previous = CURRENT_WINDOW.with(|current| current.borrow_mut().replace(key));
        WindowContextGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    /// Current owning window instance for the calling thread
    pub fn current_owner() -> Option<Arc<dyn WindowOwner>> {
        CURRENT_OWNER.with(|current| current.borrow().clone())
    }

    /// Publish the owning window instance for the calling thread
    pub fn bind_current_owner(owner: Arc<dyn WindowOwner>) {
        CURRENT_OWNER.with(|current| *current.borrow_mut() = Some(owner));
    }

    /// Clear the owning window instance for the calling thread
    pub fn clear_current_owner() {
        CURRENT_OWNER.with(|current| *current.borrow_mut() = None);
    }

    /// Current session for the calling thread
    pub fn current_session() -> Option<SessionId> {
        CURRENT_SESSION.with(|current| *current.borrow())
    }

    /// Publish the current session for the calling thread
    pub fn set_current_session(session: SessionId) {
        CURRENT_SESSION.with(|current| *current.borrow_mut() = Some(session));
    }

    /// Clear the current session for the calling thread
    pub fn clear_current_session() {
        CURRENT_SESSION.with(|current| *current.borrow_mut() = None);
    }

    /// Publish `session` for the duration of the returned guard
    #[must_use]
    pub fn enter_session(session: SessionId) -> SessionContextGuard {
        let previous = CURRENT_SESSION.with(|current| current.borrow_mut().replace(session));
        SessionContextGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    /// Clear every handle published on the calling thread.
    ///
    /// Required at logical-request boundaries in pooled-thread environments:
    /// a recycled worker must not leak one request's handles into the next.
    pub fn clear_all() {
        Self::clear_current_window();
        Self::clear_current_owner();
        Self::clear_current_session();
    }
}

/// Restores the previously published window key on drop.
///
/// Tied to the thread that created it.
pub struct WindowContextGuard {
    previous: Option<WindowKey>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for WindowContextGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        CURRENT_WINDOW.with(|current| *current.borrow_mut() = previous);
    }
}

/// Restores the previously published session on drop.
///
/// Tied to the thread that created it.
pub struct SessionContextGuard {
    previous: Option<SessionId>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for SessionContextGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        CURRENT_SESSION.with(|current| *current.borrow_mut() = previous);
    }
}
