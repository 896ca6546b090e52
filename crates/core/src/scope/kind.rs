/// Scope kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Instance tied to one logical window (browser tab)
    Window,
    /// Instance tied to one user session
    Session,
    /// Instance tied to the executing thread
    Thread,
}

impl ScopeKind {
    /// Check if the kind is window scope
    pub fn is_window(&self) -> bool {
        matches!(self, ScopeKind::Window)
    }

    /// Check if the kind is session scope
    pub fn is_session(&self) -> bool {
        matches!(self, ScopeKind::Session)
    }

    /// Check if the kind is thread scope
    pub fn is_thread(&self) -> bool {
        matches!(self, ScopeKind::Thread)
    }

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Window => "window",
            ScopeKind::Session => "session",
            ScopeKind::Thread => "thread",
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
