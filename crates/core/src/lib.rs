pub mod errors;
pub mod scope;

// Re-export key types for convenience
pub use errors::ScopeError;
pub use scope::{
    ContextRegistry, DependencyIdentity, ScopeKind, ScopeLifecycleManager, ScopeStatistics,
    ScopedProvider, SessionId, SessionScope, SessionScopedProvider, SurrogateKeyIssuer,
    ThreadScope, ThreadScopedProvider, WindowKey, WindowOwner, WindowScope, WindowScopedProvider,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
