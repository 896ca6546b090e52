use thiserror::Error;

use crate::scope::key::WindowKey;
use crate::scope::kind::ScopeKind;

/// Error type for scoped dependency resolution.
///
/// Both variants indicate a lifecycle wiring defect in the hosting
/// environment and are fatal: resolution never falls back to an unscoped or
/// globally shared instance. Once a handle resolves, the cache operations
/// themselves cannot fail.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("no {scope} scope handle is resolvable for {identity}: the hosting environment must publish a handle before scoped dependencies are requested")]
    MissingContextHandle { scope: ScopeKind, identity: String },

    #[error("{scope} scope handle mismatch for {identity}: the owner is bound to {owner_key} but the context registry holds {current_key}")]
    ContextDesynchronized {
        scope: ScopeKind,
        identity: String,
        owner_key: WindowKey,
        current_key: WindowKey,
    },
}

impl ScopeError {
    /// Create a missing-context-handle error
    pub fn missing_context(scope: ScopeKind, identity: impl Into<String>) -> Self {
        Self::MissingContextHandle {
            scope,
            identity: identity.into(),
        }
    }

    /// Create a context-desynchronized error
    ///
    /// Only the window scope carries an owner that can disagree with the
    /// registry, so the scope kind is fixed.
    pub fn desynchronized(
        identity: impl Into<String>,
        owner_key: WindowKey,
        current_key: WindowKey,
    ) -> Self {
        Self::ContextDesynchronized {
            scope: ScopeKind::Window,
            identity: identity.into(),
            owner_key,
            current_key,
        }
    }
}
