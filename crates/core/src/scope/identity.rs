use std::any::TypeId;

/// Dependency identifier combining type and optional qualifier
///
/// Unique within one scope entry: two requests with the same identity made
/// against the same context handle resolve to the same cached instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyIdentity {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub qualifier: Option<String>,
}

impl DependencyIdentity {
    /// Create an identity for a type
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: None,
        }
    }

    /// Create a qualified identity for a type
    pub fn qualified<T: 'static + ?Sized>(qualifier: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: Some(qualifier.into()),
        }
    }

    /// Check if this identity matches a type and qualifier without allocating
    pub fn matches_qualified<T: 'static + ?Sized>(&self, qualifier: &str) -> bool {
        self.type_id == TypeId::of::<T>() && self.qualifier.as_deref() == Some(qualifier)
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Display for DependencyIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}({})", self.type_name, qualifier),
            None => write!(f, "{}", self.type_name),
        }
    }
}
