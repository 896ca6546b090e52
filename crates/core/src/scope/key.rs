use std::sync::atomic::{AtomicU64, Ordering};

/// Surrogate token identifying one logical window.
///
/// Issued before the window object it will belong to has been constructed,
/// so that window-scoped dependencies requested during that construction can
/// already be cached against the right handle. Strictly increasing and
/// comparable; carries no other semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowKey(u64);

impl WindowKey {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw counter value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WindowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Issues window keys from an atomic counter.
///
/// Safe under concurrent calls; cannot fail.
#[derive(Debug)]
pub struct SurrogateKeyIssuer {
    next: AtomicU64,
}

impl SurrogateKeyIssuer {
    /// Create a new issuer starting at key 1
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Issue the next key
    pub fn next_key(&self) -> WindowKey {
        WindowKey(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of keys issued so far
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for SurrogateKeyIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_keys_are_strictly_increasing() {
        let issuer = SurrogateKeyIssuer::new();
        let first = issuer.next_key();
        let second = issuer.next_key();
        let third = issuer.next_key();

        assert!(first < second);
        assert!(second < third);
        assert_eq!(issuer.issued(), 3);
    }

    #[test]
    fn test_concurrent_issue_produces_unique_keys() {
        let issuer = Arc::new(SurrogateKeyIssuer::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let issuer = issuer.clone();
            handles.push(thread::spawn(move || {
                (0..100).map(|_| issuer.next_key()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for key in handle.join().unwrap() {
                assert!(seen.insert(key), "duplicate key issued: {}", key);
            }
        }

        assert_eq!(seen.len(), 800);
        assert_eq!(issuer.issued(), 800);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(format!("{}", WindowKey::new(42)), "window-42");
    }
}
