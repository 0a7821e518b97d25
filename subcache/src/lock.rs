//! Per-key revalidation lock.
//!
//! At most one background revalidation runs per key within one [`Cache`]
//! instance. The lock set is sharded, so unrelated keys never contend.
//! Deduplication across processes sharing a store is not attempted.
//!
//! [`Cache`]: crate::Cache

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use smol_str::SmolStr;
use subcache_core::CacheKey;
use tracing::trace;

/// Set of keys with a revalidation in flight.
#[derive(Debug, Clone, Default)]
pub struct RevalidationLock {
    in_flight: Arc<DashMap<SmolStr, ()>>,
}

impl RevalidationLock {
    /// Creates an empty lock set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as being revalidated.
    ///
    /// Returns `None` when a revalidation for `key` is already in flight. The
    /// check and the insertion are one atomic step.
    pub fn try_acquire(&self, key: &CacheKey) -> Option<RevalidationPermit> {
        match self.in_flight.entry(SmolStr::new(key.canonical())) {
            Entry::Occupied(_) => {
                trace!(key = %key, "revalidation already in flight");
                None
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(RevalidationPermit {
                    lock: self.clone(),
                    key: SmolStr::new(key.canonical()),
                })
            }
        }
    }

    /// Clears the mark for `key`. Releasing an unlocked key does nothing.
    pub fn release(&self, key: &CacheKey) {
        self.in_flight.remove(key.canonical());
    }

    /// Whether a revalidation for `key` is in flight.
    pub fn is_locked(&self, key: &CacheKey) -> bool {
        self.in_flight.contains_key(key.canonical())
    }

    /// Number of keys currently locked.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Proof of an acquired lock. Releases the key when dropped, including when
/// the owning task panics or is cancelled.
#[derive(Debug)]
#[must_use = "dropping the permit releases the lock immediately"]
pub struct RevalidationPermit {
    lock: RevalidationLock,
    key: SmolStr,
}

impl RevalidationPermit {
    /// Canonical key this permit holds.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for RevalidationPermit {
    fn drop(&mut self) {
        self.lock.in_flight.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let lock = RevalidationLock::new();
        let key = CacheKey::from("products");

        let permit = lock.try_acquire(&key);
        assert!(permit.is_some());
        assert!(lock.try_acquire(&key).is_none());
        assert!(lock.is_locked(&key));

        drop(permit);
        assert!(!lock.is_locked(&key));
        assert!(lock.try_acquire(&key).is_some());
    }

    #[test]
    fn unrelated_keys_do_not_contend() {
        let lock = RevalidationLock::new();
        let a = lock.try_acquire(&CacheKey::from("a"));
        let b = lock.try_acquire(&CacheKey::from("b"));
        assert!(a.is_some() && b.is_some());
        assert_eq!(lock.in_flight(), 2);
    }

    #[test]
    fn release_is_idempotent() {
        let lock = RevalidationLock::new();
        let key = CacheKey::from("k");
        lock.release(&key);
        let _permit = lock.try_acquire(&key);
        lock.release(&key);
        lock.release(&key);
        assert_eq!(lock.in_flight(), 0);
    }

    #[tokio::test]
    async fn panicking_holder_releases_the_key() {
        let lock = RevalidationLock::new();
        let key = CacheKey::from("k");
        let permit = lock.try_acquire(&key);
        let task = tokio::spawn(async move {
            let _permit = permit;
            panic!("revalidation blew up");
        });
        assert!(task.await.is_err());
        assert!(!lock.is_locked(&key));
    }
}
