//! Store-facing identity of a cache entry.
//!
//! Stores address entries by a request-like identity rather than by the raw
//! key: a synthetic URL under a base that never resolves to a real host.

use std::fmt;

use smol_str::SmolStr;
use subcache_core::CacheKey;

/// Default base for synthetic store identities.
pub const DEFAULT_IDENTITY_BASE: &str = "https://subcache.internal/";

/// Identity under which a [`Store`](crate::Store) files an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreIdentity {
    url: String,
    key: SmolStr,
}

impl StoreIdentity {
    /// Builds the identity for `key` under `base`.
    ///
    /// A missing trailing slash on `base` is added.
    pub fn new(base: &str, key: &CacheKey) -> Self {
        let canonical = key.canonical();
        let mut url = String::with_capacity(base.len() + canonical.len() + 1);
        url.push_str(base);
        if !base.ends_with('/') {
            url.push('/');
        }
        url.push_str(canonical);
        Self {
            url,
            key: SmolStr::new(canonical),
        }
    }

    /// Builds the identity for `key` under [`DEFAULT_IDENTITY_BASE`].
    pub fn from_key(key: &CacheKey) -> Self {
        Self::new(DEFAULT_IDENTITY_BASE, key)
    }

    /// The synthetic URL.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The canonical key this identity was built from.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for StoreIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
