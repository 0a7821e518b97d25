//! Per-call options for the fetch wrapper.

use std::fmt;
use std::sync::Arc;

use subcache::{CacheKey, CachingStrategy};

use crate::response::{ResponseBody, SerializableResponse};

/// How the response body is parsed before caching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnType {
    /// Parse as JSON; falls back to text when the body is not valid JSON.
    #[default]
    Json,
    /// Decode as UTF-8 text (lossy).
    Text,
    /// Keep the raw bytes.
    Bytes,
}

/// Extra cacheability check applied after the 2xx status check.
pub type ResponsePredicate = Arc<dyn Fn(&ResponseBody, &SerializableResponse) -> bool + Send + Sync>;

/// Options for a single [`fetch_with_cache`](crate::FetchCache::fetch_with_cache) call.
#[derive(Clone, Default)]
pub struct FetchOptions {
    pub(crate) strategy: Option<CachingStrategy>,
    pub(crate) key: Option<CacheKey>,
    pub(crate) display_name: Option<String>,
    pub(crate) return_type: ReturnType,
    pub(crate) should_cache_response: Option<ResponsePredicate>,
}

impl FetchOptions {
    /// Options with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this strategy instead of the method-based default.
    pub fn strategy(mut self, strategy: CachingStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Use this key instead of `[method, url, body]`.
    pub fn key(mut self, key: impl Into<CacheKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Name recorded in the stored entry's diagnostics.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Body parsing mode.
    pub fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    /// Only cache successful responses for which `predicate` returns `true`.
    pub fn should_cache_response<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ResponseBody, &SerializableResponse) -> bool + Send + Sync + 'static,
    {
        self.should_cache_response = Some(Arc::new(predicate));
        self
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("strategy", &self.strategy)
            .field("key", &self.key)
            .field("display_name", &self.display_name)
            .field("return_type", &self.return_type)
            .field("should_cache_response", &self.should_cache_response.is_some())
            .finish()
    }
}
