use subcache::StrategyError;

/// Errors returned by [`FetchCache::fetch_with_cache`](crate::FetchCache::fetch_with_cache).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Sending the request or reading the response body failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The default strategy could not be built.
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}
