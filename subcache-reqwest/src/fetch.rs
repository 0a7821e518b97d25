//! The caching fetch wrapper.

use reqwest::{Client, Method, Request};
use subcache::{
    Cache, CacheContext, CacheKey, CachingStrategy, KeyPart, Offload, OffloadManager,
    StrategyOptions,
};
use tracing::debug;

use crate::error::FetchError;
use crate::options::FetchOptions;
use crate::response::{CachedResponse, ResponseBody, SerializableResponse};

/// Sends requests through a [`Client`] and caches the responses in a [`Cache`].
#[derive(Clone, Debug)]
pub struct FetchCache<O = OffloadManager> {
    client: Client,
    cache: Cache<O>,
}

impl<O> FetchCache<O>
where
    O: Offload + 'static,
{
    /// Wraps `client` with `cache`.
    pub fn new(client: Client, cache: Cache<O>) -> Self {
        Self { client, cache }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &Cache<O> {
        &self.cache
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sends `request` unless a cached response is available.
    ///
    /// Non-2xx responses are returned but never cached.
    pub async fn fetch_with_cache(
        &self,
        request: Request,
        options: FetchOptions,
    ) -> Result<(CachedResponse, CacheContext), FetchError> {
        let strategy = match options.strategy {
            Some(strategy) => strategy,
            None => default_strategy(request.method())?,
        };
        let mut key = options.key.unwrap_or_else(|| default_key(&request));
        if let Some(name) = options.display_name {
            key = key.with_display_name(name);
        }
        let return_type = options.return_type;
        let user_predicate = options.should_cache_response;

        debug!(method = %request.method(), url = %request.url(), key = %key, "fetch");

        let client = self.client.clone();
        let compute = move || async move {
            let response = client.execute(request).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await?;
            let body = ResponseBody::parse(bytes, return_type);
            Ok::<_, reqwest::Error>(SerializableResponse::new(status, headers, body))
        };
        let should_cache = move |response: &SerializableResponse| {
            response.status().is_success()
                && user_predicate
                    .as_ref()
                    .is_none_or(|predicate| predicate(response.body(), response))
        };

        let (response, ctx) = self
            .cache
            .run_with_cache(key, &strategy, should_cache, compute)
            .await?;
        Ok((CachedResponse::from(response), ctx))
    }
}

/// `short()` for `GET` and `HEAD`, `no_store()` for every other method.
pub fn default_strategy(method: &Method) -> Result<CachingStrategy, FetchError> {
    if method == Method::GET || method == Method::HEAD {
        Ok(CachingStrategy::short(StrategyOptions::default())?)
    } else {
        Ok(CachingStrategy::no_store())
    }
}

/// `[method, url, body]`, the body only when the request has a buffered one.
pub fn default_key(request: &Request) -> CacheKey {
    let mut parts = vec![
        KeyPart::from(request.method().as_str()),
        KeyPart::from(request.url().as_str()),
    ];
    if let Some(body) = request.body().and_then(|body| body.as_bytes()) {
        parts.push(KeyPart::from(String::from_utf8_lossy(body).into_owned()));
    }
    CacheKey::new(parts)
}
