//! # subcache-reqwest
//!
//! Caches outgoing [`reqwest`] calls under a stale-while-revalidate policy.
//!
//! [`FetchCache`] sends a request through a [`reqwest::Client`], buffers and
//! parses the response body, and hands the result to
//! [`subcache::Cache::run_with_cache`]. Cached and live responses are both
//! returned as a [`CachedResponse`], so callers never need to tell them apart.
//!
//! - `GET` and `HEAD` requests use [`CachingStrategy::short`] unless a
//!   strategy is supplied; every other method defaults to
//!   [`CachingStrategy::no_store`].
//! - Responses with a non-2xx status are never cached.
//! - The default key is the method, the URL and the request body (if any).
//!
//! ```no_run
//! use subcache::Cache;
//! use subcache_reqwest::{FetchCache, FetchOptions, ReturnType};
//!
//! # async fn run(cache: Cache) -> Result<(), subcache_reqwest::FetchError> {
//! let fetch = FetchCache::new(reqwest::Client::new(), cache);
//! let request = reqwest::Request::new(
//!     reqwest::Method::GET,
//!     "https://api.example.com/products".parse().expect("valid url"),
//! );
//! let (response, ctx) = fetch
//!     .fetch_with_cache(request, FetchOptions::new().return_type(ReturnType::Json))
//!     .await?;
//! println!("{} {:?}", response.status(), ctx.status);
//! # Ok(())
//! # }
//! ```
//!
//! [`CachingStrategy::short`]: subcache::CachingStrategy::short
//! [`CachingStrategy::no_store`]: subcache::CachingStrategy::no_store
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod fetch;
mod options;
mod response;

pub use error::FetchError;
pub use fetch::{FetchCache, default_key, default_strategy};
pub use options::{FetchOptions, ResponsePredicate, ReturnType};
pub use response::{CachedResponse, ResponseBody, SerializableResponse};
