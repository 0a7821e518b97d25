//! Cached form of an HTTP response.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::options::ReturnType;

/// Parsed response body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ResponseBody {
    /// Body parsed as JSON.
    Json(serde_json::Value),
    /// Body decoded as text.
    Text(String),
    /// Raw body bytes.
    Bytes(Bytes),
}

impl ResponseBody {
    /// Parses `bytes` according to `return_type`.
    ///
    /// A body that is not valid JSON is kept as text.
    pub fn parse(bytes: Bytes, return_type: ReturnType) -> Self {
        match return_type {
            ReturnType::Json => match serde_json::from_slice(&bytes) {
                Ok(value) => ResponseBody::Json(value),
                Err(_) => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
            },
            ReturnType::Text => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
            ReturnType::Bytes => ResponseBody::Bytes(bytes),
        }
    }

    /// Body rendered back to bytes.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            ResponseBody::Json(value) => Bytes::from(value.to_string()),
            ResponseBody::Text(text) => Bytes::from(text.clone()),
            ResponseBody::Bytes(bytes) => bytes.clone(),
        }
    }
}

/// The part of a response that is stored in the cache.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SerializableResponse {
    #[serde(with = "http_serde::status_code")]
    status: StatusCode,
    status_text: String,
    #[serde(with = "http_serde::header_map")]
    headers: HeaderMap,
    body: ResponseBody,
}

impl SerializableResponse {
    /// Assembles a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body,
        }
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Parsed body.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }
}

/// Response returned by the fetch wrapper, whether live or cached.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    inner: SerializableResponse,
}

impl CachedResponse {
    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.inner.status
    }

    /// Reason phrase recorded with the response.
    pub fn status_text(&self) -> &str {
        &self.inner.status_text
    }

    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        self.inner.status.is_success()
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Parsed body.
    pub fn body(&self) -> &ResponseBody {
        &self.inner.body
    }

    /// Deserializes the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.inner.body {
            ResponseBody::Json(value) => T::deserialize(value),
            ResponseBody::Text(text) => serde_json::from_str(text),
            ResponseBody::Bytes(bytes) => serde_json::from_slice(bytes),
        }
    }

    /// Body as text.
    pub fn text(&self) -> String {
        match &self.inner.body {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text.clone(),
            ResponseBody::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Body as bytes.
    pub fn bytes(&self) -> Bytes {
        self.inner.body.to_bytes()
    }

    /// Converts into an [`http::Response`] with a buffered body.
    pub fn into_http(self) -> http::Response<Bytes> {
        let body = self.inner.body.to_bytes();
        let mut response = http::Response::new(body);
        *response.status_mut() = self.inner.status;
        *response.headers_mut() = self.inner.headers;
        response
    }

    /// Converts into a [`reqwest::Response`].
    pub fn into_reqwest(self) -> reqwest::Response {
        reqwest::Response::from(self.into_http())
    }

    /// The cached form.
    pub fn into_inner(self) -> SerializableResponse {
        self.inner
    }
}

impl From<SerializableResponse> for CachedResponse {
    fn from(inner: SerializableResponse) -> Self {
        Self { inner }
    }
}
