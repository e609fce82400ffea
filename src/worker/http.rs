use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use url::Url;

/// What the page intends to do with the fetched resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    Other,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub headers: HeaderMap,
}

impl Request {
    pub fn get(url: Url, destination: Destination) -> Self {
        Self {
            method: Method::GET,
            url,
            destination,
            headers: HeaderMap::new(),
        }
    }

    pub fn new(method: Method, url: Url, destination: Destination) -> Self {
        Self {
            method,
            url,
            destination,
            headers: HeaderMap::new(),
        }
    }

    /// Cache key; only GET requests are ever cached, so the URL alone suffices.
    pub fn cache_key(&self) -> &str {
        self.url.as_str()
    }
}

/// A response handed back to the page.
///
/// Deliberately not `Clone`: a body goes to exactly one consumer. Anything
/// that also wants to keep it (the cache) takes a [`CachedEntry`] snapshot
/// before the response is returned.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self::new(StatusCode::OK, headers, body)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn snapshot(&self) -> CachedEntry {
        CachedEntry {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            stored_at: Utc::now(),
        }
    }

    /// Consumes the response, yielding its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// Full response snapshot stored in a cache bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub stored_at: DateTime<Utc>,
}

impl CachedEntry {
    pub fn to_response(&self) -> Response {
        Response::new(self.status, self.headers.clone(), self.body.clone())
    }
}
