//! Client request representation.
//!
//! A [`ProxyRequest`] is built once per client connection by the request parser and
//! never mutated afterwards. Every upstream hop serializes a rewritten view of it
//! (see [`crate::codec::UpstreamRequest`]), so a redirect to another origin re-sends
//! the client's headers exactly as they arrived.

use http::header::HOST;
use http::{HeaderMap, HeaderValue, Method};

/// A parsed client request head.
///
/// Header names are stored lower-cased; a repeated name keeps the last value.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    method: Method,
    path: String,
    version: String,
    headers: HeaderMap,
}

impl ProxyRequest {
    pub fn new(method: Method, path: impl Into<String>, version: impl Into<String>, headers: HeaderMap) -> Self {
        Self { method, path: path.into(), version: version.into(), headers }
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request target exactly as written on the request line.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the version token exactly as written on the request line.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the `Host` header, if the client sent one.
    pub fn host(&self) -> Option<&HeaderValue> {
        self.headers.get(HOST)
    }

    /// Whether the request line carries an absolute-path rather than a full URI.
    pub fn is_origin_form(&self) -> bool {
        self.path.starts_with('/')
    }
}
