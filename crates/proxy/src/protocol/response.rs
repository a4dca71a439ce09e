//! Upstream response heads and the error responses the proxy synthesizes itself.

use std::borrow::Cow;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, LOCATION, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::protocol::TransferFraming;

/// A response head received from upstream.
///
/// Keeps the raw bytes (status line, header lines and the terminating blank line) so
/// the head can be relayed to the client byte-for-byte, alongside a lenient parse of
/// the status line and headers used for redirect and framing decisions.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    raw: Bytes,
    status_line: String,
    headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(raw: Bytes, status_line: impl Into<String>, headers: HeaderMap) -> Self {
        Self { raw, status_line: status_line.into(), headers }
    }

    /// The head exactly as received, including the trailing `\r\n\r\n`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Loose 3xx check on the raw status line text.
    pub fn is_redirect_status(&self) -> bool {
        self.status_line.contains(" 3")
    }

    /// The first `Location` value, trimmed, if present and non-empty.
    ///
    /// Bytes outside visible ASCII are decoded lossily; whether the value is a usable
    /// target is left to the resolver.
    pub fn location(&self) -> Option<Cow<'_, str>> {
        let location = self.headers.get(LOCATION)?.as_bytes().trim_ascii();
        (!location.is_empty()).then(|| String::from_utf8_lossy(location))
    }

    /// The location to follow when this head is a redirect.
    pub fn redirect_location(&self) -> Option<Cow<'_, str>> {
        if self.is_redirect_status() { self.location() } else { None }
    }

    /// Determines how the body following this head is delimited.
    ///
    /// - chunked if the last `Transfer-Encoding` coding is `chunked`
    /// - otherwise the first `Content-Length` value if it parses
    /// - otherwise the body runs until the upstream closes
    pub fn framing(&self) -> TransferFraming {
        if is_chunked(self.headers.get_all(TRANSFER_ENCODING).iter().last()) {
            return TransferFraming::Chunked;
        }

        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or(TransferFraming::CloseDelimited, TransferFraming::Length)
    }
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
fn is_chunked(header_value: Option<&HeaderValue>) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    if let Some(value) = header_value
        && let Some(bytes) = value.as_bytes().rsplit(|b| *b == b',').next()
    {
        return bytes.trim_ascii().eq_ignore_ascii_case(CHUNKED);
    }
    false
}

/// A response generated by the proxy when it cannot relay one from upstream.
///
/// Serialized as `HTTP/1.0 <code> <reason>\r\n\r\n<message>\r\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorResponse {
    status: StatusCode,
    message: &'static str,
}

impl ErrorResponse {
    pub const BAD_REQUEST: Self = Self::new(StatusCode::BAD_REQUEST, "Bad Request");
    pub const MISSING_HOST: Self = Self::new(StatusCode::BAD_REQUEST, "Host header is required.");
    pub const INVALID_HOST: Self = Self::new(StatusCode::BAD_REQUEST, "Invalid Host header.");
    pub const INVALID_URL: Self = Self::new(StatusCode::BAD_REQUEST, "Invalid request URL.");
    pub const NOT_IMPLEMENTED: Self = Self::new(StatusCode::NOT_IMPLEMENTED, "Method Not Implemented");
    pub const CONNECT_FAILED: Self = Self::new(StatusCode::BAD_GATEWAY, "Could not connect to upstream server.");
    pub const SEND_FAILED: Self = Self::new(StatusCode::BAD_GATEWAY, "Failed to send request to server.");
    pub const INVALID_RESPONSE: Self = Self::new(StatusCode::BAD_GATEWAY, "Empty or invalid response from server.");

    pub const fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn to_bytes(&self) -> Bytes {
        let reason = self.status.canonical_reason().unwrap_or("Unknown");
        Bytes::from(format!("HTTP/1.0 {} {reason}\r\n\r\n{}\r\n", self.status.as_str(), self.message))
    }
}
