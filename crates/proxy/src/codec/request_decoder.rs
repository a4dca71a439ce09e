//! Client request head decoder.
//!
//! Frames a single request head out of the client stream and parses it with
//! [`parse_request`]. Only the head is ever read: request bodies are not forwarded, so
//! anything after the terminator is left in the buffer and ignored.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_proxy::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//!
//! let mut buffer = BytesMut::from(&b"GET /index.html HTTP/1.0\r\nHost: example.org\r\n\r\n"[..]);
//! let request = RequestDecoder::new().decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.path(), "/index.html");
//! ```

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::{find_request_head_end, parse_request};
use crate::protocol::{ParseError, ProxyRequest};
use crate::utils::ensure;

/// Largest accepted request head, terminator included
pub const MAX_REQUEST_HEAD_BYTES: usize = 8 * 1024;

/// A decoder for client request heads.
///
/// The head ends at the first `\r\n\r\n` or `\n\n`. If the client half-closes first,
/// [`decode_eof`](Decoder::decode_eof) parses whatever was received.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    /// How many buffered bytes are already known not to contain a terminator
    scanned: usize,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` instance
    pub fn new() -> Self {
        Default::default()
    }
}

impl Decoder for RequestDecoder {
    type Item = ProxyRequest;
    type Error = ParseError;

    /// Attempts to decode a request head from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: a complete head was received and parsed
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the head is malformed or exceeds [`MAX_REQUEST_HEAD_BYTES`]
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // a terminator may straddle the bytes scanned last time and the new ones
        let start = self.scanned.saturating_sub(3);

        let Some(head_len) = find_request_head_end(&src[start..]).map(|len| start + len) else {
            ensure!(src.len() <= MAX_REQUEST_HEAD_BYTES, ParseError::too_large_header(src.len(), MAX_REQUEST_HEAD_BYTES));
            self.scanned = src.len();
            return Ok(None);
        };

        ensure!(head_len <= MAX_REQUEST_HEAD_BYTES, ParseError::too_large_header(head_len, MAX_REQUEST_HEAD_BYTES));

        self.scanned = 0;
        let head = src.split_to(head_len);
        trace!(head_len, "received request head");
        parse_request(&head).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(src)? {
            return Ok(Some(request));
        }

        if src.is_empty() {
            return Ok(None);
        }

        // the client stopped sending before the blank line
        self.scanned = 0;
        let head = src.split();
        trace!(head_len = head.len(), "request head ended by half-close");
        parse_request(&head).map(Some)
    }
}
