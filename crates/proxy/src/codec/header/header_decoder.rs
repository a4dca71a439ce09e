//! Upstream response head decoder.
//!
//! Accumulates upstream bytes until the `\r\n\r\n` terminator and yields the head as a
//! [`ResponseHead`]. Bytes after the terminator stay in the buffer untouched, so the
//! body decoder that runs next sees the body from its very first byte.
//!
//! # Limits
//!
//! No maximum head size is enforced: an upstream that never sends the terminator keeps
//! the buffer growing until it closes the connection.

use bytes::{Bytes, BytesMut};
use http::HeaderMap;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::lines::{head_lines, parse_header_line};
use crate::protocol::{ParseError, ResponseHead};

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Decoder for upstream response heads implementing the [`Decoder`] trait.
#[derive(Debug, Default)]
pub struct HeaderDecoder {
    /// How many buffered bytes are already known not to contain the terminator
    scanned: usize,
}

impl HeaderDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for HeaderDecoder {
    type Item = ResponseHead;
    type Error = ParseError;

    /// Attempts to split a complete head off the front of `src`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(head))` once the terminator has been received
    /// - `Ok(None)` if more data is needed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // the terminator may straddle the previously scanned bytes and the new ones
        let start = self.scanned.saturating_sub(HEAD_TERMINATOR.len() - 1);

        match src[start..].windows(HEAD_TERMINATOR.len()).position(|w| w == HEAD_TERMINATOR) {
            Some(pos) => {
                let head_len = start + pos + HEAD_TERMINATOR.len();
                self.scanned = 0;
                trace!(head_len, "received response head");
                Ok(Some(parse_response_head(src.split_to(head_len).freeze())))
            }
            None => {
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(head) => Ok(Some(head)),
            None if src.is_empty() => Err(ParseError::EmptyResponse),
            None => Err(ParseError::IncompleteHead { received: src.len() }),
        }
    }
}

/// Leniently parses the status line and header fields of a complete head.
fn parse_response_head(raw: Bytes) -> ResponseHead {
    let mut lines = head_lines(&raw);
    let status_line = String::from_utf8_lossy(lines.next().unwrap_or_default()).into_owned();

    let mut headers = HeaderMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = parse_header_line(line) {
            headers.append(name, value);
        }
    }

    ResponseHead::new(raw, status_line, headers)
}
