//! Relay decoder for bodies framed by a `Content-Length` header, as defined in
//! [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use std::cmp;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::RELAY_CHUNK_SIZE;
use crate::protocol::{ParseError, RelayItem};

/// A decoder for bodies with a known length.
///
/// Bytes past the declared length are left in the buffer and never relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The number of body bytes still to relay
    remaining: u64,
}

impl LengthDecoder {
    /// Creates a new LengthDecoder for a body of `length` bytes.
    pub fn new(length: u64) -> Self {
        Self { remaining: length }
    }
}

impl Decoder for LengthDecoder {
    type Item = RelayItem;
    type Error = ParseError;

    /// Relays up to [`RELAY_CHUNK_SIZE`] bytes of the body.
    ///
    /// # Returns
    /// * `Ok(Some(RelayItem::Eof))` once `length` bytes have been relayed
    /// * `Ok(Some(RelayItem::Chunk(bytes)))` with the next piece of the body
    /// * `Ok(None)` when more data is needed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.remaining == 0 {
            return Ok(Some(RelayItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let len = cmp::min(self.remaining, src.len() as u64).min(RELAY_CHUNK_SIZE as u64);
        let bytes = src.split_to(len as usize).freeze();

        self.remaining -= bytes.len() as u64;
        Ok(Some(RelayItem::Chunk(bytes)))
    }
}
