//! Relay decoder for bodies that end when the upstream closes the connection.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::RELAY_CHUNK_SIZE;
use crate::protocol::{ParseError, RelayItem};

/// Relays whatever arrives until end of stream.
///
/// Only [`Decoder::decode_eof`] can finish the body; `decode` never returns
/// [`RelayItem::Eof`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseDecoder;

impl CloseDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for CloseDecoder {
    type Item = RelayItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let len = src.len().min(RELAY_CHUNK_SIZE);
        Ok(Some(RelayItem::Chunk(src.split_to(len).freeze())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Ok(Some(RelayItem::Eof)),
        }
    }
}
