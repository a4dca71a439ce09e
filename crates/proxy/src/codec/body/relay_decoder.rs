//! Decoder that relays a response body under whichever framing its head declared.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::close_decoder::CloseDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{ParseError, RelayItem, TransferFraming};

/// A unified relay decoder over the three [`TransferFraming`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Relay a fixed number of bytes
    Length(LengthDecoder),

    /// Relay a chunked envelope up to and including its final empty line
    Chunked(ChunkedDecoder),

    /// Relay until the upstream closes
    CloseDelimited(CloseDecoder),
}

impl RelayDecoder {
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    pub fn close_delimited() -> Self {
        Self { kind: Kind::CloseDelimited(CloseDecoder::new()) }
    }
}

impl From<TransferFraming> for RelayDecoder {
    fn from(framing: TransferFraming) -> Self {
        match framing {
            TransferFraming::Chunked => RelayDecoder::chunked(),
            TransferFraming::Length(size) => RelayDecoder::fix_length(size),
            TransferFraming::CloseDelimited => RelayDecoder::close_delimited(),
        }
    }
}

impl Decoder for RelayDecoder {
    type Item = RelayItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(decoder) => decoder.decode(src),
            Kind::Chunked(decoder) => decoder.decode(src),
            Kind::CloseDelimited(decoder) => decoder.decode(src),
        }
    }

    /// Only a close-delimited body may legitimately end at end of stream; for the
    /// other framings the default behaviour reports the leftover bytes as an error.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(decoder) => decoder.decode_eof(src),
            Kind::Chunked(decoder) => decoder.decode_eof(src),
            Kind::CloseDelimited(decoder) => decoder.decode_eof(src),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_framing() {
        assert_eq!(RelayDecoder::from(TransferFraming::Chunked), RelayDecoder::chunked());
        assert_eq!(RelayDecoder::from(TransferFraming::Length(7)), RelayDecoder::fix_length(7));
        assert_eq!(RelayDecoder::from(TransferFraming::CloseDelimited), RelayDecoder::close_delimited());
    }

    #[test]
    fn close_delimited_ends_at_eof() {
        let mut buffer = BytesMut::new();
        let mut decoder = RelayDecoder::close_delimited();
        assert_eq!(decoder.decode_eof(&mut buffer).unwrap(), Some(RelayItem::Eof));
    }

    #[test]
    fn length_body_cut_short_never_ends() {
        let mut buffer = BytesMut::from(&b"abc"[..]);
        let mut decoder = RelayDecoder::fix_length(10);

        assert!(decoder.decode_eof(&mut buffer).unwrap().unwrap().is_chunk());
        // nothing buffered and the body is unfinished
        assert!(decoder.decode_eof(&mut buffer).unwrap().is_none());
    }
}
