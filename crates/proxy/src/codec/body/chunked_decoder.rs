//! Pass-through decoder for HTTP chunked transfer encoding.
//!
//! The decoder walks the chunked envelope defined in
//! [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1) only to find
//! where the body ends. Everything it consumes (size lines, chunk data, the CRLF after
//! each chunk, trailers and the final empty line) is handed back unchanged, so the
//! client receives the exact chunk stream the upstream sent.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::*;

use crate::codec::body::RELAY_CHUNK_SIZE;
use crate::protocol::{ParseError, RelayItem};

/// A relay decoder for chunked bodies.
///
/// Size and trailer lines are `\n` terminated. A size line may carry an extension after
/// `;`, which is ignored; blank lines where a size line is expected are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
}

impl ChunkedDecoder {
    /// Creates a new ChunkedDecoder, ready to read the first size line.
    pub fn new() -> Self {
        Self { state: Size }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read a chunk size line
    Size,
    /// Relay chunk data, with the number of bytes still expected
    Body(u64),
    /// Read the CRLF after chunk data
    BodyCrlf,
    /// Read trailer lines up to the final empty line
    Trailer,
    /// The last chunk and its trailers have been relayed
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = RelayItem;
    type Error = ParseError;

    /// Decodes the next piece of the chunk stream.
    ///
    /// # Returns
    /// - `Ok(Some(RelayItem::Chunk(bytes)))` with the raw bytes just consumed
    /// - `Ok(Some(RelayItem::Eof))` once the terminating empty line has been relayed
    /// - `Ok(None)` when more data is needed
    /// - `Err(ParseError)` if a size line is not valid hex or the chunk CRLF is missing
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.state == End {
            trace!("finished relaying chunked body");
            return Ok(Some(RelayItem::Eof));
        }

        let Some((next_state, bytes)) = self.state.step(src)? else {
            // need more data
            return Ok(None);
        };

        self.state = next_state;
        trace!(len = bytes.len(), state = ?self.state, "relay chunked bytes");
        Ok(Some(RelayItem::Chunk(bytes)))
    }
}

impl ChunkedState {
    /// Consumes the next unit of the envelope for the current state.
    ///
    /// Returns the state to move to and the raw bytes consumed, or `None` if `src`
    /// does not hold a complete unit yet.
    fn step(self, src: &mut BytesMut) -> Result<Option<(ChunkedState, Bytes)>, ParseError> {
        match self {
            Size => {
                let Some(line) = take_line(src) else { return Ok(None) };
                let next = Self::after_size_line(&line)?;
                Ok(Some((next, line)))
            }
            Body(remaining) => Ok(Self::read_body(src, remaining)),
            BodyCrlf => Self::read_body_crlf(src),
            Trailer => {
                let Some(line) = take_line(src) else { return Ok(None) };
                // only a line that is exactly CRLF ends the trailers
                let next = if &line[..] == b"\r\n" { End } else { Trailer };
                Ok(Some((next, line)))
            }
            End => Ok(None),
        }
    }

    /// Chooses the state following a size line.
    ///
    /// A blank line stays in `Size`; a zero size moves on to the trailers.
    fn after_size_line(line: &[u8]) -> Result<ChunkedState, ParseError> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(Size);
        }

        let size = line.split(|b| *b == b';').next().unwrap_or_default().trim_ascii();
        let size = std::str::from_utf8(size).map_err(|_| ParseError::invalid_chunk_size("size is not ascii"))?;
        match u64::from_str_radix(size, 16) {
            Ok(0) => Ok(Trailer),
            Ok(size) => Ok(Body(size)),
            Err(e) => Err(ParseError::invalid_chunk_size(format!("{size:?}: {e}"))),
        }
    }

    /// Relays up to `remaining` chunk data bytes, capped at [`RELAY_CHUNK_SIZE`].
    fn read_body(src: &mut BytesMut, remaining: u64) -> Option<(ChunkedState, Bytes)> {
        if src.is_empty() {
            return None;
        }

        let read_size = usize::try_from(remaining).unwrap_or(usize::MAX).min(src.len()).min(RELAY_CHUNK_SIZE);
        let remaining = remaining - read_size as u64;
        let bytes = src.split_to(read_size).freeze();

        if remaining > 0 { Some((Body(remaining), bytes)) } else { Some((BodyCrlf, bytes)) }
    }

    /// Validates and relays the CRLF that closes every chunk's data.
    fn read_body_crlf(src: &mut BytesMut) -> Result<Option<(ChunkedState, Bytes)>, ParseError> {
        if src.len() < 2 {
            return Ok(None);
        }

        if &src[..2] != b"\r\n" {
            return Err(ParseError::invalid_body("missing CRLF after chunk data"));
        }

        Ok(Some((Size, src.split_to(2).freeze())))
    }
}

/// Splits one `\n` terminated line, terminator included, off the front of `src`.
fn take_line(src: &mut BytesMut) -> Option<Bytes> {
    let end = src.iter().position(|b| *b == b'\n')?;
    Some(src.split_to(end + 1).freeze())
}
