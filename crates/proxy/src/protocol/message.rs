use bytes::{Buf, Bytes};

/// Represents an upstream message that can either be a response head or a piece of its body.
///
/// The generic parameter `T` is the head type (normally `(ResponseHead, TransferFraming)`),
/// while `Data` is the type of the relayed body bytes (defaults to `Bytes`).
#[derive(Debug)]
pub enum Message<T, Data: Buf = Bytes> {
    /// Contains the head information of type `T`
    Header(T),
    /// Contains a slice of the body to relay, or the end marker
    Payload(RelayItem<Data>),
}

/// Represents an item in the relayed body stream.
///
/// Body decoders produce raw wire bytes to forward verbatim, then a single
/// `Eof` once the framing says the body is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayItem<Data: Buf = Bytes> {
    /// Bytes to forward to the client unchanged
    Chunk(Data),
    /// Marks the end of the body
    Eof,
}

/// How the end of a response body is determined.
///
/// Classified once per response from its head; every redirect hop gets its own value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransferFraming {
    /// `Transfer-Encoding: chunked`
    Chunked,
    /// Body with a known `Content-Length`
    Length(u64),
    /// Body ends when the upstream closes the connection
    CloseDelimited,
}

impl TransferFraming {
    /// Returns true if the body uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, TransferFraming::Chunked)
    }

    /// Returns true if the body is delimited by connection close
    #[inline]
    pub fn is_close_delimited(&self) -> bool {
        matches!(self, TransferFraming::CloseDelimited)
    }
}

impl<D: Buf> RelayItem<D> {
    /// Returns true if this item represents the end of the body
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, RelayItem::Eof)
    }

    /// Returns true if this item contains bytes to forward
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, RelayItem::Chunk(_))
    }
}

impl RelayItem {
    /// Returns a reference to the contained bytes if this is a Chunk
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            RelayItem::Chunk(bytes) => Some(bytes),
            RelayItem::Eof => None,
        }
    }
}
