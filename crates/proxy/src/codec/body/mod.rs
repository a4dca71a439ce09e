//! Relay decoders for upstream response bodies.
//!
//! A body is never reassembled: each decoder only finds where the body ends and hands
//! back the raw bytes it consumed, ready to be written to the client.
//!
//! # Components
//!
//! - [`ChunkedDecoder`]: walks the chunked envelope and passes it through unchanged
//! - [`LengthDecoder`]: relays exactly `Content-Length` bytes
//! - [`CloseDecoder`]: relays everything until the upstream closes
//! - [`RelayDecoder`]: picks one of the above from a [`TransferFraming`]
//!
//! [`TransferFraming`]: crate::protocol::TransferFraming

mod chunked_decoder;
mod close_decoder;
mod length_decoder;
mod relay_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use close_decoder::CloseDecoder;
pub use length_decoder::LengthDecoder;
pub use relay_decoder::RelayDecoder;

/// Largest number of body bytes handed out in one [`RelayItem`](crate::protocol::RelayItem)
pub const RELAY_CHUNK_SIZE: usize = 4096;
