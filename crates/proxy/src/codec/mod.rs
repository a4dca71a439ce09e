//! Codecs for the two sides of the proxy.
//!
//! # Architecture
//!
//! - Client side:
//!   - [`RequestDecoder`]: frames and parses the client request head
//!   - [`parse_request`]: the head parser on its own, without framing
//!
//! - Upstream side:
//!   - [`HeaderEncoder`]: serializes an [`UpstreamRequest`] for one hop
//!   - [`ResponseDecoder`]: decodes the response head, then relays the body through
//!     a [`RelayDecoder`] chosen from the head's framing
//!
//! All decoders work on a shared `BytesMut` and never copy body bytes: what the
//! upstream sent is what the client receives.

mod body;
mod header;
mod request_decoder;
mod response_decoder;

pub use body::{ChunkedDecoder, CloseDecoder, LengthDecoder, RELAY_CHUNK_SIZE, RelayDecoder};
pub use header::{HeaderDecoder, HeaderEncoder, UpstreamRequest, parse_request};
pub use request_decoder::{MAX_REQUEST_HEAD_BYTES, RequestDecoder};
pub use response_decoder::ResponseDecoder;
