//! HTTP head processing: parsing client request heads, decoding upstream response
//! heads and encoding the request sent upstream.
//!
//! # Components
//!
//! - [`parse_request`]: parses a client request head (no I/O)
//! - [`HeaderDecoder`]: frames and parses an upstream response head
//! - [`HeaderEncoder`]: serializes an [`UpstreamRequest`] as an HTTP/1.0 head

mod header_decoder;
mod header_encoder;
mod lines;
mod request_parser;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
pub use header_encoder::UpstreamRequest;
pub(crate) use lines::find_request_head_end;
pub use request_parser::parse_request;
