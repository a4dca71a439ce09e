//! Upstream request serialization.
//!
//! Every hop re-serializes the client's request as a plain HTTP/1.0 head with the
//! request target replaced by the hop's path and the `host` header replaced by the
//! hop's authority. The client request itself is never modified.

use bytes::{BufMut, BytesMut};
use http::header::HOST;
use std::io;
use tokio_util::codec::Encoder;

use crate::protocol::{ProxyRequest, Target};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 1024;

/// A client request as it is sent to one particular upstream target.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamRequest<'a> {
    request: &'a ProxyRequest,
    target: &'a Target,
}

impl<'a> UpstreamRequest<'a> {
    pub fn new(request: &'a ProxyRequest, target: &'a Target) -> Self {
        Self { request, target }
    }
}

/// Encoder for upstream request heads implementing the [`Encoder`] trait.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl Encoder<UpstreamRequest<'_>> for HeaderEncoder {
    type Error = io::Error;

    /// Writes `METHOD PATH HTTP/1.0`, the headers and the blank line into `dst`.
    fn encode(&mut self, item: UpstreamRequest<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let UpstreamRequest { request, target } = item;

        dst.reserve(INIT_HEADER_SIZE);
        dst.put_slice(request.method().as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(target.path().as_bytes());
        dst.put_slice(b" HTTP/1.0\r\n");

        dst.put_slice(HOST.as_str().as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(target.host_header().as_bytes());
        dst.put_slice(b"\r\n");

        for (header_name, header_value) in request.headers() {
            if header_name == HOST {
                continue;
            }
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
