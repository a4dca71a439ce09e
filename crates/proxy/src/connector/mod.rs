//! Opening upstream connections.
//!
//! The connection handler only needs "a connected byte stream for `(host, port)`", so
//! the capability is a trait: production uses [`TcpConnector`], tests plug in
//! in-memory upstreams.

mod tcp;

pub use tcp::TcpConnector;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::protocol::ConnectError;

/// Produces a connected stream to an upstream origin.
///
/// DNS failure, refusal, unreachability and timeouts are all reported as a
/// [`ConnectError`]; callers do not distinguish between them.
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    async fn connect(&self, host: &str, port: u16) -> Result<Self::Stream, ConnectError>;
}
