use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;

use crate::connector::Connector;
use crate::protocol::ConnectError;

/// Default bound on name resolution plus the TCP handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects over TCP, resolving host names with the system resolver.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnector {
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> Result<Self::Stream, ConnectError> {
        // IPv6 literals keep their brackets up to here
        let addr_host = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);

        let stream = match time::timeout(self.connect_timeout, TcpStream::connect((addr_host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ConnectError::io(host, port, e)),
            Err(_) => return Err(ConnectError::timeout(host, port, self.connect_timeout.as_millis())),
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!(cause = %e, "failed to set TCP_NODELAY on upstream stream");
        }
        Ok(stream)
    }
}
