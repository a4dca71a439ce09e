use std::fmt;

use futures::StreamExt;
use http::Method;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::codec::{MAX_REQUEST_HEAD_BYTES, RequestDecoder};
use crate::connection::proxy_connection::{Completion, DEFAULT_MAX_REDIRECTS, ProxyConnection, send_error_response};
use crate::connector::Connector;
use crate::protocol::{ErrorResponse, ProxyError};

/// What happened to one accepted client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The client closed without sending anything.
    Closed,
    /// The method is not GET; answered 501 without contacting any upstream.
    NotImplemented,
    /// The request went through the proxy.
    Proxied(Completion),
}

/// One accepted client connection: reads a single request head, then hands GET
/// requests to [`ProxyConnection`].
///
/// The connection is closed when `process` returns, whatever the outcome.
pub struct ClientConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    writer: W,
    max_redirects: usize,
}

impl<R, W> fmt::Debug for ClientConnection<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConnection").field("max_redirects", &self.max_redirects).finish_non_exhaustive()
    }
}

impl<R, W> ClientConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), MAX_REQUEST_HEAD_BYTES),
            writer,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub async fn process<C: Connector>(mut self, connector: &C) -> Result<Outcome, ProxyError> {
        let result = self.do_process(connector).await;

        if let Err(e) = self.writer.shutdown().await {
            debug!(cause = %e, "failed to shut down client stream");
        }
        result
    }

    async fn do_process<C: Connector>(&mut self, connector: &C) -> Result<Outcome, ProxyError> {
        let request = match self.framed_read.next().await {
            Some(Ok(request)) => request,
            Some(Err(e)) => {
                warn!(cause = %e, "can't parse client request");
                if let Err(e) = send_error_response(&mut self.writer, ErrorResponse::BAD_REQUEST).await {
                    debug!(cause = %e, "failed to send error response to client");
                }
                return Err(ProxyError::request(e));
            }
            None => {
                debug!("client closed before sending a request");
                return Ok(Outcome::Closed);
            }
        };

        info!(method = %request.method(), path = request.path(), "received request");

        if request.method() != Method::GET {
            send_error_response(&mut self.writer, ErrorResponse::NOT_IMPLEMENTED).await?;
            return Ok(Outcome::NotImplemented);
        }

        let completion = ProxyConnection::new(connector, &mut self.writer)
            .with_max_redirects(self.max_redirects)
            .process(&request)
            .await?;
        Ok(Outcome::Proxied(completion))
    }
}
