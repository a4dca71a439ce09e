use std::fmt;

use bytes::BytesMut;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Encoder, FramedRead};
use tracing::{debug, info, warn};

use crate::codec::{HeaderEncoder, RELAY_CHUNK_SIZE, ResponseDecoder, UpstreamRequest};
use crate::connector::Connector;
use crate::protocol::{
    ErrorResponse, Message, ParseError, ProxyError, ProxyRequest, RelayItem, ResolveError, ResponseHead, SendError,
    Target, TransferFraming,
};
use crate::resolver::{resolve_request, resolve_url};

/// Default number of redirects followed before the last redirect is handed to the client
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

type Upstream<S> = FramedRead<S, ResponseDecoder>;

/// How a request that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A final response was relayed, head and body.
    Relayed { framing: TransferFraming, body_bytes: u64, redirects: usize },
    /// The redirect limit was hit; the last redirect head was relayed without a body.
    RedirectLimitExceeded { redirects: usize },
}

/// Redirects followed so far for one client request.
#[derive(Debug, Clone, Copy)]
struct RedirectCounter {
    count: usize,
    limit: usize,
}

impl RedirectCounter {
    fn new(limit: usize) -> Self {
        Self { count: 0, limit }
    }

    /// Records one more redirect; returns `false` once the limit is exceeded.
    fn record(&mut self) -> bool {
        self.count += 1;
        self.count <= self.limit
    }

    fn count(&self) -> usize {
        self.count
    }
}

/// Drives one client request through every upstream hop.
///
/// The handler resolves the target, connects, sends the request and reads the
/// response head. Redirects (`3xx` with a usable `Location`) are followed on the
/// proxy's own initiative by re-sending the same request to the new target, up to the
/// redirect limit. Only the final hop's head and body reach the client.
///
/// Failures before anything was written to the client produce a synthesized
/// 400/502 response. A failure while relaying the body leaves the client with a
/// truncated response.
///
/// # Type Parameters
///
/// * `C`: how upstream connections are opened
/// * `W`: the client's write half
pub struct ProxyConnection<'c, C, W> {
    connector: &'c C,
    client: W,
    max_redirects: usize,
}

impl<C, W> fmt::Debug for ProxyConnection<'_, C, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConnection").field("max_redirects", &self.max_redirects).finish_non_exhaustive()
    }
}

impl<'c, C, W> ProxyConnection<'c, C, W>
where
    C: Connector,
    W: AsyncWrite + Unpin,
{
    pub fn new(connector: &'c C, client: W) -> Self {
        Self { connector, client, max_redirects: DEFAULT_MAX_REDIRECTS }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub async fn process(&mut self, request: &ProxyRequest) -> Result<Completion, ProxyError> {
        let mut target = match resolve_request(request) {
            Ok(target) => target,
            Err(e) => return Err(self.fail(Self::resolve_error_response(&e), e.into()).await),
        };

        let mut redirects = RedirectCounter::new(self.max_redirects);
        loop {
            debug!(%target, "forwarding request");
            let mut upstream = self.open_hop(request, &target).await?;
            let (head, framing) = self.read_head(&mut upstream).await?;

            if let Some(location) = head.redirect_location() {
                if !redirects.record() {
                    info!(redirects = redirects.count(), status = head.status_line(), "redirect limit exceeded");
                    self.send_head(&head).await?;
                    self.client.flush().await.map_err(SendError::client)?;
                    return Ok(Completion::RedirectLimitExceeded { redirects: redirects.count() });
                }

                match resolve_url(&location) {
                    Ok(next) => {
                        info!(from = %target, to = %next, "following redirect");
                        target = next;
                        continue;
                    }
                    Err(e) => {
                        warn!(location = %location, cause = %e, "cannot follow redirect, relaying it as the final response");
                    }
                }
            }

            self.send_head(&head).await?;
            let body_bytes = self.relay_body(&mut upstream).await?;
            debug!(%target, ?framing, body_bytes, "relayed response");
            return Ok(Completion::Relayed { framing, body_bytes, redirects: redirects.count() });
        }
    }

    fn resolve_error_response(e: &ResolveError) -> ErrorResponse {
        match e {
            ResolveError::MissingHost => ErrorResponse::MISSING_HOST,
            ResolveError::InvalidHostHeader => ErrorResponse::INVALID_HOST,
            _ => ErrorResponse::INVALID_URL,
        }
    }

    /// Connects to `target` and sends it the rewritten request.
    async fn open_hop(&mut self, request: &ProxyRequest, target: &Target) -> Result<Upstream<C::Stream>, ProxyError> {
        let mut stream = match self.connector.connect(target.host(), target.port()).await {
            Ok(stream) => stream,
            Err(e) => return Err(self.fail(ErrorResponse::CONNECT_FAILED, e.into()).await),
        };

        let mut buf = BytesMut::new();
        if let Err(e) = HeaderEncoder.encode(UpstreamRequest::new(request, target), &mut buf) {
            return Err(self.fail(ErrorResponse::SEND_FAILED, SendError::upstream(e).into()).await);
        }

        let sent = async {
            stream.write_all(&buf).await?;
            stream.flush().await
        };
        if let Err(e) = sent.await {
            return Err(self.fail(ErrorResponse::SEND_FAILED, SendError::upstream(e).into()).await);
        }

        Ok(FramedRead::with_capacity(stream, ResponseDecoder::new(), RELAY_CHUNK_SIZE))
    }

    async fn read_head(&mut self, upstream: &mut Upstream<C::Stream>) -> Result<(ResponseHead, TransferFraming), ProxyError> {
        let error = match upstream.next().await {
            Some(Ok(Message::Header(header))) => return Ok(header),
            Some(Ok(Message::Payload(_))) => ParseError::invalid_body("body received before response head"),
            Some(Err(e)) => e,
            None => ParseError::EmptyResponse,
        };
        Err(self.fail(ErrorResponse::INVALID_RESPONSE, error.into()).await)
    }

    async fn send_head(&mut self, head: &ResponseHead) -> Result<(), SendError> {
        self.client.write_all(head.as_bytes()).await.map_err(SendError::client)
    }

    /// Relays body bytes until the decoder reports the end of the body.
    ///
    /// Returns the number of bytes written to the client, framing bytes included.
    async fn relay_body(&mut self, upstream: &mut Upstream<C::Stream>) -> Result<u64, ProxyError> {
        let mut relayed = 0u64;
        loop {
            match upstream.next().await {
                Some(Ok(Message::Payload(RelayItem::Chunk(bytes)))) => {
                    self.client.write_all(&bytes).await.map_err(SendError::client)?;
                    relayed += bytes.len() as u64;
                }
                Some(Ok(Message::Payload(RelayItem::Eof))) => {
                    self.client.flush().await.map_err(SendError::client)?;
                    return Ok(relayed);
                }
                Some(Ok(Message::Header(_))) => {
                    return Err(ParseError::invalid_body("response head received while relaying a body").into());
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    return Err(ParseError::invalid_body(format!("upstream closed after {relayed} body bytes")).into());
                }
            }
        }
    }

    /// Sends `response` to the client and hands `error` back for the caller to return.
    async fn fail(&mut self, response: ErrorResponse, error: ProxyError) -> ProxyError {
        warn!(status = response.status().as_u16(), cause = %error, "request failed");
        if let Err(e) = send_error_response(&mut self.client, response).await {
            debug!(cause = %e, "failed to send error response to client");
        }
        error
    }
}

/// Writes a synthesized response to the client.
pub async fn send_error_response<W>(client: &mut W, response: ErrorResponse) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
{
    client.write_all(&response.to_bytes()).await.map_err(SendError::client)?;
    client.flush().await.map_err(SendError::client)
}
