//! In-memory client and upstream streams for driving the connection handler in tests.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time;

use crate::connector::Connector;
use crate::protocol::ConnectError;

/// A stream that replays canned bytes and records everything written to it.
#[derive(Debug, Clone)]
pub(crate) struct MockIo {
    read_data: Bytes,
    /// Largest read handed out at once, to exercise split reads
    read_chunk: usize,
    written: Arc<Mutex<Vec<u8>>>,
    fail_writes: bool,
}

impl MockIo {
    pub(crate) fn new(read_data: impl Into<Bytes>) -> Self {
        Self { read_data: read_data.into(), read_chunk: usize::MAX, written: Arc::default(), fail_writes: false }
    }

    pub(crate) fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk;
        self
    }

    pub(crate) fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Shared handle to the bytes written so far.
    pub(crate) fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        self.written.clone()
    }

    pub(crate) fn written_string(&self) -> String {
        String::from_utf8_lossy(&self.written.lock().unwrap()).into_owned()
    }
}

impl AsyncRead for MockIo {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let n = self.read_data.len().min(buf.remaining()).min(self.read_chunk);
        let bytes = self.read_data.split_to(n);
        buf.put_slice(&bytes);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIo {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        if self.fail_writes {
            return Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)));
        }
        self.written.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A connector whose upstreams answer with scripted responses.
///
/// Unknown targets are refused. Every connect and every request written upstream is
/// recorded.
#[derive(Debug, Default)]
pub(crate) struct ScriptedConnector {
    upstreams: HashMap<(String, u16), MockIo>,
    connects: Mutex<Vec<(String, u16)>>,
    requests: Mutex<Vec<Arc<Mutex<Vec<u8>>>>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_response(self, host: &str, port: u16, response: impl Into<Bytes>) -> Self {
        self.with_upstream(host, port, MockIo::new(response))
    }

    pub(crate) fn with_upstream(mut self, host: &str, port: u16, upstream: MockIo) -> Self {
        self.upstreams.insert((host.to_string(), port), upstream);
        self
    }

    pub(crate) fn connects(&self) -> Vec<(String, u16)> {
        self.connects.lock().unwrap().clone()
    }

    /// The requests sent upstream, one per successful connect, in order.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|written| String::from_utf8_lossy(&written.lock().unwrap()).into_owned()).collect()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Stream = MockIo;

    async fn connect(&self, host: &str, port: u16) -> Result<Self::Stream, ConnectError> {
        self.connects.lock().unwrap().push((host.to_string(), port));

        let Some(template) = self.upstreams.get(&(host.to_string(), port)) else {
            return Err(ConnectError::io(host, port, io::Error::from(io::ErrorKind::ConnectionRefused)));
        };

        // a fresh write log per connection, replaying the same response
        let upstream = MockIo { written: Arc::default(), ..template.clone() };
        self.requests.lock().unwrap().push(upstream.written());
        Ok(upstream)
    }
}

/// A loopback listener whose handshakes never complete.
///
/// The listener has a zero backlog and is never accepted from; the returned streams
/// fill its accept queue, after which new SYNs are dropped. Keep all three values
/// alive for as long as connects should hang.
pub(crate) async fn stalled_listener() -> (TcpListener, Vec<TcpStream>, SocketAddr) {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind(SocketAddr::from(([127, 0, 0, 1], 0))).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut backlog = Vec::new();
    for _ in 0..2 {
        if let Ok(Ok(stream)) = time::timeout(Duration::from_millis(100), TcpStream::connect(addr)).await {
            backlog.push(stream);
        }
    }
    (listener, backlog, addr)
}
