use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use micro_proxy::connection::{ClientConnection, DEFAULT_MAX_REDIRECTS};
use micro_proxy::connector::TcpConnector;
use micro_proxy::pool::WorkerPool;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span};

use crate::config::{ConfigError, ProxyConfig};
use crate::error::ServerError;
use crate::listener::{ClientStream, Listener};
use crate::signal::shutdown_signal;

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct ProxyServerBuilder {
    address: Option<SocketAddr>,
    workers: usize,
    connect_timeout: Duration,
    max_redirects: usize,
}

impl ProxyServerBuilder {
    fn new() -> Self {
        Self { address: None, workers: DEFAULT_WORKERS, connect_timeout: DEFAULT_CONNECT_TIMEOUT, max_redirects: DEFAULT_MAX_REDIRECTS }
    }

    /// Takes every setting from parsed command line arguments.
    pub fn config(self, config: &ProxyConfig) -> Self {
        self.address(config.listen_addr())
            .workers(config.max_client_threads)
            .connect_timeout(config.connect_timeout())
            .max_redirects(config.max_redirects)
    }

    pub fn address(mut self, address: impl Into<SocketAddr>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn build(self) -> Result<ProxyServer, ServerBuildError> {
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?;
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers.into());
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroConnectTimeout.into());
        }
        Ok(ProxyServer { address, workers: self.workers, connect_timeout: self.connect_timeout, max_redirects: self.max_redirects })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("address must be set")]
    MissingAddress,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The proxy process: a listener feeding a fixed pool of client workers.
#[derive(Debug, Clone)]
pub struct ProxyServer {
    address: SocketAddr,
    workers: usize,
    connect_timeout: Duration,
    max_redirects: usize,
}

impl ProxyServer {
    pub fn builder() -> ProxyServerBuilder {
        ProxyServerBuilder::new()
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn start(self) -> Result<(), ServerError> {
        self.serve(shutdown_signal()).await
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let listener = Listener::bind(self.address)?;
        self.serve_on(listener, shutdown).await;
        Ok(())
    }

    /// Serves clients accepted on `listener` until `shutdown` resolves, then waits for
    /// every queued and in-flight client to finish.
    pub async fn serve_on<F>(self, listener: Listener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            addr = %listener.local_addr(),
            workers = self.workers,
            connect_timeout_ms = self.connect_timeout.as_millis(),
            max_redirects = self.max_redirects,
            "proxy initialized"
        );

        let connector = Arc::new(TcpConnector::new(self.connect_timeout));
        let max_redirects = self.max_redirects;
        let pool = WorkerPool::new(self.workers, move |client: ClientStream| serve_client(client, Arc::clone(&connector), max_redirects));

        listener.run(&pool, shutdown).await;

        info!("waiting for workers to finish");
        pool.shutdown().await;
        info!("all workers finished");
    }
}

async fn serve_client((stream, peer): ClientStream, connector: Arc<TcpConnector>, max_redirects: usize) {
    let span = info_span!("client", %peer);
    async move {
        let (reader, writer) = stream.into_split();
        let connection = ClientConnection::new(reader, writer).with_max_redirects(max_redirects);
        match connection.process(connector.as_ref()).await {
            Ok(outcome) => info!(?outcome, "finished process, connection shutdown"),
            Err(e) => error!(cause = %e, "service has error, connection shutdown"),
        }
    }
    .instrument(span)
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    /// A one-shot origin that reads a request head and answers with `response`.
    async fn origin(response: &'static str) -> (SocketAddr, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.ends_with(b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8(request).unwrap()
        });
        (addr, handle)
    }

    async fn start_proxy() -> (SocketAddr, oneshot::Sender<()>, JoinHandle<()>) {
        let server = ProxyServer::builder().address(([127, 0, 0, 1], 0)).workers(2).build().unwrap();
        let listener = Listener::bind(server.address()).unwrap();
        let addr = listener.local_addr();

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(server.serve_on(listener, async {
            let _ = stop_rx.await;
        }));
        (addr, stop_tx, handle)
    }

    async fn roundtrip(proxy: SocketAddr, request: &str) -> String {
        let mut client = TcpStream::connect(proxy).await.unwrap();
        client.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn relays_over_loopback() {
        let (origin_addr, origin) = origin("HTTP/1.0 200 OK\r\nContent-Length: 5\r\n\r\nhello").await;
        let (proxy, stop, server) = start_proxy().await;

        let response = roundtrip(proxy, &format!("GET http://{origin_addr}/greeting HTTP/1.1\r\nAccept: */*\r\n\r\n")).await;
        assert_eq!(response, "HTTP/1.0 200 OK\r\nContent-Length: 5\r\n\r\nhello");

        let forwarded = origin.await.unwrap();
        assert!(forwarded.starts_with("GET /greeting HTTP/1.0\r\n"));
        assert!(forwarded.contains(&format!("host: 127.0.0.1:{}\r\n", origin_addr.port())));

        stop.send(()).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn rejects_post_over_loopback() {
        let (proxy, stop, server) = start_proxy().await;

        let response = roundtrip(proxy, "POST http://127.0.0.1:1/ HTTP/1.0\r\n\r\n").await;
        assert_eq!(response, "HTTP/1.0 501 Not Implemented\r\n\r\nMethod Not Implemented\r\n");

        stop.send(()).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_origin_over_loopback() {
        let closed_port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let (proxy, stop, server) = start_proxy().await;

        let response = roundtrip(proxy, &format!("GET / HTTP/1.0\r\nHost: 127.0.0.1:{closed_port}\r\n\r\n")).await;
        assert_eq!(response, "HTTP/1.0 502 Bad Gateway\r\n\r\nCould not connect to upstream server.\r\n");

        stop.send(()).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn stalled_origin_does_not_block_other_clients() {
        // accepts one request and answers nothing until released
        let stalled = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stalled_addr = stalled.local_addr().unwrap();
        let (accepted_tx, accepted_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let stalled_origin = tokio::spawn(async move {
            let (stream, _) = stalled.accept().await.unwrap();
            accepted_tx.send(()).unwrap();
            let _ = release_rx.await;
            drop(stream);
        });

        let (origin_addr, origin) = origin("HTTP/1.0 200 OK\r\nContent-Length: 2\r\n\r\nok").await;
        let (proxy, stop, server) = start_proxy().await;

        let mut slow_client = TcpStream::connect(proxy).await.unwrap();
        slow_client.write_all(format!("GET http://{stalled_addr}/ HTTP/1.0\r\n\r\n").as_bytes()).await.unwrap();
        accepted_rx.await.unwrap();

        let request = format!("GET http://{origin_addr}/ HTTP/1.0\r\n\r\n");
        let response = tokio::time::timeout(Duration::from_secs(5), roundtrip(proxy, &request)).await.unwrap();
        assert_eq!(response, "HTTP/1.0 200 OK\r\nContent-Length: 2\r\n\r\nok");
        origin.await.unwrap();

        release_tx.send(()).unwrap();
        stalled_origin.await.unwrap();
        let mut slow_response = String::new();
        slow_client.read_to_string(&mut slow_response).await.unwrap();
        assert!(slow_response.starts_with("HTTP/1.0 502 Bad Gateway\r\n"));

        stop.send(()).unwrap();
        server.await.unwrap();
    }

    #[test]
    fn builder_validation() {
        assert!(matches!(ProxyServer::builder().build(), Err(ServerBuildError::MissingAddress)));
        assert!(matches!(
            ProxyServer::builder().address(([127, 0, 0, 1], 0)).workers(0).build(),
            Err(ServerBuildError::Config(ConfigError::ZeroWorkers))
        ));
        assert!(matches!(
            ProxyServer::builder().address(([127, 0, 0, 1], 0)).connect_timeout(Duration::ZERO).build(),
            Err(ServerBuildError::Config(ConfigError::ZeroConnectTimeout))
        ));
    }

    #[test]
    fn builder_from_config() {
        let config = ProxyConfig::try_parse_from(["micro-proxy", "-p", "3128", "-m", "8"]).unwrap();
        let server = ProxyServer::builder().config(&config).build().unwrap();
        assert_eq!(server.address(), "0.0.0.0:3128".parse().unwrap());
        assert_eq!(server.workers, 8);
    }
}
