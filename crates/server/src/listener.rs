//! The accept loop feeding the worker pool.

use std::net::SocketAddr;

use micro_proxy::pool::{SubmitError, WorkerPool};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, info, warn};

use crate::error::ServerError;

const LISTEN_BACKLOG: u32 = 1024;

/// An accepted client and its address.
pub type ClientStream = (TcpStream, SocketAddr);

/// A bound listening socket.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Binds `addr` with `SO_REUSEADDR` so a restarted proxy can take its port back
    /// right away. Must be called from within a tokio runtime.
    pub fn bind(addr: SocketAddr) -> Result<Self, ServerError> {
        let socket = if addr.is_ipv4() { TcpSocket::new_v4() } else { TcpSocket::new_v6() }.map_err(|e| ServerError::bind(addr, e))?;
        socket.set_reuseaddr(true).map_err(|e| ServerError::bind(addr, e))?;
        socket.bind(addr).map_err(|e| ServerError::bind(addr, e))?;

        let inner = socket.listen(LISTEN_BACKLOG).map_err(|e| ServerError::bind(addr, e))?;
        let local_addr = inner.local_addr().map_err(|e| ServerError::bind(addr, e))?;
        Ok(Self { inner, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts clients and submits them to `pool` until `shutdown` resolves.
    ///
    /// Returns the number of clients handed to the pool.
    pub async fn run<F>(&self, pool: &WorkerPool<ClientStream>, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut accepted = 0;

        info!(addr = %self.local_addr, "start listening");
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!(accepted, "stop accepting new clients");
                    return accepted;
                }
                result = self.inner.accept() => {
                    let (stream, peer) = match result {
                        Ok(stream_and_addr) => stream_and_addr,
                        Err(e) => {
                            warn!(cause = %e, "failed to accept");
                            continue;
                        }
                    };

                    debug!(%peer, queued = pool.queued(), "accepted client");
                    if let Err(SubmitError((_, peer))) = pool.submit((stream, peer)) {
                        warn!(%peer, "worker pool is shutting down, dropping client");
                        return accepted;
                    }
                    accepted += 1;
                }
            }
        }
    }
}
