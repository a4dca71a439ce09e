//! The forwarding engine of a small HTTP/1.0 proxy.
//!
//! This crate reads one request head from a client, works out which origin it is
//! meant for, forwards it, and relays the response back byte-for-byte. Redirects are
//! followed by the proxy itself up to a limit, so the client only ever sees the final
//! response. Everything is built on tokio and `tokio_util` codecs.
//!
//! # Modules
//!
//! - [`protocol`]: request, target, response head and error types
//! - [`codec`]: request head decoder, upstream request encoder, response and body relay decoders
//! - [`resolver`]: request or `Location` → `(host, port, path)`
//! - [`connector`]: opening upstream streams
//! - [`connection`]: the per-client state machine
//! - [`pool`]: the fixed worker pool that runs client connections
//!
//! # Example
//!
//! ```no_run
//! use micro_proxy::connection::ClientConnection;
//! use micro_proxy::connector::TcpConnector;
//! use micro_proxy::pool::WorkerPool;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{info, warn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let connector = Arc::new(TcpConnector::default());
//!     let pool = WorkerPool::new(4, move |stream: tokio::net::TcpStream| {
//!         let connector = connector.clone();
//!         async move {
//!             let (reader, writer) = stream.into_split();
//!             match ClientConnection::new(reader, writer).process(connector.as_ref()).await {
//!                 Ok(outcome) => info!(?outcome, "client done"),
//!                 Err(e) => warn!(cause = %e, "client failed"),
//!             }
//!         }
//!     });
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     while let Ok((stream, _)) = listener.accept().await {
//!         if pool.submit(stream).is_err() {
//!             break;
//!         }
//!     }
//!     pool.shutdown().await;
//! }
//! ```

pub mod codec;
pub mod connection;
pub mod connector;
pub mod pool;
pub mod protocol;
pub mod resolver;

mod utils;

#[cfg(test)]
mod mock;
