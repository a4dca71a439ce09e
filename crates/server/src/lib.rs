//! Process-level pieces of micro-proxy: command line configuration, logging, signal
//! handling and the listener that feeds accepted clients into the
//! [`micro_proxy`] worker pool.
//!
//! # Example
//!
//! ```no_run
//! use micro_proxy_server::ProxyServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ProxyServer::builder().address(([127, 0, 0, 1], 3128)).workers(8).build().unwrap();
//!     server.start().await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod listener;
pub mod logging;
pub mod server;
pub mod signal;

pub use config::ProxyConfig;
pub use error::ServerError;
pub use server::{ProxyServer, ProxyServerBuilder, ServerBuildError};
