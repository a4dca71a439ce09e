//! Per-client connection handling.
//!
//! [`ClientConnection`] is the dispatch boundary: it reads the request head and rejects
//! anything but GET. [`ProxyConnection`] is the forwarding engine behind it.

mod client_connection;
mod proxy_connection;

pub use client_connection::{ClientConnection, Outcome};
pub use proxy_connection::{Completion, DEFAULT_MAX_REDIRECTS, ProxyConnection, send_error_response};
