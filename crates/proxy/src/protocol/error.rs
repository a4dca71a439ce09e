use std::io;
use thiserror::Error;

/// Top-level error for one client's trip through the proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("bad client request: {source}")]
    Request { source: ParseError },

    #[error("resolve error: {source}")]
    Resolve {
        #[from]
        source: ResolveError,
    },

    #[error("connect error: {source}")]
    Connect {
        #[from]
        source: ConnectError,
    },

    #[error("upstream response error: {source}")]
    Upstream {
        #[from]
        source: ParseError,
    },

    #[error("send error: {source}")]
    Send {
        #[from]
        source: SendError,
    },
}

impl ProxyError {
    pub fn request(source: ParseError) -> Self {
        Self::Request { source }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("invalid start line: {reason}")]
    InvalidStartLine { reason: String },

    #[error("invalid http method: {method}")]
    InvalidMethod { method: String },

    #[error("empty response from upstream")]
    EmptyResponse,

    #[error("upstream closed after {received} bytes without finishing the response head")]
    IncompleteHead { received: usize },

    #[error("invalid chunk size line: {reason}")]
    InvalidChunkSize { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn invalid_start_line<S: ToString>(str: S) -> Self {
        Self::InvalidStartLine { reason: str.to_string() }
    }

    pub fn invalid_method<S: ToString>(str: S) -> Self {
        Self::InvalidMethod { method: str.to_string() }
    }

    pub fn invalid_chunk_size<S: ToString>(str: S) -> Self {
        Self::InvalidChunkSize { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("failed to write request to upstream: {source}")]
    Upstream { source: io::Error },

    #[error("failed to write to client: {source}")]
    Client { source: io::Error },
}

impl SendError {
    pub fn upstream<E: Into<io::Error>>(e: E) -> Self {
        Self::Upstream { source: e.into() }
    }

    pub fn client<E: Into<io::Error>>(e: E) -> Self {
        Self::Client { source: e.into() }
    }
}

/// Failure to turn a request or a `Location` value into an upstream target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("host header is required for a relative request path")]
    MissingHost,

    #[error("host header is not valid text")]
    InvalidHostHeader,

    #[error("unsupported scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    #[error("not an absolute http url: {url}")]
    InvalidUrl { url: String },

    #[error("request path must start with '/': {path}")]
    InvalidPath { path: String },

    #[error("empty host")]
    EmptyHost,

    #[error("invalid port: {port:?}")]
    InvalidPort { port: String },
}

impl ResolveError {
    pub fn unsupported_scheme<S: ToString>(scheme: S) -> Self {
        Self::UnsupportedScheme { scheme: scheme.to_string() }
    }

    pub fn invalid_url<S: ToString>(url: S) -> Self {
        Self::InvalidUrl { url: url.to_string() }
    }

    pub fn invalid_port<S: ToString>(port: S) -> Self {
        Self::InvalidPort { port: port.to_string() }
    }
}

/// Any reason the upstream could not be reached.
///
/// Callers treat every variant the same way (502); the variants only exist for logging.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("could not connect to {host}:{port}: {source}")]
    Io { host: String, port: u16, source: io::Error },

    #[error("connecting to {host}:{port} timed out after {timeout_ms}ms")]
    Timeout { host: String, port: u16, timeout_ms: u128 },
}

impl ConnectError {
    pub fn io(host: &str, port: u16, source: io::Error) -> Self {
        Self::Io { host: host.to_string(), port, source }
    }

    pub fn timeout(host: &str, port: u16, timeout_ms: u128) -> Self {
        Self::Timeout { host: host.to_string(), port, timeout_ms }
    }
}
