use std::fmt;

/// Port used when a URL or `Host` header does not carry one.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// The upstream a single hop talks to.
///
/// Derived for every hop (the client's request, then every followed redirect) and
/// never stored beyond it. `path` always starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: u16,
    path: String,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self { host: host.into(), port, path: path.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The value written into the upstream `Host` header.
    ///
    /// The port suffix is omitted only for port 80.
    pub fn host_header(&self) -> String {
        if self.port == DEFAULT_HTTP_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.host, self.port, self.path)
    }
}
