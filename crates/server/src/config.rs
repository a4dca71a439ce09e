//! Command line configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing::Level;

/// A small HTTP/1.0 forwarding proxy.
#[derive(Parser, Debug, Clone)]
#[command(name = "micro-proxy", author, version, about, long_about = None)]
pub struct ProxyConfig {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Address to bind the listener to
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Number of workers serving clients concurrently
    #[arg(short = 'm', long, default_value_t = 4)]
    pub max_client_threads: usize,

    /// Upstream connect timeout, in seconds
    #[arg(long, default_value_t = 10)]
    pub connect_timeout: u64,

    /// Redirects followed before the last one is returned to the client
    #[arg(long, default_value_t = 5)]
    pub max_redirects: usize,

    /// Most verbose log level written (trace, debug, info, warn, error)
    #[arg(long, default_value_t = Level::INFO)]
    pub log_level: Level,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one client worker is required")]
    ZeroWorkers,

    #[error("connect timeout must be greater than zero")]
    ZeroConnectTimeout,
}

impl ProxyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_client_threads == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.connect_timeout == 0 {
            return Err(ConfigError::ZeroConnectTimeout);
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProxyConfig::try_parse_from(["micro-proxy"]).unwrap();

        assert_eq!(config.listen_addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.max_client_threads, 4);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn short_and_long_flags() {
        let config = ProxyConfig::try_parse_from(["micro-proxy", "-p", "3128", "-m", "16", "--bind", "127.0.0.1", "--log-level", "debug"]).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:3128".parse().unwrap());
        assert_eq!(config.max_client_threads, 16);
        assert_eq!(config.log_level, Level::DEBUG);

        let config = ProxyConfig::try_parse_from(["micro-proxy", "--port", "81", "--max-client-threads", "2", "--max-redirects", "0"]).unwrap();
        assert_eq!(config.port, 81);
        assert_eq!(config.max_client_threads, 2);
        assert_eq!(config.max_redirects, 0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ProxyConfig::try_parse_from(["micro-proxy", "-p", "70000"]).is_err());
        assert!(ProxyConfig::try_parse_from(["micro-proxy", "--unknown"]).is_err());

        let config = ProxyConfig::try_parse_from(["micro-proxy", "-m", "0"]).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroWorkers));

        let config = ProxyConfig::try_parse_from(["micro-proxy", "--connect-timeout", "0"]).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroConnectTimeout));
    }
}
