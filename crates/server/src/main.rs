use std::process::ExitCode;

use clap::Parser;
use micro_proxy_server::{ProxyConfig, ProxyServer, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = ProxyConfig::parse();

    if let Err(e) = logging::init(config.log_level) {
        eprintln!("failed to install logger: {e}");
        return ExitCode::FAILURE;
    }

    if let Err(e) = config.validate() {
        error!(cause = %e, "invalid configuration");
        return ExitCode::FAILURE;
    }

    let server = match ProxyServer::builder().config(&config).build() {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "cannot build server");
            return ExitCode::FAILURE;
        }
    };

    match server.start().await {
        Ok(()) => {
            info!("proxy finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(cause = %e, "proxy failed");
            ExitCode::FAILURE
        }
    }
}
