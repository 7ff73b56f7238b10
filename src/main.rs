//! filecast: a small HTTP/1.1 server
//!
//! Routes:
//! - `GET /` health check
//! - `GET /echo/{text}` echo
//! - `GET /user-agent` reflects the `User-Agent` header
//! - `GET|POST /files/{name}` file download and upload under `--directory`
//!
//! Features:
//! - gzip response bodies negotiated from `Accept-Encoding`
//! - One task per connection, one request per connection
//! - Configuration via CLI arguments or TOML file

mod config;
mod protocols;
mod server;
mod storage;

use config::Config;
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        listen = %config.listen,
        directory = %config.directory.display(),
        workers = ?config.workers,
        "Starting filecast server"
    );

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.workers.filter(|&n| n > 0) {
        builder.worker_threads(workers);
    }
    let runtime = builder.enable_all().build()?;

    runtime.block_on(async move { Server::new(config).run().await })
}
