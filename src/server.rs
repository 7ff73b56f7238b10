//! TCP server for handling HTTP connections.
//!
//! Accepts connections and hands each one to its own task. There is no
//! connection limit: every accepted socket gets a task immediately, and
//! a stalled client holds its task until it goes away.

use crate::config::Config;
use crate::protocols::http;
use crate::storage::FileStore;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Listen backlog for the server socket
const LISTEN_BACKLOG: i32 = 1024;

/// Server instance
pub struct Server {
    config: Config,
    store: Arc<FileStore>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        let store = Arc::new(FileStore::new(config.directory.clone()));

        Server { config, store }
    }

    /// Bind the configured listen address. Must be called inside a Tokio runtime.
    pub fn bind(&self) -> io::Result<TcpListener> {
        let addr: SocketAddr = self
            .config
            .listen
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        TcpListener::from_std(create_listener(addr)?)
    }

    /// Start the server and begin accepting connections
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = self.bind()?;
        info!(
            address = %listener.local_addr()?,
            directory = %self.store.root().display(),
            "Server listening"
        );

        self.serve(listener).await;
        Ok(())
    }

    /// Accept connections from `listener` forever.
    pub async fn serve(&self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, "New connection");

                    let store = Arc::clone(&self.store);

                    tokio::spawn(async move {
                        if let Err(e) = http::handle_connection(stream, addr, store).await {
                            debug!(peer = %addr, error = %e, "Connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

/// Create a non-blocking listener with SO_REUSEADDR so a restart can rebind the port.
fn create_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}
