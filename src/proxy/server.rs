//! Proxy Listener
//!
//! Accept loop spawning one OS thread per client connection. Every worker
//! shares the same cache store.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::ProxyError;
use crate::proxy::worker;

// == Proxy Server ==
/// Bound forwarding proxy, ready to accept connections.
#[derive(Debug)]
pub struct ProxyServer {
    listener: TcpListener,
    store: Arc<CacheStore>,
    upstream_timeout: Duration,
}

impl ProxyServer {
    /// Binds the listening socket.
    pub fn bind(
        addr: impl ToSocketAddrs,
        store: Arc<CacheStore>,
        upstream_timeout: Duration,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            store,
            upstream_timeout,
        })
    }

    /// Binds `0.0.0.0:<proxy_port>` from configuration.
    pub fn from_config(config: &Config, store: Arc<CacheStore>) -> io::Result<Self> {
        Self::bind(
            SocketAddr::from(([0, 0, 0, 0], config.proxy_port)),
            store,
            config.upstream_timeout(),
        )
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop forever on the calling thread.
    ///
    /// A failed accept or thread spawn drops only that connection.
    pub fn run(self) {
        let mut next_id: u64 = 0;
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    next_id += 1;
                    self.dispatch(stream, next_id);
                }
                Err(err) => warn!(error = %err, "accept failed"),
            }
        }
    }

    /// Runs the accept loop on a dedicated thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("proxy-listener".to_string())
            .spawn(move || self.run())
    }

    fn dispatch(&self, stream: TcpStream, id: u64) {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        info!(peer = %peer, id, "accepted connection");

        let store = Arc::clone(&self.store);
        let timeout = self.upstream_timeout;
        let spawned = thread::Builder::new()
            .name(format!("proxy-worker-{}", id))
            .spawn(move || match worker::serve(stream, &store, timeout) {
                Ok(()) => debug!(peer = %peer, "connection closed"),
                Err(err @ ProxyError::Io(_)) => debug!(peer = %peer, error = %err, "client i/o failed"),
                Err(err) => warn!(peer = %peer, error = %err, "request failed"),
            });

        if let Err(err) = spawned {
            warn!(id, error = %err, "failed to spawn worker thread");
        }
    }
}
