//! The top-level server: owns the acceptor, the connection manager, and
//! the termination-signal wiring.
//!
//! Grounded on `original_source`'s `server` class (`m_io_service`,
//! `m_signals`, `m_acceptor`, `start_accept`/`handle_accept`,
//! `handle_stop`) for the accept-loop/shutdown shape, and on
//! `crates/rqbit/src/main.rs`'s SIGINT/SIGTERM wiring (a dedicated
//! `signal-hook` thread feeding a `tokio_util::sync::CancellationToken`)
//! for how that shape is actually expressed with `tokio` instead of
//! Boost.Asio's `signal_set`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::connection::Connection;
use crate::connmgr::ConnectionManager;
use crate::error::{Error, Result};
use crate::producer::Producer;

/// The HTTP/1.1 streaming gateway server.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    /// Accepted for API compatibility; not consulted by the core logic,
    /// since files are fetched entirely through `producer`.
    #[allow(dead_code)]
    doc_root: String,
    producer: Arc<dyn Producer>,
    manager: Arc<ConnectionManager>,
    shutdown: CancellationToken,
}

impl Server {
    /// Resolve `bind_addr:port`, open an acceptor with address reuse,
    /// bind, and listen. Does not install signal handlers -- call
    /// [`Server::install_signal_handlers`] explicitly so that embedders
    /// who want their own signal wiring can skip it.
    pub async fn bind(
        bind_addr: &str,
        port: u16,
        doc_root: impl Into<String>,
        producer: Arc<dyn Producer>,
    ) -> Result<Self> {
        let addr_str = format!("{bind_addr}:{port}");
        let addr: SocketAddr = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| Error::Resolve {
                addr: addr_str.clone(),
                source: e,
            })?
            .next()
            .ok_or_else(|| Error::Resolve {
                addr: addr_str.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved"),
            })?;

        let socket = if addr.is_ipv4() {
            tokio::net::TcpSocket::new_v4()
        } else {
            tokio::net::TcpSocket::new_v6()
        }
        .map_err(|e| Error::Bind { addr, source: e })?;
        socket.set_reuseaddr(true).map_err(|e| Error::Bind { addr, source: e })?;
        socket.bind(addr).map_err(|e| Error::Bind { addr, source: e })?;
        let listener = socket.listen(1024).map_err(|e| Error::Bind { addr, source: e })?;
        let local_addr = listener.local_addr().map_err(|e| Error::Bind { addr, source: e })?;

        info!(%local_addr, "listening");

        Ok(Self {
            listener,
            local_addr,
            doc_root: doc_root.into(),
            producer,
            manager: Arc::new(ConnectionManager::new()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Install a SIGINT/SIGTERM/SIGQUIT handler (where available) on a
    /// dedicated OS thread that calls [`Server::stop`] on the first
    /// signal and forces `std::process::exit` on a second, mirroring
    /// `crates/rqbit/src/main.rs`'s double-signal escape hatch.
    #[cfg(unix)]
    pub fn install_signal_handlers(&self) -> Result<()> {
        use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM, SIGQUIT]).map_err(Error::SignalHandler)?;
        let shutdown = self.shutdown.clone();
        let manager = self.manager.clone();
        std::thread::spawn(move || {
            let mut triggered = false;
            for sig in signals.forever() {
                if triggered {
                    warn!(signal = sig, "received signal again, forcing shutdown");
                    std::process::exit(1);
                }
                warn!(signal = sig, "received signal, shutting down");
                shutdown.cancel();
                manager.stop_all();
                triggered = true;
            }
        });
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn install_signal_handlers(&self) -> Result<()> {
        Ok(())
    }

    /// Run the accept loop until [`Server::stop`] is called (or the
    /// process receives a handled signal, if
    /// [`Server::install_signal_handlers`] was called).
    pub async fn run(&self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((socket, peer)) => self.spawn_connection(socket, peer),
                        Err(e) => {
                            warn!(error = %e, "error accepting connection");
                        }
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, socket: tokio::net::TcpStream, peer: SocketAddr) {
        let (id, token) = self.manager.start();
        let producer = self.producer.clone();
        let manager = self.manager.clone();
        tracing::trace!(%peer, "accepted connection");
        tokio::spawn(async move {
            let conn = Connection::new(socket, producer, token);
            conn.run().await;
            manager.remove(id);
        });
    }

    /// Stop accepting new connections and stop every live one.
    pub fn stop(&self) {
        self.shutdown.cancel();
        self.manager.stop_all();
    }

    pub fn live_connection_count(&self) -> usize {
        self.manager.live_count()
    }
}
