//! Failure surfaces that can escape [`crate::server::Server::bind`] and
//! [`crate::server::Server::install_signal_handlers`]. A connection's own
//! I/O errors never reach this type -- they end that connection (logged
//! via `tracing`, not propagated) without affecting the listener or any
//! other connection. Non-fatal, retry-driving conditions (producer
//! backpressure, parser "need more data", operation aborted by
//! [`tokio_util::sync::CancellationToken`]) are likewise not represented
//! here -- they are control flow, handled internally.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("error resolving bind address {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error binding to {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("error installing signal handler: {0}")]
    SignalHandler(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
