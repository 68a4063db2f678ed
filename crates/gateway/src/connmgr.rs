//! Tracks live connections so they can be cleanly stopped on shutdown.
//!
//! Grounded on `original_source`'s `connection_manager`
//! (`std::set<connection_ptr>` + `start`/`stop`/`stop_all`). Ownership of
//! a connection's actual socket/buffers lives in the `tokio` task spawned
//! for it (see [`crate::server::Server`]); the manager here holds only
//! each connection's [`CancellationToken`], which is sufficient to
//! implement `stop`/`stop_all` without the task needing to be awaited.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Opaque identifier for a live connection, handed back by
/// [`ConnectionManager::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

#[derive(Default)]
pub struct ConnectionManager {
    next_id: AtomicU64,
    live: Mutex<HashMap<ConnectionId, CancellationToken>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection's cancellation token and return its id.
    /// Duplicate registration under the same id cannot happen -- ids are
    /// always freshly minted here.
    pub fn start(&self) -> (ConnectionId, CancellationToken) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = CancellationToken::new();
        self.live.lock().insert(id, token.clone());
        (id, token)
    }

    /// Remove and cancel the given connection. A no-op if it is already
    /// gone (e.g. it finished naturally and called [`Self::remove`]
    /// itself, or `stop` was already called).
    pub fn stop(&self, id: ConnectionId) {
        if let Some(token) = self.live.lock().remove(&id) {
            token.cancel();
        }
    }

    /// Remove a finished connection without cancelling it (it is already
    /// done) -- called by the task itself once [`super::connection::Connection::run`]
    /// returns.
    pub fn remove(&self, id: ConnectionId) {
        self.live.lock().remove(&id);
    }

    /// Stop every live connection, then clear the live-set. Snapshots the
    /// current connections first so that a connection cancelling (and
    /// thus racing to call [`Self::remove`]) during iteration is safe.
    pub fn stop_all(&self) {
        let tokens: Vec<CancellationToken> = {
            let mut live = self.live.lock();
            let tokens = live.values().cloned().collect();
            live.clear();
            tokens
        };
        for token in tokens {
            token.cancel();
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}
