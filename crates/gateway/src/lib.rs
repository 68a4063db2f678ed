//! An HTTP/1.1 streaming gateway that exposes files from a pluggable,
//! range-addressable data producer (typically a partially-downloaded
//! BitTorrent payload) as byte-ranged HTTP responses suitable for
//! progressive playback.
//!
//! The BitTorrent engine itself -- session, torrent handles, piece
//! download, DHT -- is out of scope; it is consumed only through the
//! [`producer::Producer`] adapter.

pub mod connection;
pub mod connmgr;
pub mod error;
pub mod fixtures;
pub mod handler;
pub mod mime;
pub mod parser;
pub mod producer;
pub mod request;
pub mod server;
pub mod status;
pub mod util;

pub use connmgr::{ConnectionId, ConnectionManager};
pub use error::{Error, Result};
pub use producer::{Producer, ReadOutcome, ResolveOutcome};
pub use request::Request;
pub use server::Server;
pub use status::{Header, Reply, StatusCode};
