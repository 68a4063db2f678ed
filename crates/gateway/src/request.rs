//! The wire-level [`Request`] type, parsed by [`crate::parser`] and then
//! mutated in place by [`crate::handler::handle`].

use crate::status::Header;

/// A request received from a client. `method`/`uri` are stored exactly as
/// received -- no canonicalisation. `offset`/`body_size` are populated by
/// the handler; `offset` subsequently advances monotonically as the
/// connection streams bytes.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub uri: String,
    pub http_version_major: u32,
    pub http_version_minor: u32,
    pub headers: Vec<Header>,

    /// Integer parsed from the final path segment of the undecoded URI.
    pub video_index: i32,
    /// Absolute byte offset to start serving from; advances as bytes are streamed.
    pub offset: i64,
    /// Absolute end-sentinel: one past the last byte to serve. Not a length.
    pub body_size: i64,
    pub keep_alive: bool,
    /// Local accept port; informational only.
    pub http_server_port: u16,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive header lookup, first match wins (headers are
    /// order-preserving but not deduplicated on the wire).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}
