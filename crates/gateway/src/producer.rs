//! The producer-adapter contract: two callbacks that decouple this
//! gateway from any particular storage backend -- in practice, a
//! partially-downloaded BitTorrent payload, though the gateway itself
//! never knows that.
//!
//! Expressed as a trait object with two methods rather than two free
//! function pointers, which makes the callbacks easy to hold behind a
//! shared `Arc` across connections and mirrors the shape of the
//! `request_callback`/`read_callback` typedefs this contract is
//! translating from, minus their C++ reference out-parameters.

/// Outcome of [`Producer::resolve`].
#[derive(Debug, Clone, Copy)]
pub enum ResolveOutcome {
    /// `uri` maps to a servable stream of this size, and (possibly
    /// rewritten) video index.
    Found { file_size: i64, video_index: i32 },
    /// `uri` does not map to anything servable.
    NotFound,
}

/// Outcome of [`Producer::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written into the caller's buffer. `n == 0` means
    /// "no data ready yet at this offset -- retry later", the backpressure
    /// contract the connection's body-streaming loop relies on.
    Produced(usize),
    /// Unrecoverable error, or the stream is gone. The connection must be
    /// dropped; no further response-prefix guarantees hold.
    Error,
}

/// Two-callback contract to the data source, invoked from the reactor
/// thread. Implementations must not block past a few milliseconds --
/// return `ReadOutcome::Produced(0)` instead of waiting.
pub trait Producer: Send + Sync {
    /// Determine whether `uri` maps to a servable stream. `video_index`
    /// is the value derived from the request's last path segment; the
    /// producer may return a different one via `ResolveOutcome::Found`.
    fn resolve(&self, uri: &str, video_index: i32) -> ResolveOutcome;

    /// Attempt to fill up to `buf.len()` bytes at `offset`.
    fn read(&self, video_index: i32, offset: u64, buf: &mut [u8]) -> ReadOutcome;
}
