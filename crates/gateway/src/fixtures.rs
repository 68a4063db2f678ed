//! A trivial in-memory [`Producer`] used by the demo binary and by
//! integration tests. Not a spec module -- it carries no BitTorrent logic
//! (no piece tracking, no peer wire protocol); it exists only so this
//! crate is runnable and testable without a real download engine plugged
//! in behind [`Producer`].
//!
//! Grounded on `original_source/libtorrent/src/torrent_server.cpp`'s
//! `request_handle`/`read_handle` (the shape of a minimal adapter
//! implementation) and on `crates/librqbit/src/api.rs`'s `api_stream`
//! (a real producer guarding shared state behind a lock, the pattern this
//! mirrors with `parking_lot::Mutex`).

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::producer::{Producer, ReadOutcome, ResolveOutcome};

struct FileEntry {
    data: Vec<u8>,
    /// Number of leading `read` calls at any offset that should report
    /// "not ready" before real bytes are returned, simulating a payload
    /// that has not finished downloading yet.
    stall_reads_remaining: u32,
}

/// An in-memory file table keyed by `video_index`, each entry reachable
/// at `/<video_index>` or `/<video_index>/<anything>`.
pub struct FileProducer {
    files: Mutex<HashMap<i32, FileEntry>>,
}

impl FileProducer {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, video_index: i32, data: Vec<u8>) {
        self.files.lock().insert(
            video_index,
            FileEntry {
                data,
                stall_reads_remaining: 0,
            },
        );
    }

    /// Like [`Self::insert`], but the first `stalls` reads at any offset
    /// return "not ready" before real data flows -- for exercising the
    /// producer-backpressure retry path.
    pub fn insert_with_stall(&self, video_index: i32, data: Vec<u8>, stalls: u32) {
        self.files.lock().insert(
            video_index,
            FileEntry {
                data,
                stall_reads_remaining: stalls,
            },
        );
    }
}

impl Default for FileProducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Producer for FileProducer {
    fn resolve(&self, _uri: &str, video_index: i32) -> ResolveOutcome {
        let files = self.files.lock();
        match files.get(&video_index) {
            Some(entry) => ResolveOutcome::Found {
                file_size: entry.data.len() as i64,
                video_index,
            },
            None => ResolveOutcome::NotFound,
        }
    }

    fn read(&self, video_index: i32, offset: u64, buf: &mut [u8]) -> ReadOutcome {
        let mut files = self.files.lock();
        let Some(entry) = files.get_mut(&video_index) else {
            return ReadOutcome::Error;
        };
        if entry.stall_reads_remaining > 0 {
            entry.stall_reads_remaining -= 1;
            return ReadOutcome::Produced(0);
        }
        let offset = offset as usize;
        if offset >= entry.data.len() {
            return ReadOutcome::Produced(0);
        }
        let n = buf.len().min(entry.data.len() - offset);
        buf[..n].copy_from_slice(&entry.data[offset..offset + n]);
        ReadOutcome::Produced(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_and_unknown_indices() {
        let p = FileProducer::new();
        p.insert(1, vec![0u8; 100]);
        match p.resolve("/1", 1) {
            ResolveOutcome::Found { file_size, video_index } => {
                assert_eq!(file_size, 100);
                assert_eq!(video_index, 1);
            }
            ResolveOutcome::NotFound => panic!("expected Found"),
        }
        assert!(matches!(p.resolve("/2", 2), ResolveOutcome::NotFound));
    }

    #[test]
    fn read_returns_requested_slice() {
        let p = FileProducer::new();
        p.insert(1, (0..=255u16).map(|v| v as u8).collect());
        let mut buf = [0u8; 10];
        let outcome = p.read(1, 5, &mut buf);
        assert_eq!(outcome, ReadOutcome::Produced(10));
        assert_eq!(buf, [5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
    }

    #[test]
    fn stalls_then_produces() {
        let p = FileProducer::new();
        p.insert_with_stall(1, vec![7u8; 10], 2);
        let mut buf = [0u8; 10];
        assert_eq!(p.read(1, 0, &mut buf), ReadOutcome::Produced(0));
        assert_eq!(p.read(1, 0, &mut buf), ReadOutcome::Produced(0));
        assert_eq!(p.read(1, 0, &mut buf), ReadOutcome::Produced(10));
    }
}
