//! Scripted port double for tests
//!
//! Stands in for the physical serial port behind [`crate::bus::Bus`].
//! Replies are queued ahead of time and handed out byte-by-byte the way a
//! real port would; every write is captured for later inspection. A drained
//! reply queue behaves like a read timeout.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    pending: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
}

/// A scripted in-memory serial port
///
/// Clones share the same reply queue and write log, so a test keeps one
/// handle while the bus owns another.
#[derive(Clone, Default)]
pub struct ScriptedPort {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedPort {
    /// Create an empty scripted port
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the next reads
    pub fn push_reply(&self, bytes: &[u8]) {
        self.inner.lock().pending.extend(bytes.iter().copied());
    }

    /// Everything written so far, one entry per write call
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.lock().writes.clone()
    }

    /// Forget the writes recorded so far
    pub fn clear_writes(&self) {
        self.inner.lock().writes.clear();
    }

    /// Number of queued reply bytes not yet read
    pub fn unread_len(&self) -> usize {
        self.inner.lock().pending.len()
    }
}

impl Read for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        if inner.pending.is_empty() {
            // A real port blocks until its timeout elapses, then fails.
            return Err(io::Error::new(io::ErrorKind::TimedOut, "scripted port drained"));
        }
        let n = buf.len().min(inner.pending.len());
        for slot in buf.iter_mut().take(n) {
            *slot = inner.pending.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

impl Write for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().writes.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
