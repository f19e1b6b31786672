// src/exec/buffer.rs

//! Growable byte buffer for command output.

use std::io::{ErrorKind, Read};

use tracing::debug;

/// Free space guaranteed before every read.
pub const MIN_HEADROOM: usize = 1024;

/// Result of one [`OutputBuffer::drain`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Drained {
    pub bytes: usize,
    pub eof: bool,
}

/// Output accumulated from one pipe.
///
/// `data` is always `capacity` bytes long; only `data[..len]` is content.
/// Capacity doubles until at least [`MIN_HEADROOM`] bytes are free and is
/// never reduced by [`clear`](Self::clear) or [`consume_front`](Self::consume_front).
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    data: Vec<u8>,
    len: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            data: vec![0; MIN_HEADROOM],
            len: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Drop the first `n` bytes and shift the rest down.
    pub fn consume_front(&mut self, n: usize) {
        let n = n.min(self.len);
        self.data.copy_within(n..self.len, 0);
        self.len -= n;
    }

    /// Keep only the first `n` bytes.
    pub fn truncate(&mut self, n: usize) {
        self.len = self.len.min(n);
    }

    /// Append bytes directly, growing like a read would.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.ensure_free(bytes.len().max(MIN_HEADROOM));
        self.data[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    fn ensure_free(&mut self, free: usize) {
        let required = self.len + free;
        let mut capacity = self.data.len().max(1);
        if capacity >= required {
            return;
        }
        while capacity < required {
            capacity *= 2;
        }
        self.data.resize(capacity, 0);
    }

    /// Read from a non-blocking `reader` until it has nothing more to give.
    ///
    /// - `WouldBlock` ends the loop without EOF.
    /// - A zero-length read, or any error other than `Interrupted`, is EOF.
    /// - `Interrupted` is retried.
    pub fn drain<R: Read + ?Sized>(&mut self, reader: &mut R) -> Drained {
        let mut drained = Drained::default();

        loop {
            self.ensure_free(MIN_HEADROOM);
            match reader.read(&mut self.data[self.len..]) {
                Ok(0) => {
                    drained.eof = true;
                    break;
                }
                Ok(n) => {
                    self.len += n;
                    drained.bytes += n;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, "pipe read failed; treating as end of output");
                    drained.eof = true;
                    break;
                }
            }
        }

        drained
    }
}
