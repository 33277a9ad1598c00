//! Bounded scrollback for an interactive session.
//!
//! Normalized output chunks are appended in arrival order; when the
//! ring is full the oldest chunk is evicted. The whole buffer is
//! dropped when the session closes.

use std::collections::VecDeque;

/// Ring of normalized output chunks
#[derive(Debug)]
pub struct Scrollback {
    chunks: VecDeque<String>,
    cap: usize,
}

impl Scrollback {
    /// Create a scrollback holding at most `cap` chunks
    pub fn new(cap: usize) -> Self {
        Self {
            chunks: VecDeque::with_capacity(cap.min(64)),
            cap,
        }
    }

    /// Append a chunk, evicting the oldest when full.
    ///
    /// Chunks that normalized down to nothing are skipped.
    pub fn push(&mut self, chunk: String) {
        if chunk.is_empty() {
            return;
        }
        if self.chunks.len() == self.cap {
            self.chunks.pop_front();
        }
        self.chunks.push_back(chunk);
    }

    /// Iterate chunks oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(String::as_str)
    }

    /// The whole buffer as one string
    pub fn contents(&self) -> String {
        self.chunks.iter().map(String::as_str).collect()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Number of retained chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether nothing is retained
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
