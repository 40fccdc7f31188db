//! Pattern buffer with tail-search optimization.
//!
//! Prompt patterns are only searched for in the last `search_depth` bytes of
//! the buffer rather than the entire output. For large outputs (full routing
//! tables, `show tech`) this keeps each read cheap.

use bytes::{Bytes, BytesMut};

use super::patterns::{PatternMatch, PatternSet};

/// Buffer for accumulating unconsumed output and searching it for patterns.
#[derive(Debug)]
pub struct PatternBuffer {
    /// Output read from the transport but not yet consumed by a match.
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
        }
    }

    /// Append raw output. Nothing is stripped or rewritten.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Search the tail of the buffer for the earliest match in `patterns`.
    ///
    /// Offsets in the returned match are relative to the whole buffer.
    pub fn search_tail<K: Copy>(&self, patterns: &PatternSet<K>) -> Option<PatternMatch<K>> {
        let offset = self.buffer.len().saturating_sub(self.search_depth);
        patterns.find_earliest(&self.buffer[offset..]).map(|m| PatternMatch {
            key: m.key,
            start: m.start + offset,
            end: m.end + offset,
        })
    }

    /// Consume the buffer up to the end of `m`.
    ///
    /// Returns the bytes before the match and the matched bytes. Anything
    /// after the match stays buffered for the next search.
    pub fn consume_match<K>(&mut self, m: &PatternMatch<K>) -> (Bytes, Bytes) {
        let mut consumed = self.buffer.split_to(m.end);
        let matched = consumed.split_off(m.start);
        (consumed.freeze(), matched.freeze())
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
