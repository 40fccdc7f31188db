//! Ordered candidate patterns for expect-style matching.

use regex::bytes::Regex;

/// A match found by [`PatternSet::find_earliest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<K> {
    /// Key of the pattern that matched.
    pub key: K,
    /// Byte offset where the match starts.
    pub start: usize,
    /// Byte offset where the match ends.
    pub end: usize,
}

/// An ordered set of patterns, each tagged with a caller-chosen key.
///
/// Keys let callers dispatch on *what* matched instead of on a positional
/// index into the candidate list.
#[derive(Debug, Clone)]
pub struct PatternSet<K> {
    entries: Vec<(K, Regex)>,
}

impl<K: Copy> PatternSet<K> {
    /// Create an empty pattern set.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a candidate pattern.
    pub fn with(mut self, key: K, pattern: Regex) -> Self {
        self.entries.push((key, pattern));
        self
    }

    /// Find the candidate whose match starts earliest in `data`.
    ///
    /// When two candidates match at the same offset, the one added first
    /// wins.
    pub fn find_earliest(&self, data: &[u8]) -> Option<PatternMatch<K>> {
        let mut best: Option<PatternMatch<K>> = None;
        for (key, pattern) in &self.entries {
            let Some(m) = pattern.find(data) else {
                continue;
            };
            if best.is_none_or(|b| m.start() < b.start) {
                best = Some(PatternMatch {
                    key: *key,
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
        best
    }

    /// Iterate over the keys in candidate order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set has no candidates.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Copy> Default for PatternSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
