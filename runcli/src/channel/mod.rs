//! Channel layer for pattern matching over an interactive stream.
//!
//! This module turns a raw byte transport into expect-style operations:
//! write a line, then wait for the first of several patterns with a
//! bounded timeout.

mod buffer;
mod patterns;
mod pty;

pub use buffer::PatternBuffer;
pub use patterns::{PatternMatch, PatternSet};
pub use pty::{ChannelConfig, Expect, LogFailureHook, PtyChannel};
