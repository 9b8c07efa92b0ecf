// src/buffer.rs

//! Concurrency-safe line buffer for task output.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Accumulates bytes written by a task body into completed lines plus one
/// in-progress partial line.
///
/// The body's tokio task writes while the reporting path reads; both go
/// through a single internal mutex that is held only for the duration of one
/// append or one snapshot. A buffer grows for the lifetime of its task and is
/// never truncated.
#[derive(Debug, Default)]
pub struct LineBuffer {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Completed lines, each including its trailing newline.
    lines: Vec<String>,
    /// Bytes of the current, unterminated line.
    current: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Writers never panic while holding the lock; poisoning would be a
        // bug in this file.
        self.inner.lock().expect("line buffer lock poisoned")
    }

    /// Append bytes. Every `\n` closes the current partial line; all other
    /// bytes extend it. Never fails.
    ///
    /// Non-UTF-8 input is lossily converted at line boundaries.
    pub fn write(&self, bytes: &[u8]) {
        let mut inner = self.lock();
        for &b in bytes {
            inner.current.push(b);
            if b == b'\n' {
                let line = String::from_utf8_lossy(&inner.current).into_owned();
                inner.lines.push(line);
                inner.current.clear();
            }
        }
    }

    /// Snapshot of every completed line, followed by the partial line if it
    /// is non-empty.
    pub fn all_lines(&self) -> Vec<String> {
        let inner = self.lock();
        let mut lines = inner.lines.clone();
        if !inner.current.is_empty() {
            lines.push(String::from_utf8_lossy(&inner.current).into_owned());
        }
        lines
    }

    /// The last `min(n, total)` lines of the [`all_lines`](Self::all_lines)
    /// snapshot. `tail(0)` is empty.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines = self.all_lines();
        let skip = lines.len().saturating_sub(n);
        lines[skip..].to_vec()
    }

    /// Number of completed lines (excludes the partial line).
    pub fn completed_lines(&self) -> usize {
        self.lock().lines.len()
    }
}

impl fmt::Display for LineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.all_lines() {
            f.write_str(&line)?;
        }
        Ok(())
    }
}
