//! Incremental Server-Sent Events decoder.
//!
//! Works on raw bytes: a network chunk may end in the middle of a line or of
//! a multi-byte character, so only complete lines are decoded.

use tracing::warn;

/// Longest line held while waiting for its newline. Anything longer is
/// dropped up to the next newline.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// A parsed SSE event.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    fn is_empty(&self) -> bool {
        self.event.is_none() && self.data.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline.
    scanned: usize,
    /// Set while skipping the rest of an oversized line.
    overflowed: bool,
    current: SseEvent,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return any events it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            if self.overflowed {
                self.overflowed = false;
            } else {
                let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
                self.take_line(line.trim_end_matches('\r'), &mut events);
            }
            start = end + 1;
            self.scanned = start;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_LINE_BYTES {
            warn!("SSE line exceeds {} bytes, dropping it", MAX_LINE_BYTES);
            self.buffer.clear();
            self.scanned = 0;
            self.overflowed = true;
        }

        events
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() && !self.overflowed {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw);
            let mut sink = Vec::new();
            self.take_line(line.trim_end_matches('\r'), &mut sink);
        }
        if self.current.is_empty() {
            None
        } else {
            Some(self.current)
        }
    }

    fn take_line(&mut self, line: &str, events: &mut Vec<SseEvent>) {
        if line.is_empty() {
            if !self.current.is_empty() {
                events.push(std::mem::take(&mut self.current));
            }
            return;
        }

        // Comment / keep-alive
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.current.event = Some(value.to_string()),
            "data" => {
                if !self.current.data.is_empty() {
                    self.current.data.push('\n');
                }
                self.current.data.push_str(value);
            }
            _ => {}
        }
    }
}
