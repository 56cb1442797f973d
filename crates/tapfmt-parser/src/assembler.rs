//! Line assembly for arbitrarily-chunked input.
//!
//! TAP arrives as a byte stream whose delivery boundaries have nothing to do
//! with line boundaries. [`LineAssembler`] buffers the trailing partial line
//! across `push` calls so the parser only ever sees complete lines, in input
//! order. A trailing `\r` is stripped so CRLF streams classify the same as LF.

/// Splits a stream of text fragments into complete, newline-stripped lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: String,
}

impl LineAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and drain every complete line it finishes.
    ///
    /// Whatever follows the last newline stays buffered until the next call
    /// or [`finish`](Self::finish).
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    /// End of stream. TAP producers are not required to emit a trailing
    /// newline, so any retained partial line is yielded as a final line.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buffer);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }
}
