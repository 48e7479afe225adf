//! Answer framing for the connection loop.

use std::io::Write;

use crate::protocol::Answer;

use super::errors::DispatchError;

/// Writes one JSON line per answer and flushes it immediately.
pub struct ResponseWriter<W> {
    writer: W,
    written: usize,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps `writer` with an empty byte count.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Writes `answer` as a newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation, writing or flushing fails.
    pub fn write_answer(&mut self, answer: &Answer) -> Result<(), DispatchError> {
        let line = answer.to_line()?;
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        self.written += line.len();
        Ok(())
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}
