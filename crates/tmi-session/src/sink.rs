//! The outbound seam between the session and whatever writes its lines.

use crate::SessionError;

/// Accepts the lines a [`Session`](crate::Session) produces.
///
/// Implementations only enqueue: writing to the socket happens elsewhere,
/// so every call returns immediately.
pub trait LineSink {
    /// Queues one protocol line (no terminator).
    fn send_line(&mut self, line: String) -> Result<(), SessionError>;

    /// Asks for the underlying transport to be closed once queued lines
    /// are written.
    fn close(&mut self);
}

/// A [`LineSink`] that buffers lines until the driver drains them.
#[derive(Debug, Default)]
pub struct OutboundBuffer {
    lines: Vec<String>,
    close_requested: bool,
}

impl OutboundBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued line, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    /// Lines queued so far, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}

impl LineSink for OutboundBuffer {
    fn send_line(&mut self, line: String) -> Result<(), SessionError> {
        self.lines.push(line);
        Ok(())
    }

    fn close(&mut self) {
        self.close_requested = true;
    }
}
