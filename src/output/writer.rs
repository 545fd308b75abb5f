//! Message sinks

use crate::engine::Message;
use crate::error::Result;
use std::io::Write;

/// Destination for messages produced by a sync
pub trait MessageSink: Send {
    /// Emit one message
    fn emit(&mut self, message: Message) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// Writes each message as one line of JSON
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write + Send> {
    writer: W,
    written: usize,
}

impl<W: Write + Send> JsonLinesWriter<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of messages written
    pub fn written(&self) -> usize {
        self.written
    }

    /// Unwrap the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageSink for JsonLinesWriter<W> {
    fn emit(&mut self, message: Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &message.to_json())?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        // state lines must reach the consumer before the next slice starts
        if message.is_state() {
            self.writer.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
