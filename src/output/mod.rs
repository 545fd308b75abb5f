//! Output module
//!
//! Messages leave the engine through a `MessageSink`. The CLI writes them
//! to stdout as JSON lines; tests collect them in a `Vec`.

mod writer;

pub use writer::{JsonLinesWriter, MessageSink};

#[cfg(test)]
mod tests;
