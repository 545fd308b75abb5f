//! State management module
//!
//! Persists the per-stream date cursor between runs so an interrupted or
//! scheduled sync resumes where the last one stopped.
//!
//! Persisted shape:
//!
//! ```json
//! { "streams": { "summary": { "date": "2024-01-31" } } }
//! ```

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{State, StreamState, CURSOR_FIELD};
