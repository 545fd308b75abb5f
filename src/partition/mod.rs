//! Date slicing module
//!
//! Settlement streams are read one calendar day at a time. This module owns
//! the two pieces of state that drive an incremental read:
//!
//! - `DateSlice` - a single day to request
//! - `StreamCursor` - the last day whose pages were all consumed
//!
//! `SlicePlan` combines the configured bounds, an optional lookback window
//! and a persisted cursor into an ascending, gap-free sequence of slices.

mod routers;
mod types;

pub use routers::{DailySlices, SlicePlan};
pub use types::{DateSlice, StreamCursor};
