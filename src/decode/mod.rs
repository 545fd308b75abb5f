//! Response decoder module
//!
//! Settlement endpoints answer with a JSON envelope:
//!
//! ```json
//! { "data": [ {...}, {...} ], "next_page": "https://..." }
//! ```
//!
//! The decoder parses the body once and pulls the record array out of the
//! envelope. The parsed body is handed to the paginator as well.

mod decoders;
mod types;

pub use decoders::EnvelopeDecoder;
pub use types::{DecodedPage, RecordDecoder};
