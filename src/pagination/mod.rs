//! Pagination module
//!
//! Settlement endpoints paginate with a `next_page` URL in the response
//! envelope. The query string of that URL carries everything the next
//! request needs, so its pairs replace the request parameters wholesale.

mod strategies;
mod types;

pub use strategies::{parse_query_params, NextPageUrlPaginator};
pub use types::{NextPage, PaginationState, Paginator};
