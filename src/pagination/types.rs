//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::error::Result;
use crate::types::QueryParams;
use serde_json::Value;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available; these parameters replace the previous ones
    Continue {
        /// Complete query parameters for the next request
        query_params: QueryParams,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params(params: QueryParams) -> Self {
        Self::Continue {
            query_params: params,
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Tracks pagination progress within one slice
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages processed so far
    pub pages: u32,
    /// Total records fetched so far
    pub total_fetched: u64,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed page
    pub fn add_page(&mut self, records: usize) {
        self.pages += 1;
        self.total_fetched += records as u64;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Process a response body and determine if there's a next page
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> Result<NextPage>;
}
