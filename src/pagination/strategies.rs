//! Pagination strategy implementations

use super::types::{NextPage, PaginationState, Paginator};
use crate::error::{Error, Result};
use crate::types::QueryParams;
use serde_json::Value;
use url::Url;

// ============================================================================
// Next Page URL Pagination
// ============================================================================

/// Follows a next-page URL found in the response envelope
///
/// `{ "data": [...], "next_page": "https://.../settlements/daily?page=abc&limit=50" }`
///
/// The continuation is the URL's query string only; the path of the current
/// stream is kept.
#[derive(Debug, Clone)]
pub struct NextPageUrlPaginator {
    /// Envelope field holding the next URL
    pub field: String,
}

impl Default for NextPageUrlPaginator {
    fn default() -> Self {
        Self {
            field: "next_page".to_string(),
        }
    }
}

impl NextPageUrlPaginator {
    /// Create a paginator reading the given envelope field
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Paginator for NextPageUrlPaginator {
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> Result<NextPage> {
        state.add_page(records_count);

        let next_url = match body.get(&self.field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                return Err(Error::decode(format!(
                    "'{}' must be a URL string, got {other}",
                    self.field
                )))
            }
        };

        let Some(url) = next_url else {
            return Ok(NextPage::Done);
        };

        // a link without usable pairs would drop the slice's own parameters
        let params = parse_query_params(url)?;
        if params.is_empty() {
            return Ok(NextPage::Done);
        }
        Ok(NextPage::with_params(params))
    }
}

/// Extract decoded query pairs from an absolute or relative URL
///
/// Pairs with blank values are dropped and a repeated key keeps its last value.
pub fn parse_query_params(raw: &str) -> Result<QueryParams> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse("http://relative.invalid/")?.join(raw)?
        }
        Err(e) => return Err(Error::InvalidUrl(e)),
    };

    Ok(url
        .query_pairs()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect())
}
