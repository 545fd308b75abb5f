//! Execution engine module
//!
//! Main read loop for settlement streams.
//!
//! # Overview
//!
//! For each daily slice of a stream the engine requests every page, emits
//! the records, and only then advances and persists the cursor and emits a
//! STATE message. A run that fails mid-slice therefore resumes at that slice.
//!
//! Requests are issued strictly one at a time.

mod types;

pub use types::{Message, SyncStats};

use crate::decode::{DecodedPage, EnvelopeDecoder, RecordDecoder};
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::output::MessageSink;
use crate::pagination::{NextPage, NextPageUrlPaginator, PaginationState, Paginator};
use crate::partition::{DateSlice, StreamCursor};
use crate::state::StateManager;
use crate::streams::SettlementStream;
use crate::types::QueryParams;
use chrono::NaiveDate;
use std::time::Instant;
use tracing::{debug, info};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    client: HttpClient,
    state: StateManager,
    decoder: Box<dyn RecordDecoder>,
    paginator: Box<dyn Paginator>,
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient, state: StateManager) -> Self {
        Self {
            client,
            state,
            decoder: Box::new(EnvelopeDecoder::default()),
            paginator: Box::new(NextPageUrlPaginator::default()),
            stats: SyncStats::default(),
        }
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Consume the engine, returning its statistics
    pub fn into_stats(self) -> SyncStats {
        self.stats
    }

    /// Sync every slice of one stream from its persisted cursor through `today`
    pub async fn sync_stream(
        &mut self,
        stream: &SettlementStream,
        today: NaiveDate,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let start = Instant::now();
        let name = stream.name();
        let mut cursor = self.state.get_cursor(name).await;

        info!(stream = name, cursor = ?cursor.map(|c| c.to_string()), "Starting sync");

        let records_before = self.stats.records_synced;
        let mut slices = stream.slices(cursor, today).peekable();
        if slices.peek().is_none() {
            sink.emit(Message::info(format!(
                "Stream {name} has no days to sync up to {}",
                stream.plan().effective_end(today)
            )))?;
        }
        for slice in slices {
            self.sync_slice(stream, &slice, sink).await?;

            let next = StreamCursor::advance(cursor, &slice);
            self.state.set_cursor(name, next).await?;
            sink.emit(Message::state(
                name,
                self.state.stream_state(name).await.to_value(),
            ))?;
            cursor = Some(next);
            self.stats.add_slice();
        }
        sink.flush()?;

        self.stats.add_stream();
        #[allow(clippy::cast_possible_truncation)]
        self.stats
            .set_duration(self.stats.duration_ms + start.elapsed().as_millis() as u64);

        info!(
            stream = name,
            records = self.stats.records_synced - records_before,
            "Completed sync"
        );
        Ok(())
    }

    /// Fetch every page of one slice and emit its records
    pub async fn sync_slice(
        &mut self,
        stream: &SettlementStream,
        slice: &DateSlice,
        sink: &mut dyn MessageSink,
    ) -> Result<usize> {
        let mut params = stream.request_params(slice);
        let mut pagination = PaginationState::new();

        loop {
            let page = self.fetch_page(stream.path(), params).await?;
            let count = page.records.len();

            self.stats.add_page();
            self.stats.add_records(count);
            if page.missing_records {
                sink.emit(Message::warn(format!(
                    "Stream {} got no data field for {slice}, page treated as empty",
                    stream.name()
                )))?;
            }
            for record in page.records {
                sink.emit(Message::record(stream.name(), record))?;
            }

            debug!(
                stream = stream.name(),
                slice = %slice,
                page = pagination.pages + 1,
                records = count,
                "Fetched page"
            );

            match self.paginator.process_response(&page.body, count, &mut pagination)? {
                NextPage::Continue { query_params } => params = query_params,
                NextPage::Done => break,
            }
        }

        Ok(pagination.total_fetched as usize)
    }

    async fn fetch_page(&self, path: &str, params: QueryParams) -> Result<DecodedPage> {
        let request = RequestConfig::new()
            .with_query(params)
            .header("accept", "*/*");
        let response = self.client.get_with_config(path, request).await?;
        let body = response.text().await?;
        self.decoder.decode(&body)
    }
}
