//! Source trait and the settlement source
//!
//! `Source` is the operation set every source exposes: describe its
//! configuration, check connectivity, list streams, and read them.
//! `SettlementSource` implements it for the settlement report API.

use crate::config::{SourceConfig, ValidatedConfig};
use crate::decode::{EnvelopeDecoder, RecordDecoder};
use crate::engine::{SyncEngine, SyncStats};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::output::MessageSink;
use crate::state::StateManager;
use crate::streams::{Catalog, SettlementStream, StreamKind};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{error, info, warn};

/// Days covered by the connectivity probe, inclusive of the start date
pub const CHECK_WINDOW_DAYS: u64 = 10;

/// Message for a probe window without settlements
pub const NO_DATA_MESSAGE: &str = "Could not check connection without data for chosen date. \
     Please change value for replication start date field.";

// ============================================================================
// Connector Spec
// ============================================================================

/// Source specification returned by `spec()`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSpec {
    /// Documentation link
    pub documentation_url: String,
    /// JSON Schema of the configuration
    pub connection_specification: Value,
    /// Whether incremental reads are supported
    pub supports_incremental: bool,
}

// ============================================================================
// Check Result
// ============================================================================

/// Outcome of a connection check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    /// The API answered with data
    Succeeded,
    /// The API answered but the probe window had no settlements
    NoData,
    /// Any other failure
    Failed,
}

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Outcome
    pub status: CheckStatus,
    /// Explanation for anything but success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            status: CheckStatus::Succeeded,
            message: None,
        }
    }

    /// Create a no-data check result
    pub fn no_data() -> Self {
        Self {
            status: CheckStatus::NoData,
            message: Some(NO_DATA_MESSAGE.to_string()),
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Failed,
            message: Some(message.into()),
        }
    }

    /// Whether the check succeeded
    pub fn is_success(&self) -> bool {
        self.status == CheckStatus::Succeeded
    }
}

// ============================================================================
// Source Trait
// ============================================================================

/// Operations every source implements
#[async_trait]
pub trait Source: Send + Sync {
    /// Configuration specification
    fn spec(&self) -> ConnectorSpec;

    /// Tests if credentials and configuration can reach the API
    async fn check(&self) -> CheckResult;

    /// Lists available streams
    fn discover(&self) -> Catalog;

    /// Reads the selected streams (all when `streams` is empty), resuming
    /// from and checkpointing into `state`
    async fn read(
        &self,
        state: &StateManager,
        streams: &[String],
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats>;
}

// ============================================================================
// Settlement Source
// ============================================================================

/// Source for daily settlement summaries and events
#[derive(Debug, Clone)]
pub struct SettlementSource {
    config: ValidatedConfig,
    http: HttpClientConfig,
    today: Option<NaiveDate>,
}

impl SettlementSource {
    /// Create a source for validated settings
    pub fn new(config: ValidatedConfig) -> Self {
        let http = HttpClientConfig::builder()
            .base_url(config.base_url())
            .build();
        Self {
            config,
            http,
            today: None,
        }
    }

    /// Validate raw settings and create a source
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self::new(config.validate()?))
    }

    /// Use a custom HTTP configuration, keeping its base URL if set
    #[must_use]
    pub fn with_http_config(mut self, mut http: HttpClientConfig) -> Self {
        if http.base_url.is_none() {
            http.base_url = Some(self.config.base_url().to_string());
        }
        self.http = http;
        self
    }

    /// Pin the date treated as today
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Validated settings
    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// All configured streams in read order
    pub fn streams(&self) -> Vec<SettlementStream> {
        StreamKind::ALL
            .into_iter()
            .map(|kind| SettlementStream::new(kind, &self.config))
            .collect()
    }

    /// Streams to read for a selection; an empty selection means all
    pub fn select_streams(&self, names: &[String]) -> Result<Vec<SettlementStream>> {
        if names.is_empty() {
            return Ok(self.streams());
        }
        let kinds = names
            .iter()
            .map(|name| name.parse::<StreamKind>())
            .collect::<Result<Vec<_>>>()?;
        // keep read order stable regardless of selection order
        Ok(StreamKind::ALL
            .into_iter()
            .filter(|kind| kinds.contains(kind))
            .map(|kind| SettlementStream::new(kind, &self.config))
            .collect())
    }

    /// Configuration specification, available before any settings exist
    pub fn connector_spec() -> ConnectorSpec {
        ConnectorSpec {
            documentation_url: "https://docs.airbyte.io/integrations/sources/affirm".to_string(),
            connection_specification: SourceConfig::json_schema(),
            supports_incremental: true,
        }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn client(&self) -> Result<HttpClient> {
        HttpClient::with_auth(self.http.clone(), self.config.auth.clone())
    }

    /// One ranged request against the summary endpoint
    async fn probe(&self) -> Result<usize> {
        let stream =
            SettlementStream::new(StreamKind::Summary, &self.config).with_page_limit(Some(1));
        let after = self.config.start_date;
        let before = after
            .checked_add_days(Days::new(CHECK_WINDOW_DAYS - 1))
            .ok_or_else(|| Error::invalid_date("start_date", after.to_string()))?;

        let request = RequestConfig::new()
            .with_query(stream.range_params(after, before))
            .header("accept", "*/*");
        let response = self.client()?.get_with_config(stream.path(), request).await?;
        let body = response.text().await?;
        Ok(EnvelopeDecoder::default().decode(&body)?.records.len())
    }
}

#[async_trait]
impl Source for SettlementSource {
    fn spec(&self) -> ConnectorSpec {
        Self::connector_spec()
    }

    async fn check(&self) -> CheckResult {
        match self.probe().await {
            Ok(0) => {
                error!("{NO_DATA_MESSAGE}");
                CheckResult::no_data()
            }
            Ok(_) => CheckResult::success(),
            Err(e) => {
                warn!(error = %e, "Connection check failed");
                CheckResult::failure(e.to_string())
            }
        }
    }

    fn discover(&self) -> Catalog {
        Catalog {
            streams: self.streams().iter().map(SettlementStream::catalog_entry).collect(),
        }
    }

    async fn read(
        &self,
        state: &StateManager,
        streams: &[String],
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        let selected = self.select_streams(streams)?;
        let today = self.today();
        let mut engine = SyncEngine::new(self.client()?, state.clone());

        for stream in &selected {
            engine.sync_stream(stream, today, sink).await?;
        }

        let mut stats = engine.into_stats();
        #[allow(clippy::cast_possible_truncation)]
        stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            streams = stats.streams_synced,
            slices = stats.slices_synced,
            pages = stats.pages_fetched,
            records = stats.records_synced,
            duration_ms = stats.duration_ms,
            "Read complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Message;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> SettlementSource {
        let config = SourceConfig::from_json_value(json!({
            "user": "pub",
            "password": "priv",
            "start_date": "2024-01-01",
            "end_date": "2024-01-02",
            "affirm_country": "AU",
            "merchant_type": "e-commerce",
            "merchant_id": "M-7",
            "api_page_limit": 100
        }))
        .unwrap();
        let http = HttpClientConfig::builder()
            .base_url(server.uri())
            .max_retries(0)
            .no_rate_limit()
            .build();
        SettlementSource::from_config(&config)
            .unwrap()
            .with_http_config(http)
            .with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[test]
    fn test_check_result_constructors() {
        assert!(CheckResult::success().is_success());
        let no_data = CheckResult::no_data();
        assert_eq!(no_data.status, CheckStatus::NoData);
        assert!(no_data.message.unwrap().contains("start date"));
        assert_eq!(
            serde_json::to_value(CheckResult::failure("boom")).unwrap(),
            json!({"status": "FAILED", "message": "boom"})
        );
    }

    #[tokio::test]
    async fn test_spec_and_discover() {
        let server = MockServer::start().await;
        let source = source(&server);

        let spec = serde_json::to_value(source.spec()).unwrap();
        assert_eq!(
            spec["connectionSpecification"]["properties"]["affirm_country"]["enum"],
            json!(["US", "CA", "AU"])
        );

        let names: Vec<_> = source
            .discover()
            .streams
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["events", "summary"]);
    }

    #[test]
    fn test_default_base_url_follows_region() {
        let config = SourceConfig::from_json_value(json!({
            "user": "u",
            "password": "p",
            "start_date": "2024-01-01",
            "affirm_country": "CA",
            "merchant_type": "in-store",
            "merchant_id": "M"
        }))
        .unwrap();
        let source = SettlementSource::from_config(&config).unwrap();
        assert_eq!(
            source.http.base_url.as_deref(),
            Some("https://api.affirm.ca/api/v1")
        );
    }

    #[tokio::test]
    async fn test_select_streams() {
        let server = MockServer::start().await;
        let source = source(&server);

        let selected = source
            .select_streams(&["summary".to_string(), "events".to_string()])
            .unwrap();
        assert_eq!(selected[0].name(), "events");
        assert_eq!(selected.len(), 2);

        assert!(matches!(
            source.select_streams(&["bogus".to_string()]).unwrap_err(),
            Error::StreamNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_check_succeeds_with_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/settlements/daily"))
            .and(basic_auth("pub", "priv"))
            .and(query_param("after", "2024-01-01"))
            .and(query_param("before", "2024-01-10"))
            .and(query_param("limit", "1"))
            .and(query_param("merchant_id", "M-7"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "s1"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(source(&server).check().await, CheckResult::success());
    }

    #[tokio::test]
    async fn test_check_no_data_is_distinct() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"next_page": null})))
            .mount(&server)
            .await;

        assert_eq!(source(&server).check().await.status, CheckStatus::NoData);
    }

    #[tokio::test]
    async fn test_check_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let result = source(&server).check().await;
        assert_eq!(result.status, CheckStatus::Failed);
        assert!(result.message.unwrap().contains("401"));
    }

    #[tokio::test]
    async fn test_read_selected_stream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/settlements/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "e"}]})))
            .expect(2)
            .mount(&server)
            .await;

        let state = StateManager::in_memory();
        let mut sink: Vec<Message> = Vec::new();
        let stats = source(&server)
            .read(&state, &["events".to_string()], &mut sink)
            .await
            .unwrap();

        assert_eq!(stats.streams_synced, 1);
        assert_eq!(stats.slices_synced, 2);
        assert_eq!(stats.records_synced, 2);
        assert_eq!(
            state.get_cursor("events").await.unwrap().to_string(),
            "2024-01-02"
        );
        assert!(state.get_cursor("summary").await.is_none());
    }
}
