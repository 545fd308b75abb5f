// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Settlement Sync
//!
//! Incremental puller for Affirm settlement reports, plus a YAML loader that
//! resolves `${VAR}` and `${secretsmanager:KEY.path}` tokens.
//!
//! ## Features
//!
//! - **Two streams**: settlement `events` and daily `summary`, one slice per day
//! - **Incremental sync**: a date cursor per stream, checkpointed after every slice
//! - **Lookback**: the summary stream re-reads the last days on resume
//! - **Regional endpoints**: US, CA and AU base URLs
//! - **Secret-aware config**: environment and AWS Secrets Manager substitution
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use settlement_sync::{SettlementSource, Source};
//! use settlement_sync::config::SourceConfig;
//! use settlement_sync::state::StateManager;
//!
//! #[tokio::main]
//! async fn main() -> settlement_sync::Result<()> {
//!     let config = SourceConfig::from_json_value(serde_json::json!({
//!         "user": "public-key",
//!         "password": "private-key",
//!         "start_date": "2024-01-01",
//!         "affirm_country": "US",
//!         "merchant_type": "e-commerce",
//!         "merchant_id": "MERCHANT"
//!     }))?;
//!     let source = SettlementSource::from_config(&config)?;
//!
//!     let state = StateManager::new("state.json");
//!     let mut messages = Vec::new();
//!     source.read(&state, &[], &mut messages).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Source Interface                          │
//! │  spec() → ConnectorSpec  check() → CheckResult  discover()      │
//! │  read(state, streams, sink) → SyncStats                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │ Partition │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Basic    │ GET       │ next_page URL │ Daily     │ JSON lines  │
//! │          │ Retry     │               │ Lookback  │             │
//! │          │ Rate Limit│               │           │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Request authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Daily slicing and stream cursors
pub mod partition;

/// Response envelope decoding
pub mod decode;

/// State management and checkpointing
pub mod state;

/// Message sinks
pub mod output;

/// Main execution engine
pub mod engine;

/// Source settings
pub mod config;

/// Settlement streams and catalog
pub mod streams;

/// Source trait and settlement source
pub mod connector;

/// Token-resolving YAML loader
pub mod loader;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use connector::{CheckResult, CheckStatus, SettlementSource, Source};
pub use error::{Error, Result};
pub use loader::SecretResolver;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
