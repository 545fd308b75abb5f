//! CLI module
//!
//! Command-line interface for the settlement source.
//!
//! # Commands
//!
//! - `spec` - Print the configuration schema
//! - `check` - Test connection to the API
//! - `discover` - List available streams
//! - `read` - Extract data from streams
//! - `resolve` - Print a YAML file with all tokens resolved

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
