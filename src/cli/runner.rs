//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::SourceConfig;
use crate::connector::{SettlementSource, Source};
use crate::error::{Error, Result, ResultExt};
use crate::loader::{AwsSecretsManager, SecretResolver, SecretsBackend};
use crate::output::JsonLinesWriter;
use crate::state::StateManager;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
    secrets: Option<Arc<dyn SecretsBackend>>,
    base_url: Option<String>,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            secrets: None,
            base_url: None,
        }
    }

    /// Use this secrets backend instead of AWS Secrets Manager
    #[must_use]
    pub fn with_secrets(mut self, backend: Arc<dyn SecretsBackend>) -> Self {
        self.secrets = Some(backend);
        self
    }

    /// Send API requests to this base URL instead of the regional one
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Run the CLI command, writing output to stdout
    pub async fn run(&self) -> Result<()> {
        self.run_to(std::io::stdout()).await
    }

    /// Run the CLI command, writing output to `out`
    pub async fn run_to<W: Write + Send>(&self, mut out: W) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(&mut out).await,
            Commands::Check => self.check(&mut out).await,
            Commands::Discover => self.discover(&mut out).await,
            Commands::Read { .. } => self.read(out).await,
            Commands::Resolve { file } => {
                let resolved = self.resolver().await.load_file(file).await?;
                let rendered =
                    serde_yaml::to_string(&resolved).context("Failed to render resolved document")?;
                out.write_all(rendered.as_bytes())?;
                Ok(())
            }
        }
    }

    async fn resolver(&self) -> SecretResolver {
        let backend = match &self.secrets {
            Some(backend) => Arc::clone(backend),
            None => Arc::new(AwsSecretsManager::from_region(self.cli.secrets_region.clone()).await)
                as Arc<dyn SecretsBackend>,
        };
        SecretResolver::new(backend)
    }

    /// Load configuration, resolving tokens
    async fn load_config(&self) -> Result<SourceConfig> {
        let mut resolver = self.resolver().await;
        // inline config takes precedence
        let document = if let Some(inline) = &self.cli.config_json {
            resolver.load_str(inline).await?
        } else if let Some(path) = &self.cli.config {
            resolver.load_file(path).await?
        } else {
            return Err(Error::config("No configuration given; use --config or --config-json"));
        };
        SourceConfig::from_yaml_value(document)
    }

    async fn source(&self) -> Result<SettlementSource> {
        let source = SettlementSource::from_config(&self.load_config().await?)?;
        Ok(match &self.base_url {
            Some(url) => {
                let http = crate::http::HttpClientConfig::builder().base_url(url).build();
                source.with_http_config(http)
            }
            None => source,
        })
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Show spec
    async fn spec(&self, out: &mut impl Write) -> Result<()> {
        let spec = SettlementSource::connector_spec();
        self.output_message(
            out,
            &json!({
                "type": "SPEC",
                "spec": spec
            }),
        )
    }

    /// Check connection
    async fn check(&self, out: &mut impl Write) -> Result<()> {
        let source = self.source().await?;
        info!(country = %source.config().country, "Checking connection");
        let result = source.check().await;
        self.output_message(
            out,
            &json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": result
            }),
        )
    }

    /// Discover streams
    async fn discover(&self, out: &mut impl Write) -> Result<()> {
        let catalog = self.source().await?.discover();
        self.output_message(
            out,
            &json!({
                "type": "CATALOG",
                "catalog": catalog
            }),
        )
    }

    /// Read streams as JSON lines
    async fn read<W: Write + Send>(&self, out: W) -> Result<()> {
        let source = self.source().await?;
        let state = self.load_state()?;
        let mut sink = JsonLinesWriter::new(out);

        source
            .read(&state, &self.cli.selected_streams(), &mut sink)
            .await?;
        Ok(())
    }

    /// Output a message
    fn output_message(&self, out: &mut impl Write, msg: &Value) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => serde_json::to_writer(&mut *out, msg)?,
            OutputFormat::Pretty => serde_json::to_writer_pretty(&mut *out, msg)?,
        }
        out.write_all(b"\n")?;
        Ok(())
    }
}
