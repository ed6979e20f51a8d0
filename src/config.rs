use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;
use tokio::sync::Semaphore;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Which ingestion sources to run
    #[arg(long, env = "ZAPDROP_MODE", value_enum, default_value_t = RunMode::Both)]
    pub mode: RunMode,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub watch: WatchConfig,

    #[command(flatten)]
    pub parser: ParserConfig,

    #[command(flatten)]
    pub delivery: DeliveryConfig,

    #[command(flatten)]
    pub transport: TransportConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Only watch the configured folder
    Watch,
    /// Only serve the HTTP endpoint
    Http,
    /// Watch the folder and serve HTTP at the same time
    Both,
}

impl RunMode {
    #[must_use]
    pub const fn watches_folder(self) -> bool {
        matches!(self, Self::Watch | Self::Both)
    }

    #[must_use]
    pub const fn serves_http(self) -> bool {
        matches!(self, Self::Http | Self::Both)
    }
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "ZAPDROP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "ZAPDROP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// How long to wait for background workers on shutdown
    #[arg(long, env = "ZAPDROP_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body in bytes (Default: 64MB)
    #[arg(long, env = "ZAPDROP_MAX_BODY_BYTES", default_value_t = 67_108_864)]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080, shutdown_timeout_secs: 5, max_body_bytes: 67_108_864 }
    }
}

#[derive(Clone, Debug, Args)]
pub struct WatchConfig {
    /// Folder whose new and changed files are delivered as message batches
    #[arg(long = "watch-folder", env = "ZAPDROP_WATCH_FOLDER")]
    pub folder: Option<PathBuf>,

    /// Delete a batch file once all of its messages were delivered
    #[arg(long, env = "ZAPDROP_REMOVE_ON_SEND", default_value_t = false)]
    pub remove_on_send: bool,

    /// Debounce window for filesystem events
    #[arg(long = "watch-debounce-ms", env = "ZAPDROP_WATCH_DEBOUNCE_MS", default_value_t = 100)]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { folder: None, remove_on_send: false, debounce_ms: 100 }
    }
}

#[derive(Clone, Debug, Default, Args)]
pub struct ParserConfig {
    /// Treat JSON batches as UTF-16LE text and re-encode them before decoding
    #[arg(long, env = "ZAPDROP_RECOVER_LEGACY_ENCODING", default_value_t = false)]
    pub recover_legacy_encoding: bool,
}

#[derive(Clone, Debug, Default, Args)]
pub struct DeliveryConfig {
    /// Upper bound on batches delivered at the same time (unbounded when unset)
    #[arg(long, env = "ZAPDROP_MAX_CONCURRENT_BATCHES")]
    pub max_concurrent_batches: Option<usize>,

    /// What to do with a batch arriving while the bound is reached
    #[arg(long, env = "ZAPDROP_ADMISSION_POLICY", value_enum, default_value_t = AdmissionPolicy::Wait)]
    pub admission_policy: AdmissionPolicy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum AdmissionPolicy {
    /// Queue the batch until a slot frees up
    #[default]
    Wait,
    /// Fail the batch immediately
    Reject,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TransportConfig {
    /// Roster of contacts and groups served by the local transport (YAML or JSON)
    #[arg(long, env = "ZAPDROP_ROSTER_FILE")]
    pub roster_file: Option<PathBuf>,

    /// Log every transport call at debug level
    #[arg(long, env = "ZAPDROP_TRANSPORT_DEBUG", default_value_t = false)]
    pub transport_debug: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "ZAPDROP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint for traces and metrics
    #[arg(long, env = "ZAPDROP_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }

    /// Checks combinations of options that clap cannot express on its own.
    ///
    /// # Errors
    /// Returns an error if the run mode needs a watch folder and none is configured,
    /// or if the concurrent batch bound is out of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mode.watches_folder() && self.watch.folder.is_none() {
            anyhow::bail!("mode {:?} requires --watch-folder", self.mode);
        }
        if let Some(limit) = self.delivery.max_concurrent_batches
            && !(1..=Semaphore::MAX_PERMITS).contains(&limit)
        {
            anyhow::bail!("--max-concurrent-batches must be between 1 and {}", Semaphore::MAX_PERMITS);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: RunMode::Http,
            server: ServerConfig::default(),
            watch: WatchConfig::default(),
            parser: ParserConfig::default(),
            delivery: DeliveryConfig::default(),
            transport: TransportConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}
