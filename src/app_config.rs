use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Application configuration module
/// This module handles the service configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language requested when the caller does not name one
    #[serde(default = "default_language")]
    pub default_language: String,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream endpoints
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Outgoing request settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Per-strategy time budgets
    #[serde(default)]
    pub timeouts: StrategyTimeouts,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    // @returns: host:port string for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Base URLs of every upstream the strategies talk to
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Watch page (query parameter `v` is appended)
    #[serde(default = "default_watch_url")]
    pub watch_url: String,

    /// InnerTube player endpoint
    #[serde(default = "default_player_api_url")]
    pub player_api_url: String,

    /// InnerTube web client version sent with player requests
    #[serde(default = "default_innertube_client_version")]
    pub innertube_client_version: String,

    /// Public timed-text endpoint (track list and caption content)
    #[serde(default = "default_timedtext_url")]
    pub timedtext_url: String,

    /// Public proxy transcription service
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            watch_url: default_watch_url(),
            player_api_url: default_player_api_url(),
            innertube_client_version: default_innertube_client_version(),
            timedtext_url: default_timedtext_url(),
            proxy_url: default_proxy_url(),
        }
    }
}

/// Headers and limits applied to every outgoing request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpConfig {
    /// Browser-like User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language header
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Referer header
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Timeout for a single upstream request in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            referer: default_referer(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Time budget for each whole strategy invocation
///
/// A strategy that overruns its budget is abandoned. For the library and
/// proxy strategies this counts as "no result"; for the caption pipeline it
/// counts as an unexpected failure so the emergency fallbacks still run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StrategyTimeouts {
    /// Library-style resolution budget in seconds
    #[serde(default = "default_library_timeout_secs")]
    pub library_secs: u64,

    /// Proxy service budget in seconds
    #[serde(default = "default_proxy_timeout_secs")]
    pub proxy_secs: u64,

    /// Player/directory pipeline budget in seconds
    #[serde(default = "default_pipeline_timeout_secs")]
    pub pipeline_secs: u64,
}

impl Default for StrategyTimeouts {
    fn default() -> Self {
        Self {
            library_secs: default_library_timeout_secs(),
            proxy_secs: default_proxy_timeout_secs(),
            pipeline_secs: default_pipeline_timeout_secs(),
        }
    }
}

impl StrategyTimeouts {
    pub fn library(&self) -> Duration {
        Duration::from_secs(self.library_secs)
    }

    pub fn proxy(&self) -> Duration {
        Duration::from_secs(self.proxy_secs)
    }

    pub fn pipeline(&self) -> Duration {
        Duration::from_secs(self.pipeline_secs)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3080
}

fn default_watch_url() -> String {
    "https://www.youtube.com/watch".to_string()
}

fn default_player_api_url() -> String {
    "https://www.youtube.com/youtubei/v1/player".to_string()
}

fn default_innertube_client_version() -> String {
    "2.20240726.00.00".to_string()
}

fn default_timedtext_url() -> String {
    "https://www.youtube.com/api/timedtext".to_string()
}

fn default_proxy_url() -> String {
    "https://youtubetranscript.com/".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_referer() -> String {
    "https://www.youtube.com/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_library_timeout_secs() -> u64 {
    20
}

fn default_proxy_timeout_secs() -> u64 {
    20
}

fn default_pipeline_timeout_secs() -> u64 {
    // Many candidate tracks may be tried one after another
    90
}

impl Config {
    /// Load the configuration file, creating it with defaults when missing
    pub fn load_or_create(config_path: &str) -> Result<Self> {
        if Path::new(config_path).exists() {
            let file = File::open(config_path)
                .context(format!("Failed to open config file: {}", config_path))?;

            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", config_path))?;

            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.default_language.trim().is_empty() {
            return Err(anyhow!("Default language must not be empty"));
        }

        let upstreams = [
            ("upstream.watch_url", &self.upstream.watch_url),
            ("upstream.player_api_url", &self.upstream.player_api_url),
            ("upstream.timedtext_url", &self.upstream.timedtext_url),
            ("upstream.proxy_url", &self.upstream.proxy_url),
        ];
        for (field, value) in upstreams {
            Url::parse(value).context(format!("Invalid URL for {}: '{}'", field, value))?;
        }

        if self.http.request_timeout_secs == 0 {
            return Err(anyhow!("http.request_timeout_secs must be greater than zero"));
        }

        let budgets = [
            ("timeouts.library_secs", self.timeouts.library_secs),
            ("timeouts.proxy_secs", self.timeouts.proxy_secs),
            ("timeouts.pipeline_secs", self.timeouts.pipeline_secs),
        ];
        for (field, secs) in budgets {
            if secs == 0 {
                return Err(anyhow!("{} must be greater than zero", field));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            default_language: default_language(),
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            http: HttpConfig::default(),
            timeouts: StrategyTimeouts::default(),
            log_level: LogLevel::default(),
        }
    }
}
