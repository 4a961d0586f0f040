// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::time::Duration;

use scriptripper::app_config::{Config, LogLevel};
use scriptripper::server::{self, reply_for, AppState, EndpointReply};
use scriptripper::{extract_video_id, TranscriptService};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP transcript service
    Serve {
        /// Address to bind (overrides the config file)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch one transcript and print it
    Fetch {
        /// YouTube video URL
        #[arg(value_name = "URL")]
        url: String,

        /// Preferred caption language
        #[arg(short, long)]
        language: Option<String>,

        /// Print the same JSON body the HTTP endpoint would return
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions for scriptripper
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// ScriptRipper - transcript retrieval for YouTube videos
///
/// Resolves a transcript through the embedded player, the public caption
/// directory and a couple of whole-pipeline fallbacks.
#[derive(Parser, Debug)]
#[command(name = "scriptripper")]
#[command(version)]
#[command(about = "YouTube transcript retrieval service")]
#[command(long_about = "ScriptRipper turns a YouTube URL into a plain-text transcript.

EXAMPLES:
    scriptripper serve                                   # Serve on the configured address
    scriptripper serve --port 8080                       # Override the port
    scriptripper fetch https://youtu.be/dQw4w9WgXcQ      # Print a transcript
    scriptripper fetch -l de --json <URL>                # German, JSON output
    scriptripper completions bash > scriptripper.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI color for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "\x1B[1;31m"),
            Level::Warn => ("WARN ", "\x1B[1;33m"),
            Level::Info => ("INFO ", "\x1B[1;32m"),
            Level::Debug => ("DEBUG", "\x1B[1;36m"),
            Level::Trace => ("TRACE", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (tag, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Max level is narrowed once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "scriptripper", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config)?;
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_serve(config).await
        }
        Commands::Fetch { url, language, json } => {
            config.validate().context("Configuration validation failed")?;
            run_fetch(config, &url, language, json).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}

async fn run_serve(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;

    info!("Starting scriptripper {}", env!("CARGO_PKG_VERSION"));
    server::serve(&config.server, state).await?;
    Ok(())
}

async fn run_fetch(config: Config, url: &str, language: Option<String>, json: bool) -> Result<()> {
    let video_id = extract_video_id(url).ok_or_else(|| anyhow!("Could not parse a YouTube video ID from '{}'", url))?;
    let language = language
        .filter(|lang| !lang.trim().is_empty())
        .unwrap_or_else(|| config.default_language.clone());

    let service = TranscriptService::from_config(&config).context("Failed to build transcript service")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Retrieving transcript for {} ({})", video_id, language));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let outcome = service.retrieve(&video_id, &language).await;
    spinner.finish_and_clear();

    let reply = reply_for(video_id, outcome);
    if json {
        let body = match &reply {
            EndpointReply::Success(body) => serde_json::to_string_pretty(body)?,
            EndpointReply::BadRequest(body) | EndpointReply::NotFound(body) | EndpointReply::BadGateway(body) => {
                serde_json::to_string_pretty(body)?
            }
        };
        println!("{}", body);
    }

    match reply {
        EndpointReply::Success(body) => {
            if !json {
                println!("{}", body.transcript);
            }
            Ok(())
        }
        EndpointReply::BadRequest(body) | EndpointReply::NotFound(body) | EndpointReply::BadGateway(body) => {
            Err(anyhow!("{}", body.error))
        }
    }
}
