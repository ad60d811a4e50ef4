// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use bhashantar::app_config::{Config, LogLevel, TranslationProvider};
use bhashantar::content::course_topic_spec;
use bhashantar::pipeline::{PipelineOptions, PipelineOrchestrator, RunState};
use bhashantar::translation::TranslationClient;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

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

fn to_level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a content catalog using AI providers (default command)
    #[command(alias = "translate")]
    Translate(TranslateArgs),

    /// Generate shell completions for bhashantar
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Content catalog JSON file to translate
    #[arg(value_name = "CATALOG")]
    catalog_path: PathBuf,

    /// Output file for the translated catalog
    #[arg(short, long, default_value = "translated-content.json")]
    output: PathBuf,

    /// Checkpoint file for resumable runs
    #[arg(long, default_value = ".bhashantar-checkpoint.json")]
    checkpoint: PathBuf,

    /// Ignore any existing checkpoint and start over
    #[arg(long)]
    fresh: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'mr', 'hi', 'es')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Bhashantar - AI-powered batch content translation
///
/// Translates structured JSON content catalogs between languages using
/// AI providers (Ollama, OpenAI, Anthropic), preserving structure and
/// resuming interrupted runs from a checkpoint.
#[derive(Parser, Debug)]
#[command(name = "bhashantar")]
#[command(version = "0.3.0")]
#[command(about = "AI-powered batch content translation tool")]
#[command(long_about = "Bhashantar translates structured content catalogs field by field using AI providers.

EXAMPLES:
    bhashantar topics.json                          # Translate using default config
    bhashantar topics.json -o marathi.json          # Choose the output file
    bhashantar -p openai -m gpt-4 topics.json       # Use specific provider and model
    bhashantar -s en -t mr topics.json              # Translate from English to Marathi
    bhashantar --fresh topics.json                  # Ignore an existing checkpoint
    bhashantar --log-level debug topics.json        # Verbose logging
    bhashantar completions bash > bhashantar.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.

RESUME:
    Progress is checkpointed after every item. Re-running the same command
    continues where the previous run stopped; --fresh starts over.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default: llama3.2:3b)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Content catalog JSON file to translate
    #[arg(value_name = "CATALOG")]
    catalog_path: Option<PathBuf>,

    /// Output file for the translated catalog
    #[arg(short, long, default_value = "translated-content.json")]
    output: PathBuf,

    /// Checkpoint file for resumable runs
    #[arg(long, default_value = ".bhashantar-checkpoint.json")]
    checkpoint: PathBuf,

    /// Ignore any existing checkpoint and start over
    #[arg(long)]
    fresh: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'mr', 'hi', 'es')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
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

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
            let emoji = Self::get_emoji_for_level(record.level());
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "bhashantar", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let catalog_path = cli.catalog_path.ok_or_else(|| {
                anyhow::anyhow!("CATALOG is required when no subcommand is specified")
            })?;

            let translate_args = TranslateArgs {
                catalog_path,
                output: cli.output,
                checkpoint: cli.checkpoint,
                fresh: cli.fresh,
                provider: cli.provider,
                model: cli.model,
                source_language: cli.source_language,
                target_language: cli.target_language,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_translate(translate_args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(to_level_filter(&config_log_level));
    }

    let config = load_config(&options)?;

    config
        .validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(to_level_filter(&config.log_level));
    }

    let client = TranslationClient::new(&config.translation)?;

    info!(
        "Testing connection to {} provider...",
        config.translation.provider.display_name()
    );
    client
        .test_connection()
        .await
        .context("Translation provider is not reachable")?;

    let pipeline_options = PipelineOptions {
        catalog_path: options.catalog_path,
        output_path: options.output,
        checkpoint_path: options.checkpoint,
        fresh: options.fresh,
        source_language: config.source_language.clone(),
        target_language: config.target_language.clone(),
    };

    info!(
        "Translating {} -> {}",
        config.source_language, config.target_language
    );

    let orchestrator =
        PipelineOrchestrator::new(&client, course_topic_spec(), pipeline_options);

    // First Ctrl-C requests a graceful stop between items; progress up to
    // that point stays in the checkpoint
    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current item...");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let report = orchestrator.run().await?;

    match report.state {
        RunState::Completed => {
            info!(
                "Done: {}/{} items translated in {:.1}s ({} resumed, {} strings fell back to source)",
                report.completed,
                report.total,
                report.elapsed.as_secs_f64(),
                report.resumed,
                report.fallbacks
            );
        }
        RunState::Interrupted => {
            info!(
                "Stopped after {}/{} items; re-run the same command to resume",
                report.completed, report.total
            );
            log::logger().flush();
            // Conventional exit code for SIGINT
            std::process::exit(130);
        }
    }

    Ok(())
}

fn load_config(options: &TranslateArgs) -> Result<Config> {
    let config_path = &options.config_path;

    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        // Find the provider config and update the model
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .translation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}
