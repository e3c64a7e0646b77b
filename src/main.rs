// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug};
use std::io::Write;

use promptlens::app_config::{Config, LogLevel};
use promptlens::app_controller::{Controller, TaskOptions};
use promptlens::providers::ProviderId;
use promptlens::task::TaskKind;

/// CLI Wrapper for ProviderId to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProvider {
    #[value(name = "openai")]
    OpenAI,
    #[value(name = "openrouter")]
    OpenRouter,
    Anthropic,
    Cohere,
    #[value(name = "huggingface")]
    HuggingFace,
    Replicate,
    Together,
    Local,
}

impl From<CliProvider> for ProviderId {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::OpenAI => ProviderId::OpenAI,
            CliProvider::OpenRouter => ProviderId::OpenRouter,
            CliProvider::Anthropic => ProviderId::Anthropic,
            CliProvider::Cohere => ProviderId::Cohere,
            CliProvider::HuggingFace => ProviderId::HuggingFace,
            CliProvider::Replicate => ProviderId::Replicate,
            CliProvider::Together => ProviderId::Together,
            CliProvider::Local => ProviderId::Local,
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

#[derive(Parser, Debug)]
struct TaskArgs {
    /// Text to process
    #[arg(value_name = "TEXT")]
    text: String,

    /// Provider to use instead of the configured default
    #[arg(short, long, value_enum)]
    provider: Option<CliProvider>,

    /// Model name to use
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate text and stream the result
    Translate {
        #[command(flatten)]
        task: TaskArgs,

        /// Target language code (e.g., 'en', 'vi', 'fr')
        #[arg(short, long)]
        target_language: Option<String>,
    },

    /// Summarize text and stream the result
    Summarize {
        #[command(flatten)]
        task: TaskArgs,
    },

    /// List the models a provider offers
    Models {
        /// Provider to list; the configured default when omitted
        #[arg(short, long, value_enum)]
        provider: Option<CliProvider>,
    },

    /// Show the provider registry
    Providers,

    /// Serve task messages over stdin/stdout, one JSON object per line
    Bridge,

    /// Generate shell completions for promptlens
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// promptlens - streaming translation and summarization over LLM providers
#[derive(Parser, Debug)]
#[command(name = "promptlens")]
#[command(version)]
#[command(about = "Translate or summarize text with streaming LLM providers")]
#[command(long_about = "promptlens sends text to a text-generation provider and streams the answer.

EXAMPLES:
    promptlens translate \"Hello world\" -t vi           # Translate to Vietnamese
    promptlens translate -p anthropic \"Good morning\"   # Use a specific provider
    promptlens summarize -p openai -m gpt-4o \"...\"     # Use a specific model
    promptlens models -p openrouter                     # List available models
    promptlens --mock translate \"Thank you\"            # Canned responses, no network
    promptlens bridge < requests.jsonl                  # Message bridge over stdio
    promptlens completions bash > promptlens.bash       # Generate bash completions

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
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Serve canned responses instead of calling providers
    #[arg(long, global = true)]
    mock: bool,
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

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
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
            let (color, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts every level; log::max_level does the filtering
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "promptlens", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config)?;
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    if cli.mock {
        config.mock.enabled = true;
    }
    log::set_max_level(config.log_level.as_level_filter());
    debug!("Loaded configuration from {}", cli.config);

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Translate { task, target_language } => {
            let options = TaskOptions {
                provider: task.provider.map(Into::into),
                model: task.model,
                target_language,
            };
            run_task(&controller, TaskKind::Translate, &task.text, &options).await
        }
        Commands::Summarize { task } => {
            let options = TaskOptions {
                provider: task.provider.map(Into::into),
                model: task.model,
                target_language: None,
            };
            run_task(&controller, TaskKind::Summarize, &task.text, &options).await
        }
        Commands::Models { provider } => {
            let models = controller.list_models(provider.map(Into::into)).await;
            for model in models {
                println!("{:<45} {}", model.id, model.label());
            }
            Ok(())
        }
        Commands::Providers => {
            for id in ProviderId::ALL {
                println!(
                    "{:<12} {:<16} {:<50} {}",
                    id.as_str(),
                    id.display_name(),
                    id.endpoint(),
                    id.default_model()
                );
            }
            Ok(())
        }
        Commands::Bridge => {
            let stats = controller.serve_stdio().await?;
            debug!("Bridge finished: {} delivered, {} dropped", stats.delivered, stats.dropped);
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

async fn run_task(controller: &Controller, kind: TaskKind, text: &str, options: &TaskOptions) -> Result<()> {
    let mut stdout = std::io::stdout();
    controller
        .run_task(kind, text, options, |chunk| {
            let _ = write!(stdout, "{}", chunk);
            let _ = stdout.flush();
        })
        .await
        .with_context(|| format!("{:?} did not complete", kind))?;
    println!();
    Ok(())
}
