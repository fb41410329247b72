// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use narrato::app_config::{self, Config, GenerativeProvider};
use narrato::app_controller::{Controller, RunOptions, RunStatus};

/// CLI Wrapper for GenerativeProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliGenerativeProvider {
    Gemini,
    #[value(name = "openai")]
    OpenAI,
    Ollama,
    None,
}

impl From<CliGenerativeProvider> for GenerativeProvider {
    fn from(cli_provider: CliGenerativeProvider) -> Self {
        match cli_provider {
            CliGenerativeProvider::Gemini => GenerativeProvider::Gemini,
            CliGenerativeProvider::OpenAI => GenerativeProvider::OpenAI,
            CliGenerativeProvider::Ollama => GenerativeProvider::Ollama,
            CliGenerativeProvider::None => GenerativeProvider::None,
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

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Narrate a document or every document in a folder (default command)
    Narrate(NarrateArgs),

    /// Test the connection to the configured generative provider
    Check(NarrateArgs),

    /// Generate shell completions for narrato
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct NarrateArgs {
    /// Input .docx, .pptx or .txt file, or a directory of them
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Audience to tailor the narration to (Students, Executives, Technical, Layperson or any label)
    #[arg(short, long)]
    audience: Option<String>,

    /// Maximum number of slides to narrate per document
    #[arg(short, long = "max-slides")]
    max_slides: Option<usize>,

    /// Report file (single input) or report directory (folder input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write one WAV file per slide into this directory
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Generative provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliGenerativeProvider>,

    /// Model name for the generative provider
    #[arg(long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Run without network providers (offline rewrite, silent audio)
    #[arg(long)]
    offline: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// narrato - audience-tailored narration for documents
///
/// Turns slides and paragraphs into short spoken narrations using a
/// generative provider and a speech provider.
#[derive(Parser, Debug)]
#[command(name = "narrato")]
#[command(version)]
#[command(about = "AI narration for presentations and documents")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "narrato rewrites each slide or paragraph of a document for an audience and synthesizes it to speech.

EXAMPLES:
    narrato deck.pptx                           # Narrate using default config
    narrato -a Executives -m 3 deck.pptx        # Three slides for executives
    narrato --audio-dir audio/ notes.docx       # Also write one WAV per slide
    narrato --offline talk.txt                  # No credentials needed
    narrato -f /presentations/                  # Whole directory, overwrite reports
    narrato check -p ollama                     # Test the provider connection
    narrato completions bash > narrato.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. GEMINI_API_KEY, OPENAI_API_KEY and DEEPGRAM_API_KEY
    fill keys left empty in the file.

SUPPORTED PROVIDERS:
    gemini - Google Gemini (default: gemini-1.5-flash)
    openai - OpenAI or compatible server (default: gpt-4o-mini)
    ollama - Local Ollama server (default: llama3.2)
    none   - Offline rewrite only")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    narrate: NarrateArgs,
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
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for a level
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
            let (colour, tag) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                tag,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Most verbose filter the logger accepts; the effective level is set later
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "narrato", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Narrate(args)) => run_narrate(args).await,
        Some(Commands::Check(args)) => run_check(args).await,
        None => run_narrate(cli.narrate).await,
    }
}

fn load_config(options: &NarrateArgs) -> Result<Config> {
    let config_path = &options.config_path;

    let mut config = if options.offline {
        Config::offline()
    } else if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .with_context(|| format!("Failed to open config file: {}", config_path))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(provider) = &options.provider {
        config.generation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.generation.set_model(model);
    }
    if let Some(audience) = &options.audience {
        config.audience = audience.clone();
    }
    if let Some(max_slides) = options.max_slides {
        config.pipeline.max_segments = max_slides;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.apply_env_overrides();
    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_check(options: NarrateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config = load_config(&options)?;
    let controller = Controller::with_config(config)?;
    controller.check_connection().await
}

async fn run_narrate(options: NarrateArgs) -> Result<()> {
    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required"))?;

    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config = load_config(&options)?;
    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    let run_options = RunOptions {
        audio_dir: options.audio_dir.clone(),
        force_overwrite: options.force_overwrite,
        ..controller.default_options()
    };

    if input_path.is_file() {
        match controller
            .run(input_path, options.output.clone(), &run_options)
            .await?
        {
            RunStatus::Completed { output_path, slides } => {
                info!("Success: {} slide(s) in {:?}", slides, output_path)
            }
            RunStatus::Skipped { output_path } => info!("Skipped: {:?}", output_path),
        }
    } else if input_path.is_dir() {
        let summary = controller
            .run_folder(input_path, options.output.clone(), &run_options)
            .await?;
        if summary.errors > 0 {
            return Err(anyhow!("{} document(s) failed", summary.errors));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}
