// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use origreg::app_config::{self, Config, ModelProvider};
use origreg::app_controller::{segment_xml, Controller};
use origreg::file_utils::FileManager;

/// CLI Wrapper for ModelProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliModelProvider {
    Http,
    Ollama,
}

impl From<CliModelProvider> for ModelProvider {
    fn from(cli_provider: CliModelProvider) -> Self {
        match cli_provider {
            CliModelProvider::Http => ModelProvider::Http,
            CliModelProvider::Ollama => ModelProvider::Ollama,
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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Segment, duplicate and normalize a folder of TEI files (default command)
    #[command(alias = "run")]
    Process(ProcessArgs),

    /// Segment and duplicate one TEI file and print the result, without any model
    Segment {
        /// TEI file to segment
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Generate shell completions for origreg
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct ProcessArgs {
    /// Folder (or single TEI file) to process, defaults to the configured input folder
    #[arg(value_name = "INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// Root folder for the segmented files
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Folder the produced files are moved into
    #[arg(short, long)]
    results_dir: Option<String>,

    /// Number of sentences per model call
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Normalization provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliModelProvider>,

    /// Model name to use for normalization
    #[arg(short, long)]
    model: Option<String>,

    /// Endpoint URL of the provider
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Stop at the first document that fails
    #[arg(long)]
    fail_fast: bool,

    /// Do not show sampled normalizations while running
    #[arg(long)]
    no_debug_samples: bool,

    /// Disable the persistent normalization cache
    #[arg(long)]
    no_cache: bool,
}

/// origreg - sentence segmentation and spelling normalization of TEI documents
#[derive(Parser, Debug)]
#[command(name = "origreg")]
#[command(version)]
#[command(about = "Segment TEI documents into sentences and normalize their spelling")]
#[command(long_about = "origreg splits the <p> and <ab> units of TEI documents into numbered <seg>
elements, duplicates every segment into <orig> and <reg>, and sends the <reg> side
through a normalization model in batches.

EXAMPLES:
    origreg                                   # Process the configured input folder
    origreg in_XML/                           # Process a given folder
    origreg -f -b 16 in_XML/                  # Overwrite outputs, 16 sentences per call
    origreg -p ollama -m llama3.2:3b in_XML/  # Use a local Ollama model
    origreg segment letter.xml                # Print the segmented XML, no model
    origreg completions bash > origreg.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    process: ProcessArgs,
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
        // The filter is applied through log::max_level so it can change later
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
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
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "origreg", &mut std::io::stdout());
            Ok(true)
        }
        Some(Commands::Segment { file, config_path }) => run_segment(file, &config_path).map(|_| true),
        Some(Commands::Process(args)) => run_process(args).await,
        None => run_process(cli.process).await,
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Load the configuration file and apply command line overrides
fn load_config(options: &ProcessArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(output_dir) = &options.output_dir {
        config.paths.output_dir = Some(output_dir.clone());
    }
    if let Some(results_dir) = &options.results_dir {
        config.paths.results_dir = results_dir.clone();
    }
    if let Some(batch_size) = options.batch_size {
        config.normalization.batch_size = batch_size;
    }
    if let Some(provider) = &options.provider {
        config.normalization.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.normalization.active_provider_config_mut().model = model.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        config.normalization.active_provider_config_mut().endpoint = endpoint.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    if options.fail_fast {
        config.normalization.fail_fast = true;
    }
    if options.no_debug_samples {
        config.normalization.debug_samples = false;
    }
    if options.no_cache {
        config.cache.enabled = false;
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

/// Run the full pipeline, returning whether every document succeeded
async fn run_process(options: ProcessArgs) -> Result<bool> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let input_path = options
        .input_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.paths.input_dir));

    let controller = Controller::with_config(config)?;
    let summary = controller.run(&input_path, options.force_overwrite).await?;

    if summary.has_failures() {
        error!("{} document(s) failed, see the issues log", summary.failed);
        return Ok(false);
    }
    info!("Results in {}", controller.config().paths.results_dir);
    Ok(true)
}

/// Print the segmented and duplicated form of one file
fn run_segment(file: PathBuf, config_path: &str) -> Result<()> {
    if !FileManager::file_exists(&file) {
        return Err(anyhow!("Input file does not exist: {:?}", file));
    }

    let config = Config::load_or_create(config_path)?;
    let segmenter = config.segmenter()?;
    let xml = FileManager::read_to_string(&file)?;
    let (doc, stats) = segment_xml(&xml, &segmenter)
        .with_context(|| format!("Failed to parse {:?}", file))?;

    info!("{} units, {} segments", stats.units, stats.segments);
    println!("{}", doc.to_xml_string());
    Ok(())
}
