// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use subburn::app_config::{self, Config, EncoderKind, StyleOverrides};
use subburn::app_controller::Controller;
use subburn::file_utils::FileManager;

/// CLI Wrapper for EncoderKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEncoder {
    Ffmpeg,
    Nvencc,
}

impl From<CliEncoder> for EncoderKind {
    fn from(cli_encoder: CliEncoder) -> Self {
        match cli_encoder {
            CliEncoder::Ffmpeg => EncoderKind::Ffmpeg,
            CliEncoder::Nvencc => EncoderKind::NvEncC,
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
    /// Burn subtitles into video files (default command)
    Encode(EncodeArgs),

    /// Generate shell completions for subburn
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct EncodeArgs {
    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Font used for dialogue and the marquee
    #[arg(long)]
    font_name: Option<String>,

    /// Base font size (1-50, invalid values fall back to 20)
    #[arg(long)]
    font_size: Option<String>,

    /// Outline width (0-2, invalid values fall back to 0.75)
    #[arg(long)]
    outline: Option<String>,

    /// Video bitrate in kbps (1000-10000, invalid values fall back to 5000)
    #[arg(long)]
    bitrate: Option<String>,

    /// Scrolling banner text
    #[arg(long)]
    marquee: Option<String>,

    /// Logo image overlaid in the top-right corner (ffmpeg only)
    #[arg(long)]
    logo: Option<String>,

    /// Watermark caption shown for the whole runtime
    #[arg(long)]
    watermark: Option<String>,

    /// Encoder backend
    #[arg(long, value_enum)]
    encoder: Option<CliEncoder>,

    /// Delete the source file after a successful encode
    #[arg(long)]
    delete_source: bool,

    /// Keep the temporary subtitle files
    #[arg(long)]
    keep_subtitles: bool,

    /// Only write the styled subtitle next to the input, no encoding
    #[arg(short, long)]
    subtitle_only: bool,
}

/// subburn - batch subtitle burn-in encoder
///
/// Extracts the subtitle track of each video, restyles it, adds a marquee
/// and a watermark, and re-encodes the video with the subtitle burned in.
#[derive(Parser, Debug)]
#[command(name = "subburn")]
#[command(version)]
#[command(about = "Batch subtitle burn-in encoder")]
#[command(long_about = "subburn extracts subtitles from video files, restyles them and burns them into a re-encoded video.

EXAMPLES:
    subburn /videos/                                # Encode every mkv/avi below /videos
    subburn movie.mkv                               # Encode a single file
    subburn --font-size 24 --bitrate 6000 movie.mkv # Override style settings
    subburn --marquee \"Visit us\" /videos/           # Add a scrolling banner
    subburn --encoder nvencc /videos/               # Use NVEncC instead of ffmpeg
    subburn -s movie.mkv                            # Only write movie.ass
    subburn --log-level debug /videos/              # Show every pipeline step
    subburn completions bash > subburn.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. Command line values override the file.

REQUIRED TOOLS:
    mkvextract - subtitle track extraction
    ffmpeg     - default encoder (h264_nvenc)
    NVEncC     - alternative encoder")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Font used for dialogue and the marquee
    #[arg(long)]
    font_name: Option<String>,

    /// Base font size (1-50, invalid values fall back to 20)
    #[arg(long)]
    font_size: Option<String>,

    /// Outline width (0-2, invalid values fall back to 0.75)
    #[arg(long)]
    outline: Option<String>,

    /// Video bitrate in kbps (1000-10000, invalid values fall back to 5000)
    #[arg(long)]
    bitrate: Option<String>,

    /// Scrolling banner text
    #[arg(long)]
    marquee: Option<String>,

    /// Logo image overlaid in the top-right corner (ffmpeg only)
    #[arg(long)]
    logo: Option<String>,

    /// Watermark caption shown for the whole runtime
    #[arg(long)]
    watermark: Option<String>,

    /// Encoder backend
    #[arg(long, value_enum)]
    encoder: Option<CliEncoder>,

    /// Delete the source file after a successful encode
    #[arg(long)]
    delete_source: bool,

    /// Keep the temporary subtitle files
    #[arg(long)]
    keep_subtitles: bool,

    /// Only write the styled subtitle next to the input, no encoding
    #[arg(short, long)]
    subtitle_only: bool,
}

impl EncodeArgs {
    fn style_overrides(&self) -> StyleOverrides {
        StyleOverrides {
            font_name: self.font_name.clone(),
            font_size: self.font_size.clone(),
            font_outline: self.outline.clone(),
            bitrate_kbps: self.bitrate.clone(),
            logo_path: self.logo.clone(),
            marquee_text: self.marquee.clone(),
            watermark_label: self.watermark.clone(),
        }
    }
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

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
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
    // Install with the most verbose filter; the effective level is set
    // through log::set_max_level once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subburn", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Encode(args)) => run_encode(args).await,
        None => {
            // Default behavior - use top-level args
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            let encode_args = EncodeArgs {
                input_path,
                config: cli.config,
                log_level: cli.log_level,
                font_name: cli.font_name,
                font_size: cli.font_size,
                outline: cli.outline,
                bitrate: cli.bitrate,
                marquee: cli.marquee,
                logo: cli.logo,
                watermark: cli.watermark,
                encoder: cli.encoder,
                delete_source: cli.delete_source,
                keep_subtitles: cli.keep_subtitles,
                subtitle_only: cli.subtitle_only,
            };
            run_encode(encode_args).await
        }
    }
}

async fn run_encode(options: EncodeArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = load_or_create_config(&options.config)?;

    config.apply_overrides(&options.style_overrides());
    if let Some(encoder) = &options.encoder {
        config.tools.encoder = encoder.clone().into();
    }
    if options.delete_source {
        config.delete_after_encode = true;
    }
    if options.keep_subtitles {
        config.keep_subtitles = true;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;
    let settings = controller.settings();
    info!(
        "Encoder: {} | Font: {} {} (outline {}) | Bitrate: {}k",
        controller.config().tools.encoder.display_name(),
        settings.font_name,
        settings.font_size,
        settings.font_outline,
        settings.bitrate_kbps
    );

    let input_path = options.input_path.as_path();

    if options.subtitle_only {
        return subtitle_only_mode(&controller, input_path).await;
    }

    if input_path.is_file() {
        let outcome = controller.process_file(input_path).await;
        if !outcome.succeeded() {
            return Err(anyhow!(
                "Encode failed for {:?}: {}",
                input_path,
                outcome.error.as_deref().unwrap_or("unknown error")
            ));
        }
        info!(
            "Success: {:?} ({})",
            outcome.media.output,
            Controller::<subburn::ProcessRunner>::format_duration(outcome.elapsed)
        );
    } else if input_path.is_dir() {
        let summary = controller.run_folder(input_path).await?;
        if summary.failed_count() > 0 {
            warn!("{} of {} files failed", summary.failed_count(), summary.outcomes.len());
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

// @loads: Config file, writing the defaults when it does not exist yet
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config.write_to_file(config_path)?;
    Ok(config)
}

// Write the styled subtitle next to each input instead of encoding
async fn subtitle_only_mode(controller: &Controller, input_path: &Path) -> Result<()> {
    if input_path.is_file() {
        controller.run_subtitle_only(input_path).await?;
        return Ok(());
    }

    if !input_path.is_dir() {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    let files = FileManager::find_files(input_path, &controller.config().input_extensions)?;
    info!("Starting subtitle-only mode for {} files", files.len());

    let mut processed_count = 0;
    for file in &files {
        match controller.run_subtitle_only(file).await {
            Ok(_) => processed_count += 1,
            Err(e) => error!("Error processing file {:?}: {:#}", file, e),
        }
    }

    info!("Finished processing {} of {} files", processed_count, files.len());
    Ok(())
}
