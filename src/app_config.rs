use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings, and resolving the
/// per-run style settings with their bounds.

/// Smallest accepted base font size
pub const FONT_SIZE_MIN: i64 = 1;
/// Largest accepted base font size
pub const FONT_SIZE_MAX: i64 = 50;
/// Smallest accepted outline width
pub const FONT_OUTLINE_MIN: f64 = 0.0;
/// Largest accepted outline width
pub const FONT_OUTLINE_MAX: f64 = 2.0;
/// Smallest accepted video bitrate (kbps)
pub const BITRATE_MIN: i64 = 1000;
/// Largest accepted video bitrate (kbps)
pub const BITRATE_MAX: i64 = 10000;

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Style and encode settings
    #[serde(default)]
    pub style: StyleConfig,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Folder for temporary subtitle files (empty = system temp dir)
    #[serde(default)]
    pub temp_folder: String,

    /// Track index handed to the extractor
    #[serde(default = "default_subtitle_track_index")]
    pub subtitle_track_index: usize,

    /// Container extensions picked up when scanning a folder
    #[serde(default = "default_input_extensions")]
    pub input_extensions: Vec<String>,

    /// Let the external tools write to the console
    #[serde(default)]
    pub show_tool_output: bool,

    /// Log every external command line before running it
    #[serde(default)]
    pub echo_commands: bool,

    /// Remove the source container after a successful encode
    #[serde(default)]
    pub delete_after_encode: bool,

    /// Keep the temporary subtitle files
    #[serde(default)]
    pub keep_subtitles: bool,

    /// Pause between two files, in milliseconds
    #[serde(default = "default_inter_file_delay_ms")]
    pub inter_file_delay_ms: u64,

    /// Do not re-encode when a valid output already exists
    #[serde(default = "default_true")]
    pub skip_already_encoded: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Style settings as they appear in the configuration file.
///
/// Values here are not trusted; see [`StyleSettings::from_config`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StyleConfig {
    /// Font used for dialogue and the marquee
    #[serde(default = "default_font_name")]
    pub font_name: String,

    /// Base font size
    #[serde(default = "default_font_size")]
    pub font_size: i64,

    /// Outline width of the dialogue font
    #[serde(default = "default_font_outline")]
    pub font_outline: f64,

    /// Video bitrate in kbps
    #[serde(default = "default_bitrate_kbps")]
    pub bitrate_kbps: i64,

    /// Logo image overlaid by the ffmpeg backend
    #[serde(default)]
    pub logo_path: Option<String>,

    /// Scrolling banner text
    #[serde(default)]
    pub marquee_text: String,

    /// Persistent caption shown for the whole runtime
    #[serde(default = "default_watermark_label")]
    pub watermark_label: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_name: default_font_name(),
            font_size: default_font_size(),
            font_outline: default_font_outline(),
            bitrate_kbps: default_bitrate_kbps(),
            logo_path: None,
            marquee_text: String::new(),
            watermark_label: default_watermark_label(),
        }
    }
}

/// Encoder backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    // @encoder: ffmpeg with h264_nvenc
    #[default]
    Ffmpeg,
    // @encoder: NVEncC
    NvEncC,
}

impl EncoderKind {
    // @returns: Human readable encoder name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ffmpeg => "FFmpeg",
            Self::NvEncC => "NVEncC",
        }
    }

    // @returns: Binary looked up on PATH when no explicit path is configured
    pub fn default_binary(&self) -> &str {
        match self {
            Self::Ffmpeg => "ffmpeg",
            Self::NvEncC => "NVEncC",
        }
    }
}

impl std::fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ffmpeg => write!(f, "ffmpeg"),
            Self::NvEncC => write!(f, "nvencc"),
        }
    }
}

impl std::str::FromStr for EncoderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ffmpeg" => Ok(Self::Ffmpeg),
            "nvencc" => Ok(Self::NvEncC),
            _ => Err(anyhow!("Invalid encoder type: {}", s)),
        }
    }
}

/// External tool configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolsConfig {
    /// Track extractor binary
    #[serde(default = "default_extractor_path")]
    pub extractor_path: String,

    /// Encoder backend
    #[serde(default)]
    pub encoder: EncoderKind,

    /// Encoder binary (empty = backend default)
    #[serde(default)]
    pub encoder_path: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            extractor_path: default_extractor_path(),
            encoder: EncoderKind::default(),
            encoder_path: String::new(),
        }
    }
}

impl ToolsConfig {
    /// Get the encoder binary for the selected backend
    pub fn get_encoder_path(&self) -> String {
        if self.encoder_path.trim().is_empty() {
            self.encoder.default_binary().to_string()
        } else {
            self.encoder_path.clone()
        }
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
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Raw overrides gathered from the command line.
///
/// Numeric values stay as text so that unparsable input can fall back
/// to the default instead of aborting the run.
#[derive(Debug, Clone, Default)]
pub struct StyleOverrides {
    pub font_name: Option<String>,
    pub font_size: Option<String>,
    pub font_outline: Option<String>,
    pub bitrate_kbps: Option<String>,
    pub logo_path: Option<String>,
    pub marquee_text: Option<String>,
    pub watermark_label: Option<String>,
}

/// Validated, immutable settings for one batch run
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSettings {
    /// Dialogue/marquee font
    pub font_name: String,
    /// Base font size, within `FONT_SIZE_MIN..=FONT_SIZE_MAX`
    pub font_size: u32,
    /// Outline width, within `FONT_OUTLINE_MIN..=FONT_OUTLINE_MAX`
    pub font_outline: f64,
    /// Bitrate in kbps, within `BITRATE_MIN..=BITRATE_MAX`
    pub bitrate_kbps: u32,
    /// Existing logo image, if any
    pub logo_path: Option<PathBuf>,
    /// Scrolling banner text
    pub marquee_text: String,
    /// Watermark caption (rendered uppercased)
    pub watermark_label: String,
    /// Folder receiving temporary subtitle files
    pub temp_folder: PathBuf,
}

impl StyleSettings {
    /// Resolve the settings for a run, replacing every out-of-range value
    /// with its documented default.
    pub fn from_config(config: &Config) -> Self {
        let style = &config.style;

        let font_name = if style.font_name.trim().is_empty() {
            warn!("Font name is empty, using default: {}", default_font_name());
            default_font_name()
        } else {
            style.font_name.trim().to_string()
        };

        let font_size = bounded_int(
            "Font size", style.font_size, FONT_SIZE_MIN, FONT_SIZE_MAX, default_font_size(),
        ) as u32;
        let font_outline = bounded_real(
            "Font outline", style.font_outline, FONT_OUTLINE_MIN, FONT_OUTLINE_MAX, default_font_outline(),
        );
        let bitrate_kbps = bounded_int(
            "Bitrate", style.bitrate_kbps, BITRATE_MIN, BITRATE_MAX, default_bitrate_kbps(),
        ) as u32;

        let logo_path = match style.logo_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => {
                let path = PathBuf::from(path);
                if path.is_file() {
                    Some(path)
                } else {
                    warn!("Logo not found, encoding without it: {:?}", path);
                    None
                }
            }
            _ => None,
        };

        Self {
            font_name,
            font_size,
            font_outline,
            bitrate_kbps,
            logo_path,
            marquee_text: style.marquee_text.clone(),
            watermark_label: style.watermark_label.clone(),
            temp_folder: config.resolve_temp_folder(),
        }
    }
}

/// Parse a bounded integer, returning `default` for unparsable or out-of-range input
pub fn parse_bounded_int(raw: &str, min: i64, max: i64, default: i64) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(value) if (min..=max).contains(&value) => value,
        _ => default,
    }
}

/// Parse a bounded real number, returning `default` for unparsable or out-of-range input
pub fn parse_bounded_real(raw: &str, min: f64, max: f64, default: f64) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= min && value <= max => value,
        _ => default,
    }
}

fn bounded_int(label: &str, value: i64, min: i64, max: i64, default: i64) -> i64 {
    if (min..=max).contains(&value) {
        value
    } else {
        warn!("{} {} is outside {}..={}, using default: {}", label, value, min, max, default);
        default
    }
}

fn bounded_real(label: &str, value: f64, min: f64, max: f64, default: f64) -> f64 {
    if value.is_finite() && value >= min && value <= max {
        value
    } else {
        warn!("{} {} is outside {}..={}, using default: {}", label, value, min, max, default);
        default
    }
}

fn default_font_name() -> String {
    "UVN Van Bold".to_string()
}

fn default_font_size() -> i64 {
    20
}

fn default_font_outline() -> f64 {
    0.75
}

fn default_bitrate_kbps() -> i64 {
    5000
}

fn default_watermark_label() -> String {
    "animew.org".to_string()
}

fn default_extractor_path() -> String {
    "mkvextract".to_string()
}

fn default_subtitle_track_index() -> usize {
    // Third track: video, audio, subtitles
    2
}

fn default_input_extensions() -> Vec<String> {
    vec!["mkv".to_string(), "avi".to_string()]
}

fn default_inter_file_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write this configuration as pretty JSON
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Apply command line overrides on top of the file values
    pub fn apply_overrides(&mut self, overrides: &StyleOverrides) {
        let style = &mut self.style;

        if let Some(font_name) = &overrides.font_name {
            style.font_name = font_name.clone();
        }
        if let Some(raw) = &overrides.font_size {
            style.font_size = parse_bounded_int(raw, FONT_SIZE_MIN, FONT_SIZE_MAX, default_font_size());
        }
        if let Some(raw) = &overrides.font_outline {
            style.font_outline =
                parse_bounded_real(raw, FONT_OUTLINE_MIN, FONT_OUTLINE_MAX, default_font_outline());
        }
        if let Some(raw) = &overrides.bitrate_kbps {
            style.bitrate_kbps = parse_bounded_int(raw, BITRATE_MIN, BITRATE_MAX, default_bitrate_kbps());
        }
        if let Some(logo) = &overrides.logo_path {
            style.logo_path = Some(logo.clone());
        }
        if let Some(marquee) = &overrides.marquee_text {
            style.marquee_text = marquee.clone();
        }
        if let Some(label) = &overrides.watermark_label {
            style.watermark_label = label.clone();
        }
    }

    /// Folder that receives temporary subtitle files
    pub fn resolve_temp_folder(&self) -> PathBuf {
        if self.temp_folder.trim().is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(self.temp_folder.trim())
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.tools.extractor_path.trim().is_empty() {
            return Err(anyhow!("Extractor path must not be empty"));
        }

        if self.tools.get_encoder_path().trim().is_empty() {
            return Err(anyhow!("Encoder path must not be empty"));
        }

        if self.input_extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err(anyhow!("At least one input extension is required"));
        }

        if !self.temp_folder.trim().is_empty() && !Path::new(self.temp_folder.trim()).is_dir() {
            return Err(anyhow!("Temp folder is not a directory: {}", self.temp_folder));
        }

        // NVEncC splits --vpp-subburn options on commas
        if self.tools.encoder == EncoderKind::NvEncC
            && self.resolve_temp_folder().to_string_lossy().contains(',')
        {
            return Err(anyhow!(
                "Temp folder must not contain ',' when using {}: {}",
                self.tools.encoder.display_name(),
                self.resolve_temp_folder().display()
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            style: StyleConfig::default(),
            tools: ToolsConfig::default(),
            temp_folder: String::new(),
            subtitle_track_index: default_subtitle_track_index(),
            input_extensions: default_input_extensions(),
            show_tool_output: false,
            echo_commands: false,
            delete_after_encode: false,
            keep_subtitles: false,
            inter_file_delay_ms: default_inter_file_delay_ms(),
            skip_already_encoded: true,
            log_level: LogLevel::default(),
        }
    }
}
