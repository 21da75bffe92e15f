use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::{Config, StyleSettings};
use crate::command_builder::{temp_subtitle_path, ArgumentBuilder};
use crate::errors::PipelineError;
use crate::file_utils::{FileManager, MediaFile};
use crate::subtitle::{StyleInjector, SubtitleDocument, SubtitleFormat};
use crate::tools::{tool_name, ProcessRunner, ToolRunner};

// @module: Batch controller driving the per-file pipeline

/// Name of the run log written next to the processed files
pub const ISSUES_LOG_FILE: &str = "subburn.issues.log";

/// Pipeline position of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Pending,
    Extracting,
    Normalizing,
    Injecting,
    Encoding,
    Validating,
    Succeeded,
    Failed,
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Extracting => "extracting",
            Self::Normalizing => "normalizing",
            Self::Injecting => "injecting",
            Self::Encoding => "encoding",
            Self::Validating => "validating",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What happened to one file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub media: MediaFile,
    /// `Succeeded` or `Failed`
    pub state: FileState,
    /// Stage that was running when the file failed
    pub failed_during: Option<FileState>,
    /// Raw error detail of a failure
    pub error: Option<String>,
    /// A valid output already existed, nothing was encoded
    pub reused_existing_output: bool,
    /// The source container was deleted after success
    pub source_deleted: bool,
    pub elapsed: Duration,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == FileState::Succeeded
    }
}

/// Outcomes of a batch, in processing order
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

/// Temporary subtitle files created while processing one file
#[derive(Debug, Default)]
pub struct SubtitleAssets {
    paths: Vec<PathBuf>,
}

impl SubtitleAssets {
    fn track(&mut self, path: PathBuf) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove every tracked file that still exists
    pub fn cleanup(&mut self) {
        for path in self.paths.drain(..) {
            if let Err(e) = FileManager::remove_if_exists(&path) {
                warn!("Failed to remove temporary subtitle: {}", e);
            }
        }
    }
}

/// Main application controller for batch encoding
pub struct Controller<R: ToolRunner = ProcessRunner> {
    // @field: App configuration
    config: Config,

    // @field: Validated style settings for this run
    settings: StyleSettings,

    // @field: Runs the extractor and the encoder
    runner: R,
}

impl Controller<ProcessRunner> {
    // @method: Create a controller running the tools as child processes
    pub fn with_config(config: Config) -> Result<Self> {
        let runner = ProcessRunner::new(config.show_tool_output, config.echo_commands);
        Self::with_runner(config, runner)
    }
}

impl<R: ToolRunner> Controller<R> {
    // @method: Create a controller with a custom tool runner
    pub fn with_runner(config: Config, runner: R) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let settings = StyleSettings::from_config(&config);

        Ok(Self { config, settings, runner })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &StyleSettings {
        &self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Encode every matching container below `input_dir`
    pub async fn run_folder(&self, input_dir: &Path) -> Result<BatchSummary> {
        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_files(input_dir, &self.config.input_extensions)?;
        info!("Preparing to process {} files...", files.len());

        if files.is_empty() {
            warn!("No files with extensions {:?} found in {:?}", self.config.input_extensions, input_dir);
            return Ok(BatchSummary::default());
        }

        let summary = self.run_files(&files).await;

        if summary.failed_count() > 0 {
            let log_file_path = input_dir.join(ISSUES_LOG_FILE);
            if let Err(e) = Self::write_issues_log(&summary, &log_file_path) {
                warn!("Failed to write issues log: {}", e);
            } else {
                info!("Failures written to {:?}", log_file_path);
            }
        }

        Ok(summary)
    }

    /// Process files one after another, pausing between them
    pub async fn run_files(&self, files: &[PathBuf]) -> BatchSummary {
        let start_time = Instant::now();
        let mut summary = BatchSummary::default();

        let progress_bar = ProgressBar::new(files.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        for (index, file) in files.iter().enumerate() {
            if index > 0 && self.config.inter_file_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.inter_file_delay_ms)).await;
            }

            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            progress_bar.set_message(format!("Processing: {}", file_name));

            let outcome = self.process_file(file).await;
            if outcome.succeeded() {
                info!(
                    "Encoded: {:?} in {}",
                    outcome.media.output,
                    Self::format_duration(outcome.elapsed)
                );
            } else {
                error!(
                    "Encode failed - {:?}: {}",
                    outcome.media.input,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }

            summary.outcomes.push(outcome);
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();

        info!(
            "Done: {} succeeded, {} failed in {}",
            summary.succeeded_count(),
            summary.failed_count(),
            Self::format_duration(start_time.elapsed())
        );

        summary
    }

    /// Run the whole pipeline for one file.
    ///
    /// Never fails: errors end in a `Failed` outcome, and the temporary
    /// subtitle files are removed either way unless `keep_subtitles` is set.
    pub async fn process_file(&self, input: &Path) -> FileOutcome {
        let start_time = Instant::now();
        let media = MediaFile::new(input);
        let mut state = FileState::Pending;
        let mut assets = SubtitleAssets::default();

        let result = self.run_pipeline(&media, &mut state, &mut assets).await;

        if !self.config.keep_subtitles {
            assets.cleanup();
        }

        match result {
            Ok(reused_existing_output) => {
                Self::transition(&media, &mut state, FileState::Succeeded);
                let source_deleted = self.config.delete_after_encode && self.delete_source(&media);

                FileOutcome {
                    media,
                    state,
                    failed_during: None,
                    error: None,
                    reused_existing_output,
                    source_deleted,
                    elapsed: start_time.elapsed(),
                }
            }
            Err(e) => {
                let failed_during = state;
                Self::transition(&media, &mut state, FileState::Failed);

                FileOutcome {
                    media,
                    state,
                    failed_during: Some(failed_during),
                    error: Some(format!("{:#}", e)),
                    reused_existing_output: false,
                    source_deleted: false,
                    elapsed: start_time.elapsed(),
                }
            }
        }
    }

    /// Extract, normalize and inject the subtitle of one container and
    /// write `<stem>.ass` next to it. No encoding.
    pub async fn run_subtitle_only(&self, input: &Path) -> Result<PathBuf> {
        let media = MediaFile::new(input);
        let mut state = FileState::Pending;
        let mut assets = SubtitleAssets::default();

        let result = self.prepare_subtitle(&media, &mut state, &mut assets).await;
        let output = input.with_extension("ass");
        let copied = result.and_then(|subtitle| {
            std::fs::copy(&subtitle, &output)
                .with_context(|| format!("Failed to copy subtitle to {:?}", output))
        });

        if !self.config.keep_subtitles {
            assets.cleanup();
        }

        copied?;
        info!("Subtitle written: {:?}", output);
        Ok(output)
    }

    async fn run_pipeline(
        &self,
        media: &MediaFile,
        state: &mut FileState,
        assets: &mut SubtitleAssets,
    ) -> Result<bool> {
        if self.config.skip_already_encoded
            && FileManager::check_output_size(&media.input, &media.output).is_ok()
        {
            info!("Already encoded, skipping: {:?}", media.output);
            return Ok(true);
        }

        let subtitle = self.prepare_subtitle(media, state, assets).await?;

        Self::transition(media, state, FileState::Encoding);
        let builder = ArgumentBuilder::new(&self.settings, self.config.tools.encoder);
        let args = builder.encoding_args(&media.input, &subtitle, &media.output);
        let encoder = self.config.tools.get_encoder_path();
        let exit = self.runner.run(&encoder, &args).await?;
        debug!("{} finished with {:?}", tool_name(&encoder), exit.code);

        Self::transition(media, state, FileState::Validating);
        FileManager::check_output_size(&media.input, &media.output)?;

        Ok(false)
    }

    async fn prepare_subtitle(
        &self,
        media: &MediaFile,
        state: &mut FileState,
        assets: &mut SubtitleAssets,
    ) -> Result<PathBuf> {
        Self::transition(media, state, FileState::Extracting);
        let raw_path = temp_subtitle_path(&self.settings.temp_folder);
        assets.track(raw_path.clone());

        let builder = ArgumentBuilder::new(&self.settings, self.config.tools.encoder);
        let args = builder.extraction_args(&media.input, self.config.subtitle_track_index, &raw_path);
        self.runner.run(&self.config.tools.extractor_path, &args).await?;

        if !FileManager::file_exists(&raw_path) {
            return Err(PipelineError::MissingOutput(raw_path).into());
        }

        Self::transition(media, state, FileState::Normalizing);
        let content = FileManager::read_to_string(&raw_path)?;
        let format = SubtitleFormat::detect(&content);
        debug!("Extracted subtitle is {}", format);

        let subtitle_path = raw_path.with_extension(SubtitleFormat::StyleSheet.extension());
        assets.track(subtitle_path.clone());
        if format == SubtitleFormat::StyleSheet {
            std::fs::rename(&raw_path, &subtitle_path)
                .with_context(|| format!("Failed to rename {:?}", raw_path))?;
        }

        let title = media
            .input
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let document = SubtitleDocument::parse_named(&content, &title)?.normalized();
        let canonical = document.render();
        FileManager::write_to_file(&subtitle_path, &canonical)?;

        Self::transition(media, state, FileState::Injecting);
        let injector = StyleInjector::new(&self.settings);
        let injected = injector.inject_text(
            &canonical,
            &self.settings.watermark_label,
            &self.settings.marquee_text,
        );
        FileManager::write_to_file(&subtitle_path, &injected)?;

        Ok(subtitle_path)
    }

    fn delete_source(&self, media: &MediaFile) -> bool {
        match FileManager::remove_if_exists(&media.input) {
            Ok(removed) => {
                if removed {
                    info!("Deleted source: {:?}", media.input);
                }
                removed
            }
            Err(e) => {
                warn!("Failed to delete source: {}", e);
                false
            }
        }
    }

    fn transition(media: &MediaFile, state: &mut FileState, next: FileState) {
        debug!("{:?}: {} -> {}", media.input, state, next);
        *state = next;
    }

    fn write_issues_log(summary: &BatchSummary, log_file_path: &Path) -> Result<()> {
        FileManager::append_to_log_file(
            log_file_path,
            &format!(
                "Batch finished: {} succeeded, {} failed",
                summary.succeeded_count(),
                summary.failed_count()
            ),
        )?;

        for outcome in summary.failures() {
            FileManager::append_to_log_file(
                log_file_path,
                &format!(
                    "[{}] {:?}: {}",
                    outcome.failed_during.unwrap_or(FileState::Failed),
                    outcome.media.input,
                    outcome.error.as_deref().unwrap_or("unknown error")
                ),
            )?;
        }

        Ok(())
    }

    /// Format a duration as `MM:SS`, or `H:MM:SS` past one hour
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }
}
