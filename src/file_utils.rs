use anyhow::{Context, Result};
use chrono::Local;
use log::debug;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::PipelineError;

// @module: File and directory utilities

/// Extension of every encoded output
pub const OUTPUT_EXTENSION: &str = "mp4";

// @struct: Input container and the output it encodes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    // @field: Source container
    pub input: PathBuf,

    // @field: Encoded output, same stem with the output extension
    pub output: PathBuf,
}

impl MediaFile {
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        let input = input.as_ref().to_path_buf();
        let output = FileManager::generate_output_path(&input);
        Self { input, output }
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Encoded output path next to the input
    // @invariant: never equal to the input path
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P) -> PathBuf {
        let input_file = input_file.as_ref();
        let output = input_file.with_extension(OUTPUT_EXTENSION);

        if output == input_file {
            let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
            input_file.with_file_name(format!("{}.encoded.{}", stem, OUTPUT_EXTENSION))
        } else {
            output
        }
    }

    /// Find files with any of the given extensions, recursively, in a stable order
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let wanted: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        let mut result = Vec::new();
        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if wanted.contains(&ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Delete a file if it is there. Returns whether something was removed.
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
        let path = path.as_ref();
        if !Self::file_exists(path) {
            return Ok(false);
        }

        fs::remove_file(path).with_context(|| format!("Failed to remove file: {:?}", path))?;
        debug!("Removed {:?}", path);
        Ok(true)
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Size heuristic for a finished encode: the output must be larger than
    /// a third of the input (integer division).
    pub fn output_size_acceptable(input_size: u64, output_size: u64) -> bool {
        input_size / 3 < output_size
    }

    /// Apply the size heuristic to files on disk
    pub fn check_output_size<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_file: P2,
    ) -> std::result::Result<(), PipelineError> {
        let output_file = output_file.as_ref();

        let output_size = fs::metadata(output_file)
            .map_err(|_| PipelineError::MissingOutput(output_file.to_path_buf()))?
            .len();
        let input_size = fs::metadata(input_file.as_ref())
            .map_err(|_| PipelineError::MissingInput(input_file.as_ref().to_path_buf()))?
            .len();

        if Self::output_size_acceptable(input_size, output_size) {
            Ok(())
        } else {
            Err(PipelineError::ValidationFailure { input_size, output_size })
        }
    }
}
