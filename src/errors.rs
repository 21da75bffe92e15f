/*!
 * Error types for the subburn application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during subtitle processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The content has no recognizable timing/text structure
    #[error("Failed to parse subtitle: {0}")]
    Parse(String),

    /// A structural marker needed for injection is missing.
    /// Callers treat this as a skip rather than a failure.
    #[error("Anchor not found: {0}")]
    AnchorNotFound(String),

    /// Error reading or writing a subtitle asset
    #[error("Subtitle I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SubtitleError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Errors raised while driving the external tools for one file
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The tool could not be started or its result is unusable
    #[error("{tool} failed: {detail}")]
    SubprocessFailure {
        /// Tool name as configured
        tool: String,
        /// Raw failure detail
        detail: String,
    },

    /// The source container disappeared mid-run
    #[error("Input file is missing: {0:?}")]
    MissingInput(PathBuf),

    /// A tool exited without producing the file it was asked for
    #[error("Expected output was not produced: {0:?}")]
    MissingOutput(PathBuf),

    /// The encoded output is too small relative to its input
    #[error("Output too small: {output_size} bytes for {input_size} bytes of input")]
    ValidationFailure {
        /// Input container size in bytes
        input_size: u64,
        /// Encoded output size in bytes
        output_size: u64,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the tool pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
