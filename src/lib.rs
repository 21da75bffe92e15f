/*!
 * # subburn - batch subtitle burn-in encoder
 *
 * A Rust library for burning styled subtitles into video containers.
 *
 * ## Features
 *
 * - Extract the subtitle track of each container with an external extractor
 * - Detect style-sheet (ASS) vs sequential caption (SRT) content
 * - Normalize both into one canonical style-sheet document
 * - Inject the run's dialogue style, a scrolling marquee and a watermark
 * - Re-encode with the subtitle burned in (ffmpeg or NVEncC)
 * - Sanity-check the output size and keep going when one file fails
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management and bounded style settings
 * - `subtitle`: Subtitle processing:
 *   - `subtitle::format`: Format detection
 *   - `subtitle::srt`: Sequential caption parsing
 *   - `subtitle::document`: Canonical style-sheet model and renderer
 *   - `subtitle::injector`: Style and overlay event injection
 * - `command_builder`: Argument lists for the extractor and the encoder
 * - `tools`: External process invocation
 * - `file_utils`: File system operations
 * - `app_controller`: Batch controller and per-file pipeline
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod subtitle;
pub mod command_builder;
pub mod tools;
pub mod app_controller;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::{Config, EncoderKind, StyleOverrides, StyleSettings};
pub use app_controller::{BatchSummary, Controller, FileOutcome, FileState};
pub use command_builder::ArgumentBuilder;
pub use subtitle::{StyleInjector, SubtitleDocument, SubtitleFormat};
pub use tools::{ProcessRunner, ToolExit, ToolRunner};
pub use errors::{AppError, PipelineError, SubtitleError};
