/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;
use subburn::errors::{AppError, PipelineError, SubtitleError};

/// Test subtitle error messages
#[test]
fn test_subtitle_error_display_shouldIncludeDetail() {
    let error = SubtitleError::Parse("no caption timing lines were found".to_string());
    assert_eq!(error.to_string(), "Failed to parse subtitle: no caption timing lines were found");

    let error = SubtitleError::AnchorNotFound("style table".to_string());
    assert_eq!(error.to_string(), "Anchor not found: style table");
}

/// Test pipeline error messages
#[test]
fn test_pipeline_error_display_shouldIncludeToolAndSizes() {
    let error = PipelineError::SubprocessFailure {
        tool: "mkvextract".to_string(),
        detail: "not found".to_string(),
    };
    assert_eq!(error.to_string(), "mkvextract failed: not found");

    let error = PipelineError::ValidationFailure { input_size: 300, output_size: 100 };
    assert_eq!(error.to_string(), "Output too small: 100 bytes for 300 bytes of input");

    let error = PipelineError::MissingOutput(PathBuf::from("out.mp4"));
    assert!(error.to_string().contains("out.mp4"));
}

/// Test conversions into the application error
#[test]
fn test_app_error_from_withInnerErrors_shouldWrap() {
    let app: AppError = SubtitleError::Io("denied".to_string()).into();
    assert!(matches!(app, AppError::Subtitle(SubtitleError::Io(_))));

    let app: AppError = PipelineError::MissingInput(PathBuf::from("in.mkv")).into();
    assert!(matches!(app, AppError::Pipeline(PipelineError::MissingInput(_))));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let app: AppError = io.into();
    assert!(matches!(app, AppError::File(_)));

    let app: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(app.to_string(), "Unknown error: boom");
}

/// Test io errors become subtitle io errors
#[test]
fn test_subtitle_error_from_io_shouldKeepMessage() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: SubtitleError = io.into();
    assert_eq!(error.to_string(), "Subtitle I/O error: denied");
}
