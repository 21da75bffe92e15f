/*!
 * End-to-end tests of the per-file pipeline with a fake extractor and encoder
 */

use anyhow::Result;
use std::fs;
use subburn::app_config::EncoderKind;
use subburn::app_controller::{Controller, FileState};
use subburn::subtitle::injector::{LOGO_STYLE_NAME, MARQUEE_STYLE_NAME};
use subburn::subtitle::SubtitleDocument;
use crate::common;
use crate::common::fake_runner::FakeRunner;

/// Test a style-sheet track through the whole pipeline
#[tokio::test]
async fn test_process_file_withStyleSheetTrack_shouldInjectAndEncode() -> Result<()> {
    common::init_test_logging();
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "episode.mkv", 300)?;

    let runner = FakeRunner::new(common::SAMPLE_ASS, 200).with_snapshot_dir(temp_dir.path());
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner.clone())?;

    let outcome = controller.process_file(&input).await;

    assert!(outcome.succeeded(), "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.state, FileState::Succeeded);
    assert!(!outcome.reused_existing_output);
    assert_eq!(outcome.media.output, media_dir.path().join("episode.mp4"));
    assert_eq!(fs::metadata(&outcome.media.output)?.len(), 200);

    let seen = runner.subtitles_seen();
    assert_eq!(seen.len(), 1);
    let doc = SubtitleDocument::parse_str(&seen[0])?;
    let names: Vec<&str> = doc.styles.as_ref().unwrap().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Default", MARQUEE_STYLE_NAME, LOGO_STYLE_NAME]);

    let events = doc.events();
    assert_eq!(events.len(), 5);
    assert_eq!(events[0].style, LOGO_STYLE_NAME);
    assert_eq!(events[1].style, MARQUEE_STYLE_NAME);
    assert_eq!(events[1].text, "Welcome to the show");
    assert_eq!(events[2].style, MARQUEE_STYLE_NAME);
    assert_eq!(events[3].text, "First line");
    assert_eq!(events[4].text, "Second line, with a comma");
    Ok(())
}

/// Test a caption track converted before injection
#[tokio::test]
async fn test_process_file_withCaptionTrack_shouldConvertAndDropEmptyEntries() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "movie.mkv", 300)?;

    let runner = FakeRunner::new(common::SRT_WITH_EMPTY_ENTRY, 200).with_snapshot_dir(temp_dir.path());
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner.clone())?;

    let outcome = controller.process_file(&input).await;
    assert!(outcome.succeeded(), "unexpected failure: {:?}", outcome.error);

    let seen = runner.subtitles_seen();
    assert_eq!(seen.len(), 1);
    let doc = SubtitleDocument::parse_str(&seen[0])?;

    assert_eq!(doc.script_info.as_ref().unwrap()[0].1, "movie");
    let default = doc.style("Default").unwrap();
    assert_eq!(default.font_name, "UVN Van Bold");
    assert_eq!(default.font_size, 20.0);

    let texts: Vec<&str> = doc.events().iter().skip(3).map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Before", "After"]);
    Ok(())
}

/// Test the commands sent to the tools
#[tokio::test]
async fn test_process_file_withDefaults_shouldCallExtractorThenEncoder() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "show.mkv", 300)?;

    let runner = FakeRunner::new(common::SAMPLE_SRT, 200);
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner.clone())?;

    controller.process_file(&input).await;

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);

    assert_eq!(calls[0].program, "mkvextract");
    assert_eq!(calls[0].args[0], "tracks");
    assert_eq!(calls[0].args[1], input.to_string_lossy());
    let target = calls[0].args[2].strip_prefix("2:").unwrap();
    assert!(target.starts_with(&*temp_dir.path().to_string_lossy()));
    assert!(target.ends_with(".srt"));

    assert_eq!(calls[1].program, "ffmpeg");
    assert!(calls[1].args.contains(&"5000k".to_string()));
    assert!(calls[1].args[3].contains(".ass':charenc=UTF-8"));
    Ok(())
}

/// Test the NVEncC backend selection
#[tokio::test]
async fn test_process_file_withNvEncC_shouldUseNvEncCBinary() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "show.avi", 300)?;

    let mut config = common::test_config(temp_dir.path());
    config.tools.encoder = EncoderKind::NvEncC;
    let runner = FakeRunner::new(common::SAMPLE_ASS, 200);
    let controller = Controller::with_runner(config, runner.clone())?;

    let outcome = controller.process_file(&input).await;

    assert!(outcome.succeeded(), "unexpected failure: {:?}", outcome.error);
    let encoder_calls = runner.encoder_calls();
    assert_eq!(encoder_calls.len(), 1);
    assert_eq!(encoder_calls[0].program, "NVEncC");
    assert!(encoder_calls[0].args.contains(&"--vpp-subburn".to_string()));
    Ok(())
}

/// Test that no temporary subtitle is left behind
#[tokio::test]
async fn test_process_file_withDefaults_shouldRemoveTemporarySubtitles() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "episode.mkv", 300)?;

    let runner = FakeRunner::new(common::SAMPLE_ASS, 200);
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner)?;

    controller.process_file(&input).await;

    assert!(common::files_with_extension(temp_dir.path(), "srt").is_empty());
    assert!(common::files_with_extension(temp_dir.path(), "ass").is_empty());
    Ok(())
}

/// Test that keep_subtitles leaves the injected subtitle in place
#[tokio::test]
async fn test_process_file_withKeepSubtitles_shouldKeepInjectedFile() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "episode.mkv", 300)?;

    let mut config = common::test_config(temp_dir.path());
    config.keep_subtitles = true;
    let controller = Controller::with_runner(config, FakeRunner::new(common::SAMPLE_SRT, 200))?;

    controller.process_file(&input).await;

    let kept = common::files_with_extension(temp_dir.path(), "ass");
    assert_eq!(kept.len(), 1);
    let doc = SubtitleDocument::parse_file(&kept[0])?;
    assert_eq!(doc.events().len(), 6);
    Ok(())
}

/// Test a failed extraction
#[tokio::test]
async fn test_process_file_withNoExtractedTrack_shouldFailBeforeEncoding() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "nosubs.mkv", 300)?;

    let runner = FakeRunner::new(common::SAMPLE_ASS, 200).without_subtitle_for("nosubs.mkv");
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner.clone())?;

    let outcome = controller.process_file(&input).await;

    assert_eq!(outcome.state, FileState::Failed);
    assert_eq!(outcome.failed_during, Some(FileState::Extracting));
    assert!(outcome.error.as_deref().unwrap_or_default().contains("Expected output was not produced"));
    assert!(runner.encoder_calls().is_empty());
    assert!(!outcome.media.output.exists());
    Ok(())
}

/// Test an extractor that cannot be started
#[tokio::test]
async fn test_process_file_withMissingTool_shouldReportSubprocessFailure() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "episode.mkv", 300)?;

    let runner = FakeRunner::new(common::SAMPLE_ASS, 200).failing_to_start();
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner)?;

    let outcome = controller.process_file(&input).await;

    assert_eq!(outcome.failed_during, Some(FileState::Extracting));
    assert!(outcome.error.as_deref().unwrap_or_default().starts_with("mkvextract failed"));
    Ok(())
}

/// Test an encode whose output is too small
#[tokio::test]
async fn test_process_file_withTinyOutput_shouldFailValidation() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "broken.mkv", 300)?;

    let mut config = common::test_config(temp_dir.path());
    config.delete_after_encode = true;
    let runner = FakeRunner::new(common::SAMPLE_ASS, 200).with_small_output_for("broken.mkv");
    let controller = Controller::with_runner(config, runner)?;

    let outcome = controller.process_file(&input).await;

    assert_eq!(outcome.state, FileState::Failed);
    assert_eq!(outcome.failed_during, Some(FileState::Validating));
    assert!(outcome.error.as_deref().unwrap_or_default().contains("Output too small"));
    assert!(!outcome.source_deleted);
    assert!(input.exists());
    Ok(())
}

/// Test subtitle-only mode
#[tokio::test]
async fn test_run_subtitle_only_withCaptionTrack_shouldWriteAssNextToInput() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "episode.mkv", 300)?;

    let runner = FakeRunner::new(common::SAMPLE_SRT, 200);
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner.clone())?;

    let output = controller.run_subtitle_only(&input).await?;

    assert_eq!(output, media_dir.path().join("episode.ass"));
    let doc = SubtitleDocument::parse_file(&output)?;
    assert_eq!(doc.events().len(), 6);
    assert!(doc.style(MARQUEE_STYLE_NAME).is_some());
    assert!(runner.encoder_calls().is_empty());
    assert!(common::files_with_extension(temp_dir.path(), "ass").is_empty());
    Ok(())
}
