/*!
 * Integration tests for folder runs: ordering, failure isolation and cleanup
 */

use anyhow::Result;
use std::fs;
use std::time::{Duration, Instant};
use subburn::app_controller::{Controller, FileState, ISSUES_LOG_FILE};
use crate::common;
use crate::common::fake_runner::FakeRunner;

/// Test that one failing file does not stop the batch
#[tokio::test]
async fn test_run_folder_withMiddleFailure_shouldProcessEveryFile() -> Result<()> {
    common::init_test_logging();
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    common::create_media_file(media_dir.path(), "a.mkv", 300)?;
    common::create_media_file(media_dir.path(), "b.mkv", 300)?;
    common::create_media_file(media_dir.path(), "c.avi", 300)?;

    let runner = FakeRunner::new(common::SAMPLE_ASS, 200).with_small_output_for("b.mkv");
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner.clone())?;

    let summary = controller.run_folder(media_dir.path()).await?;

    assert_eq!(summary.outcomes.len(), 3);
    assert_eq!(summary.succeeded_count(), 2);
    assert_eq!(summary.failed_count(), 1);

    let names: Vec<String> = summary
        .outcomes
        .iter()
        .map(|o| o.media.input.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.mkv", "b.mkv", "c.avi"]);
    assert_eq!(summary.outcomes[1].state, FileState::Failed);
    assert!(summary.outcomes[2].succeeded());

    assert_eq!(runner.extraction_calls().len(), 3);
    assert_eq!(runner.encoder_calls().len(), 3);
    Ok(())
}

/// Test the issues log written after a batch with failures
#[tokio::test]
async fn test_run_folder_withFailure_shouldWriteIssuesLog() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    common::create_media_file(media_dir.path(), "good.mkv", 300)?;
    common::create_media_file(media_dir.path(), "nosubs.mkv", 300)?;

    let runner = FakeRunner::new(common::SAMPLE_ASS, 200).without_subtitle_for("nosubs.mkv");
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner)?;

    controller.run_folder(media_dir.path()).await?;

    let log = fs::read_to_string(media_dir.path().join(ISSUES_LOG_FILE))?;
    assert!(log.contains("1 succeeded, 1 failed"));
    assert!(log.contains("[extracting]"));
    assert!(log.contains("nosubs.mkv"));
    Ok(())
}

/// Test that a clean batch writes no issues log
#[tokio::test]
async fn test_run_folder_withAllSuccess_shouldNotWriteIssuesLog() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    common::create_media_file(media_dir.path(), "one.mkv", 300)?;

    let controller = Controller::with_runner(
        common::test_config(temp_dir.path()),
        FakeRunner::new(common::SAMPLE_SRT, 200),
    )?;

    let summary = controller.run_folder(media_dir.path()).await?;

    assert_eq!(summary.succeeded_count(), 1);
    assert!(!media_dir.path().join(ISSUES_LOG_FILE).exists());
    Ok(())
}

/// Test that unparsable subtitle content fails the file during normalization
#[tokio::test]
async fn test_run_folder_withUnreadableSubtitle_shouldFailDuringNormalizing() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    common::create_media_file(media_dir.path(), "odd.mkv", 300)?;

    let runner = FakeRunner::new("not a subtitle at all", 200);
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner.clone())?;

    let summary = controller.run_folder(media_dir.path()).await?;

    assert_eq!(summary.outcomes[0].failed_during, Some(FileState::Normalizing));
    assert!(runner.encoder_calls().is_empty());
    assert!(common::files_with_extension(temp_dir.path(), "srt").is_empty());
    Ok(())
}

/// Test source deletion after success only
#[tokio::test]
async fn test_run_folder_withDeleteAfterEncode_shouldDeleteSucceededSourcesOnly() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let good = common::create_media_file(media_dir.path(), "good.mkv", 300)?;
    let bad = common::create_media_file(media_dir.path(), "bad.mkv", 300)?;

    let mut config = common::test_config(temp_dir.path());
    config.delete_after_encode = true;
    let runner = FakeRunner::new(common::SAMPLE_ASS, 200).with_small_output_for("bad.mkv");
    let controller = Controller::with_runner(config, runner)?;

    let summary = controller.run_folder(media_dir.path()).await?;

    assert!(!good.exists());
    assert!(media_dir.path().join("good.mp4").exists());
    assert!(bad.exists());
    let deleted: Vec<bool> = summary.outcomes.iter().map(|o| o.source_deleted).collect();
    assert_eq!(deleted, vec![false, true]);
    Ok(())
}

/// Test that a valid existing output is reused
#[tokio::test]
async fn test_process_file_withExistingValidOutput_shouldSkipEncoding() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "done.mkv", 300)?;
    common::create_media_file(media_dir.path(), "done.mp4", 150)?;

    let runner = FakeRunner::new(common::SAMPLE_ASS, 200);
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner.clone())?;

    let outcome = controller.process_file(&input).await;

    assert!(outcome.succeeded());
    assert!(outcome.reused_existing_output);
    assert!(runner.calls().is_empty());
    assert_eq!(fs::metadata(media_dir.path().join("done.mp4"))?.len(), 150);
    Ok(())
}

/// Test that an undersized existing output is encoded again
#[tokio::test]
async fn test_process_file_withExistingTinyOutput_shouldReencode() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "redo.mkv", 300)?;
    common::create_media_file(media_dir.path(), "redo.mp4", 10)?;

    let runner = FakeRunner::new(common::SAMPLE_ASS, 200);
    let controller = Controller::with_runner(common::test_config(temp_dir.path()), runner.clone())?;

    let outcome = controller.process_file(&input).await;

    assert!(outcome.succeeded());
    assert!(!outcome.reused_existing_output);
    assert_eq!(runner.encoder_calls().len(), 1);
    assert_eq!(fs::metadata(media_dir.path().join("redo.mp4"))?.len(), 200);
    Ok(())
}

/// Test that skipping can be turned off
#[tokio::test]
async fn test_process_file_withSkipDisabled_shouldAlwaysEncode() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_media_file(media_dir.path(), "again.mkv", 300)?;
    common::create_media_file(media_dir.path(), "again.mp4", 150)?;

    let mut config = common::test_config(temp_dir.path());
    config.skip_already_encoded = false;
    let runner = FakeRunner::new(common::SAMPLE_ASS, 200);
    let controller = Controller::with_runner(config, runner.clone())?;

    let outcome = controller.process_file(&input).await;

    assert!(outcome.succeeded());
    assert_eq!(runner.encoder_calls().len(), 1);
    Ok(())
}

/// Test that the pause is applied between files
#[tokio::test]
async fn test_run_files_withDelay_shouldPauseBetweenFiles() -> Result<()> {
    let media_dir = common::create_temp_dir()?;
    let temp_dir = common::create_temp_dir()?;
    let first = common::create_media_file(media_dir.path(), "first.mkv", 300)?;
    let second = common::create_media_file(media_dir.path(), "second.mkv", 300)?;

    let mut config = common::test_config(temp_dir.path());
    config.inter_file_delay_ms = 50;
    let controller = Controller::with_runner(config, FakeRunner::new(common::SAMPLE_ASS, 200))?;

    let start = Instant::now();
    let summary = controller.run_files(&[first, second]).await;

    assert!(start.elapsed() >= Duration::from_millis(50));
    assert_eq!(summary.succeeded_count(), 2);
    Ok(())
}
