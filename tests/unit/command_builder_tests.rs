/*!
 * Tests for extractor and encoder argument lists
 */

use std::path::{Path, PathBuf};
use subburn::app_config::{EncoderKind, StyleSettings};
use subburn::command_builder::{escape_filter_path, temp_subtitle_path, ArgumentBuilder};

fn settings(logo: Option<&str>) -> StyleSettings {
    StyleSettings {
        font_name: "UVN Van Bold".to_string(),
        font_size: 20,
        font_outline: 0.75,
        bitrate_kbps: 5000,
        logo_path: logo.map(PathBuf::from),
        marquee_text: String::new(),
        watermark_label: "animew.org".to_string(),
        temp_folder: PathBuf::from("/tmp/subburn"),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Test filter path escaping on a Windows-style path
#[test]
fn test_escape_filter_path_withDriveAndQuote_shouldEscapeInOrder() {
    assert_eq!(escape_filter_path("C:\\temp\\a'b.srt"), "C\\:\\\\temp\\\\a''b.srt");
    assert_eq!(escape_filter_path("/tmp/plain.ass"), "/tmp/plain.ass");
}

/// Test the extractor command line
#[test]
fn test_extraction_args_withTrackIndex_shouldJoinTrackAndOutput() {
    let settings = settings(None);
    let builder = ArgumentBuilder::new(&settings, EncoderKind::Ffmpeg);

    let args = builder.extraction_args(Path::new("/videos/ep1.mkv"), 2, Path::new("/tmp/abc.srt"));

    assert_eq!(args, strings(&["tracks", "/videos/ep1.mkv", "2:/tmp/abc.srt"]));
}

/// Test the ffmpeg command line without a logo
#[test]
fn test_encoding_args_withFfmpegAndNoLogo_shouldBurnSubtitleOnly() {
    let settings = settings(None);
    let builder = ArgumentBuilder::new(&settings, EncoderKind::Ffmpeg);

    let args = builder.encoding_args(
        Path::new("/videos/ep1.mkv"),
        Path::new("/tmp/abc.ass"),
        Path::new("/videos/ep1.mp4"),
    );

    assert_eq!(
        args,
        strings(&[
            "-i",
            "/videos/ep1.mkv",
            "-filter_complex",
            "[0:v] subtitles='/tmp/abc.ass':charenc=UTF-8",
            "-c:v",
            "h264_nvenc",
            "-b:v",
            "5000k",
            "-c:a",
            "mp3",
            "/videos/ep1.mp4",
            "-y",
        ])
    );
}

/// Test the ffmpeg command line with a logo overlay
#[test]
fn test_encoding_args_withFfmpegAndLogo_shouldOverlayLogoFirst() {
    let settings = settings(Some("/assets/logo.png"));
    let builder = ArgumentBuilder::new(&settings, EncoderKind::Ffmpeg);

    let args = builder.encoding_args(
        Path::new("/videos/ep1.mkv"),
        Path::new("/tmp/abc.ass"),
        Path::new("/videos/ep1.mp4"),
    );

    assert_eq!(&args[..5], strings(&[
        "-i",
        "/videos/ep1.mkv",
        "-i",
        "/assets/logo.png",
        "-filter_complex",
    ]).as_slice());
    assert_eq!(
        args[5],
        "[0:v][1:v] overlay=x=main_w-overlay_w-(main_w*0.01):y=main_h*0.01, subtitles='/tmp/abc.ass':charenc=UTF-8"
    );
    assert_eq!(args.last().map(String::as_str), Some("-y"));
}

/// Test the NVEncC command line
#[test]
fn test_encoding_args_withNvEncC_shouldUseSubburnFilter() {
    let settings = settings(Some("/assets/logo.png"));
    let builder = ArgumentBuilder::new(&settings, EncoderKind::NvEncC);

    let args = builder.encoding_args(
        Path::new("/videos/ep1.mkv"),
        Path::new("/tmp/abc.ass"),
        Path::new("/videos/ep1.mp4"),
    );

    assert_eq!(
        args,
        strings(&[
            "--avhw",
            "-c",
            "avc",
            "-i",
            "/videos/ep1.mkv",
            "--vpp-subburn",
            "filename=/tmp/abc.ass,charcode=utf-8",
            "--vbr",
            "5000",
            "--audio-codec",
            "libmp3lame",
            "-o",
            "/videos/ep1.mp4",
        ])
    );
}

/// Test that the subtitle path in the filter is escaped
#[test]
fn test_ffmpeg_filter_withColonInPath_shouldEscapeIt() {
    let settings = settings(None);
    let builder = ArgumentBuilder::new(&settings, EncoderKind::Ffmpeg);

    let filter = builder.ffmpeg_filter(Path::new("/tmp/a:b/it's.ass"));

    assert_eq!(filter, "[0:v] subtitles='/tmp/a\\:b/it''s.ass':charenc=UTF-8");
}

/// Test temp subtitle naming
#[test]
fn test_temp_subtitle_path_withTwoCalls_shouldBeUniqueSrtFiles() {
    let folder = Path::new("/tmp/subburn");
    let first = temp_subtitle_path(folder);
    let second = temp_subtitle_path(folder);

    assert_ne!(first, second);
    assert_eq!(first.parent(), Some(folder));
    assert_eq!(first.extension().and_then(|e| e.to_str()), Some("srt"));
    assert_eq!(first.file_stem().map(|s| s.len()), Some(32));
}
