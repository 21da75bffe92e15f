use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::app_config::{EncoderKind, StyleSettings};

// @module: Argument lists for the track extractor and the encoder

/// Audio codec used by the ffmpeg backend
pub const FFMPEG_AUDIO_CODEC: &str = "mp3";
/// Video codec used by the ffmpeg backend
pub const FFMPEG_VIDEO_CODEC: &str = "h264_nvenc";
/// Audio codec used by the NVEncC backend
pub const NVENCC_AUDIO_CODEC: &str = "libmp3lame";

// @const: Logo in the top-right corner, 1% in from both edges
const LOGO_OVERLAY_FILTER: &str =
    "[0:v][1:v] overlay=x=main_w-overlay_w-(main_w*0.01):y=main_h*0.01";

/// Make a filesystem path safe inside a single-quoted filter-graph value.
///
/// Backslashes are doubled first, then colons get a backslash and single
/// quotes are doubled.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "''")
}

/// Fresh `.srt` path inside the temp folder for one extraction
pub fn temp_subtitle_path(temp_folder: &Path) -> PathBuf {
    temp_folder.join(format!("{}.srt", Uuid::new_v4().simple()))
}

/// Builds the command lines for one file
pub struct ArgumentBuilder<'a> {
    settings: &'a StyleSettings,
    encoder: EncoderKind,
}

impl<'a> ArgumentBuilder<'a> {
    pub fn new(settings: &'a StyleSettings, encoder: EncoderKind) -> Self {
        Self { settings, encoder }
    }

    /// `tracks <input> <track>:<output>`
    pub fn extraction_args(&self, input: &Path, track_index: usize, output: &Path) -> Vec<String> {
        vec![
            "tracks".to_string(),
            input.to_string_lossy().to_string(),
            format!("{}:{}", track_index, output.to_string_lossy()),
        ]
    }

    /// Encoder arguments for the configured backend
    pub fn encoding_args(&self, input: &Path, subtitle: &Path, output: &Path) -> Vec<String> {
        match self.encoder {
            EncoderKind::Ffmpeg => self.ffmpeg_args(input, subtitle, output),
            EncoderKind::NvEncC => self.nvencc_args(input, subtitle, output),
        }
    }

    /// Filter graph burning the subtitle in, with the logo overlay when one is set
    pub fn ffmpeg_filter(&self, subtitle: &Path) -> String {
        let subtitles = format!(
            "subtitles='{}':charenc=UTF-8",
            escape_filter_path(&subtitle.to_string_lossy())
        );

        if self.settings.logo_path.is_some() {
            format!("{}, {}", LOGO_OVERLAY_FILTER, subtitles)
        } else {
            format!("[0:v] {}", subtitles)
        }
    }

    fn ffmpeg_args(&self, input: &Path, subtitle: &Path, output: &Path) -> Vec<String> {
        let mut args = vec!["-i".to_string(), input.to_string_lossy().to_string()];

        if let Some(logo) = &self.settings.logo_path {
            args.push("-i".to_string());
            args.push(logo.to_string_lossy().to_string());
        }

        args.extend([
            "-filter_complex".to_string(),
            self.ffmpeg_filter(subtitle),
            "-c:v".to_string(),
            FFMPEG_VIDEO_CODEC.to_string(),
            "-b:v".to_string(),
            format!("{}k", self.settings.bitrate_kbps),
            "-c:a".to_string(),
            FFMPEG_AUDIO_CODEC.to_string(),
            output.to_string_lossy().to_string(),
            "-y".to_string(),
        ]);
        args
    }

    fn nvencc_args(&self, input: &Path, subtitle: &Path, output: &Path) -> Vec<String> {
        vec![
            "--avhw".to_string(),
            "-c".to_string(),
            "avc".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "--vpp-subburn".to_string(),
            format!("filename={},charcode=utf-8", subtitle.to_string_lossy()),
            "--vbr".to_string(),
            self.settings.bitrate_kbps.to_string(),
            "--audio-codec".to_string(),
            NVENCC_AUDIO_CODEC.to_string(),
            "-o".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}
