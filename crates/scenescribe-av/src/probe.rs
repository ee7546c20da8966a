//! FFprobe-based subtitle stream probing.

use crate::tools::{run, Toolchain};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Language reported for streams without a language tag.
const UNKNOWN_LANGUAGE: &str = "unknown";

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
    title: Option<String>,
}

/// A subtitle stream inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleStream {
    /// Position among the container's subtitle streams (for `-map 0:s:N`).
    pub index: u32,
    /// Absolute stream index in the container.
    pub stream_index: u32,
    /// Codec name, e.g. `subrip`, `ass`, `hdmv_pgs_subtitle`.
    pub codec: String,
    /// Language tag as stored in the container, or `"unknown"`.
    pub language: String,
    pub title: Option<String>,
}

/// Result of probing a container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    pub duration: Option<Duration>,
    /// Subtitle streams in container order.
    pub subtitle_streams: Vec<SubtitleStream>,
}

/// Probe `path` with ffprobe.
///
/// # Errors
///
/// Fails when the file is missing, ffprobe cannot be run, or its output is
/// not the expected JSON (for instance because the container is unreadable).
pub fn probe_subtitles(tools: &Toolchain, path: &Path) -> Result<ProbeReport> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = run(
        "ffprobe",
        Command::new(&tools.ffprobe)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path),
    )?;

    let json_str = String::from_utf8(output.stdout)
        .map_err(|e| Error::parse_error("ffprobe", format!("Invalid UTF-8: {}", e)))?;

    parse_ffprobe_output(&json_str)
}

fn parse_ffprobe_output(json_str: &str) -> Result<ProbeReport> {
    let output: FfprobeOutput = serde_json::from_str(json_str)?;

    let duration = output
        .format
        .and_then(|f| f.duration)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64);

    let subtitle_streams = output
        .streams
        .into_iter()
        .filter(|s| s.codec_type.as_deref() == Some("subtitle"))
        .enumerate()
        .map(|(ordinal, s)| SubtitleStream {
            index: ordinal as u32,
            stream_index: s.index,
            codec: s.codec_name.unwrap_or_default(),
            language: s
                .tags
                .language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
            title: s.tags.title,
        })
        .collect();

    Ok(ProbeReport {
        duration,
        subtitle_streams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264"},
            {"index": 1, "codec_type": "audio", "codec_name": "aac", "tags": {"language": "eng"}},
            {"index": 2, "codec_type": "subtitle", "codec_name": "subrip",
             "tags": {"language": "eng", "title": "English"}},
            {"index": 3, "codec_type": "subtitle", "codec_name": "hdmv_pgs_subtitle"}
        ],
        "format": {"filename": "movie.mkv", "duration": "5400.250000"}
    }"#;

    #[test]
    fn test_parse_keeps_only_subtitle_streams() {
        let report = parse_ffprobe_output(SAMPLE).unwrap();
        assert_eq!(report.subtitle_streams.len(), 2);

        let first = &report.subtitle_streams[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.stream_index, 2);
        assert_eq!(first.codec, "subrip");
        assert_eq!(first.language, "eng");
        assert_eq!(first.title.as_deref(), Some("English"));

        let second = &report.subtitle_streams[1];
        assert_eq!(second.index, 1);
        assert_eq!(second.language, "unknown");
        assert!(second.title.is_none());
    }

    #[test]
    fn test_parse_duration() {
        let report = parse_ffprobe_output(SAMPLE).unwrap();
        assert_eq!(report.duration, Some(Duration::from_secs_f64(5400.25)));
    }

    #[test]
    fn test_parse_without_format() {
        let report = parse_ffprobe_output(r#"{"streams": []}"#).unwrap();
        assert!(report.duration.is_none());
        assert!(report.subtitle_streams.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_ffprobe_output("not json").is_err());
    }

    #[test]
    fn test_probe_missing_file() {
        let err = probe_subtitles(&Toolchain::default(), Path::new("/nonexistent/x.mkv"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
