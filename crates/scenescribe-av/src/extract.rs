//! ffmpeg-based extraction of subtitle streams and single video frames.

use crate::probe::SubtitleStream;
use crate::tools::{run, Toolchain};
use crate::Result;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Image-based subtitle codecs that cannot be converted to text.
const BITMAP_CODECS: &[&str] = &["hdmv_pgs_subtitle", "dvd_subtitle", "dvb_subtitle", "xsub"];

/// Whether `codec` stores subtitles as images.
pub fn is_bitmap_codec(codec: &str) -> bool {
    BITMAP_CODECS.contains(&codec)
}

/// File extension used when extracting a stream with `codec`.
///
/// Text codecs are converted to SRT; bitmap codecs are copied into a
/// container that can hold them.
pub fn output_extension(codec: &str) -> &'static str {
    match codec {
        "hdmv_pgs_subtitle" => "sup",
        "dvd_subtitle" | "dvb_subtitle" | "xsub" => "mks",
        _ => "srt",
    }
}

/// Build the ffmpeg arguments that write `stream` of `input` to `output`.
pub fn subtitle_extract_args(input: &Path, stream: &SubtitleStream, output: &Path) -> Vec<OsString> {
    let codec_arg = if is_bitmap_codec(&stream.codec) {
        "copy"
    } else {
        "srt"
    };
    vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-i".into(),
        input.as_os_str().to_owned(),
        "-map".into(),
        format!("0:s:{}", stream.index).into(),
        "-c:s".into(),
        codec_arg.into(),
        output.as_os_str().to_owned(),
    ]
}

/// Extract one subtitle stream to `output`.
pub fn extract_subtitle(
    tools: &Toolchain,
    input: &Path,
    stream: &SubtitleStream,
    output: &Path,
) -> Result<()> {
    run(
        "ffmpeg",
        Command::new(&tools.ffmpeg).args(subtitle_extract_args(input, stream, output)),
    )?;
    Ok(())
}

/// Build the ffmpeg arguments that grab the frame at `at` as a JPEG.
pub fn frame_args(input: &Path, at: Duration, output: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-ss".into(),
        format!("{:.3}", at.as_secs_f64()).into(),
        "-i".into(),
        input.as_os_str().to_owned(),
        "-vframes".into(),
        "1".into(),
        "-q:v".into(),
        "2".into(),
        output.as_os_str().to_owned(),
    ]
}

/// Write the frame at `at` to `output`.
pub fn extract_frame(tools: &Toolchain, input: &Path, at: Duration, output: &Path) -> Result<()> {
    run(
        "ffmpeg",
        Command::new(&tools.ffmpeg).args(frame_args(input, at, output)),
    )?;
    Ok(())
}
