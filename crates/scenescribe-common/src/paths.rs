//! Path utilities for detecting file types by extension.
//!
//! Used by the batch walker to pick up videos and by the sidecar scanner to
//! recognize subtitle files sitting next to them.

use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv",
];

/// List of supported subtitle file extensions.
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "sub", "vtt", "idx"];

fn has_extension(path: &Path, list: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| list.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use scenescribe_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.mkv")));
/// assert!(is_video_file(Path::new("/path/to/video.MP4")));
/// assert!(!is_video_file(Path::new("subtitle.srt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Check if a path has a subtitle file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use scenescribe_common::paths::is_subtitle_file;
///
/// assert!(is_subtitle_file(Path::new("movie.fr.srt")));
/// assert!(!is_subtitle_file(Path::new("video.mkv")));
/// ```
pub fn is_subtitle_file(path: &Path) -> bool {
    has_extension(path, SUBTITLE_EXTENSIONS)
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Get the list of subtitle file extensions.
#[must_use]
pub fn subtitle_extensions() -> &'static [&'static str] {
    SUBTITLE_EXTENSIONS
}

/// File stem as an owned string, lossy for non-UTF-8 names.
///
/// Returns an empty string for paths without a file name.
pub fn stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        for ext in VIDEO_EXTENSIONS {
            assert!(is_video_file(Path::new(&format!("movie.{}", ext))));
        }
        assert!(is_video_file(Path::new("movie.MKV")));
        assert!(is_video_file(Path::new("/path/to/movie.1080p.mkv")));

        assert!(!is_video_file(Path::new("subtitle.srt")));
        assert!(!is_video_file(Path::new("no_extension")));
        assert!(!is_video_file(Path::new("")));
    }

    #[test]
    fn test_is_subtitle_file() {
        for ext in SUBTITLE_EXTENSIONS {
            assert!(is_subtitle_file(Path::new(&format!("movie.{}", ext))));
        }
        assert!(is_subtitle_file(Path::new("movie.en.SRT")));
        assert!(!is_subtitle_file(Path::new("movie.mkv")));
        assert!(!is_subtitle_file(Path::new("filename")));
    }

    #[test]
    fn test_extension_lists() {
        assert_eq!(video_extensions().len(), 9);
        assert_eq!(subtitle_extensions().len(), 6);
        assert!(subtitle_extensions().contains(&"idx"));
    }

    #[test]
    fn test_stem_string() {
        assert_eq!(stem_string(Path::new("/a/b/Movie.2010.mkv")), "Movie.2010");
        assert_eq!(stem_string(Path::new("")), "");
    }
}
