//! Subtitle files stored next to the video.

use std::path::Path;

use scenescribe_common::language::UNKNOWN;
use scenescribe_common::paths::{is_subtitle_file, stem_string};
use scenescribe_common::SubtitleSource;
use scenescribe_db::models::SubtitleArtifact;
use tracing::debug;

/// Find sidecar subtitles for `video`.
///
/// Matches `<stem>.<ext>` (language `unknown`) and `<stem>.<xx>.<ext>` where
/// `xx` is a two-letter language code. Results are sorted by file name. Never
/// fails; an unreadable directory yields no sidecars.
pub fn scan_sidecars(video: &Path) -> Vec<SubtitleArtifact> {
    let Some(dir) = video.parent() else {
        return Vec::new();
    };
    let stem = stem_string(video);
    if stem.is_empty() {
        return Vec::new();
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Cannot read video directory");
            return Vec::new();
        }
    };

    let mut found: Vec<(String, SubtitleArtifact)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_subtitle_file(path))
        .filter_map(|path| {
            let language = sidecar_language(&stem, &stem_string(&path))?;
            let name = path.file_name()?.to_string_lossy().into_owned();
            Some((name, SubtitleArtifact::new(language, SubtitleSource::Sidecar, path)))
        })
        .collect();

    found.sort_by(|a, b| a.0.cmp(&b.0));
    found.into_iter().map(|(_, artifact)| artifact).collect()
}

/// Language of a subtitle whose stem is `sub_stem`, or `None` when it does not
/// belong to the video with stem `video_stem`.
fn sidecar_language(video_stem: &str, sub_stem: &str) -> Option<String> {
    if sub_stem == video_stem {
        return Some(UNKNOWN.to_string());
    }
    let suffix = sub_stem.strip_prefix(video_stem)?.strip_prefix('.')?;
    (suffix.len() == 2 && suffix.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| suffix.to_lowercase())
}
