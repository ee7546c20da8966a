//! Internal Rust models matching the database schema.
//!
//! These are also the domain records the pipeline passes around: a
//! [`VideoRecord`] per file, its [`SubtitleArtifact`]s, the [`MergedMetadata`]
//! view, and one [`MetadataRecord`] per provider that answered.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use scenescribe_common::paths::stem_string;
use scenescribe_common::{SubtitleSource, VideoId, VideoStatus};
use serde::{Deserialize, Serialize};

/// One processed (or in-progress) video file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoRecord {
    pub id: VideoId,
    /// Unique key of the record.
    pub file_path: PathBuf,
    /// File stem as found on disk.
    pub original_name: String,
    /// Official title reported by the title recognizer, if any.
    pub canonical_title: Option<String>,
    /// Title used for lookups: canonical when known, otherwise the cleaned
    /// filename.
    pub working_title: String,
    pub status: VideoStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a pending record for `path`.
    pub fn new(path: &Path) -> Self {
        let now = Utc::now();
        let stem = stem_string(path);
        Self {
            id: VideoId::new(),
            file_path: path.to_path_buf(),
            working_title: stem.clone(),
            original_name: stem,
            canonical_title: None,
            status: VideoStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `status` and bump `updated_at`.
    pub fn advance(&mut self, status: VideoStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Mark the record failed with `message`.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.advance(VideoStatus::Failed);
    }
}

/// A subtitle track obtained for a video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubtitleArtifact {
    /// Two-letter language tag or `"unknown"`.
    pub language: String,
    pub source: SubtitleSource,
    /// Where the subtitle file is stored.
    pub path: PathBuf,
    /// File extension of the stored subtitle (`srt`, `ass`, `sup`, ...).
    pub format: String,
    /// Stream index or remote file id the artifact was produced from.
    pub content_ref: Option<String>,
}

impl SubtitleArtifact {
    /// Build an artifact whose format is taken from the path's extension.
    pub fn new(language: impl Into<String>, source: SubtitleSource, path: PathBuf) -> Self {
        let format = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "srt".to_string());
        Self {
            language: language.into(),
            source,
            path,
            format,
            content_ref: None,
        }
    }

    /// Attach the content reference.
    pub fn with_ref(mut self, content_ref: impl Into<String>) -> Self {
        self.content_ref = Some(content_ref.into());
        self
    }
}

/// Raw payload returned by one metadata provider. Never modified after fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataRecord {
    pub provider: String,
    pub payload: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

impl MetadataRecord {
    pub fn new(provider: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            provider: provider.into(),
            payload,
            fetched_at: Utc::now(),
        }
    }
}

/// Metadata reconciled across providers.
///
/// `runtime` is in minutes; `0` means unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MergedMetadata {
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub runtime: u32,
    pub overview: Option<String>,
    /// Original language of the work, as the provider reported it.
    pub language: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    /// Provider-specific identifiers, e.g. `imdb -> tt0113277`.
    pub external_ids: BTreeMap<String, String>,
    /// Providers that contributed, in precedence order.
    pub sources: Vec<String>,
}

impl MergedMetadata {
    /// True when no provider contributed anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.original_title.is_none()
            && self.release_date.is_none()
            && self.runtime == 0
            && self.overview.is_none()
            && self.language.is_none()
            && self.rating.is_none()
            && self.genres.is_empty()
            && self.actors.is_empty()
            && self.external_ids.is_empty()
    }

    /// The IMDb identifier, if any provider supplied one.
    pub fn imdb_id(&self) -> Option<&str> {
        self.external_ids.get("imdb").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending() {
        let record = VideoRecord::new(Path::new("/movies/Heat.1995.1080p.mkv"));
        assert_eq!(record.status, VideoStatus::Pending);
        assert_eq!(record.original_name, "Heat.1995.1080p");
        assert_eq!(record.working_title, "Heat.1995.1080p");
        assert!(record.canonical_title.is_none());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_fail_sets_error_and_status() {
        let mut record = VideoRecord::new(Path::new("/x.mkv"));
        record.fail("disk full");
        assert_eq!(record.status, VideoStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("disk full"));
        assert!(record.updated_at >= record.created_at);
    }

    #[test]
    fn test_artifact_format_from_extension() {
        let a = SubtitleArtifact::new("fr", SubtitleSource::Sidecar, PathBuf::from("/m/a.fr.ASS"));
        assert_eq!(a.format, "ass");
        assert!(a.content_ref.is_none());

        let b = SubtitleArtifact::new("en", SubtitleSource::Embedded, PathBuf::from("/o/a_en.srt"))
            .with_ref("2");
        assert_eq!(b.content_ref.as_deref(), Some("2"));
    }

    #[test]
    fn test_merged_metadata_empty() {
        let mut merged = MergedMetadata::default();
        assert!(merged.is_empty());
        merged.sources.push("tmdb".into());
        assert!(merged.is_empty());
        merged.runtime = 90;
        assert!(!merged.is_empty());
    }

    #[test]
    fn test_imdb_id_lookup() {
        let mut merged = MergedMetadata::default();
        assert!(merged.imdb_id().is_none());
        merged
            .external_ids
            .insert("imdb".into(), "tt0113277".into());
        assert_eq!(merged.imdb_id(), Some("tt0113277"));
    }
}
