//! Remote subtitle search and download.
//!
//! Last cascade stage. Searches a subtitle service by IMDb id (or title when
//! no id is known) in English plus the film's original language, downloads
//! the first match per language and stores it as `<stem>_<lang>.srt`.

pub mod opensubtitles;

pub use opensubtitles::OpenSubtitlesClient;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use scenescribe_common::language::{search_code, to_two_letter};
use scenescribe_common::paths::stem_string;
use scenescribe_common::SubtitleSource;
use scenescribe_db::models::SubtitleArtifact;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PipelineError;

/// What the remote stage knows about the film when it runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleHints {
    /// Best known title: merged metadata title, else the working title.
    pub title: String,
    pub imdb_id: Option<String>,
    /// Original language as a provider reported it (`"Korean"`, `"ko"`, ...).
    pub original_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleQuery {
    /// An external identifier such as an IMDb id.
    ExternalId(String),
    Title(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCriteria {
    pub query: SubtitleQuery,
    /// Two-letter language codes.
    pub languages: Vec<String>,
}

/// One downloadable subtitle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCandidate {
    pub file_id: String,
    /// Language as reported by the service.
    pub language: String,
    pub release: Option<String>,
}

#[async_trait]
pub trait SubtitleSearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, criteria: &SubtitleCriteria) -> anyhow::Result<Vec<SubtitleCandidate>>;
}

#[async_trait]
pub trait SubtitleDownloadProvider: Send + Sync {
    async fn download(&self, candidate: &SubtitleCandidate) -> anyhow::Result<Bytes>;
}

/// English, plus the original language when it is known and not English.
///
/// ```
/// use scenescribe::subtitles::remote::target_languages;
///
/// assert_eq!(target_languages(Some("Korean")), vec!["en", "ko"]);
/// assert_eq!(target_languages(Some("english")), vec!["en"]);
/// assert_eq!(target_languages(None), vec!["en"]);
/// ```
pub fn target_languages(original_language: Option<&str>) -> Vec<String> {
    let mut languages = vec!["en".to_string()];
    if let Some(code) = original_language.and_then(search_code) {
        if !languages.contains(&code) {
            languages.push(code);
        }
    }
    languages
}

/// Pick the first candidate for each target language, in target order. When
/// none matches any target, fall back to the very first candidate.
pub fn pick_candidates<'a>(
    candidates: &'a [SubtitleCandidate],
    languages: &[String],
) -> Vec<(String, &'a SubtitleCandidate)> {
    let picks: Vec<_> = languages
        .iter()
        .filter_map(|lang| {
            candidates
                .iter()
                .find(|c| candidate_language(c) == *lang)
                .map(|c| (lang.clone(), c))
        })
        .collect();

    if !picks.is_empty() {
        return picks;
    }
    candidates
        .first()
        .map(|c| vec![(candidate_language(c), c)])
        .unwrap_or_default()
}

/// Two-letter language of a candidate; region suffixes (`pt-BR`) are dropped.
fn candidate_language(candidate: &SubtitleCandidate) -> String {
    let base = candidate
        .language
        .split(['-', '_'])
        .next()
        .unwrap_or_default();
    to_two_letter(base)
}

/// The remote stage: a search provider paired with a download provider.
#[derive(Clone)]
pub struct RemoteSubtitles {
    search: Arc<dyn SubtitleSearchProvider>,
    download: Arc<dyn SubtitleDownloadProvider>,
}

impl RemoteSubtitles {
    pub fn new(
        search: Arc<dyn SubtitleSearchProvider>,
        download: Arc<dyn SubtitleDownloadProvider>,
    ) -> Self {
        Self { search, download }
    }

    /// Search and download subtitles for `video` into `output_dir`.
    ///
    /// A failed search is an error; a failed download only skips that
    /// language.
    pub async fn fetch(
        &self,
        video: &Path,
        output_dir: &Path,
        hints: &SubtitleHints,
    ) -> Result<Vec<SubtitleArtifact>, PipelineError> {
        let provider = self.search.name();
        let languages = target_languages(hints.original_language.as_deref());
        let query = match &hints.imdb_id {
            Some(id) => SubtitleQuery::ExternalId(id.clone()),
            None if !hints.title.trim().is_empty() => SubtitleQuery::Title(hints.title.clone()),
            None => {
                debug!(path = %video.display(), "No title or id for remote subtitle search");
                return Ok(Vec::new());
            }
        };

        let criteria = SubtitleCriteria { query, languages };
        debug!(provider, criteria = ?criteria, "Searching remote subtitles");
        let candidates = self
            .search
            .search(&criteria)
            .await
            .map_err(|e| PipelineError::provider(provider, e))?;

        let stem = stem_string(video);
        let mut artifacts = Vec::new();
        for (language, candidate) in pick_candidates(&candidates, &criteria.languages) {
            let body = match self.download.download(candidate).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(provider, language = %language, error = %format!("{e:#}"), "Subtitle download failed");
                    continue;
                }
            };

            let output = output_dir.join(format!("{stem}_{language}.srt"));
            if let Err(e) = tokio::fs::write(&output, &body).await {
                warn!(output = %output.display(), error = %e, "Failed to save subtitle");
                continue;
            }

            info!(provider, language = %language, output = %output.display(), "Downloaded subtitle");
            artifacts.push(
                SubtitleArtifact::new(language, SubtitleSource::Remote, output)
                    .with_ref(candidate.file_id.clone()),
            );
        }

        Ok(artifacts)
    }
}
