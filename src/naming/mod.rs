//! Canonical title resolution.
//!
//! [`NameResolver`] cleans a file name with [`clean_title`] and asks a
//! [`TitleRecognizer`] for the official title. Recognition is best effort:
//! when the service is missing, unreachable or unsure, the cleaned name is
//! used as the working title.

mod normalize;
mod recognizer;

pub use normalize::{clean_title, extract_year};
pub use recognizer::{LlmTitleRecognizer, TitleRecognizer};

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use scenescribe_common::paths::stem_string;
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Outcome of resolving one video's name.
#[derive(Debug, Clone, PartialEq)]
pub struct NameResolution {
    /// Original file stem.
    pub original: String,
    /// Output of [`clean_title`].
    pub cleaned: String,
    /// Title confirmed by the recognizer, if any.
    pub canonical: Option<String>,
    /// Title used by the later stages: canonical, else cleaned, else the raw stem.
    pub working_title: String,
    pub year: Option<u16>,
    /// Set when the recognizer failed; resolution still succeeded.
    pub error: Option<PipelineError>,
}

#[derive(Clone, Default)]
pub struct NameResolver {
    recognizer: Option<Arc<dyn TitleRecognizer>>,
}

impl NameResolver {
    pub fn new(recognizer: Option<Arc<dyn TitleRecognizer>>) -> Self {
        Self { recognizer }
    }

    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Clean `name` and ask the recognizer for its canonical title.
    ///
    /// Returns `Ok(None)` when no recognizer is configured or it did not know
    /// the title.
    pub async fn recognize(&self, name: &str) -> Result<Option<String>, PipelineError> {
        let Some(recognizer) = &self.recognizer else {
            return Ok(None);
        };

        let cleaned = clean_title(name);
        let query = if cleaned.is_empty() { name.trim() } else { &cleaned };
        if query.is_empty() {
            return Ok(None);
        }

        recognizer
            .recognize(query)
            .await
            .map_err(|e| PipelineError::recognition(format!("{}: {e:#}", recognizer.name())))
    }

    /// Recognize several names. Each entry is independent of the others and
    /// results come back in input order.
    pub async fn recognize_batch(
        &self,
        names: &[String],
    ) -> Vec<Result<Option<String>, PipelineError>> {
        join_all(names.iter().map(|name| self.recognize(name))).await
    }

    /// Resolve the titles used for a video. Never fails.
    pub async fn resolve(&self, path: &Path) -> NameResolution {
        let original = stem_string(path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| original.clone());
        let cleaned = clean_title(&file_name);
        let year = extract_year(path);

        let (canonical, error) = match self.recognize(&file_name).await {
            Ok(title) => (title, None),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Title recognition failed, using file name");
                (None, Some(e))
            }
        };

        let working_title = canonical
            .clone()
            .or_else(|| (!cleaned.is_empty()).then(|| cleaned.clone()))
            .unwrap_or_else(|| original.clone());

        debug!(
            path = %path.display(),
            cleaned = %cleaned,
            canonical = ?canonical,
            year = ?year,
            "Resolved name"
        );

        NameResolution {
            original,
            cleaned,
            canonical,
            working_title,
            year,
            error,
        }
    }
}

impl std::fmt::Debug for NameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameResolver")
            .field("recognizer", &self.recognizer.as_ref().map(|r| r.name()))
            .finish()
    }
}
