//! Stage-boundary error taxonomy for the processing pipeline.
//!
//! Every stage reports failures as one of these variants. Most are absorbed
//! where they occur (the subtitle cascade and metadata aggregator only log
//! them); the ones that end an item travel inside its
//! [`ProcessingResult`](crate::pipeline::ProcessingResult), which is why the
//! type is `Clone` and serializable.

use std::path::PathBuf;

use scenescribe_common::SubtitleSource;
use serde::{Deserialize, Serialize};

/// A failure at a pipeline stage boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineError {
    /// The input path does not exist.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The container could not be probed.
    #[error("probe failed: {message}")]
    Probe { message: String },

    /// A subtitle cascade stage failed.
    #[error("{stage} extraction failed: {message}")]
    Extraction {
        stage: SubtitleSource,
        message: String,
    },

    /// The title recognizer could not be reached or answered garbage.
    #[error("title recognition failed: {message}")]
    Recognition { message: String },

    /// A metadata or subtitle provider call failed.
    #[error("provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    /// Reading or writing the store failed.
    #[error("persistence failed: {message}")]
    Persistence { message: String },

    /// The batch was cancelled before this item started.
    #[error("cancelled before processing started")]
    Cancelled,
}

impl PipelineError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn probe(err: impl std::fmt::Display) -> Self {
        Self::Probe {
            message: err.to_string(),
        }
    }

    pub fn extraction(stage: SubtitleSource, err: impl std::fmt::Display) -> Self {
        Self::Extraction {
            stage,
            message: err.to_string(),
        }
    }

    pub fn recognition(err: impl std::fmt::Display) -> Self {
        Self::Recognition {
            message: err.to_string(),
        }
    }

    /// Provider failure. Formats `err` with `{:#}` so anyhow context chains
    /// are kept on one line.
    pub fn provider(provider: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: format!("{err:#}"),
        }
    }

    pub fn persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            message: err.to_string(),
        }
    }
}

impl From<scenescribe_common::Error> for PipelineError {
    fn from(err: scenescribe_common::Error) -> Self {
        Self::persistence(err)
    }
}
