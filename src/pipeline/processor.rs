//! Single-video processing.
//!
//! [`Orchestrator::process_one`] drives one file through name resolution, the
//! subtitle cascade and metadata aggregation, then writes the result once.
//! Attempts on the same path are serialized with a per-path async lock.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use scenescribe_common::VideoStatus;
use scenescribe_db::models::{MergedMetadata, SubtitleArtifact, VideoRecord};
use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::metadata::{Aggregation, MetadataAggregator};
use crate::naming::NameResolver;
use crate::persistence::{PersistenceGateway, ProcessedVideo};
use crate::subtitles::{CascadeOptions, HintSource, SubtitleCascade, SubtitleHints};

/// Per-call processing switches.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Delete and redo an already stored video.
    pub force_reprocess: bool,
    /// Allow the OCR subtitle stage.
    pub enable_ocr: bool,
    /// Root for extracted and downloaded subtitles. Each video writes into
    /// its own `<output_dir>/<video id>/` subdirectory.
    pub output_dir: PathBuf,
}

/// Outcome of processing one path.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub record: VideoRecord,
    pub subtitles: Vec<SubtitleArtifact>,
    pub metadata: MergedMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PipelineError>,
}

impl ProcessingResult {
    /// A failed result for `path` that was never persisted.
    pub fn failed(path: &Path, error: PipelineError) -> Self {
        let mut record = VideoRecord::new(path);
        record.fail(error.to_string());
        Self {
            record,
            subtitles: Vec::new(),
            metadata: MergedMetadata::default(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl From<ProcessedVideo> for ProcessingResult {
    fn from(video: ProcessedVideo) -> Self {
        Self {
            record: video.record,
            subtitles: video.subtitles,
            metadata: video.metadata,
            error: None,
        }
    }
}

/// Metadata aggregation that runs on first use and is then shared between
/// the remote subtitle stage and the enrichment step.
struct LazyMetadata {
    aggregator: Arc<MetadataAggregator>,
    title: String,
    year: Option<u16>,
    cell: OnceCell<Aggregation>,
}

impl LazyMetadata {
    fn new(aggregator: Arc<MetadataAggregator>, title: String, year: Option<u16>) -> Self {
        Self {
            aggregator,
            title,
            year,
            cell: OnceCell::new(),
        }
    }

    async fn get(&self) -> &Aggregation {
        self.cell
            .get_or_init(|| self.aggregator.aggregate(&self.title, self.year))
            .await
    }

    async fn into_aggregation(self) -> Aggregation {
        self.get().await;
        self.cell.into_inner().unwrap_or_default()
    }
}

#[async_trait]
impl HintSource for LazyMetadata {
    async fn hints(&self) -> SubtitleHints {
        let merged = &self.get().await.merged;
        SubtitleHints {
            title: merged.title.clone().unwrap_or_else(|| self.title.clone()),
            imdb_id: merged.imdb_id().map(String::from),
            original_language: merged.language.clone(),
        }
    }
}

/// Coordinates the pipeline stages for one or many videos.
pub struct Orchestrator {
    resolver: NameResolver,
    cascade: SubtitleCascade,
    aggregator: Arc<MetadataAggregator>,
    store: Arc<dyn PersistenceGateway>,
    workers: usize,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl Orchestrator {
    pub fn new(
        resolver: NameResolver,
        cascade: SubtitleCascade,
        aggregator: MetadataAggregator,
        store: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            resolver,
            cascade,
            aggregator: Arc::new(aggregator),
            store,
            workers: 4,
            locks: DashMap::new(),
        }
    }

    /// Bound for [`process_many`](Self::process_many). Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process a single video file.
    ///
    /// Never returns `Err`: failures are reported in
    /// [`ProcessingResult::error`].
    pub async fn process_one(&self, path: &Path, options: &ProcessOptions) -> ProcessingResult {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        if !matches!(tokio::fs::try_exists(&path).await, Ok(true)) {
            warn!(path = %path.display(), "Input file not found");
            return ProcessingResult::failed(&path, PipelineError::not_found(&path));
        }

        let lock = self
            .locks
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        let result = self.process_locked(&path, options).await;

        drop(guard);
        drop(lock);
        self.locks
            .remove_if(&path, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn process_locked(&self, path: &Path, options: &ProcessOptions) -> ProcessingResult {
        let key = path.to_path_buf();
        match self.with_store(move |s| s.is_processed(&key)).await {
            Ok(true) if !options.force_reprocess => {
                let key = path.to_path_buf();
                match self.with_store(move |s| s.load(&key)).await {
                    Ok(Some(existing)) => {
                        info!(path = %path.display(), "Already processed, skipping");
                        return existing.into();
                    }
                    Ok(None) => {}
                    Err(e) => return ProcessingResult::failed(path, e),
                }
            }
            Ok(true) => {
                let key = path.to_path_buf();
                if let Err(e) = self.with_store(move |s| s.delete(&key)).await {
                    return ProcessingResult::failed(path, e);
                }
                info!(path = %path.display(), "Forced reprocess, previous record deleted");
            }
            Ok(false) => {}
            Err(e) => return ProcessingResult::failed(path, e),
        }

        let mut record = VideoRecord::new(path);
        info!(path = %path.display(), "Processing video");

        record.advance(VideoStatus::Identifying);
        let names = self.resolver.resolve(path).await;
        record.canonical_title = names.canonical.clone();
        record.working_title = names.working_title.clone();

        record.advance(VideoStatus::Extracting);
        let metadata = LazyMetadata::new(
            self.aggregator.clone(),
            names.working_title.clone(),
            names.year,
        );
        let cascade_options = CascadeOptions {
            enable_ocr: options.enable_ocr,
            output_dir: options.output_dir.join(record.id.to_string()),
        };
        let subtitles = self.cascade.run(path, &cascade_options, &metadata).await;

        record.advance(VideoStatus::Enriching);
        let aggregation = metadata.into_aggregation().await;

        record.advance(VideoStatus::Completed);
        let mut video = ProcessedVideo {
            record,
            subtitles: subtitles.artifacts,
            metadata: aggregation.merged,
            raw: aggregation.records,
        };

        let to_save = video.clone();
        let error = match self.with_store(move |s| s.save(&to_save)).await {
            Ok(()) => {
                info!(
                    path = %path.display(),
                    title = %video.record.working_title,
                    subtitles = video.subtitles.len(),
                    sources = ?video.metadata.sources,
                    "Video processed"
                );
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to save processed video");
                video.record.fail(e.to_string());
                Some(e)
            }
        };

        ProcessingResult {
            error,
            ..ProcessingResult::from(video)
        }
    }

    /// Run a gateway call on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> Result<T, PipelineError>
    where
        F: FnOnce(&dyn PersistenceGateway) -> Result<T, PipelineError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(PipelineError::persistence)?
    }

    /// Canonical title for a loose name, without processing anything.
    pub async fn recognize(&self, name: &str) -> Result<Option<String>, PipelineError> {
        self.resolver.recognize(name).await
    }

    pub async fn recognize_batch(
        &self,
        names: &[String],
    ) -> Vec<Result<Option<String>, PipelineError>> {
        self.resolver.recognize_batch(names).await
    }

    /// All stored videos ordered by path.
    pub async fn list(&self) -> Result<Vec<ProcessedVideo>, PipelineError> {
        self.with_store(|s| s.list()).await
    }

    /// Number of per-path locks currently held in the table.
    #[cfg(test)]
    pub(super) fn tracked_locks(&self) -> usize {
        self.locks.len()
    }

    /// Remove the stored record for `path`. Returns `false` when none existed.
    pub async fn delete(&self, path: &Path) -> Result<bool, PipelineError> {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let lock = self
            .locks
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        let key = path.clone();
        let deleted = self.with_store(move |s| s.delete(&key)).await;

        drop(guard);
        drop(lock);
        self.locks
            .remove_if(&path, |_, lock| Arc::strong_count(lock) == 1);

        let deleted = deleted?;
        debug!(path = %path.display(), deleted, "Delete requested");
        Ok(deleted)
    }
}
