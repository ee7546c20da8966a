//! Bounded, cancellable batch processing.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::processor::{Orchestrator, ProcessOptions, ProcessingResult};
use crate::error::PipelineError;

impl Orchestrator {
    /// Process every path with at most [`workers`](Self::workers) videos in
    /// flight.
    ///
    /// Returns exactly one result per input, in input order. Once `cancel`
    /// fires no further item is started; items already running finish and
    /// the rest come back as [`PipelineError::Cancelled`].
    pub async fn process_many(
        &self,
        paths: &[PathBuf],
        options: &ProcessOptions,
        cancel: &CancellationToken,
    ) -> Vec<ProcessingResult> {
        let permits = Arc::new(Semaphore::new(self.workers()));
        info!(count = paths.len(), workers = self.workers(), "Starting batch");

        let jobs = paths.iter().map(|path| {
            let permits = permits.clone();
            async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = permits.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    warn!(path = %path.display(), "Batch cancelled, item not started");
                    return ProcessingResult::failed(path, PipelineError::Cancelled);
                };
                self.process_one(path, options).await
            }
        });

        let results = join_all(jobs).await;
        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(count = results.len(), failed, "Batch finished");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataAggregator;
    use crate::naming::NameResolver;
    use crate::persistence::{PersistenceGateway, SqliteGateway};
    use crate::subtitles::{CaptionDecoder, StreamProbe, SubtitleCascade};
    use scenescribe_av::SubtitleStream;
    use scenescribe_common::VideoStatus;
    use scenescribe_db::pool::init_memory_pool;
    use std::path::Path;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct NoStreams;

    impl StreamProbe for NoStreams {
        fn probe(&self, _: &Path) -> Result<Vec<SubtitleStream>, PipelineError> {
            Ok(Vec::new())
        }

        fn extract(&self, _: &Path, _: &SubtitleStream, _: &Path) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    struct NoCaptions;

    impl CaptionDecoder for NoCaptions {
        fn decode(&self, _: &Path, _: &Path) -> Option<PathBuf> {
            None
        }
    }

    /// Reports no streams, but blocks inside `probe` until released.
    struct GatedProbe {
        entered: Arc<Notify>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl StreamProbe for GatedProbe {
        fn probe(&self, _: &Path) -> Result<Vec<SubtitleStream>, PipelineError> {
            self.entered.notify_one();
            self.release
                .lock()
                .unwrap()
                .recv()
                .map_err(PipelineError::probe)?;
            Ok(Vec::new())
        }

        fn extract(&self, _: &Path, _: &SubtitleStream, _: &Path) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn orchestrator(workers: usize) -> Orchestrator {
        Orchestrator::new(
            NameResolver::default(),
            SubtitleCascade::new(Arc::new(NoStreams), Arc::new(NoCaptions)),
            MetadataAggregator::default(),
            Arc::new(SqliteGateway::new(init_memory_pool().unwrap())),
        )
        .with_workers(workers)
    }

    #[tokio::test]
    async fn pre_cancelled_batch_starts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("a.mkv");
        std::fs::write(&video, b"").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let options = ProcessOptions {
            force_reprocess: false,
            enable_ocr: false,
            output_dir: dir.path().join("out"),
        };

        let paths = vec![video.clone(), dir.path().join("missing.mkv")];
        let results = orchestrator(2).process_many(&paths, &options, &cancel).await;

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.error == Some(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn zero_workers_still_progresses() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("b.mkv");
        std::fs::write(&video, b"").unwrap();
        let options = ProcessOptions {
            force_reprocess: false,
            enable_ocr: false,
            output_dir: dir.path().join("out"),
        };

        let orch = orchestrator(0);
        assert_eq!(orch.workers(), 1);
        let results = orch
            .process_many(&[video], &options, &CancellationToken::new())
            .await;
        assert!(results[0].is_success());
    }

    #[tokio::test]
    async fn cancel_lets_running_item_finish() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = ["a.mkv", "b.mkv", "c.mkv"]
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                std::fs::write(&path, b"").unwrap();
                path
            })
            .collect();
        let options = ProcessOptions {
            force_reprocess: false,
            enable_ocr: false,
            output_dir: dir.path().join("out"),
        };

        let entered = Arc::new(Notify::new());
        let (release, gate) = mpsc::channel();
        let store = SqliteGateway::new(init_memory_pool().unwrap());
        let orch = Orchestrator::new(
            NameResolver::default(),
            SubtitleCascade::new(
                Arc::new(GatedProbe {
                    entered: entered.clone(),
                    release: Mutex::new(gate),
                }),
                Arc::new(NoCaptions),
            ),
            MetadataAggregator::default(),
            Arc::new(store.clone()),
        )
        .with_workers(1);

        let cancel = CancellationToken::new();
        let interrupt = async {
            entered.notified().await;
            cancel.cancel();
            release.send(()).unwrap();
        };
        let (results, ()) = tokio::join!(orch.process_many(&paths, &options, &cancel), interrupt);

        assert!(results[0].is_success(), "{:?}", results[0].error);
        assert_eq!(results[0].record.status, VideoStatus::Completed);
        assert!(store.is_processed(&paths[0]).unwrap());
        for result in &results[1..] {
            assert_eq!(result.error, Some(PipelineError::Cancelled));
        }
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn path_locks_are_released() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("d.mkv");
        std::fs::write(&video, b"").unwrap();
        let options = ProcessOptions {
            force_reprocess: false,
            enable_ocr: false,
            output_dir: dir.path().join("out"),
        };

        let orch = orchestrator(2);
        assert!(orch.process_one(&video, &options).await.is_success());
        for _ in 0..3 {
            orch.delete(&video).await.unwrap();
        }
        orch.delete(&dir.path().join("never.mkv")).await.unwrap();

        assert_eq!(orch.tracked_locks(), 0);
    }
}
