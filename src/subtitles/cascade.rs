//! The subtitle acquisition cascade.
//!
//! Stages run in [`SubtitleSource::ALL`] order and the cascade stops at the
//! first stage that produces anything. A failing stage is logged and treated
//! as empty. Blocking stages run on the blocking thread pool.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use scenescribe_common::SubtitleSource;
use scenescribe_db::models::SubtitleArtifact;
use tracing::{debug, info, warn};

use super::caption::CaptionDecoder;
use super::embedded::{extract_embedded, StreamProbe};
use super::ocr::OcrPipeline;
use super::remote::{RemoteSubtitles, SubtitleHints};
use super::sidecar::scan_sidecars;
use crate::error::PipelineError;

/// Provides hints for the remote stage on demand, so metadata is only looked
/// up when the cascade gets that far.
#[async_trait]
pub trait HintSource: Send + Sync {
    async fn hints(&self) -> SubtitleHints;
}

#[async_trait]
impl HintSource for SubtitleHints {
    async fn hints(&self) -> SubtitleHints {
        self.clone()
    }
}

#[derive(Debug, Clone)]
pub struct CascadeOptions {
    /// Allow the OCR stage.
    pub enable_ocr: bool,
    /// Extracted and downloaded files are written here.
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeOutcome {
    pub artifacts: Vec<SubtitleArtifact>,
    /// Stage that produced `artifacts`; `None` when every stage came up empty.
    pub stage: Option<SubtitleSource>,
}

pub struct SubtitleCascade {
    probe: Arc<dyn StreamProbe>,
    captions: Arc<dyn CaptionDecoder>,
    ocr: Option<Arc<OcrPipeline>>,
    remote: Option<RemoteSubtitles>,
}

impl SubtitleCascade {
    pub fn new(probe: Arc<dyn StreamProbe>, captions: Arc<dyn CaptionDecoder>) -> Self {
        Self {
            probe,
            captions,
            ocr: None,
            remote: None,
        }
    }

    pub fn with_ocr(mut self, ocr: Arc<OcrPipeline>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_remote(mut self, remote: RemoteSubtitles) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Run the cascade for `video`.
    pub async fn run(
        &self,
        video: &Path,
        options: &CascadeOptions,
        hints: &dyn HintSource,
    ) -> CascadeOutcome {
        if let Err(e) = tokio::fs::create_dir_all(&options.output_dir).await {
            warn!(dir = %options.output_dir.display(), error = %e, "Cannot create output directory");
        }

        for stage in SubtitleSource::ALL {
            let result = match stage {
                SubtitleSource::Embedded => self.embedded(video, &options.output_dir).await,
                SubtitleSource::Sidecar => self.sidecar(video).await,
                SubtitleSource::ClosedCaption => {
                    self.closed_caption(video, &options.output_dir).await
                }
                SubtitleSource::Ocr => match &self.ocr {
                    Some(ocr) if options.enable_ocr => {
                        self.ocr(ocr.clone(), video, &options.output_dir).await
                    }
                    _ => continue,
                },
                SubtitleSource::Remote => match &self.remote {
                    Some(remote) => {
                        let hints = hints.hints().await;
                        remote.fetch(video, &options.output_dir, &hints).await
                    }
                    None => continue,
                },
            };

            match result {
                Ok(artifacts) if !artifacts.is_empty() => {
                    let artifacts = dedup_by_language(artifacts);
                    info!(
                        path = %video.display(),
                        stage = %stage,
                        count = artifacts.len(),
                        "Subtitles acquired"
                    );
                    return CascadeOutcome {
                        artifacts,
                        stage: Some(stage),
                    };
                }
                Ok(_) => debug!(path = %video.display(), stage = %stage, "Stage found nothing"),
                Err(e) => warn!(path = %video.display(), stage = %stage, error = %e, "Stage failed"),
            }
        }

        info!(path = %video.display(), "No subtitles found");
        CascadeOutcome::default()
    }

    async fn embedded(
        &self,
        video: &Path,
        output_dir: &Path,
    ) -> Result<Vec<SubtitleArtifact>, PipelineError> {
        let probe = self.probe.clone();
        let video = video.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        blocking(SubtitleSource::Embedded, move || {
            extract_embedded(probe.as_ref(), &video, &output_dir)
        })
        .await
    }

    async fn sidecar(&self, video: &Path) -> Result<Vec<SubtitleArtifact>, PipelineError> {
        let video = video.to_path_buf();
        blocking(SubtitleSource::Sidecar, move || Ok(scan_sidecars(&video))).await
    }

    async fn closed_caption(
        &self,
        video: &Path,
        output_dir: &Path,
    ) -> Result<Vec<SubtitleArtifact>, PipelineError> {
        let captions = self.captions.clone();
        let video = video.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        blocking(SubtitleSource::ClosedCaption, move || {
            Ok(captions
                .decode(&video, &output_dir)
                .map(|path| {
                    SubtitleArtifact::new(
                        scenescribe_common::language::UNKNOWN,
                        SubtitleSource::ClosedCaption,
                        path,
                    )
                })
                .into_iter()
                .collect())
        })
        .await
    }

    async fn ocr(
        &self,
        ocr: Arc<OcrPipeline>,
        video: &Path,
        output_dir: &Path,
    ) -> Result<Vec<SubtitleArtifact>, PipelineError> {
        let video = video.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        blocking(SubtitleSource::Ocr, move || {
            ocr.run(&video, &output_dir)
                .map(|artifact| artifact.into_iter().collect())
        })
        .await
    }
}

async fn blocking<F>(stage: SubtitleSource, f: F) -> Result<Vec<SubtitleArtifact>, PipelineError>
where
    F: FnOnce() -> Result<Vec<SubtitleArtifact>, PipelineError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::extraction(stage, e))?
}

/// Keep the first artifact per language.
pub fn dedup_by_language(artifacts: Vec<SubtitleArtifact>) -> Vec<SubtitleArtifact> {
    let mut seen = HashSet::new();
    artifacts
        .into_iter()
        .filter(|a| seen.insert(a.language.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::ocr::{FrameSource, OcrSettings, TextRecognizer};
    use crate::subtitles::remote::{
        SubtitleCandidate, SubtitleCriteria, SubtitleDownloadProvider, SubtitleSearchProvider,
    };
    use bytes::Bytes;
    use scenescribe_av::SubtitleStream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Probe {
        streams: Vec<SubtitleStream>,
        broken: bool,
        calls: AtomicUsize,
    }

    impl StreamProbe for Probe {
        fn probe(&self, _: &Path) -> Result<Vec<SubtitleStream>, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(PipelineError::probe("moov atom not found"));
            }
            Ok(self.streams.clone())
        }

        fn extract(&self, _: &Path, _: &SubtitleStream, output: &Path) -> Result<(), PipelineError> {
            std::fs::write(output, "1\n").map_err(|e| PipelineError::extraction(SubtitleSource::Embedded, e))
        }
    }

    #[derive(Default)]
    struct Captions {
        produce: bool,
        calls: AtomicUsize,
    }

    impl CaptionDecoder for Captions {
        fn decode(&self, video: &Path, output_dir: &Path) -> Option<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.produce
                .then(|| crate::subtitles::caption::caption_output(video, output_dir))
        }
    }

    struct NoFrames;

    impl FrameSource for NoFrames {
        fn duration(&self, _: &Path) -> Result<Duration, PipelineError> {
            Err(PipelineError::probe("no duration"))
        }
        fn extract_frame(&self, _: &Path, _: Duration, _: &Path) -> Result<(), PipelineError> {
            unreachable!()
        }
    }

    struct Silent;

    impl TextRecognizer for Silent {
        fn recognize(&self, _: &Path) -> Result<String, PipelineError> {
            Ok(String::new())
        }
    }

    struct Remote {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SubtitleSearchProvider for Remote {
        fn name(&self) -> &'static str {
            "remote"
        }
        async fn search(&self, _: &SubtitleCriteria) -> anyhow::Result<Vec<SubtitleCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![SubtitleCandidate {
                file_id: "5".into(),
                language: "en".into(),
                release: None,
            }])
        }
    }

    #[async_trait]
    impl SubtitleDownloadProvider for Remote {
        async fn download(&self, _: &SubtitleCandidate) -> anyhow::Result<Bytes> {
            Ok(Bytes::from_static(b"1\n"))
        }
    }

    fn stream(index: u32, language: &str) -> SubtitleStream {
        SubtitleStream {
            index,
            stream_index: index,
            codec: "subrip".into(),
            language: language.into(),
            title: None,
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        video: PathBuf,
        options: CascadeOptions,
    }

    fn fixture(sidecars: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        std::fs::write(&video, b"").unwrap();
        for name in sidecars {
            std::fs::write(dir.path().join(name), b"1\n").unwrap();
        }
        let options = CascadeOptions {
            enable_ocr: false,
            output_dir: dir.path().join("out"),
        };
        Fixture {
            _dir: dir,
            video,
            options,
        }
    }

    fn hints() -> SubtitleHints {
        SubtitleHints {
            title: "Movie".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_embedded_wins_over_sidecar() {
        let fx = fixture(&["movie.fr.srt", "movie.srt"]);
        let probe = Arc::new(Probe {
            streams: vec![stream(0, "eng"), stream(1, "fre")],
            ..Default::default()
        });
        let captions = Arc::new(Captions::default());
        let cascade = SubtitleCascade::new(probe, captions.clone());

        let outcome = cascade.run(&fx.video, &fx.options, &hints()).await;
        assert_eq!(outcome.stage, Some(SubtitleSource::Embedded));
        assert_eq!(outcome.artifacts.len(), 2);
        assert!(outcome
            .artifacts
            .iter()
            .all(|a| a.source == SubtitleSource::Embedded));
        assert_eq!(captions.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_probe_failure_falls_through_to_sidecar() {
        let fx = fixture(&["movie.fr.srt", "movie.srt", "movie.ass"]);
        let probe = Arc::new(Probe {
            broken: true,
            ..Default::default()
        });
        let cascade = SubtitleCascade::new(probe, Arc::new(Captions::default()));

        let outcome = cascade.run(&fx.video, &fx.options, &hints()).await;
        assert_eq!(outcome.stage, Some(SubtitleSource::Sidecar));
        let langs: Vec<_> = outcome.artifacts.iter().map(|a| a.language.as_str()).collect();
        // movie.ass and movie.srt are both "unknown"; the first by name wins.
        assert_eq!(langs, vec!["unknown", "fr"]);
        assert!(outcome.artifacts[0].path.ends_with("movie.ass"));
    }

    #[tokio::test]
    async fn test_closed_captions_after_sidecar() {
        let fx = fixture(&[]);
        let cascade = SubtitleCascade::new(
            Arc::new(Probe::default()),
            Arc::new(Captions {
                produce: true,
                ..Default::default()
            }),
        );

        let outcome = cascade.run(&fx.video, &fx.options, &hints()).await;
        assert_eq!(outcome.stage, Some(SubtitleSource::ClosedCaption));
        assert_eq!(outcome.artifacts[0].language, "unknown");
        assert!(outcome.artifacts[0].path.ends_with("movie_cc.srt"));
    }

    #[tokio::test]
    async fn test_ocr_only_when_enabled_and_remote_last() {
        let fx = fixture(&[]);
        let remote = Arc::new(Remote {
            calls: AtomicUsize::new(0),
        });
        let ocr = Arc::new(OcrPipeline::new(
            Arc::new(NoFrames),
            Arc::new(Silent),
            OcrSettings::default(),
        ));
        let cascade = SubtitleCascade::new(Arc::new(Probe::default()), Arc::new(Captions::default()))
            .with_ocr(ocr)
            .with_remote(RemoteSubtitles::new(remote.clone(), remote.clone()));

        let mut options = fx.options.clone();
        options.enable_ocr = true;
        let outcome = cascade.run(&fx.video, &options, &hints()).await;

        assert_eq!(outcome.stage, Some(SubtitleSource::Remote));
        assert_eq!(outcome.artifacts[0].language, "en");
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nothing_found_is_empty_not_error() {
        let fx = fixture(&[]);
        let cascade =
            SubtitleCascade::new(Arc::new(Probe::default()), Arc::new(Captions::default()));
        let outcome = cascade.run(&fx.video, &fx.options, &hints()).await;
        assert_eq!(outcome, CascadeOutcome::default());
    }

    #[test]
    fn test_dedup_keeps_first() {
        let a = |lang: &str, src| SubtitleArtifact::new(lang, src, PathBuf::from(format!("/{lang}.srt")));
        let out = dedup_by_language(vec![
            a("en", SubtitleSource::Embedded),
            a("fr", SubtitleSource::Embedded),
            a("en", SubtitleSource::Remote),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source, SubtitleSource::Embedded);
    }
}
