//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], an [`Orchestrator`] wired to counting stub
//! collaborators and an in-memory SQLite store, plus a temp directory for
//! videos and subtitle output.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use scenescribe::metadata::{
    DetailProvider, MetadataAggregator, ProviderFetch, ProviderInfo, ProviderMetadata,
    SearchResult, SourceSpec, TitleSearchProvider,
};
use scenescribe::naming::{NameResolver, TitleRecognizer};
use scenescribe::subtitles::{CaptionDecoder, StreamProbe, SubtitleCascade};
use scenescribe::{
    Orchestrator, PersistenceGateway, PipelineError, ProcessOptions, ProcessedVideo,
    SqliteGateway,
};
use scenescribe_av::SubtitleStream;
use scenescribe_db::pool::init_memory_pool;

/// Probe reporting a fixed set of streams; extraction writes a small SRT
/// whose only cue is the source video's path.
#[derive(Default)]
pub struct FakeProbe {
    pub streams: Vec<SubtitleStream>,
    pub probes: AtomicUsize,
}

impl FakeProbe {
    pub fn with_languages(languages: &[&str]) -> Self {
        let streams = languages
            .iter()
            .enumerate()
            .map(|(i, lang)| SubtitleStream {
                index: i as u32,
                stream_index: i as u32 + 2,
                codec: "subrip".into(),
                language: (*lang).into(),
                title: None,
            })
            .collect();
        Self {
            streams,
            probes: AtomicUsize::new(0),
        }
    }
}

impl StreamProbe for FakeProbe {
    fn probe(&self, _: &Path) -> Result<Vec<SubtitleStream>, PipelineError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.streams.clone())
    }

    fn extract(
        &self,
        video: &Path,
        _: &SubtitleStream,
        output: &Path,
    ) -> Result<(), PipelineError> {
        let text = format!("1\n00:00:01,000 --> 00:00:02,000\n{}\n", video.display());
        std::fs::write(output, text).map_err(PipelineError::probe)
    }
}

pub struct NoCaptions;

impl CaptionDecoder for NoCaptions {
    fn decode(&self, _: &Path, _: &Path) -> Option<PathBuf> {
        None
    }
}

/// Recognizer answering with a fixed title, or failing when `answer` is `None`.
pub struct StubRecognizer {
    pub answer: Option<String>,
    pub calls: AtomicUsize,
}

impl StubRecognizer {
    pub fn answering(title: &str) -> Self {
        Self {
            answer: Some(title.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TitleRecognizer for StubRecognizer {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn recognize(&self, _: &str) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Some(title) => Ok(Some(title.clone())),
            None => anyhow::bail!("connection refused"),
        }
    }
}

/// Metadata source returning fixed metadata for any title.
pub struct StubProvider {
    pub name: &'static str,
    pub metadata: ProviderMetadata,
    pub calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(name: &'static str, metadata: ProviderMetadata) -> Arc<Self> {
        Arc::new(Self {
            name,
            metadata,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn as_source(self: &Arc<Self>) -> SourceSpec {
        SourceSpec::Structured {
            search: self.clone(),
            detail: self.clone(),
        }
    }
}

impl ProviderInfo for StubProvider {
    fn name(&self) -> &'static str {
        self.name
    }
}

#[async_trait]
impl TitleSearchProvider for StubProvider {
    async fn search(&self, query: &str, year: Option<u16>) -> anyhow::Result<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![SearchResult {
            id: format!("{}-1", self.name),
            title: query.to_string(),
            year,
            overview: None,
            confidence: 1.0,
            provider_name: self.name.to_string(),
        }])
    }
}

#[async_trait]
impl DetailProvider for StubProvider {
    async fn get_by_id(&self, id: &str) -> anyhow::Result<ProviderFetch> {
        Ok(ProviderFetch::new(
            self.name,
            serde_json::json!({ "id": id }),
            self.metadata.clone(),
        ))
    }
}

/// Store that answers reads from an empty database and rejects every save.
pub struct FailingStore(pub SqliteGateway);

impl PersistenceGateway for FailingStore {
    fn is_processed(&self, path: &Path) -> Result<bool, PipelineError> {
        self.0.is_processed(path)
    }

    fn load(&self, path: &Path) -> Result<Option<ProcessedVideo>, PipelineError> {
        self.0.load(path)
    }

    fn save(&self, _: &ProcessedVideo) -> Result<(), PipelineError> {
        Err(PipelineError::persistence("database is locked"))
    }

    fn delete(&self, path: &Path) -> Result<bool, PipelineError> {
        self.0.delete(path)
    }

    fn list(&self) -> Result<Vec<ProcessedVideo>, PipelineError> {
        self.0.list()
    }
}

pub struct TestHarness {
    pub dir: TempDir,
    pub probe: Arc<FakeProbe>,
    pub recognizer: Arc<StubRecognizer>,
    pub providers: Vec<Arc<StubProvider>>,
    pub store: SqliteGateway,
    pub orchestrator: Orchestrator,
}

impl TestHarness {
    pub fn new(probe: FakeProbe) -> Self {
        Self::build(
            probe,
            StubRecognizer::answering("Heat"),
            Vec::new(),
            Vec::new(),
            None,
        )
    }

    pub fn build(
        probe: FakeProbe,
        recognizer: StubRecognizer,
        providers: Vec<Arc<StubProvider>>,
        precedence: Vec<String>,
        store: Option<Arc<dyn PersistenceGateway>>,
    ) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let probe = Arc::new(probe);
        let recognizer = Arc::new(recognizer);
        let sqlite = SqliteGateway::new(init_memory_pool().expect("failed to create in-memory pool"));

        let aggregator = providers
            .iter()
            .fold(MetadataAggregator::new(precedence), |agg, provider| {
                agg.with_source(provider.as_source())
            });

        let orchestrator = Orchestrator::new(
            NameResolver::new(Some(recognizer.clone() as Arc<dyn TitleRecognizer>)),
            SubtitleCascade::new(probe.clone(), Arc::new(NoCaptions)),
            aggregator,
            store.unwrap_or_else(|| Arc::new(sqlite.clone())),
        )
        .with_workers(2);

        Self {
            dir,
            probe,
            recognizer,
            providers,
            store: sqlite,
            orchestrator,
        }
    }

    /// Create an empty video file in the temp directory. `name` may include
    /// subdirectories.
    pub fn video(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create video dir");
        }
        std::fs::write(&path, b"").expect("failed to write video");
        path
    }

    /// Create a subtitle file next to the videos.
    pub fn sidecar(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, "1\n00:00:01,000 --> 00:00:02,000\nBonjour\n")
            .expect("failed to write sidecar");
        path
    }

    pub fn options(&self, force_reprocess: bool) -> ProcessOptions {
        ProcessOptions {
            force_reprocess,
            enable_ocr: false,
            output_dir: self.dir.path().join("subs"),
        }
    }

    pub fn probe_calls(&self) -> usize {
        self.probe.probes.load(Ordering::SeqCst)
    }

    pub fn recognizer_calls(&self) -> usize {
        self.recognizer.calls.load(Ordering::SeqCst)
    }

    pub fn provider_calls(&self) -> usize {
        self.providers
            .iter()
            .map(|p| p.calls.load(Ordering::SeqCst))
            .sum()
    }
}
