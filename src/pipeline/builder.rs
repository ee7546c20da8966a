//! Wiring of the production pipeline from [`Config`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use scenescribe_av::tools::get_tool_path;
use scenescribe_av::Toolchain;
use scenescribe_db::pool::init_pool;
use tracing::{debug, info};

use super::processor::{Orchestrator, ProcessOptions};
use crate::config::{Config, ToolsConfig};
use crate::llm::ChatClient;
use crate::metadata::providers::{GenerativeProvider, OmdbProvider, TmdbProvider};
use crate::metadata::{MetadataAggregator, ProviderInfo, SourceSpec};
use crate::naming::{LlmTitleRecognizer, NameResolver, TitleRecognizer};
use crate::persistence::SqliteGateway;
use crate::subtitles::caption::CcExtractorDecoder;
use crate::subtitles::embedded::FfmpegStreamProbe;
use crate::subtitles::ocr::{FfmpegFrameSource, OcrPipeline, OcrSettings, TesseractRecognizer};
use crate::subtitles::remote::{OpenSubtitlesClient, RemoteSubtitles};
use crate::subtitles::SubtitleCascade;

/// Resolve tool paths. An existing configured path wins, then a `PATH`
/// lookup. When neither finds the program the configured value (or the bare
/// name) is kept so failures name what was attempted.
pub fn toolchain(config: &ToolsConfig) -> Toolchain {
    let resolve = |configured: &Option<PathBuf>, name: &str| {
        get_tool_path(name, configured.as_deref()).unwrap_or_else(|_| {
            configured
                .clone()
                .unwrap_or_else(|| PathBuf::from(name))
        })
    };

    Toolchain {
        ffmpeg: resolve(&config.ffmpeg_path, "ffmpeg"),
        ffprobe: resolve(&config.ffprobe_path, "ffprobe"),
        ccextractor: resolve(&config.ccextractor_path, "ccextractor"),
        tesseract: resolve(&config.tesseract_path, "tesseract"),
    }
}

pub fn build_resolver(config: &Config) -> NameResolver {
    let recognizer = ChatClient::from_config(&config.llm)
        .map(|client| Arc::new(LlmTitleRecognizer::new(client)) as Arc<dyn TitleRecognizer>);
    if recognizer.is_none() {
        info!("No LLM API key configured, titles come from file names only");
    }
    NameResolver::new(recognizer)
}

/// Register the metadata sources. OMDb is reached through the TMDB id bridge
/// when TMDB is usable, and searched by title otherwise.
pub fn build_aggregator(config: &Config) -> MetadataAggregator {
    let metadata = &config.metadata;
    let tmdb = Arc::new(TmdbProvider::from_config(&metadata.tmdb));
    let omdb = Arc::new(OmdbProvider::from_config(&metadata.omdb));

    let omdb_source = if tmdb.is_available() {
        SourceSpec::Bridged {
            from: tmdb.name().to_string(),
            bridge: tmdb.clone(),
            detail: omdb,
        }
    } else {
        SourceSpec::Structured {
            search: omdb.clone(),
            detail: omdb,
        }
    };

    let mut aggregator = MetadataAggregator::new(metadata.precedence.clone())
        .with_source(SourceSpec::Structured {
            search: tmdb.clone(),
            detail: tmdb,
        })
        .with_source(omdb_source);

    if metadata.generative.enabled {
        if let Some(client) = ChatClient::from_config(&config.llm) {
            let client = match metadata.generative.model.as_deref() {
                Some(model) => client.with_model(model),
                None => client,
            };
            debug!(model = client.model(), "Generative metadata source enabled");
            aggregator = aggregator.with_source(SourceSpec::Generative(Arc::new(
                GenerativeProvider::new(client),
            )));
        }
    }

    aggregator
}

pub fn build_cascade(config: &Config, tools: Arc<Toolchain>) -> SubtitleCascade {
    let ocr = OcrPipeline::new(
        Arc::new(FfmpegFrameSource::new(tools.clone())),
        Arc::new(TesseractRecognizer::new(tools.clone(), &config.ocr.language)),
        OcrSettings::from(&config.ocr),
    );

    let mut cascade = SubtitleCascade::new(
        Arc::new(FfmpegStreamProbe::new(tools.clone())),
        Arc::new(CcExtractorDecoder::new(tools)),
    )
    .with_ocr(Arc::new(ocr));

    match OpenSubtitlesClient::from_config(&config.subtitles.remote) {
        Some(client) => {
            let client = Arc::new(client);
            cascade = cascade.with_remote(RemoteSubtitles::new(client.clone(), client));
        }
        None => debug!("No OpenSubtitles API key configured, remote subtitle stage disabled"),
    }

    cascade
}

/// Build the orchestrator with every production collaborator.
pub fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let db_path = &config.database.path;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
    }
    let pool = init_pool(&db_path.to_string_lossy())
        .with_context(|| format!("Failed to open database: {:?}", db_path))?;

    let tools = Arc::new(toolchain(&config.tools));
    debug!(tools = ?tools, "Resolved toolchain");

    Ok(Orchestrator::new(
        build_resolver(config),
        build_cascade(config, tools),
        build_aggregator(config),
        Arc::new(SqliteGateway::new(pool)),
    )
    .with_workers(config.pipeline.workers))
}

/// Options for a run: OCR is on when the config or the caller enables it, and
/// `output_dir` overrides the configured directory.
pub fn process_options(
    config: &Config,
    force_reprocess: bool,
    enable_ocr: bool,
    output_dir: Option<&Path>,
) -> ProcessOptions {
    ProcessOptions {
        force_reprocess,
        enable_ocr: enable_ocr || config.ocr.enabled,
        output_dir: output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.output.dir.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_tool_paths_win() {
        let fake = tempfile::NamedTempFile::new().unwrap();
        let tools = ToolsConfig {
            ffmpeg_path: Some(fake.path().to_path_buf()),
            ffprobe_path: Some(PathBuf::from("/nonexistent/ffprobe")),
            ..Default::default()
        };
        let chain = toolchain(&tools);
        assert_eq!(chain.ffmpeg, fake.path());
        assert!(chain.ffprobe.ends_with("ffprobe"));
        assert!(chain.tesseract.ends_with("tesseract"));
    }

    #[test]
    fn default_config_registers_structured_sources_only() {
        let aggregator = build_aggregator(&Config::default());
        assert_eq!(aggregator.source_names(), vec!["tmdb", "omdb"]);
        assert!(!aggregator.has_available_sources());
        assert!(format!("{aggregator:?}").contains("omdb(structured)"));
    }

    #[test]
    fn omdb_is_bridged_through_tmdb_when_keyed() {
        let mut config = Config::default();
        config.metadata.tmdb.api_key = Some("tmdb-key".into());
        config.metadata.omdb.api_key = Some("omdb-key".into());
        config.llm.api_key = Some("llm-key".into());

        let aggregator = build_aggregator(&config);
        assert_eq!(aggregator.source_names(), vec!["tmdb", "omdb", "generative"]);
        assert!(format!("{aggregator:?}").contains("omdb(bridged)"));

        config.metadata.generative.enabled = false;
        assert_eq!(build_aggregator(&config).source_names(), vec!["tmdb", "omdb"]);
    }

    #[test]
    fn resolver_needs_llm_key() {
        assert!(!build_resolver(&Config::default()).has_recognizer());

        let mut config = Config::default();
        config.llm.api_key = Some("k".into());
        assert!(build_resolver(&config).has_recognizer());
    }

    #[test]
    fn options_merge_config_and_flags() {
        let mut config = Config::default();
        let opts = process_options(&config, true, false, None);
        assert!(opts.force_reprocess);
        assert!(!opts.enable_ocr);
        assert_eq!(opts.output_dir, config.output.dir);

        config.ocr.enabled = true;
        let opts = process_options(&config, false, false, Some(Path::new("/tmp/subs")));
        assert!(opts.enable_ocr);
        assert_eq!(opts.output_dir, PathBuf::from("/tmp/subs"));
    }

    #[test]
    fn orchestrator_opens_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("db/scenescribe.db");
        config.pipeline.workers = 3;

        let orchestrator = build_orchestrator(&config).unwrap();
        assert_eq!(orchestrator.workers(), 3);
        assert!(config.database.path.exists());
    }
}
