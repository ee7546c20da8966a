//! Embedded subtitle streams.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use scenescribe_av::extract::{extract_subtitle, output_extension};
use scenescribe_av::{probe_subtitles, SubtitleStream, Toolchain};
use scenescribe_common::language::to_two_letter;
use scenescribe_common::paths::stem_string;
use scenescribe_common::SubtitleSource;
use scenescribe_db::models::SubtitleArtifact;
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Lists and extracts the subtitle streams of a container.
pub trait StreamProbe: Send + Sync {
    /// Subtitle streams in container order. Fails with
    /// [`PipelineError::Probe`] when the container cannot be read.
    fn probe(&self, video: &Path) -> Result<Vec<SubtitleStream>, PipelineError>;

    /// Write `stream` to `output`.
    fn extract(
        &self,
        video: &Path,
        stream: &SubtitleStream,
        output: &Path,
    ) -> Result<(), PipelineError>;
}

/// [`StreamProbe`] backed by ffprobe and ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegStreamProbe {
    tools: Arc<Toolchain>,
}

impl FfmpegStreamProbe {
    pub fn new(tools: Arc<Toolchain>) -> Self {
        Self { tools }
    }
}

impl StreamProbe for FfmpegStreamProbe {
    fn probe(&self, video: &Path) -> Result<Vec<SubtitleStream>, PipelineError> {
        probe_subtitles(&self.tools, video)
            .map(|report| report.subtitle_streams)
            .map_err(PipelineError::probe)
    }

    fn extract(
        &self,
        video: &Path,
        stream: &SubtitleStream,
        output: &Path,
    ) -> Result<(), PipelineError> {
        extract_subtitle(&self.tools, video, stream, output)
            .map_err(|e| PipelineError::extraction(SubtitleSource::Embedded, e))
    }
}

/// Extract every embedded stream of `video` into `output_dir`.
///
/// Files are named `<stem>_<lang>.<ext>`. Only the first stream of each
/// language is kept; a stream that fails to extract is skipped so a later
/// stream of the same language can take its place.
pub fn extract_embedded(
    probe: &dyn StreamProbe,
    video: &Path,
    output_dir: &Path,
) -> Result<Vec<SubtitleArtifact>, PipelineError> {
    let streams = probe.probe(video)?;
    debug!(path = %video.display(), count = streams.len(), "Probed subtitle streams");

    let stem = stem_string(video);
    let mut taken = HashSet::new();
    let mut artifacts = Vec::new();

    for stream in &streams {
        let language = to_two_letter(&stream.language);
        if taken.contains(&language) {
            debug!(
                stream = stream.stream_index,
                language = %language,
                "Skipping stream, language already extracted"
            );
            continue;
        }

        let output = output_dir.join(format!(
            "{stem}_{language}.{}",
            output_extension(&stream.codec)
        ));

        match probe.extract(video, stream, &output) {
            Ok(()) => {
                taken.insert(language.clone());
                artifacts.push(
                    SubtitleArtifact::new(language, SubtitleSource::Embedded, output)
                        .with_ref(stream.stream_index.to_string()),
                );
            }
            Err(e) => {
                warn!(
                    path = %video.display(),
                    stream = stream.stream_index,
                    codec = %stream.codec,
                    error = %e,
                    "Failed to extract subtitle stream"
                );
            }
        }
    }

    Ok(artifacts)
}
