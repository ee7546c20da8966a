//! Recovery of burned-in subtitles by OCR.
//!
//! Frames are sampled at a fixed interval over the whole video. The bottom
//! band of each frame is preprocessed ([`preprocess`]) and run through a
//! [`TextRecognizer`]. Samples that survive the noise filter become SRT cues
//! ([`srt`]). This is the slowest cascade stage.

pub mod preprocess;
pub mod srt;

pub use srt::{build_cues, format_timestamp, render_srt, Cue, Sample};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use scenescribe_av::extract::extract_frame;
use scenescribe_av::ocr::recognize_text;
use scenescribe_av::{probe_subtitles, Toolchain, Workspace};
use scenescribe_common::language::to_two_letter;
use scenescribe_common::paths::stem_string;
use scenescribe_common::SubtitleSource;
use scenescribe_db::models::SubtitleArtifact;
use tracing::{debug, info};

use crate::config::OcrConfig;
use crate::error::PipelineError;

const STAGE: SubtitleSource = SubtitleSource::Ocr;

/// Supplies the duration and individual frames of a video.
pub trait FrameSource: Send + Sync {
    fn duration(&self, video: &Path) -> Result<Duration, PipelineError>;

    /// Write the frame at `at` to `output` as an image file.
    fn extract_frame(&self, video: &Path, at: Duration, output: &Path)
        -> Result<(), PipelineError>;
}

/// Reads the text in an image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &Path) -> Result<String, PipelineError>;
}

/// [`FrameSource`] using ffprobe for the duration and ffmpeg for frames.
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    tools: Arc<Toolchain>,
}

impl FfmpegFrameSource {
    pub fn new(tools: Arc<Toolchain>) -> Self {
        Self { tools }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn duration(&self, video: &Path) -> Result<Duration, PipelineError> {
        probe_subtitles(&self.tools, video)
            .map_err(PipelineError::probe)?
            .duration
            .ok_or_else(|| PipelineError::extraction(STAGE, "container reports no duration"))
    }

    fn extract_frame(
        &self,
        video: &Path,
        at: Duration,
        output: &Path,
    ) -> Result<(), PipelineError> {
        extract_frame(&self.tools, video, at, output)
            .map_err(|e| PipelineError::extraction(STAGE, e))
    }
}

/// [`TextRecognizer`] running the tesseract CLI.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    tools: Arc<Toolchain>,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(tools: Arc<Toolchain>, language: impl Into<String>) -> Self {
        Self {
            tools,
            language: language.into(),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &Path) -> Result<String, PipelineError> {
        recognize_text(&self.tools, image, &self.language)
            .map_err(|e| PipelineError::extraction(STAGE, e))
    }
}

/// Sampling and filtering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrSettings {
    pub interval: Duration,
    pub region_fraction: f32,
    pub threshold: u8,
    pub min_text_len: usize,
    /// Recognizer language, e.g. `eng`; also decides the artifact language.
    pub language: String,
}

impl From<&OcrConfig> for OcrSettings {
    fn from(config: &OcrConfig) -> Self {
        Self {
            interval: Duration::from_secs_f64(config.interval_secs),
            region_fraction: config.region_fraction,
            threshold: config.threshold,
            min_text_len: config.min_text_len,
            language: config.language.clone(),
        }
    }
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self::from(&OcrConfig::default())
    }
}

/// Sample offsets `0, interval, 2*interval, ...` strictly before `duration`.
pub fn sample_times(duration: Duration, interval: Duration) -> Vec<Duration> {
    if interval.is_zero() {
        return Vec::new();
    }
    let mut times = Vec::new();
    let mut n: u32 = 0;
    loop {
        let at = interval * n;
        if at >= duration {
            break;
        }
        times.push(at);
        n += 1;
    }
    times
}

/// Normalize recognizer output: trimmed, blank lines dropped. Returns `None`
/// when fewer than `min_len` characters remain.
pub fn clean_text(raw: &str, min_len: usize) -> Option<String> {
    let text = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (text.chars().count() >= min_len).then_some(text)
}

pub struct OcrPipeline {
    frames: Arc<dyn FrameSource>,
    recognizer: Arc<dyn TextRecognizer>,
    settings: OcrSettings,
}

impl OcrPipeline {
    pub fn new(
        frames: Arc<dyn FrameSource>,
        recognizer: Arc<dyn TextRecognizer>,
        settings: OcrSettings,
    ) -> Self {
        Self {
            frames,
            recognizer,
            settings,
        }
    }

    /// Sample and recognize the whole video. Frames that fail to extract or
    /// preprocess are skipped.
    pub fn samples(&self, video: &Path) -> Result<Vec<Sample>, PipelineError> {
        let duration = self.frames.duration(video)?;
        let workspace = Workspace::new("ocr").map_err(|e| PipelineError::extraction(STAGE, e))?;
        let times = sample_times(duration, self.settings.interval);
        debug!(path = %video.display(), frames = times.len(), "Sampling frames for OCR");

        let mut samples = Vec::new();
        for (i, at) in times.into_iter().enumerate() {
            let frame = workspace.temp_file(&format!("frame_{i:06}.jpg"));
            let region = workspace.temp_file(&format!("region_{i:06}.png"));

            if let Err(e) = self.frames.extract_frame(video, at, &frame) {
                debug!(at = at.as_secs_f64(), error = %e, "Frame extraction failed, skipping");
                continue;
            }
            if let Err(e) = preprocess::prepare_file(
                &frame,
                &region,
                self.settings.region_fraction,
                self.settings.threshold,
            ) {
                debug!(at = at.as_secs_f64(), error = %e, "Frame preprocessing failed, skipping");
                continue;
            }

            let raw = match self.recognizer.recognize(&region) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(at = at.as_secs_f64(), error = %e, "Recognition failed, skipping");
                    continue;
                }
            };
            if let Some(text) = clean_text(&raw, self.settings.min_text_len) {
                samples.push(Sample {
                    at_secs: at.as_secs_f64(),
                    text,
                });
            }
        }

        Ok(samples)
    }

    /// Run OCR on `video` and write `<stem>_ocr.srt` to `output_dir`.
    ///
    /// Returns `Ok(None)` when no text was recognized.
    pub fn run(
        &self,
        video: &Path,
        output_dir: &Path,
    ) -> Result<Option<SubtitleArtifact>, PipelineError> {
        let samples = self.samples(video)?;
        if samples.is_empty() {
            return Ok(None);
        }

        let cues = build_cues(&samples);
        let output = output_dir.join(format!("{}_ocr.srt", stem_string(video)));
        std::fs::write(&output, render_srt(&cues))
            .map_err(|e| PipelineError::extraction(STAGE, e))?;

        info!(path = %video.display(), cues = cues.len(), output = %output.display(), "OCR subtitles written");

        Ok(Some(SubtitleArtifact::new(
            to_two_letter(&self.settings.language),
            STAGE,
            output,
        )))
    }
}
