//! Closed-caption decoding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scenescribe_av::caption::extract_captions;
use scenescribe_av::Toolchain;
use scenescribe_common::paths::stem_string;
use tracing::{debug, warn};

/// Decodes the closed-caption track of a video into a subtitle file.
pub trait CaptionDecoder: Send + Sync {
    /// Path of the decoded SRT inside `output_dir`, or `None` when the video
    /// carries no captions or the decoder failed.
    fn decode(&self, video: &Path, output_dir: &Path) -> Option<PathBuf>;
}

/// [`CaptionDecoder`] running ccextractor.
#[derive(Debug, Clone)]
pub struct CcExtractorDecoder {
    tools: Arc<Toolchain>,
}

impl CcExtractorDecoder {
    pub fn new(tools: Arc<Toolchain>) -> Self {
        Self { tools }
    }
}

/// Output file used for decoded captions.
pub fn caption_output(video: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}_cc.srt", stem_string(video)))
}

impl CaptionDecoder for CcExtractorDecoder {
    fn decode(&self, video: &Path, output_dir: &Path) -> Option<PathBuf> {
        let output = caption_output(video, output_dir);
        match extract_captions(&self.tools, video, &output) {
            Ok(true) => Some(output),
            Ok(false) => {
                debug!(path = %video.display(), "No closed captions found");
                None
            }
            Err(e) => {
                warn!(path = %video.display(), error = %e, "Closed-caption decoder failed");
                None
            }
        }
    }
}
