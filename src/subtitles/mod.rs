//! Subtitle acquisition.
//!
//! [`SubtitleCascade`] tries, in order: embedded streams, sidecar files,
//! closed captions, OCR of burned-in text and a remote subtitle service.

pub mod caption;
pub mod cascade;
pub mod embedded;
pub mod ocr;
pub mod remote;
pub mod sidecar;

pub use caption::{CaptionDecoder, CcExtractorDecoder};
pub use cascade::{CascadeOptions, CascadeOutcome, HintSource, SubtitleCascade};
pub use embedded::{FfmpegStreamProbe, StreamProbe};
pub use ocr::{FrameSource, OcrPipeline, OcrSettings, TextRecognizer};
pub use remote::{RemoteSubtitles, SubtitleHints};
pub use sidecar::scan_sidecars;
