//! # scenescribe-av
//!
//! Thin, synchronous wrappers around the external programs used to pull
//! subtitles out of video files.
//!
//! - [`probe`] lists subtitle streams and the container duration (ffprobe)
//! - [`extract`] writes a subtitle stream or a single frame to disk (ffmpeg)
//! - [`caption`] decodes broadcast closed captions (ccextractor)
//! - [`ocr`] recognizes text in an image (tesseract)
//! - [`tools`] locates the programs and reports their versions
//! - [`workspace`] provides a scratch directory removed on drop
//!
//! Every call blocks on a child process; async callers should run them on a
//! blocking thread.
//!
//! ## Features
//!
//! - `tracing` - Emit debug events for every command that is run
//!
//! ## Example
//!
//! ```no_run
//! use scenescribe_av::{probe_subtitles, Toolchain};
//! use std::path::Path;
//!
//! let tools = Toolchain::default();
//! let report = probe_subtitles(&tools, Path::new("/path/to/video.mkv"))?;
//! for stream in &report.subtitle_streams {
//!     println!("#{} {} ({})", stream.index, stream.codec, stream.language);
//! }
//! # Ok::<(), scenescribe_av::Error>(())
//! ```

pub mod caption;
mod error;
pub mod extract;
pub mod ocr;
pub mod probe;
pub mod tools;
pub mod workspace;

pub use error::{Error, Result};
pub use probe::{probe_subtitles, ProbeReport, SubtitleStream};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo, Toolchain};
pub use workspace::Workspace;
