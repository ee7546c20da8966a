//! Scenescribe-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across scenescribe:
//!
//! - **Typed IDs**: A UUID wrapper for video records
//! - **Core Types**: Processing status and subtitle source enums
//! - **Path Utilities**: Extension checks and sidecar language detection
//! - **Languages**: Mapping of language names and ISO codes to two-letter tags
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use scenescribe_common::{Error, Result, SubtitleSource, VideoId, VideoStatus};
//! use scenescribe_common::paths::is_video_file;
//! use std::path::Path;
//!
//! let id = VideoId::new();
//! assert_ne!(id, VideoId::new());
//!
//! assert!(VideoStatus::Completed.is_terminal());
//! assert!(SubtitleSource::Embedded < SubtitleSource::Remote);
//!
//! assert!(is_video_file(Path::new("movie.mkv")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("video"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod language;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
