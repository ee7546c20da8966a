//! Core type definitions for video records and subtitle artifacts.
//!
//! All enums serialize in lowercase snake case so the same strings are used in
//! JSON output and in database columns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of a video record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Record created, no stage started yet.
    Pending,
    /// Subtitle cascade is running.
    Extracting,
    /// Canonical title is being resolved.
    Identifying,
    /// Metadata providers are being queried.
    Enriching,
    /// All stages finished and the record was persisted.
    Completed,
    /// The attempt ended with an error.
    Failed,
}

impl VideoStatus {
    /// Whether this status ends a processing attempt.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Extracting => write!(f, "extracting"),
            Self::Identifying => write!(f, "identifying"),
            Self::Enriching => write!(f, "enriching"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for VideoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "extracting" => Ok(Self::Extracting),
            "identifying" => Ok(Self::Identifying),
            "enriching" => Ok(Self::Enriching),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid video status: {}", s)),
        }
    }
}

/// Where a subtitle artifact came from.
///
/// Variants are declared in cascade priority order, so `Ord` ranks an
/// embedded track above a sidecar file, and so on down to remote downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleSource {
    /// Subtitle stream inside the video container.
    Embedded,
    /// Subtitle file next to the video.
    Sidecar,
    /// Broadcast closed captions decoded from the video stream.
    ClosedCaption,
    /// Text recognized from burned-in subtitles.
    Ocr,
    /// Downloaded from a remote subtitle service.
    Remote,
}

impl SubtitleSource {
    /// All sources in cascade order.
    pub const ALL: [SubtitleSource; 5] = [
        Self::Embedded,
        Self::Sidecar,
        Self::ClosedCaption,
        Self::Ocr,
        Self::Remote,
    ];
}

impl fmt::Display for SubtitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded"),
            Self::Sidecar => write!(f, "sidecar"),
            Self::ClosedCaption => write!(f, "closed_caption"),
            Self::Ocr => write!(f, "ocr"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl std::str::FromStr for SubtitleSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "embedded" => Ok(Self::Embedded),
            "sidecar" => Ok(Self::Sidecar),
            "closed_caption" => Ok(Self::ClosedCaption),
            "ocr" => Ok(Self::Ocr),
            "remote" => Ok(Self::Remote),
            _ => Err(format!("Invalid subtitle source: {}", s)),
        }
    }
}
