//! Scenescribe - subtitle harvesting and metadata resolution for video files
//!
//! This library crate exposes the pipeline for the binary and for integration
//! testing.

pub mod config;
pub mod error;
pub mod llm;
pub mod metadata;
pub mod naming;
pub mod persistence;
pub mod pipeline;
pub mod subtitles;

pub use error::PipelineError;
pub use persistence::{PersistenceGateway, ProcessedVideo, SqliteGateway};
pub use pipeline::{Orchestrator, ProcessOptions, ProcessingResult};
