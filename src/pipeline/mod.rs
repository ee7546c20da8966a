//! Video processing pipeline.
//!
//! - [`processor`] -- The [`Orchestrator`] and single-video processing.
//! - [`batch`] -- Bounded, cancellable processing of many videos.
//! - [`builder`] -- Production wiring from [`Config`](crate::config::Config).

pub mod batch;
pub mod builder;
pub mod processor;

pub use builder::{build_orchestrator, process_options};
pub use processor::{Orchestrator, ProcessOptions, ProcessingResult};
