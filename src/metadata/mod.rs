//! Metadata resolution across several sources.
//!
//! # Module layout
//!
//! - [`provider`] -- Role traits and the normalized per-provider record.
//! - [`providers`] -- Concrete sources (TMDB, OMDb, generative).
//! - [`aggregator`] -- Queries the configured sources for one title.
//! - [`merge`] -- Folds contributions together under a precedence list.

pub mod aggregator;
pub mod merge;
pub mod provider;
pub mod providers;

pub use aggregator::{Aggregation, MetadataAggregator, SourceSpec};
pub use merge::{merge, Contribution};
pub use provider::{
    parse_runtime, DetailProvider, GenerativeEnrichmentProvider, IdBridgeProvider, ProviderFetch,
    ProviderInfo, ProviderMetadata, Runtime, SearchResult, TitleSearchProvider,
};
