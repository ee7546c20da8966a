//! Multi-source metadata aggregation.
//!
//! The [`MetadataAggregator`] holds an ordered list of sources. Structured and
//! generative sources are queried concurrently; bridged sources run after
//! them because they need an id another source produced. Every source that
//! answers contributes its raw [`MetadataRecord`] and a normalized
//! [`ProviderMetadata`], which [`merge`] folds together.

use std::sync::Arc;

use futures::future::join_all;
use scenescribe_db::models::{MergedMetadata, MetadataRecord};
use tracing::{debug, info, warn};

use super::merge::{merge, Contribution};
use super::provider::{
    DetailProvider, GenerativeEnrichmentProvider, IdBridgeProvider, ProviderFetch,
    ProviderMetadata, TitleSearchProvider,
};

/// How a source is queried.
#[derive(Clone)]
pub enum SourceSpec {
    /// Search by title, then fetch details for the best hit.
    Structured {
        search: Arc<dyn TitleSearchProvider>,
        detail: Arc<dyn DetailProvider>,
    },
    /// Translate the internal id produced by source `from` into an id
    /// `detail` understands, then fetch by it.
    Bridged {
        from: String,
        bridge: Arc<dyn IdBridgeProvider>,
        detail: Arc<dyn DetailProvider>,
    },
    /// Ask a generative model directly.
    Generative(Arc<dyn GenerativeEnrichmentProvider>),
}

impl SourceSpec {
    /// The name the source contributes under.
    pub fn name(&self) -> &'static str {
        match self {
            SourceSpec::Structured { detail, .. } | SourceSpec::Bridged { detail, .. } => {
                detail.name()
            }
            SourceSpec::Generative(provider) => provider.name(),
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            SourceSpec::Structured { search, detail } => {
                search.is_available() && detail.is_available()
            }
            SourceSpec::Bridged { bridge, detail, .. } => {
                bridge.is_available() && detail.is_available()
            }
            SourceSpec::Generative(provider) => provider.is_available(),
        }
    }

    fn is_bridged(&self) -> bool {
        matches!(self, SourceSpec::Bridged { .. })
    }
}

impl std::fmt::Debug for SourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            SourceSpec::Structured { .. } => "structured",
            SourceSpec::Bridged { .. } => "bridged",
            SourceSpec::Generative(_) => "generative",
        };
        write!(f, "{}({kind})", self.name())
    }
}

/// Merged metadata plus the raw payloads it was built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub merged: MergedMetadata,
    pub records: Vec<MetadataRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataAggregator {
    sources: Vec<SourceSpec>,
    precedence: Vec<String>,
}

impl MetadataAggregator {
    pub fn new(precedence: Vec<String>) -> Self {
        Self {
            sources: Vec::new(),
            precedence,
        }
    }

    /// Register a source. Registration order breaks ties between sources the
    /// precedence list does not name.
    pub fn with_source(mut self, source: SourceSpec) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(SourceSpec::name).collect()
    }

    pub fn has_available_sources(&self) -> bool {
        self.sources.iter().any(SourceSpec::is_available)
    }

    /// Query every available source for `title` and merge the answers.
    ///
    /// Never fails: a source error is logged and that source contributes
    /// nothing.
    pub async fn aggregate(&self, title: &str, year: Option<u16>) -> Aggregation {
        let title = title.trim();
        if title.is_empty() {
            debug!("No title to aggregate metadata for");
            return Aggregation::default();
        }

        let available: Vec<&SourceSpec> = self
            .sources
            .iter()
            .filter(|s| {
                let ok = s.is_available();
                if !ok {
                    debug!(source = s.name(), "Metadata source not configured, skipping");
                }
                ok
            })
            .collect();

        let (bridged, direct): (Vec<&SourceSpec>, Vec<&SourceSpec>) =
            available.into_iter().partition(|s| s.is_bridged());

        let mut fetched: Vec<(&'static str, ProviderFetch)> =
            join_all(direct.iter().map(|s| self.query_direct(s, title, year)))
                .await
                .into_iter()
                .flatten()
                .collect();

        let bridged_results = join_all(
            bridged
                .iter()
                .map(|s| self.query_bridged(s, &fetched)),
        )
        .await;
        fetched.extend(bridged_results.into_iter().flatten());

        let contributions: Vec<Contribution> = fetched
            .iter()
            .map(|(name, fetch)| Contribution::new(*name, fetch.metadata.clone()))
            .collect();
        let merged = merge(&contributions, &self.precedence);
        let records = fetched.into_iter().map(|(_, f)| f.record).collect();

        info!(
            title,
            year,
            sources = ?merged.sources,
            "Metadata aggregated"
        );
        Aggregation { merged, records }
    }

    async fn query_direct(
        &self,
        source: &SourceSpec,
        title: &str,
        year: Option<u16>,
    ) -> Option<(&'static str, ProviderFetch)> {
        let name = source.name();
        let result = match source {
            SourceSpec::Structured { search, detail } => {
                structured(search.as_ref(), detail.as_ref(), title, year).await
            }
            SourceSpec::Generative(provider) => provider.generate(title, year).await,
            SourceSpec::Bridged { .. } => Ok(None),
        };
        settle(name, result)
    }

    async fn query_bridged(
        &self,
        source: &SourceSpec,
        fetched: &[(&'static str, ProviderFetch)],
    ) -> Option<(&'static str, ProviderFetch)> {
        let SourceSpec::Bridged {
            from,
            bridge,
            detail,
        } = source
        else {
            return None;
        };
        let name = source.name();

        let internal_id = fetched
            .iter()
            .find(|(n, _)| n == from)
            .and_then(|(_, f)| f.metadata.external_ids.get(from.as_str()));
        let Some(internal_id) = internal_id else {
            debug!(source = name, from = %from, "No upstream id to bridge from, skipping");
            return None;
        };

        let external_id = match bridge.bridge(internal_id).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!(source = name, id = %internal_id, "Bridge found no external id");
                return None;
            }
            Err(e) => {
                warn!(source = name, error = %format!("{e:#}"), "Id bridge failed, skipping source");
                return None;
            }
        };

        settle(name, detail.get_by_id(&external_id).await.map(Some))
    }
}

async fn structured(
    search: &dyn TitleSearchProvider,
    detail: &dyn DetailProvider,
    title: &str,
    year: Option<u16>,
) -> anyhow::Result<Option<ProviderFetch>> {
    let results = search.search(title, year).await?;
    let Some(best) = results.first() else {
        debug!(source = detail.name(), title, "No search results");
        return Ok(None);
    };
    debug!(
        source = detail.name(),
        id = %best.id,
        matched = %best.title,
        confidence = best.confidence,
        "Best search match"
    );
    detail.get_by_id(&best.id).await.map(Some)
}

/// Turn a source outcome into an optional contribution, logging failures.
fn settle(
    name: &'static str,
    result: anyhow::Result<Option<ProviderFetch>>,
) -> Option<(&'static str, ProviderFetch)> {
    match result {
        Ok(Some(fetch)) if fetch.metadata != ProviderMetadata::default() => Some((name, fetch)),
        Ok(_) => None,
        Err(e) => {
            warn!(source = name, error = %format!("{e:#}"), "Metadata source failed");
            None
        }
    }
}
