//! Capability traits and shared types for metadata sources.
//!
//! A concrete backend implements one trait per role it can fill:
//! [`TitleSearchProvider`] and [`DetailProvider`] for structured databases,
//! [`IdBridgeProvider`] for identifier translation, and
//! [`GenerativeEnrichmentProvider`] for model-generated records. All of them
//! share [`ProviderInfo`] so a backend has a single name.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scenescribe_db::models::MetadataRecord;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// A single result returned from a title search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Provider-specific identifier (TMDB numeric id, IMDb id, ...).
    pub id: String,
    pub title: String,
    pub year: Option<u16>,
    pub overview: Option<String>,
    /// How well the result matches the query (0.0 - 0.8).
    pub confidence: f64,
    pub provider_name: String,
}

/// Sort results by descending confidence.
pub fn sort_by_confidence(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Score a search hit by title similarity and year proximity.
pub fn title_confidence(
    query_title: &str,
    result_title: &str,
    query_year: Option<u16>,
    result_year: Option<u16>,
) -> f64 {
    let base = if query_title == result_title {
        0.5
    } else if query_title.to_lowercase() == result_title.to_lowercase() {
        0.4
    } else if result_title
        .to_lowercase()
        .contains(&query_title.to_lowercase())
    {
        0.2
    } else {
        0.1
    };

    let year_bonus = match (query_year, result_year) {
        (Some(q), Some(r)) if q == r => 0.3,
        (Some(q), Some(r)) if q.abs_diff(r) <= 1 => 0.15,
        _ => 0.0,
    };

    base + year_bonus
}

/// Extract a four-digit year from a date string like `"2023-04-15"`.
pub fn parse_year(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse::<u16>().ok())
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

static HOURS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*h").unwrap());
static MINUTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*m").unwrap());
static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*$").unwrap());

/// Runtime as a provider reports it: a number of minutes or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Runtime {
    Minutes(f64),
    Text(String),
}

impl Runtime {
    /// Whole minutes, `0` when unknown or unparseable.
    pub fn minutes(&self) -> u32 {
        match self {
            Runtime::Minutes(m) if m.is_finite() && *m > 0.0 => m.round() as u32,
            Runtime::Minutes(_) => 0,
            Runtime::Text(text) => parse_runtime(text),
        }
    }
}

/// Parse `"142 min"`, `"2h 22min"`, `"1 hr 30 mins"` or `"142"` into minutes.
/// Anything else is `0`.
///
/// ```
/// use scenescribe::metadata::parse_runtime;
///
/// assert_eq!(parse_runtime("142 min"), 142);
/// assert_eq!(parse_runtime("2h 22min"), 142);
/// assert_eq!(parse_runtime("N/A"), 0);
/// ```
pub fn parse_runtime(text: &str) -> u32 {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    };

    let hours = capture(&HOURS);
    let minutes = capture(&MINUTES);
    if hours.is_none() && minutes.is_none() {
        return capture(&BARE_NUMBER).unwrap_or(0);
    }
    hours
        .unwrap_or(0)
        .saturating_mul(60)
        .saturating_add(minutes.unwrap_or(0))
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// One provider's answer, normalized to the fields the merge understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub title: Option<String>,
    pub original_title: Option<String>,
    /// `YYYY-MM-DD` when the provider gives a full date.
    pub release_date: Option<String>,
    pub runtime: Option<Runtime>,
    pub overview: Option<String>,
    /// Original language (`"ko"`, `"Korean"`, ...).
    pub language: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    /// Identifiers keyed by provider, e.g. `imdb -> tt0113277`.
    pub external_ids: BTreeMap<String, String>,
}

impl ProviderMetadata {
    pub fn runtime_minutes(&self) -> u32 {
        self.runtime.as_ref().map(Runtime::minutes).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A provider's raw payload together with its normalized form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFetch {
    pub record: MetadataRecord,
    pub metadata: ProviderMetadata,
}

impl ProviderFetch {
    pub fn new(provider: &str, payload: serde_json::Value, metadata: ProviderMetadata) -> Self {
        Self {
            record: MetadataRecord::new(provider, payload),
            metadata,
        }
    }
}

/// Treat blank strings and OMDb's `"N/A"` as missing.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

/// Identity shared by every provider role.
pub trait ProviderInfo: Send + Sync {
    /// Short, lowercase identifier (e.g. `"tmdb"`). Used in precedence lists.
    fn name(&self) -> &'static str;

    /// `true` when the provider is configured (credentials present).
    fn is_available(&self) -> bool {
        true
    }
}

/// Finds candidate works by title.
#[async_trait]
pub trait TitleSearchProvider: ProviderInfo {
    /// Results sorted by descending confidence.
    async fn search(&self, query: &str, year: Option<u16>) -> anyhow::Result<Vec<SearchResult>>;
}

/// Fetches the full record for a provider id.
#[async_trait]
pub trait DetailProvider: ProviderInfo {
    async fn get_by_id(&self, id: &str) -> anyhow::Result<ProviderFetch>;
}

/// Translates this provider's internal id into another provider's id
/// (e.g. TMDB id to IMDb id).
#[async_trait]
pub trait IdBridgeProvider: ProviderInfo {
    async fn bridge(&self, internal_id: &str) -> anyhow::Result<Option<String>>;
}

/// Produces a record from a title alone, typically with a language model.
#[async_trait]
pub trait GenerativeEnrichmentProvider: ProviderInfo {
    /// `Ok(None)` when the model had nothing usable to say.
    async fn generate(&self, title: &str, year: Option<u16>)
        -> anyhow::Result<Option<ProviderFetch>>;
}
