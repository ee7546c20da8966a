//! TMDB (The Movie Database) metadata provider.
//!
//! Fills three roles against the TMDB v3 REST API: title search, detail
//! lookup (with credits and external ids appended) and the TMDB-to-IMDb id
//! bridge used by sources that only understand IMDb ids.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Single attempt per request; HTTP 429 fails the lookup like any other error.
//! - 30-second request timeout.
//! - Confidence scoring based on title similarity and year proximity.

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use tracing::debug;

use crate::config::TmdbConfig;
use crate::metadata::provider::{
    non_empty, parse_year, sort_by_confidence, title_confidence, DetailProvider,
    IdBridgeProvider, ProviderFetch, ProviderInfo, ProviderMetadata, Runtime, SearchResult,
    TitleSearchProvider,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ACTORS: usize = 10;
const REQUESTS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(4) {
    Some(n) => n,
    None => panic!("rate must be non-zero"),
};

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieSearchResult {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetail {
    id: u64,
    title: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    original_language: Option<String>,
    vote_average: Option<f64>,
    runtime: Option<f64>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    imdb_id: Option<String>,
    credits: Option<TmdbCredits>,
    external_ids: Option<TmdbExternalIds>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCastMember>,
}

#[derive(Debug, Deserialize)]
struct TmdbCastMember {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB metadata provider.
///
/// # Examples
///
/// ```no_run
/// use scenescribe::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new("your-api-key", "en-US", "https://api.themoviedb.org/3");
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbProvider {
    /// Create a provider. `language` is a TMDB locale such as `"en-US"`.
    pub fn new(api_key: &str, language: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.trim().to_string(),
            language: language.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::direct(Quota::per_second(REQUESTS_PER_SECOND)),
        }
    }

    pub fn from_config(config: &TmdbConfig) -> Self {
        Self::new(
            config.api_key.as_deref().unwrap_or_default(),
            &config.language,
            &config.base_url,
        )
    }

    /// Execute a single rate-limited GET request. Any non-success status,
    /// 429 included, is an error for this source.
    async fn get(&self, url: &str) -> anyhow::Result<reqwest::Response> {
        self.rate_limiter.until_ready().await;

        self.client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("TMDB request failed: {}", self.redact(url)))?
            .error_for_status()
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("TMDB request returned error: {}", self.redact(url)))
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.base_url,
            urlencoded(&self.api_key),
            urlencoded(&self.language)
        );
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }

    /// The URL with the API key masked, for logs and error messages.
    fn redact(&self, url: &str) -> String {
        if self.api_key.is_empty() {
            return url.to_string();
        }
        url.replace(
            &format!("api_key={}", urlencoded(&self.api_key)),
            "api_key=***",
        )
    }
}

/// Minimal percent-encoding for query parameter values.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Map a TMDB movie detail into the common metadata shape.
fn to_metadata(detail: TmdbMovieDetail) -> ProviderMetadata {
    let mut external_ids = BTreeMap::new();
    external_ids.insert("tmdb".to_string(), detail.id.to_string());
    let imdb = non_empty(detail.imdb_id)
        .or_else(|| non_empty(detail.external_ids.and_then(|e| e.imdb_id)));
    if let Some(imdb) = imdb {
        external_ids.insert("imdb".to_string(), imdb);
    }

    ProviderMetadata {
        title: non_empty(detail.title),
        original_title: non_empty(detail.original_title),
        release_date: non_empty(detail.release_date),
        runtime: detail.runtime.map(Runtime::Minutes),
        overview: non_empty(detail.overview),
        language: non_empty(detail.original_language),
        rating: detail.vote_average.filter(|r| *r > 0.0),
        genres: detail.genres.into_iter().map(|g| g.name).collect(),
        actors: detail
            .credits
            .map(|c| c.cast)
            .unwrap_or_default()
            .into_iter()
            .take(MAX_ACTORS)
            .map(|c| c.name)
            .collect(),
        external_ids,
    }
}

impl ProviderInfo for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl TitleSearchProvider for TmdbProvider {
    async fn search(&self, title: &str, year: Option<u16>) -> anyhow::Result<Vec<SearchResult>> {
        let mut params = vec![("query", title)];
        let year_str = year.map(|y| y.to_string());
        if let Some(ref y) = year_str {
            params.push(("primary_release_year", y.as_str()));
        }

        let url = self.url("/search/movie", &params);
        debug!(title, year, "TMDB search movie");

        let body: TmdbSearchResponse<TmdbMovieSearchResult> = self
            .get(&url)
            .await?
            .json()
            .await
            .context("failed to parse TMDB movie search response")?;

        let mut results: Vec<SearchResult> = body
            .results
            .into_iter()
            .map(|r| {
                let result_title = r.title.unwrap_or_default();
                let result_year = parse_year(r.release_date.as_deref());
                let confidence = title_confidence(title, &result_title, year, result_year);
                SearchResult {
                    id: r.id.to_string(),
                    title: result_title,
                    year: result_year,
                    overview: r.overview,
                    confidence,
                    provider_name: "tmdb".to_string(),
                }
            })
            .collect();

        sort_by_confidence(&mut results);
        Ok(results)
    }
}

#[async_trait]
impl DetailProvider for TmdbProvider {
    async fn get_by_id(&self, id: &str) -> anyhow::Result<ProviderFetch> {
        let url = self.url(
            &format!("/movie/{id}"),
            &[("append_to_response", "credits,external_ids")],
        );
        debug!(id, "TMDB get movie details");

        let payload: serde_json::Value = self
            .get(&url)
            .await?
            .json()
            .await
            .context("failed to parse TMDB movie detail response")?;

        let detail: TmdbMovieDetail = serde_json::from_value(payload.clone())
            .context("unexpected TMDB movie detail shape")?;

        Ok(ProviderFetch::new("tmdb", payload, to_metadata(detail)))
    }
}

#[async_trait]
impl IdBridgeProvider for TmdbProvider {
    async fn bridge(&self, internal_id: &str) -> anyhow::Result<Option<String>> {
        let url = self.url(&format!("/movie/{internal_id}/external_ids"), &[]);
        debug!(id = internal_id, "TMDB get external ids");

        let ids: TmdbExternalIds = self
            .get(&url)
            .await?
            .json()
            .await
            .context("failed to parse TMDB external ids response")?;

        Ok(non_empty(ids.imdb_id))
    }
}
