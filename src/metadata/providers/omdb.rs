//! OMDb (Open Movie Database) metadata provider.
//!
//! OMDb is keyed by IMDb id. It can search by title on its own, but when a
//! TMDB key is available the aggregator prefers reaching it through the TMDB
//! id bridge, which gives an exact id instead of a fuzzy title match.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::config::OmdbConfig;
use crate::metadata::provider::{
    non_empty, parse_year, sort_by_confidence, title_confidence, DetailProvider, ProviderFetch,
    ProviderInfo, ProviderMetadata, Runtime, SearchResult, TitleSearchProvider,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbSearchResponse {
    #[serde(default)]
    search: Vec<OmdbSearchItem>,
    response: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbSearchItem {
    title: Option<String>,
    year: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbDetail {
    title: Option<String>,
    released: Option<String>,
    runtime: Option<String>,
    genre: Option<String>,
    actors: Option<String>,
    plot: Option<String>,
    language: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    response: Option<String>,
    error: Option<String>,
}

pub struct OmdbProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OmdbProvider {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &OmdbConfig) -> Self {
        Self::new(config.api_key.as_deref().unwrap_or_default(), &config.base_url)
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> anyhow::Result<serde_json::Value> {
        let url = format!("{}/", self.base_url);
        self.client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("OMDb request failed")?
            .error_for_status()
            .map_err(reqwest::Error::without_url)
            .context("OMDb request returned error")?
            .json()
            .await
            .context("failed to parse OMDb response")
    }
}

/// OMDb reports failures in-band with `"Response": "False"`.
fn check_response(response: Option<&str>, error: Option<&str>) -> anyhow::Result<()> {
    if response.is_some_and(|r| r.eq_ignore_ascii_case("false")) {
        bail!("OMDb error: {}", error.unwrap_or("unknown error"));
    }
    Ok(())
}

/// `"16 Dec 1995"` becomes `"1995-12-16"`. Unparseable dates are kept as-is.
fn normalize_release(released: Option<String>) -> Option<String> {
    let released = non_empty(released)?;
    Some(
        NaiveDate::parse_from_str(&released, "%d %b %Y")
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or(released),
    )
}

fn split_list(value: Option<String>) -> Vec<String> {
    non_empty(value)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn to_metadata(detail: OmdbDetail) -> ProviderMetadata {
    let mut external_ids = BTreeMap::new();
    if let Some(imdb) = non_empty(detail.imdb_id) {
        external_ids.insert("imdb".to_string(), imdb);
    }

    ProviderMetadata {
        title: non_empty(detail.title),
        original_title: None,
        release_date: normalize_release(detail.released),
        runtime: non_empty(detail.runtime).map(Runtime::Text),
        overview: non_empty(detail.plot),
        language: split_list(detail.language).into_iter().next(),
        rating: non_empty(detail.imdb_rating).and_then(|r| r.parse::<f64>().ok()),
        genres: split_list(detail.genre),
        actors: split_list(detail.actors),
        external_ids,
    }
}

impl ProviderInfo for OmdbProvider {
    fn name(&self) -> &'static str {
        "omdb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl TitleSearchProvider for OmdbProvider {
    async fn search(&self, title: &str, year: Option<u16>) -> anyhow::Result<Vec<SearchResult>> {
        let year_str = year.map(|y| y.to_string());
        let mut params = vec![("s", title), ("type", "movie")];
        if let Some(ref y) = year_str {
            params.push(("y", y.as_str()));
        }
        debug!(title, year, "OMDb search");

        let body: OmdbSearchResponse = serde_json::from_value(self.get_json(&params).await?)
            .context("unexpected OMDb search shape")?;

        // "Movie not found!" is an empty result, not a failure.
        if body.search.is_empty() {
            if let Some(error) = body.error.as_deref() {
                debug!(title, error, "OMDb search returned nothing");
            }
            return Ok(Vec::new());
        }
        check_response(body.response.as_deref(), body.error.as_deref())?;

        let mut results: Vec<SearchResult> = body
            .search
            .into_iter()
            .map(|item| {
                let result_title = item.title.unwrap_or_default();
                let result_year = parse_year(item.year.as_deref());
                SearchResult {
                    id: item.imdb_id,
                    confidence: title_confidence(title, &result_title, year, result_year),
                    title: result_title,
                    year: result_year,
                    overview: None,
                    provider_name: "omdb".to_string(),
                }
            })
            .collect();

        sort_by_confidence(&mut results);
        Ok(results)
    }
}

#[async_trait]
impl DetailProvider for OmdbProvider {
    async fn get_by_id(&self, id: &str) -> anyhow::Result<ProviderFetch> {
        debug!(id, "OMDb get details");
        let payload = self.get_json(&[("i", id), ("plot", "short")]).await?;
        let detail: OmdbDetail =
            serde_json::from_value(payload.clone()).context("unexpected OMDb detail shape")?;
        check_response(detail.response.as_deref(), detail.error.as_deref())?;

        Ok(ProviderFetch::new("omdb", payload, to_metadata(detail)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn release_dates_are_normalized() {
        assert_eq!(
            normalize_release(Some("16 Dec 1995".into())).as_deref(),
            Some("1995-12-16")
        );
        assert_eq!(normalize_release(Some("1995".into())).as_deref(), Some("1995"));
        assert_eq!(normalize_release(Some("N/A".into())), None);
    }

    #[test]
    fn lists_are_split_on_commas() {
        assert_eq!(
            split_list(Some("Action, Crime, Drama".into())),
            vec!["Action", "Crime", "Drama"]
        );
        assert!(split_list(Some("N/A".into())).is_empty());
    }

    #[test]
    fn in_band_errors_are_detected() {
        assert!(check_response(Some("True"), None).is_ok());
        assert!(check_response(None, None).is_ok());
        let err = check_response(Some("False"), Some("Invalid API key!")).unwrap_err();
        assert!(err.to_string().contains("Invalid API key!"));
    }

    #[test]
    fn availability_follows_key() {
        assert!(!OmdbProvider::from_config(&OmdbConfig::default()).is_available());
        assert!(OmdbProvider::new("k", "http://x").is_available());
    }

    #[tokio::test]
    async fn details_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("apikey", "k"))
            .and(query_param("i", "tt0113277"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Title": "Heat",
                "Year": "1995",
                "Released": "15 Dec 1995",
                "Runtime": "170 min",
                "Genre": "Action, Crime, Drama",
                "Actors": "Al Pacino, Robert De Niro, Val Kilmer",
                "Plot": "A group of professional bank robbers...",
                "Language": "English, Spanish",
                "imdbRating": "8.3",
                "imdbID": "tt0113277",
                "Response": "True"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OmdbProvider::new("k", &server.uri());
        let fetch = provider.get_by_id("tt0113277").await.unwrap();
        let m = &fetch.metadata;

        assert_eq!(fetch.record.provider, "omdb");
        assert_eq!(fetch.record.payload["Title"], "Heat");
        assert_eq!(m.release_date.as_deref(), Some("1995-12-15"));
        assert_eq!(m.runtime_minutes(), 170);
        assert_eq!(m.language.as_deref(), Some("English"));
        assert_eq!(m.rating, Some(8.3));
        assert_eq!(m.genres.len(), 3);
        assert_eq!(m.actors[1], "Robert De Niro");
        assert_eq!(m.external_ids.get("imdb").map(String::as_str), Some("tt0113277"));
    }

    #[tokio::test]
    async fn details_error_response_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Response": "False",
                "Error": "Incorrect IMDb ID."
            })))
            .mount(&server)
            .await;

        let provider = OmdbProvider::new("k", &server.uri());
        let err = provider.get_by_id("tt0").await.unwrap_err();
        assert!(format!("{err:#}").contains("Incorrect IMDb ID."));
    }

    #[tokio::test]
    async fn search_by_title_and_year() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("s", "Heat"))
            .and(query_param("y", "1995"))
            .and(query_param("type", "movie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Search": [
                    {"Title": "Heat", "Year": "1995", "imdbID": "tt0113277", "Type": "movie"}
                ],
                "totalResults": "1",
                "Response": "True"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("s", "Zzzz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Response": "False",
                "Error": "Movie not found!"
            })))
            .mount(&server)
            .await;

        let provider = OmdbProvider::new("k", &server.uri());
        let results = provider.search("Heat", Some(1995)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "tt0113277");
        assert_eq!(results[0].provider_name, "omdb");

        assert!(provider.search("Zzzz", None).await.unwrap().is_empty());
    }
}
