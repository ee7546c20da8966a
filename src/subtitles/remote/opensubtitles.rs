//! OpenSubtitles REST API client.
//!
//! Search: `GET /subtitles` by `imdb_id` (numeric part only) or `query`,
//! filtered by `languages`. Download: `POST /download` with a `file_id`
//! returns a temporary link, which is then fetched.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use super::{
    SubtitleCandidate, SubtitleCriteria, SubtitleDownloadProvider, SubtitleQuery,
    SubtitleSearchProvider,
};
use crate::config::RemoteSubtitlesConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    attributes: SearchAttributes,
}

#[derive(Debug, Deserialize)]
struct SearchAttributes {
    language: Option<String>,
    release: Option<String>,
    #[serde(default)]
    files: Vec<SearchFile>,
}

#[derive(Debug, Deserialize)]
struct SearchFile {
    file_id: u64,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: Option<String>,
}

pub struct OpenSubtitlesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    user_agent: String,
}

impl OpenSubtitlesClient {
    pub fn new(base_url: &str, api_key: &str, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Build a client from config. Returns `None` without an API key.
    pub fn from_config(config: &RemoteSubtitlesConfig) -> Option<Self> {
        let key = config.api_key.as_deref()?.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(&config.base_url, key, &config.user_agent))
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

/// Query parameters for a search.
fn search_params(criteria: &SubtitleCriteria) -> Vec<(&'static str, String)> {
    let mut params = match &criteria.query {
        SubtitleQuery::ExternalId(id) => {
            let digits = id.trim_start_matches("tt").trim_start_matches('0');
            vec![("imdb_id", digits.to_string())]
        }
        SubtitleQuery::Title(title) => vec![("query", title.clone())],
    };
    params.push(("languages", criteria.languages.join(",")));
    params
}

#[async_trait]
impl SubtitleSearchProvider for OpenSubtitlesClient {
    fn name(&self) -> &'static str {
        "opensubtitles"
    }

    async fn search(&self, criteria: &SubtitleCriteria) -> anyhow::Result<Vec<SubtitleCandidate>> {
        let url = format!("{}/subtitles", self.base_url);
        let params = search_params(criteria);
        debug!(url = %url, params = ?params, "OpenSubtitles search");

        let body: SearchResponse = self
            .request(reqwest::Method::GET, &url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("OpenSubtitles request failed: {url}"))?
            .error_for_status()
            .context("OpenSubtitles search returned error")?
            .json()
            .await
            .context("failed to parse OpenSubtitles search response")?;

        Ok(body
            .data
            .into_iter()
            .filter_map(|item| {
                let attrs = item.attributes;
                let file = attrs.files.first()?;
                Some(SubtitleCandidate {
                    file_id: file.file_id.to_string(),
                    language: attrs.language.unwrap_or_default(),
                    release: attrs.release,
                })
            })
            .collect())
    }
}

#[async_trait]
impl SubtitleDownloadProvider for OpenSubtitlesClient {
    async fn download(&self, candidate: &SubtitleCandidate) -> anyhow::Result<Bytes> {
        let url = format!("{}/download", self.base_url);
        let file_id: u64 = candidate
            .file_id
            .parse()
            .with_context(|| format!("invalid file id: {}", candidate.file_id))?;

        let response: DownloadResponse = self
            .request(reqwest::Method::POST, &url)
            .json(&serde_json::json!({ "file_id": file_id }))
            .send()
            .await
            .with_context(|| format!("OpenSubtitles request failed: {url}"))?
            .error_for_status()
            .context("OpenSubtitles download returned error")?
            .json()
            .await
            .context("failed to parse OpenSubtitles download response")?;

        let link = response
            .link
            .context("OpenSubtitles download response has no link")?;
        debug!(file_id, "Fetching subtitle file");

        self.client
            .get(&link)
            .send()
            .await
            .context("subtitle file request failed")?
            .error_for_status()
            .context("subtitle file request returned error")?
            .bytes()
            .await
            .context("failed to read subtitle file")
    }
}
