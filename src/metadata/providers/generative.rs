//! Language-model metadata source.
//!
//! Asks a chat model for a JSON description of a film. The answer is stored
//! verbatim as the raw payload and normalized leniently: models mix numbers
//! and strings, and lists and comma-separated text, freely.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::llm::{ChatClient, CompletionOptions};
use crate::metadata::provider::{
    non_empty, GenerativeEnrichmentProvider, ProviderFetch, ProviderInfo, ProviderMetadata,
    Runtime,
};

const MAX_TOKENS: u32 = 1500;

const SYSTEM_PROMPT: &str = "You are a film database. Answer with a single JSON object \
describing the requested film, using these keys: title, original_title, release_date \
(YYYY-MM-DD), runtime (minutes), overview, genres (array), director, actors (array, main \
cast), language (original language), country, imdb_id, imdb_rating. Use null for anything \
you do not know. If you do not recognize the film, answer with {}.";

static IMDB_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^tt\d{7,8}$").unwrap());

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedFilm {
    title: Option<String>,
    original_title: Option<String>,
    release_date: Option<String>,
    runtime: Option<Runtime>,
    overview: Option<String>,
    genres: Value,
    actors: Value,
    language: Option<String>,
    imdb_id: Option<String>,
    imdb_rating: Value,
}

pub struct GenerativeProvider {
    client: ChatClient,
}

impl GenerativeProvider {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

fn user_prompt(title: &str, year: Option<u16>) -> String {
    match year {
        Some(year) => format!("Film: {title} ({year})"),
        None => format!("Film: {title}"),
    }
}

/// Drop a Markdown code fence if the model wrapped its JSON in one.
fn strip_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// A JSON array of strings or one comma-separated string.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn rating(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    rating.filter(|r| r.is_finite() && *r > 0.0)
}

fn to_metadata(film: GeneratedFilm) -> ProviderMetadata {
    let mut external_ids = BTreeMap::new();
    if let Some(id) = non_empty(film.imdb_id).filter(|id| IMDB_ID.is_match(id)) {
        external_ids.insert("imdb".to_string(), id);
    }

    ProviderMetadata {
        title: non_empty(film.title),
        original_title: non_empty(film.original_title),
        release_date: non_empty(film.release_date),
        runtime: film.runtime,
        overview: non_empty(film.overview),
        language: non_empty(film.language),
        rating: rating(&film.imdb_rating),
        genres: string_list(&film.genres),
        actors: string_list(&film.actors),
        external_ids,
    }
}

impl ProviderInfo for GenerativeProvider {
    fn name(&self) -> &'static str {
        "generative"
    }
}

#[async_trait]
impl GenerativeEnrichmentProvider for GenerativeProvider {
    async fn generate(
        &self,
        title: &str,
        year: Option<u16>,
    ) -> anyhow::Result<Option<ProviderFetch>> {
        let reply = self
            .client
            .complete(
                SYSTEM_PROMPT,
                &user_prompt(title, year),
                CompletionOptions {
                    max_tokens: Some(MAX_TOKENS),
                    json: true,
                },
            )
            .await?;

        let body = strip_fence(&reply);
        if body.is_empty() {
            debug!(title, "Generative source returned an empty reply");
            return Ok(None);
        }

        let payload: Value =
            serde_json::from_str(body).context("generative reply is not valid JSON")?;
        let film: GeneratedFilm = serde_json::from_value(payload.clone())
            .context("generative reply has an unexpected shape")?;
        let metadata = to_metadata(film);
        if metadata.is_empty() {
            debug!(title, "Generative source did not recognize the film");
            return Ok(None);
        }

        Ok(Some(ProviderFetch::new("generative", payload, metadata)))
    }
}
