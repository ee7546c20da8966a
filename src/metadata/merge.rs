//! Precedence-ordered merge of provider contributions.
//!
//! Scalars are first-writer-wins in precedence order; genres and actors are
//! unioned on a case- and whitespace-insensitive key; external ids follow the
//! scalar rule per key.

use std::collections::HashSet;

use scenescribe_db::models::MergedMetadata;

use super::provider::ProviderMetadata;

/// One source's normalized answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub provider: String,
    pub metadata: ProviderMetadata,
}

impl Contribution {
    pub fn new(provider: impl Into<String>, metadata: ProviderMetadata) -> Self {
        Self {
            provider: provider.into(),
            metadata,
        }
    }
}

/// Rank of `provider` in `precedence`; unlisted providers rank last.
fn rank(provider: &str, precedence: &[String]) -> usize {
    precedence
        .iter()
        .position(|p| p.eq_ignore_ascii_case(provider))
        .unwrap_or(precedence.len())
}

/// Lowercased with runs of whitespace collapsed to one space.
fn dedup_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn fill(slot: &mut Option<String>, value: &Option<String>) {
    if slot.is_none() {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            *slot = Some(v.to_string());
        }
    }
}

fn union_into(target: &mut Vec<String>, seen: &mut HashSet<String>, values: &[String]) {
    for value in values {
        let key = dedup_key(value);
        if !key.is_empty() && seen.insert(key) {
            target.push(value.split_whitespace().collect::<Vec<_>>().join(" "));
        }
    }
}

/// Merge contributions under `precedence` (highest first).
///
/// The sort is stable, so providers missing from `precedence` keep the order
/// they were given in.
pub fn merge(contributions: &[Contribution], precedence: &[String]) -> MergedMetadata {
    let mut ordered: Vec<&Contribution> = contributions.iter().collect();
    ordered.sort_by_key(|c| rank(&c.provider, precedence));

    let mut merged = MergedMetadata::default();
    let mut seen_genres = HashSet::new();
    let mut seen_actors = HashSet::new();

    for contribution in ordered {
        let m = &contribution.metadata;
        if m.is_empty() {
            continue;
        }

        fill(&mut merged.title, &m.title);
        fill(&mut merged.original_title, &m.original_title);
        fill(&mut merged.release_date, &m.release_date);
        fill(&mut merged.overview, &m.overview);
        fill(&mut merged.language, &m.language);
        if merged.runtime == 0 {
            merged.runtime = m.runtime_minutes();
        }
        if merged.rating.is_none() {
            merged.rating = m.rating;
        }

        union_into(&mut merged.genres, &mut seen_genres, &m.genres);
        union_into(&mut merged.actors, &mut seen_actors, &m.actors);

        for (key, value) in &m.external_ids {
            if !value.trim().is_empty() {
                merged
                    .external_ids
                    .entry(key.clone())
                    .or_insert_with(|| value.trim().to_string());
            }
        }

        if !merged.sources.contains(&contribution.provider) {
            merged.sources.push(contribution.provider.clone());
        }
    }

    merged
}
