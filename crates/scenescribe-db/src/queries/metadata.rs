//! Merged metadata and raw provider payload queries.
//!
//! List and map fields of [`MergedMetadata`] are stored as JSON text columns.

use rusqlite::Connection;
use scenescribe_common::{Error, Result, VideoId};

use super::{parse_json, parse_timestamp};
use crate::models::{MergedMetadata, MetadataRecord};

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::internal(e.to_string()))
}

/// Store the merged metadata of a video, replacing any previous row.
pub fn upsert_merged(conn: &Connection, video_id: VideoId, merged: &MergedMetadata) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO merged_metadata
            (video_id, title, original_title, release_date, runtime, overview, language,
             rating, genres, actors, external_ids, sources)
         VALUES (:video_id, :title, :original_title, :release_date, :runtime, :overview,
                 :language, :rating, :genres, :actors, :external_ids, :sources)",
        rusqlite::named_params! {
            ":video_id": video_id.to_string(),
            ":title": merged.title,
            ":original_title": merged.original_title,
            ":release_date": merged.release_date,
            ":runtime": merged.runtime,
            ":overview": merged.overview,
            ":language": merged.language,
            ":rating": merged.rating,
            ":genres": to_json(&merged.genres)?,
            ":actors": to_json(&merged.actors)?,
            ":external_ids": to_json(&merged.external_ids)?,
            ":sources": to_json(&merged.sources)?,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get the merged metadata of a video.
///
/// # Returns
///
/// * `Ok(Some(MergedMetadata))` - The stored metadata
/// * `Ok(None)` - If nothing was stored for the video
/// * `Err(Error)` - If a database error occurs
pub fn get_merged(conn: &Connection, video_id: VideoId) -> Result<Option<MergedMetadata>> {
    let result = conn.query_row(
        "SELECT title, original_title, release_date, runtime, overview, language, rating,
                genres, actors, external_ids, sources
         FROM merged_metadata WHERE video_id = :video_id",
        rusqlite::named_params! { ":video_id": video_id.to_string() },
        |row| {
            let genres: String = row.get(7)?;
            let actors: String = row.get(8)?;
            let external_ids: String = row.get(9)?;
            let sources: String = row.get(10)?;
            Ok(MergedMetadata {
                title: row.get(0)?,
                original_title: row.get(1)?,
                release_date: row.get(2)?,
                runtime: row.get(3)?,
                overview: row.get(4)?,
                language: row.get(5)?,
                rating: row.get(6)?,
                genres: parse_json(7, &genres)?,
                actors: parse_json(8, &actors)?,
                external_ids: parse_json(9, &external_ids)?,
                sources: parse_json(10, &sources)?,
            })
        },
    );

    match result {
        Ok(merged) => Ok(Some(merged)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Insert raw provider payloads for a video.
pub fn insert_payloads(
    conn: &Connection,
    video_id: VideoId,
    records: &[MetadataRecord],
) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO provider_payloads (video_id, provider, payload, fetched_at)
             VALUES (:video_id, :provider, :payload, :fetched_at)",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    for record in records {
        stmt.execute(rusqlite::named_params! {
            ":video_id": video_id.to_string(),
            ":provider": record.provider,
            ":payload": to_json(&record.payload)?,
            ":fetched_at": record.fetched_at.to_rfc3339(),
        })
        .map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}

/// List raw provider payloads of a video in insertion order.
pub fn list_payloads(conn: &Connection, video_id: VideoId) -> Result<Vec<MetadataRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT provider, payload, fetched_at FROM provider_payloads
             WHERE video_id = :video_id ORDER BY id",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let records = stmt
        .query_map(
            rusqlite::named_params! { ":video_id": video_id.to_string() },
            |row| {
                let payload: String = row.get(1)?;
                let fetched_at: String = row.get(2)?;
                Ok(MetadataRecord {
                    provider: row.get(0)?,
                    payload: parse_json(1, &payload)?,
                    fetched_at: parse_timestamp(2, &fetched_at)?,
                })
            },
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(records)
}
