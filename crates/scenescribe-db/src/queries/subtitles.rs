//! Subtitle artifact queries.

use std::path::PathBuf;

use rusqlite::Connection;
use scenescribe_common::{Error, Result, VideoId};

use super::conversion_error;
use crate::models::SubtitleArtifact;

/// Insert the artifacts of a video, preserving their order.
///
/// The `(video_id, language)` pair is unique, so two artifacts with the same
/// language for one video are rejected.
pub fn insert_subtitles(
    conn: &Connection,
    video_id: VideoId,
    artifacts: &[SubtitleArtifact],
) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO subtitles (video_id, position, language, source, path, format, content_ref)
             VALUES (:video_id, :position, :language, :source, :path, :format, :content_ref)",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    for (position, artifact) in artifacts.iter().enumerate() {
        stmt.execute(rusqlite::named_params! {
            ":video_id": video_id.to_string(),
            ":position": position as i64,
            ":language": artifact.language,
            ":source": artifact.source.to_string(),
            ":path": artifact.path.to_string_lossy(),
            ":format": artifact.format,
            ":content_ref": artifact.content_ref,
        })
        .map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}

/// List the artifacts of a video in the order they were stored.
pub fn list_subtitles(conn: &Connection, video_id: VideoId) -> Result<Vec<SubtitleArtifact>> {
    let mut stmt = conn
        .prepare(
            "SELECT language, source, path, format, content_ref
             FROM subtitles WHERE video_id = :video_id ORDER BY position",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let artifacts = stmt
        .query_map(
            rusqlite::named_params! { ":video_id": video_id.to_string() },
            |row| {
                let source: String = row.get(1)?;
                let path: String = row.get(2)?;
                Ok(SubtitleArtifact {
                    language: row.get(0)?,
                    source: source.parse().map_err(|e: String| conversion_error(1, e))?,
                    path: PathBuf::from(path),
                    format: row.get(3)?,
                    content_ref: row.get(4)?,
                })
            },
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(artifacts)
}
