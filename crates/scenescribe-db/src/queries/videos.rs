//! Video record database queries.
//!
//! Records are keyed by their file path; the path column is `UNIQUE`, so a
//! second insert for the same path fails instead of creating a duplicate.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Row};
use scenescribe_common::{Error, Result, VideoId};

use super::{conversion_error, parse_timestamp};
use crate::models::VideoRecord;

const VIDEO_COLUMNS: &str = "id, file_path, original_name, canonical_title, working_title, \
                             status, error, created_at, updated_at";

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn row_to_video(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
    let id: String = row.get(0)?;
    let file_path: String = row.get(1)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(VideoRecord {
        id: id.parse::<VideoId>().map_err(|e| conversion_error(0, e))?,
        file_path: PathBuf::from(file_path),
        original_name: row.get(2)?,
        canonical_title: row.get(3)?,
        working_title: row.get(4)?,
        status: status.parse().map_err(|e: String| conversion_error(5, e))?,
        error: row.get(6)?,
        created_at: parse_timestamp(7, &created_at)?,
        updated_at: parse_timestamp(8, &updated_at)?,
    })
}

/// Insert a new video record.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `record` - The record to store
///
/// # Returns
///
/// * `Ok(())` - The record was inserted
/// * `Err(Error)` - If a record for the same path exists or a database error occurs
pub fn insert_video(conn: &Connection, record: &VideoRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO videos (id, file_path, original_name, canonical_title, working_title,
                             status, error, created_at, updated_at)
         VALUES (:id, :file_path, :original_name, :canonical_title, :working_title,
                 :status, :error, :created_at, :updated_at)",
        rusqlite::named_params! {
            ":id": record.id.to_string(),
            ":file_path": path_key(&record.file_path),
            ":original_name": record.original_name,
            ":canonical_title": record.canonical_title,
            ":working_title": record.working_title,
            ":status": record.status.to_string(),
            ":error": record.error,
            ":created_at": record.created_at.to_rfc3339(),
            ":updated_at": record.updated_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Get a video record by file path.
///
/// # Returns
///
/// * `Ok(Some(VideoRecord))` - The record if found
/// * `Ok(None)` - If no record exists for the path
/// * `Err(Error)` - If a database error occurs
pub fn get_video_by_path(conn: &Connection, path: &Path) -> Result<Option<VideoRecord>> {
    let result = conn.query_row(
        &format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE file_path = :file_path"),
        rusqlite::named_params! { ":file_path": path_key(path) },
        row_to_video,
    );

    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Check whether a record exists for `path`.
pub fn video_exists(conn: &Connection, path: &Path) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM videos WHERE file_path = :file_path)",
        rusqlite::named_params! { ":file_path": path_key(path) },
        |row| row.get::<_, bool>(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete the record for `path` together with its subtitles and payloads.
///
/// # Returns
///
/// * `Ok(true)` - A record was deleted
/// * `Ok(false)` - No record existed for the path
/// * `Err(Error)` - If a database error occurs
pub fn delete_video_by_path(conn: &Connection, path: &Path) -> Result<bool> {
    let rows = conn
        .execute(
            "DELETE FROM videos WHERE file_path = :file_path",
            rusqlite::named_params! { ":file_path": path_key(path) },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows > 0)
}

/// List all video records ordered by file path.
pub fn list_videos(conn: &Connection) -> Result<Vec<VideoRecord>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {VIDEO_COLUMNS} FROM videos ORDER BY file_path"))
        .map_err(|e| Error::database(e.to_string()))?;

    let videos = stmt
        .query_map([], row_to_video)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(videos)
}
