//! Storage of processed videos.
//!
//! [`PersistenceGateway`] is synchronous; the orchestrator calls it through
//! `spawn_blocking`. [`SqliteGateway`] is the production implementation on
//! top of `scenescribe-db`.

use std::path::Path;

use scenescribe_db::models::{MergedMetadata, MetadataRecord, SubtitleArtifact, VideoRecord};
use scenescribe_db::pool::{get_conn, DbPool};
use scenescribe_db::queries::{metadata, subtitles, videos};
use serde::Serialize;
use tracing::debug;

use crate::error::PipelineError;

/// Everything stored for one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedVideo {
    pub record: VideoRecord,
    pub subtitles: Vec<SubtitleArtifact>,
    pub metadata: MergedMetadata,
    /// Raw provider payloads the metadata was merged from.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raw: Vec<MetadataRecord>,
}

pub trait PersistenceGateway: Send + Sync {
    fn is_processed(&self, path: &Path) -> Result<bool, PipelineError>;

    fn load(&self, path: &Path) -> Result<Option<ProcessedVideo>, PipelineError>;

    /// Store `video`, replacing any record for the same path.
    fn save(&self, video: &ProcessedVideo) -> Result<(), PipelineError>;

    /// Returns `true` when a record was removed.
    fn delete(&self, path: &Path) -> Result<bool, PipelineError>;

    fn list(&self) -> Result<Vec<ProcessedVideo>, PipelineError>;
}

/// SQLite-backed gateway.
#[derive(Clone)]
pub struct SqliteGateway {
    pool: DbPool,
}

impl SqliteGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn assemble(
        conn: &rusqlite::Connection,
        record: VideoRecord,
    ) -> Result<ProcessedVideo, PipelineError> {
        let subtitles = subtitles::list_subtitles(conn, record.id)?;
        let metadata = metadata::get_merged(conn, record.id)?.unwrap_or_default();
        let raw = metadata::list_payloads(conn, record.id)?;
        Ok(ProcessedVideo {
            record,
            subtitles,
            metadata,
            raw,
        })
    }
}

fn db_error(err: rusqlite::Error) -> PipelineError {
    PipelineError::persistence(err)
}

impl PersistenceGateway for SqliteGateway {
    fn is_processed(&self, path: &Path) -> Result<bool, PipelineError> {
        let conn = get_conn(&self.pool)?;
        Ok(videos::video_exists(&conn, path)?)
    }

    fn load(&self, path: &Path) -> Result<Option<ProcessedVideo>, PipelineError> {
        let conn = get_conn(&self.pool)?;
        match videos::get_video_by_path(&conn, path)? {
            Some(record) => Self::assemble(&conn, record).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, video: &ProcessedVideo) -> Result<(), PipelineError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction().map_err(db_error)?;

        let id = video.record.id;
        videos::delete_video_by_path(&tx, &video.record.file_path)?;
        videos::insert_video(&tx, &video.record)?;
        subtitles::insert_subtitles(&tx, id, &video.subtitles)?;
        metadata::upsert_merged(&tx, id, &video.metadata)?;
        metadata::insert_payloads(&tx, id, &video.raw)?;

        tx.commit().map_err(db_error)?;
        debug!(
            path = %video.record.file_path.display(),
            subtitles = video.subtitles.len(),
            payloads = video.raw.len(),
            "Saved processed video"
        );
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<bool, PipelineError> {
        let conn = get_conn(&self.pool)?;
        Ok(videos::delete_video_by_path(&conn, path)?)
    }

    fn list(&self) -> Result<Vec<ProcessedVideo>, PipelineError> {
        let conn = get_conn(&self.pool)?;
        videos::list_videos(&conn)?
            .into_iter()
            .map(|record| Self::assemble(&conn, record))
            .collect()
    }
}
