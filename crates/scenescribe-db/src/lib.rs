//! Scenescribe-DB: Database schema, migrations, and query operations
//!
//! Stores one record per processed video together with its subtitle
//! artifacts, the merged metadata, and the raw payload each metadata
//! provider returned. SQLite via rusqlite with r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```
//! use scenescribe_db::models::VideoRecord;
//! use scenescribe_db::pool::{get_conn, init_memory_pool};
//! use scenescribe_db::queries::videos;
//! use std::path::Path;
//!
//! let pool = init_memory_pool().unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let record = VideoRecord::new(Path::new("/media/Heat.1995.mkv"));
//! videos::insert_video(&conn, &record).unwrap();
//! assert!(videos::video_exists(&conn, Path::new("/media/Heat.1995.mkv")).unwrap());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
