use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scenescribe")]
#[command(author, version, about = "Subtitle harvesting and metadata resolution for video files")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a single video file
    Process {
        /// Video file to process
        #[arg(required = true)]
        path: PathBuf,

        /// Discard any stored result and process again
        #[arg(long)]
        force: bool,

        /// Enable OCR of burned-in subtitles
        #[arg(long)]
        ocr: bool,

        /// Directory for extracted subtitles (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process video files and directories concurrently
    Batch {
        /// Video files or directories to scan recursively
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Discard any stored results and process again
        #[arg(long)]
        force: bool,

        /// Enable OCR of burned-in subtitles
        #[arg(long)]
        ocr: bool,

        /// Maximum number of videos processed at once (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Directory for extracted subtitles (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recognize canonical titles for file names without processing
    Recognize {
        /// File names or loose titles
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List processed videos
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the stored result for a video
    Delete {
        /// Video file path as it was processed
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
