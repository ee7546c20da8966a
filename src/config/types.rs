use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Provider names accepted in `metadata.precedence`.
pub const KNOWN_METADATA_SOURCES: &[&str] = &["tmdb", "omdb", "generative"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub subtitles: SubtitlesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("scenescribe.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Extracted and downloaded subtitles are written here.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Explicit tool locations. `None` means look the program up on `PATH`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default)]
    pub ccextractor_path: Option<PathBuf>,

    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OcrConfig {
    /// Run OCR on burned-in subtitles when cheaper stages find nothing.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between sampled frames.
    #[serde(default = "default_ocr_interval")]
    pub interval_secs: f64,

    /// Fraction of the frame height, measured from the bottom, that is
    /// searched for text.
    #[serde(default = "default_region_fraction")]
    pub region_fraction: f32,

    /// Grayscale threshold used to binarize the region.
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Tesseract language pack.
    #[serde(default = "default_ocr_language")]
    pub language: String,

    /// Recognized lines shorter than this are dropped as noise.
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
}

fn default_ocr_interval() -> f64 {
    1.0
}
fn default_region_fraction() -> f32 {
    0.25
}
fn default_threshold() -> u8 {
    150
}
fn default_ocr_language() -> String {
    "eng".to_string()
}
fn default_min_text_len() -> usize {
    4
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_ocr_interval(),
            region_fraction: default_region_fraction(),
            threshold: default_threshold(),
            language: default_ocr_language(),
            min_text_len: default_min_text_len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Videos processed concurrently by a batch.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// OpenAI-compatible chat endpoint shared by the title recognizer and the
/// generative metadata source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Overridden by `LLM_API_KEY` or `DEEPSEEK_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_base_url() -> String {
    "https://api.deepseek.com".to_string()
}
fn default_llm_model() -> String {
    "deepseek-chat".to_string()
}
fn default_temperature() -> f32 {
    0.2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// Merge precedence, highest first. Sources not listed rank after these
    /// in registration order.
    #[serde(default = "default_precedence")]
    pub precedence: Vec<String>,

    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub omdb: OmdbConfig,

    #[serde(default)]
    pub generative: GenerativeConfig,
}

fn default_precedence() -> Vec<String> {
    KNOWN_METADATA_SOURCES.iter().map(|s| s.to_string()).collect()
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            precedence: default_precedence(),
            tmdb: TmdbConfig::default(),
            omdb: OmdbConfig::default(),
            generative: GenerativeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// Overridden by `TMDB_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_tmdb_language")]
    pub language: String,

    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}
fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language: default_tmdb_language(),
            base_url: default_tmdb_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OmdbConfig {
    /// Overridden by `OMDB_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_omdb_base_url")]
    pub base_url: String,
}

fn default_omdb_base_url() -> String {
    "https://www.omdbapi.com".to_string()
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_omdb_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerativeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model override; the `llm` model is used when unset.
    #[serde(default)]
    pub model: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubtitlesConfig {
    #[serde(default)]
    pub remote: RemoteSubtitlesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteSubtitlesConfig {
    /// OpenSubtitles REST key. Overridden by `OPENSUBTITLES_API_KEY`; the
    /// remote stage is skipped without one.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_opensubtitles_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_opensubtitles_url() -> String {
    "https://api.opensubtitles.com/api/v1".to_string()
}
fn default_user_agent() -> String {
    format!("scenescribe v{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RemoteSubtitlesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_opensubtitles_url(),
            user_agent: default_user_agent(),
        }
    }
}
