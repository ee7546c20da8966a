//! Config loading against the real process environment.

use scenescribe::config::{load_config, Config};
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

const KEYS: [&str; 5] = [
    "TMDB_API_KEY",
    "OMDB_API_KEY",
    "LLM_API_KEY",
    "DEEPSEEK_API_KEY",
    "OPENSUBTITLES_API_KEY",
];

fn clear_env() {
    for key in KEYS {
        std::env::remove_var(key);
    }
}

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scenescribe.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
#[serial]
fn test_env_keys_fill_empty_config() {
    clear_env();
    std::env::set_var("TMDB_API_KEY", "tmdb-from-env");
    std::env::set_var("DEEPSEEK_API_KEY", "llm-from-env");

    let (_dir, path) = write_config("[pipeline]\nworkers = 8\n");
    let config = load_config(&path).unwrap();
    clear_env();

    assert_eq!(config.pipeline.workers, 8);
    assert_eq!(config.metadata.tmdb.api_key.as_deref(), Some("tmdb-from-env"));
    assert_eq!(config.llm.api_key.as_deref(), Some("llm-from-env"));
    assert!(config.metadata.omdb.api_key.is_none());
}

#[test]
#[serial]
fn test_file_keys_win_over_env() {
    clear_env();
    std::env::set_var("OMDB_API_KEY", "omdb-from-env");
    std::env::set_var("LLM_API_KEY", "primary");
    std::env::set_var("DEEPSEEK_API_KEY", "fallback");

    let (_dir, path) = write_config(
        r#"
[metadata.omdb]
api_key = "omdb-from-file"
"#,
    );
    let config = load_config(&path).unwrap();
    clear_env();

    assert_eq!(config.metadata.omdb.api_key.as_deref(), Some("omdb-from-file"));
    assert_eq!(config.llm.api_key.as_deref(), Some("primary"));
}

#[test]
#[serial]
fn test_full_config_round_trips_through_toml() {
    clear_env();
    let mut config = Config::default();
    config.ocr.enabled = true;
    config.ocr.language = "fra".into();
    config.metadata.precedence = vec!["generative".into(), "tmdb".into()];
    config.subtitles.remote.api_key = Some("os-key".into());

    let (_dir, path) = write_config(&toml::to_string(&config).unwrap());
    let loaded = load_config(&path).unwrap();

    assert!(loaded.ocr.enabled);
    assert_eq!(loaded.ocr.language, "fra");
    assert_eq!(loaded.metadata.precedence, ["generative", "tmdb"]);
    assert_eq!(loaded.subtitles.remote.api_key.as_deref(), Some("os-key"));
    assert_eq!(loaded.database.path, config.database.path);
}

#[test]
#[serial]
fn test_invalid_values_rejected_on_load() {
    clear_env();
    let (_dir, path) = write_config("[ocr]\nregion_fraction = 0.0\n");

    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("region_fraction"));
}
