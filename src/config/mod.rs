mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file, apply environment overrides, and
/// validate it.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./scenescribe.toml",
        "./config.toml",
        "~/.config/scenescribe/config.toml",
        "/etc/scenescribe/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Fill unset API keys from the process environment.
pub fn apply_env_overrides(config: &mut Config) {
    apply_env_overrides_from(config, |key| std::env::var(key).ok());
}

/// Fill unset API keys using `lookup`. Values already present in the file win;
/// blank variables are ignored.
pub fn apply_env_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |keys: &[&str]| {
        keys.iter()
            .filter_map(|k| lookup(k))
            .find(|v| !v.trim().is_empty())
    };

    fill(&mut config.metadata.tmdb.api_key, get(&["TMDB_API_KEY"]));
    fill(&mut config.metadata.omdb.api_key, get(&["OMDB_API_KEY"]));
    fill(
        &mut config.llm.api_key,
        get(&["LLM_API_KEY", "DEEPSEEK_API_KEY"]),
    );
    fill(
        &mut config.subtitles.remote.api_key,
        get(&["OPENSUBTITLES_API_KEY"]),
    );
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.as_deref().map_or(true, |s| s.trim().is_empty()) {
        if let Some(value) = value {
            *slot = Some(value);
        }
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.pipeline.workers == 0 {
        anyhow::bail!("pipeline.workers must be at least 1");
    }

    if !(config.ocr.interval_secs > 0.0) {
        anyhow::bail!(
            "ocr.interval_secs must be positive, got {}",
            config.ocr.interval_secs
        );
    }

    if !(config.ocr.region_fraction > 0.0 && config.ocr.region_fraction <= 1.0) {
        anyhow::bail!(
            "ocr.region_fraction must be in (0, 1], got {}",
            config.ocr.region_fraction
        );
    }

    if config.ocr.language.trim().is_empty() {
        anyhow::bail!("ocr.language cannot be empty");
    }

    for name in &config.metadata.precedence {
        if !KNOWN_METADATA_SOURCES.contains(&name.as_str()) {
            anyhow::bail!(
                "Unknown metadata source '{}' in metadata.precedence (expected one of: {})",
                name,
                KNOWN_METADATA_SOURCES.join(", ")
            );
        }
    }

    for tool in [
        &config.tools.ffmpeg_path,
        &config.tools.ffprobe_path,
        &config.tools.ccextractor_path,
        &config.tools.tesseract_path,
    ]
    .into_iter()
    .flatten()
    {
        if !tool.exists() {
            tracing::warn!(path = %tool.display(), "Configured tool path does not exist");
        }
    }

    Ok(())
}
