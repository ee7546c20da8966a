mod cli;

use scenescribe::{
    config,
    pipeline::{self, builder, ProcessingResult},
    ProcessedVideo,
};
use scenescribe_common::paths::is_video_file;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "scenescribe=trace,scenescribe_av=trace,scenescribe_db=debug,scenescribe_common=debug"
                .to_string()
        } else {
            "scenescribe=info,scenescribe_av=info,scenescribe_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process {
            path,
            force,
            ocr,
            output_dir,
            json,
        } => runtime()?.block_on(process_file(
            config_path,
            &path,
            force,
            ocr,
            output_dir.as_deref(),
            json,
        )),
        Commands::Batch {
            paths,
            force,
            ocr,
            workers,
            output_dir,
            json,
        } => runtime()?.block_on(process_batch(
            config_path,
            &paths,
            BatchFlags {
                force,
                ocr,
                workers,
                output_dir,
                json,
            },
        )),
        Commands::Recognize { names } => runtime()?.block_on(recognize(config_path, &names)),
        Commands::List { json } => runtime()?.block_on(list_videos(config_path, json)),
        Commands::Delete { path } => runtime()?.block_on(delete_video(config_path, &path)),
        Commands::CheckTools => check_tools(config_path),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("scenescribe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

async fn process_file(
    config_path: Option<&Path>,
    path: &Path,
    force: bool,
    ocr: bool,
    output_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let orchestrator = pipeline::build_orchestrator(&config)?;
    let options = builder::process_options(&config, force, ocr, output_dir);

    let result = orchestrator.process_one(path, &options).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    match result.error {
        Some(e) => anyhow::bail!("Processing failed: {}", e),
        None => Ok(()),
    }
}

struct BatchFlags {
    force: bool,
    ocr: bool,
    workers: Option<usize>,
    output_dir: Option<PathBuf>,
    json: bool,
}

async fn process_batch(config_path: Option<&Path>, inputs: &[PathBuf], flags: BatchFlags) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if let Some(workers) = flags.workers {
        config.pipeline.workers = workers;
    }

    let paths = collect_videos(inputs);
    if paths.is_empty() {
        println!("No video files found.");
        return Ok(());
    }

    let orchestrator = pipeline::build_orchestrator(&config)?;
    let options = builder::process_options(&config, flags.force, flags.ocr, flags.output_dir.as_deref());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing videos in progress");
            on_signal.cancel();
        }
    });

    let results = orchestrator.process_many(&paths, &options, &cancel).await;
    let failed = results.iter().filter(|r| !r.is_success()).count();

    if flags.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            print_result(result);
            println!();
        }
        println!(
            "Processed {} videos: {} succeeded, {} failed",
            results.len(),
            results.len() - failed,
            failed
        );
    }

    if failed > 0 {
        anyhow::bail!("{} of {} videos failed", failed, results.len());
    }
    Ok(())
}

/// Expand directories into the video files below them. Explicit file
/// arguments are kept as given so missing files are reported per item.
fn collect_videos(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unreadable directory entry");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file() && is_video_file(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    paths
}

fn print_result(result: &ProcessingResult) {
    let record = &result.record;
    println!("File: {}", record.file_path.display());
    println!("Status: {}", record.status);
    if let Some(ref error) = result.error {
        println!("Error: {}", error);
        return;
    }

    match record.canonical_title {
        Some(ref canonical) => println!("Title: {}", canonical),
        None => println!("Title: {} (from file name)", record.working_title),
    }

    println!("\nSubtitles: {}", result.subtitles.len());
    for subtitle in &result.subtitles {
        println!(
            "  [{}] {} ({}) - {}",
            subtitle.language,
            subtitle.source,
            subtitle.format,
            subtitle.path.display()
        );
    }

    let metadata = &result.metadata;
    if metadata.is_empty() {
        println!("\nMetadata: none");
        return;
    }
    println!("\nMetadata ({}):", metadata.sources.join(", "));
    if let Some(ref title) = metadata.title {
        println!("  Title: {}", title);
    }
    if let Some(ref date) = metadata.release_date {
        println!("  Released: {}", date);
    }
    if metadata.runtime > 0 {
        println!("  Runtime: {} min", metadata.runtime);
    }
    if let Some(rating) = metadata.rating {
        println!("  Rating: {:.1}", rating);
    }
    if !metadata.genres.is_empty() {
        println!("  Genres: {}", metadata.genres.join(", "));
    }
    if !metadata.actors.is_empty() {
        println!("  Cast: {}", metadata.actors.join(", "));
    }
    for (provider, id) in &metadata.external_ids {
        println!("  {} id: {}", provider, id);
    }
}

async fn recognize(config_path: Option<&Path>, names: &[String]) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let resolver = builder::build_resolver(&config);
    if !resolver.has_recognizer() {
        anyhow::bail!("No LLM API key configured; set llm.api_key or LLM_API_KEY");
    }

    let results = resolver.recognize_batch(names).await;
    let mut failed = 0;
    for (name, result) in names.iter().zip(results) {
        let cleaned = scenescribe::naming::clean_title(name);
        match result {
            Ok(Some(title)) => println!("{} -> {}", name, title),
            Ok(None) => println!("{} -> not recognized (using \"{}\")", name, cleaned),
            Err(e) => {
                failed += 1;
                eprintln!("{} -> {} (using \"{}\")", name, e, cleaned);
            }
        }
    }

    if failed == names.len() {
        anyhow::bail!("Title recognition failed for every name");
    }
    Ok(())
}

async fn list_videos(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let orchestrator = pipeline::build_orchestrator(&config)?;
    let videos = orchestrator.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&videos)?);
        return Ok(());
    }

    if videos.is_empty() {
        println!("No processed videos.");
        return Ok(());
    }

    for ProcessedVideo {
        record,
        subtitles,
        metadata,
        ..
    } in &videos
    {
        let languages: Vec<&str> = subtitles.iter().map(|s| s.language.as_str()).collect();
        println!(
            "{} [{}] {} | subtitles: {} | metadata: {}",
            record.file_path.display(),
            record.status,
            metadata.title.as_deref().unwrap_or(&record.working_title),
            if languages.is_empty() {
                "-".to_string()
            } else {
                languages.join(",")
            },
            if metadata.sources.is_empty() {
                "-".to_string()
            } else {
                metadata.sources.join(",")
            },
        );
    }
    Ok(())
}

async fn delete_video(config_path: Option<&Path>, path: &Path) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let orchestrator = pipeline::build_orchestrator(&config)?;

    if orchestrator.delete(path).await? {
        println!("Deleted: {}", path.display());
    } else {
        println!("No stored result for: {}", path.display());
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = builder::toolchain(&config.tools).check();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all subtitle stages.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    let keyed = |key: &Option<String>| if key.is_some() { "set" } else { "not set" };
    println!("  Database: {}", config.database.path.display());
    println!("  Output dir: {}", config.output.dir.display());
    println!("  Workers: {}", config.pipeline.workers);
    println!("  OCR enabled: {}", config.ocr.enabled);
    println!("  Metadata precedence: {}", config.metadata.precedence.join(", "));
    println!("  TMDB key: {}", keyed(&config.metadata.tmdb.api_key));
    println!("  OMDb key: {}", keyed(&config.metadata.omdb.api_key));
    println!("  LLM key: {}", keyed(&config.llm.api_key));
    println!("  OpenSubtitles key: {}", keyed(&config.subtitles.remote.api_key));

    Ok(())
}
