use rag_pipeline::cli::{load_documents, Cli, Commands, ConfigAction, Document};
use rag_pipeline::config::Config;
use rag_pipeline::error::{RagError, Result};
use rag_pipeline::RagPipeline;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Index { dir } => {
            cmd_index(cli.config, cli.profile, &dir)?;
        }
        Commands::Search { dir, query, top_k } => {
            cmd_search(cli.config, cli.profile, &dir, &query, top_k)?;
        }
        Commands::Ask {
            dir,
            question,
            top_k,
        } => {
            cmd_ask(cli.config, cli.profile, &dir, &question, top_k)?;
        }
        Commands::Summarize { dir, max_length } => {
            cmd_summarize(cli.config, cli.profile, &dir, max_length)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose {
        "rag_pipeline=debug"
    } else {
        "rag_pipeline=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_index(config_path: Option<PathBuf>, profile: Option<String>, dir: &Path) -> Result<()> {
    let config = load_config(config_path, profile)?;
    let documents = load_documents(dir)?;

    if documents.is_empty() {
        println!(
            "No valid documents found in '{}'. Please add some .txt files.",
            dir.display()
        );
        return Ok(());
    }

    println!("Loaded {} document(s) for indexing.", documents.len());

    let (pipeline, report) = build_index(&config, &documents)?;

    println!("✓ Indexing completed successfully");
    println!("  Passages indexed: {}", report.passages);
    println!("  Documents skipped: {}", report.skipped_documents);
    if let Some(dimension) = pipeline.index().and_then(|index| index.dimension()) {
        println!("  Embedding dimension: {}", dimension);
    }
    println!("  Duration: {}ms", report.duration_ms);

    Ok(())
}

fn cmd_search(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    dir: &Path,
    query: &str,
    top_k: Option<usize>,
) -> Result<()> {
    let config = load_config(config_path, profile)?;
    let documents = require_documents(dir)?;
    let (pipeline, _) = build_index(&config, &documents)?;

    let results = pipeline.retrieve(query, top_k.unwrap_or(config.retrieval.top_k))?;
    for (rank, result) in results.iter().enumerate() {
        println!("{}. [{:.3}] {}", rank + 1, result.score, result.passage);
    }

    Ok(())
}

fn cmd_ask(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    dir: &Path,
    question: &str,
    top_k: Option<usize>,
) -> Result<()> {
    let config = load_config(config_path, profile)?;
    let documents = require_documents(dir)?;
    let (pipeline, _) = build_index(&config, &documents)?;

    let answer = pipeline.query(question, top_k.unwrap_or(config.retrieval.top_k))?;
    println!("{}", answer);

    Ok(())
}

fn cmd_summarize(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    dir: &Path,
    max_length: Option<usize>,
) -> Result<()> {
    let config = load_config(config_path, profile)?;
    let documents = require_documents(dir)?;
    let pipeline = RagPipeline::from_config(&config)?;
    let max_length = max_length.unwrap_or(config.generation.summary_max_length);

    println!("Generating summaries:");
    let mut failed = 0;
    for document in &documents {
        match pipeline.summarize(&document.text, max_length) {
            Ok(summary) => {
                println!("\nFile: {}", document.name());
                println!("Summary: {}", summary);
            }
            Err(e) => {
                tracing::error!("Error summarizing {}: {}", document.name(), e);
                failed += 1;
            }
        }
    }

    summarize_outcome(failed, documents.len())
}

/// Keep going past individual failures, but still report them in the exit status
fn summarize_outcome(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        return Err(anyhow::anyhow!(
            "{} of {} documents could not be summarized",
            failed,
            total
        )
        .into());
    }
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, None)?;
            let text = toml::to_string_pretty(&config)?;
            println!("{}", text);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| RagError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'rag-pipeline config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        return Ok(config);
    }

    if let Some(profile) = profile {
        Config::load_with_profile(&path, &profile)
    } else {
        Config::load(&path)
    }
}

fn require_documents(dir: &Path) -> Result<Vec<Document>> {
    let documents = load_documents(dir)?;
    if documents.is_empty() {
        return Err(RagError::InvalidArgument(format!(
            "No valid documents found in '{}'",
            dir.display()
        )));
    }
    Ok(documents)
}

/// Build a pipeline from `config` and index `documents` with bounded concurrency
fn build_index(
    config: &Config,
    documents: &[Document],
) -> Result<(RagPipeline, rag_pipeline::IndexReport)> {
    let mut pipeline = RagPipeline::from_config(config)?;
    let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();

    let rt = tokio::runtime::Runtime::new().map_err(|e| RagError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;
    let report = rt.block_on(
        pipeline.index_documents_concurrent(&texts, config.embedding.max_concurrent),
    )?;

    Ok((pipeline, report))
}
