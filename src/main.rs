use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use confnorm::config::{AppConfig, DEFAULT_CONFIG_PATH};
use confnorm::infra::LocalFileReader;
use confnorm::logging;
use confnorm::{DecoderRegistry, FilePipeline};

#[derive(Parser)]
#[command(name = "confnorm")]
#[command(about = "Normalize configuration files of mixed formats into one data model")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a batch of files concurrently
    Process {
        /// Files to process, relative to the base directory
        #[arg(required_unless_present = "pattern")]
        files: Vec<String>,
        /// Directory that file names are resolved against
        #[arg(long)]
        base_dir: Option<PathBuf>,
        /// Number of concurrent workers
        #[arg(long)]
        workers: Option<usize>,
        /// Also process every file matching this glob under the base directory
        #[arg(long)]
        pattern: Option<String>,
    },
    /// List supported formats and their extensions
    Formats,
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => AppConfig::load_or_default(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupt received, finishing in-flight files");
            token.cancel();
        }
    });
    cancel
}

async fn run_process(
    config: AppConfig,
    mut files: Vec<String>,
    base_dir: Option<PathBuf>,
    workers: Option<usize>,
    pattern: Option<String>,
) -> Result<ExitCode> {
    let base_dir = base_dir.unwrap_or(config.reader.base_dir);
    let reader = LocalFileReader::new(&base_dir);

    if let Some(pattern) = pattern {
        let matched = reader
            .list_files(&pattern)
            .with_context(|| format!("Failed to expand pattern '{}'", pattern))?;
        info!("Pattern '{}' matched {} files", pattern, matched.len());
        files.extend(matched);
    }
    if files.is_empty() {
        println!("No files to process");
        return Ok(ExitCode::SUCCESS);
    }

    let mut pipeline_config = config.pipeline.to_pipeline_config();
    if let Some(workers) = workers {
        pipeline_config.max_workers = workers;
    }

    let registry = DecoderRegistry::try_with_builtin_decoders()?;
    let mut pipeline = FilePipeline::with_registry(registry, pipeline_config);
    pipeline.register_reader(Arc::new(reader));

    let cancel = cancel_on_ctrl_c();
    let report = pipeline
        .process_files(&cancel, &files)
        .await
        .context("Failed to start batch")?;

    for record in &report.records {
        println!(
            "✅ {} [{}] {} keys{}",
            record.filename,
            record.format,
            record.metadata.key_count,
            if record.metadata.has_nested { ", nested" } else { "" }
        );
    }
    if let Some(error) = &report.error {
        for failure in &error.failures {
            println!("❌ {}", failure);
        }
        if error.is_cancelled() {
            println!("🛑 cancelled in {} workers", error.cancelled_workers);
        }
        if error.failed_workers > 0 {
            println!("❌ {} workers exited without reporting", error.failed_workers);
        }
    }

    let summary = report.summary();
    println!("\n📊 Summary:");
    println!("   Total files: {}", summary.total_files);
    println!("   Processed: {}", summary.processed);
    println!("   Failed: {}", summary.failed);
    for (format, count) in &summary.by_format {
        println!("   {}: {}", format, count);
    }
    println!("   Duration: {:?}", report.duration);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_formats() {
    let registry = DecoderRegistry::with_builtin_decoders();
    for decoder in registry.list_decoders() {
        println!("{:<12} {}", decoder.format(), decoder.supported_extensions().join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    let _log_guard = logging::init_logging(&config.logging);
    confnorm::metrics::init_metrics();

    match cli.command {
        Commands::Process {
            files,
            base_dir,
            workers,
            pattern,
        } => run_process(config, files, base_dir, workers, pattern).await,
        Commands::Formats => {
            print_formats();
            Ok(ExitCode::SUCCESS)
        }
    }
}
