//! search-telemetry CLI - inspect and feed the local telemetry store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use search_telemetry::{store::FileStore, SourceCategory, Telemetry, TelemetryConfig};

/// search-telemetry - local provider performance telemetry
#[derive(Parser)]
#[command(name = "search-telemetry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the persisted snapshot
    #[arg(long, global = true, default_value = ".search-telemetry")]
    data_dir: PathBuf,

    /// JSON file with telemetry settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the performance report
    Report {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List reliable providers, best first
    Rank {
        /// Content category (general, web, images, news, videos)
        #[arg(short, long, default_value = "general")]
        category: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Clear all counters and start a new measurement window
    Reset,

    /// Record a completed search
    RecordSearch {
        /// Search query (only its digest is stored)
        query: String,

        /// Providers that served the search (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        sources: Vec<String>,

        /// Response time in milliseconds
        #[arg(short = 't', long)]
        response_time: f64,

        /// Number of results returned
        #[arg(short, long, default_value = "0")]
        results: usize,
    },

    /// Record a provider API call
    RecordApi {
        /// Provider identifier
        source: String,

        /// Mark the call as failed
        #[arg(long)]
        failed: bool,

        /// Response time in milliseconds
        #[arg(short = 't', long)]
        response_time: Option<f64>,
    },

    /// Record a provider error
    RecordError {
        /// Provider identifier
        source: String,

        /// Error type (e.g. timeout, rate_limit)
        error_type: String,
    },

    /// Record a cache lookup
    RecordCache {
        /// Cache identifier
        cache_type: String,

        /// Mark the lookup as a miss
        #[arg(long)]
        miss: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let config = load_config(cli.config.as_deref())?;
    let telemetry = Telemetry::with_config(FileStore::new(&cli.data_dir), config);
    // An unreadable snapshot is logged and replaced by fresh counters
    telemetry.initialize().await;

    match cli.command {
        Commands::Report { format } => show_report(&telemetry, format),
        Commands::Rank { category, format } => show_ranking(&telemetry, &category, format),
        Commands::Reset => {
            telemetry
                .try_reset()
                .await
                .context("Failed to reset telemetry")?;
            println!("Telemetry reset");
            Ok(())
        }
        Commands::RecordSearch {
            query,
            sources,
            response_time,
            results,
        } => {
            let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
            telemetry.record_search(&query, &sources, response_time, results);
            persist(&telemetry).await
        }
        Commands::RecordApi {
            source,
            failed,
            response_time,
        } => {
            telemetry.record_api_call(&source, !failed, response_time);
            persist(&telemetry).await
        }
        Commands::RecordError { source, error_type } => {
            telemetry.record_error(&source, &error_type);
            persist(&telemetry).await
        }
        Commands::RecordCache { cache_type, miss } => {
            telemetry.record_cache_hit(&cache_type, !miss);
            persist(&telemetry).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<TelemetryConfig> {
    let Some(path) = path else {
        return Ok(TelemetryConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: TelemetryConfig = serde_json::from_str(&text)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

async fn persist(telemetry: &Telemetry) -> Result<()> {
    telemetry
        .try_save()
        .await
        .context("Failed to save telemetry")
}

fn show_report(telemetry: &Telemetry, format: OutputFormat) -> Result<()> {
    let report = telemetry.performance_report();
    match format {
        OutputFormat::Text => print!("{}", report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn show_ranking(telemetry: &Telemetry, category: &str, format: OutputFormat) -> Result<()> {
    let category: SourceCategory = category.parse()?;
    let ranked = telemetry.optimal_sources(category);

    match format {
        OutputFormat::Text => {
            if ranked.is_empty() {
                println!("No provider above the reliability threshold");
            }
            for (i, source) in ranked.iter().enumerate() {
                let latency = if source.avg_response_time.is_finite() {
                    format!("{:.0}ms", source.avg_response_time)
                } else {
                    "n/a".to_string()
                };
                println!(
                    "{}. {:<16} {:>6.1}%  {}",
                    i + 1,
                    source.source,
                    source.success_rate * 100.0,
                    latency
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ranked)?),
    }
    Ok(())
}
