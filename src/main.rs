//! Sumi-Scribe main entry point
//!
//! This is the command-line interface for the Sumi-Scribe page archiver.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use sumi_scribe::config::{load_config_with_hash, load_seeds, Config};
use sumi_scribe::crawler::{crawl, StopReason};
use sumi_scribe::output::{generate_markdown_summary, load_records, print_statistics, StoreStatistics};
use sumi_scribe::url::{LinkFilter, LocationId};
use tracing_subscriber::EnvFilter;

/// Sumi-Scribe: a resumable link-following page archiver
///
/// Sumi-Scribe fetches pages starting from a seed list, stores a structured
/// record for each one and follows in-scope links until none are left. An
/// interrupted crawl resumes from the record store without refetching pages.
#[derive(Parser, Debug)]
#[command(name = "sumi-scribe")]
#[command(version = "1.0.0")]
#[command(about = "A resumable link-following page archiver", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Move the existing record store aside and start from the seeds
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export_summary"])]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics from the record store and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary from existing records and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.export_summary {
        handle_export_summary(&config)
    } else {
        handle_crawl(config, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scribe=info,warn"),
            1 => EnvFilter::new("sumi_scribe=debug,info"),
            2 => EnvFilter::new("sumi_scribe=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let seeds = load_seeds(&config.seeds).context("Failed to load seeds")?;
    let filter = LinkFilter::from_config(&config.scope);

    println!("=== Sumi-Scribe Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Minimum request interval: {}ms",
        config.crawler.min_request_interval
    );
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout);
    println!(
        "  Follow revision history: {}",
        config.crawler.follow_revision_history
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!(
        "  Records: {} ({:?})",
        config.output.records_path, config.output.store_format
    );
    println!("  Summary: {}", config.output.summary_path);

    println!("\nScope ({} rules):", filter.rule_count());
    println!("  Article prefix: {}", config.scope.article_prefix);
    println!(
        "  Excluded namespaces: {}",
        config.scope.excluded_namespaces.join(", ")
    );
    if config.scope.domains.is_empty() {
        println!("  Domains: any");
    } else {
        println!("  Domains: {}", config.scope.domains.join(", "));
    }

    println!("\nSeeds ({}):", seeds.len());
    let mut valid = 0;
    for seed in &seeds {
        match LocationId::parse(seed) {
            Ok(location) => {
                valid += 1;
                if filter.in_scope(&location) {
                    println!("  * {}", location);
                } else {
                    println!("  * {} (outside scope, links from it are still followed)", location);
                }
            }
            Err(e) => println!("  ! {} (skipped: {})", seed, e),
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed locations", valid);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the record store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Record store: {}\n", config.output.records_path);

    let records = load_records(&config.output).context("Failed to read record store")?;
    print_statistics(&StoreStatistics::from_records(&records));

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Record Summary ===\n");
    println!("Record store: {}", config.output.records_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let records = load_records(&config.output).context("Failed to read record store")?;

    tracing::info!("Generating markdown summary for {} records...", records.len());
    generate_markdown_summary(&records, Path::new(&config.output.summary_path))
        .with_context(|| format!("Failed to write {}", config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (previous records are moved aside)");
    } else {
        tracing::info!("Starting crawl (resuming from {})", config.output.records_path);
    }

    let report = crawl(config, fresh).await.context("Crawl failed")?;

    match report.stop_reason {
        Some(StopReason::StopRequested) => {
            tracing::info!("Crawl stopped on request; run again to resume")
        }
        _ => tracing::info!("Crawl completed: nothing left to visit"),
    }
    tracing::info!(
        "{} records stored this run ({} already stored before)",
        report.records_stored,
        report.resumed_records
    );

    Ok(())
}
