//! Lead-Harvest main entry point
//!
//! This is the command-line interface for the Lead-Harvest row enricher.

use anyhow::{Context, Result};
use clap::Parser;
use lead_harvest::config::{load_config_with_hash, Config, CrawlMode};
use lead_harvest::crawler::{build_http_client, CrawlSettings, SiteCrawler};
use lead_harvest::output::{generate_markdown_summary, print_statistics, CsvSink};
use lead_harvest::pipeline::{read_rows_from_path, run_pipeline, InputTable, RowEnricher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Lead-Harvest: contact emails and team pages for business listings
///
/// Lead-Harvest reads a CSV of businesses, crawls each business's website
/// within a small page budget, and writes every row back out with the emails
/// (and optionally team pages) it found.
#[derive(Parser, Debug)]
#[command(name = "lead-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Bounded contact crawling for lead enrichment", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Input CSV file
    #[arg(short, long, value_name = "CSV")]
    input: PathBuf,

    /// Output CSV file
    #[arg(short, long, value_name = "CSV", required_unless_present = "dry_run")]
    output: Option<PathBuf>,

    /// Override the crawl mode from the config file
    #[arg(long, value_enum)]
    mode: Option<CrawlMode>,

    /// Override the number of websites crawled in parallel
    #[arg(long)]
    concurrency: Option<usize>,

    /// Validate config and input, show what would be crawled, and exit
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(mode) = cli.mode {
        config.enrichment.mode = mode;
    }
    if let Some(concurrency) = cli.concurrency {
        anyhow::ensure!(
            (1..=256).contains(&concurrency),
            "--concurrency must be between 1 and 256, got {}",
            concurrency
        );
        config.crawler.concurrency = concurrency;
    }

    let table = read_rows_from_path(&cli.input)
        .with_context(|| format!("Failed to read input {}", cli.input.display()))?;

    match cli.output {
        Some(output) if !cli.dry_run => handle_run(config, config_hash, table, &output).await,
        _ => {
            handle_dry_run(&config, &table);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lead_harvest=info,warn"),
            1 => EnvFilter::new("lead_harvest=debug,info"),
            2 => EnvFilter::new("lead_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and input, shows the plan
fn handle_dry_run(config: &Config, table: &InputTable) {
    println!("=== Lead-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Mode: {}", config.enrichment.mode.as_str());
    println!("  Max pages per site: {}", config.crawler.max_pages);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max page size: {} bytes", config.crawler.max_page_bytes);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nInput:");
    println!("  Columns: {}", table.headers.join(", "));
    println!("  Rows: {}", table.rows.len());

    let with_website = table
        .rows
        .iter()
        .filter(|row| row.get(&config.input.website_column).is_some())
        .count();
    println!(
        "  Rows with a '{}' value: {}",
        config.input.website_column, with_website
    );
    if !table.headers.contains(&config.input.website_column) {
        println!(
            "  ! Column '{}' not found in input",
            config.input.website_column
        );
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} websites", with_website);
}

/// Handles the main enrichment run
async fn handle_run(
    config: Config,
    config_hash: String,
    table: InputTable,
    output: &Path,
) -> Result<()> {
    let started_at = chrono::Utc::now();

    let client = build_http_client(&config.user_agent, &config.crawler)
        .context("Failed to build HTTP client")?;
    let crawler = SiteCrawler::new(client, CrawlSettings::from_config(&config.crawler));
    let enricher = Arc::new(RowEnricher::new(
        crawler,
        config.input.clone(),
        config.enrichment.clone(),
    ));

    let sink = CsvSink::create(
        output,
        &table.headers,
        config.output.clone(),
        config.enrichment.select_best_email,
        config.enrichment.mode == CrawlMode::TeamPages,
    )
    .with_context(|| format!("Failed to create output {}", output.display()))?;

    tracing::info!(
        "Mode: {}, rows: {}, output: {}",
        config.enrichment.mode.as_str(),
        table.rows.len(),
        output.display()
    );

    let mut summary = run_pipeline(table.rows, enricher, config.crawler.concurrency, sink)
        .await
        .context("Enrichment run failed")?;

    summary.started_at = started_at.to_rfc3339();
    summary.finished_at = Some(chrono::Utc::now().to_rfc3339());
    summary.config_hash = config_hash;
    summary.mode = Some(config.enrichment.mode);

    if let Some(path) = &config.output.summary_path {
        generate_markdown_summary(&summary, Path::new(path))
            .with_context(|| format!("Failed to write summary {}", path))?;
        tracing::info!("Summary written to {}", path);
    }

    print_statistics(&summary);

    Ok(())
}
