//! Site-Harvester main entry point
//!
//! This is the command-line interface for the Site-Harvester crawler.

use anyhow::Context;
use clap::Parser;
use site_harvester::config::{load_config_with_hash, Config};
use site_harvester::crawler::Coordinator;
use site_harvester::documents::load_documents;
use site_harvester::output::print_report;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Site-Harvester: a bounded site crawler and content harvester
///
/// Site-Harvester walks a site depth-first from a base URL, saves the text
/// and metadata of every admissible page to a CSV table, and downloads the
/// PDF documents those pages link to.
#[derive(Parser, Debug)]
#[command(name = "site-harvester")]
#[command(version)]
#[command(about = "A bounded site crawler and content harvester", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "inspect")]
    dry_run: bool,

    /// Load the existing page table and show what downstream indexing would see
    #[arg(long, conflicts_with = "dry_run")]
    inspect: bool,

    /// Override the maximum traversal depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Override the base URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.inspect {
        handle_inspect(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvester=info,warn"),
            1 => EnvFilter::new("site_harvester=debug,info"),
            2 => EnvFilter::new("site_harvester=trace,debug"),
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

/// Applies command-line overrides and re-validates
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(depth) = cli.max_depth {
        tracing::info!("Overriding max depth: {}", depth);
        config.crawler.max_depth = depth;
    }
    if let Some(base_url) = &cli.base_url {
        tracing::info!("Overriding base URL: {}", base_url);
        config.crawler.base_url = base_url.clone();
    }

    site_harvester::config::validate(config).context("Invalid configuration after overrides")?;
    Ok(())
}

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Site-Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Max depth: {}", config.crawler.max_depth);
    if config.crawler.max_pages > 0 {
        println!("  Max pages: {}", config.crawler.max_pages);
    } else {
        println!("  Max pages: unlimited");
    }
    println!("  Concurrency: {}", config.crawler.concurrency);
    if config.crawler.crawl_timeout_secs > 0 {
        println!("  Crawl timeout: {}s", config.crawler.crawl_timeout_secs);
    }
    println!("  Fingerprint: {:?}", config.crawler.fingerprint);

    println!("\nFetching:");
    println!("  Attempts per URL: {}", config.fetch.retries);
    println!("  Delay between attempts: {}ms", config.fetch.delay_ms);
    println!(
        "  Timeouts: {}s (pages), {}s (documents)",
        config.fetch.text_timeout_secs, config.fetch.binary_timeout_secs
    );
    println!("  User agent: {}", config.fetch.user_agent);

    println!("\nAdmission:");
    println!("  Required prefix: {}", config.admission.required_prefix);
    println!("  Domain marker: {}", config.admission.domain_marker);
    println!(
        "  Excluded substrings: {}",
        config.admission.excluded_substrings.join(", ")
    );
    println!(
        "  Excluded extensions: {}",
        config.admission.excluded_extensions.join(", ")
    );
    println!(
        "  PDF suffix: {}{}",
        config.admission.pdf_suffix,
        if config.admission.pdf_case_insensitive {
            " (any case)"
        } else {
            ""
        }
    );

    println!("\nOutput:");
    println!("  Table: {}", config.output.table_path);
    println!("  Download folder: {}", config.output.download_folder);
    println!("  Asset naming: {:?}", config.output.asset_naming);

    println!("\n✓ Configuration is valid");
}

/// Handles the --inspect mode: loads the table as downstream documents
fn handle_inspect(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.output.table_path);
    println!("Table: {}\n", path.display());

    let documents = load_documents(path)
        .with_context(|| format!("Failed to load documents from {}", path.display()))?;

    let mut by_field: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total_chars = 0usize;
    for doc in &documents {
        let field = doc.metadata.get("field").map(String::as_str).unwrap_or("");
        *by_field.entry(field).or_default() += 1;
        total_chars += doc.content.chars().count();
    }

    println!("Documents: {}", documents.len());
    if !documents.is_empty() {
        println!(
            "Average length: {} characters",
            total_chars / documents.len()
        );
    }
    println!("\nBy field:");
    for (field, count) in by_field {
        println!("  {}: {}", field, count);
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // Ctrl-C stops the crawl; collected records are still written
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            interrupt.cancel();
        }
    });

    tracing::info!(
        "Crawling {} to depth {}",
        config.crawler.base_url,
        config.crawler.max_depth
    );

    let coordinator = Coordinator::new(config)?.with_cancellation(cancel);

    match coordinator.run().await {
        Ok(report) => {
            tracing::info!("Crawl completed");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
