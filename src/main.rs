//! Site-Mapper main entry point
//!
//! This is the command-line interface for the Site-Mapper sitemap generator.

use anyhow::{bail, Context};
use clap::Parser;
use site_mapper::config::{load_config_with_hash, validate, Config};
use site_mapper::crawler::Crawler;
use site_mapper::output::{print_summary, OutputFormat, SitemapDocument};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Site-Mapper: a same-site sitemap generator
///
/// Site-Mapper crawls every page reachable from a seed URL on the same host,
/// breadth-first up to a maximum depth, and writes the pages it found as a
/// sitemaps.org XML document.
#[derive(Parser, Debug)]
#[command(name = "site-mapper")]
#[command(version)]
#[command(about = "A same-site sitemap generator", long_about = None)]
struct Cli {
    /// URL to start crawling from (overrides `crawler.seed-url`)
    #[arg(value_name = "SEED_URL")]
    seed_url: Option<String>,

    /// Deepest level to fetch; links found there are listed but not followed
    #[arg(short, long, value_name = "N")]
    depth: Option<u32>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write the sitemap [default: sitemap.xml]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Sitemap format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Maximum number of concurrent fetches
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    let Some(seed) = config.crawler.seed_url.clone() else {
        bail!("No seed URL given; pass SEED_URL or set crawler.seed-url in the config file");
    };

    if cli.dry_run {
        handle_dry_run(&config, &seed);
        return Ok(());
    }

    handle_crawl(&config, &seed, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_mapper=info,warn"),
            1 => EnvFilter::new("site_mapper=debug,info"),
            2 => EnvFilter::new("site_mapper=trace,debug"),
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

/// Applies command-line values on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(seed) = &cli.seed_url {
        config.crawler.seed_url = Some(seed.clone());
    }
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_fetches = concurrency;
    }
    if let Some(output) = &cli.output {
        config.output.sitemap_path = output.display().to_string();
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config, seed: &str) {
    println!("=== Site-Mapper Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", seed);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.user_agent_string());
    println!(
        "  Request timeout: {}s",
        config.user_agent.request_timeout_secs
    );

    println!("\nOutput:");
    println!("  Sitemap: {}", config.output.sitemap_path);
    println!("  Format: {}", config.output.format);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, seed: &str, quiet: bool) -> anyhow::Result<()> {
    let crawler = Crawler::from_config(config).context("Failed to build crawler")?;

    let report = match crawler.crawl(seed).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let path = Path::new(&config.output.sitemap_path);
    SitemapDocument::from_urls(&report.visited)
        .write_to_path(path, config.output.format)
        .with_context(|| format!("Failed to write sitemap to {}", path.display()))?;

    if !quiet {
        print_summary(&report);
        println!("\n✓ Sitemap written to: {}", path.display());
    }

    Ok(())
}
