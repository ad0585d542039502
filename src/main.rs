//! Character-Sync main entry point
//!
//! This is the command-line interface for syncing characters and serving them.

use anyhow::Context;
use character_sync::config::{load_config_with_hash, Config};
use character_sync::output::{load_statistics, print_statistics};
use character_sync::storage::SqliteStorage;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Character-Sync: scrape a GraphQL character API and serve the results
///
/// Without a mode flag, runs a single sync (fetch every page, store new
/// characters) and exits. Schedule it with cron or a systemd timer.
#[derive(Parser, Debug)]
#[command(name = "character-sync")]
#[command(version)]
#[command(about = "Scrape a GraphQL character API and serve the results", long_about = None)]
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

    /// Serve the HTTP API instead of syncing
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    serve: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["serve", "dry_run"])]
    stats: bool,

    /// Validate config and show what a sync would do without running it
    #[arg(long, conflicts_with_all = ["serve", "stats"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.serve {
        character_sync::server::serve(&config)
            .await
            .context("Server failed")?;
    } else {
        character_sync::sync::run_sync(&config)
            .await
            .context("Sync setup failed")?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("character_sync=info,tower_http=info,warn"),
            1 => EnvFilter::new("character_sync=debug,tower_http=debug,info"),
            2 => EnvFilter::new("character_sync=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Character-Sync Dry Run ===\n");

    println!("Source:");
    println!("  Endpoint: {}", config.source.endpoint);
    println!(
        "  User agent: {}",
        config.source.user_agent.as_deref().unwrap_or("(default)")
    );
    println!(
        "  Timeout: {}",
        config
            .source
            .timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "(transport default)".to_string())
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);
    println!("  Batch size: {}", config.storage.batch_size);

    println!("\nServer:");
    println!("  Bind address: {}", config.server.bind_address);
    println!(
        "  Page size: {} (max {})",
        config.server.page_size, config.server.max_page_size
    );

    println!("\n✓ Configuration is valid");
    println!(
        "✓ A sync would fetch page 1 from {}, then the remaining pages concurrently",
        config.source.endpoint
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = SqliteStorage::new(Path::new(&config.storage.database_path))
        .context("Failed to open database")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}
