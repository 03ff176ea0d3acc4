//! Sports betting arbitrage finder entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use arby::api::{create_router, AppState};
use arby::arbitrage::{scan, ArbitrageOpportunity, BookmakerFilter, RankingStrategy, ScanRequest, Timeframe};
use arby::config::{split_list, Config};
use arby::metrics;
use arby::odds::{Match, OddsApiClient, OddsProvider, RegionTable, SnapshotStore};
use arby::utils::shutdown_signal;

/// Cross-bookmaker sports betting arbitrage finder.
#[derive(Parser, Debug)]
#[command(name = "arby")]
#[command(about = "Find guaranteed-profit bets across bookmakers")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default).
    Serve {
        /// HTTP server port; overrides PORT.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one evaluation pass and print the opportunities.
    Scan {
        /// Provider sport key; defaults to DEFAULT_SPORT.
        #[arg(long)]
        sport: Option<String>,

        /// Comma-separated region labels; defaults to DEFAULT_REGIONS.
        #[arg(long)]
        regions: Option<String>,

        /// Comma-separated bookmaker titles to consider.
        #[arg(long)]
        bookmakers: Option<String>,

        /// today, week, month or all.
        #[arg(long, default_value = "all")]
        timeframe: String,

        /// Minimum profit percent.
        #[arg(long, default_value = "0")]
        min_profit: Decimal,

        /// Replay a stored snapshot instead of calling the provider.
        #[arg(long, conflicts_with = "save")]
        snapshot: Option<String>,

        /// Store the fetched matches under this name.
        #[arg(long)]
        save: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// List active sports.
    Sports,

    /// Show how region labels resolve.
    Regions {
        /// Labels to resolve; all accepted labels when empty.
        labels: Vec<String>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging; config errors are reported later by the subcommand
    let log_config = Config::load().unwrap_or_default();
    let filter = if args.verbose || log_config.verbose {
        EnvFilter::new(log_config.log_directives(args.verbose))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_config.log_directives(false)))
    };

    let fmt_layer = if args.log_json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port).await,
        Some(Command::Scan {
            sport,
            regions,
            bookmakers,
            timeframe,
            min_profit,
            snapshot,
            save,
            json,
        }) => {
            let options = ScanOptions {
                sport,
                regions,
                bookmakers,
                timeframe,
                min_profit,
                snapshot,
                save,
                json,
            };
            cmd_scan(options).await
        }
        Some(Command::Sports) => cmd_sports().await,
        Some(Command::Regions { labels }) => cmd_regions(&labels),
        Some(Command::CheckConfig) => cmd_check_config(),
        None => cmd_serve(None).await,
    }
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        bail!("Configuration validation failed: {}", e);
    }

    Ok(config)
}

/// Run the HTTP API until shutdown.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = load_config()?;
    let port = port_override.unwrap_or(config.port);

    let metrics_handle = if config.metrics_enabled {
        metrics::install_recorder()
    } else {
        None
    };

    if config.require_api_key().is_err() {
        info!("ODDS_API_KEY not set, only snapshot replays will succeed");
    }

    let provider = OddsApiClient::new(&config).context("Failed to build odds provider client")?;
    let app_state = AppState::new(config, Arc::new(provider)).with_metrics(metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

struct ScanOptions {
    sport: Option<String>,
    regions: Option<String>,
    bookmakers: Option<String>,
    timeframe: String,
    min_profit: Decimal,
    snapshot: Option<String>,
    save: Option<String>,
    json: bool,
}

/// Run one evaluation pass from the provider or a snapshot.
async fn cmd_scan(options: ScanOptions) -> anyhow::Result<()> {
    let config = load_config()?;
    metrics::init_metrics();

    if options.min_profit.is_sign_negative() {
        bail!("--min-profit must not be negative");
    }

    let store = SnapshotStore::new(&config.snapshot_dir);

    let matches: Vec<Match> = match &options.snapshot {
        Some(name) => store.load(name).await?,
        None => {
            let labels = options
                .regions
                .as_deref()
                .map(split_list)
                .unwrap_or_else(|| config.default_region_labels());
            let regions = RegionTable::default().resolve(&labels);
            if regions.is_empty() {
                bail!("No eligible region in {:?}", labels);
            }

            let sport = options.sport.as_deref().unwrap_or(config.default_sport.as_str());
            let client = OddsApiClient::new(&config)?;
            client.fetch_odds(sport, &regions).await?
        }
    };

    if let Some(name) = &options.save {
        let path = store.save(name, &matches).await?;
        info!("Saved {} matches to {}", matches.len(), path.display());
    }

    let request = ScanRequest {
        allowed_bookmakers: BookmakerFilter::new(
            options.bookmakers.as_deref().map(split_list).unwrap_or_default(),
        ),
        timeframe: Timeframe::from_query(Some(options.timeframe.as_str())),
        min_profit: options.min_profit,
        include_started: true,
        ranking: RankingStrategy::ProfitDescending,
    };

    let report = scan(&matches, &request, &Local::now());

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report.opportunities)?);
        return Ok(());
    }

    println!("======================================================================");
    println!(
        "ARBITRAGE SCAN - {} matches, {} evaluated, {} skipped",
        matches.len(),
        report.evaluated,
        report.skipped
    );
    println!("======================================================================");

    if report.opportunities.is_empty() {
        println!("No arbitrage opportunities found");
    }
    for opp in &report.opportunities {
        print_opportunity(opp);
    }

    Ok(())
}

fn print_opportunity(opp: &ArbitrageOpportunity) {
    println!(
        "{} | {} | {}{} | profit {}%",
        opp.date,
        opp.sport,
        opp.event,
        if opp.is_live { " (live)" } else { "" },
        opp.profit
    );
    for leg in &opp.odds {
        println!(
            "  {:<28} @ {:>7} {:<20} stake {:>6}%",
            leg.team, leg.price, leg.bookmaker, leg.stake
        );
    }
    println!("----------------------------------------------------------------------");
}

/// List active sports from the provider.
async fn cmd_sports() -> anyhow::Result<()> {
    let config = load_config()?;
    let client = OddsApiClient::new(&config)?;

    let sports = client.list_sports().await?;
    for sport in sports.iter().filter(|s| s.active) {
        println!(
            "{:<40} {:<20} {}{}",
            sport.key,
            sport.group,
            sport.title,
            if sport.has_outrights { " (outrights)" } else { "" }
        );
    }

    Ok(())
}

/// Show region resolution.
fn cmd_regions(labels: &[String]) -> anyhow::Result<()> {
    let table = RegionTable::default();

    if labels.is_empty() {
        for entry in table.entries() {
            println!("{:<20} {}", entry.label, entry.code);
        }
        return Ok(());
    }

    for label in labels {
        match table.lookup(label) {
            Some(code) => println!("{:<20} {}", label, code),
            None => println!("{:<20} (not recognized)", label),
        }
    }

    let resolved = table.resolve(labels);
    println!("Resolved: {}", if resolved.is_empty() { "(none)".to_string() } else { resolved.join(",") });
    Ok(())
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("ARBY - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            bail!("Configuration load failed");
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            bail!("Configuration validation failed");
        }
    }

    // Check API key
    print!("Checking API key... ");
    match config.require_api_key() {
        Ok(_) => println!("OK"),
        Err(e) => println!("MISSING ({})", e),
    }

    let regions = RegionTable::default().resolve(&config.default_region_labels());

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Provider URL: {}", config.odds_api_url);
    println!("  HTTP Timeout: {}ms", config.http_timeout_ms);
    println!("  Default Sport: {}", config.default_sport);
    println!(
        "  Default Regions: {} -> {}",
        config.default_regions,
        if regions.is_empty() { "(none)".to_string() } else { regions.join(",") }
    );
    println!("  Live Sport Limit: {}", config.live_sport_limit);
    println!("  Snapshot Dir: {}", config.snapshot_dir);
    println!("  Port: {}", config.port);
    println!(
        "  CORS Origin: {}",
        config.cors_allow_origin.as_deref().unwrap_or("*")
    );
    println!("  Metrics: {}", if config.metrics_enabled { "Enabled" } else { "Disabled" });
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}
