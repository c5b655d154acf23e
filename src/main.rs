mod analyzer;
mod config;
mod model;
mod normalizer;
mod parser;
mod scraper;
mod storage;
mod utils;

use analyzer::history::load_history;
use analyzer::price_matrix::PriceMatrix;
use analyzer::{Analyzer, AnalyzerImpl, DealReport};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use config::{load_config, load_templates, AppConfig};
use model::ProductRow;
use normalizer::normalize_all;
use parser::CatalogParser;
use scraper::{fetch_all, ScraperImpl};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use storage::{RunRecord, SnapshotArchive, SqliteStorage};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use utils::fmt_price;

#[derive(Debug, Parser)]
#[command(name = "goods-tracker", version, about = "Grocery catalog snapshots and price history deals")]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch every catalog template and archive today's snapshot
    Fetch,
    /// Compare today's prices with the archived history and write the report.
    ///
    /// The report is a SQLite database with one table per sheet:
    /// "favorable buys today" and "better later".
    Analyze {
        /// Number of most recent snapshots to use
        #[arg(long)]
        last: Option<usize>,
        /// Report SQLite database path
        #[arg(long)]
        output: Option<String>,
    },
    /// Fetch and analyze on a timer until interrupted
    Daemon,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Fetch => run_fetch(&config).await.map(|_| ()),
        Command::Analyze { last, output } => {
            let last = last.unwrap_or(config.history_window);
            let output = output.unwrap_or_else(|| config.report_path.clone());
            run_analysis(&config, last, &output).map(|_| ())
        }
        Command::Daemon => run_daemon(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Fetches all templates, flattens the pages and archives today's snapshot.
async fn run_fetch(config: &AppConfig) -> Result<PathBuf, Box<dyn Error>> {
    let templates = load_templates(&config.templates_file)?;
    info!("Loaded {} templates from {}", templates.len(), config.templates_file);

    let scraper = ScraperImpl::new(&config.headers, config.request_timeout_seconds)?;
    let report = fetch_all(&scraper, &templates, config.default_pieces).await;
    if !report.failures.is_empty() {
        let failed: Vec<String> = report
            .failures
            .iter()
            .map(|f| format!("{} ({})", f.url, f.error))
            .collect();
        warn!("{} shards failed: {}", failed.len(), failed.join(", "));
    }

    let rows = normalize_all(CatalogParser::new().flatten(&report.payloads));
    if rows.is_empty() {
        return Err("no products fetched, snapshot not archived".into());
    }

    let archive = SnapshotArchive::new(&config.archive_dir)?;
    let path = archive.write(Local::now().date_naive(), &rows)?;
    Ok(path)
}

/// Loads the trailing window of snapshots, classifies today's prices and saves both sheets.
fn run_analysis(config: &AppConfig, last: usize, output: &str) -> Result<DealReport, Box<dyn Error>> {
    let history = load_history(Path::new(&config.archive_dir), last)?;
    if history.is_empty() {
        warn!("No archived snapshots in {}", config.archive_dir);
    }

    let labelled: Vec<(String, &[ProductRow])> = history
        .iter()
        .map(|(path, rows)| (day_label(path), rows.as_slice()))
        .collect();
    let matrix = PriceMatrix::build(&labelled);
    if let (Some(oldest), Some(newest)) = (matrix.days().first(), matrix.days().last()) {
        info!("Price window: {} .. {}", oldest, newest);
    }

    let analyzer = AnalyzerImpl::new();
    let stats = analyzer.price_statistics(&matrix);
    let report = analyzer.find_deals(&stats);
    info!(
        "Analyzed {} products over {} snapshots: {} favorable, {} better later",
        matrix.len(),
        history.len(),
        report.best.len(),
        report.worst.len()
    );
    for deal in report.best.iter().take(5) {
        info!(
            "Deal: {} {} | yesterday {} -> today {} (bucket {})",
            deal.category,
            deal.full_name,
            fmt_price(deal.yesterday),
            fmt_price(deal.today),
            deal.bucket
        );
    }

    let mut storage = SqliteStorage::new(output)?;
    if let Ok(Some(prev)) = storage.last_run() {
        info!(
            "Previous run: {} | {} favorable, {} better later",
            prev.ran_at, prev.best, prev.worst
        );
    }
    storage.save_report(&report)?;
    storage.record_run(&RunRecord {
        ran_at: Utc::now(),
        snapshots: history.len(),
        products: matrix.len(),
        best: report.best.len(),
        worst: report.worst.len(),
    })?;
    info!("Report written to {}", output);

    Ok(report)
}

async fn run_daemon(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    loop {
        info!("Entering main loop...");
        match run_fetch(config).await {
            Ok(path) => info!("Snapshot saved: {}", path.display()),
            Err(e) => warn!("Fetch failed: {}", e),
        }
        if let Err(e) = run_analysis(config, config.history_window, &config.report_path) {
            warn!("Analysis failed: {}", e);
        }

        info!("Waiting {}s for the next run...", config.check_interval_seconds);
        tokio::select! {
            _ = sleep(Duration::from_secs(config.check_interval_seconds)) => {
                info!("Timer triggered.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping.");
                return Ok(());
            }
        }
    }
}

fn day_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
