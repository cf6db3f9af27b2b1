//! bugtally CLI
//!
//! Logs into the tracker, crawls the filtered report given on the command
//! line, and prints the monthly defect metrics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bugtally::{
    error::Result,
    metrics::MetricsReport,
    models::Config,
    services::{ReportCrawler, Session},
};
use chrono::Local;
use clap::Parser;

/// bugtally - issue-tracker quality metrics
#[derive(Parser, Debug)]
#[command(name = "bugtally", version, about = "Issue-tracker monthly defect metrics")]
struct Cli {
    /// Tracker login user name
    username: String,

    /// Tracker login password
    password: String,

    /// First page of the tracker's filtered report
    root_url: String,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of a summary line
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.validate()?;

    let started = Instant::now();

    let session = Session::login(&config, &cli.root_url, &cli.username, &cli.password).await?;
    let config = Arc::new(config);
    let crawler = ReportCrawler::new(Arc::new(session), Arc::clone(&config))?;
    let store = crawler.run(&cli.root_url).await?;

    let report = MetricsReport::collect(&store, &config.metrics, Local::now().date_naive())?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    println!("elapsed: {:.2?}", started.elapsed());

    Ok(())
}
