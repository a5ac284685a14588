mod config;
mod enrich;
mod error;
mod export;
mod fetch;
mod input;
mod normalize;
mod parser;
mod record;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::{ConfigError, NoDataError};
use crate::fetch::{Fetch, FetchPool, HttpFetcher};
use crate::parser::FetchedPage;

const DEFAULT_INPUT: &str = "data/input_urls.txt";
const DEFAULT_SETTINGS: &str = "config/settings.json";
const DEFAULT_OUT_JSON: &str = "jobs.json";
const DEFAULT_OUT_CSV: &str = "jobs.csv";
const DEFAULT_SAMPLE: &str = "data/sample_jobs.json";

#[derive(Parser)]
#[command(name = "jobs_scraper", about = "Job search scraper with company enrichment")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch search pages, enrich, normalize, write JSON + CSV (default)
    Run(RunArgs),
    /// Extract jobs from a saved search page and print them as JSON
    Parse {
        /// HTML file to read
        file: PathBuf,
        /// URL the page was saved from, used to resolve relative links
        #[arg(long, default_value = "https://www.linkedin.com")]
        base_url: String,
        #[arg(long, default_value = DEFAULT_SETTINGS)]
        settings: PathBuf,
    },
    /// Fetch one company page and print its profile as JSON
    Company {
        url: String,
        #[arg(long, default_value = DEFAULT_SETTINGS)]
        settings: PathBuf,
    },
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Search URLs, one per line
    #[arg(long, default_value = DEFAULT_INPUT)]
    input: PathBuf,
    #[arg(long, default_value = DEFAULT_SETTINGS)]
    settings: PathBuf,
    #[arg(long, default_value = DEFAULT_OUT_JSON)]
    out_json: PathBuf,
    #[arg(long, default_value = DEFAULT_OUT_CSV)]
    out_csv: PathBuf,
    /// Records used when no URL yields any
    #[arg(long, default_value = DEFAULT_SAMPLE)]
    sample: PathBuf,
    #[arg(long)]
    no_sample_fallback: bool,
    /// Stop starting new fetches after this many seconds
    #[arg(long)]
    deadline: Option<u64>,
}

impl Default for RunArgs {
    fn default() -> Self {
        RunArgs {
            input: DEFAULT_INPUT.into(),
            settings: DEFAULT_SETTINGS.into(),
            out_json: DEFAULT_OUT_JSON.into(),
            out_csv: DEFAULT_OUT_CSV.into(),
            sample: DEFAULT_SAMPLE.into(),
            no_sample_fallback: false,
            deadline: None,
        }
    }
}

impl Commands {
    fn settings_path(&self) -> &Path {
        match self {
            Commands::Run(args) => args.settings.as_path(),
            Commands::Parse { settings, .. } | Commands::Company { settings, .. } => {
                settings.as_path()
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default()));

    let (settings, problem) = Settings::load(command.settings_path());
    init_tracing(&settings.logging.level);
    match problem {
        Some(e @ ConfigError::Missing(_)) => warn!("{}; using defaults", e),
        Some(e) => error!("{}; using defaults", e),
        None => {}
    }

    let t0 = Instant::now();
    let code = tokio::select! {
        result = execute(command, &settings) => match result {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; no output written");
            ExitCode::from(130)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {}", format_duration(elapsed));
    }
    code
}

/// `RUST_LOG` wins; otherwise the level from settings.
fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(command: Commands, settings: &Settings) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Run(args) => {
            let fetcher: Arc<dyn Fetch> = Arc::new(HttpFetcher::new(&settings.http)?);
            match run_pipeline(&args, settings, fetcher).await? {
                Outcome::Written(_) => Ok(ExitCode::SUCCESS),
                Outcome::NoData => Ok(ExitCode::from(2)),
            }
        }
        Commands::Parse { file, base_url, .. } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let bags = parser::extract::jobs::extract(&html, &base_url);
            let records = normalize::normalize_records(&bags);
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Company { url, .. } => {
            let fetcher = HttpFetcher::new(&settings.http)?;
            let profile = enrich::profile(&fetcher, &url)
                .await
                .with_context(|| format!("enriching {}", url))?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[derive(Debug, PartialEq)]
enum Outcome {
    Written(usize),
    NoData,
}

async fn run_pipeline(
    args: &RunArgs,
    settings: &Settings,
    fetcher: Arc<dyn Fetch>,
) -> anyhow::Result<Outcome> {
    let deadline = args
        .deadline
        .or(settings.run.deadline_secs)
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let pool = FetchPool::new(fetcher, settings.http.concurrency, deadline);

    let urls = input::read_urls(&args.input);
    info!("Processing {} search URLs", urls.len());
    let pages = collect_pages(&pool, &urls).await;
    let page_count = pages.len();
    let mut bags = tokio::task::spawn_blocking(move || parser::extract_pages(&pages))
        .await
        .context("page extraction task failed")?;
    info!("Extracted {} raw records from {} pages", bags.len(), page_count);

    if bags.is_empty() && !args.no_sample_fallback {
        warn!(
            "No records from search URLs; falling back to sample data {}",
            args.sample.display()
        );
        bags = input::read_sample(&args.sample);
    }
    if bags.is_empty() {
        error!("{}", NoDataError);
        return Ok(Outcome::NoData);
    }

    if settings.enrichment.enable_company_enrichment {
        bags = enrich::enrich_all(&pool, bags).await;
    } else {
        info!("Company enrichment disabled via settings.");
    }

    let records = normalize::normalize_records(&bags);
    export::write_json(&records, &args.out_json)
        .with_context(|| format!("exporting JSON to {}", args.out_json.display()))?;
    export::write_csv(&records, &args.out_csv)
        .with_context(|| format!("exporting CSV to {}", args.out_csv.display()))?;

    info!(
        "Scrape complete: {} records written to {} and {}",
        records.len(),
        args.out_json.display(),
        args.out_csv.display()
    );
    Ok(Outcome::Written(records.len()))
}

/// Fetch every search URL; failures are logged and contribute no page.
async fn collect_pages(pool: &FetchPool, urls: &[String]) -> Vec<FetchedPage> {
    let results = pool.fetch_all(urls, "search pages").await;
    urls.iter()
        .zip(results)
        .filter_map(|(url, result)| match result {
            Ok(html) => Some(FetchedPage { url: url.clone(), html }),
            Err(e) => {
                warn!("Processing URL failed ({}): {}", url, e);
                None
            }
        })
        .collect()
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
