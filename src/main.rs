// src/main.rs
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use clap::Parser;

use sec_catalog::edgar::{
    filter, latest_periodic, DateRange, EdgarClient, FactsStore, FilingCatalog, FilterCriteria,
    IdentifierResolver,
};
use sec_catalog::reports::{
    fetch_report_index, load_financials, FailurePolicy, LineItemSource, RatioCalculator,
    RatioLabels,
};
use sec_catalog::storage::StorageManager;
use sec_catalog::tabular::to_tabular;
use sec_catalog::utils::config::{EdgarConfig, ENV_CACHE_DIR, ENV_USER_AGENT};
use sec_catalog::utils::{logging, AppError};

/// List, filter and inspect a company's SEC EDGAR filings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol of the company
    ticker: String,

    /// Keep only these form types (repeatable, e.g. --form 10-K --form 10-Q)
    #[arg(short, long = "form")]
    forms: Vec<String>,

    /// Earliest filing date (YYYY-MM-DD)
    #[arg(long)]
    filed_from: Option<NaiveDate>,

    /// Latest filing date (YYYY-MM-DD)
    #[arg(long)]
    filed_to: Option<NaiveDate>,

    /// Earliest report period date (YYYY-MM-DD)
    #[arg(long)]
    report_from: Option<NaiveDate>,

    /// Latest report period date (YYYY-MM-DD)
    #[arg(long)]
    report_to: Option<NaiveDate>,

    /// Only filings with XBRL financial data
    #[arg(long)]
    xbrl_only: bool,

    /// Keep at most this many filings
    #[arg(short, long)]
    limit: Option<usize>,

    /// Also fetch archived submission pages (older filings)
    #[arg(long)]
    include_archived: bool,

    /// Contact string sent as the User-Agent, e.g. "Jane Doe jane@example.com"
    #[arg(long, env = ENV_USER_AGENT)]
    user_agent: Option<String>,

    /// Directory where the ticker table is cached between runs
    #[arg(long, env = ENV_CACHE_DIR)]
    cache_dir: Option<PathBuf>,

    /// Ignore the cached ticker table and download a fresh one
    #[arg(long)]
    refresh_tickers: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Export the filtered filings as JSON under this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// List the sub-reports of the latest 10-K/10-Q in the result
    #[arg(long)]
    reports: bool,

    /// Compute ROE and ROA from the latest 10-K/10-Q in the result
    #[arg(long)]
    ratios: bool,

    /// Compute ratios from XBRL company facts (us-gaap tags, fiscal years)
    /// instead of the filing's rendered statements
    #[arg(long, requires = "ratios")]
    facts: bool,

    /// Period to use for ratios (defaults to the report year)
    #[arg(long)]
    period: Option<String>,

    /// Prior period for average total assets (defaults to the year before)
    #[arg(long)]
    previous_period: Option<String>,

    /// What to do when a ratio cannot be computed: abort or skip
    #[arg(long, default_value = "skip")]
    on_failure: FailurePolicy,

    /// Debug-level logging for this crate
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> EdgarConfig {
        let mut config = EdgarConfig::from_env();
        if let Some(agent) = &self.user_agent {
            config.user_agent = Some(agent.clone());
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config.refresh_tickers |= self.refresh_tickers;
        config.include_archived |= self.include_archived;
        config
    }

    fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::new();
        if !self.forms.is_empty() {
            criteria = criteria.form_types(&self.forms);
        }
        if self.filed_from.is_some() || self.filed_to.is_some() {
            criteria = criteria.filed(DateRange::new(self.filed_from, self.filed_to));
        }
        if self.report_from.is_some() || self.report_to.is_some() {
            criteria = criteria.reported(DateRange::new(self.report_from, self.report_to));
        }
        if self.xbrl_only {
            criteria = criteria.xbrl_only(true);
        }
        if let Some(limit) = self.limit {
            criteria = criteria.limit(limit);
        }
        criteria
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (RUST_LOG overrides --verbose)
    logging::setup_logging(args.verbose);
    tracing::debug!("Starting with args: {:?}", args);
    let config = args.config();

    // 3. Build the client; fails here if no contact string is configured
    let client = EdgarClient::new(&config)?;

    // 4. Resolve the ticker, caching the lookup table on disk when asked to
    let mut resolver = IdentifierResolver::new(client.clone())?;
    if let Some(dir) = &config.cache_dir {
        let storage = StorageManager::new(dir)?;
        resolver = resolver.with_storage(storage, config.refresh_tickers);
    }
    let identity = resolver.resolve(&args.ticker).await?;
    tracing::info!(
        "{} is {} (CIK {})",
        identity.ticker(),
        identity.name(),
        identity.cik()
    );

    // 5. Fetch and filter the filing catalog
    let mut catalog = FilingCatalog::new(client.clone())?.with_archived(config.include_archived);
    let filings = catalog.filings(&identity).await?;
    let selected = filter(&filings, &args.criteria());
    tracing::info!("{} of {} filings match", selected.len(), filings.len());

    println!("{}", to_tabular(&selected));

    // 6. Optional JSON export
    if let Some(dir) = &args.output_dir {
        let storage = StorageManager::new(dir)?;
        let path = storage.export_filings(&identity, &selected)?;
        println!("Exported {} filings to {}", selected.len(), path.display());
    }

    if !args.reports && !args.ratios {
        return Ok(());
    }

    // 7. Statements of the latest periodic report
    let Some(record) = latest_periodic(&selected) else {
        tracing::warn!("No 10-K or 10-Q among the selected filings; nothing to inspect");
        return Ok(());
    };
    let index = if args.reports || !args.facts {
        Some(fetch_report_index(&client, record).await?)
    } else {
        None
    };

    if args.reports {
        if let Some(index) = &index {
            println!(
                "Reports in {} {} ({}):",
                record.form_type, record.accession_number, record.filing_date
            );
            println!("{}", index.to_table());
        }
    }

    if args.ratios {
        let report_year = record.report_date.unwrap_or(record.filing_date).year();
        let period = args.period.clone().unwrap_or_else(|| report_year.to_string());
        let previous = args
            .previous_period
            .clone()
            .unwrap_or_else(|| (report_year - 1).to_string());

        match &index {
            Some(index) if !args.facts => {
                // 8a. Ratios over the filing's rendered statements
                let financials = load_financials(&client, index).await?;
                let calculator = RatioCalculator::new(args.on_failure);
                print_ratios(&calculator, &financials, identity.ticker(), &period, &previous)?;
            }
            _ => {
                // 8b. Ratios over XBRL company facts
                let mut store = FactsStore::new(client.clone())?;
                let facts = store.facts(&identity).await?;
                let calculator =
                    RatioCalculator::new(args.on_failure).with_labels(RatioLabels::us_gaap());
                print_ratios(&calculator, &*facts, identity.ticker(), &period, &previous)?;
            }
        }
    }

    Ok(())
}

fn print_ratios<S: LineItemSource>(
    calculator: &RatioCalculator,
    source: &S,
    ticker: &str,
    period: &str,
    previous: &str,
) -> Result<(), AppError> {
    let roe = calculator.return_on_equity(source, period)?;
    let roa = calculator.return_on_assets(source, period)?;
    let roaa = calculator.return_on_average_assets(source, period, previous)?;

    println!("Ratios for {} ({}):", ticker, period);
    println!("  ROE:                  {}", format_ratio(roe));
    println!("  ROA:                  {}", format_ratio(roa));
    println!("  ROA (average assets): {}", format_ratio(roaa));
    Ok(())
}

fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.5} ({:.2}%)", v, v * 100.0),
        None => "n/a".to_string(),
    }
}
