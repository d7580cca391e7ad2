//! finratio CLI binary.
//!
//! Collects quarterly financial ratios from OpenDART, searches the corp code
//! list and fetches single reports as raw JSON.

use clap::{ArgGroup, Parser, Subcommand};
use finratio::{
    BatchSpec, CollectConfig, CollectError, Collector, Company, CompanyId, CompletionLedger,
    CorpCodeIndex, CsvFileSink, CsvStdoutSink, DEFAULT_CORP_CODE_PATH, DEFAULT_DELAY,
    DartProvider, InMemoryLedger, JsonDirSink, Quarter, RowSink, SqliteLedger, StatementScope,
    YearRange, is_corp_code, load_companies,
};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "finratio")]
#[command(about = "Quarterly financial ratios from OpenDART", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect statements and compute ratios for a batch of companies
    Collect {
        /// Comma-separated stock codes (or 8-digit DART corp codes)
        #[arg(long, value_delimiter = ',', required_unless_present = "companies")]
        stock_codes: Vec<String>,

        /// Company list CSV (stock_code, corp_name, label, sector, ...)
        #[arg(long, conflicts_with = "stock_codes")]
        companies: Option<PathBuf>,

        /// Years to collect: a single year, a range like 2019-2023, or a list
        #[arg(long, default_value = "2023")]
        years: String,

        /// Reports to collect (Q1, H1, Q3, ANNUAL); all four by default
        #[arg(long, value_delimiter = ',')]
        quarters: Vec<Quarter>,

        /// Primary statement scope
        #[arg(long, default_value = "CFS")]
        fs_div: StatementScope,

        /// CSV file to append rows to; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,

        /// Minimum seconds between task starts
        #[arg(long, default_value_t = DEFAULT_DELAY.as_secs_f64())]
        delay: f64,

        /// SQLite completion ledger; runs are not resumable without it
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Directory to archive raw line items in
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// OpenDART corpCode.xml, downloaded here when missing
        #[arg(long, default_value = DEFAULT_CORP_CODE_PATH)]
        corp_codes: PathBuf,

        /// Download corpCode.xml again even if it exists
        #[arg(long)]
        refresh: bool,

        /// OpenDART API key
        #[arg(long, env = "DART_API_KEY", hide_env_values = true)]
        api_key: String,
    },

    /// Search the OpenDART corp code list
    Search {
        /// Company name substring
        #[arg(long)]
        name: Option<String>,

        /// Exact stock code
        #[arg(long)]
        stock_code: Option<String>,

        /// Maximum number of matches
        #[arg(long, default_value = "20")]
        limit: usize,

        /// OpenDART corpCode.xml, downloaded here when missing
        #[arg(long, default_value = DEFAULT_CORP_CODE_PATH)]
        corp_codes: PathBuf,

        /// Download corpCode.xml again even if it exists
        #[arg(long)]
        refresh: bool,

        /// OpenDART API key, needed only to download corpCode.xml
        #[arg(long, env = "DART_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Fetch one report as the raw OpenDART JSON document
    #[command(group(
        ArgGroup::new("company")
            .required(true)
            .args(["corp_code", "stock_code", "corp_name"])
    ))]
    Fetch {
        /// DART corp code
        #[arg(long)]
        corp_code: Option<String>,

        /// Stock code, resolved through corpCode.xml
        #[arg(long)]
        stock_code: Option<String>,

        /// Company name, resolved through corpCode.xml
        #[arg(long)]
        corp_name: Option<String>,

        /// Business year
        #[arg(long)]
        year: i32,

        /// Report (Q1, H1, Q3, ANNUAL)
        #[arg(long, default_value = "ANNUAL")]
        quarter: Quarter,

        /// Statement scope
        #[arg(long, default_value = "CFS")]
        fs_div: StatementScope,

        /// JSON file to write; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,

        /// OpenDART corpCode.xml, downloaded here when missing
        #[arg(long, default_value = DEFAULT_CORP_CODE_PATH)]
        corp_codes: PathBuf,

        /// OpenDART API key
        #[arg(long, env = "DART_API_KEY", hide_env_values = true)]
        api_key: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            stock_codes,
            companies,
            years,
            quarters,
            fs_div,
            output,
            delay,
            ledger,
            raw_dir,
            corp_codes,
            refresh,
            api_key,
        } => {
            let mut provider = DartProvider::new(api_key);

            let companies = match companies {
                Some(path) => {
                    let mut list = Vec::new();
                    for record in load_companies(&path)? {
                        let company = record.to_company()?;
                        if let Some(code) = record.corp_code() {
                            provider = provider.with_corp_code(company.id.clone(), code);
                        }
                        list.push(company);
                    }
                    list
                }
                None => stock_codes.into_iter().map(Company::new).collect(),
            };

            let needs_index = refresh
                || companies.iter().any(|c| {
                    !is_corp_code(c.id.as_str()) && provider.resolve_corp_code(&c.id).is_err()
                });
            if needs_index {
                let index = load_index(&provider, &corp_codes, refresh).await?;
                provider = provider.with_corp_codes(index);
            }

            let mut batch = BatchSpec::new(companies).with_years(parse_years(&years)?);
            if !quarters.is_empty() {
                batch = batch.with_quarters(quarters);
            }

            let ledger: Arc<dyn CompletionLedger> = match ledger {
                Some(path) => Arc::new(SqliteLedger::new(path)?),
                None => Arc::new(InMemoryLedger::new()),
            };

            let rows: Arc<dyn RowSink> = match &output {
                Some(path) => Arc::new(CsvFileSink::new(path)),
                None => Arc::new(CsvStdoutSink::new()),
            };

            let config = CollectConfig::new()
                .with_delay_secs(delay)
                .with_scope(fs_div);

            let mut collector = Collector::new(Arc::new(provider), ledger)
                .with_config(config)
                .with_row_sink(rows);
            if let Some(dir) = raw_dir {
                collector = collector.with_sink(Arc::new(JsonDirSink::new(dir)));
            }

            let summary = collector.collect_batch(&batch).await?;
            if let Some(path) = &output {
                info!("Wrote {} rows to {}", summary.rows.len(), path.display());
            }

            let counts = summary.counts;
            eprintln!(
                "Done: {} success, {} no data, {} failed, {} skipped ({} units recorded)",
                counts.success,
                counts.no_data,
                counts.failed,
                counts.skipped,
                summary.ledger_delta.len()
            );
            for report in summary.failures() {
                if let Some((scope, reason)) = report.failure() {
                    eprintln!("  failed {} [{}]: {}", report.task, scope, reason);
                }
            }
        }
        Commands::Search {
            name,
            stock_code,
            limit,
            corp_codes,
            refresh,
            api_key,
        } => {
            let index = if refresh || !corp_codes.exists() {
                let api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                    CollectError::ProviderNotConfigured(
                        "OpenDART: an API key is required to download corpCode.xml".to_string(),
                    )
                })?;
                load_index(&DartProvider::new(api_key), &corp_codes, true).await?
            } else {
                CorpCodeIndex::load(&corp_codes)?
            };

            let matches = index.search(name.as_deref(), stock_code.as_deref(), limit);
            if matches.is_empty() {
                println!("No matching companies");
            }
            for entry in matches {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.corp_code,
                    entry.corp_name,
                    if entry.stock_code.is_empty() {
                        "-"
                    } else {
                        entry.stock_code.as_str()
                    },
                    entry.modify_date
                );
            }
        }
        Commands::Fetch {
            corp_code,
            stock_code,
            corp_name,
            year,
            quarter,
            fs_div,
            out,
            corp_codes,
            api_key,
        } => {
            let mut provider = DartProvider::new(api_key);
            let company = match (corp_code, stock_code, corp_name) {
                (Some(code), _, _) => CompanyId::new(code),
                (None, Some(id), _) | (None, None, Some(id)) => {
                    let index = load_index(&provider, &corp_codes, false).await?;
                    provider = provider.with_corp_codes(index);
                    CompanyId::new(id)
                }
                (None, None, None) => {
                    return Err(CollectError::InvalidParameter(
                        "One of --corp-code, --stock-code or --corp-name is required".to_string(),
                    )
                    .into());
                }
            };

            let document = provider
                .fetch_statement_json(&company, year, quarter, fs_div)
                .await?;
            let json = serde_json::to_string_pretty(&document)?;
            match out {
                Some(path) => {
                    if let Some(parent) = path.parent()
                        && !parent.as_os_str().is_empty()
                    {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, json)?;
                    println!("Saved response to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

async fn load_index(
    provider: &DartProvider,
    path: &Path,
    refresh: bool,
) -> Result<CorpCodeIndex, CollectError> {
    let index = provider.load_corp_codes(path, refresh).await?;
    info!("Loaded {} corp codes from {}", index.len(), path.display());
    Ok(index)
}

/// Parses `2023`, `2019-2023` or `2021,2023`.
fn parse_years(input: &str) -> Result<Vec<i32>, CollectError> {
    let parse = |s: &str| {
        s.trim()
            .parse::<i32>()
            .map_err(|_| CollectError::InvalidParameter(format!("Invalid year: {}", s.trim())))
    };

    if let Some((start, end)) = input.split_once('-') {
        return Ok(YearRange::new(parse(start)?, parse(end)?)?.years().collect());
    }

    input
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(parse)
        .collect()
}
