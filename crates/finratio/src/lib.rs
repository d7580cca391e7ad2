#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finratio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Quarterly financial-ratio collection.
//!
//! This crate re-exports the core types, the ratio engine, the ledger backends and
//! (with the `dart` feature) the OpenDART provider, and provides a [`Collector`]
//! that runs batches with CFS→OFS fallback, pacing and resumption.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use finratio::{BatchSpec, Collector, Company, DartProvider, InMemoryLedger, write_csv};
//!
//! #[tokio::main]
//! async fn main() -> finratio::Result<()> {
//!     let collector = Collector::new(
//!         Arc::new(DartProvider::from_env()?),
//!         Arc::new(InMemoryLedger::new()),
//!     );
//!
//!     let batch = BatchSpec::new(vec![Company::new("00126380")]).with_years([2023]);
//!     let summary = collector.collect_batch(&batch).await?;
//!     write_csv(&summary.rows, std::io::stdout())?;
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use finratio_core::*;

// Normalization and ratios
pub use finratio_calc::{
    AccountNormalizer, CanonicalKey, DuplicatePolicy, NormalizedPeriod, Ratio, RatioCategory,
    RatioSet, compute_all_ratios, extract_standard_items,
};

// Ledger implementations
#[cfg(feature = "ledger-sqlite")]
pub use finratio_ledger::SqliteLedger;
pub use finratio_ledger::{InMemoryLedger, NoopLedger};

// Providers
#[cfg(feature = "dart")]
pub use finratio_dart::{
    CorpCodeEntry, CorpCodeIndex, DEFAULT_CORP_CODE_PATH, DartProvider, is_corp_code,
};

mod batch;
mod collector;
mod config;
mod input;
mod output;

pub use batch::{BatchCounts, BatchSpec, BatchSummary, CollectionResult, TaskOutcome, TaskReport};
pub use collector::Collector;
pub use config::{CollectConfig, DEFAULT_DELAY};
pub use input::{CompanyRecord, load_companies, read_companies};
pub use output::{
    CsvFileSink, CsvStdoutSink, ID_COLUMNS, JsonDirSink, RatioRow, RowSink, csv_header,
    rows_to_dataframe, save_csv, write_csv,
};
