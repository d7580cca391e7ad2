#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finratio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the financial-ratio collector.
//!
//! This crate provides the foundational abstractions shared by every other crate:
//!
//! - [`StatementProvider`](provider::StatementProvider) - Fetches raw statement line items
//! - [`CompletionLedger`](ledger::CompletionLedger) - Records finished (company, year) units
//! - [`RawPayloadSink`](sink::RawPayloadSink) - Optional archive for raw payloads
//! - [`CollectionTask`](types::CollectionTask) - One company × year × quarter unit of work

/// Error types for collection operations.
pub mod error;
/// Completion ledger trait.
pub mod ledger;
/// Reporting period, statement scope and statement type definitions.
pub mod period;
/// Statement provider trait.
pub mod provider;
/// Raw payload sink trait.
pub mod sink;
/// Core data types (CompanyId, RawLineItem, CollectionTask, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CollectError, Result};
pub use ledger::CompletionLedger;
pub use period::{Quarter, StatementScope, StatementType};
pub use provider::StatementProvider;
pub use sink::RawPayloadSink;
pub use types::{CollectionTask, Company, CompanyId, RawLineItem, YearRange};
