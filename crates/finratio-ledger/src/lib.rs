#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finratio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Completion ledger implementations.
//!
//! This crate provides implementations of the [`CompletionLedger`] trait from `finratio-core`:
//!
//! - [`SqliteLedger`] - Persistent SQLite-based ledger (default, requires `sqlite` feature)
//! - [`InMemoryLedger`] - Process-local ledger for tests and one-shot runs
//! - [`NoopLedger`] - Ledger that never records anything

/// In-memory ledger implementation.
pub mod memory;
/// No-op ledger implementation.
pub mod noop;

/// SQLite-based ledger implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use finratio_core::CompletionLedger;

pub use memory::InMemoryLedger;
pub use noop::NoopLedger;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLedger;
