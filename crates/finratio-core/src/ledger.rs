//! Completion ledger trait for resumable batches.
//!
//! This module defines the [`CompletionLedger`] trait: an append-only record of the
//! `(company, year)` units a previous run already finished.

use async_trait::async_trait;

use crate::{error::Result, types::CompanyId};

/// Append-only record of completed `(company, year)` units.
///
/// The collector consults the ledger before issuing any request for a unit and
/// appends to it once every requested report of the unit reached a terminal
/// outcome. Implementations can store entries in various backends (SQLite,
/// in-memory, etc.).
#[async_trait]
pub trait CompletionLedger: Send + Sync {
    /// Returns true if `(company, year)` was already completed.
    async fn contains(&self, company: &CompanyId, year: i32) -> Result<bool>;

    /// Marks `(company, year)` as completed. Recording twice is not an error.
    async fn record(&self, company: &CompanyId, year: i32) -> Result<()>;

    /// Returns every recorded unit in the order it was first recorded.
    async fn entries(&self) -> Result<Vec<(CompanyId, i32)>>;

    /// Removes all entries, forcing the next run to collect everything again.
    async fn clear(&self) -> Result<()>;
}
