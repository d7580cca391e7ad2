//! In-memory ledger implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finratio_core::{CompanyId, CompletionLedger, Result};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Ledger entry with its insertion sequence number.
#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    seq: u64,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Entries {
    next_seq: u64,
    map: BTreeMap<(CompanyId, i32), LedgerEntry>,
}

/// Simple in-memory ledger for tests and one-shot runs.
///
/// Entries are stored in a `RwLock`-protected `BTreeMap` and are lost when the
/// ledger is dropped.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: RwLock<Entries>,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with completed units.
    #[must_use]
    pub fn with_entries(units: impl IntoIterator<Item = (CompanyId, i32)>) -> Self {
        let mut entries = Entries::default();
        for unit in units {
            entries.insert(unit);
        }
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Returns when `(company, year)` was first recorded.
    pub async fn recorded_at(&self, company: &CompanyId, year: i32) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().await;
        entries
            .map
            .get(&(company.clone(), year))
            .map(|e| e.recorded_at)
    }

    /// Returns the number of recorded units.
    pub async fn len(&self) -> usize {
        self.entries.read().await.map.len()
    }

    /// Returns true if nothing was recorded.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.map.is_empty()
    }
}

impl Entries {
    fn insert(&mut self, unit: (CompanyId, i32)) -> bool {
        if self.map.contains_key(&unit) {
            return false;
        }
        let entry = LedgerEntry {
            seq: self.next_seq,
            recorded_at: Utc::now(),
        };
        self.next_seq += 1;
        self.map.insert(unit, entry);
        true
    }
}

#[async_trait]
impl CompletionLedger for InMemoryLedger {
    #[instrument(skip(self), fields(company = %company))]
    async fn contains(&self, company: &CompanyId, year: i32) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.map.contains_key(&(company.clone(), year)))
    }

    #[instrument(skip(self), fields(company = %company))]
    async fn record(&self, company: &CompanyId, year: i32) -> Result<()> {
        let mut entries = self.entries.write().await;
        let inserted = entries.insert((company.clone(), year));
        debug!(inserted, "Recorded ledger entry");
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(CompanyId, i32)>> {
        let entries = self.entries.read().await;
        let mut units: Vec<_> = entries.map.iter().collect();
        units.sort_by_key(|(_, entry)| entry.seq);
        Ok(units.into_iter().map(|(unit, _)| unit.clone()).collect())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        let count = entries.map.len();
        entries.map.clear();
        debug!("Cleared {} ledger entries", count);
        Ok(())
    }
}
