//! SQLite-based ledger implementation.

use async_trait::async_trait;
use chrono::Utc;
use finratio_core::{CollectError, CompanyId, CompletionLedger, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// SQLite-backed completion ledger.
///
/// Entries survive process restarts, which is what makes an interrupted batch
/// resumable. Recording an existing entry keeps its original timestamp.
#[derive(Debug)]
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open (or create) a ledger at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| CollectError::Ledger(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory SQLite ledger.
    ///
    /// Useful for testing; entries are lost when the ledger is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| CollectError::Ledger(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.initialize_schema()?;
        Ok(ledger)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS completion_ledger (
                company_id TEXT NOT NULL,
                year INTEGER NOT NULL,
                recorded_at TEXT NOT NULL,
                PRIMARY KEY (company_id, year)
            )",
            [],
        )
        .map_err(|e| CollectError::Ledger(e.to_string()))?;

        debug!("SQLite ledger schema initialized");
        Ok(())
    }

    /// Returns when `(company, year)` was first recorded, as RFC 3339.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn recorded_at(&self, company: &CompanyId, year: i32) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        conn.query_row(
            "SELECT recorded_at FROM completion_ledger WHERE company_id = ?1 AND year = ?2",
            params![company.as_str(), year],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| CollectError::Ledger(e.to_string()))
    }
}

#[async_trait]
impl CompletionLedger for SqliteLedger {
    #[instrument(skip(self), fields(company = %company))]
    async fn contains(&self, company: &CompanyId, year: i32) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        let found = conn
            .query_row(
                "SELECT 1 FROM completion_ledger WHERE company_id = ?1 AND year = ?2",
                params![company.as_str(), year],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| CollectError::Ledger(e.to_string()))?
            .is_some();

        debug!(found, "Checked ledger");
        Ok(found)
    }

    #[instrument(skip(self), fields(company = %company))]
    async fn record(&self, company: &CompanyId, year: i32) -> Result<()> {
        let recorded_at = Utc::now().to_rfc3339();
        let conn = self
            .conn
            .lock()
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        let inserted = conn
            .execute(
                "INSERT INTO completion_ledger (company_id, year, recorded_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (company_id, year) DO NOTHING",
                params![company.as_str(), year, recorded_at],
            )
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        debug!(inserted, "Recorded ledger entry");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn entries(&self) -> Result<Vec<(CompanyId, i32)>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        let mut stmt = conn
            .prepare("SELECT company_id, year FROM completion_ledger ORDER BY rowid ASC")
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
            })
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (company, year) = row.map_err(|e| CollectError::Ledger(e.to_string()))?;
            entries.push((CompanyId::new(company), year));
        }

        debug!("Found {} ledger entries", entries.len());
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        conn.execute("DELETE FROM completion_ledger", [])
            .map_err(|e| CollectError::Ledger(e.to_string()))?;

        debug!("Cleared all ledger entries");
        Ok(())
    }
}
