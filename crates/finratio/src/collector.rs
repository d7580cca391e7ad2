//! Collection orchestrator: scope fallback, pacing, failure isolation and
//! ledger-based resumption.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use finratio_calc::{AccountNormalizer, compute_all_ratios};
use finratio_core::{
    CollectError, CollectionTask, Company, CompletionLedger, RawLineItem, RawPayloadSink, Result,
    StatementProvider, StatementScope,
};

use crate::batch::{BatchCounts, BatchSpec, BatchSummary, CollectionResult, TaskOutcome, TaskReport};
use crate::config::CollectConfig;
use crate::output::{RatioRow, RowSink};

/// Enforces a minimum spacing between the start times of successive tasks.
#[derive(Debug)]
struct Pacer {
    last_start: Option<Instant>,
    min_interval: Duration,
}

impl Pacer {
    const fn new(min_interval: Duration) -> Self {
        Self {
            last_start: None,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        if let Some(last) = self.last_start {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_start = Some(Instant::now());
    }
}

fn failed(scope: StatementScope, error: &CollectError) -> CollectionResult {
    CollectionResult::Failed {
        scope,
        reason: error.to_string(),
    }
}

/// Fetches statements, computes ratios and drives batches.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use finratio::{BatchSpec, Collector, Company, DartProvider, SqliteLedger};
///
/// let collector = Collector::new(
///     Arc::new(DartProvider::from_env()?),
///     Arc::new(SqliteLedger::new("ledger.db")?),
/// );
/// let batch = BatchSpec::new(vec![Company::new("00126380")]).with_years([2023]);
/// let summary = collector.collect_batch(&batch).await?;
/// println!("{:?}", summary.counts);
/// ```
pub struct Collector {
    provider: Arc<dyn StatementProvider>,
    ledger: Arc<dyn CompletionLedger>,
    sink: Option<Arc<dyn RawPayloadSink>>,
    rows: Option<Arc<dyn RowSink>>,
    config: CollectConfig,
    normalizer: AccountNormalizer,
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("provider", &self.provider.name())
            .field("sink", &self.sink.as_ref().map(|_| "configured"))
            .field("rows", &self.rows.as_ref().map(|_| "configured"))
            .field("config", &self.config)
            .finish()
    }
}

impl Collector {
    /// Create a collector with the default configuration.
    #[must_use]
    pub fn new(provider: Arc<dyn StatementProvider>, ledger: Arc<dyn CompletionLedger>) -> Self {
        let config = CollectConfig::default();
        Self {
            provider,
            ledger,
            sink: None,
            rows: None,
            normalizer: AccountNormalizer::with_policy(config.duplicate_policy),
            config,
        }
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: CollectConfig) -> Self {
        self.normalizer = AccountNormalizer::with_policy(config.duplicate_policy);
        self.config = config;
        self
    }

    /// Archive raw payloads of successful tasks to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn RawPayloadSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Write each unit's output rows to `sink` before the unit is recorded in
    /// the ledger.
    #[must_use]
    pub fn with_row_sink(mut self, sink: Arc<dyn RowSink>) -> Self {
        self.rows = Some(sink);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CollectConfig {
        &self.config
    }

    /// Collects one task.
    ///
    /// The task's scope is tried first. An empty consolidated result falls back
    /// to the separate statement; a provider error is final for the task.
    pub async fn collect_single(&self, task: &CollectionTask) -> CollectionResult {
        let primary = task.scope;
        let items = match self.fetch(task, primary).await {
            Ok(items) => items,
            Err(e) => return failed(primary, &e),
        };
        if !items.is_empty() {
            return self.success(items, primary);
        }

        let Some(fallback) = primary.fallback() else {
            debug!(task = %task, "No data filed");
            return CollectionResult::NoData;
        };

        warn!(task = %task, "No {} data, retrying with {}", primary, fallback);
        match self.fetch(task, fallback).await {
            Ok(items) if items.is_empty() => {
                debug!(task = %task, "No data filed in any scope");
                CollectionResult::NoData
            }
            Ok(items) => self.success(items, fallback),
            Err(e) => failed(fallback, &e),
        }
    }

    async fn fetch(&self, task: &CollectionTask, scope: StatementScope) -> Result<Vec<RawLineItem>> {
        let result = self
            .provider
            .fetch_statements(&task.company_id, task.year, task.quarter, scope)
            .await;
        if let Err(e) = &result {
            warn!(
                provider = self.provider.name(),
                task = %task,
                scope = %scope,
                transport = e.is_transport(),
                error = %e,
                "Fetch failed"
            );
        }
        result
    }

    fn success(&self, raw_payload: Vec<RawLineItem>, scope_used: StatementScope) -> CollectionResult {
        let normalized = self.normalizer.normalize(&raw_payload);
        let ratios = compute_all_ratios(&normalized);
        CollectionResult::Success {
            ratios,
            normalized,
            scope_used,
            raw_payload,
        }
    }

    /// Collects a whole batch sequentially.
    ///
    /// Units already in the ledger are skipped without network calls. A
    /// `(company, year)` unit is recorded once all of its tasks finished, none
    /// failed and its rows reached the row sink. Task failures never abort the
    /// batch.
    ///
    /// # Errors
    /// Returns an error only if the batch itself is invalid (see
    /// [`BatchSpec::validate`]).
    pub async fn collect_batch(&self, batch: &BatchSpec) -> Result<BatchSummary> {
        batch.validate()?;

        let total = batch.tasks(self.config.scope).len();
        let mut pacer = Pacer::new(self.config.delay);
        let mut summary = BatchSummary {
            reports: Vec::with_capacity(total),
            ..BatchSummary::default()
        };

        info!(
            provider = self.provider.name(),
            companies = batch.companies.len(),
            tasks = total,
            "Starting batch"
        );

        for company in &batch.companies {
            for year in batch.years_for(company) {
                self.collect_unit(batch, company, year, total, &mut pacer, &mut summary)
                    .await;
            }
        }

        let BatchCounts {
            success,
            no_data,
            failed,
            skipped,
        } = summary.counts;
        info!(success, no_data, failed, skipped, "Batch complete");
        for report in summary.failures() {
            if let Some((scope, reason)) = report.failure() {
                warn!(task = %report.task, scope = %scope, reason, "Task failed");
            }
        }

        Ok(summary)
    }

    async fn collect_unit(
        &self,
        batch: &BatchSpec,
        company: &Company,
        year: i32,
        total: usize,
        pacer: &mut Pacer,
        summary: &mut BatchSummary,
    ) {
        let completed = match self.ledger.contains(&company.id, year).await {
            Ok(found) => found,
            Err(e) => {
                warn!(company = %company.id, year, error = %e, "Ledger lookup failed, collecting unit");
                false
            }
        };

        let mut any_failed = false;
        let mut unit_rows = Vec::new();
        for quarter in &batch.quarters {
            let task = CollectionTask::new(company.id.clone(), year, *quarter, self.config.scope);
            let done = summary.counts.total() + 1;

            let outcome = if completed {
                debug!(task = %task, "Already in ledger, skipping");
                TaskOutcome::Skipped
            } else {
                pacer.wait().await;
                info!(
                    "[{}/{}] {} {}-{}",
                    done,
                    total,
                    company.display_name(),
                    year,
                    quarter
                );
                let result = self.collect_single(&task).await;
                any_failed |= result.is_failed();
                self.archive(company, &task, &result).await;
                if let Some(row) = RatioRow::from_result(company, &task, &result) {
                    unit_rows.push(row);
                }
                TaskOutcome::Collected(result)
            };

            summary.counts.add(&outcome);
            summary.reports.push(TaskReport { task, outcome });
        }

        if completed {
            return;
        }

        let written = self.emit_rows(company, year, &unit_rows).await;
        summary.rows.append(&mut unit_rows);
        if any_failed || !written {
            return;
        }
        match self.ledger.record(&company.id, year).await {
            Ok(()) => summary.ledger_delta.push((company.id.clone(), year)),
            Err(e) => warn!(company = %company.id, year, error = %e, "Failed to record ledger entry"),
        }
    }

    /// Hands a unit's rows to the row sink. Returns false if they were not written.
    async fn emit_rows(&self, company: &Company, year: i32, rows: &[RatioRow]) -> bool {
        let Some(sink) = &self.rows else {
            return true;
        };
        if rows.is_empty() {
            return true;
        }
        match sink.write_rows(rows).await {
            Ok(()) => true,
            Err(e) => {
                warn!(company = %company.id, year, error = %e, "Failed to write rows, unit stays open");
                false
            }
        }
    }

    async fn archive(&self, company: &Company, task: &CollectionTask, result: &CollectionResult) {
        let (Some(sink), CollectionResult::Success {
            scope_used,
            raw_payload,
            ..
        }) = (&self.sink, result)
        else {
            return;
        };

        if let Err(e) = sink
            .store(task, &company.sector, *scope_used, raw_payload)
            .await
        {
            warn!(task = %task, error = %e, "Failed to archive raw payload");
        }
    }
}
