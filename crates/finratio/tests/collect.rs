//! End-to-end batch behaviour against a scripted provider.

use async_trait::async_trait;
use finratio::{
    BatchSpec, CollectConfig, CollectError, CollectionResult, Collector, Company, CompanyId,
    CompletionLedger, CsvFileSink, InMemoryLedger, JsonDirSink, Quarter, Ratio, RatioRow,
    RawLineItem, Result, RowSink, SqliteLedger, StatementProvider, StatementScope, StatementType,
    TaskOutcome, write_csv,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type Key = (String, i32, Quarter, StatementScope);

/// Answers from a script; unscripted requests return no data.
#[derive(Debug, Default)]
struct ScriptedProvider {
    data: HashMap<Key, Vec<RawLineItem>>,
    failures: HashMap<Key, String>,
    stall_from: Option<usize>,
    calls: Mutex<Vec<Key>>,
}

impl ScriptedProvider {
    fn with_data(
        mut self,
        company: &str,
        year: i32,
        quarter: Quarter,
        scope: StatementScope,
        items: Vec<RawLineItem>,
    ) -> Self {
        self.data
            .insert((company.to_string(), year, quarter, scope), items);
        self
    }

    fn with_failure(
        mut self,
        company: &str,
        year: i32,
        quarter: Quarter,
        scope: StatementScope,
    ) -> Self {
        self.failures.insert(
            (company.to_string(), year, quarter, scope),
            "connection reset by peer".to_string(),
        );
        self
    }

    /// Never answers the `n`th call (0-based) or any later one.
    fn stalling_from(mut self, n: usize) -> Self {
        self.stall_from = Some(n);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn calls(&self) -> Vec<Key> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatementProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_statements(
        &self,
        company: &CompanyId,
        year: i32,
        quarter: Quarter,
        scope: StatementScope,
    ) -> Result<Vec<RawLineItem>> {
        let key = (company.as_str().to_string(), year, quarter, scope);
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(key.clone());
            calls.len() - 1
        };
        if self.stall_from.is_some_and(|n| index >= n) {
            std::future::pending::<()>().await;
        }
        if let Some(reason) = self.failures.get(&key) {
            return Err(CollectError::Network(reason.clone()));
        }
        Ok(self.data.get(&key).cloned().unwrap_or_default())
    }
}

fn statement() -> Vec<RawLineItem> {
    vec![
        RawLineItem::new("자산총계", StatementType::BalanceSheet).with_current("500000000"),
        RawLineItem::new("매출액", StatementType::IncomeStatement)
            .with_current("100000000")
            .with_prior("80000000"),
    ]
}

/// Keeps every row it is given.
#[derive(Debug, Default)]
struct CollectedRows(Mutex<Vec<RatioRow>>);

impl CollectedRows {
    fn companies(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.company_id.clone())
            .collect()
    }
}

#[async_trait]
impl RowSink for CollectedRows {
    async fn write_rows(&self, rows: &[RatioRow]) -> Result<()> {
        self.0.lock().unwrap().extend_from_slice(rows);
        Ok(())
    }
}

/// Rejects every write.
#[derive(Debug)]
struct BrokenRows;

#[async_trait]
impl RowSink for BrokenRows {
    async fn write_rows(&self, _rows: &[RatioRow]) -> Result<()> {
        Err(CollectError::Sink("disk full".to_string()))
    }
}

fn fast() -> CollectConfig {
    CollectConfig::default().with_delay(Duration::ZERO)
}

fn collector(provider: &Arc<ScriptedProvider>, ledger: Arc<dyn CompletionLedger>) -> Collector {
    Collector::new(provider.clone(), ledger).with_config(fast())
}

#[tokio::test]
async fn test_end_to_end_single_quarter() {
    let provider = Arc::new(ScriptedProvider::default().with_data(
        "019440",
        2023,
        Quarter::Q1,
        StatementScope::Consolidated,
        statement(),
    ));
    let collector = collector(&provider, Arc::new(InMemoryLedger::new()));
    let batch = BatchSpec::new(vec![Company::new("019440").with_name("세아특수강")])
        .with_years([2023])
        .with_quarters([Quarter::Q1]);

    let summary = collector.collect_batch(&batch).await.unwrap();

    assert_eq!(summary.counts.success, 1);
    assert_eq!(summary.rows.len(), 1);
    let row = &summary.rows[0];
    assert_eq!(row.company_id, "019440");
    assert_eq!(row.scope, Some(StatementScope::Consolidated));
    assert_eq!(row.ratios.get(Ratio::RevenueGrowth), Some(25.0));
    assert_eq!(row.ratios.get(Ratio::NetProfitMargin), None);
    assert_eq!(row.ratios.get(Ratio::NetIncomeGrowth), None);

    let TaskOutcome::Collected(CollectionResult::Success { normalized, .. }) =
        &summary.reports[0].outcome
    else {
        panic!("expected success");
    };
    assert_eq!(
        normalized.current(finratio::CanonicalKey::TotalAssets),
        Some(5e8)
    );
    assert_eq!(normalized.prior(finratio::CanonicalKey::Revenue), Some(8e7));

    let mut csv = Vec::new();
    write_csv(&summary.rows, &mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.lines().nth(1).unwrap().starts_with("019440,세아특수강,2023,Q1,"));
}

#[tokio::test]
async fn test_fallback_to_separate_statement() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_data("A", 2023, Quarter::Q1, StatementScope::Separate, statement())
            .with_data("A", 2023, Quarter::H1, StatementScope::Consolidated, statement())
            .with_data("A", 2023, Quarter::H1, StatementScope::Separate, statement()),
    );
    let collector = collector(&provider, Arc::new(InMemoryLedger::new()));
    let batch = BatchSpec::new(vec![Company::new("A")])
        .with_years([2023])
        .with_quarters([Quarter::Q1, Quarter::H1]);

    let summary = collector.collect_batch(&batch).await.unwrap();

    assert_eq!(summary.rows[0].scope, Some(StatementScope::Separate));
    assert_eq!(summary.rows[1].scope, Some(StatementScope::Consolidated));
    assert_eq!(
        provider.calls(),
        vec![
            ("A".to_string(), 2023, Quarter::Q1, StatementScope::Consolidated),
            ("A".to_string(), 2023, Quarter::Q1, StatementScope::Separate),
            ("A".to_string(), 2023, Quarter::H1, StatementScope::Consolidated),
        ]
    );
}

#[tokio::test]
async fn test_no_data_rows_have_empty_ratios() {
    let provider = Arc::new(ScriptedProvider::default());
    let collector = collector(&provider, Arc::new(InMemoryLedger::new()));
    let batch = BatchSpec::new(vec![Company::new("A")])
        .with_years([2023])
        .with_quarters([Quarter::Annual]);

    let summary = collector.collect_batch(&batch).await.unwrap();

    assert_eq!(summary.counts.no_data, 1);
    assert_eq!(summary.rows.len(), 1);
    assert_eq!(summary.rows[0].scope, None);
    assert_eq!(summary.rows[0].ratios.present_count(), 0);
    // CFS then OFS
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_pacing_between_tasks() {
    let provider = Arc::new(ScriptedProvider::default());
    let delay = Duration::from_millis(30);
    let collector = Collector::new(provider.clone(), Arc::new(InMemoryLedger::new()))
        .with_config(CollectConfig::default().with_delay(delay));
    let batch = BatchSpec::new(vec![Company::new("A")]).with_years([2023]);

    let start = Instant::now();
    let summary = collector.collect_batch(&batch).await.unwrap();

    assert_eq!(summary.counts.total(), 4);
    assert!(start.elapsed() >= delay * 3);
}

#[tokio::test(start_paused = true)]
async fn test_pacing_spans_companies_and_ignores_skipped_units() {
    let provider = Arc::new(ScriptedProvider::default());
    let ledger = Arc::new(InMemoryLedger::with_entries([(CompanyId::new("S"), 2023)]));
    let delay = Duration::from_millis(500);
    let collector = Collector::new(provider.clone(), ledger)
        .with_config(CollectConfig::default().with_delay(delay));
    let batch = BatchSpec::new(vec![
        Company::new("A"),
        Company::new("S"),
        Company::new("B"),
        Company::new("C"),
    ])
    .with_years([2023])
    .with_quarters([Quarter::Q1]);

    let start = tokio::time::Instant::now();
    let summary = collector.collect_batch(&batch).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(summary.counts.skipped, 1);
    let companies: Vec<String> = provider.calls().into_iter().map(|k| k.0).collect();
    assert_eq!(companies.iter().filter(|c| c.as_str() == "S").count(), 0);
    assert!(elapsed >= delay * 2);
    assert!(elapsed < delay * 3);
}

#[tokio::test]
async fn test_interrupted_run_loses_no_rows_on_resume() {
    let ledger = Arc::new(InMemoryLedger::new());
    let rows = Arc::new(CollectedRows::default());
    let batch = BatchSpec::new(vec![Company::new("A"), Company::new("B")])
        .with_years([2023])
        .with_quarters([Quarter::Q1]);
    let scripted = || {
        ScriptedProvider::default()
            .with_data("A", 2023, Quarter::Q1, StatementScope::Consolidated, statement())
            .with_data("B", 2023, Quarter::Q1, StatementScope::Consolidated, statement())
    };

    // The first run stops answering during company B and is abandoned.
    let stalled = Arc::new(scripted().stalling_from(1));
    let first = collector(&stalled, ledger.clone()).with_row_sink(rows.clone());
    let interrupted =
        tokio::time::timeout(Duration::from_millis(200), first.collect_batch(&batch)).await;
    assert!(interrupted.is_err());
    assert!(ledger.contains(&CompanyId::new("A"), 2023).await.unwrap());
    assert_eq!(rows.companies(), vec!["A"]);

    let healthy = Arc::new(scripted());
    let second = collector(&healthy, ledger.clone())
        .with_row_sink(rows.clone())
        .collect_batch(&batch)
        .await
        .unwrap();

    assert_eq!(second.counts.skipped, 1);
    assert_eq!(healthy.call_count(), 1);
    assert_eq!(rows.companies(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_rows_reach_csv_before_ledger_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ratios.csv");
    let provider = Arc::new(ScriptedProvider::default().with_data(
        "A",
        2023,
        Quarter::Q1,
        StatementScope::Consolidated,
        statement(),
    ));
    let batch = BatchSpec::new(vec![Company::new("A"), Company::new("B")])
        .with_years([2023])
        .with_quarters([Quarter::Q1]);

    collector(&provider, Arc::new(InMemoryLedger::new()))
        .with_row_sink(Arc::new(CsvFileSink::new(&path)))
        .collect_batch(&batch)
        .await
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("A,"));
    assert!(lines[2].starts_with("B,"));
}

#[tokio::test]
async fn test_unwritten_rows_keep_unit_open() {
    let provider = Arc::new(ScriptedProvider::default().with_data(
        "A",
        2023,
        Quarter::Q1,
        StatementScope::Consolidated,
        statement(),
    ));
    let ledger = Arc::new(InMemoryLedger::new());
    let batch = BatchSpec::new(vec![Company::new("A")])
        .with_years([2023])
        .with_quarters([Quarter::Q1]);

    let summary = collector(&provider, ledger.clone())
        .with_row_sink(Arc::new(BrokenRows))
        .collect_batch(&batch)
        .await
        .unwrap();

    assert_eq!(summary.counts.success, 1);
    assert_eq!(summary.rows.len(), 1);
    assert!(summary.ledger_delta.is_empty());
    assert!(!ledger.contains(&CompanyId::new("A"), 2023).await.unwrap());
}

#[tokio::test]
async fn test_rerun_with_same_ledger_makes_no_calls() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_data("A", 2022, Quarter::Q1, StatementScope::Consolidated, statement())
            .with_data("B", 2022, Quarter::Q1, StatementScope::Consolidated, statement()),
    );
    let ledger = Arc::new(InMemoryLedger::new());
    let batch = BatchSpec::new(vec![Company::new("A"), Company::new("B")]).with_years([2022, 2023]);

    let first = collector(&provider, ledger.clone())
        .collect_batch(&batch)
        .await
        .unwrap();
    assert_eq!(first.counts.skipped, 0);
    assert_eq!(first.ledger_delta.len(), 4);
    let calls_after_first = provider.call_count();
    assert!(calls_after_first > 0);

    let second = collector(&provider, ledger.clone())
        .collect_batch(&batch)
        .await
        .unwrap();
    assert_eq!(provider.call_count(), calls_after_first);
    assert_eq!(second.counts.skipped, 16);
    assert!(second.rows.is_empty());
    assert!(second.ledger_delta.is_empty());
    assert!(
        second
            .reports
            .iter()
            .all(|r| r.outcome == TaskOutcome::Skipped)
    );
}

#[tokio::test]
async fn test_resume_from_sqlite_ledger_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let provider = Arc::new(ScriptedProvider::default());
    let batch = BatchSpec::new(vec![Company::new("A")]).with_years([2023]);

    {
        let ledger = Arc::new(SqliteLedger::new(&path).unwrap());
        collector(&provider, ledger).collect_batch(&batch).await.unwrap();
    }
    let calls = provider.call_count();

    let ledger = Arc::new(SqliteLedger::new(&path).unwrap());
    let summary = collector(&provider, ledger).collect_batch(&batch).await.unwrap();
    assert_eq!(provider.call_count(), calls);
    assert_eq!(summary.counts.skipped, 4);
}

#[tokio::test]
async fn test_failure_is_isolated_and_not_recorded() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_failure("A", 2023, Quarter::H1, StatementScope::Consolidated)
            .with_data("A", 2023, Quarter::Q3, StatementScope::Consolidated, statement())
            .with_data("B", 2023, Quarter::Q1, StatementScope::Consolidated, statement()),
    );
    let ledger = Arc::new(InMemoryLedger::new());
    let batch = BatchSpec::new(vec![Company::new("A"), Company::new("B")]).with_years([2023]);

    let summary = collector(&provider, ledger.clone())
        .collect_batch(&batch)
        .await
        .unwrap();

    assert_eq!(summary.counts.failed, 1);
    assert_eq!(summary.counts.total(), 8);
    // Failed tasks produce no row
    assert_eq!(summary.rows.len(), 7);

    let failures: Vec<_> = summary.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].task.quarter, Quarter::H1);
    let (scope, reason) = failures[0].failure().unwrap();
    assert_eq!(scope, StatementScope::Consolidated);
    assert!(reason.contains("connection reset"));

    // No fallback after a failure
    assert!(!provider.calls().contains(&(
        "A".to_string(),
        2023,
        Quarter::H1,
        StatementScope::Separate
    )));

    assert_eq!(summary.ledger_delta, vec![(CompanyId::new("B"), 2023)]);
    assert!(!ledger.contains(&CompanyId::new("A"), 2023).await.unwrap());
    assert!(ledger.contains(&CompanyId::new("B"), 2023).await.unwrap());
}

#[tokio::test]
async fn test_company_year_range_supersedes_batch_years() {
    let provider = Arc::new(ScriptedProvider::default());
    let company = Company::new("A").with_years(finratio::YearRange::new(2020, 2021).unwrap());
    let batch = BatchSpec::new(vec![company])
        .with_years([2023])
        .with_quarters([Quarter::Annual]);

    let summary = collector(&provider, Arc::new(InMemoryLedger::new()))
        .collect_batch(&batch)
        .await
        .unwrap();

    let years: Vec<i32> = summary.reports.iter().map(|r| r.task.year).collect();
    assert_eq!(years, vec![2020, 2021]);
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let provider = Arc::new(ScriptedProvider::default());
    let result = collector(&provider, Arc::new(InMemoryLedger::new()))
        .collect_batch(&BatchSpec::new(Vec::new()))
        .await;
    assert!(matches!(result, Err(CollectError::InvalidParameter(_))));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_raw_payload_is_archived_under_scope_used() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::default().with_data(
        "A",
        2023,
        Quarter::Q1,
        StatementScope::Separate,
        statement(),
    ));
    let collector = collector(&provider, Arc::new(InMemoryLedger::new()))
        .with_sink(Arc::new(JsonDirSink::new(dir.path())));
    let batch = BatchSpec::new(vec![Company::new("A").with_sector("Materials")])
        .with_years([2023])
        .with_quarters([Quarter::Q1]);

    collector.collect_batch(&batch).await.unwrap();

    let path = dir.path().join("Materials").join("A_2023_Q1_OFS.json");
    let stored: Vec<RawLineItem> =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(stored, statement());
}
