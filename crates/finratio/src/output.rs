//! Output rows, their CSV and DataFrame renderings, and the raw JSON archive.

use async_trait::async_trait;
use finratio_calc::{Ratio, RatioSet};
use finratio_core::{
    CollectError, CollectionTask, Company, Quarter, RawLineItem, RawPayloadSink, Result,
    StatementScope,
};
use polars::prelude::{Column, DataFrame};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::batch::CollectionResult;

/// Leading CSV columns, before the ratio columns.
pub const ID_COLUMNS: [&str; 7] = [
    "company_id",
    "corp_name",
    "year",
    "quarter",
    "label",
    "sector",
    "scope",
];

/// One output row: a company-quarter with its 30 ratios.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatioRow {
    /// Company identifier as given in the batch.
    pub company_id: String,
    /// Company name.
    pub corp_name: String,
    /// Business year.
    pub year: i32,
    /// Report within the year.
    pub quarter: Quarter,
    /// Opaque classification label.
    pub label: String,
    /// Opaque sector tag.
    pub sector: String,
    /// Scope that produced the data; `None` when nothing was filed.
    pub scope: Option<StatementScope>,
    /// Ratio values.
    pub ratios: RatioSet,
}

impl RatioRow {
    /// Builds the row for a task result.
    ///
    /// Returns `None` for failed tasks, which produce no row. No-data tasks
    /// produce a row with every ratio missing.
    #[must_use]
    pub fn from_result(
        company: &Company,
        task: &CollectionTask,
        result: &CollectionResult,
    ) -> Option<Self> {
        let (scope, ratios) = match result {
            CollectionResult::Success {
                ratios, scope_used, ..
            } => (Some(*scope_used), *ratios),
            CollectionResult::NoData => (None, RatioSet::empty()),
            CollectionResult::Failed { .. } => return None,
        };

        Some(Self {
            company_id: company.id.to_string(),
            corp_name: company.corp_name.clone(),
            year: task.year,
            quarter: task.quarter,
            label: company.label.clone(),
            sector: company.sector.clone(),
            scope,
            ratios,
        })
    }

    fn record(&self) -> Vec<String> {
        let mut record = vec![
            self.company_id.clone(),
            self.corp_name.clone(),
            self.year.to_string(),
            self.quarter.to_string(),
            self.label.clone(),
            self.sector.clone(),
            self.scope.map(|s| s.to_string()).unwrap_or_default(),
        ];
        record.extend(
            self.ratios
                .iter()
                .map(|(_, v)| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        record
    }
}

/// Returns the CSV header: id columns followed by the ratio keys.
#[must_use]
pub fn csv_header() -> Vec<&'static str> {
    ID_COLUMNS
        .iter()
        .copied()
        .chain(Ratio::ALL.iter().map(Ratio::name))
        .collect()
}

/// Writes rows as CSV. Missing ratios are empty cells.
///
/// # Errors
/// Returns [`CollectError::Sink`] if writing fails.
pub fn write_csv<W: Write>(rows: &[RatioRow], writer: W) -> Result<()> {
    write_records(rows, writer, true)
}

/// UTF-8 byte order mark, so spreadsheet tools read Korean names correctly.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes rows to a CSV file, appending below existing rows if the file
/// already has content so resumed runs extend earlier output.
///
/// A new file starts with a UTF-8 byte order mark and the header.
///
/// # Errors
/// Returns an I/O error if the file cannot be opened, or a sink error.
pub fn save_csv(rows: &[RatioRow], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let has_content = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    if !has_content {
        file.write_all(UTF8_BOM)?;
    }
    write_records(rows, file, !has_content)
}

fn write_records<W: Write>(rows: &[RatioRow], writer: W, header: bool) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if header {
        csv.write_record(csv_header())
            .map_err(|e| CollectError::Sink(e.to_string()))?;
    }
    for row in rows {
        csv.write_record(row.record())
            .map_err(|e| CollectError::Sink(e.to_string()))?;
    }
    csv.flush()?;
    debug!("Wrote {} CSV rows", rows.len());
    Ok(())
}

/// Destination for output rows.
///
/// The collector hands over the rows of each `(company, year)` unit before the
/// unit is recorded in the ledger, so a resumed run never skips rows that were
/// not yet written.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Writes the rows of one unit.
    async fn write_rows(&self, rows: &[RatioRow]) -> Result<()>;
}

/// Appends rows to a CSV file as they arrive (see [`save_csv`]).
#[derive(Clone, Debug)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    /// Create a sink appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the output path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RowSink for CsvFileSink {
    async fn write_rows(&self, rows: &[RatioRow]) -> Result<()> {
        save_csv(rows, &self.path)
    }
}

/// Streams rows to stdout as CSV, with the header before the first rows.
#[derive(Debug, Default)]
pub struct CsvStdoutSink {
    header_written: AtomicBool,
}

impl CsvStdoutSink {
    /// Create a sink that has not written its header yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RowSink for CsvStdoutSink {
    async fn write_rows(&self, rows: &[RatioRow]) -> Result<()> {
        let header = !self.header_written.swap(true, Ordering::SeqCst);
        write_records(rows, std::io::stdout().lock(), header)
    }
}

/// Converts rows into a DataFrame with the same columns as the CSV.
///
/// # Errors
/// Returns [`CollectError::Sink`] if the frame cannot be built.
pub fn rows_to_dataframe(rows: &[RatioRow]) -> Result<DataFrame> {
    let text = |f: fn(&RatioRow) -> String| rows.iter().map(f).collect::<Vec<_>>();

    let mut columns = vec![
        Column::new("company_id".into(), text(|r| r.company_id.clone())),
        Column::new("corp_name".into(), text(|r| r.corp_name.clone())),
        Column::new(
            "year".into(),
            rows.iter().map(|r| r.year).collect::<Vec<i32>>(),
        ),
        Column::new("quarter".into(), text(|r| r.quarter.to_string())),
        Column::new("label".into(), text(|r| r.label.clone())),
        Column::new("sector".into(), text(|r| r.sector.clone())),
        Column::new(
            "scope".into(),
            rows.iter()
                .map(|r| r.scope.map(|s| s.as_str()))
                .collect::<Vec<Option<&str>>>(),
        ),
    ];

    for ratio in Ratio::ALL {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.ratios.get(ratio)).collect();
        columns.push(Column::new(ratio.name().into(), values));
    }

    DataFrame::new(columns).map_err(|e| CollectError::Sink(e.to_string()))
}

/// Archives raw line items as pretty JSON files.
///
/// Files are laid out as `<root>/<sector>/<company>_<year>_<quarter>_<scope>.json`;
/// the sector directory is omitted when the company has no sector.
#[derive(Clone, Debug)]
pub struct JsonDirSink {
    root: PathBuf,
}

impl JsonDirSink {
    /// Create a sink writing under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the archive path for a task.
    #[must_use]
    pub fn path_for(&self, task: &CollectionTask, sector: &str, scope: StatementScope) -> PathBuf {
        let mut path = self.root.clone();
        let sector = sanitize(sector);
        if !sector.is_empty() {
            path.push(sector);
        }
        path.push(format!(
            "{}_{}_{}_{}.json",
            sanitize(task.company_id.as_str()),
            task.year,
            task.quarter,
            scope
        ));
        path
    }
}

/// Keeps a path component from escaping its directory.
fn sanitize(component: &str) -> String {
    component
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

#[async_trait]
impl RawPayloadSink for JsonDirSink {
    async fn store(
        &self,
        task: &CollectionTask,
        sector: &str,
        scope: StatementScope,
        items: &[RawLineItem],
    ) -> Result<()> {
        let path = self.path_for(task, sector, scope);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json =
            serde_json::to_vec_pretty(items).map_err(|e| CollectError::Sink(e.to_string()))?;
        tokio::fs::write(&path, json).await?;

        debug!(path = %path.display(), items = items.len(), "Archived raw payload");
        Ok(())
    }
}
