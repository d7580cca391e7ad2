//! Batch input and per-task outcomes.

use finratio_calc::{NormalizedPeriod, RatioSet};
use finratio_core::{
    CollectError, CollectionTask, Company, CompanyId, Quarter, RawLineItem, Result,
    StatementScope,
};

use crate::output::RatioRow;

/// Companies, years and quarters to collect.
///
/// Tasks are enumerated company-major, then year, then quarter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchSpec {
    /// Companies in collection order.
    pub companies: Vec<Company>,
    /// Default years, used for companies without their own range.
    pub years: Vec<i32>,
    /// Reports to collect within each year.
    pub quarters: Vec<Quarter>,
}

impl BatchSpec {
    /// Create a batch over all four reports with no default years.
    #[must_use]
    pub fn new(companies: Vec<Company>) -> Self {
        Self {
            companies,
            years: Vec::new(),
            quarters: Quarter::ALL.to_vec(),
        }
    }

    /// Set the default years.
    #[must_use]
    pub fn with_years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    /// Set the reports to collect.
    #[must_use]
    pub fn with_quarters(mut self, quarters: impl IntoIterator<Item = Quarter>) -> Self {
        self.quarters = quarters.into_iter().collect();
        self
    }

    /// Returns the years to collect for `company`.
    #[must_use]
    pub fn years_for(&self, company: &Company) -> Vec<i32> {
        match company.years {
            Some(range) => range.years().collect(),
            None => self.years.clone(),
        }
    }

    /// Expands the batch into tasks in execution order.
    #[must_use]
    pub fn tasks(&self, scope: StatementScope) -> Vec<CollectionTask> {
        let mut tasks = Vec::new();
        for company in &self.companies {
            for year in self.years_for(company) {
                for quarter in &self.quarters {
                    tasks.push(CollectionTask::new(company.id.clone(), year, *quarter, scope));
                }
            }
        }
        tasks
    }

    /// Checks the batch can run at all.
    ///
    /// # Errors
    /// Returns [`CollectError::InvalidParameter`] when there are no companies or
    /// no quarters.
    pub fn validate(&self) -> Result<()> {
        if self.companies.is_empty() {
            return Err(CollectError::InvalidParameter(
                "No companies to collect".to_string(),
            ));
        }
        if self.quarters.is_empty() {
            return Err(CollectError::InvalidParameter(
                "No quarters to collect".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of fetching one task.
#[derive(Clone, Debug, PartialEq)]
pub enum CollectionResult {
    /// Statements were found and ratios computed.
    Success {
        /// Computed ratios.
        ratios: RatioSet,
        /// Normalized line items the ratios were computed from.
        normalized: NormalizedPeriod,
        /// Scope that produced the data.
        scope_used: StatementScope,
        /// Raw items as returned by the provider.
        raw_payload: Vec<RawLineItem>,
    },
    /// Neither scope had any filed data.
    NoData,
    /// The provider failed; no fallback was attempted.
    Failed {
        /// Scope of the failed request.
        scope: StatementScope,
        /// Error message.
        reason: String,
    },
}

impl CollectionResult {
    /// Returns true for [`CollectionResult::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns the ratios, if any were computed.
    #[must_use]
    pub const fn ratios(&self) -> Option<&RatioSet> {
        match self {
            Self::Success { ratios, .. } => Some(ratios),
            _ => None,
        }
    }

    /// Returns the scope that produced data.
    #[must_use]
    pub const fn scope_used(&self) -> Option<StatementScope> {
        match self {
            Self::Success { scope_used, .. } => Some(*scope_used),
            _ => None,
        }
    }
}

/// What happened to one task of a batch.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskOutcome {
    /// The task was executed.
    Collected(CollectionResult),
    /// The `(company, year)` unit was already in the ledger.
    Skipped,
}

/// One task with its outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskReport {
    /// The task.
    pub task: CollectionTask,
    /// Its outcome.
    pub outcome: TaskOutcome,
}

impl TaskReport {
    /// Returns the failure reason, if the task failed.
    #[must_use]
    pub fn failure(&self) -> Option<(StatementScope, &str)> {
        match &self.outcome {
            TaskOutcome::Collected(CollectionResult::Failed { scope, reason }) => {
                Some((*scope, reason.as_str()))
            }
            _ => None,
        }
    }
}

/// Aggregate task counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchCounts {
    /// Tasks with data.
    pub success: usize,
    /// Tasks with no filed data in either scope.
    pub no_data: usize,
    /// Tasks whose provider call failed.
    pub failed: usize,
    /// Tasks skipped through the ledger.
    pub skipped: usize,
}

impl BatchCounts {
    /// Counts one outcome.
    pub const fn add(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Collected(CollectionResult::Success { .. }) => self.success += 1,
            TaskOutcome::Collected(CollectionResult::NoData) => self.no_data += 1,
            TaskOutcome::Collected(CollectionResult::Failed { .. }) => self.failed += 1,
            TaskOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Returns the number of counted tasks.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.success + self.no_data + self.failed + self.skipped
    }
}

/// Result of a whole batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchSummary {
    /// Every task in execution order.
    pub reports: Vec<TaskReport>,
    /// Aggregate counts.
    pub counts: BatchCounts,
    /// Units newly recorded in the ledger by this run.
    pub ledger_delta: Vec<(CompanyId, i32)>,
    /// Output rows for successful and no-data tasks.
    pub rows: Vec<RatioRow>,
}

impl BatchSummary {
    /// Returns the reports of failed tasks.
    pub fn failures(&self) -> impl Iterator<Item = &TaskReport> {
        self.reports.iter().filter(|r| r.failure().is_some())
    }
}
