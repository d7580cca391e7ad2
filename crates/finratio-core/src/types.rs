//! Core data types for statement collection.
//!
//! This module defines the fundamental data structures:
//!
//! - [`CompanyId`] - Identifier a statement provider understands
//! - [`RawLineItem`] - One raw statement line as the provider returned it
//! - [`YearRange`] - Inclusive range of business years
//! - [`Company`] - A company in a batch, with pass-through labels
//! - [`CollectionTask`] - One company × year × quarter unit of work

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CollectError;
use crate::period::{Quarter, StatementScope, StatementType};

/// Identifier of a company at the statement provider.
///
/// Surrounding whitespace is trimmed on creation; the value is otherwise opaque.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompanyId(String);

impl CompanyId {
    /// Creates a new company identifier.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompanyId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for CompanyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CompanyId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A raw statement line item.
///
/// Amounts are kept exactly as the provider formatted them (thousands separators,
/// optional sign, `-` for blank); parsing happens during normalization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLineItem {
    /// Account name as filed, e.g. `자산총계`.
    pub account_name: String,
    /// Statement this line belongs to.
    pub statement_type: StatementType,
    /// Current-period amount.
    pub current_amount: Option<String>,
    /// Prior-period amount.
    pub prior_amount: Option<String>,
    /// Amount two periods back.
    pub prior_prior_amount: Option<String>,
}

impl RawLineItem {
    /// Creates a line item without amounts.
    #[must_use]
    pub fn new(account_name: impl Into<String>, statement_type: StatementType) -> Self {
        Self {
            account_name: account_name.into(),
            statement_type,
            current_amount: None,
            prior_amount: None,
            prior_prior_amount: None,
        }
    }

    /// Sets the current-period amount.
    #[must_use]
    pub fn with_current(mut self, amount: impl Into<String>) -> Self {
        self.current_amount = Some(amount.into());
        self
    }

    /// Sets the prior-period amount.
    #[must_use]
    pub fn with_prior(mut self, amount: impl Into<String>) -> Self {
        self.prior_amount = Some(amount.into());
        self
    }

    /// Sets the amount two periods back.
    #[must_use]
    pub fn with_prior_prior(mut self, amount: impl Into<String>) -> Self {
        self.prior_prior_amount = Some(amount.into());
        self
    }
}

/// Inclusive range of business years.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    /// First year, inclusive.
    pub start: i32,
    /// Last year, inclusive.
    pub end: i32,
}

impl YearRange {
    /// Creates a year range.
    ///
    /// # Errors
    /// Returns [`CollectError::InvalidParameter`] if `start` is after `end`.
    pub fn new(start: i32, end: i32) -> Result<Self, CollectError> {
        if start > end {
            return Err(CollectError::InvalidParameter(format!(
                "Invalid year range: {start} is after {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Returns the years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

/// A company to collect, as listed in a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Provider identifier (stock code or provider-native code).
    pub id: CompanyId,
    /// Display name.
    pub corp_name: String,
    /// Opaque classification label, passed through to output rows.
    pub label: String,
    /// Opaque sector tag, passed through to output rows and archive paths.
    pub sector: String,
    /// Years for this company; supersedes the batch-level year list.
    pub years: Option<YearRange>,
}

impl Company {
    /// Creates a company with only an identifier.
    #[must_use]
    pub fn new(id: impl Into<CompanyId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, corp_name: impl Into<String>) -> Self {
        self.corp_name = corp_name.into();
        self
    }

    /// Sets the classification label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the sector tag.
    #[must_use]
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = sector.into();
        self
    }

    /// Sets a per-company year range.
    #[must_use]
    pub const fn with_years(mut self, years: YearRange) -> Self {
        self.years = Some(years);
        self
    }

    /// Returns the name to show in progress output.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.corp_name.is_empty() {
            self.id.as_str()
        } else {
            &self.corp_name
        }
    }
}

/// One unit of collection work.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionTask {
    /// Company to fetch.
    pub company_id: CompanyId,
    /// Business year.
    pub year: i32,
    /// Report within the year.
    pub quarter: Quarter,
    /// Primary statement scope to request.
    pub scope: StatementScope,
}

impl CollectionTask {
    /// Creates a new task.
    #[must_use]
    pub const fn new(
        company_id: CompanyId,
        year: i32,
        quarter: Quarter,
        scope: StatementScope,
    ) -> Self {
        Self {
            company_id,
            year,
            quarter,
            scope,
        }
    }
}

impl fmt::Display for CollectionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} ({})",
            self.company_id, self.year, self.quarter, self.scope
        )
    }
}
