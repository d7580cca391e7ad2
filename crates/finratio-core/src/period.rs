//! Reporting period, statement scope and statement type definitions.
//!
//! This module defines [`Quarter`] for the four periodic reports filed each year,
//! [`StatementScope`] for consolidated vs. separate statements, and
//! [`StatementType`] for the statement a line item belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CollectError;

/// Periodic report within a business year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    /// First-quarter report.
    #[serde(rename = "Q1")]
    Q1,
    /// Half-year report.
    #[serde(rename = "H1")]
    H1,
    /// Third-quarter report.
    #[serde(rename = "Q3")]
    Q3,
    /// Annual business report.
    #[serde(rename = "ANNUAL")]
    Annual,
}

impl Quarter {
    /// All reports in filing order.
    pub const ALL: [Self; 4] = [Self::Q1, Self::H1, Self::Q3, Self::Annual];

    /// Returns the label used in output rows and file names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::H1 => "H1",
            Self::Q3 => "Q3",
            Self::Annual => "ANNUAL",
        }
    }

    /// Returns the OpenDART report code (`reprt_code`) for this report.
    #[must_use]
    pub const fn report_code(&self) -> &'static str {
        match self {
            Self::Q1 => "11013",
            Self::H1 => "11012",
            Self::Q3 => "11014",
            Self::Annual => "11011",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quarter {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "Q1" => Ok(Self::Q1),
            "H1" => Ok(Self::H1),
            "Q3" => Ok(Self::Q3),
            "ANNUAL" | "Q4" => Ok(Self::Annual),
            other => Err(CollectError::InvalidParameter(format!(
                "Invalid quarter: {other} (expected Q1, H1, Q3, ANNUAL)"
            ))),
        }
    }
}

/// Consolidated vs. separate financial statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementScope {
    /// Consolidated financial statement (CFS). Primary attempt.
    #[default]
    #[serde(rename = "CFS")]
    Consolidated,
    /// Separate financial statement (OFS). Fallback when no CFS was filed.
    #[serde(rename = "OFS")]
    Separate,
}

impl StatementScope {
    /// Returns the OpenDART `fs_div` code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Consolidated => "CFS",
            Self::Separate => "OFS",
        }
    }

    /// Returns the scope to retry with when this scope has no filed data.
    #[must_use]
    pub const fn fallback(&self) -> Option<Self> {
        match self {
            Self::Consolidated => Some(Self::Separate),
            Self::Separate => None,
        }
    }
}

impl fmt::Display for StatementScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementScope {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CFS" => Ok(Self::Consolidated),
            "OFS" => Ok(Self::Separate),
            other => Err(CollectError::InvalidParameter(format!(
                "Invalid statement scope: {other} (expected CFS or OFS)"
            ))),
        }
    }
}

/// Financial statement a line item is reported on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    /// Statement of financial position.
    BalanceSheet,
    /// Income statement, including the comprehensive income statement.
    IncomeStatement,
    /// Cash flow statement.
    CashFlow,
}

impl StatementType {
    /// Returns a short code for this statement type.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "BS",
            Self::IncomeStatement => "IS",
            Self::CashFlow => "CF",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
