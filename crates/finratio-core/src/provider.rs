//! Provider trait for fetching raw financial statements.
//!
//! A [`StatementProvider`] is the transport seam of the collector: it returns the raw
//! line items of one periodic report for one company and statement scope.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    period::{Quarter, StatementScope},
    types::{CompanyId, RawLineItem},
};

/// Source of raw financial statement line items.
///
/// Implementations must distinguish "nothing filed" from failure: a scope with no
/// filed statement returns `Ok(vec![])`, while network, authorization and malformed
/// response problems return an error.
#[async_trait]
pub trait StatementProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "OpenDART").
    fn name(&self) -> &str;

    /// Fetches every line item of one report.
    ///
    /// # Arguments
    ///
    /// * `company` - Company identifier
    /// * `year` - Business year
    /// * `quarter` - Periodic report within the year
    /// * `scope` - Consolidated or separate statement
    async fn fetch_statements(
        &self,
        company: &CompanyId,
        year: i32,
        quarter: Quarter,
        scope: StatementScope,
    ) -> Result<Vec<RawLineItem>>;
}
