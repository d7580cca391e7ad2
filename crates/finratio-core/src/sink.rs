//! Archive sink for raw statement payloads.

use async_trait::async_trait;

use crate::{
    error::Result,
    period::StatementScope,
    types::{CollectionTask, RawLineItem},
};

/// Optional destination for the raw line items behind each successful task.
#[async_trait]
pub trait RawPayloadSink: Send + Sync {
    /// Stores the raw items fetched for `task` under the scope that produced them.
    ///
    /// `sector` is the company's opaque sector tag (possibly empty).
    async fn store(
        &self,
        task: &CollectionTask,
        sector: &str,
        scope: StatementScope,
        items: &[RawLineItem],
    ) -> Result<()>;
}
