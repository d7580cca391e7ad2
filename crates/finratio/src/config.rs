//! Collection settings.

use finratio_calc::DuplicatePolicy;
use finratio_core::StatementScope;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default spacing between the start of two network-issuing tasks.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Settings shared by every task of a collection run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Minimum spacing between the start times of successive network-issuing tasks.
    pub delay: Duration,
    /// Scope requested first; consolidated falls back to separate when empty.
    pub scope: StatementScope,
    /// Resolution of several raw items mapping to one canonical key.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            scope: StatementScope::Consolidated,
            duplicate_policy: DuplicatePolicy::FirstWins,
        }
    }
}

impl CollectConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pacing delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the pacing delay in (fractional) seconds. Negative values mean no delay.
    #[must_use]
    pub fn with_delay_secs(self, secs: f64) -> Self {
        self.with_delay(Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO))
    }

    /// Set the primary statement scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: StatementScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the duplicate policy.
    #[must_use]
    pub const fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}
