//! Normalization of raw line items into a [`NormalizedPeriod`].

use finratio_core::RawLineItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, warn};

use crate::account::{CanonicalKey, classify};

/// Reporting period of a value relative to the filing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Current period (당기).
    Current,
    /// Prior period (전기).
    Prior,
    /// Two periods back (전전기).
    PriorPrior,
}

/// Values of one canonical key across the three reported periods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodValues {
    /// Current-period value.
    pub current: Option<f64>,
    /// Prior-period value.
    pub prior: Option<f64>,
    /// Value two periods back.
    pub prior_prior: Option<f64>,
}

impl PeriodValues {
    /// Creates period values from already-parsed amounts.
    #[must_use]
    pub const fn new(current: Option<f64>, prior: Option<f64>, prior_prior: Option<f64>) -> Self {
        Self {
            current,
            prior,
            prior_prior,
        }
    }

    /// Parses the three amounts of a raw line item.
    #[must_use]
    pub fn from_item(item: &RawLineItem) -> Self {
        Self {
            current: item.current_amount.as_deref().and_then(parse_amount),
            prior: item.prior_amount.as_deref().and_then(parse_amount),
            prior_prior: item.prior_prior_amount.as_deref().and_then(parse_amount),
        }
    }

    /// Returns the value for `period`.
    #[must_use]
    pub const fn get(&self, period: Period) -> Option<f64> {
        match period {
            Period::Current => self.current,
            Period::Prior => self.prior,
            Period::PriorPrior => self.prior_prior,
        }
    }
}

/// Canonical line items of one filing. At most one entry per key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPeriod {
    values: BTreeMap<CanonicalKey, PeriodValues>,
}

impl NormalizedPeriod {
    /// Creates an empty period.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values of `key`, replacing any previous entry.
    pub fn insert(&mut self, key: CanonicalKey, values: PeriodValues) {
        self.values.insert(key, values);
    }

    /// Sets `key` and returns the period, for building fixtures.
    #[must_use]
    pub fn with(mut self, key: CanonicalKey, values: PeriodValues) -> Self {
        self.insert(key, values);
        self
    }

    /// Returns the entry for `key`, if it was present in the filing.
    #[must_use]
    pub fn get(&self, key: CanonicalKey) -> Option<&PeriodValues> {
        self.values.get(&key)
    }

    /// Returns the value of `key` for `period`.
    #[must_use]
    pub fn value(&self, key: CanonicalKey, period: Period) -> Option<f64> {
        self.values.get(&key).and_then(|v| v.get(period))
    }

    /// Returns the current-period value of `key`.
    #[must_use]
    pub fn current(&self, key: CanonicalKey) -> Option<f64> {
        self.value(key, Period::Current)
    }

    /// Returns the prior-period value of `key`.
    #[must_use]
    pub fn prior(&self, key: CanonicalKey) -> Option<f64> {
        self.value(key, Period::Prior)
    }

    /// Returns true if `key` was present in the filing.
    #[must_use]
    pub fn contains(&self, key: CanonicalKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Returns the number of keys present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no key was present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns an iterator over present keys in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalKey, &PeriodValues)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

/// How to resolve several raw items that map to the same canonical key.
///
/// The losing candidates are dropped with a warning, never summed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first item seen in statement order.
    #[default]
    FirstWins,
    /// Keep the last item seen in statement order.
    LastWins,
    /// Keep the item with the largest absolute current-period amount.
    LargestMagnitude,
}

impl DuplicatePolicy {
    fn replaces(self, existing: &PeriodValues, candidate: &PeriodValues) -> bool {
        match self {
            Self::FirstWins => false,
            Self::LastWins => true,
            Self::LargestMagnitude => {
                candidate.current.map(f64::abs) > existing.current.map(f64::abs)
            }
        }
    }
}

/// Maps raw line items onto canonical keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccountNormalizer {
    policy: DuplicatePolicy,
}

impl AccountNormalizer {
    /// Creates a normalizer with the default first-wins policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a normalizer with the given duplicate policy.
    #[must_use]
    pub const fn with_policy(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    /// Returns the duplicate policy.
    #[must_use]
    pub const fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Builds a normalized period from raw line items.
    ///
    /// Items matching no rule are discarded. Never fails.
    #[must_use]
    pub fn normalize(&self, items: &[RawLineItem]) -> NormalizedPeriod {
        let mut period = NormalizedPeriod::new();

        for item in items {
            let Some(key) = classify(&item.account_name, item.statement_type) else {
                continue;
            };
            let candidate = PeriodValues::from_item(item);

            match period.values.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    let replace = self.policy.replaces(slot.get(), &candidate);
                    warn!(
                        key = %key,
                        account = %item.account_name,
                        policy = ?self.policy,
                        replaced = replace,
                        "Duplicate mapping for canonical key, dropping one candidate"
                    );
                    if replace {
                        slot.insert(candidate);
                    }
                }
            }
        }

        debug!(
            items = items.len(),
            mapped = period.len(),
            "Normalized statement line items"
        );
        period
    }
}

/// Normalizes raw line items with the default first-wins policy.
#[must_use]
pub fn extract_standard_items(items: &[RawLineItem]) -> NormalizedPeriod {
    AccountNormalizer::new().normalize(items)
}

/// Parses a formatted amount such as `"1,234,567"`, `"-42"` or `"(1,000)"`.
///
/// Returns `None` for blank, `-`, non-numeric or non-finite input; never zero.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    let (negated, digits) = match cleaned
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    let value = digits.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negated { -value } else { value })
}
