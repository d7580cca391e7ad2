#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finratio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Canonical keys and the account-name pattern table.
pub mod account;
/// Ratio primitives and the 30-ratio engine.
pub mod engine;
/// Raw line item normalization.
pub mod normalize;
/// Ratio identifiers and the ratio container.
pub mod ratio;

pub use account::{CanonicalKey, classify, clean_account_name};
pub use engine::{compute, compute_all_ratios, growth, pct, safe_div};
pub use normalize::{
    AccountNormalizer, DuplicatePolicy, NormalizedPeriod, Period, PeriodValues,
    extract_standard_items, parse_amount,
};
pub use ratio::{Ratio, RatioCategory, RatioSet};
