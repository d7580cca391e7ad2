//! Ratio computation over a [`NormalizedPeriod`].
//!
//! Every primitive propagates `None`: a missing operand or a zero denominator
//! yields `None` for the affected ratio only.

use crate::account::CanonicalKey;
use crate::normalize::NormalizedPeriod;
use crate::ratio::{Ratio, RatioSet};

/// Divides `a` by `b`, or `None` if either is missing or `b` is zero.
#[must_use]
pub fn safe_div(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) if b != 0.0 => Some(a / b),
        _ => None,
    }
}

/// `a / b` as a percentage.
#[must_use]
pub fn pct(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    safe_div(a, b).map(|v| v * 100.0)
}

/// Period-over-period growth in percent.
#[must_use]
pub fn growth(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let delta = current.zip(previous).map(|(c, p)| c - p);
    pct(delta, previous)
}

/// Sums the present components; `None` only when every component is absent.
fn sum_present(components: &[Option<f64>]) -> Option<f64> {
    components
        .iter()
        .flatten()
        .copied()
        .reduce(|acc, v| acc + v)
}

/// Adds an optional operand to a required one.
fn plus_optional(required: Option<f64>, optional: Option<f64>) -> Option<f64> {
    required.map(|v| v + optional.unwrap_or(0.0))
}

/// Computes a single ratio.
#[must_use]
pub fn compute(ratio: Ratio, period: &NormalizedPeriod) -> Option<f64> {
    use CanonicalKey as K;

    let cur = |key| period.current(key);
    let grow = |key| growth(period.current(key), period.prior(key));

    match ratio {
        Ratio::TotalAssetGrowth => grow(K::TotalAssets),
        Ratio::CurrentAssetGrowth => grow(K::CurrentAssets),
        Ratio::RevenueGrowth => grow(K::Revenue),
        Ratio::NetIncomeGrowth => grow(K::NetIncome),
        Ratio::OperatingIncomeGrowth => grow(K::OperatingIncome),

        Ratio::NetProfitMargin => pct(cur(K::NetIncome), cur(K::Revenue)),
        Ratio::GrossProfitMargin => pct(cur(K::GrossProfit), cur(K::Revenue)),
        Ratio::ReturnOnEquity => pct(cur(K::NetIncome), cur(K::TotalEquity)),

        Ratio::ReceivablesTurnover => safe_div(cur(K::Revenue), cur(K::TradeReceivables)),
        Ratio::InventoryTurnover => safe_div(cur(K::CostOfSales), cur(K::Inventories)),
        Ratio::TotalCapitalTurnover | Ratio::TangibleAssetTurnover => {
            safe_div(cur(K::Revenue), cur(K::TotalAssets))
        }
        Ratio::CostOfSalesRatio => pct(cur(K::CostOfSales), cur(K::Revenue)),

        Ratio::DebtRatio => pct(cur(K::TotalLiabilities), cur(K::TotalEquity)),
        Ratio::CurrentRatio => pct(cur(K::CurrentAssets), cur(K::CurrentLiabilities)),
        Ratio::EquityRatio => pct(cur(K::TotalEquity), cur(K::TotalAssets)),
        Ratio::QuickRatio => {
            let quick = cur(K::CurrentAssets).map(|ca| ca - cur(K::Inventories).unwrap_or(0.0));
            pct(quick, cur(K::CurrentLiabilities))
        }
        Ratio::NonCurrentFitness => {
            safe_div(cur(K::NonCurrentAssets), cur(K::LongTermBorrowings))
        }
        Ratio::NetWorkingCapitalRatio => {
            let nwc = cur(K::CurrentAssets)
                .zip(cur(K::CurrentLiabilities))
                .map(|(a, l)| a - l);
            pct(nwc, cur(K::TotalAssets))
        }
        Ratio::BorrowingDependency => {
            let borrowings = [K::ShortTermBorrowings, K::LongTermBorrowings, K::BondsPayable]
                .into_iter()
                .map(|key| cur(key).unwrap_or(0.0))
                .sum::<f64>();
            pct(Some(borrowings), cur(K::TotalAssets))
        }
        Ratio::CashRatio => pct(cur(K::Cash), cur(K::CurrentLiabilities)),
        Ratio::TangibleAssets => cur(K::TangibleAssets),
        Ratio::IntangibleAssets => cur(K::IntangibleAssets),
        Ratio::Amortization => cur(K::Amortization),
        Ratio::Depreciation => cur(K::Depreciation),
        Ratio::DepreciationAndAmortization => {
            sum_present(&[cur(K::Depreciation), cur(K::Amortization)])
        }

        Ratio::OperatingReturnOnCapital => pct(cur(K::OperatingIncome), cur(K::TotalAssets)),
        Ratio::NetReturnOnCapital => pct(cur(K::NetIncome), cur(K::TotalAssets)),
        Ratio::ReserveToPaidInCapital => pct(
            plus_optional(cur(K::RetainedEarnings), cur(K::CapitalSurplus)),
            cur(K::PaidInCapital),
        ),
        Ratio::CapitalInvestmentEfficiency => safe_div(
            plus_optional(cur(K::NetIncome), cur(K::InterestExpense)),
            cur(K::TotalAssets),
        ),
    }
}

/// Computes all 30 ratios. Total: never fails, missing inputs yield `None`.
#[must_use]
pub fn compute_all_ratios(period: &NormalizedPeriod) -> RatioSet {
    let mut set = RatioSet::empty();
    for ratio in Ratio::ALL {
        set.set(ratio, compute(ratio, period));
    }
    set
}
