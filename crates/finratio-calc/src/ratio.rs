//! The fixed set of 30 derived ratios and their container.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ratio family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioCategory {
    /// 성장성
    Growth,
    /// 수익성
    Profitability,
    /// 활동성
    Activity,
    /// 안정성
    Stability,
    /// 가치평가
    Valuation,
}

impl RatioCategory {
    /// Returns the snake_case category name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Growth => "growth",
            Self::Profitability => "profitability",
            Self::Activity => "activity",
            Self::Stability => "stability",
            Self::Valuation => "valuation",
        }
    }
}

/// One of the 30 derived ratios, declared in output column order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ratio {
    /// 총자산증가율
    TotalAssetGrowth,
    /// 유동자산증가율
    CurrentAssetGrowth,
    /// 매출액증가율
    RevenueGrowth,
    /// 순이익증가율
    NetIncomeGrowth,
    /// 영업이익증가율
    OperatingIncomeGrowth,
    /// 매출액순이익률
    NetProfitMargin,
    /// 매출총이익률
    GrossProfitMargin,
    /// 자기자본순이익률
    ReturnOnEquity,
    /// 매출채권회전율
    ReceivablesTurnover,
    /// 재고자산회전율
    InventoryTurnover,
    /// 총자본회전율
    TotalCapitalTurnover,
    /// 유형자산회전율
    TangibleAssetTurnover,
    /// 매출원가율
    CostOfSalesRatio,
    /// 부채비율
    DebtRatio,
    /// 유동비율
    CurrentRatio,
    /// 자기자본비율
    EquityRatio,
    /// 당좌비율
    QuickRatio,
    /// 비유동자산장기적합률
    NonCurrentFitness,
    /// 순운전자본비율
    NetWorkingCapitalRatio,
    /// 차입금의존도
    BorrowingDependency,
    /// 현금비율
    CashRatio,
    /// 유형자산
    TangibleAssets,
    /// 무형자산
    IntangibleAssets,
    /// 무형자산상각비
    Amortization,
    /// 유형자산상각비
    Depreciation,
    /// 감가상각비
    DepreciationAndAmortization,
    /// 총자본영업이익률
    OperatingReturnOnCapital,
    /// 총자본순이익률
    NetReturnOnCapital,
    /// 유보액/납입자본비율
    ReserveToPaidInCapital,
    /// 총자본투자효율
    CapitalInvestmentEfficiency,
}

impl Ratio {
    /// Number of ratios.
    pub const COUNT: usize = 30;

    /// All ratios in output order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::TotalAssetGrowth,
        Self::CurrentAssetGrowth,
        Self::RevenueGrowth,
        Self::NetIncomeGrowth,
        Self::OperatingIncomeGrowth,
        Self::NetProfitMargin,
        Self::GrossProfitMargin,
        Self::ReturnOnEquity,
        Self::ReceivablesTurnover,
        Self::InventoryTurnover,
        Self::TotalCapitalTurnover,
        Self::TangibleAssetTurnover,
        Self::CostOfSalesRatio,
        Self::DebtRatio,
        Self::CurrentRatio,
        Self::EquityRatio,
        Self::QuickRatio,
        Self::NonCurrentFitness,
        Self::NetWorkingCapitalRatio,
        Self::BorrowingDependency,
        Self::CashRatio,
        Self::TangibleAssets,
        Self::IntangibleAssets,
        Self::Amortization,
        Self::Depreciation,
        Self::DepreciationAndAmortization,
        Self::OperatingReturnOnCapital,
        Self::NetReturnOnCapital,
        Self::ReserveToPaidInCapital,
        Self::CapitalInvestmentEfficiency,
    ];

    /// Returns the column position of this ratio.
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Returns the ratio family.
    #[must_use]
    pub const fn category(&self) -> RatioCategory {
        match self {
            Self::TotalAssetGrowth
            | Self::CurrentAssetGrowth
            | Self::RevenueGrowth
            | Self::NetIncomeGrowth
            | Self::OperatingIncomeGrowth => RatioCategory::Growth,
            Self::NetProfitMargin | Self::GrossProfitMargin | Self::ReturnOnEquity => {
                RatioCategory::Profitability
            }
            Self::ReceivablesTurnover
            | Self::InventoryTurnover
            | Self::TotalCapitalTurnover
            | Self::TangibleAssetTurnover
            | Self::CostOfSalesRatio => RatioCategory::Activity,
            Self::DebtRatio
            | Self::CurrentRatio
            | Self::EquityRatio
            | Self::QuickRatio
            | Self::NonCurrentFitness
            | Self::NetWorkingCapitalRatio
            | Self::BorrowingDependency
            | Self::CashRatio
            | Self::TangibleAssets
            | Self::IntangibleAssets
            | Self::Amortization
            | Self::Depreciation
            | Self::DepreciationAndAmortization => RatioCategory::Stability,
            Self::OperatingReturnOnCapital
            | Self::NetReturnOnCapital
            | Self::ReserveToPaidInCapital
            | Self::CapitalInvestmentEfficiency => RatioCategory::Valuation,
        }
    }

    /// Returns the stable column key.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TotalAssetGrowth => "total_asset_growth",
            Self::CurrentAssetGrowth => "current_asset_growth",
            Self::RevenueGrowth => "revenue_growth",
            Self::NetIncomeGrowth => "net_income_growth",
            Self::OperatingIncomeGrowth => "operating_income_growth",
            Self::NetProfitMargin => "net_profit_margin",
            Self::GrossProfitMargin => "gross_profit_margin",
            Self::ReturnOnEquity => "return_on_equity",
            Self::ReceivablesTurnover => "receivables_turnover",
            Self::InventoryTurnover => "inventory_turnover",
            Self::TotalCapitalTurnover => "total_capital_turnover",
            Self::TangibleAssetTurnover => "tangible_asset_turnover",
            Self::CostOfSalesRatio => "cost_of_sales_ratio",
            Self::DebtRatio => "debt_ratio",
            Self::CurrentRatio => "current_ratio",
            Self::EquityRatio => "equity_ratio",
            Self::QuickRatio => "quick_ratio",
            Self::NonCurrentFitness => "non_current_fitness",
            Self::NetWorkingCapitalRatio => "net_working_capital_ratio",
            Self::BorrowingDependency => "borrowing_dependency",
            Self::CashRatio => "cash_ratio",
            Self::TangibleAssets => "tangible_assets",
            Self::IntangibleAssets => "intangible_assets",
            Self::Amortization => "amortization",
            Self::Depreciation => "depreciation",
            Self::DepreciationAndAmortization => "depreciation_and_amortization",
            Self::OperatingReturnOnCapital => "operating_return_on_capital",
            Self::NetReturnOnCapital => "net_return_on_capital",
            Self::ReserveToPaidInCapital => "reserve_to_paid_in_capital",
            Self::CapitalInvestmentEfficiency => "capital_investment_efficiency",
        }
    }

    /// Returns the Korean display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TotalAssetGrowth => "총자산증가율",
            Self::CurrentAssetGrowth => "유동자산증가율",
            Self::RevenueGrowth => "매출액증가율",
            Self::NetIncomeGrowth => "순이익증가율",
            Self::OperatingIncomeGrowth => "영업이익증가율",
            Self::NetProfitMargin => "매출액순이익률",
            Self::GrossProfitMargin => "매출총이익률",
            Self::ReturnOnEquity => "자기자본순이익률",
            Self::ReceivablesTurnover => "매출채권회전율",
            Self::InventoryTurnover => "재고자산회전율",
            Self::TotalCapitalTurnover => "총자본회전율",
            Self::TangibleAssetTurnover => "유형자산회전율",
            Self::CostOfSalesRatio => "매출원가율",
            Self::DebtRatio => "부채비율",
            Self::CurrentRatio => "유동비율",
            Self::EquityRatio => "자기자본비율",
            Self::QuickRatio => "당좌비율",
            Self::NonCurrentFitness => "비유동자산장기적합률",
            Self::NetWorkingCapitalRatio => "순운전자본비율",
            Self::BorrowingDependency => "차입금의존도",
            Self::CashRatio => "현금비율",
            Self::TangibleAssets => "유형자산",
            Self::IntangibleAssets => "무형자산",
            Self::Amortization => "무형자산상각비",
            Self::Depreciation => "유형자산상각비",
            Self::DepreciationAndAmortization => "감가상각비",
            Self::OperatingReturnOnCapital => "총자본영업이익률",
            Self::NetReturnOnCapital => "총자본순이익률",
            Self::ReserveToPaidInCapital => "유보액/납입자본비율",
            Self::CapitalInvestmentEfficiency => "총자본투자효율",
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exactly one value per [`Ratio`], in output order.
///
/// `None` means the inputs were missing or the denominator was zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    values: [Option<f64>; Ratio::COUNT],
}

impl Default for RatioSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl RatioSet {
    /// Creates a set with every ratio missing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            values: [None; Ratio::COUNT],
        }
    }

    /// Returns the value of `ratio`.
    #[must_use]
    pub const fn get(&self, ratio: Ratio) -> Option<f64> {
        self.values[ratio.index()]
    }

    /// Sets the value of `ratio`.
    pub const fn set(&mut self, ratio: Ratio, value: Option<f64>) {
        self.values[ratio.index()] = value;
    }

    /// Returns the raw values in output order.
    #[must_use]
    pub const fn values(&self) -> &[Option<f64>; Ratio::COUNT] {
        &self.values
    }

    /// Returns `(ratio, value)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Ratio, Option<f64>)> + '_ {
        Ratio::ALL.iter().map(|r| (*r, self.get(*r)))
    }

    /// Returns the number of ratios that have a value.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_declaration_order() {
        for (i, ratio) in Ratio::ALL.iter().enumerate() {
            assert_eq!(ratio.index(), i);
        }
    }

    #[test]
    fn test_category_sizes() {
        let count = |c| Ratio::ALL.iter().filter(|r| r.category() == c).count();
        assert_eq!(count(RatioCategory::Growth), 5);
        assert_eq!(count(RatioCategory::Profitability), 3);
        assert_eq!(count(RatioCategory::Activity), 5);
        assert_eq!(count(RatioCategory::Stability), 13);
        assert_eq!(count(RatioCategory::Valuation), 4);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Ratio::ALL.iter().map(Ratio::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Ratio::COUNT);
    }

    #[test]
    fn test_serde_key_matches_name() {
        for ratio in Ratio::ALL {
            let json = serde_json::to_string(&ratio).unwrap();
            assert_eq!(json, format!("\"{}\"", ratio.name()));
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut set = RatioSet::empty();
        assert_eq!(set.present_count(), 0);
        set.set(Ratio::DebtRatio, Some(150.0));
        assert_eq!(set.get(Ratio::DebtRatio), Some(150.0));
        assert_eq!(set.present_count(), 1);
        assert_eq!(set.iter().count(), Ratio::COUNT);
    }
}
