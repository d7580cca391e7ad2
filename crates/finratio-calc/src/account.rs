//! Canonical account keys and the account-name rule table.
//!
//! Companies word the same line item differently (`매출액`, `수익(매출액)`,
//! `영업수익`, ...). The rule table maps those variants onto a closed set of
//! [`CanonicalKey`]s. Rules are evaluated in table order, which is also the
//! tie-break when a name matches more than one key.

use finratio_core::StatementType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Standardized financial line item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalKey {
    // Balance sheet
    /// 자산총계
    TotalAssets,
    /// 유동자산
    CurrentAssets,
    /// 비유동자산
    NonCurrentAssets,
    /// 유형자산
    TangibleAssets,
    /// 무형자산
    IntangibleAssets,
    /// 매출채권
    TradeReceivables,
    /// 재고자산
    Inventories,
    /// 현금및현금성자산
    Cash,
    /// 부채총계
    TotalLiabilities,
    /// 유동부채
    CurrentLiabilities,
    /// 단기차입금
    ShortTermBorrowings,
    /// 장기차입금
    LongTermBorrowings,
    /// 사채
    BondsPayable,
    /// 자본총계
    TotalEquity,
    /// 자본금
    PaidInCapital,
    /// 이익잉여금
    RetainedEarnings,
    /// 자본잉여금
    CapitalSurplus,

    // Income statement
    /// 매출액
    Revenue,
    /// 매출원가
    CostOfSales,
    /// 매출총이익
    GrossProfit,
    /// 영업이익
    OperatingIncome,
    /// 당기순이익
    NetIncome,
    /// 이자비용
    InterestExpense,

    // Cash flow statement
    /// 유형자산감가상각비
    Depreciation,
    /// 무형자산상각비
    Amortization,
}

impl CanonicalKey {
    /// Number of canonical keys.
    pub const COUNT: usize = 25;

    /// All keys in rule-table priority order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::TotalAssets,
        Self::CurrentAssets,
        Self::NonCurrentAssets,
        Self::TangibleAssets,
        Self::IntangibleAssets,
        Self::TradeReceivables,
        Self::Inventories,
        Self::Cash,
        Self::TotalLiabilities,
        Self::CurrentLiabilities,
        Self::ShortTermBorrowings,
        Self::LongTermBorrowings,
        Self::BondsPayable,
        Self::TotalEquity,
        Self::PaidInCapital,
        Self::RetainedEarnings,
        Self::CapitalSurplus,
        Self::Revenue,
        Self::CostOfSales,
        Self::GrossProfit,
        Self::OperatingIncome,
        Self::NetIncome,
        Self::InterestExpense,
        Self::Depreciation,
        Self::Amortization,
    ];

    /// Returns the statement this key is reported on.
    #[must_use]
    pub const fn statement_type(&self) -> StatementType {
        match self {
            Self::TotalAssets
            | Self::CurrentAssets
            | Self::NonCurrentAssets
            | Self::TangibleAssets
            | Self::IntangibleAssets
            | Self::TradeReceivables
            | Self::Inventories
            | Self::Cash
            | Self::TotalLiabilities
            | Self::CurrentLiabilities
            | Self::ShortTermBorrowings
            | Self::LongTermBorrowings
            | Self::BondsPayable
            | Self::TotalEquity
            | Self::PaidInCapital
            | Self::RetainedEarnings
            | Self::CapitalSurplus => StatementType::BalanceSheet,
            Self::Revenue
            | Self::CostOfSales
            | Self::GrossProfit
            | Self::OperatingIncome
            | Self::NetIncome
            | Self::InterestExpense => StatementType::IncomeStatement,
            Self::Depreciation | Self::Amortization => StatementType::CashFlow,
        }
    }

    /// Returns the snake_case key name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TotalAssets => "total_assets",
            Self::CurrentAssets => "current_assets",
            Self::NonCurrentAssets => "non_current_assets",
            Self::TangibleAssets => "tangible_assets",
            Self::IntangibleAssets => "intangible_assets",
            Self::TradeReceivables => "trade_receivables",
            Self::Inventories => "inventories",
            Self::Cash => "cash",
            Self::TotalLiabilities => "total_liabilities",
            Self::CurrentLiabilities => "current_liabilities",
            Self::ShortTermBorrowings => "short_term_borrowings",
            Self::LongTermBorrowings => "long_term_borrowings",
            Self::BondsPayable => "bonds_payable",
            Self::TotalEquity => "total_equity",
            Self::PaidInCapital => "paid_in_capital",
            Self::RetainedEarnings => "retained_earnings",
            Self::CapitalSurplus => "capital_surplus",
            Self::Revenue => "revenue",
            Self::CostOfSales => "cost_of_sales",
            Self::GrossProfit => "gross_profit",
            Self::OperatingIncome => "operating_income",
            Self::NetIncome => "net_income",
            Self::InterestExpense => "interest_expense",
            Self::Depreciation => "depreciation",
            Self::Amortization => "amortization",
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate over a cleaned account name.
///
/// A name is accepted when `include` matches and `exclude` (if any) does not.
#[derive(Debug)]
pub struct Matcher {
    include: Regex,
    exclude: Option<Regex>,
}

impl Matcher {
    fn new(include: &str) -> Self {
        Self {
            include: Regex::new(include).expect("hardcoded regex should be valid"),
            exclude: None,
        }
    }

    fn excluding(mut self, exclude: &str) -> Self {
        self.exclude = Some(Regex::new(exclude).expect("hardcoded regex should be valid"));
        self
    }

    /// Returns true if this matcher accepts `name`.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        self.include.is_match(name) && !self.exclude.as_ref().is_some_and(|ex| ex.is_match(name))
    }
}

/// Rule-table row: a canonical key and its matchers, most specific first.
#[derive(Debug)]
pub struct AccountRule {
    /// Key assigned when any matcher accepts.
    pub key: CanonicalKey,
    /// Matchers tried in order.
    pub matchers: Vec<Matcher>,
}

impl AccountRule {
    fn new(key: CanonicalKey, matchers: Vec<Matcher>) -> Self {
        Self { key, matchers }
    }

    /// Returns true if any matcher accepts `name`.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        self.matchers.iter().any(|m| m.accepts(name))
    }
}

/// The rule table in priority order. One row per canonical key.
pub static ACCOUNT_RULES: LazyLock<Vec<AccountRule>> = LazyLock::new(|| {
    use CanonicalKey as K;

    vec![
        // Balance sheet
        AccountRule::new(K::TotalAssets, vec![Matcher::new(r"자산\s*총계")]),
        AccountRule::new(
            K::CurrentAssets,
            vec![Matcher::new(r"유동\s*자산$").excluding(r"비\s*유동")],
        ),
        AccountRule::new(K::NonCurrentAssets, vec![Matcher::new(r"비\s*유동\s*자산$")]),
        AccountRule::new(K::TangibleAssets, vec![Matcher::new(r"유형\s*자산$")]),
        AccountRule::new(
            K::IntangibleAssets,
            vec![
                Matcher::new(r"영업권\s*이외의\s*무형\s*자산"),
                Matcher::new(r"무형\s*자산$"),
            ],
        ),
        AccountRule::new(
            K::TradeReceivables,
            vec![Matcher::new(r"^매출\s*채권$"), Matcher::new(r"매출\s*채권")],
        ),
        AccountRule::new(K::Inventories, vec![Matcher::new(r"재고\s*자산$")]),
        AccountRule::new(
            K::Cash,
            vec![Matcher::new(r"현금\s*(및|과)\s*현금\s*성?\s*자산")],
        ),
        AccountRule::new(K::TotalLiabilities, vec![Matcher::new(r"부채\s*총계")]),
        AccountRule::new(
            K::CurrentLiabilities,
            vec![Matcher::new(r"유동\s*부채$").excluding(r"비\s*유동")],
        ),
        AccountRule::new(K::ShortTermBorrowings, vec![Matcher::new(r"단기\s*차입금")]),
        AccountRule::new(K::LongTermBorrowings, vec![Matcher::new(r"장기\s*차입금")]),
        AccountRule::new(K::BondsPayable, vec![Matcher::new(r"^사채$")]),
        AccountRule::new(
            K::TotalEquity,
            vec![Matcher::new(r"자본\s*총계").excluding(r"부채")],
        ),
        AccountRule::new(
            K::PaidInCapital,
            vec![Matcher::new(r"^자본금$"), Matcher::new(r"납입\s*자본")],
        ),
        AccountRule::new(K::RetainedEarnings, vec![Matcher::new(r"이익\s*잉여금")]),
        AccountRule::new(K::CapitalSurplus, vec![Matcher::new(r"자본\s*잉여금")]),
        // Income statement (and comprehensive income statement)
        AccountRule::new(
            K::Revenue,
            vec![Matcher::new(
                r"^매출액$|^매출$|^수익\s*\(매출액\)$|^영업\s*수익$|^수익$",
            )],
        ),
        AccountRule::new(K::CostOfSales, vec![Matcher::new(r"매출\s*원가")]),
        AccountRule::new(
            K::GrossProfit,
            vec![Matcher::new(r"매출\s*총\s*이익|매출\s*총\s*손익")],
        ),
        AccountRule::new(
            K::OperatingIncome,
            vec![Matcher::new(r"영업\s*이익|영업\s*손익")],
        ),
        AccountRule::new(
            K::NetIncome,
            vec![Matcher::new(r"당기\s*순\s*이익|당기\s*순\s*손익")],
        ),
        AccountRule::new(K::InterestExpense, vec![Matcher::new(r"이자\s*비용")]),
        // Cash flow statement
        AccountRule::new(
            K::Depreciation,
            vec![
                Matcher::new(r"유형\s*자산\s*감가\s*상각비"),
                Matcher::new(r"감가\s*상각비"),
            ],
        ),
        AccountRule::new(K::Amortization, vec![Matcher::new(r"무형\s*자산\s*상각비")]),
    ]
});

/// Leading enumerators such as `Ⅰ.`, `II.`, `1.` or `(1)`.
static ENUMERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[ⅠⅡⅢⅣⅤⅥⅦⅧⅨⅩ]+\.?|[IVX]+\.|\d+\.|\(\d+\))\s*")
        .expect("hardcoded regex should be valid")
});

/// Trims an account name and strips any leading enumerator.
#[must_use]
pub fn clean_account_name(raw: &str) -> &str {
    let trimmed = raw.trim();
    match ENUMERATOR.find(trimmed) {
        Some(m) => trimmed[m.end()..].trim(),
        None => trimmed,
    }
}

/// Resolves an account name to a canonical key.
///
/// Only rules for `statement_type` are tried, in table order; the first rule that
/// accepts the cleaned name wins.
#[must_use]
pub fn classify(account_name: &str, statement_type: StatementType) -> Option<CanonicalKey> {
    let name = clean_account_name(account_name);
    if name.is_empty() {
        return None;
    }

    ACCOUNT_RULES
        .iter()
        .filter(|rule| rule.key.statement_type() == statement_type)
        .find(|rule| rule.accepts(name))
        .map(|rule| rule.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_key_once_in_order() {
        let keys: Vec<_> = ACCOUNT_RULES.iter().map(|r| r.key).collect();
        assert_eq!(keys, CanonicalKey::ALL.to_vec());
    }

    #[test]
    fn test_statement_type_partition() {
        let count = |st| {
            CanonicalKey::ALL
                .iter()
                .filter(|k| k.statement_type() == st)
                .count()
        };
        assert_eq!(count(StatementType::BalanceSheet), 17);
        assert_eq!(count(StatementType::IncomeStatement), 6);
        assert_eq!(count(StatementType::CashFlow), 2);
    }

    #[test]
    fn test_common_variants() {
        let bs = StatementType::BalanceSheet;
        let is = StatementType::IncomeStatement;
        let cf = StatementType::CashFlow;

        assert_eq!(classify("자산총계", bs), Some(CanonicalKey::TotalAssets));
        assert_eq!(classify("자산 총계", bs), Some(CanonicalKey::TotalAssets));
        assert_eq!(classify("현금및현금성자산", bs), Some(CanonicalKey::Cash));
        assert_eq!(classify("현금과 현금성 자산", bs), Some(CanonicalKey::Cash));
        assert_eq!(classify("단기매출채권", bs), Some(CanonicalKey::TradeReceivables));
        assert_eq!(classify("수익(매출액)", is), Some(CanonicalKey::Revenue));
        assert_eq!(classify("영업수익", is), Some(CanonicalKey::Revenue));
        assert_eq!(classify("영업이익(손실)", is), Some(CanonicalKey::OperatingIncome));
        assert_eq!(classify("당기순이익(손실)", is), Some(CanonicalKey::NetIncome));
        assert_eq!(classify("감가상각비", cf), Some(CanonicalKey::Depreciation));
        assert_eq!(classify("무형자산상각비", cf), Some(CanonicalKey::Amortization));
    }

    #[test]
    fn test_non_current_is_not_current() {
        let bs = StatementType::BalanceSheet;
        assert_eq!(classify("유동자산", bs), Some(CanonicalKey::CurrentAssets));
        assert_eq!(classify("비유동자산", bs), Some(CanonicalKey::NonCurrentAssets));
        assert_eq!(classify("유동부채", bs), Some(CanonicalKey::CurrentLiabilities));
        assert_eq!(classify("비유동부채", bs), None);
    }

    #[test]
    fn test_equity_total_excludes_combined_total() {
        let bs = StatementType::BalanceSheet;
        assert_eq!(classify("자본총계", bs), Some(CanonicalKey::TotalEquity));
        assert_eq!(classify("부채와자본총계", bs), None);
    }

    #[test]
    fn test_statement_type_filters_rules() {
        // Revenue names on the balance sheet are not revenue.
        assert_eq!(classify("매출액", StatementType::BalanceSheet), None);
        assert_eq!(classify("자산총계", StatementType::IncomeStatement), None);
    }

    #[test]
    fn test_overlapping_name_resolves_to_earlier_key() {
        let is = StatementType::IncomeStatement;
        // Matches both the gross-profit and the operating-income patterns.
        for _ in 0..3 {
            assert_eq!(
                classify("매출총이익(영업이익)", is),
                Some(CanonicalKey::GrossProfit)
            );
        }
    }

    #[test]
    fn test_enumerators_are_stripped() {
        assert_eq!(clean_account_name("Ⅰ.유동자산"), "유동자산");
        assert_eq!(clean_account_name(" II. 비유동자산 "), "비유동자산");
        assert_eq!(clean_account_name("(1)재고자산"), "재고자산");
        assert_eq!(
            classify("Ⅰ.유동자산", StatementType::BalanceSheet),
            Some(CanonicalKey::CurrentAssets)
        );
    }

    #[test]
    fn test_unmatched_and_blank_names() {
        assert_eq!(classify("기타포괄손익", StatementType::IncomeStatement), None);
        assert_eq!(classify("   ", StatementType::BalanceSheet), None);
    }
}
