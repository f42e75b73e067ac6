use crate::model::{Accounts, MonthlyAmounts, PlSection, Tags, Transaction};
use crate::pnl::summary::margin;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classifies a transaction into `section` by its own account, falling back to its declared parent
/// account when its own account is unknown or belongs to another section.
///
/// A transaction whose account and parent sit in different sections therefore counts towards
/// both.
pub(crate) fn in_section(transaction: &Transaction, section: PlSection, accounts: &Accounts) -> bool {
    let own = accounts.get(transaction.account_code());
    if own.is_some_and(|a| a.section() == section) {
        return true;
    }
    transaction
        .parent_account_code()
        .and_then(|code| accounts.get(code))
        .is_some_and(|parent| parent.section() == section)
}

/// The total of untagged transactions in `section` for one month.
///
/// This scans the flat transaction list and never walks the account tree, so it is an independent
/// check on the rows built by `build_section_rows`.
pub fn section_monthly_total(
    section: PlSection,
    transactions: &[Transaction],
    accounts: &Accounts,
    month: &str,
    tags: &Tags,
) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.month() == month && !tags.is_tagged(t.id()))
        .filter(|t| in_section(t, section, accounts))
        .map(Transaction::value)
        .sum()
}

/// A monthly series with its YTD total.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SectionTotals {
    pub monthly_amounts: MonthlyAmounts,
    pub ytd_total: Decimal,
}

impl SectionTotals {
    fn from_monthly(monthly_amounts: MonthlyAmounts) -> Self {
        let ytd_total = monthly_amounts.total();
        Self {
            monthly_amounts,
            ytd_total,
        }
    }
}

/// `section_monthly_total` for every month of the window, plus the YTD sum.
pub fn section_totals<S: AsRef<str>>(
    section: PlSection,
    transactions: &[Transaction],
    accounts: &Accounts,
    months: &[S],
    tags: &Tags,
) -> SectionTotals {
    let mut monthly = MonthlyAmounts::zeroed(months);
    for month in months {
        let month = month.as_ref();
        monthly.add(
            month,
            section_monthly_total(section, transactions, accounts, month, tags),
        );
    }
    SectionTotals::from_monthly(monthly)
}

/// Gross profit and net income lines derived month by month from the section totals.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProfitLines {
    pub revenue: SectionTotals,
    pub gross_profit: SectionTotals,
    pub net_income: SectionTotals,
    /// Gross profit YTD as a percentage of revenue YTD, 0 without revenue.
    pub gross_margin: Decimal,
    /// Net income YTD as a percentage of revenue YTD, 0 without revenue.
    pub net_margin: Decimal,
}

pub fn profit_lines<S: AsRef<str>>(
    transactions: &[Transaction],
    accounts: &Accounts,
    months: &[S],
    tags: &Tags,
) -> ProfitLines {
    let totals = |section| section_totals(section, transactions, accounts, months, tags);
    let revenue = totals(PlSection::Revenue);
    let cogs = totals(PlSection::Cogs);
    let cost_of_sales = totals(PlSection::CostOfSales);
    let opex = totals(PlSection::OperatingExpenses);
    let other = totals(PlSection::OtherIncome);

    let gross = revenue
        .monthly_amounts
        .combine(&cogs.monthly_amounts, |r, c| r - c)
        .combine(&cost_of_sales.monthly_amounts, |g, c| g - c);
    let net = gross
        .combine(&opex.monthly_amounts, |g, o| g - o)
        .combine(&other.monthly_amounts, |n, o| n + o);

    let gross_profit = SectionTotals::from_monthly(gross);
    let net_income = SectionTotals::from_monthly(net);
    ProfitLines {
        gross_margin: margin(gross_profit.ytd_total, revenue.ytd_total),
        net_margin: margin(net_income.ytd_total, revenue.ytd_total),
        revenue,
        gross_profit,
        net_income,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, Tag, TagCategory};
    use crate::pnl::rows::build_section_rows;
    use crate::test::{accounts, ledger, tagged, MONTHS};
    use rust_decimal_macros::dec;

    #[test]
    fn test_section_monthly_total() {
        let accounts = accounts();
        let txns = ledger();
        let tags = tagged();
        let total = |section, month| section_monthly_total(section, &txns, &accounts, month, &tags);
        assert_eq!(total(PlSection::Revenue, "2025-11"), dec!(950));
        assert_eq!(total(PlSection::Revenue, "2025-12"), dec!(2000));
        // bing-dec is tagged, the orphan rolls up through its parent
        assert_eq!(total(PlSection::OperatingExpenses, "2025-12"), dec!(-35));
        assert_eq!(total(PlSection::OperatingExpenses, "2026-01"), dec!(40));
        assert_eq!(total(PlSection::Revenue, "2030-01"), Decimal::ZERO);
    }

    #[test]
    fn test_sections_reconcile_with_rows() {
        let accounts = accounts();
        let txns = ledger();
        let tags = tagged();
        for section in PlSection::REPORTED {
            let rows = build_section_rows(section, &txns, &accounts, &MONTHS, &tags);
            let rows_total: Decimal = rows.iter().map(|r| r.ytd_total).sum();
            let totals = section_totals(section, &txns, &accounts, &MONTHS, &tags);
            assert_eq!(rows_total, totals.ytd_total, "{section}");
        }
    }

    #[test]
    fn test_orphan_under_nested_parent_reconciles() {
        // an orphan whose declared parent is itself a child still reaches the top-level row, and
        // the section scan classifies it by that parent
        let accounts = Accounts::new(vec![
            Account::new("6000", "Cost of Sales", PlSection::CostOfSales).with_children(["6060"]),
            Account::new("6060", "Merchant Fees", PlSection::CostOfSales).with_parent("6000"),
        ])
        .unwrap();
        let txns = vec![
            Transaction::new("o", "6061", dec!(12), "11/01/2025").with_parent("6060"),
            Transaction::new("k", "6060", dec!(3), "11/02/2025").with_parent("6000"),
        ];
        let tags = Tags::new();
        let rows = build_section_rows(PlSection::CostOfSales, &txns, &accounts, &MONTHS, &tags);
        let totals = section_totals(PlSection::CostOfSales, &txns, &accounts, &MONTHS, &tags);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ytd_total, dec!(15));
        assert_eq!(totals.ytd_total, dec!(15));
    }

    #[test]
    fn test_orphan_with_unknown_parent_is_dropped() {
        let accounts = accounts();
        let txns = vec![Transaction::new("x", "8888", dec!(5), "11/01/2025").with_parent("8800")];
        for section in PlSection::REPORTED {
            let totals = section_totals(section, &txns, &accounts, &MONTHS, &Tags::new());
            assert_eq!(totals.ytd_total, Decimal::ZERO);
        }
    }

    #[test]
    fn test_tagged_never_counted() {
        let accounts = accounts();
        let txns = vec![Transaction::new("t", "4000", dec!(5), "11/01/2025")];
        let mut tags = Tags::new();
        tags.insert("t", Tag::new(TagCategory::Personal, "x"));
        let totals = section_totals(PlSection::Revenue, &txns, &accounts, &MONTHS, &tags);
        assert_eq!(totals.ytd_total, Decimal::ZERO);
    }

    #[test]
    fn test_profit_lines() {
        let lines = profit_lines(&ledger(), &accounts(), &MONTHS, &tagged());
        assert_eq!(lines.revenue.ytd_total, dec!(2950));
        // november: 950 - 300 - 30 = 620; december: 2000 - 500 = 1500
        assert_eq!(lines.gross_profit.monthly_amounts.get("2025-11"), Some(dec!(620)));
        assert_eq!(lines.gross_profit.monthly_amounts.get("2025-12"), Some(dec!(1500)));
        assert_eq!(lines.gross_profit.ytd_total, dec!(2120));
        // opex: november 350 + 120 = 470; december 85 - 120 = -35; other income 10 in december
        assert_eq!(lines.net_income.monthly_amounts.get("2025-11"), Some(dec!(150)));
        assert_eq!(lines.net_income.monthly_amounts.get("2025-12"), Some(dec!(1545)));
        assert_eq!(lines.net_income.ytd_total, dec!(1695));
        assert_eq!(lines.gross_margin.round_dp(2), dec!(71.86));
        assert_eq!(lines.net_margin.round_dp(2), dec!(57.46));
    }

    #[test]
    fn test_profit_lines_without_revenue() {
        let lines = profit_lines(&[], &accounts(), &MONTHS, &Tags::new());
        assert_eq!(lines.gross_margin, Decimal::ZERO);
        assert_eq!(lines.net_margin, Decimal::ZERO);
        assert_eq!(lines.net_income.monthly_amounts.len(), 2);
    }
}
