use crate::model::{numeric_code, Accounts, PlSection, Tags, Transaction};
use crate::pnl::totals::in_section;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Numeric account codes that make up the revenue band of the summary.
const REVENUE_BAND: Range<u32> = 4000..4100;

/// Sales and shipping income.
const GROSS_REVENUE_CODES: &[&str] = &["4000", "4030"];

/// Discounts, refunds and chargebacks. These carry negative amounts in the ledger.
const CONTRA_REVENUE_CODES: &[&str] = &["4010", "4020", "4040"];

/// `numerator` as a percentage of `denominator`, or zero when there is nothing to divide by.
pub(crate) fn margin(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or_default()
}

/// Headline figures over the full dataset, ignoring any reporting window.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SummaryMetrics {
    pub gross_revenue: Decimal,
    pub contra_revenue: Decimal,
    pub net_revenue: Decimal,
    pub total_cogs: Decimal,
    pub total_cost_of_sales: Decimal,
    pub gross_profit: Decimal,
    pub gross_margin: Decimal,
    pub total_opex: Decimal,
    pub other_income: Decimal,
    pub net_income: Decimal,
    pub net_margin: Decimal,
    pub tagged_items_count: usize,
    /// Signed sum of every tagged transaction, so it matches the net exclusions.
    pub tagged_amount: Decimal,
}

pub fn calculate_summary(
    transactions: &[Transaction],
    accounts: &Accounts,
    tags: &Tags,
) -> SummaryMetrics {
    let (tagged, active): (Vec<&Transaction>, Vec<&Transaction>) =
        transactions.iter().partition(|t| tags.is_tagged(t.id()));

    let by_section = |section: PlSection| -> Decimal {
        active
            .iter()
            .filter(|t| in_section(t, section, accounts))
            .map(|t| t.value())
            .sum()
    };

    let revenue: Vec<&&Transaction> = active
        .iter()
        .filter(|t| numeric_code(t.account_code()).is_some_and(|c| REVENUE_BAND.contains(&c)))
        .collect();
    let revenue_sum = |codes: &[&str]| -> Decimal {
        revenue
            .iter()
            .filter(|t| codes.contains(&t.account_code()))
            .map(|t| t.value())
            .sum()
    };

    let gross_revenue = revenue_sum(GROSS_REVENUE_CODES);
    let contra_revenue = revenue_sum(CONTRA_REVENUE_CODES);
    let net_revenue = gross_revenue + contra_revenue;

    let total_cogs = by_section(PlSection::Cogs);
    let total_cost_of_sales = by_section(PlSection::CostOfSales);
    let total_opex = by_section(PlSection::OperatingExpenses);
    let other_income = by_section(PlSection::OtherIncome);

    let gross_profit = net_revenue - total_cogs - total_cost_of_sales;
    let net_income = gross_profit - total_opex + other_income;

    debug!(
        "Summarised {} active and {} tagged transactions",
        active.len(),
        tagged.len()
    );

    SummaryMetrics {
        gross_revenue,
        contra_revenue,
        net_revenue,
        total_cogs,
        total_cost_of_sales,
        gross_profit,
        gross_margin: margin(gross_profit, net_revenue),
        total_opex,
        other_income,
        net_income,
        net_margin: margin(net_income, net_revenue),
        tagged_items_count: tagged.len(),
        tagged_amount: tagged.iter().map(|t| t.value()).sum(),
    }
}
