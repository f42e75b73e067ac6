use crate::model::{Account, Accounts, MonthlyAmounts, PlSection, Tags, Transaction};
use crate::pnl::aggregate::{aggregate_monthly, RowAggregate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One account line of the detailed P&L.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlRow {
    pub account_code: String,
    pub account: Account,
    pub monthly_amounts: MonthlyAmounts,
    pub ytd_total: Decimal,
    pub transaction_count: usize,
}

impl PlRow {
    fn new(account: &Account, aggregate: RowAggregate) -> Self {
        Self {
            account_code: account.code().to_string(),
            account: account.clone(),
            monthly_amounts: aggregate.monthly_amounts,
            ytd_total: aggregate.ytd_total,
            transaction_count: aggregate.transaction_count,
        }
    }
}

fn rows_for<'a, S: AsRef<str>>(
    candidates: impl IntoIterator<Item = &'a Account>,
    transactions: &[Transaction],
    accounts: &Accounts,
    months: &[S],
    tags: &Tags,
) -> Vec<PlRow> {
    candidates
        .into_iter()
        .filter_map(|account| {
            let aggregate = aggregate_monthly(account.code(), transactions, accounts, months, tags);
            aggregate
                .has_activity()
                .then(|| PlRow::new(account, aggregate))
        })
        .collect()
}

/// Builds one row per top-level account of `section`, ordered by code as strings. Accounts with
/// no transactions at all are left out; an account whose transactions net to zero is kept.
pub fn build_section_rows<S: AsRef<str>>(
    section: PlSection,
    transactions: &[Transaction],
    accounts: &Accounts,
    months: &[S],
    tags: &Tags,
) -> Vec<PlRow> {
    rows_for(
        accounts.top_level(section),
        transactions,
        accounts,
        months,
        tags,
    )
}

/// Builds the drill-down rows under `account_code`: one per direct child, in the parent's child
/// order, with the same activity rule as `build_section_rows`.
pub fn build_child_rows<S: AsRef<str>>(
    account_code: &str,
    transactions: &[Transaction],
    accounts: &Accounts,
    months: &[S],
    tags: &Tags,
) -> Vec<PlRow> {
    rows_for(
        accounts.children_of(account_code),
        transactions,
        accounts,
        months,
        tags,
    )
}
