use crate::model::{Accounts, MonthlyAmounts, Tags, Transaction};
use crate::pnl::resolve::{resolve_account_transactions, TagFilter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monthly buckets, YTD total and transaction count for one account subtree.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RowAggregate {
    pub monthly_amounts: MonthlyAmounts,
    /// The sum over the reporting window only.
    pub ytd_total: Decimal,
    /// The number of resolved transactions, including any whose month is outside the window.
    pub transaction_count: usize,
}

impl RowAggregate {
    /// True when the row should be shown: it has a non-zero total or any transactions at all.
    pub fn has_activity(&self) -> bool {
        !self.ytd_total.is_zero() || self.transaction_count > 0
    }
}

/// Folds transactions into zero-initialised monthly buckets and a YTD total. Transactions whose
/// month is not in `months` are skipped entirely.
pub(crate) fn fold_months<'a, S: AsRef<str>>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    months: &[S],
) -> (MonthlyAmounts, Decimal) {
    let mut monthly = MonthlyAmounts::zeroed(months);
    let mut ytd = Decimal::ZERO;
    for txn in transactions {
        if monthly.add(txn.month(), txn.value()) {
            ytd += txn.value();
        }
    }
    (monthly, ytd)
}

/// Aggregates the untagged transactions of `account_code` and its descendants by month.
pub fn aggregate_monthly<S: AsRef<str>>(
    account_code: &str,
    transactions: &[Transaction],
    accounts: &Accounts,
    months: &[S],
    tags: &Tags,
) -> RowAggregate {
    let resolved = resolve_account_transactions(
        account_code,
        transactions,
        accounts,
        tags,
        TagFilter::ExcludeTagged,
    );
    let (monthly_amounts, ytd_total) = fold_months(resolved.iter().copied(), months);
    RowAggregate {
        monthly_amounts,
        ytd_total,
        transaction_count: resolved.len(),
    }
}
