//! Types that represent the ledger: accounts, transactions, tags and month-bucketed amounts.
mod account;
mod amount;
mod month;
mod tag;
mod transaction;

pub use account::{numeric_code, Account, Accounts, PlSection};
pub use amount::{Amount, AmountError, AmountFormat};
pub use month::{months_in, window, MonthAmount, MonthlyAmounts};
pub use tag::{Tag, TagCategory, TagConfig, TagStore, Tags};
pub use transaction::{month_of, parse_date, Transaction};
use serde::{Deserialize, Serialize};

/// Everything loaded from a ledger export: the flat transaction list, the chart of accounts built
/// from it, and the sorted months it covers.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Ledger {
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) accounts: Accounts,
    pub(crate) months: Vec<String>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>, accounts: Accounts) -> Self {
        let months = months_in(&transactions);
        Self {
            transactions,
            accounts,
            months,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn months(&self) -> &[String] {
        &self.months
    }

    /// Narrows the ledger to a reporting window: transactions outside it are dropped and the
    /// month list keeps only months present in both.
    pub fn restrict_to<S: AsRef<str>>(self, months: &[S]) -> Self {
        let months = window(&self.months, months);
        let transactions = self
            .transactions
            .into_iter()
            .filter(|t| months.iter().any(|m| m == t.month()))
            .collect();
        Self {
            transactions,
            accounts: self.accounts,
            months,
        }
    }
}
