use crate::model::Amount;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single posting from the ledger export. Transactions are never mutated once loaded.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) id: String,
    /// The account the transaction posts to. It may not exist in the chart of accounts.
    pub(crate) account_code: String,
    /// Used only when `account_code` is unknown, so the amount rolls up to its declared parent.
    pub(crate) parent_account_code: Option<String>,
    pub(crate) amount: Amount,
    /// The `YYYY-MM` reporting bucket.
    pub(crate) month: String,
    /// Only used for ordering within a month.
    pub(crate) transaction_date: String,
    pub(crate) transaction_type: String,
    pub(crate) num: String,
    pub(crate) name: String,
    pub(crate) class_full_name: String,
    pub(crate) memo: String,
    pub(crate) account_full_name: String,
    pub(crate) balance: Amount,
}

impl Transaction {
    /// Creates a transaction with the fields the aggregation engine reads. The `month` is derived
    /// from `transaction_date` when it parses.
    pub fn new(
        id: impl Into<String>,
        account_code: impl Into<String>,
        amount: impl Into<Amount>,
        transaction_date: impl Into<String>,
    ) -> Self {
        let transaction_date = transaction_date.into();
        Self {
            id: id.into(),
            account_code: account_code.into(),
            amount: amount.into(),
            month: month_of(&transaction_date).unwrap_or_default(),
            transaction_date,
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_account_code: impl Into<String>) -> Self {
        self.parent_account_code = Some(parent_account_code.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Overrides the derived month.
    pub fn with_month(mut self, month: impl Into<String>) -> Self {
        self.month = month.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn account_code(&self) -> &str {
        &self.account_code
    }

    pub fn parent_account_code(&self) -> Option<&str> {
        self.parent_account_code.as_deref()
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// The numeric amount. Every aggregate sums this.
    pub fn value(&self) -> Decimal {
        self.amount.value()
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn transaction_date(&self) -> &str {
        &self.transaction_date
    }

    pub fn transaction_type(&self) -> &str {
        &self.transaction_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn account_full_name(&self) -> &str {
        &self.account_full_name
    }

    /// The transaction date, if it is in one of the supported formats.
    pub fn date(&self) -> Option<NaiveDate> {
        parse_date(&self.transaction_date)
    }
}

/// Parses `MM/DD/YYYY` (the ledger export format) or `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

/// The `YYYY-MM` month key for a date string, if the date parses.
pub fn month_of(date: &str) -> Option<String> {
    parse_date(date).map(|d| d.format("%Y-%m").to_string())
}
