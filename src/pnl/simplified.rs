//! A flat, hand-curated re-bucketing of the ledger into business-friendly labels.
//!
//! The view is driven by a `SimplifiedMapping`, a table of labels and the account codes feeding
//! them. It does not consult the account hierarchy at all, so its totals only agree with the
//! summary when the table's code sets partition the same accounts the sections do.

use crate::model::{MonthlyAmounts, Tags, Transaction};
use crate::{utils, Result};
use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A case-insensitive test on a transaction's `name`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePredicate {
    /// The name contains at least one of the needles.
    NameContainsAny(Vec<String>),
    /// The name contains none of the needles.
    NameContainsNone(Vec<String>),
}

impl NamePredicate {
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        let contains = |needles: &[String]| {
            needles
                .iter()
                .any(|needle| name.contains(&needle.to_lowercase()))
        };
        match self {
            NamePredicate::NameContainsAny(needles) => contains(needles),
            NamePredicate::NameContainsNone(needles) => !contains(needles),
        }
    }
}

/// One labelled line of the mapping table.
///
/// Entries sharing an account code must use predicates that are mutually exclusive, otherwise a
/// transaction is counted on more than one line.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "match")]
pub enum MappingEntry {
    PlainCodes {
        label: String,
        codes: Vec<String>,
    },
    FilteredCodes {
        label: String,
        codes: Vec<String>,
        predicate: NamePredicate,
    },
}

impl MappingEntry {
    pub fn plain<S: Into<String>>(label: impl Into<String>, codes: impl IntoIterator<Item = S>) -> Self {
        MappingEntry::PlainCodes {
            label: label.into(),
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn filtered<S: Into<String>>(
        label: impl Into<String>,
        codes: impl IntoIterator<Item = S>,
        predicate: NamePredicate,
    ) -> Self {
        MappingEntry::FilteredCodes {
            label: label.into(),
            codes: codes.into_iter().map(Into::into).collect(),
            predicate,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MappingEntry::PlainCodes { label, .. } | MappingEntry::FilteredCodes { label, .. } => {
                label
            }
        }
    }

    pub fn codes(&self) -> &[String] {
        match self {
            MappingEntry::PlainCodes { codes, .. } | MappingEntry::FilteredCodes { codes, .. } => {
                codes
            }
        }
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        if !self.codes().iter().any(|c| c == transaction.account_code()) {
            return false;
        }
        match self {
            MappingEntry::PlainCodes { .. } => true,
            MappingEntry::FilteredCodes { predicate, .. } => predicate.matches(transaction.name()),
        }
    }
}

/// The label table for the three groups of the simplified view.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SimplifiedMapping {
    pub income: Vec<MappingEntry>,
    pub cogs: Vec<MappingEntry>,
    pub expenses: Vec<MappingEntry>,
}

impl Default for SimplifiedMapping {
    fn default() -> Self {
        use MappingEntry as E;
        use NamePredicate::{NameContainsAny, NameContainsNone};

        let google = || vec!["google".to_string()];
        let facebook = || vec!["facebook".to_string(), "facebk".to_string()];

        Self {
            income: vec![
                E::plain("Sales", ["4000", "4030"]),
                E::plain("Discounts", ["4010"]),
                E::plain("Refunds", ["4020"]),
                E::plain("Chargebacks", ["4040"]),
            ],
            cogs: vec![
                E::plain("Product Costs", ["5000", "5030", "5040", "5050"]),
                E::plain("Shipping & Fulfillment", ["5010", "6010", "6020", "6035"]),
            ],
            expenses: vec![
                E::filtered("Google Ads", ["6110"], NameContainsAny(google())),
                E::filtered("Facebook Ads", ["6110"], NameContainsAny(facebook())),
                E::filtered(
                    "Other Paid Ads",
                    ["6110"],
                    NameContainsNone([google(), facebook()].concat()),
                ),
                E::plain("Processing Fees", ["6055", "6065", "6075"]),
                E::plain("Affiliate / Creator Payouts", ["6120", "6125"]),
                E::plain("Marketing Agencies", ["6130"]),
                E::plain("Shopify Apps", ["6070"]),
                E::plain("Marketing Software", ["6140"]),
                E::plain("Virtual Assistants / Contractors", ["6240"]),
                E::plain("Other Software", ["6375"]),
                E::plain("Accounting", ["6330"]),
                E::plain(
                    "Other Expenses",
                    [
                        "6100", "6150", "6210", "6250", "6260", "6290", "6300", "6320", "6390",
                        "6410", "6450", "6470", "6495",
                    ],
                ),
            ],
        }
    }
}

impl SimplifiedMapping {
    /// Loads a mapping table from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        utils::deserialize(path)
            .await
            .with_context(|| format!("Unable to load the simplified mapping from {}", path.display()))
    }
}

/// One line of the simplified view.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LineItem {
    pub label: String,
    pub monthly_amounts: MonthlyAmounts,
    pub ytd: Decimal,
    #[serde(default)]
    pub is_total: bool,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub indent: u8,
    /// The transactions behind the line, for drill-down. Synthetic total lines have none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<Transaction>,
}

impl LineItem {
    fn total(label: &str, monthly_amounts: MonthlyAmounts) -> Self {
        Self {
            label: label.to_string(),
            ytd: monthly_amounts.total(),
            monthly_amounts,
            is_total: true,
            is_bold: true,
            indent: 0,
            transactions: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SimplifiedView {
    pub income: Vec<LineItem>,
    pub cogs: Vec<LineItem>,
    pub expenses: Vec<LineItem>,
}

/// Sums the active transactions matching `entry`. Only transactions inside the window count, and
/// only those are kept for drill-down.
fn line_item<S: AsRef<str>>(entry: &MappingEntry, active: &[&Transaction], months: &[S]) -> LineItem {
    let mut monthly_amounts = MonthlyAmounts::zeroed(months);
    let mut ytd = Decimal::ZERO;
    let mut transactions = Vec::new();
    for txn in active.iter().filter(|t| entry.matches(t)) {
        if monthly_amounts.add(txn.month(), txn.value()) {
            ytd += txn.value();
            transactions.push((*txn).clone());
        }
    }
    LineItem {
        label: entry.label().to_string(),
        monthly_amounts,
        ytd,
        transactions,
        ..Default::default()
    }
}

fn sum_lines<S: AsRef<str>>(items: &[LineItem], months: &[S]) -> MonthlyAmounts {
    items.iter().fold(MonthlyAmounts::zeroed(months), |acc, item| {
        acc.combine(&item.monthly_amounts, |a, b| a + b)
    })
}

/// Builds the simplified view over the untagged transactions.
///
/// Every income and COGS label is listed even when empty, while expense labels appear only with a
/// non-zero YTD. Synthetic lines: "Total Income" ends the income group, "Gross Profit" ends the
/// COGS group, and "Total Expenses" then "Net Profit" end the expenses group.
pub fn build_alternate_view<S: AsRef<str>>(
    transactions: &[Transaction],
    tags: &Tags,
    months: &[S],
    mapping: &SimplifiedMapping,
) -> SimplifiedView {
    let active: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| !tags.is_tagged(t.id()))
        .collect();

    let mut income: Vec<LineItem> = mapping
        .income
        .iter()
        .map(|entry| line_item(entry, &active, months))
        .collect();
    let total_income = sum_lines(&income, months);

    let mut cogs: Vec<LineItem> = mapping
        .cogs
        .iter()
        .map(|entry| line_item(entry, &active, months))
        .collect();
    let total_cogs = sum_lines(&cogs, months);
    let gross_profit = total_income.combine(&total_cogs, |i, c| i - c);

    let mut expenses: Vec<LineItem> = mapping
        .expenses
        .iter()
        .map(|entry| line_item(entry, &active, months))
        .filter(|item| !item.ytd.is_zero())
        .map(|item| LineItem { indent: 1, ..item })
        .collect();
    let total_expenses = sum_lines(&expenses, months);
    let net_profit = gross_profit.combine(&total_expenses, |g, e| g - e);

    income.push(LineItem::total("Total Income", total_income));
    cogs.push(LineItem::total("Gross Profit", gross_profit));
    expenses.push(LineItem::total("Total Expenses", total_expenses));
    expenses.push(LineItem::total("Net Profit", net_profit));

    debug!(
        "Built simplified view from {} active transactions: {} expense lines",
        active.len(),
        expenses.len() - 2
    );

    SimplifiedView {
        income,
        cogs,
        expenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{ledger, tagged, MONTHS};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn labels(items: &[LineItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    fn line<'a>(items: &'a [LineItem], label: &str) -> &'a LineItem {
        items.iter().find(|i| i.label == label).unwrap()
    }

    #[test]
    fn test_predicates() {
        let any = NamePredicate::NameContainsAny(vec!["facebook".into(), "FACEBK".into()]);
        assert!(any.matches("FACEBK *ADS 123"));
        assert!(any.matches("Facebook Ads - Nov"));
        assert!(!any.matches("Google Ads"));

        let none = NamePredicate::NameContainsNone(vec!["google".into()]);
        assert!(none.matches("Bing Ads"));
        assert!(none.matches(""));
        assert!(!none.matches("GOOGLE*ADS"));
    }

    #[test]
    fn test_expense_split_by_name() {
        let txns = vec![
            Transaction::new("g", "6110", dec!(200), "11/20/2025").with_name("Google Ads - Nov"),
            Transaction::new("f", "6110", dec!(150), "11/21/2025").with_name("Facebook Ads - Nov"),
        ];
        let view = build_alternate_view(&txns, &Tags::new(), &MONTHS, &SimplifiedMapping::default());
        assert_eq!(line(&view.expenses, "Google Ads").ytd, dec!(200));
        assert_eq!(line(&view.expenses, "Facebook Ads").ytd, dec!(150));
        assert!(view.expenses.iter().all(|i| i.label != "Other Paid Ads"));
        assert_eq!(line(&view.expenses, "Google Ads").transactions[0].id(), "g");
    }

    #[test]
    fn test_full_view() {
        let view = build_alternate_view(&ledger(), &tagged(), &MONTHS, &SimplifiedMapping::default());

        // income and cogs labels are always present
        assert_eq!(
            labels(&view.income),
            vec!["Sales", "Discounts", "Refunds", "Chargebacks", "Total Income"]
        );
        assert_eq!(
            labels(&view.cogs),
            vec!["Product Costs", "Shipping & Fulfillment", "Gross Profit"]
        );
        let sales = line(&view.income, "Sales");
        assert_eq!(sales.monthly_amounts.get("2025-11"), Some(dec!(1050)));
        assert_eq!(sales.ytd, dec!(3050));
        assert_eq!(sales.indent, 0);
        assert_eq!(line(&view.income, "Refunds").ytd, Decimal::ZERO);
        let total_income = line(&view.income, "Total Income");
        assert_eq!(total_income.ytd, dec!(2950));
        assert!(total_income.is_total && total_income.is_bold);
        assert!(total_income.transactions.is_empty());
        assert_eq!(line(&view.cogs, "Gross Profit").ytd, dec!(2150));

        // the tagged Bing spend empties "Other Paid Ads"; accounting nets to zero; the affiliate
        // payout falls outside the window
        assert_eq!(
            labels(&view.expenses),
            vec![
                "Google Ads",
                "Facebook Ads",
                "Processing Fees",
                "Other Expenses",
                "Total Expenses",
                "Net Profit"
            ]
        );
        assert!(view.expenses[..4].iter().all(|i| i.indent == 1));
        assert_eq!(line(&view.expenses, "Other Expenses").ytd, dec!(25));
        assert_eq!(line(&view.expenses, "Total Expenses").ytd, dec!(405));
        let net = line(&view.expenses, "Net Profit");
        assert_eq!(net.ytd, dec!(1745));
        assert_eq!(net.monthly_amounts.get("2025-11"), Some(dec!(270)));
        assert_eq!(net.monthly_amounts.get("2025-12"), Some(dec!(1475)));
    }

    #[test]
    fn test_out_of_window_not_retained() {
        let view = build_alternate_view(&ledger(), &tagged(), &["2026-01"], &SimplifiedMapping::default());
        let affiliates = line(&view.expenses, "Affiliate / Creator Payouts");
        assert_eq!(affiliates.ytd, dec!(40));
        assert_eq!(affiliates.transactions.len(), 1);
        assert!(line(&view.income, "Sales").transactions.is_empty());
    }

    #[test]
    fn test_custom_mapping() {
        let mapping = SimplifiedMapping {
            income: vec![MappingEntry::plain("Everything", ["4000", "4010", "4030"])],
            cogs: vec![],
            expenses: vec![MappingEntry::plain("Ads", ["6110"])],
        };
        let view = build_alternate_view(&ledger(), &Tags::new(), &MONTHS, &mapping);
        assert_eq!(line(&view.income, "Everything").ytd, dec!(2950));
        assert_eq!(labels(&view.cogs), vec!["Gross Profit"]);
        // untagged: google, facebook and bing
        assert_eq!(line(&view.expenses, "Ads").ytd, dec!(430));
    }

    #[tokio::test]
    async fn test_mapping_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mapping.json");
        let mapping = SimplifiedMapping::default();
        tokio::fs::write(&path, serde_json::to_string_pretty(&mapping).unwrap())
            .await
            .unwrap();
        let loaded = SimplifiedMapping::load(&path).await.unwrap();
        assert_eq!(loaded, mapping);

        let json = serde_json::to_value(&mapping.expenses[0]).unwrap();
        assert_eq!(json["match"], "filtered_codes");
        assert_eq!(json["predicate"]["name_contains_any"][0], "google");
    }
}
