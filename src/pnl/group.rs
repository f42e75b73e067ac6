use crate::model::{TagCategory, Tags, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Buckets transactions by month. Within a month they are ordered by transaction date; dates that
/// do not parse sort last and ties keep their input order.
pub fn group_by_month(transactions: &[Transaction]) -> BTreeMap<String, Vec<&Transaction>> {
    let mut grouped: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for txn in transactions {
        grouped.entry(txn.month().to_string()).or_default().push(txn);
    }
    for txns in grouped.values_mut() {
        txns.sort_by_key(|t| {
            let date = t.date();
            (date.is_none(), date)
        });
    }
    grouped
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SubAccountGroup {
    pub sub_account: String,
    pub total: Decimal,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryGroup {
    pub category: TagCategory,
    pub total: Decimal,
    /// Sorted by label.
    pub sub_accounts: Vec<SubAccountGroup>,
}

/// Everything pulled out of the P&L by tags.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExcludedGroups {
    pub categories: Vec<CategoryGroup>,
    /// Signed, so it equals the summary's tagged amount.
    pub total: Decimal,
    pub count: usize,
}

/// Groups the tagged transactions by category, then sub-account. Categories without any tagged
/// transaction are left out.
pub fn group_tagged(transactions: &[Transaction], tags: &Tags) -> ExcludedGroups {
    let mut tree: BTreeMap<TagCategory, BTreeMap<&str, Vec<&Transaction>>> = BTreeMap::new();
    for txn in transactions {
        if let Some(tag) = tags.get(txn.id()) {
            tree.entry(tag.category())
                .or_default()
                .entry(tag.sub_account())
                .or_default()
                .push(txn);
        }
    }

    let mut groups = ExcludedGroups::default();
    for (category, sub_accounts) in tree {
        let mut category_group = CategoryGroup {
            category,
            ..Default::default()
        };
        for (label, txns) in sub_accounts {
            let total: Decimal = txns.iter().map(|t| t.value()).sum();
            category_group.total += total;
            groups.count += txns.len();
            category_group.sub_accounts.push(SubAccountGroup {
                sub_account: label.to_string(),
                total,
                transactions: txns.into_iter().cloned().collect(),
            });
        }
        groups.total += category_group.total;
        groups.categories.push(category_group);
    }
    groups
}
