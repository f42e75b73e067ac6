use crate::model::{Accounts, Tags, Transaction};
use std::collections::HashSet;
use tracing::{trace, warn};

/// Whether tagged transactions take part in a resolution.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum TagFilter {
    /// Tagged transactions are left out. Every P&L aggregate uses this.
    #[default]
    ExcludeTagged,
    /// Tagged transactions are kept, for grouping exclusions elsewhere.
    IncludeTagged,
}

impl TagFilter {
    pub(crate) fn admits(self, transaction: &Transaction, tags: &Tags) -> bool {
        match self {
            TagFilter::ExcludeTagged => !tags.is_tagged(transaction.id()),
            TagFilter::IncludeTagged => true,
        }
    }
}

/// Returns true if `transaction` posts directly to `account_code`, either through its own code or,
/// when its own code is not a known account, through its declared parent.
pub(crate) fn posts_to(transaction: &Transaction, account_code: &str, accounts: &Accounts) -> bool {
    transaction.account_code() == account_code
        || (transaction.parent_account_code() == Some(account_code)
            && !accounts.contains(transaction.account_code()))
}

/// Collects every transaction that belongs to `account_code` or any of its descendants.
///
/// The account's own postings come first, then each child's subtree in the account's declared
/// child order. An unknown `account_code` resolves to nothing. No deduplication is performed: in a
/// proper forest a transaction posts to at most one node on any path. A visited set still guards
/// the walk so that a malformed hierarchy cannot recurse forever.
pub fn resolve_account_transactions<'a>(
    account_code: &str,
    transactions: &'a [Transaction],
    accounts: &Accounts,
    tags: &Tags,
    filter: TagFilter,
) -> Vec<&'a Transaction> {
    let mut visited = HashSet::new();
    let mut resolved = Vec::new();
    collect(
        account_code,
        transactions,
        accounts,
        tags,
        filter,
        &mut visited,
        &mut resolved,
    );
    trace!(
        "Resolved {} transactions for account {account_code}",
        resolved.len()
    );
    resolved
}

fn collect<'a>(
    account_code: &str,
    transactions: &'a [Transaction],
    accounts: &Accounts,
    tags: &Tags,
    filter: TagFilter,
    visited: &mut HashSet<String>,
    resolved: &mut Vec<&'a Transaction>,
) {
    let account = match accounts.get(account_code) {
        Some(account) => account,
        None => return,
    };
    if !visited.insert(account_code.to_string()) {
        warn!("Account {account_code} was reached twice while resolving; skipping the repeat");
        return;
    }

    resolved.extend(
        transactions
            .iter()
            .filter(|t| posts_to(t, account_code, accounts) && filter.admits(t, tags)),
    );

    for child_code in account.children() {
        collect(
            child_code,
            transactions,
            accounts,
            tags,
            filter,
            visited,
            resolved,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, PlSection, Tag, TagCategory};
    use crate::test::{accounts, ids, ledger, tagged};
    use rust_decimal_macros::dec;

    #[test]
    fn test_leaf_account() {
        let accounts = accounts();
        let txns = ledger();
        let found = resolve_account_transactions(
            "6110",
            &txns,
            &accounts,
            &Tags::new(),
            TagFilter::ExcludeTagged,
        );
        assert_eq!(ids(&found), vec!["google-nov", "facebook-nov", "bing-dec"]);
    }

    #[test]
    fn test_parent_collects_descendants_in_child_order() {
        let accounts = accounts();
        let txns = ledger();
        let found = resolve_account_transactions(
            "6100",
            &txns,
            &accounts,
            &Tags::new(),
            TagFilter::ExcludeTagged,
        );
        // direct postings and orphans first, then 6110, then 6120
        assert_eq!(
            ids(&found),
            vec![
                "ads-misc",
                "orphan-9999",
                "google-nov",
                "facebook-nov",
                "bing-dec",
                "affiliate-jan"
            ]
        );
    }

    #[test]
    fn test_unknown_account_is_empty() {
        let txns = ledger();
        let found = resolve_account_transactions(
            "0000",
            &txns,
            &accounts(),
            &Tags::new(),
            TagFilter::ExcludeTagged,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_parent_fallback_only_for_unknown_accounts() {
        let accounts = accounts();
        let txns = ledger();
        let tags = Tags::new();
        let for_parent = resolve_account_transactions(
            "6100",
            &txns,
            &accounts,
            &tags,
            TagFilter::ExcludeTagged,
        );
        assert!(ids(&for_parent).contains(&"orphan-9999"));

        // 6110 is known, so a transaction posted to it that also names 6100 as parent is counted
        // only at 6110
        let known = Transaction::new("known", "6110", dec!(5), "11/02/2025").with_parent("6100");
        let txns = vec![known];
        let direct = resolve_account_transactions(
            "6100",
            &txns,
            &accounts,
            &tags,
            TagFilter::ExcludeTagged,
        );
        assert_eq!(ids(&direct), vec!["known"]);
        assert_eq!(
            direct.len(),
            1,
            "reached through the child, never through the fallback"
        );

        for other in ["4000", "6120", "5000"] {
            let all = ledger();
            let found = resolve_account_transactions(
                other,
                &all,
                &accounts,
                &tags,
                TagFilter::ExcludeTagged,
            );
            assert!(!ids(&found).contains(&"orphan-9999"), "{other}");
        }
    }

    #[test]
    fn test_tag_exclusivity() {
        let accounts = accounts();
        let txns = ledger();
        let tags = tagged();
        for account in accounts.iter() {
            let excluded = resolve_account_transactions(
                account.code(),
                &txns,
                &accounts,
                &tags,
                TagFilter::ExcludeTagged,
            );
            assert!(excluded.iter().all(|t| !tags.is_tagged(t.id())));
        }

        let included = resolve_account_transactions(
            "6110",
            &txns,
            &accounts,
            &tags,
            TagFilter::IncludeTagged,
        );
        assert!(ids(&included).contains(&"bing-dec"));
        let excluded = resolve_account_transactions(
            "6110",
            &txns,
            &accounts,
            &tags,
            TagFilter::ExcludeTagged,
        );
        assert!(!ids(&excluded).contains(&"bing-dec"));
    }

    #[test]
    fn test_tagged_orphan_is_excluded() {
        let accounts = accounts();
        let txns = ledger();
        let mut tags = Tags::new();
        tags.insert("orphan-9999", Tag::new(TagCategory::Personal, "Misc"));
        let found = resolve_account_transactions(
            "6100",
            &txns,
            &accounts,
            &tags,
            TagFilter::ExcludeTagged,
        );
        assert!(!ids(&found).contains(&"orphan-9999"));
    }

    #[test]
    fn test_single_account() {
        let accounts = Accounts::new(vec![Account::new("4000", "Sales", PlSection::Revenue)]).unwrap();
        let txns = vec![
            Transaction::new("a", "4000", dec!(1), "01/01/2025"),
            Transaction::new("b", "4001", dec!(1), "01/01/2025"),
        ];
        let found =
            resolve_account_transactions("4000", &txns, &accounts, &Tags::new(), TagFilter::default());
        assert_eq!(ids(&found), vec!["a"]);
    }
}
