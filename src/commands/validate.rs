use crate::commands::{Inputs, Out};
use crate::model::{Accounts, PlSection, Tags, Transaction};
use crate::pnl::{build_section_rows, section_totals};
use crate::{Config, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// A section whose rows and flat scan disagree.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SectionMismatch {
    pub section: PlSection,
    pub rows_total: Decimal,
    pub section_total: Decimal,
}

/// Data-quality findings the engine itself stays silent about.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Validation {
    pub transactions: usize,
    pub accounts: usize,
    pub months: Vec<String>,
    /// Transactions whose account and declared parent are both unknown. They appear nowhere.
    pub unreachable: Vec<String>,
    /// Tags naming transactions that are not in the ledger.
    pub stale_tags: Vec<String>,
    pub mismatches: Vec<SectionMismatch>,
}

impl Validation {
    pub fn is_clean(&self) -> bool {
        self.unreachable.is_empty() && self.stale_tags.is_empty() && self.mismatches.is_empty()
    }
}

/// Checks `transactions` for reconciliation problems. Tags are only stale when they name an id
/// missing from `known_ids`, which covers the whole export rather than the reporting window.
fn check<S: AsRef<str>>(
    transactions: &[Transaction],
    known_ids: &BTreeSet<String>,
    accounts: &Accounts,
    months: &[S],
    tags: &Tags,
) -> Validation {
    let unreachable = transactions
        .iter()
        .filter(|t| {
            !accounts.contains(t.account_code())
                && !t.parent_account_code().is_some_and(|p| accounts.contains(p))
        })
        .map(|t| t.id().to_string())
        .collect();
    let stale_tags = tags
        .iter()
        .filter(|(id, _)| !known_ids.contains(id.as_str()))
        .map(|(id, _)| id.clone())
        .collect();

    let mut mismatches = Vec::new();
    for section in PlSection::REPORTED {
        let rows_total: Decimal = build_section_rows(section, transactions, accounts, months, tags)
            .iter()
            .map(|r| r.ytd_total)
            .sum();
        let section_total = section_totals(section, transactions, accounts, months, tags).ytd_total;
        if rows_total != section_total {
            warn!("{section} does not reconcile: rows {rows_total}, section {section_total}");
            mismatches.push(SectionMismatch {
                section,
                rows_total,
                section_total,
            });
        }
    }

    Validation {
        transactions: transactions.len(),
        accounts: accounts.len(),
        months: months.iter().map(|m| m.as_ref().to_string()).collect(),
        unreachable,
        stale_tags,
        mismatches,
    }
}

/// Checks the ledger and tag store for problems that would silently skew the reports.
pub async fn validate(config: Config) -> Result<Out<Validation>> {
    let inputs = Inputs::load(&config).await?;
    let validation = check(
        inputs.ledger.transactions(),
        &inputs.known_ids,
        inputs.ledger.accounts(),
        &inputs.months,
        inputs.tags.tags(),
    );
    let message = if validation.is_clean() {
        format!(
            "{} transactions across {} accounts reconcile",
            validation.transactions, validation.accounts
        )
    } else {
        format!(
            "Found {} unreachable transactions, {} stale tags and {} unreconciled sections",
            validation.unreachable.len(),
            validation.stale_tags.len(),
            validation.mismatches.len()
        )
    };
    Ok(Out::new(message, validation))
}
