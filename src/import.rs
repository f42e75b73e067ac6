//! Loads a general-ledger CSV export into a `Ledger`.
//!
//! The export is double-entry: every transaction shows up once under the P&L account and once
//! under the offsetting bank or card account. Only sections whose header carries a P&L code
//! (4000 to 7999) are read, and the section header, not the split column, names the account.
//!
//! ```text
//! Company,,,,,,,,,
//! General Ledger,,,,,,,,,
//! <date range>,,,,,,,,,
//! ,,,,,,,,,
//! ,Transaction date,Transaction type,Num,Name,Class full name,Memo/Description,Split account,Amount,Balance
//! 6000 Cost of Sales:6065 Shopify Merchant Fees,,,,,,,,,
//! ,11/15/2025,Expense,,Shopify,,,1000 Checking,30.00,30.00
//! Total for 6000 Cost of Sales:6065 Shopify Merchant Fees,,,,,,,,$30.00,
//! ```

use crate::model::{numeric_code, parse_date, Account, Accounts, Amount, Ledger, PlSection, Transaction};
use crate::{utils, Result};
use anyhow::Context;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lines of report header before the first section.
const HEADER_LINES: u64 = 5;
const TOTAL_PREFIX: &str = "Total for";

const DATE: usize = 1;
const TRANSACTION_TYPE: usize = 2;
const NUM: usize = 3;
const NAME: usize = 4;
const CLASS: usize = 5;
const MEMO: usize = 6;
const AMOUNT: usize = 8;
const BALANCE: usize = 9;

/// Reads and parses the export at `path`.
pub(crate) async fn load_ledger(path: &Path) -> Result<Ledger> {
    let content = utils::read(path).await?;
    let ledger = parse_ledger(content.as_bytes())
        .with_context(|| format!("Unable to parse the ledger export at {}", path.display()))?;
    info!(
        "Loaded {} transactions across {} accounts from {}",
        ledger.transactions().len(),
        ledger.accounts().len(),
        path.display()
    );
    Ok(ledger)
}

/// The account a section header names, e.g. `6000 Cost of Sales:6065 Shopify Merchant Fees`.
#[derive(Debug, Clone, Eq, PartialEq)]
struct SectionHeader {
    full_name: String,
    code: String,
    name: String,
    parent: Option<(String, String)>,
}

/// The four-digit code at the start of `s`, if there is one.
fn leading_code(s: &str) -> Option<&str> {
    let code = s.trim().get(..4)?;
    code.chars().all(|c| c.is_ascii_digit()).then_some(code)
}

/// Strips the code prefix from one part of an account path.
fn strip_code(part: &str) -> &str {
    let part = part.trim();
    match leading_code(part) {
        Some(code) => part[code.len()..].trim_start(),
        None => part,
    }
}

impl SectionHeader {
    /// Parses a section header. Headers without a P&L code are not sections we read.
    fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let section_code = leading_code(header)?;
        if !numeric_code(section_code).is_some_and(|n| (4000..8000).contains(&n)) {
            return None;
        }

        let parts: Vec<&str> = header.split(':').collect();
        let last = parts.last().copied().unwrap_or(header);
        if parts.len() == 1 {
            return Some(Self {
                full_name: header.to_string(),
                code: section_code.to_string(),
                name: strip_code(header).to_string(),
                parent: None,
            });
        }

        // intermediate levels are skipped: the first part is always the parent
        let first = parts[0];
        match leading_code(last) {
            Some(code) => Some(Self {
                full_name: header.to_string(),
                code: code.to_string(),
                name: strip_code(last).to_string(),
                parent: Some((section_code.to_string(), strip_code(first).to_string())),
            }),
            None => {
                warn!("Sub-account '{header}' has no code, posting it to {section_code}");
                Some(Self {
                    full_name: first.trim().to_string(),
                    code: section_code.to_string(),
                    name: strip_code(first).to_string(),
                    parent: None,
                })
            }
        }
    }

    fn parent_code(&self) -> Option<&str> {
        self.parent.as_ref().map(|(code, _)| code.as_str())
    }
}

/// `txn-{date}-{account}-{index}`, where the account part is the alphanumeric characters of the
/// first 20 characters of the account path.
fn transaction_id(date: &str, account_full_name: &str, index: usize) -> String {
    let date = date.replace('/', "-");
    let account: String = account_full_name
        .chars()
        .take(20)
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("txn-{date}-{account}-{index}")
}

/// Accounts keyed by code, created on first sight. Children are appended in the order they appear.
#[derive(Debug, Default)]
struct ChartBuilder {
    accounts: BTreeMap<String, Account>,
}

impl ChartBuilder {
    fn observe(&mut self, header: &SectionHeader) {
        if !self.accounts.contains_key(&header.code) {
            let mut account = Account::new(
                header.code.clone(),
                header.name.clone(),
                PlSection::classify(&header.code),
            )
            .with_full_name(header.full_name.clone());
            if let Some(parent_code) = header.parent_code() {
                account = account.with_parent(parent_code);
            }
            self.accounts.insert(header.code.clone(), account);
        }

        let (parent_code, parent_name) = match &header.parent {
            Some(parent) => parent,
            None => return,
        };
        let recorded_parent = self
            .accounts
            .get(&header.code)
            .and_then(|a| a.parent_code().map(String::from));
        if recorded_parent.as_deref() != Some(parent_code.as_str()) {
            warn!(
                "Account {} was first seen under {:?}, not linking it to {parent_code}",
                header.code, recorded_parent
            );
            return;
        }
        let parent = self.accounts.entry(parent_code.clone()).or_insert_with(|| {
            debug!("Creating a stub for parent account {parent_code}");
            Account::new(
                parent_code.clone(),
                parent_name.clone(),
                PlSection::classify(parent_code),
            )
        });
        if !parent.children.contains(&header.code) {
            parent.children.push(header.code.clone());
        }
    }

    fn build(self) -> Result<Accounts> {
        Accounts::new(self.accounts.into_values())
    }
}

/// Parses a general-ledger export.
///
/// # Errors
/// - The CSV is malformed, an amount does not parse, or the accounts do not form a forest.
pub(crate) fn parse_ledger(reader: impl Read) -> Result<Ledger> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut section: Option<SectionHeader> = None;
    let mut chart = ChartBuilder::default();
    let mut transactions = Vec::new();

    for result in rdr.records() {
        let record = result.context("Unable to read a row of the ledger export")?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if line <= HEADER_LINES {
            continue;
        }
        let first = record.get(0).unwrap_or_default();
        if first.starts_with(TOTAL_PREFIX) {
            continue;
        }
        if !first.is_empty() && record.iter().skip(1).all(str::is_empty) {
            section = SectionHeader::parse(first);
            if section.is_none() {
                debug!("Skipping non-P&L section '{first}'");
            }
            continue;
        }
        let header = match &section {
            Some(header) => header,
            None => continue,
        };

        let field = |i: usize| record.get(i).unwrap_or_default();
        let date = field(DATE);
        if parse_date(date).is_none() {
            continue;
        }
        let amount: Amount = field(AMOUNT)
            .parse()
            .with_context(|| format!("Invalid amount '{}' on line {line}", field(AMOUNT)))?;
        let balance: Amount = field(BALANCE)
            .parse()
            .with_context(|| format!("Invalid balance '{}' on line {line}", field(BALANCE)))?;

        chart.observe(header);
        let index = transactions.len();
        let mut txn = Transaction::new(
            transaction_id(date, &header.full_name, index),
            header.code.clone(),
            amount,
            date,
        );
        txn.parent_account_code = header.parent_code().map(String::from);
        txn.transaction_type = field(TRANSACTION_TYPE).to_string();
        txn.num = field(NUM).to_string();
        txn.name = field(NAME).to_string();
        txn.class_full_name = field(CLASS).to_string();
        txn.memo = field(MEMO).to_string();
        txn.account_full_name = header.full_name.clone();
        txn.balance = balance;
        transactions.push(txn);
    }

    let accounts = chart.build()?;
    Ok(Ledger::new(transactions, accounts))
}
