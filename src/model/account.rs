use crate::Result;
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// The top-level P&L category that every account belongs to.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlSection {
    Revenue,
    Cogs,
    CostOfSales,
    #[default]
    OperatingExpenses,
    OtherIncome,
    Excluded,
}

serde_plain::derive_display_from_serialize!(PlSection);
serde_plain::derive_fromstr_from_deserialize!(PlSection);

impl PlSection {
    /// The five sections that drive the summary math, in report order.
    pub const REPORTED: [PlSection; 5] = [
        PlSection::Revenue,
        PlSection::Cogs,
        PlSection::CostOfSales,
        PlSection::OperatingExpenses,
        PlSection::OtherIncome,
    ];

    /// Classifies an account by its numeric code band. Codes outside every known band, including
    /// non-numeric codes, fall into operating expenses.
    pub fn classify(code: &str) -> PlSection {
        match numeric_code(code) {
            Some(4000..=4099) => PlSection::Revenue,
            Some(5000..=5999) => PlSection::Cogs,
            Some(6000..=6099) => PlSection::CostOfSales,
            Some(6100..=6999) => PlSection::OperatingExpenses,
            Some(7000..=7999) => PlSection::OtherIncome,
            _ => PlSection::OperatingExpenses,
        }
    }

    /// A human-readable title for report headings.
    pub fn title(&self) -> &'static str {
        match self {
            PlSection::Revenue => "Revenue",
            PlSection::Cogs => "Cost of Goods Sold",
            PlSection::CostOfSales => "Cost of Sales",
            PlSection::OperatingExpenses => "Operating Expenses",
            PlSection::OtherIncome => "Other Income",
            PlSection::Excluded => "Excluded",
        }
    }
}

/// Parses the leading run of ASCII digits in `code` as a base-10 number, ignoring leading
/// whitespace. `"4000"` and `"4000 Sales"` both give 4000; `"Sales"` gives `None`.
pub fn numeric_code(code: &str) -> Option<u32> {
    let trimmed = code.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

/// One node in the chart of accounts.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Account {
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) section: PlSection,
    pub(crate) parent_code: Option<String>,
    /// Child account codes in display order.
    pub(crate) children: Vec<String>,
    pub(crate) depth: u32,
}

impl Account {
    /// Creates a top-level account with no children.
    pub fn new(code: impl Into<String>, name: impl Into<String>, section: PlSection) -> Self {
        let code = code.into();
        let name = name.into();
        Self {
            full_name: format!("{code} {name}"),
            code,
            name,
            section,
            parent_code: None,
            children: Vec::new(),
            depth: 0,
        }
    }

    /// Sets the parent code. The parent must also list this account among its children. The depth
    /// is assigned when the account joins an `Accounts`.
    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }

    pub fn with_children<S: Into<String>>(mut self, children: impl IntoIterator<Item = S>) -> Self {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn section(&self) -> PlSection {
        self.section
    }

    pub fn parent_code(&self) -> Option<&str> {
        self.parent_code.as_deref()
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_code.is_none()
    }
}

/// The chart of accounts: an arena of accounts keyed by code.
///
/// Construction validates that the parent/child links form a proper forest. Everything that walks
/// the tree relies on that, because a transaction reachable from two top-level accounts would be
/// counted twice.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Account>", into = "Vec<Account>")]
pub struct Accounts {
    map: BTreeMap<String, Account>,
}

impl Accounts {
    /// Builds the arena and validates it.
    ///
    /// # Errors
    /// - Two accounts share a code.
    /// - A `parent_code` or a child code does not resolve to an account.
    /// - A parent lists a child whose `parent_code` points elsewhere, or a child is not listed by
    ///   its parent.
    /// - An account is listed as a child more than once.
    /// - The links contain a cycle.
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for account in accounts {
            let code = account.code.clone();
            if map.insert(code.clone(), account).is_some() {
                bail!("Account code '{code}' appears more than once");
            }
        }
        let mut accounts = Self { map };
        accounts.validate()?;
        accounts.assign_depths();
        Ok(accounts)
    }

    /// Sets each account's depth to its distance from a top-level account. Only called once the
    /// links are known to form a forest.
    fn assign_depths(&mut self) {
        let mut stack: Vec<(String, u32)> = self
            .map
            .values()
            .filter(|a| a.is_top_level())
            .map(|a| (a.code.clone(), 0))
            .collect();
        while let Some((code, depth)) = stack.pop() {
            if let Some(account) = self.map.get_mut(&code) {
                account.depth = depth;
                stack.extend(account.children.iter().map(|c| (c.clone(), depth + 1)));
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let mut claimed: BTreeSet<&str> = BTreeSet::new();
        for account in self.map.values() {
            if let Some(parent_code) = account.parent_code() {
                let parent = match self.map.get(parent_code) {
                    Some(parent) => parent,
                    None => bail!(
                        "Account '{}' names parent '{parent_code}' which does not exist",
                        account.code
                    ),
                };
                ensure!(
                    parent.children.iter().any(|c| c == &account.code),
                    "Account '{}' names parent '{parent_code}' but is not among its children",
                    account.code
                );
            }
            for child_code in &account.children {
                let child = match self.map.get(child_code) {
                    Some(child) => child,
                    None => bail!(
                        "Account '{}' lists child '{child_code}' which does not exist",
                        account.code
                    ),
                };
                ensure!(
                    child.parent_code() == Some(account.code.as_str()),
                    "Account '{}' lists child '{child_code}' whose parent is {:?}",
                    account.code,
                    child.parent_code()
                );
                ensure!(
                    claimed.insert(child_code.as_str()),
                    "Account '{child_code}' is listed as a child more than once"
                );
            }
        }

        // With consistent links, every account is reachable from a root unless it sits on a
        // cycle, so anything unvisited after walking down from the roots is on one.
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = self
            .map
            .values()
            .filter(|a| a.is_top_level())
            .map(|a| a.code.as_str())
            .collect();
        while let Some(code) = stack.pop() {
            if !visited.insert(code) {
                continue;
            }
            if let Some(account) = self.map.get(code) {
                stack.extend(account.children.iter().map(String::as_str));
            }
        }
        if let Some(stray) = self.map.keys().find(|c| !visited.contains(c.as_str())) {
            bail!("Account '{stray}' is part of a parent/child cycle");
        }
        trace!("Validated {} accounts", self.map.len());
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<&Account> {
        self.map.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.map.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates accounts in lexicographic code order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.map.values()
    }

    /// Top-level accounts of `section`, ordered by code as strings (so `"10"` sorts before `"9"`).
    pub fn top_level(&self, section: PlSection) -> Vec<&Account> {
        self.map
            .values()
            .filter(|a| a.section == section && a.is_top_level())
            .collect()
    }

    /// The direct children of `code` in their declared order. Unknown codes have no children.
    pub fn children_of(&self, code: &str) -> Vec<&Account> {
        self.get(code)
            .map(|a| a.children.iter().filter_map(|c| self.get(c)).collect())
            .unwrap_or_default()
    }
}

impl TryFrom<Vec<Account>> for Accounts {
    type Error = crate::Error;

    fn try_from(value: Vec<Account>) -> Result<Self> {
        Accounts::new(value)
    }
}

impl From<Accounts> for Vec<Account> {
    fn from(value: Accounts) -> Self {
        value.map.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest() -> Vec<Account> {
        vec![
            Account::new("6100", "Advertising", PlSection::OperatingExpenses)
                .with_children(["6110", "6120"]),
            Account::new("6110", "Paid Ads", PlSection::OperatingExpenses).with_parent("6100"),
            Account::new("6120", "Affiliates", PlSection::OperatingExpenses).with_parent("6100"),
            Account::new("4000", "Sales", PlSection::Revenue),
        ]
    }

    #[test]
    fn test_classify() {
        assert_eq!(PlSection::classify("4000"), PlSection::Revenue);
        assert_eq!(PlSection::classify("4099"), PlSection::Revenue);
        assert_eq!(PlSection::classify("4100"), PlSection::OperatingExpenses);
        assert_eq!(PlSection::classify("5030"), PlSection::Cogs);
        assert_eq!(PlSection::classify("6065"), PlSection::CostOfSales);
        assert_eq!(PlSection::classify("6110"), PlSection::OperatingExpenses);
        assert_eq!(PlSection::classify("7010"), PlSection::OtherIncome);
        assert_eq!(PlSection::classify("abc"), PlSection::OperatingExpenses);
    }

    #[test]
    fn test_numeric_code() {
        assert_eq!(numeric_code("4000"), Some(4000));
        assert_eq!(numeric_code("4000 Sales"), Some(4000));
        assert_eq!(numeric_code(" 42x"), Some(42));
        assert_eq!(numeric_code("Sales"), None);
        assert_eq!(numeric_code(""), None);
    }

    #[test]
    fn test_section_serde_names() {
        assert_eq!(PlSection::CostOfSales.to_string(), "costOfSales");
        assert_eq!(
            "operatingExpenses".parse::<PlSection>().unwrap(),
            PlSection::OperatingExpenses
        );
        assert!("bogus".parse::<PlSection>().is_err());
    }

    #[test]
    fn test_valid_forest() {
        let accounts = Accounts::new(forest()).unwrap();
        assert_eq!(accounts.len(), 4);
        let children: Vec<&str> = accounts.children_of("6100").iter().map(|a| a.code()).collect();
        assert_eq!(children, vec!["6110", "6120"]);
        assert!(accounts.children_of("9999").is_empty());
    }

    #[test]
    fn test_top_level_sorts_as_strings() {
        let accounts = Accounts::new(vec![
            Account::new("900", "Short", PlSection::OperatingExpenses),
            Account::new("6100", "Long", PlSection::OperatingExpenses),
            Account::new("10000", "Longer", PlSection::OperatingExpenses),
        ])
        .unwrap();
        let codes: Vec<&str> = accounts
            .top_level(PlSection::OperatingExpenses)
            .iter()
            .map(|a| a.code())
            .collect();
        assert_eq!(codes, vec!["10000", "6100", "900"]);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let mut accounts = forest();
        accounts.push(Account::new("4000", "Sales again", PlSection::Revenue));
        assert!(Accounts::new(accounts).is_err());
    }

    #[test]
    fn test_dangling_parent_rejected() {
        let accounts = vec![Account::new("6110", "Paid Ads", PlSection::OperatingExpenses)
            .with_parent("6100")];
        let err = Accounts::new(accounts).unwrap_err().to_string();
        assert!(err.contains("does not exist"), "{err}");
    }

    #[test]
    fn test_dangling_child_rejected() {
        let accounts = vec![
            Account::new("6100", "Advertising", PlSection::OperatingExpenses).with_children(["6110"]),
        ];
        assert!(Accounts::new(accounts).is_err());
    }

    #[test]
    fn test_unlisted_child_rejected() {
        let accounts = vec![
            Account::new("6100", "Advertising", PlSection::OperatingExpenses),
            Account::new("6110", "Paid Ads", PlSection::OperatingExpenses).with_parent("6100"),
        ];
        assert!(Accounts::new(accounts).is_err());
    }

    #[test]
    fn test_child_with_two_parents_rejected() {
        let accounts = vec![
            Account::new("6100", "Advertising", PlSection::OperatingExpenses).with_children(["6110"]),
            Account::new("6200", "Other", PlSection::OperatingExpenses).with_children(["6110"]),
            Account::new("6110", "Paid Ads", PlSection::OperatingExpenses).with_parent("6100"),
        ];
        assert!(Accounts::new(accounts).is_err());
    }

    #[test]
    fn test_depth_follows_nesting() {
        let accounts = Accounts::new(vec![
            Account::new("6000", "Cost of Sales", PlSection::CostOfSales).with_children(["6060"]),
            Account::new("6060", "Merchant Fees", PlSection::CostOfSales)
                .with_parent("6000")
                .with_children(["6065"]),
            Account::new("6065", "Shopify", PlSection::CostOfSales).with_parent("6060"),
        ])
        .unwrap();
        let depth = |code| accounts.get(code).unwrap().depth();
        assert_eq!(depth("6000"), 0);
        assert_eq!(depth("6060"), 1);
        assert_eq!(depth("6065"), 2);

        // a stale depth in serialized input is recomputed
        let json = serde_json::to_string(&accounts).unwrap().replace("\"depth\":2", "\"depth\":7");
        let back: Accounts = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("6065").unwrap().depth(), 2);
    }

    #[test]
    fn test_cycle_rejected() {
        let accounts = vec![
            Account::new("1", "A", PlSection::OperatingExpenses)
                .with_parent("2")
                .with_children(["2"]),
            Account::new("2", "B", PlSection::OperatingExpenses)
                .with_parent("1")
                .with_children(["1"]),
        ];
        let err = Accounts::new(accounts).unwrap_err().to_string();
        assert!(err.contains("cycle"), "{err}");
    }

    #[test]
    fn test_serde_validates() {
        let json = serde_json::to_string(&Accounts::new(forest()).unwrap()).unwrap();
        let back: Accounts = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 4);

        let bad = r#"[{"code":"1","name":"A","full_name":"1 A","section":"revenue",
            "parent_code":"2","children":[],"depth":1}]"#;
        assert!(serde_json::from_str::<Accounts>(bad).is_err());
    }
}
