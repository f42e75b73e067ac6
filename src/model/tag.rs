//! User-applied exclusion tags.
//!
//! A tagged transaction is removed from every standard P&L aggregate. Tags live in a small JSON
//! store next to the config so they survive between runs.

use crate::{utils, Result};
use anyhow::{ensure, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Why a transaction was pulled out of the P&L.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum TagCategory {
    #[default]
    Personal,
    NonRecurring,
}

serde_plain::derive_display_from_serialize!(TagCategory);
serde_plain::derive_fromstr_from_deserialize!(TagCategory);

/// An exclusion record for one transaction.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Tag {
    pub(crate) category: TagCategory,
    /// A free-text bucket within the category, e.g. "Owner travel".
    pub(crate) sub_account: String,
    pub(crate) tagged_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(category: TagCategory, sub_account: impl Into<String>) -> Self {
        Self {
            category,
            sub_account: sub_account.into(),
            tagged_at: Utc::now(),
        }
    }

    pub fn category(&self) -> TagCategory {
        self.category
    }

    pub fn sub_account(&self) -> &str {
        &self.sub_account
    }

    pub fn tagged_at(&self) -> DateTime<Utc> {
        self.tagged_at
    }
}

/// Lookup from transaction id to its tag.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, Tag>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, transaction_id: &str) -> Option<&Tag> {
        self.0.get(transaction_id)
    }

    pub fn is_tagged(&self, transaction_id: &str) -> bool {
        self.0.contains_key(transaction_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tag)> {
        self.0.iter()
    }

    /// Tags a transaction, replacing any earlier tag. Returns the replaced tag.
    pub fn insert(&mut self, transaction_id: impl Into<String>, tag: Tag) -> Option<Tag> {
        self.0.insert(transaction_id.into(), tag)
    }

    pub fn remove(&mut self, transaction_id: &str) -> Option<Tag> {
        self.0.remove(transaction_id)
    }
}

impl FromIterator<(String, Tag)> for Tags {
    fn from_iter<T: IntoIterator<Item = (String, Tag)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The sub-account labels a user has created for each category.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TagConfig {
    #[serde(default)]
    pub(crate) personal: Vec<String>,
    #[serde(default)]
    pub(crate) non_recurring: Vec<String>,
}

impl TagConfig {
    pub fn sub_accounts(&self, category: TagCategory) -> &[String] {
        match category {
            TagCategory::Personal => &self.personal,
            TagCategory::NonRecurring => &self.non_recurring,
        }
    }

    fn sub_accounts_mut(&mut self, category: TagCategory) -> &mut Vec<String> {
        match category {
            TagCategory::Personal => &mut self.personal,
            TagCategory::NonRecurring => &mut self.non_recurring,
        }
    }
}

/// The persisted tag state: tags plus sub-account labels.
///
/// The aggregation engine keeps no cache, but callers that memoise reports over a snapshot can
/// compare `revision()` to know when a write has made their results stale. Every successful write
/// increments it.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TagStore {
    #[serde(default)]
    tags: Tags,
    #[serde(default)]
    config: TagConfig,
    #[serde(default)]
    revision: u64,
}

impl TagStore {
    /// Loads the store from `path`. A missing file is an empty store.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            debug!("No tag store at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        utils::deserialize(path)
            .await
            .with_context(|| format!("Unable to load tags from {}", path.display()))
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize tags")?;
        utils::write(path, data)
            .await
            .with_context(|| format!("Unable to save tags to {}", path.display()))
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Tags `transaction_id`, replacing an existing tag. The sub-account is registered under the
    /// tag's category if it is new. Returns the tag as stored, with its label trimmed, and the tag
    /// it replaced.
    pub fn tag(&mut self, transaction_id: impl Into<String>, tag: Tag) -> Result<(Tag, Option<Tag>)> {
        let label = tag.sub_account.trim().to_string();
        ensure!(!label.is_empty(), "A tag needs a sub-account label");
        let category = tag.category;
        let tag = Tag {
            sub_account: label.clone(),
            ..tag
        };
        let replaced = self.tags.insert(transaction_id, tag.clone());
        self.register(category, label);
        self.revision += 1;
        Ok((tag, replaced))
    }

    /// Removes the tag for `transaction_id`. Returns `None`, and leaves the revision alone, when
    /// the transaction was not tagged.
    pub fn untag(&mut self, transaction_id: &str) -> Option<Tag> {
        let removed = self.tags.remove(transaction_id);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Adds a sub-account label to a category. Labels are trimmed; adding an existing label is a
    /// no-op that returns `false`.
    pub fn add_sub_account(&mut self, category: TagCategory, label: &str) -> Result<bool> {
        let label = label.trim();
        ensure!(!label.is_empty(), "Sub-account labels cannot be empty");
        let added = self.register(category, label.to_string());
        if added {
            self.revision += 1;
        }
        Ok(added)
    }

    fn register(&mut self, category: TagCategory, label: String) -> bool {
        let labels = self.config.sub_accounts_mut(category);
        if labels.contains(&label) {
            return false;
        }
        labels.push(label);
        true
    }
}
