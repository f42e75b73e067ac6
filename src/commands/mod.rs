//! Command handlers for the pnl CLI.
//!
//! This module contains implementations for all CLI subcommands. Each handler loads what it needs
//! from the `Config`, runs the engine and returns an `Out`.

mod init;
mod report;
mod tag;
mod validate;

use crate::import::load_ledger;
use crate::model::{Ledger, TagStore};
use crate::pnl::SimplifiedMapping;
use crate::{Config, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Debug;
use tracing::{debug, info};

pub use init::init;
pub use report::{drill, report, simplified, summary};
pub use tag::{excluded, sub_account, tag, untag};
pub use validate::{validate, Validation};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to stdout.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            match serde_json::to_string_pretty(structure) {
                Ok(json) => println!("{json}"),
                Err(e) => debug!("Unable to serialize command output: {e}"),
            }
        }
    }
}

/// Everything a report command reads: the ledger narrowed to the reporting window, the tag store
/// and the simplified-view mapping.
#[derive(Debug, Clone)]
pub(crate) struct Inputs {
    ledger: Ledger,
    /// Ids of every transaction in the export, including those outside the reporting window.
    known_ids: BTreeSet<String>,
    months: Vec<String>,
    tags: TagStore,
    mapping: SimplifiedMapping,
}

impl Inputs {
    pub(crate) async fn load(config: &Config) -> Result<Self> {
        let ledger = load_ledger(&config.ledger_path()).await?;
        let known_ids = ledger
            .transactions()
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        let (ledger, months) = match config.months() {
            Some(months) => {
                debug!("Restricting the ledger to {} configured months", months.len());
                (ledger.restrict_to(months), months.to_vec())
            }
            None => {
                let months = ledger.months().to_vec();
                (ledger, months)
            }
        };
        let tags = TagStore::load(config.tags_path()).await?;
        let mapping = match config.mapping_path() {
            Some(path) => SimplifiedMapping::load(path).await?,
            None => SimplifiedMapping::default(),
        };
        Ok(Self {
            ledger,
            known_ids,
            months,
            tags,
            mapping,
        })
    }

    /// True if `transaction_id` is anywhere in the export, whatever the reporting window.
    pub(crate) fn is_known(&self, transaction_id: &str) -> bool {
        self.known_ids.contains(transaction_id)
    }
}
