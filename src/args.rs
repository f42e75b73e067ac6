//! These structs provide the CLI interface for the pnl CLI.

use crate::model::TagCategory;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// pnl: Profit & Loss reports from a general ledger export.
///
/// The program reads a general-ledger CSV export, rolls its transactions up the chart of accounts
/// and prints monthly P&L reports as JSON. Transactions can be tagged as personal or
/// non-recurring to pull them out of every report.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the pnl home directory and its config file.
    ///
    /// This is the first command you should run. Decide what directory you want to store the
    /// config and tags in and pass this as --pnl-home. By default, it will be $HOME/pnl.
    Init(InitArgs),
    /// The detailed P&L: each section's top-level accounts by month, with profit lines.
    Report,
    /// Headline figures: revenue split, section totals, margins and tagged exclusions.
    Summary,
    /// The simplified P&L, bucketed by the label mapping rather than the account tree.
    Simplified,
    /// Show the sub-accounts under one account.
    Drill(DrillArgs),
    /// Exclude a transaction from the P&L.
    Tag(TagArgs),
    /// Put a tagged transaction back into the P&L.
    Untag(UntagArgs),
    /// Add a sub-account label under a tag category.
    SubAccount(SubAccountArgs),
    /// List excluded transactions grouped by category and sub-account.
    Excluded,
    /// Check the ledger and tags for data that would skew the reports.
    Validate,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the pnl config and tags are held. Defaults to ~/pnl
    #[arg(long, env = "PNL_HOME", default_value_t = default_pnl_home())]
    pnl_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, pnl_home: PathBuf) -> Self {
        Self {
            log_level,
            pnl_home: pnl_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn pnl_home(&self) -> &DisplayPath {
        &self.pnl_home
    }
}

/// Args for the `pnl init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The general ledger CSV export to report on.
    #[arg(long)]
    ledger: PathBuf,
}

impl InitArgs {
    pub fn new(ledger: impl Into<PathBuf>) -> Self {
        Self {
            ledger: ledger.into(),
        }
    }

    pub fn ledger(&self) -> &Path {
        &self.ledger
    }
}

/// Args for the `pnl drill` command.
#[derive(Debug, Parser, Clone)]
pub struct DrillArgs {
    /// The account code to drill into, e.g. 6100.
    code: String,
}

impl DrillArgs {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Args for the `pnl tag` command.
#[derive(Debug, Parser, Clone)]
pub struct TagArgs {
    /// The transaction id, as shown in report output.
    id: String,

    /// Why the transaction is excluded.
    #[arg(long, value_enum)]
    category: TagCategory,

    /// A free-text bucket within the category, e.g. "Owner travel".
    #[arg(long)]
    sub_account: String,
}

impl TagArgs {
    pub fn new(id: impl Into<String>, category: TagCategory, sub_account: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            sub_account: sub_account.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> TagCategory {
        self.category
    }

    pub fn sub_account(&self) -> &str {
        &self.sub_account
    }
}

/// Args for the `pnl untag` command.
#[derive(Debug, Parser, Clone)]
pub struct UntagArgs {
    /// The transaction id to untag.
    id: String,
}

impl UntagArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Args for the `pnl sub-account` command.
#[derive(Debug, Parser, Clone)]
pub struct SubAccountArgs {
    #[arg(value_enum)]
    category: TagCategory,

    /// The label to add.
    label: String,
}

impl SubAccountArgs {
    pub fn new(category: TagCategory, label: impl Into<String>) -> Self {
        Self {
            category,
            label: label.into(),
        }
    }

    pub fn category(&self) -> TagCategory {
        self.category
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

fn default_pnl_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("pnl"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --pnl-home or PNL_HOME instead of relying on the default \
                pnl home directory.",
            );
            PathBuf::from("pnl")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        let args = Args::try_parse_from([
            "pnl",
            "--pnl-home",
            "/tmp/pnl",
            "tag",
            "txn-1",
            "--category",
            "non-recurring",
            "--sub-account",
            "Legal",
        ])
        .unwrap();
        assert_eq!(args.common().pnl_home().path(), Path::new("/tmp/pnl"));
        match args.command() {
            Command::Tag(tag) => {
                assert_eq!(tag.id(), "txn-1");
                assert_eq!(tag.category(), TagCategory::NonRecurring);
                assert_eq!(tag.sub_account(), "Legal");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_common() {
        let args =
            Args::try_parse_from(["pnl", "--log-level", "debug", "--pnl-home", "x", "summary"])
                .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        assert!(matches!(args.command(), Command::Summary));

        let args = Args::try_parse_from(["pnl", "--pnl-home", "x", "sub-account", "personal", "Travel"])
            .unwrap();
        assert!(matches!(args.command(), Command::SubAccount(a) if a.label() == "Travel"));
        assert!(Args::try_parse_from(["pnl", "drill"]).is_err());
    }
}
