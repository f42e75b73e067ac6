//! Configuration file handling for pnl.
//!
//! The configuration file is stored at `$PNL_HOME/config.json`. It points at the general ledger
//! export, the tag store and, optionally, a custom simplified-view mapping and reporting window.

use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "pnl";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const TAGS_JSON: &str = "tags.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$PNL_HOME` and from there it loads `$PNL_HOME/config.json`. Relative paths in the
/// file are resolved against the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory and an initial `config.json` pointing at `ledger_path`.
    ///
    /// # Errors
    /// - Returns an error if `ledger_path` is not a file, if a config already exists, or if any
    ///   file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, ledger_path: &Path) -> Result<Self> {
        ensure!(
            ledger_path.is_file(),
            "The ledger export '{}' does not exist",
            ledger_path.display()
        );
        let ledger_path = utils::canonicalize(ledger_path).await?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the pnl home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            )
        }
        let config_file = ConfigFile {
            ledger_path,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// Validates that the home directory and its config file exist and loads the config.
    pub async fn load(pnl_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = pnl_home.into();
        if !maybe_relative.is_dir() {
            bail!("PNL Home is missing '{}'", maybe_relative.display())
        }
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn ledger_path(&self) -> PathBuf {
        utils::resolve(&self.root, &self.config_file.ledger_path)
    }

    pub fn tags_path(&self) -> PathBuf {
        utils::resolve(&self.root, &self.config_file.tags_path())
    }

    /// The custom simplified-view mapping, if one is configured.
    pub fn mapping_path(&self) -> Option<PathBuf> {
        self.config_file
            .mapping_path
            .as_deref()
            .map(|p| utils::resolve(&self.root, p))
    }

    /// The configured reporting window. `None` means every month in the ledger.
    pub fn months(&self) -> Option<&[String]> {
        self.config_file.months.as_deref()
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "pnl",
///   "config_version": 1,
///   "ledger_path": "/home/me/Downloads/general-ledger.csv",
///   "tags_path": "tags.json",
///   "mapping_path": "mapping.json",
///   "months": ["2025-01", "2025-02", "2025-03"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "pnl"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the general ledger CSV export (relative to config.json or absolute)
    ledger_path: PathBuf,

    /// Path to the tag store. Defaults to $PNL_HOME/tags.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    tags_path: Option<PathBuf>,

    /// Path to a simplified-view mapping JSON. The built-in table is used if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    mapping_path: Option<PathBuf>,

    /// The reporting window as `YYYY-MM` months
    #[serde(skip_serializing_if = "Option::is_none")]
    months: Option<Vec<String>>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            ledger_path: PathBuf::new(),
            tags_path: None,
            mapping_path: None,
            months: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        if let Some(months) = &config.months {
            for month in months {
                ensure!(
                    is_month(month),
                    "Invalid month '{month}' in config file, expected YYYY-MM"
                );
            }
        }

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn tags_path(&self) -> PathBuf {
        self.tags_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(TAGS_JSON))
    }
}

fn is_month(s: &str) -> bool {
    chrono::NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").is_ok() && s.len() == 7
}
