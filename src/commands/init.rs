use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the pnl home directory and an initial `config.json` pointing at `ledger_path`.
///
/// # Arguments
/// - `pnl_home` - The directory that will hold the configuration and tag store, e.g. `$HOME/pnl`
/// - `ledger_path` - The general ledger CSV export to report on.
///
/// # Errors
/// - Returns an error if the ledger export is missing, a config already exists, or any file
///   operation fails.
pub async fn init(pnl_home: &Path, ledger_path: &Path) -> Result<Out<()>> {
    let config = Config::create(pnl_home, ledger_path)
        .await
        .context("Unable to create the pnl home directory and config")?;
    Ok(format!(
        "Successfully created the pnl config at {}",
        config.config_path().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::LEDGER_CSV;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let ledger = dir.path().join("ledger.csv");
        std::fs::write(&ledger, LEDGER_CSV).unwrap();
        let home = dir.path().join("home");

        let out = init(&home, &ledger).await.unwrap();
        assert!(out.message().contains("config.json"));
        assert!(out.structure().is_none());
        assert!(Config::load(&home).await.is_ok());
        assert!(init(&home, &ledger).await.is_err());
    }
}
