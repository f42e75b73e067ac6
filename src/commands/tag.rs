use crate::commands::{Inputs, Out};
use crate::model::{Tag, TagCategory, TagStore};
use crate::pnl::{group_tagged, ExcludedGroups};
use crate::{Config, Result};
use anyhow::ensure;
use tracing::debug;

/// Tags a transaction so it is excluded from every P&L aggregate. The id must exist in the ledger.
pub async fn tag(
    config: Config,
    transaction_id: &str,
    category: TagCategory,
    sub_account: &str,
) -> Result<Out<Tag>> {
    let inputs = Inputs::load(&config).await?;
    ensure!(
        inputs.is_known(transaction_id),
        "Transaction '{transaction_id}' is not in the ledger"
    );
    let mut store = inputs.tags;
    let (tag, replaced) = store.tag(transaction_id, Tag::new(category, sub_account))?;
    store.save(config.tags_path()).await?;
    debug!("Tag store is at revision {}", store.revision());

    let message = match replaced {
        Some(old) => format!(
            "Re-tagged {transaction_id} from {}/{}",
            old.category(),
            old.sub_account()
        ),
        None => format!("Tagged {transaction_id}"),
    };
    Ok(Out::new(message, tag))
}

/// Removes a tag. Untagging a transaction that is not tagged is not an error.
pub async fn untag(config: Config, transaction_id: &str) -> Result<Out<Option<Tag>>> {
    let path = config.tags_path();
    let mut store = TagStore::load(&path).await?;
    let removed = store.untag(transaction_id);
    if removed.is_none() {
        return Ok(Out::new(format!("{transaction_id} was not tagged"), None));
    }
    store.save(&path).await?;
    Ok(Out::new(format!("Untagged {transaction_id}"), removed))
}

/// Registers a sub-account label under a category.
pub async fn sub_account(config: Config, category: TagCategory, label: &str) -> Result<Out<Vec<String>>> {
    let path = config.tags_path();
    let mut store = TagStore::load(&path).await?;
    let added = store.add_sub_account(category, label)?;
    if added {
        store.save(&path).await?;
    }
    let labels = store.config().sub_accounts(category).to_vec();
    let message = if added {
        format!("Added '{}' to {category}", label.trim())
    } else {
        format!("'{}' already exists in {category}", label.trim())
    };
    Ok(Out::new(message, labels))
}

/// Lists everything excluded by tags, grouped by category and sub-account.
pub async fn excluded(config: Config) -> Result<Out<ExcludedGroups>> {
    let inputs = Inputs::load(&config).await?;
    let groups = group_tagged(inputs.ledger.transactions(), inputs.tags.tags());
    Ok(Out::new(
        format!(
            "{} excluded transactions totalling {}",
            groups.count, groups.total
        ),
        groups,
    ))
}
