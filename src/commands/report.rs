use crate::commands::{Inputs, Out};
use crate::pnl::{
    build_alternate_view, build_child_rows, build_detailed_report, calculate_summary,
    DetailedReport, PlRow, SimplifiedView, SummaryMetrics,
};
use crate::{Config, Result};
use anyhow::ensure;

/// Builds the hierarchical P&L for the reporting window.
pub async fn report(config: Config) -> Result<Out<DetailedReport>> {
    let inputs = Inputs::load(&config).await?;
    let report = build_detailed_report(
        inputs.ledger.transactions(),
        inputs.ledger.accounts(),
        &inputs.months,
        inputs.tags.tags(),
    );
    let message = format!(
        "P&L for {} months: net income {}",
        report.months.len(),
        report.profit.net_income.ytd_total
    );
    Ok(Out::new(message, report))
}

/// The drill-down rows under one account.
pub async fn drill(config: Config, account_code: &str) -> Result<Out<Vec<PlRow>>> {
    let inputs = Inputs::load(&config).await?;
    let accounts = inputs.ledger.accounts();
    ensure!(
        accounts.contains(account_code),
        "Account '{account_code}' is not in the ledger"
    );
    let rows = build_child_rows(
        account_code,
        inputs.ledger.transactions(),
        accounts,
        &inputs.months,
        inputs.tags.tags(),
    );
    Ok(Out::new(
        format!("{} sub-accounts under {account_code}", rows.len()),
        rows,
    ))
}

pub async fn summary(config: Config) -> Result<Out<SummaryMetrics>> {
    let inputs = Inputs::load(&config).await?;
    let summary = calculate_summary(
        inputs.ledger.transactions(),
        inputs.ledger.accounts(),
        inputs.tags.tags(),
    );
    let message = format!(
        "Net revenue {}, net income {} ({} tagged items excluded)",
        summary.net_revenue, summary.net_income, summary.tagged_items_count
    );
    Ok(Out::new(message, summary))
}

/// Builds the simplified view with the configured mapping, or the built-in one.
pub async fn simplified(config: Config) -> Result<Out<SimplifiedView>> {
    let inputs = Inputs::load(&config).await?;
    let view = build_alternate_view(
        inputs.ledger.transactions(),
        inputs.tags.tags(),
        &inputs.months,
        &inputs.mapping,
    );
    let net = view
        .expenses
        .last()
        .map(|line| line.ytd)
        .unwrap_or_default();
    Ok(Out::new(format!("Simplified P&L: net profit {net}"), view))
}
