use crate::model::{Accounts, PlSection, Tags, Transaction};
use crate::pnl::rows::{build_section_rows, PlRow};
use crate::pnl::totals::{profit_lines, section_totals, ProfitLines, SectionTotals};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportSection {
    pub section: PlSection,
    pub title: String,
    pub rows: Vec<PlRow>,
    pub totals: SectionTotals,
}

/// The hierarchical P&L: one block per reported section followed by the profit lines.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DetailedReport {
    pub months: Vec<String>,
    pub sections: Vec<ReportSection>,
    pub profit: ProfitLines,
}

impl DetailedReport {
    pub fn section(&self, section: PlSection) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.section == section)
    }
}

/// Builds the detailed report for the reporting window. Sections without any rows are omitted.
pub fn build_detailed_report<S: AsRef<str>>(
    transactions: &[Transaction],
    accounts: &Accounts,
    months: &[S],
    tags: &Tags,
) -> DetailedReport {
    let mut sections = Vec::new();
    for section in PlSection::REPORTED {
        let rows = build_section_rows(section, transactions, accounts, months, tags);
        if rows.is_empty() {
            debug!("No rows for {section}");
            continue;
        }
        let totals = section_totals(section, transactions, accounts, months, tags);
        let rows_total: rust_decimal::Decimal = rows.iter().map(|r| r.ytd_total).sum();
        if rows_total != totals.ytd_total {
            warn!(
                "Rows for {section} total {rows_total} but the section scan found {}",
                totals.ytd_total
            );
        }
        sections.push(ReportSection {
            section,
            title: section.title().to_string(),
            rows,
            totals,
        });
    }

    DetailedReport {
        months: months.iter().map(|m| m.as_ref().to_string()).collect(),
        sections,
        profit: profit_lines(transactions, accounts, months, tags),
    }
}
