//! The aggregation engine. Every function here is pure and synchronous: it reads an immutable
//! snapshot of transactions, accounts and tags and never fails. Unknown account codes resolve to
//! empty results, months outside the window are ignored and margins without revenue are zero.
mod aggregate;
mod group;
mod report;
mod resolve;
mod rows;
mod simplified;
mod summary;
mod totals;

pub use aggregate::{aggregate_monthly, RowAggregate};
pub use group::{
    group_by_month, group_tagged, CategoryGroup, ExcludedGroups, SubAccountGroup,
};
pub use report::{build_detailed_report, DetailedReport, ReportSection};
pub use resolve::{resolve_account_transactions, TagFilter};
pub use rows::{build_child_rows, build_section_rows, PlRow};
pub use simplified::{
    build_alternate_view, LineItem, MappingEntry, NamePredicate, SimplifiedMapping,
    SimplifiedView,
};
pub use summary::{calculate_summary, SummaryMetrics};
pub use totals::{profit_lines, section_monthly_total, section_totals, ProfitLines, SectionTotals};
