//! Audit runs: orchestration, issues and results.

mod issue;
mod result;
mod run;

pub use issue::{Issue, IssueKind, IssueLog, truncate_formula, truncate_value};
pub use result::{
    AuditMetadata, AuditReport, AuditTotals, NamedRangeStatus, RowRecord, SheetAuditResult, SheetCounts,
};
pub use run::{AuditRun, Auditor, RunPhase};

