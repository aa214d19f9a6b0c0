//! modelaudit-core - Audit runs over whole workbooks.

pub mod audit;
pub mod error;
pub mod provider;
pub mod settings;
pub mod storage;

pub use audit::{
    AuditMetadata, AuditReport, AuditRun, AuditTotals, Auditor, Issue, IssueKind, IssueLog,
    NamedRangeStatus, RowRecord, RunPhase, SheetAuditResult, SheetCounts,
};
pub use error::{AuditError, Result};
pub use provider::{
    GridProvider, MemoryWorkbook, NamedRange, NamedRangeSource, SheetEnumerator, is_audit_eligible,
};
pub use settings::AuditSettings;
pub use storage::CsvWorkbook;

pub use modelaudit_engine::engine::{AxisInfo, CellClass, CellRef, SheetGrid};
