//! Per-sheet and per-run result records.

use chrono::{DateTime, Utc};
use modelaudit_engine::engine::{AxisInfo, CellClass};
use serde::{Deserialize, Serialize};

use super::issue::{Issue, IssueKind};
use super::run::RunPhase;

/// Issue counts. These include issues dropped by the cap.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SheetCounts {
    pub hardcode: usize,
    #[serde(rename = "break")]
    pub pattern_break: usize,
    pub error: usize,
}

impl SheetCounts {
    pub fn record(&mut self, kind: IssueKind) {
        match kind {
            IssueKind::Hardcode => self.hardcode += 1,
            IssueKind::Break => self.pattern_break += 1,
            IssueKind::Error => self.error += 1,
        }
    }

    pub fn get(&self, kind: IssueKind) -> usize {
        match kind {
            IssueKind::Hardcode => self.hardcode,
            IssueKind::Break => self.pattern_break,
            IssueKind::Error => self.error,
        }
    }

    pub fn total(&self) -> usize {
        self.hardcode + self.pattern_break + self.error
    }
}

/// Classification marks for one audited row, in column order.
/// Rows and columns are 1-based sheet positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    /// 1-based row number.
    pub row: usize,
    pub label: String,
    /// Dominant shape of the row, if one was established.
    pub dominant_pattern: Option<String>,
    /// `(1-based column, class)` for every non-empty cell of the audit zone.
    pub marks: Vec<(usize, CellClass)>,
}

/// Outcome for one audited sheet. Positions are 1-based sheet positions, so
/// they already include the offset of the sheet's used range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetAuditResult {
    pub sheet_name: String,
    pub axis: AxisInfo,
    pub audit_start_col: usize,
    pub total_columns: Vec<usize>,
    pub counts: SheetCounts,
    pub total_cells: usize,
    pub formula_cells: usize,
    pub volatile_formulas: usize,
    pub complex_formulas: usize,
    pub shifted_references: usize,
    pub rows: Vec<RowRecord>,
}

impl SheetAuditResult {
    pub fn new(sheet_name: &str) -> Self {
        SheetAuditResult {
            sheet_name: sheet_name.to_string(),
            axis: AxisInfo::NOT_FOUND,
            audit_start_col: 0,
            total_columns: Vec::new(),
            counts: SheetCounts::default(),
            total_cells: 0,
            formula_cells: 0,
            volatile_formulas: 0,
            complex_formulas: 0,
            shifted_references: 0,
            rows: Vec::new(),
        }
    }

    pub fn has_issues(&self) -> bool {
        self.counts.total() > 0
    }
}

/// Workbook-wide aggregates.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AuditTotals {
    pub hardcode: usize,
    #[serde(rename = "break")]
    pub pattern_break: usize,
    pub error: usize,
    pub total_cells: usize,
    pub formula_cells: usize,
    pub volatile_formulas: usize,
    pub complex_formulas: usize,
    pub shifted_references: usize,
    pub sheets_audited: usize,
    pub sheets_skipped: usize,
    pub invalid_named_ranges: usize,
}

impl AuditTotals {
    pub fn add_sheet(&mut self, sheet: &SheetAuditResult) {
        self.hardcode += sheet.counts.hardcode;
        self.pattern_break += sheet.counts.pattern_break;
        self.error += sheet.counts.error;
        self.total_cells += sheet.total_cells;
        self.formula_cells += sheet.formula_cells;
        self.volatile_formulas += sheet.volatile_formulas;
        self.complex_formulas += sheet.complex_formulas;
        self.shifted_references += sheet.shifted_references;
        self.sheets_audited += 1;
    }

    pub fn issues(&self) -> usize {
        self.hardcode + self.pattern_break + self.error
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Sheets in the workbook before selection.
    pub sheet_count: usize,
    /// Sheets selected for audit, in audit order.
    pub requested_sheets: Vec<String>,
    /// Phase the run ended in.
    pub phase: RunPhase,
}

/// A defined name and whether its definition still resolves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedRangeStatus {
    pub name: String,
    pub refers_to: String,
    pub is_valid: bool,
}

/// Final outcome of a completed run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub metadata: AuditMetadata,
    pub sheets: Vec<SheetAuditResult>,
    pub issues: Vec<Issue>,
    /// Issues counted but not stored because the cap was reached.
    pub dropped_issues: usize,
    pub named_ranges: Vec<NamedRangeStatus>,
    pub totals: AuditTotals,
}

impl AuditReport {
    pub fn sheet(&self, name: &str) -> Option<&SheetAuditResult> {
        self.sheets.iter().find(|s| s.sheet_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_record_by_kind() {
        let mut counts = SheetCounts::default();
        counts.record(IssueKind::Break);
        counts.record(IssueKind::Break);
        counts.record(IssueKind::Error);
        assert_eq!(counts.get(IssueKind::Break), 2);
        assert_eq!(counts.get(IssueKind::Hardcode), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_totals_sum_sheets() {
        let mut a = SheetAuditResult::new("A");
        a.counts.hardcode = 2;
        a.total_cells = 10;
        let mut b = SheetAuditResult::new("B");
        b.counts.error = 1;
        b.formula_cells = 4;
        b.shifted_references = 2;

        let mut totals = AuditTotals::default();
        totals.add_sheet(&a);
        totals.add_sheet(&b);
        assert_eq!(totals.issues(), 3);
        assert_eq!(totals.total_cells, 10);
        assert_eq!(totals.formula_cells, 4);
        assert_eq!(totals.shifted_references, 2);
        assert_eq!(totals.sheets_audited, 2);
        assert!(a.has_issues());
    }
}
