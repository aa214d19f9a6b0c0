//! Audit orchestration.
//!
//! An [`AuditRun`] owns everything one run accumulates: the capped issue log,
//! per-sheet results and workbook totals. It is created fresh for every run
//! and consumed into an [`AuditReport`] at the end, so nothing leaks between
//! runs. [`Auditor`] drives a run over a workbook, one sheet at a time, in the
//! order the sheets were supplied.

use chrono::Utc;
use modelaudit_engine::engine::{
    AxisInfo, Cell, CellClass, CellRef, SheetGrid, classify_cell, contains_volatile_function,
    detect_axis_run, detect_total_columns, formula_complexity, has_broken_reference,
    has_shifted_column_reference, render_shape, resolve_row_label, row_dominant_pattern,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::issue::{Issue, IssueKind, IssueLog, truncate_formula, truncate_value};
use super::result::{
    AuditMetadata, AuditReport, AuditTotals, NamedRangeStatus, RowRecord, SheetAuditResult,
};
use crate::error::{AuditError, Result};
use crate::provider::{GridProvider, NamedRange, NamedRangeSource, SheetEnumerator, is_audit_eligible};
use crate::settings::AuditSettings;

/// Where a run currently is. A run that cannot list its sheets never reaches
/// a report; [`Auditor::run`] returns the error instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    SelectingSheets,
    /// Auditing the sheet at this index of the requested list.
    Auditing(usize),
    BuildingSummary,
    Done,
}

/// Mutable state of a single audit run.
#[derive(Debug)]
pub struct AuditRun {
    settings: AuditSettings,
    phase: RunPhase,
    issues: IssueLog,
    sheets: Vec<SheetAuditResult>,
    named_ranges: Vec<NamedRangeStatus>,
    totals: AuditTotals,
    metadata: AuditMetadata,
}

/// Everything the per-cell loop needs to know about the row being audited.
struct RowContext<'a> {
    sheet: &'a str,
    label: &'a str,
    dominant: Option<&'a str>,
}

impl AuditRun {
    pub fn new(settings: AuditSettings) -> Self {
        let issues = IssueLog::with_capacity(settings.max_issues);
        AuditRun {
            settings,
            phase: RunPhase::Idle,
            issues,
            sheets: Vec::new(),
            named_ranges: Vec::new(),
            totals: AuditTotals::default(),
            metadata: AuditMetadata {
                started_at: Utc::now(),
                finished_at: None,
                sheet_count: 0,
                requested_sheets: Vec::new(),
                phase: RunPhase::Idle,
            },
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    pub fn issues(&self) -> &IssueLog {
        &self.issues
    }

    pub fn sheets(&self) -> &[SheetAuditResult] {
        &self.sheets
    }

    pub fn totals(&self) -> &AuditTotals {
        &self.totals
    }

    /// Record the sheets this run is about to audit.
    pub fn begin(&mut self, sheet_count: usize, requested: &[String]) {
        self.metadata.sheet_count = sheet_count;
        self.metadata.requested_sheets = requested.to_vec();
    }

    /// Note a sheet that could not be audited. It gets no result entry.
    pub fn skip_sheet(&mut self, sheet: &str, reason: &str) {
        tracing::warn!(sheet, reason, phase = ?self.phase, "skipping sheet");
        self.totals.sheets_skipped += 1;
    }

    /// Audit one loaded sheet and fold it into the run.
    pub fn audit_sheet(&mut self, sheet: &str, grid: &SheetGrid) -> &SheetAuditResult {
        let origin = grid.origin();
        let mut result = SheetAuditResult::new(sheet);
        result.total_cells = grid.row_count() * grid.col_count();
        result.formula_cells = grid.formula_count();
        self.count_diagnostics(grid, &mut result);

        let axis = detect_axis_run(grid, self.settings.axis_scan_rows);
        let start_col = match &axis {
            Some(run) => run.start_col,
            None => self.settings.fallback_start_col.saturating_sub(1),
        };
        let total_cols: BTreeSet<usize> = match &axis {
            Some(run) => detect_total_columns(grid, run.row, run.start_col, run.end_col),
            None => BTreeSet::new(),
        };
        result.axis = axis
            .map(|run| {
                let at = grid.address(run.row, run.start_col);
                AxisInfo {
                    row: at.row + 1,
                    col: at.col + 1,
                }
            })
            .unwrap_or_default();
        result.audit_start_col = origin.col + start_col + 1;
        result.total_columns = total_cols.iter().map(|c| origin.col + c + 1).collect();

        let rules = self.settings.pattern_rules();
        for row in 0..grid.row_count() {
            let label = resolve_row_label(
                grid,
                row,
                self.settings.label_columns,
                self.settings.label_max_chars,
            );
            if label.is_empty() {
                continue;
            }

            let dominant = row_dominant_pattern(grid, row, start_col, &total_cols, rules);
            tracing::debug!(sheet, row = origin.row + row + 1, label = %label, dominant = ?dominant, "auditing row");
            let ctx = RowContext {
                sheet,
                label: &label,
                dominant: dominant.as_deref(),
            };

            let mut marks = Vec::new();
            for col in start_col..grid.col_count() {
                let cell = grid.cell(row, col);
                let class = classify_cell(cell, ctx.dominant, total_cols.contains(&col));
                if class == CellClass::Empty {
                    continue;
                }
                let at = grid.address(row, col);
                marks.push((at.col + 1, class));
                self.record_issue(&ctx, at, cell, class, &mut result);
            }

            result.rows.push(RowRecord {
                row: origin.row + row + 1,
                label,
                dominant_pattern: dominant,
                marks,
            });
        }

        tracing::info!(
            sheet,
            phase = ?self.phase,
            rows = result.rows.len(),
            hardcode = result.counts.hardcode,
            pattern_break = result.counts.pattern_break,
            error = result.counts.error,
            "sheet audited"
        );

        self.totals.add_sheet(&result);
        self.sheets.push(result);
        &self.sheets[self.sheets.len() - 1]
    }

    fn count_diagnostics(&self, grid: &SheetGrid, result: &mut SheetAuditResult) {
        let origin = grid.origin();
        for row in 0..grid.row_count() {
            for (col, cell) in grid.row(row).iter().enumerate() {
                let Some(formula) = cell.formula.as_deref().filter(|_| cell.is_formula()) else {
                    continue;
                };
                if self.settings.check_volatile && contains_volatile_function(formula) {
                    result.volatile_formulas += 1;
                }
                if formula_complexity(formula) >= self.settings.complexity_threshold {
                    result.complex_formulas += 1;
                }
                if self.settings.check_shifted_references
                    && has_shifted_column_reference(formula, origin.col + col)
                {
                    result.shifted_references += 1;
                }
            }
        }
    }

    fn issue_kind(&self, class: CellClass) -> Option<IssueKind> {
        match class {
            CellClass::Hardcode if self.settings.check_hardcodes => Some(IssueKind::Hardcode),
            CellClass::Break if self.settings.check_pattern_breaks => Some(IssueKind::Break),
            CellClass::Error if self.settings.check_errors => Some(IssueKind::Error),
            _ => None,
        }
    }

    fn record_issue(
        &mut self,
        ctx: &RowContext<'_>,
        at: CellRef,
        cell: &Cell,
        class: CellClass,
        result: &mut SheetAuditResult,
    ) {
        let Some(kind) = self.issue_kind(class) else {
            return;
        };
        result.counts.record(kind);
        if self.issues.is_full() {
            self.issues.note_dropped();
            return;
        }

        let expected_text = ctx
            .dominant
            .map(|shape| truncate_formula(&render_shape(shape, at.row, at.col)))
            .unwrap_or_default();
        let (actual_text, description, recommendation) = match kind {
            IssueKind::Hardcode => (
                truncate_value(&cell.value.display_text()),
                if ctx.dominant.is_some() {
                    "Constant value where the row expects a formula"
                } else {
                    "Constant value in audited row"
                },
                "Use a formula or reference an input cell",
            ),
            IssueKind::Break => (
                truncate_formula(cell.formula.as_deref().unwrap_or_default()),
                "Formula differs from the row's dominant pattern",
                "Verify this is intentional",
            ),
            IssueKind::Error => {
                let code = cell.value.error_code();
                (
                    cell.value.display_text(),
                    code.map_or("Unknown error", |c| c.description()),
                    code.map_or("Review formula logic", |c| c.recommendation()),
                )
            }
        };

        self.issues.push(Issue {
            kind,
            sheet_name: ctx.sheet.to_string(),
            cell_address: at.to_string(),
            row_label: ctx.label.to_string(),
            actual_text,
            expected_text,
            description: description.to_string(),
            recommendation: recommendation.to_string(),
        });
    }

    /// Check defined names for definitions that point at deleted ranges.
    pub fn audit_named_ranges(&mut self, names: &[NamedRange]) {
        for named in names {
            let is_valid = !has_broken_reference(&named.refers_to);
            if !is_valid {
                tracing::warn!(name = %named.name, refers_to = %named.refers_to, "named range refers to #REF!");
                self.totals.invalid_named_ranges += 1;
            }
            self.named_ranges.push(NamedRangeStatus {
                name: named.name.clone(),
                refers_to: named.refers_to.clone(),
                is_valid,
            });
        }
    }

    /// Close the run and hand back its report.
    pub fn finish(mut self) -> AuditReport {
        self.phase = RunPhase::BuildingSummary;
        self.metadata.finished_at = Some(Utc::now());
        tracing::info!(
            phase = ?self.phase,
            sheets = self.totals.sheets_audited,
            skipped = self.totals.sheets_skipped,
            issues = self.totals.issues(),
            stored = self.issues.len(),
            "audit finished"
        );
        self.phase = RunPhase::Done;
        self.metadata.phase = self.phase;
        AuditReport {
            metadata: self.metadata,
            sheets: self.sheets,
            dropped_issues: self.issues.dropped(),
            issues: self.issues.into_issues(),
            named_ranges: self.named_ranges,
            totals: self.totals,
        }
    }
}

/// Runs audits with a fixed set of settings.
#[derive(Clone, Debug, Default)]
pub struct Auditor {
    settings: AuditSettings,
}

impl Auditor {
    pub fn new(settings: AuditSettings) -> Self {
        Auditor { settings }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Eligible sheets in workbook order, optionally limited to `only`.
    pub fn select_sheets<E>(&self, enumerator: &E, only: Option<&[String]>) -> Result<(usize, Vec<String>)>
    where
        E: SheetEnumerator + ?Sized,
    {
        let names = enumerator.sheet_names()?;
        let count = names.len();
        let selected = names
            .into_iter()
            .filter(|n| is_audit_eligible(n, &self.settings.dashboard_name))
            .filter(|n| only.is_none_or(|allow| allow.iter().any(|a| a == n)))
            .collect();
        Ok((count, selected))
    }

    /// Audit every eligible sheet the enumerator lists.
    ///
    /// Fails only when the sheet list itself cannot be read. Sheets that fail
    /// to load are skipped and left out of the report.
    pub fn run<E, P>(&self, enumerator: &E, provider: &P, only: Option<&[String]>) -> Result<AuditReport>
    where
        E: SheetEnumerator + ?Sized,
        P: GridProvider + ?Sized,
    {
        self.run_inner(enumerator, provider, None, only)
    }

    /// Like [`Auditor::run`], and also checks the workbook's defined names.
    /// A name list that cannot be read is logged and left out.
    pub fn run_with_names<E, P, N>(
        &self,
        enumerator: &E,
        provider: &P,
        names: &N,
        only: Option<&[String]>,
    ) -> Result<AuditReport>
    where
        E: SheetEnumerator + ?Sized,
        P: GridProvider + ?Sized,
        N: NamedRangeSource,
    {
        self.run_inner(enumerator, provider, Some(names), only)
    }

    fn run_inner<E, P>(
        &self,
        enumerator: &E,
        provider: &P,
        names: Option<&dyn NamedRangeSource>,
        only: Option<&[String]>,
    ) -> Result<AuditReport>
    where
        E: SheetEnumerator + ?Sized,
        P: GridProvider + ?Sized,
    {
        let mut run = AuditRun::new(self.settings.clone());
        run.phase = RunPhase::SelectingSheets;
        let (count, sheets) = match self.select_sheets(enumerator, only) {
            Ok(selected) => selected,
            Err(err) => {
                tracing::error!(error = %err, "audit failed before any sheet was audited");
                return Err(match err {
                    AuditError::SheetList(_) => err,
                    other => AuditError::SheetList(other.to_string()),
                });
            }
        };
        run.begin(count, &sheets);
        self.audit_sheets(&mut run, &sheets, provider);
        if let Some(source) = names {
            match source.named_ranges() {
                Ok(list) => run.audit_named_ranges(&list),
                Err(err) => tracing::warn!(error = %err, "named ranges unavailable"),
            }
        }
        Ok(run.finish())
    }

    /// Audit the given sheets, in the given order, without consulting an enumerator.
    pub fn run_sheets<P>(&self, sheets: &[String], provider: &P) -> AuditReport
    where
        P: GridProvider + ?Sized,
    {
        let mut run = AuditRun::new(self.settings.clone());
        run.begin(sheets.len(), sheets);
        self.audit_sheets(&mut run, sheets, provider);
        run.finish()
    }

    fn audit_sheets<P>(&self, run: &mut AuditRun, sheets: &[String], provider: &P)
    where
        P: GridProvider + ?Sized,
    {
        for (idx, sheet) in sheets.iter().enumerate() {
            run.phase = RunPhase::Auditing(idx);
            match provider.load_grid(sheet) {
                Ok(Some(grid)) => {
                    run.audit_sheet(sheet, &grid);
                }
                Ok(None) => run.skip_sheet(sheet, "no data"),
                Err(err) => run.skip_sheet(sheet, &err.to_string()),
            }
        }
    }
}
