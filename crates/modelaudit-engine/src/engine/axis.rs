//! Period-axis and total-column detection.
//!
//! Financial models number their periods across a header row (1, 2, 3, ...).
//! The axis locates that row and where the run of periods starts; columns
//! inside the run that break the numbering (e.g. a yearly total) are total
//! columns and are excluded from pattern comparison.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::cell::CellValue;
use super::grid::SheetGrid;

/// Location of the period axis. Both fields are 1-based; 0 means not found.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AxisInfo {
    pub row: usize,
    pub col: usize,
}

impl AxisInfo {
    pub const NOT_FOUND: AxisInfo = AxisInfo { row: 0, col: 0 };

    pub fn is_found(&self) -> bool {
        self.row > 0 && self.col > 0
    }
}

/// A detected run of period numbers. Columns are 0-based and inclusive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AxisRun {
    pub row: usize,
    pub start_col: usize,
    pub end_col: usize,
    /// Number of numeric period columns accepted into the run.
    pub length: usize,
}

impl AxisRun {
    pub fn info(&self) -> AxisInfo {
        AxisInfo {
            row: self.row + 1,
            col: self.start_col + 1,
        }
    }
}

fn integer_part(value: &CellValue) -> Option<i64> {
    value.as_number().map(|n| n.trunc() as i64)
}

/// Extend a qualifying 1, 2, 3 triple that starts at (row, col).
///
/// A numeric cell continues the run when its integer part is the next period
/// or the one after it. Non-numeric cells are stepped over; the scan stops
/// only on a numeric value outside that window.
fn extend_run(grid: &SheetGrid, row: usize, col: usize) -> AxisRun {
    let mut period = 3i64;
    let mut end_col = col + 2;
    let mut length = 3usize;

    for c in col + 3..grid.col_count() {
        let Some(n) = integer_part(grid.value(row, c)) else {
            continue;
        };
        if n == period + 1 || n == period + 2 {
            period = n;
            end_col = c;
            length += 1;
        } else {
            break;
        }
    }

    AxisRun {
        row,
        start_col: col,
        end_col,
        length,
    }
}

/// Find the longest period run within the first `scan_rows` rows.
/// Ties keep the first run found scanning row by row, left to right.
pub fn detect_axis_run(grid: &SheetGrid, scan_rows: usize) -> Option<AxisRun> {
    let mut best: Option<AxisRun> = None;
    let rows = scan_rows.min(grid.row_count());
    let cols = grid.col_count();

    for r in 0..rows {
        for c in 0..cols.saturating_sub(2) {
            let triple = (
                integer_part(grid.value(r, c)),
                integer_part(grid.value(r, c + 1)),
                integer_part(grid.value(r, c + 2)),
            );
            if triple != (Some(1), Some(2), Some(3)) {
                continue;
            }
            let run = extend_run(grid, r, c);
            if best.is_none_or(|b| run.length > b.length) {
                best = Some(run);
            }
        }
    }

    if let Some(run) = &best {
        tracing::debug!(
            row = run.row + 1,
            start_col = run.start_col + 1,
            end_col = run.end_col + 1,
            length = run.length,
            "period axis detected"
        );
    }
    best
}

/// 1-based axis location, or [`AxisInfo::NOT_FOUND`].
pub fn detect_axis(grid: &SheetGrid, scan_rows: usize) -> AxisInfo {
    detect_axis_run(grid, scan_rows)
        .map(|run| run.info())
        .unwrap_or(AxisInfo::NOT_FOUND)
}

/// Columns (0-based) between `start_col` and `end_col` inclusive whose value
/// in `axis_row` (0-based) is missing or not a number.
pub fn detect_total_columns(
    grid: &SheetGrid,
    axis_row: usize,
    start_col: usize,
    end_col: usize,
) -> BTreeSet<usize> {
    (start_col..=end_col)
        .filter(|&c| grid.value(axis_row, c).as_number().is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn t(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_no_sequence_means_not_found() {
        let grid = SheetGrid::from_values(vec![
            vec![t("Revenue"), n(10.0), n(20.0), n(30.0)],
            vec![n(1.0), n(2.0), n(4.0), n(5.0)],
        ]);
        assert_eq!(detect_axis(&grid, 15), AxisInfo::NOT_FOUND);
        assert!(!detect_axis(&grid, 15).is_found());
    }

    #[test]
    fn test_simple_axis() {
        let grid = SheetGrid::from_values(vec![
            vec![t("Model")],
            vec![t("Period"), t(""), n(1.0), n(2.0), n(3.0), n(4.0)],
        ]);
        let run = detect_axis_run(&grid, 15).unwrap();
        assert_eq!(run.info(), AxisInfo { row: 2, col: 3 });
        assert_eq!(run.end_col, 5);
        assert_eq!(run.length, 4);
    }

    #[test]
    fn test_integer_part_is_used() {
        let grid = SheetGrid::from_values(vec![vec![n(1.9), n(2.2), n(3.0), n(4.7)]]);
        assert_eq!(detect_axis(&grid, 15), AxisInfo { row: 1, col: 1 });
    }

    #[test]
    fn test_run_steps_over_text_and_tolerates_one_gap() {
        let grid = SheetGrid::from_values(vec![vec![
            n(1.0),
            n(2.0),
            n(3.0),
            t("YTD"),
            n(4.0),
            n(6.0),
            t(""),
            n(7.0),
            n(20.0),
            n(8.0),
        ]]);
        let run = detect_axis_run(&grid, 15).unwrap();
        assert_eq!(run.end_col, 7);
        assert_eq!(run.length, 6);
    }

    #[test]
    fn test_longest_run_wins_and_ties_keep_first() {
        let grid = SheetGrid::from_values(vec![
            vec![n(1.0), n(2.0), n(3.0)],
            vec![t("x"), n(1.0), n(2.0), n(3.0), n(4.0)],
            vec![t("y"), n(1.0), n(2.0), n(3.0), n(4.0)],
        ]);
        assert_eq!(detect_axis(&grid, 15), AxisInfo { row: 2, col: 2 });
    }

    #[test]
    fn test_scan_rows_limit() {
        let mut rows = vec![vec![t("label")]; 3];
        rows.push(vec![n(1.0), n(2.0), n(3.0)]);
        let grid = SheetGrid::from_values(rows);
        assert_eq!(detect_axis(&grid, 3), AxisInfo::NOT_FOUND);
        assert_eq!(detect_axis(&grid, 4), AxisInfo { row: 4, col: 1 });
    }

    #[test]
    fn test_total_columns_inside_run() {
        let grid = SheetGrid::from_values(vec![vec![
            t("Label"),
            n(1.0),
            n(2.0),
            n(3.0),
            t("YTD"),
            n(4.0),
            n(5.0),
            n(6.0),
        ]]);
        let run = detect_axis_run(&grid, 15).unwrap();
        assert_eq!((run.start_col, run.end_col), (1, 7));
        let totals = detect_total_columns(&grid, run.row, run.start_col, run.end_col);
        assert_eq!(totals.into_iter().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_total_columns_treat_booleans_and_blanks_as_totals() {
        let grid = SheetGrid::from_values(vec![vec![
            n(1.0),
            CellValue::Boolean(true),
            CellValue::Empty,
            n(2.0),
        ]]);
        let totals = detect_total_columns(&grid, 0, 0, 3);
        assert_eq!(totals.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }
}
