//! Row label resolution.

use super::grid::SheetGrid;

const ELLIPSIS: &str = "...";

/// Pick the most descriptive text among the first `label_cols` cells of `row`.
///
/// The longest trimmed, non-empty, non-error display text wins (first one on
/// ties). Labels longer than `max_chars` are cut and suffixed with `...`.
/// An empty result means the row has no context and is not audited.
pub fn resolve_row_label(grid: &SheetGrid, row: usize, label_cols: usize, max_chars: usize) -> String {
    let mut best = String::new();
    let mut best_len = 0usize;

    for col in 0..label_cols.min(grid.col_count()) {
        let value = grid.value(row, col);
        if value.error_code().is_some() {
            continue;
        }
        let text = value.display_text();
        let trimmed = text.trim();
        let len = trimmed.chars().count();
        if len > best_len {
            best_len = len;
            best = trimmed.to_string();
        }
    }

    truncate_chars(&best, max_chars)
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CellValue, ErrorCode};

    fn t(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_longest_label_wins() {
        let grid = SheetGrid::from_values(vec![vec![
            t("1.1"),
            t("  Revenue growth  "),
            t("Rev"),
            t("Revenue growth %"),
        ]]);
        assert_eq!(resolve_row_label(&grid, 0, 4, 50), "Revenue growth %");
    }

    #[test]
    fn test_errors_and_blanks_are_ignored() {
        let grid = SheetGrid::from_values(vec![vec![
            CellValue::Error(ErrorCode::Value),
            t("   "),
            CellValue::Empty,
        ]]);
        assert_eq!(resolve_row_label(&grid, 0, 4, 50), "");
    }

    #[test]
    fn test_only_leading_columns_count() {
        let grid = SheetGrid::from_values(vec![vec![
            CellValue::Empty,
            CellValue::Empty,
            t("Label in column C"),
        ]]);
        assert_eq!(resolve_row_label(&grid, 0, 2, 50), "");
        assert_eq!(resolve_row_label(&grid, 0, 3, 50), "Label in column C");
    }

    #[test]
    fn test_numbers_count_as_text() {
        let grid = SheetGrid::from_values(vec![vec![CellValue::Number(2024.0)]]);
        assert_eq!(resolve_row_label(&grid, 0, 4, 50), "2024");
    }

    #[test]
    fn test_long_labels_are_truncated() {
        let grid = SheetGrid::from_values(vec![vec![t("Operating expenses")]]);
        assert_eq!(resolve_row_label(&grid, 0, 4, 9), "Operating...");
        assert_eq!(truncate_chars("héllo", 5), "héllo");
    }
}
