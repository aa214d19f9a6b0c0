//! Per-cell classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::cell::Cell;

/// Outcome of classifying one cell in the audit zone.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellClass {
    Empty,
    Error,
    Total,
    Hardcode,
    Break,
    Consistent,
}

impl CellClass {
    pub fn as_str(self) -> &'static str {
        match self {
            CellClass::Empty => "empty",
            CellClass::Error => "error",
            CellClass::Total => "total",
            CellClass::Hardcode => "hardcode",
            CellClass::Break => "break",
            CellClass::Consistent => "consistent",
        }
    }
}

impl fmt::Display for CellClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a cell against its row's dominant shape.
///
/// Rules apply in order and the first match wins: blank non-formula cells
/// are empty, error values are errors (even in total columns), total columns
/// are totals, literals are hardcodes, formulas whose shape differs from an
/// established dominant shape are breaks, everything else is consistent.
pub fn classify_cell(cell: &Cell, dominant: Option<&str>, is_total_column: bool) -> CellClass {
    let is_formula = cell.is_formula();

    if cell.value.is_blank() && !is_formula {
        return CellClass::Empty;
    }
    if cell.value.error_code().is_some() {
        return CellClass::Error;
    }
    if is_total_column {
        return CellClass::Total;
    }
    if !is_formula {
        return CellClass::Hardcode;
    }
    match dominant {
        Some(expected) if !expected.is_empty() && cell.shape.as_deref() != Some(expected) => {
            CellClass::Break
        }
        _ => CellClass::Consistent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CellValue, ErrorCode};

    fn formula(text: &str, col: usize) -> Cell {
        Cell::formula_at(text, CellValue::Number(1.0), 0, col)
    }

    #[test]
    fn test_blank_literal_is_empty() {
        assert_eq!(classify_cell(&Cell::new_empty(), None, false), CellClass::Empty);
        assert_eq!(classify_cell(&Cell::new_text(""), Some("=RC"), true), CellClass::Empty);
    }

    #[test]
    fn test_formula_with_blank_value_is_not_empty() {
        let cell = Cell::formula_at("=A1", CellValue::Empty, 0, 1);
        assert_eq!(classify_cell(&cell, None, false), CellClass::Consistent);
    }

    #[test]
    fn test_error_beats_total_and_literal() {
        let literal = Cell::new_value(CellValue::Error(ErrorCode::DivZero));
        assert_eq!(classify_cell(&literal, None, true), CellClass::Error);
        let computed = Cell::formula_at("=A1/0", CellValue::Error(ErrorCode::DivZero), 0, 1);
        assert_eq!(classify_cell(&computed, Some("=RC"), false), CellClass::Error);
    }

    #[test]
    fn test_total_beats_hardcode_and_break() {
        assert_eq!(classify_cell(&Cell::new_number(5.0), None, true), CellClass::Total);
        assert_eq!(
            classify_cell(&formula("=SUM(A1:C1)", 3), Some("=RC[-1]"), true),
            CellClass::Total
        );
    }

    #[test]
    fn test_literal_is_hardcode() {
        assert_eq!(classify_cell(&Cell::new_number(5.0), Some("=RC[-1]"), false), CellClass::Hardcode);
        assert_eq!(classify_cell(&Cell::new_text("n/a"), None, false), CellClass::Hardcode);
    }

    #[test]
    fn test_shape_mismatch_is_break_only_with_a_pattern() {
        let cell = formula("=A1*2", 2);
        assert_eq!(classify_cell(&cell, Some("=RC[-1]"), false), CellClass::Break);
        assert_eq!(classify_cell(&cell, None, false), CellClass::Consistent);
        assert_eq!(classify_cell(&cell, Some(""), false), CellClass::Consistent);
        assert_eq!(classify_cell(&cell, Some("=RC[-2]*2"), false), CellClass::Consistent);
    }
}
