//! Formula diagnostics that do not depend on the row pattern.

use regex::Regex;
use std::sync::OnceLock;

use super::cell::FORMULA_MARKER;
use super::cell_ref::CellRef;

/// References within this many columns of the formula's own column count as
/// neighbours for shifted-reference detection.
const SHIFT_WINDOW: usize = 3;
const REF_ERROR: &str = "#REF!";

const VOLATILE_FUNCTIONS: [&str; 8] = [
    "NOW(",
    "TODAY(",
    "RAND(",
    "RANDBETWEEN(",
    "INDIRECT(",
    "OFFSET(",
    "INFO(",
    "CELL(",
];

fn function_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[A-Z][A-Z0-9_]*\(").expect("function call regex must compile"))
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\$?([A-Z]{1,3})\$?[0-9]+").expect("reference regex must compile"))
}

/// True when the formula calls a function that recalculates on every change.
pub fn contains_volatile_function(formula: &str) -> bool {
    let upper = formula.to_ascii_uppercase();
    VOLATILE_FUNCTIONS.iter().any(|f| upper.contains(f))
}

/// True when a formula in column `col` (0-based) references its own column
/// and also a nearby different column, a sign of a reference dragged out of line.
pub fn has_shifted_column_reference(formula: &str, col: usize) -> bool {
    if !formula.starts_with(FORMULA_MARKER) {
        return false;
    }
    let mut same_col = false;
    let mut near_col = false;
    for caps in reference_re().captures_iter(formula) {
        let Some(ref_col) = CellRef::letters_to_col(&caps[1]) else {
            continue;
        };
        if ref_col == col {
            same_col = true;
        } else if ref_col.abs_diff(col) <= SHIFT_WINDOW {
            near_col = true;
        }
    }
    same_col && near_col
}

/// True when a formula or name definition points at a deleted range.
pub fn has_broken_reference(refers_to: &str) -> bool {
    refers_to.contains(REF_ERROR)
}

/// Rough complexity score from 0 to 10.
///
/// Sums four banded factors: length (up to 2), parenthesis nesting (up to 3),
/// function calls (up to 2) and cell references (up to 2).
pub fn formula_complexity(formula: &str) -> u8 {
    let mut score = 0.0f64;

    let len = formula.chars().count();
    score += match len {
        l if l > 200 => 2.0,
        l if l > 100 => 1.0,
        l if l > 50 => 0.5,
        _ => 0.0,
    };

    let mut depth = 0i32;
    let mut max_depth = 0i32;
    for ch in formula.chars() {
        match ch {
            '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ')' => depth -= 1,
            _ => {}
        }
    }
    score += match max_depth {
        d if d > 5 => 3.0,
        d if d > 3 => 2.0,
        d if d > 1 => 1.0,
        _ => 0.0,
    };

    score += match function_call_re().find_iter(formula).count() {
        n if n > 10 => 2.0,
        n if n > 5 => 1.0,
        n if n > 2 => 0.5,
        _ => 0.0,
    };

    score += match reference_re().find_iter(formula).count() {
        n if n > 20 => 2.0,
        n if n > 10 => 1.0,
        n if n > 5 => 0.5,
        _ => 0.0,
    };

    score.round().min(10.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volatile_detection_is_case_insensitive() {
        assert!(contains_volatile_function("=today()-A1"));
        assert!(contains_volatile_function("=SUM(OFFSET(A1,0,0,3,1))"));
        assert!(!contains_volatile_function("=SUM(A1:A3)"));
    }

    #[test]
    fn test_shifted_reference_needs_own_and_nearby_column() {
        // Column C is index 2.
        assert!(has_shifted_column_reference("=C5+B5", 2));
        assert!(has_shifted_column_reference("=$c$1*F9", 2));
        assert!(!has_shifted_column_reference("=C5+C6", 2));
        assert!(!has_shifted_column_reference("=C5+H5", 2));
        assert!(!has_shifted_column_reference("=B5+D5", 2));
        assert!(!has_shifted_column_reference("C5+B5", 2));
    }

    #[test]
    fn test_broken_reference() {
        assert!(has_broken_reference("=Inputs!#REF!"));
        assert!(!has_broken_reference("=Inputs!$B$2:$B$9"));
    }

    #[test]
    fn test_simple_formula_scores_low() {
        assert_eq!(formula_complexity("=A1+B1"), 0);
    }

    #[test]
    fn test_nested_formula_scores_high() {
        let formula = "=IF(AND(A1>0,OR(B1<1,C1=2)),ROUND(SUM(D1:D9)/MAX(E1,1),2),IFERROR(INDEX(F1:F9,MATCH(G1,H1:H9,0)),0))+IF(I1>J1,K1,L1)";
        assert!(formula_complexity(formula) >= 5);
        assert!(formula_complexity(&formula.repeat(4)) <= 10);
    }
}
