//! Dominant formula pattern per row.

use std::collections::{BTreeSet, HashMap};

use super::grid::SheetGrid;

/// Quorum and majority rules for accepting a row's dominant shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternRules {
    /// Minimum number of formulas in the row before any shape can dominate.
    pub min_formulas: usize,
    /// Minimum share of the row's formulas the winning shape must cover.
    pub min_share: f64,
}

impl Default for PatternRules {
    fn default() -> Self {
        PatternRules {
            min_formulas: 3,
            min_share: 0.4,
        }
    }
}

/// Pick the dominant shape from shapes listed in left-to-right order.
///
/// Only non-empty shapes starting with `=` are counted. Returns None when
/// the row has fewer formulas than the quorum, or when the most frequent
/// shape covers less than the required share (a fragmented row). Ties go to
/// the shape first seen in the scan.
pub fn dominant_pattern<'a, I>(shapes: I, rules: PatternRules) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<&'a str> = Vec::new();
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    let mut total = 0usize;

    for shape in shapes {
        if shape.is_empty() || !shape.starts_with('=') {
            continue;
        }
        total += 1;
        let count = counts.entry(shape).or_insert(0);
        if *count == 0 {
            order.push(shape);
        }
        *count += 1;
    }

    if total < rules.min_formulas {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;
    for shape in order {
        let count = counts[shape];
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((shape, count));
        }
    }

    let (shape, count) = best?;
    if count as f64 >= rules.min_share * total as f64 {
        Some(shape.to_string())
    } else {
        tracing::debug!(total, best = count, "row too fragmented for a dominant pattern");
        None
    }
}

/// Dominant shape of `row` over the audit zone starting at `start_col`
/// (0-based), skipping total columns.
pub fn row_dominant_pattern(
    grid: &SheetGrid,
    row: usize,
    start_col: usize,
    total_cols: &BTreeSet<usize>,
    rules: PatternRules,
) -> Option<String> {
    let shapes = grid
        .row(row)
        .iter()
        .enumerate()
        .skip(start_col)
        .filter(|(col, _)| !total_cols.contains(col))
        .filter(|(_, cell)| cell.is_formula())
        .filter_map(|(_, cell)| cell.formula_shape());
    dominant_pattern(shapes, rules)
}
