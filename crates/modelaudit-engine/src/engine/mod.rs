//! Audit engine API.
//!
//! This module provides the analysis primitives the orchestrator drives:
//!
//! - [`Cell`], [`CellValue`], [`ErrorCode`], [`SheetGrid`] - Data structures for sheet snapshots
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`formula_shape`], [`render_shape`] - Relative-reference normalization
//! - [`detect_axis`], [`detect_total_columns`] - Period axis and total columns
//! - [`resolve_row_label`] - Row context labels
//! - [`dominant_pattern`] - Per-row majority formula shape
//! - [`classify_cell`] - Cell classification
//! - [`formula_complexity`], [`contains_volatile_function`], [`has_shifted_column_reference`] - Formula diagnostics

mod axis;
mod cell;
mod cell_ref;
mod classify;
mod diagnostics;
mod grid;
mod label;
mod pattern;
mod shape;

pub use axis::{AxisInfo, AxisRun, detect_axis, detect_axis_run, detect_total_columns};
pub use cell::{Cell, CellValue, ErrorCode, FORMULA_MARKER, format_number};
pub use cell_ref::CellRef;
pub use classify::{CellClass, classify_cell};
pub use diagnostics::{
    contains_volatile_function, formula_complexity, has_broken_reference, has_shifted_column_reference,
};
pub use grid::SheetGrid;
pub use label::{resolve_row_label, truncate_chars};
pub use pattern::{PatternRules, dominant_pattern, row_dominant_pattern};
pub use shape::{formula_shape, render_shape};
