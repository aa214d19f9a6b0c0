//! Cell data structures for audited sheet grids.
//!
//! - [`ErrorCode`] - The closed set of spreadsheet-native error values
//! - [`CellValue`] - The displayed value of a cell
//! - [`Cell`] - A value plus optional formula text and its relative shape

use serde::{Deserialize, Serialize};
use std::fmt;

use super::shape::formula_shape;

/// Marker that starts every formula.
pub const FORMULA_MARKER: char = '=';

/// Spreadsheet-native error values a cell can display.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "#DIV/0!")]
    DivZero,
    #[serde(rename = "#N/A")]
    NotAvailable,
    #[serde(rename = "#NAME?")]
    Name,
    #[serde(rename = "#NULL!")]
    Null,
    #[serde(rename = "#NUM!")]
    Num,
    #[serde(rename = "#REF!")]
    Ref,
    #[serde(rename = "#VALUE!")]
    Value,
    #[serde(rename = "#CALC!")]
    Calc,
    #[serde(rename = "#SPILL!")]
    Spill,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::DivZero,
        ErrorCode::NotAvailable,
        ErrorCode::Name,
        ErrorCode::Null,
        ErrorCode::Num,
        ErrorCode::Ref,
        ErrorCode::Value,
        ErrorCode::Calc,
        ErrorCode::Spill,
    ];

    /// Recognize an error literal exactly as the host displays it.
    pub fn parse(text: &str) -> Option<ErrorCode> {
        if !text.starts_with('#') {
            return None;
        }
        Self::ALL.into_iter().find(|code| code.as_str() == text)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DivZero => "#DIV/0!",
            ErrorCode::NotAvailable => "#N/A",
            ErrorCode::Name => "#NAME?",
            ErrorCode::Null => "#NULL!",
            ErrorCode::Num => "#NUM!",
            ErrorCode::Ref => "#REF!",
            ErrorCode::Value => "#VALUE!",
            ErrorCode::Calc => "#CALC!",
            ErrorCode::Spill => "#SPILL!",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::DivZero => "Division by zero",
            ErrorCode::NotAvailable => "Value not available",
            ErrorCode::Name => "Unrecognized name",
            ErrorCode::Null => "Incorrect range reference",
            ErrorCode::Num => "Invalid numeric value",
            ErrorCode::Ref => "Invalid cell reference",
            ErrorCode::Value => "Wrong value type",
            ErrorCode::Calc => "Calculation error",
            ErrorCode::Spill => "Spill range blocked",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            ErrorCode::DivZero => "Check denominator; use IFERROR wrapper",
            ErrorCode::NotAvailable => "Verify lookup value exists; use IFNA",
            ErrorCode::Name => "Check for typos or undefined names",
            ErrorCode::Null => "Check range intersection syntax",
            ErrorCode::Num => "Check for invalid numeric arguments",
            ErrorCode::Ref => "Update deleted cell references",
            ErrorCode::Value => "Check data types in formula",
            ErrorCode::Calc => "Review calculation logic",
            ErrorCode::Spill => "Clear blocking cells in spill range",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value a cell displays.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorCode),
}

impl CellValue {
    /// Interpret a raw textual value as the host would display it.
    /// - Empty string -> Empty
    /// - Error literal (`#REF!`, ...) -> Error
    /// - `TRUE`/`FALSE` (any case) -> Boolean
    /// - Valid number -> Number (unless it has leading zeros like "007")
    /// - Otherwise -> Text
    pub fn from_raw(raw: &str) -> CellValue {
        if raw.is_empty() {
            return CellValue::Empty;
        }

        if let Some(code) = ErrorCode::parse(raw) {
            return CellValue::Error(code);
        }

        // Keep explicit surrounding whitespace as text.
        let trimmed = raw.trim();
        if raw != trimmed {
            return CellValue::Text(raw.to_string());
        }

        if trimmed.eq_ignore_ascii_case("TRUE") {
            return CellValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("FALSE") {
            return CellValue::Boolean(false);
        }

        // Preserve strings that look like numbers but have leading zeros (e.g., "007")
        if trimmed.starts_with('0')
            && trimmed.len() > 1
            && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            return CellValue::Text(trimmed.to_string());
        }

        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    /// True for a missing value or an empty string. Whitespace is content.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            CellValue::Error(code) => Some(*code),
            _ => None,
        }
    }

    /// Text as the host displays it.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Error(code) => code.as_str().to_string(),
        }
    }
}

/// Format a number for display: integral values lose the fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// A cell in a sheet grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    /// Formula text in A1 style, including the leading `=`.
    pub formula: Option<String>,
    /// Relative (R1C1) form of `formula`, identical for formulas that only
    /// differ by their own position.
    pub shape: Option<String>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::default()
    }

    pub fn new_value(value: CellValue) -> Cell {
        Cell {
            value,
            formula: None,
            shape: None,
        }
    }

    pub fn new_number(n: f64) -> Cell {
        Cell::new_value(CellValue::Number(n))
    }

    pub fn new_text(text: &str) -> Cell {
        Cell::new_value(CellValue::Text(text.to_string()))
    }

    /// Create a formula cell located at (row, col), 0-based.
    /// The relative shape is derived from the formula text.
    pub fn formula_at(formula: &str, value: CellValue, row: usize, col: usize) -> Cell {
        let shape = formula
            .starts_with(FORMULA_MARKER)
            .then(|| formula_shape(formula, row, col));
        Cell {
            value,
            formula: Some(formula.to_string()),
            shape,
        }
    }

    /// True iff the formula text exists and starts with the formula marker.
    pub fn is_formula(&self) -> bool {
        self.formula
            .as_deref()
            .is_some_and(|f| f.starts_with(FORMULA_MARKER))
    }

    /// The shape used for pattern comparison, when this cell has one.
    pub fn formula_shape(&self) -> Option<&str> {
        self.shape
            .as_deref()
            .filter(|s| !s.is_empty() && s.starts_with(FORMULA_MARKER))
    }
}
