//! Workbook sources backed by files.

pub mod csv;

pub use csv::{CsvWorkbook, parse_sheet};
