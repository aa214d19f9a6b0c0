//! Sheet sources for an audit run.
//!
//! The orchestrator never reads files itself. It asks a [`SheetEnumerator`]
//! which sheets exist and a [`GridProvider`] for each sheet's grid.

use modelaudit_engine::engine::SheetGrid;
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

/// Sheet names always excluded from an audit, besides the `AUDIT_` prefix.
const RESERVED_SHEETS: [&str; 3] = ["ISSUES", "EXTERNAL_LINKS", "NAMED_RANGES"];
const RESERVED_PREFIX: &str = "AUDIT_";

/// Lists the sheets of a workbook in workbook order.
pub trait SheetEnumerator {
    fn sheet_names(&self) -> Result<Vec<String>>;
}

/// Loads one sheet's used range.
pub trait GridProvider {
    /// Returns `Ok(None)` when the sheet exists but holds no data.
    fn load_grid(&self, sheet: &str) -> Result<Option<SheetGrid>>;
}

/// A workbook-level defined name and the formula it stands for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedRange {
    pub name: String,
    /// Definition as the host shows it, e.g. `=Inputs!$B$2:$B$9`.
    pub refers_to: String,
}

/// Lists the defined names of a workbook.
pub trait NamedRangeSource {
    fn named_ranges(&self) -> Result<Vec<NamedRange>>;
}

/// False for sheets produced by previous audits or reserved report names.
pub fn is_audit_eligible(sheet: &str, dashboard_name: &str) -> bool {
    let upper = sheet.to_uppercase();
    !upper.starts_with(RESERVED_PREFIX)
        && !RESERVED_SHEETS.contains(&upper.as_str())
        && upper != dashboard_name.to_uppercase()
}

/// A workbook held entirely in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, SheetGrid)>,
    names: Vec<NamedRange>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, grid: SheetGrid) -> Self {
        self.insert(name, grid);
        self
    }

    /// Add or replace a sheet, keeping its original position on replace.
    pub fn insert(&mut self, name: &str, grid: SheetGrid) {
        if let Some(slot) = self.sheets.iter_mut().find(|(n, _)| n == name) {
            slot.1 = grid;
        } else {
            self.sheets.push((name.to_string(), grid));
        }
    }

    pub fn with_name(mut self, name: &str, refers_to: &str) -> Self {
        self.names.push(NamedRange {
            name: name.to_string(),
            refers_to: refers_to.to_string(),
        });
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<SheetGrid> {
        let idx = self.sheets.iter().position(|(n, _)| n == name)?;
        Some(self.sheets.remove(idx).1)
    }
}

impl SheetEnumerator for MemoryWorkbook {
    fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.sheets.iter().map(|(n, _)| n.clone()).collect())
    }
}

impl NamedRangeSource for MemoryWorkbook {
    fn named_ranges(&self) -> Result<Vec<NamedRange>> {
        Ok(self.names.clone())
    }
}

impl GridProvider for MemoryWorkbook {
    fn load_grid(&self, sheet: &str) -> Result<Option<SheetGrid>> {
        let (_, grid) = self
            .sheets
            .iter()
            .find(|(n, _)| n == sheet)
            .ok_or_else(|| AuditError::SheetLoad {
                sheet: sheet.to_string(),
                message: "no such sheet".to_string(),
            })?;
        Ok((!grid.is_empty()).then(|| grid.clone()))
    }
}
