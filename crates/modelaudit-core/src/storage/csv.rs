//! CSV-backed workbooks: one sheet per file.

use modelaudit_engine::engine::{Cell, CellValue, FORMULA_MARKER, SheetGrid};
use std::path::{Path, PathBuf};

use crate::error::{AuditError, Result};
use crate::provider::{GridProvider, NamedRange, NamedRangeSource, SheetEnumerator};

const CSV_EXTENSION: &str = "csv";

/// A workbook made of CSV files. Each file is a sheet named after its stem.
#[derive(Clone, Debug, Default)]
pub struct CsvWorkbook {
    sheets: Vec<(String, PathBuf)>,
}

impl CsvWorkbook {
    /// Build a workbook from files and directories, in the order given.
    ///
    /// A directory contributes its `*.csv` files sorted by file name. Files
    /// are not opened here; a missing file surfaces when its sheet is loaded.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut book = CsvWorkbook::default();
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                for file in csv_files_in(path)? {
                    book.add(file)?;
                }
            } else {
                book.add(path.to_path_buf())?;
            }
        }
        Ok(book)
    }

    pub fn from_dir(dir: &Path) -> Result<Self> {
        Self::from_paths(&[dir])
    }

    fn add(&mut self, path: PathBuf) -> Result<()> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuditError::Config(format!("no sheet name in path {}", path.display())))?;
        if self.sheets.iter().any(|(n, _)| *n == name) {
            return Err(AuditError::Config(format!(
                "duplicate sheet name '{}' from {}",
                name,
                path.display()
            )));
        }
        tracing::debug!(sheet = %name, path = %path.display(), "csv sheet registered");
        self.sheets.push((name, path));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn sheet_path(&self, sheet: &str) -> Option<&Path> {
        self.sheets
            .iter()
            .find(|(n, _)| n == sheet)
            .map(|(_, p)| p.as_path())
    }
}

fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

impl SheetEnumerator for CsvWorkbook {
    fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.sheets.iter().map(|(n, _)| n.clone()).collect())
    }
}

// CSV files carry no defined names.
impl NamedRangeSource for CsvWorkbook {
    fn named_ranges(&self) -> Result<Vec<NamedRange>> {
        Ok(Vec::new())
    }
}

impl GridProvider for CsvWorkbook {
    fn load_grid(&self, sheet: &str) -> Result<Option<SheetGrid>> {
        let load_err = |message: String| AuditError::SheetLoad {
            sheet: sheet.to_string(),
            message,
        };
        let path = self
            .sheet_path(sheet)
            .ok_or_else(|| load_err("no such sheet".to_string()))?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| load_err(format!("{}: {}", path.display(), e)))?;
        let grid = parse_sheet(&content).map_err(|e| load_err(e.to_string()))?;
        Ok((!grid.is_empty()).then_some(grid))
    }
}

/// Parse CSV text into a grid. `=` fields are formulas with no evaluated value.
///
/// A quoted field may span lines; the record continues until its quotes
/// balance. Parse errors carry the line the record started on.
pub fn parse_sheet(content: &str) -> Result<SheetGrid> {
    let mut rows = Vec::new();
    let mut open: Option<(usize, String)> = None;
    for (line_idx, line) in content.lines().enumerate() {
        let (start_line, record) = match open.take() {
            Some((start, mut record)) => {
                record.push('\n');
                record.push_str(line);
                (start, record)
            }
            None => (line_idx + 1, line.to_string()),
        };
        if has_open_quote(&record) {
            open = Some((start_line, record));
            continue;
        }

        let fields = parse_csv_line(&record).map_err(|message| AuditError::Parse {
            line: start_line,
            message,
        })?;
        let row_idx = rows.len();
        let cells: Vec<Cell> = fields
            .iter()
            .enumerate()
            .map(|(col_idx, field)| parse_csv_field(field, row_idx, col_idx))
            .collect();
        rows.push(cells);
    }
    if let Some((line, _)) = open {
        return Err(AuditError::Parse {
            line,
            message: "unterminated quoted field".to_string(),
        });
    }

    // Trailing blank lines are not part of the used range.
    while rows
        .last()
        .is_some_and(|row: &Vec<Cell>| row.iter().all(|c| c.value.is_blank() && !c.is_formula()))
    {
        rows.pop();
    }
    Ok(SheetGrid::from_rows(rows))
}

// Doubled quotes keep the count even, so an odd count means a field is still open.
fn has_open_quote(record: &str) -> bool {
    record.matches('"').count() % 2 == 1
}

/// Split one CSV record, honouring quoted fields and doubled quotes.
/// Unquoted fields are trimmed; quoted ones are kept as written.
fn parse_csv_line(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                field_was_quoted = true;
            }
            ',' => {
                let field = std::mem::take(&mut current);
                fields.push(if field_was_quoted { field } else { field.trim().to_string() });
                field_was_quoted = false;
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(if field_was_quoted { current } else { current.trim().to_string() });
    Ok(fields)
}

fn parse_csv_field(field: &str, row: usize, col: usize) -> Cell {
    if field.starts_with(FORMULA_MARKER) && field.len() > 1 {
        return Cell::formula_at(field, CellValue::Empty, row, col);
    }
    Cell::new_value(CellValue::from_raw(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_csv_line_quotes() {
        assert_eq!(parse_csv_line("a, b ,c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(
            parse_csv_line(r#""Net, adjusted","say ""hi""",  x"#).unwrap(),
            vec!["Net, adjusted", "say \"hi\"", "x"]
        );
        assert_eq!(parse_csv_line(r#"" padded ",1"#).unwrap(), vec![" padded ", "1"]);
        assert_eq!(parse_csv_line("").unwrap(), vec![""]);
        assert!(parse_csv_line(r#""open,1"#).is_err());
    }

    #[test]
    fn test_parse_sheet_cells() {
        let grid = parse_sheet("Revenue,,=B1*2,#DIV/0!\n007,TRUE\n\n").unwrap();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.col_count(), 4);

        let formula = grid.cell(0, 2);
        assert!(formula.is_formula());
        assert_eq!(formula.value, CellValue::Empty);
        assert_eq!(formula.formula_shape(), Some("=RC[-1]*2"));

        assert_eq!(grid.value(0, 0), &CellValue::Text("Revenue".into()));
        assert_eq!(grid.value(0, 1), &CellValue::Empty);
        assert!(grid.value(0, 3).error_code().is_some());
        assert_eq!(grid.value(1, 0), &CellValue::Text("007".into()));
        assert_eq!(grid.value(1, 1), &CellValue::Boolean(true));
        assert_eq!(grid.value(1, 3), &CellValue::Empty);
    }

    #[test]
    fn test_parse_sheet_reports_line_of_bad_quote() {
        let err = parse_sheet("a,b\n\"c,d\n").unwrap_err();
        assert!(matches!(err, AuditError::Parse { line: 2, .. }));

        let err = parse_sheet("a\n\"b\nc\nd\n").unwrap_err();
        assert!(matches!(err, AuditError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_quoted_field_spans_lines() {
        let grid = parse_sheet("\"Net\nrevenue\",1,=B1*2\nCosts,\"say \"\"hi\"\"\",=B2*2\n").unwrap();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.value(0, 0), &CellValue::Text("Net\nrevenue".into()));
        assert_eq!(grid.value(1, 0), &CellValue::Text("Costs".into()));
        assert_eq!(grid.value(1, 1), &CellValue::Text("say \"hi\"".into()));
        // The second record starts on line 3 but is sheet row 2.
        assert_eq!(grid.cell(1, 2).formula_shape(), Some("=RC[-1]*2"));
    }

    #[test]
    fn test_csv_workbook_has_no_names() {
        let book = CsvWorkbook::default();
        assert!(book.named_ranges().unwrap().is_empty());
    }

    #[test]
    fn test_directory_sheets_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_costs.csv"), "Costs,1\n").unwrap();
        fs::write(dir.path().join("a_revenue.csv"), "Revenue,2\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("empty.csv"), "").unwrap();

        let book = CsvWorkbook::from_dir(dir.path()).unwrap();
        assert_eq!(book.sheet_names().unwrap(), vec!["a_revenue", "b_costs", "empty"]);

        let grid = book.load_grid("a_revenue").unwrap().unwrap();
        assert_eq!(grid.value(0, 1), &CellValue::Number(2.0));
        assert_eq!(book.load_grid("empty").unwrap(), None);
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let book = CsvWorkbook::from_paths(&[dir.path().join("gone.csv")]).unwrap();
        assert_eq!(book.len(), 1);
        assert!(matches!(
            book.load_grid("gone"),
            Err(AuditError::SheetLoad { .. })
        ));
    }

    #[test]
    fn test_duplicate_sheet_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("copy");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("Model.csv"), "x").unwrap();
        fs::write(sub.join("Model.csv"), "y").unwrap();

        let err = CsvWorkbook::from_paths(&[dir.path().join("Model.csv"), sub]).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }
}
