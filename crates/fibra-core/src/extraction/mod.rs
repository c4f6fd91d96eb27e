pub mod delimited;
pub mod pdftotext;
pub mod spreadsheet;
pub mod table;
pub mod trace;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::FibraError;

/// A table as handed over by an extraction backend.
///
/// Rows are kept as-is; the first row is treated as the header when the
/// table is read column-wise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Table { rows }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(|r| r.as_slice())
    }

    pub fn body(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(|s| s.as_str())
    }

    /// Check that the table can be read column-wise: a header plus at least
    /// one data row, and no row wider than the header.
    pub fn check_shape(&self) -> Result<(), TableDefect> {
        let header_width = match self.header() {
            Some(h) if self.rows.len() >= 2 => h.len(),
            _ => return Err(TableDefect::TooShort),
        };
        for (i, row) in self.body().iter().enumerate() {
            if row.len() > header_width {
                return Err(TableDefect::Ragged {
                    row: i + 1,
                    cells: row.len(),
                    header_cells: header_width,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDefect {
    TooShort,
    Ragged {
        row: usize,
        cells: usize,
        header_cells: usize,
    },
}

impl fmt::Display for TableDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableDefect::TooShort => write!(f, "no data rows under the header"),
            TableDefect::Ragged {
                row,
                cells,
                header_cells,
            } => write!(
                f,
                "row {row} has {cells} cells but the header has {header_cells}"
            ),
        }
    }
}

/// Content extracted from a single page (or sheet) of a document.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub page_number: usize,
    pub lines: Vec<String>,
    pub tables: Vec<Table>,
}

impl PageContent {
    /// Build a page from grid rows (CSV, spreadsheet sheet).
    ///
    /// Lines are the rows joined by a double space so that the text strategies
    /// see the same gaps they would in a `pdftotext -layout` dump. Tables are
    /// the blocks of rows between blank rows.
    pub fn from_grid(page_number: usize, rows: Vec<Vec<String>>) -> Self {
        let mut lines = Vec::with_capacity(rows.len());
        let mut tables = Vec::new();
        let mut block: Vec<Vec<String>> = Vec::new();

        for mut row in rows {
            while row.last().is_some_and(|c| c.trim().is_empty()) {
                row.pop();
            }
            if row.is_empty() {
                lines.push(String::new());
                if !block.is_empty() {
                    tables.push(Table::new(std::mem::take(&mut block)));
                }
                continue;
            }
            lines.push(row.join("  "));
            block.push(row);
        }
        if !block.is_empty() {
            tables.push(Table::new(block));
        }

        PageContent {
            page_number,
            lines,
            tables,
        }
    }
}

/// Trait for document text/table extraction backends.
pub trait DocumentExtractor: Send + Sync {
    /// Extract content from document bytes, returning one PageContent per page.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageContent>, FibraError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Input kinds recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    Pdf,
    Csv,
    Spreadsheet,
    /// Vendor binary OTDR trace (e.g. Bellcore .sor).
    Trace,
    /// A trace already decoded to the JSON summary form.
    DecodedTrace,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<InputFormat, FibraError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(InputFormat::Pdf),
            "csv" | "txt" => Ok(InputFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(InputFormat::Spreadsheet),
            "sor" => Ok(InputFormat::Trace),
            "json" => Ok(InputFormat::DecodedTrace),
            _ => Err(FibraError::UnsupportedInput(path.display().to_string())),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputFormat::Pdf => "pdf",
            InputFormat::Csv => "csv",
            InputFormat::Spreadsheet => "spreadsheet",
            InputFormat::Trace => "sor",
            InputFormat::DecodedTrace => "trace json",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_format_by_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a/F01.PDF")).unwrap(), InputFormat::Pdf);
        assert_eq!(InputFormat::from_path(Path::new("F01.xlsx")).unwrap(), InputFormat::Spreadsheet);
        assert_eq!(InputFormat::from_path(Path::new("F01.sor")).unwrap(), InputFormat::Trace);
        assert!(matches!(
            InputFormat::from_path(Path::new("F01.docx")),
            Err(FibraError::UnsupportedInput(_))
        ));
        assert!(InputFormat::from_path(Path::new("F01")).is_err());
    }

    #[test]
    fn test_ragged_table_rejected() {
        let t = Table::new(vec![row(&["Evento", "Dist"]), row(&["1", "0,5", "extra"])]);
        assert_eq!(
            t.check_shape(),
            Err(TableDefect::Ragged {
                row: 1,
                cells: 3,
                header_cells: 2
            })
        );
    }

    #[test]
    fn test_short_rows_accepted() {
        let t = Table::new(vec![row(&["Evento", "Dist", "Perda"]), row(&["1", "0,5"])]);
        assert!(t.check_shape().is_ok());
        assert_eq!(Table::new(vec![row(&["Evento"])]).check_shape(), Err(TableDefect::TooShort));
    }

    #[test]
    fn test_grid_splits_tables_on_blank_rows() {
        let page = PageContent::from_grid(
            1,
            vec![
                row(&["Fim da fibra", "12,3"]),
                row(&["", ""]),
                row(&["Evento", "Dist", ""]),
                row(&["1", "0,5"]),
            ],
        );
        assert_eq!(page.tables.len(), 2);
        assert_eq!(page.tables[1].rows[0], row(&["Evento", "Dist"]));
        assert_eq!(page.lines[0], "Fim da fibra  12,3");
        assert_eq!(page.lines[1], "");
    }
}
