use std::io::Cursor;

use calamine::{Data, Reader};

use crate::error::FibraError;
use crate::extraction::{DocumentExtractor, PageContent};

/// Spreadsheet backend (xlsx, xls, ods). Each worksheet becomes one page.
pub struct SpreadsheetExtractor;

impl DocumentExtractor for SpreadsheetExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageContent>, FibraError> {
        let cursor = Cursor::new(bytes);
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| FibraError::Extraction(format!("failed to open spreadsheet: {e}")))?;

        let mut pages = Vec::new();
        for (idx, name) in workbook.sheet_names().into_iter().enumerate() {
            let range = match workbook.worksheet_range(&name) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(sheet = %name, "skipping unreadable sheet: {e}");
                    continue;
                }
            };

            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_as_string).collect())
                .collect();
            pages.push(PageContent::from_grid(idx + 1, rows));
        }

        if pages.is_empty() {
            return Err(FibraError::Extraction(
                "spreadsheet has no readable sheets".into(),
            ));
        }

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "calamine"
    }
}

fn cell_as_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Empty => String::new(),
        _ => format!("{cell}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_cells_keep_plain_notation() {
        assert_eq!(cell_as_string(&Data::Float(12.345)), "12.345");
        assert_eq!(cell_as_string(&Data::Int(3)), "3");
        assert_eq!(cell_as_string(&Data::String("  Evento ".into())), "Evento");
        assert_eq!(cell_as_string(&Data::Empty), "");
    }

    #[test]
    fn garbage_bytes_are_an_extraction_error() {
        let err = SpreadsheetExtractor.extract_pages(b"not a workbook").unwrap_err();
        assert!(matches!(err, FibraError::Extraction(_)));
    }
}
