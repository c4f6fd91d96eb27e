use crate::error::FibraError;
use crate::extraction::{DocumentExtractor, PageContent};

/// CSV backend. The whole file becomes a single page.
///
/// Reports exported from Portuguese-locale tools use `;` as the separator
/// (the comma is the decimal mark), so the delimiter is sniffed from the
/// first non-empty lines.
pub struct CsvExtractor;

impl DocumentExtractor for CsvExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageContent>, FibraError> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim_start_matches('\u{feff}');
        let delimiter = sniff_delimiter(text);

        // The csv reader skips empty lines, but they separate tables here.
        let blank = char::from(delimiter).to_string();
        let prepared = text
            .lines()
            .map(|l| if l.trim().is_empty() { blank.as_str() } else { l })
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(prepared.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.trim().to_string()).collect());
        }

        Ok(vec![PageContent::from_grid(1, rows)])
    }

    fn backend_name(&self) -> &str {
        "csv"
    }
}

fn sniff_delimiter(text: &str) -> u8 {
    let sample: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(5)
        .collect();
    let count = |c: char| sample.iter().map(|l| l.matches(c).count()).sum::<usize>();

    if count('\t') > 0 {
        b'\t'
    } else if count(';') > 0 {
        b';'
    } else {
        b','
    }
}
