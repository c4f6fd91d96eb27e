use serde::{Deserialize, Serialize};

use crate::extraction::table::split_by_whitespace_gaps;
use crate::extraction::PageContent;
use crate::parsing::normalize::normalize_header;

/// Similarity a cell needs by default to count as a match (0-100).
pub const DEFAULT_THRESHOLD: u8 = 85;

/// Where a lookup match sits. Rows and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellLocation {
    pub page_number: usize,
    /// Index of the table on the page; absent for free-text lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<usize>,
    pub row: usize,
    pub column: usize,
}

/// Best cell for a free-text query and the value printed under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupHit {
    pub cell: String,
    pub location: CellLocation,
    /// Cell directly below the match; absent on the last row.
    pub value_below: Option<String>,
    /// Similarity to the query, 0-100.
    pub score: f64,
}

/// Find the cell most similar to `query` and return the value below it.
///
/// Table cells are searched first, then whitespace-separated segments of the
/// page text. Comparison is on normalized text (case and accents folded)
/// using normalized Levenshtein similarity. A cell needs a score of at least
/// `threshold`; on ties the first cell found wins.
pub fn fuzzy_lookup(pages: &[PageContent], query: &str, threshold: u8) -> Option<LookupHit> {
    let query = normalize_header(query);
    if query.is_empty() {
        return None;
    }
    let min_score = f64::from(threshold.min(100));
    let mut best: Option<LookupHit> = None;

    let mut consider = |cell: &str, location: CellLocation, below: &dyn Fn() -> Option<String>| {
        let text = normalize_header(cell);
        if text.is_empty() {
            return;
        }
        let score = strsim::normalized_levenshtein(&text, &query) * 100.0;
        if score < min_score || best.as_ref().is_some_and(|b| score <= b.score) {
            return;
        }
        best = Some(LookupHit {
            cell: cell.trim().to_string(),
            location,
            value_below: below(),
            score,
        });
    };

    for page in pages {
        for (t, table) in page.tables.iter().enumerate() {
            for (r, row) in table.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let location = CellLocation {
                        page_number: page.page_number,
                        table: Some(t + 1),
                        row: r + 1,
                        column: c + 1,
                    };
                    consider(cell, location, &|| {
                        table
                            .cell(r + 1, c)
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                    });
                }
            }
        }

        for (i, line) in page.lines.iter().enumerate() {
            for (c, seg) in split_by_whitespace_gaps(line).iter().enumerate() {
                let location = CellLocation {
                    page_number: page.page_number,
                    table: None,
                    row: i + 1,
                    column: c + 1,
                };
                consider(&seg.text, location, &|| {
                    let next = page.lines.get(i + 1)?;
                    split_by_whitespace_gaps(next)
                        .into_iter()
                        .min_by_key(|below| below.center2().abs_diff(seg.center2()))
                        .map(|below| below.text)
                });
            }
        }
    }

    if let Some(ref hit) = best {
        tracing::debug!(cell = %hit.cell, score = hit.score, "lookup match");
    }
    best
}
