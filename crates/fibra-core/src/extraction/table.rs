use crate::extraction::Table;
use crate::parsing::normalize::normalize_header;

/// Reconstruct event tables from pdftotext -layout output.
///
/// pdftotext -layout preserves column alignment using spaces. A table starts
/// at a line that looks like an event-table header and runs until a blank
/// line or a page footer. Data cells are assigned to the header column whose
/// span is nearest, so every reconstructed row has the header's width.
pub fn reconstruct_tables(lines: &[String]) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !is_table_header(&lines[i]) {
            i += 1;
            continue;
        }

        let columns = split_by_whitespace_gaps(&lines[i]);
        let mut rows = vec![columns.iter().map(|s| s.text.clone()).collect::<Vec<_>>()];
        i += 1;

        while i < lines.len() && !is_table_end(&lines[i]) {
            if is_table_header(&lines[i]) {
                break;
            }
            rows.push(assign_to_columns(&lines[i], &columns));
            i += 1;
        }

        if rows.len() > 1 {
            tables.push(Table::new(rows));
        }
    }

    tables
}

/// Detect if a line looks like an event table header row.
///
/// Needs two column keywords, one of which names the event or its distance;
/// summary lines such as "Perda total   Atenuação" are not tables.
pub fn is_table_header(line: &str) -> bool {
    let lower = normalize_header(line);
    let anchor = ["event", "dist"];
    let measure = ["perda", "loss", "reflect", "p. total", "atenua"];

    let anchors = anchor.iter().filter(|kw| lower.contains(*kw)).count();
    let measures = measure.iter().filter(|kw| lower.contains(*kw)).count();
    anchors >= 1 && anchors + measures >= 2
}

fn is_table_end(line: &str) -> bool {
    let trimmed = normalize_header(line);
    trimmed.is_empty()
        || trimmed.starts_with("pagina")
        || trimmed.starts_with("page")
        || trimmed.starts_with("---")
}

/// A run of text between whitespace gaps, with character columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Segment {
    /// Twice the center column, to stay in integers.
    pub fn center2(&self) -> usize {
        self.start + self.end
    }
}

/// Split a line by gaps of 2+ whitespace characters.
///
/// Positions are counted in characters so accented headers line up with the
/// values below them.
pub fn split_by_whitespace_gaps(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut last_non_space = 0;
    let mut space_count = 0;

    for (col, c) in line.chars().enumerate() {
        if c.is_whitespace() {
            space_count += 1;
            if space_count == 2 && !current.is_empty() {
                segments.push(Segment {
                    start,
                    end: last_non_space + 1,
                    text: current.trim_end().to_string(),
                });
                current.clear();
            }
            if !current.is_empty() {
                current.push(c);
            }
        } else {
            if current.is_empty() {
                start = col;
            }
            current.push(c);
            last_non_space = col;
            space_count = 0;
        }
    }

    if !current.is_empty() {
        segments.push(Segment {
            start,
            end: last_non_space + 1,
            text: current.trim_end().to_string(),
        });
    }

    segments
}

fn assign_to_columns(line: &str, columns: &[Segment]) -> Vec<String> {
    let mut row = vec![String::new(); columns.len()];
    for seg in split_by_whitespace_gaps(line) {
        let nearest = columns
            .iter()
            .enumerate()
            .min_by_key(|(_, col)| col.center2().abs_diff(seg.center2()))
            .map(|(idx, _)| idx);
        if let Some(idx) = nearest {
            if row[idx].is_empty() {
                row[idx] = seg.text;
            } else {
                row[idx].push(' ');
                row[idx].push_str(&seg.text);
            }
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_table_header() {
        assert!(is_table_header("  Evento   Distância (km)   Perda (dB)   Reflect. (dB)"));
        assert!(is_table_header("Event   Distance   Loss"));
        assert!(!is_table_header("Evento"));
        assert!(!is_table_header("  1    0,512    0,12"));
    }

    #[test]
    fn test_summary_line_is_not_a_header() {
        assert!(!is_table_header("Perda total (dB)   Atenuação (dB/km)"));
        assert!(!is_table_header("Fim da fibra (km)    Perda total (dB)"));

        let page = lines(&[
            "Perda total (dB)   Atenuação (dB/km)",
            "3,80               0,19",
            "",
        ]);
        assert!(reconstruct_tables(&page).is_empty());
    }

    #[test]
    fn test_split_by_whitespace_gaps() {
        let segments = split_by_whitespace_gaps("Fim da fibra     12,345 km");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Fim da fibra");
        assert_eq!(segments[1].text, "12,345 km");
        assert_eq!(segments[1].start, 17);
    }

    #[test]
    fn test_reconstruct_event_table() {
        let page = lines(&[
            "Relatório OTDR",
            "",
            "  Evento   Distância (km)   Perda (dB)   P. Total (dB)",
            "    1          0,000           0,25          0,25",
            "    2          5,120                         1,40",
            "    3         12,300           0,31          2,95",
            "",
            "Página 1",
        ]);
        let tables = reconstruct_tables(&page);
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.rows.len(), 4);
        assert_eq!(t.rows[0][1], "Distância (km)");
        assert_eq!(t.rows[2], vec!["2", "5,120", "", "1,40"]);
        assert_eq!(t.rows[3][3], "2,95");
    }

    #[test]
    fn test_header_without_rows_is_dropped() {
        let page = lines(&["Evento   Distância   Perda", ""]);
        assert!(reconstruct_tables(&page).is_empty());
    }
}
