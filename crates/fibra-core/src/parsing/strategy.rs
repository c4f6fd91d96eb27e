use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::extraction::table::split_by_whitespace_gaps;
use crate::extraction::PageContent;
use crate::model::{Evidence, FieldKind, StrategyKind};
use crate::parsing::columns::{column_map, ColumnRole};
use crate::parsing::normalize::{find_numbers, normalize_header, parse_number};

/// A value a strategy found, with where it found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub value: Decimal,
    pub evidence: Evidence,
}

/// Which candidate wins when a strategy finds several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    #[default]
    Maximum,
    Last,
    First,
}

impl AggregationPolicy {
    pub fn pick(self, candidates: Vec<Candidate>) -> Option<Candidate> {
        match self {
            AggregationPolicy::Maximum => candidates.into_iter().max_by(|a, b| a.value.cmp(&b.value)),
            AggregationPolicy::Last => candidates.into_iter().last(),
            AggregationPolicy::First => candidates.into_iter().next(),
        }
    }
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationPolicy::Maximum => write!(f, "maximum"),
            AggregationPolicy::Last => write!(f, "last"),
            AggregationPolicy::First => write!(f, "first"),
        }
    }
}

/// One way of finding a field in a document.
pub trait FieldStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Every value this strategy can read for `field`, in document order.
    fn candidates(&self, pages: &[PageContent], field: FieldKind) -> Vec<Candidate>;

    fn attempt(
        &self,
        pages: &[PageContent],
        field: FieldKind,
        policy: AggregationPolicy,
    ) -> Option<Candidate> {
        policy.pick(self.candidates(pages, field))
    }
}

/// Reads the distance / cumulative-loss column of event tables.
pub struct TableColumnStrategy;

impl TableColumnStrategy {
    fn column_for(field: FieldKind) -> Option<ColumnRole> {
        match field {
            FieldKind::FiberEnd => Some(ColumnRole::Distance),
            FieldKind::TotalLoss => Some(ColumnRole::CumulativeLoss),
            FieldKind::SpanLength => None,
        }
    }
}

impl FieldStrategy for TableColumnStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TableColumn
    }

    fn candidates(&self, pages: &[PageContent], field: FieldKind) -> Vec<Candidate> {
        let Some(role) = Self::column_for(field) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for page in pages {
            for table in &page.tables {
                let Some(idx) = column_map(table).and_then(|m| m.index_of(role)) else {
                    continue;
                };
                for row in table.body() {
                    let Some(cell) = row.get(idx) else { continue };
                    if let Some(value) = parse_number(cell) {
                        out.push(Candidate {
                            value,
                            evidence: Evidence {
                                page_number: page.page_number,
                                line_index: None,
                                text: cell.trim().to_string(),
                            },
                        });
                    }
                }
            }
        }
        out
    }
}

static LABEL_PATTERNS: LazyLock<Vec<(FieldKind, Regex)>> = LazyLock::new(|| {
    FieldKind::ALL
        .iter()
        .flat_map(|kind| {
            kind.labels()
                .iter()
                .map(move |label| (*kind, Regex::new(&regex::escape(label)).unwrap()))
        })
        .collect()
});

/// A number with its optional unit; wavelengths ("1550 nm") are not values.
static VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?[0-9]+(?:[.,][0-9]+)?)\s*(nm\b)?").unwrap());

fn first_value_after(rest: &str) -> Option<Decimal> {
    VALUE_RE
        .captures_iter(rest)
        .find(|caps| caps.get(2).is_none())
        .and_then(|caps| parse_number(caps.get(1)?.as_str()))
}

/// Label and value on the same line: "Fim da fibra (km): 12,345".
pub struct SameLineStrategy;

impl FieldStrategy for SameLineStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SameLine
    }

    fn candidates(&self, pages: &[PageContent], field: FieldKind) -> Vec<Candidate> {
        let patterns: Vec<&Regex> = LABEL_PATTERNS
            .iter()
            .filter(|(kind, _)| *kind == field)
            .map(|(_, re)| re)
            .collect();

        let mut out = Vec::new();
        for page in pages {
            for (i, line) in page.lines.iter().enumerate() {
                let normalized = normalize_header(line);
                let value = patterns
                    .iter()
                    .find_map(|re| re.find(&normalized))
                    .and_then(|m| first_value_after(&normalized[m.end()..]));
                if let Some(value) = value {
                    out.push(Candidate {
                        value,
                        evidence: Evidence {
                            page_number: page.page_number,
                            line_index: Some(i),
                            text: line.trim().to_string(),
                        },
                    });
                }
            }
        }
        out
    }
}

/// Label on one line, value on the line right after it.
///
/// Summaries often put several labels side by side with their values aligned
/// below, so the value is read from the column under the label.
pub struct NextLineStrategy;

/// The number in `next` that sits under the `field` label of `line`.
fn value_below(line: &str, next: &str, field: FieldKind) -> Option<(Decimal, String)> {
    let below = split_by_whitespace_gaps(next);
    if below.len() <= 1 {
        return parse_number(next).map(|v| (v, next.trim().to_string()));
    }

    let label = split_by_whitespace_gaps(line)
        .into_iter()
        .find(|seg| field.matches(&seg.text))?;
    let nearest = below
        .into_iter()
        .min_by_key(|seg| seg.center2().abs_diff(label.center2()))?;
    parse_number(&nearest.text).map(|v| (v, nearest.text))
}

impl FieldStrategy for NextLineStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NextLine
    }

    fn candidates(&self, pages: &[PageContent], field: FieldKind) -> Vec<Candidate> {
        let mut out = Vec::new();
        for page in pages {
            for (i, line) in page.lines.iter().enumerate() {
                if !field.matches(line) {
                    continue;
                }
                let Some(next) = page.lines.get(i + 1) else { continue };
                if let Some((value, text)) = value_below(line, next, field) {
                    out.push(Candidate {
                        value,
                        evidence: Evidence {
                            page_number: page.page_number,
                            line_index: Some(i + 1),
                            text,
                        },
                    });
                }
            }
        }
        out
    }
}

/// Search order around a label cell: right, below, then the rest of the
/// 3x3 window.
const NEIGHBORS: [(isize, isize); 8] = [
    (0, 1),
    (1, 0),
    (1, 1),
    (0, -1),
    (-1, 0),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Label in a table cell, value in an adjacent cell.
pub struct NeighborCellStrategy;

impl FieldStrategy for NeighborCellStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NeighborCell
    }

    fn candidates(&self, pages: &[PageContent], field: FieldKind) -> Vec<Candidate> {
        let mut out = Vec::new();
        for page in pages {
            for table in &page.tables {
                for (r, row) in table.rows.iter().enumerate() {
                    for (c, cell) in row.iter().enumerate() {
                        if !field.matches(cell) {
                            continue;
                        }
                        let found = NEIGHBORS.iter().find_map(|(dr, dc)| {
                            let nr = r.checked_add_signed(*dr)?;
                            let nc = c.checked_add_signed(*dc)?;
                            let text = table.cell(nr, nc)?;
                            parse_number(text).map(|v| (v, text))
                        });
                        if let Some((value, text)) = found {
                            out.push(Candidate {
                                value,
                                evidence: Evidence {
                                    page_number: page.page_number,
                                    line_index: None,
                                    text: text.trim().to_string(),
                                },
                            });
                        }
                    }
                }
            }
        }
        out
    }
}

/// Last resort for the tested distance: the largest plausible kilometre
/// figure anywhere in the text.
pub struct NumericSweepStrategy {
    min_km: Decimal,
    max_km: Decimal,
}

impl NumericSweepStrategy {
    pub fn new(min_km: Decimal, max_km: Decimal) -> Self {
        NumericSweepStrategy { min_km, max_km }
    }
}

impl Default for NumericSweepStrategy {
    fn default() -> Self {
        // 0.1 km .. 200 km
        Self::new(Decimal::new(1, 1), Decimal::from(200))
    }
}

impl FieldStrategy for NumericSweepStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NumericSweep
    }

    fn candidates(&self, pages: &[PageContent], field: FieldKind) -> Vec<Candidate> {
        if field != FieldKind::FiberEnd {
            return Vec::new();
        }

        let mut out = Vec::new();
        for page in pages {
            for (i, line) in page.lines.iter().enumerate() {
                for value in find_numbers(line) {
                    if value >= self.min_km && value <= self.max_km {
                        out.push(Candidate {
                            value,
                            evidence: Evidence {
                                page_number: page.page_number,
                                line_index: Some(i),
                                text: line.trim().to_string(),
                            },
                        });
                    }
                }
            }
        }
        out
    }

    /// Always the maximum, whatever the configured policy.
    fn attempt(
        &self,
        pages: &[PageContent],
        field: FieldKind,
        _policy: AggregationPolicy,
    ) -> Option<Candidate> {
        AggregationPolicy::Maximum.pick(self.candidates(pages, field))
    }
}
