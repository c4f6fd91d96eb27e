use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parsing::normalize::{normalize_header, parse_number};

/// A numeric cell from an event table.
///
/// Cells that do not contain a number are kept verbatim so that partial rows
/// can still be inspected by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    Value(Decimal),
    Raw(String),
}

impl Reading {
    /// Coerce a cell. Blank cells yield `None`.
    pub fn from_cell(cell: &str) -> Option<Reading> {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match parse_number(trimmed) {
            Some(v) => Reading::Value(v),
            None => Reading::Raw(trimmed.to_string()),
        })
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Raw(_) => None,
        }
    }
}

impl From<Decimal> for Reading {
    fn from(v: Decimal) -> Self {
        Reading::Value(v)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{v}"),
            Reading::Raw(s) => write!(f, "{s}"),
        }
    }
}

/// One row of a fiber event table, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub label: Option<String>,
    pub position_km: Option<Reading>,
    pub loss_db: Option<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflectance_db: Option<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative_loss_db: Option<Reading>,
}

impl EventRecord {
    /// An event is critical when its local loss is strictly above `threshold_db`.
    pub fn is_critical(&self, threshold_db: Decimal) -> bool {
        self.loss_db
            .as_ref()
            .and_then(Reading::value)
            .is_some_and(|loss| loss > threshold_db)
    }
}

/// Scalar quantities the locator looks for in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Tested distance, i.e. where the trace ends.
    FiberEnd,
    /// End-to-end attenuation.
    TotalLoss,
    /// Nominal span length printed on the report.
    SpanLength,
}

impl FieldKind {
    pub const ALL: [FieldKind; 3] = [FieldKind::FiberEnd, FieldKind::TotalLoss, FieldKind::SpanLength];

    /// Label phrases, already in `normalize_header` form.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            FieldKind::FiberEnd => &["fim da fibra", "fim de fibra", "end of fiber", "fiber end"],
            FieldKind::TotalLoss => &["perda total", "total loss", "link loss"],
            FieldKind::SpanLength => &[
                "comprimento do trecho",
                "comprimento do troco",
                "expected span length",
                "span length",
            ],
        }
    }

    /// True when the (raw) text mentions one of this field's labels.
    pub fn matches(self, text: &str) -> bool {
        let normalized = normalize_header(text);
        self.labels().iter().any(|label| normalized.contains(label))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::FiberEnd => write!(f, "fiber end (km)"),
            FieldKind::TotalLoss => write!(f, "total loss (dB)"),
            FieldKind::SpanLength => write!(f, "span length (km)"),
        }
    }
}

/// How a field value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    TableColumn,
    SameLine,
    NextLine,
    NeighborCell,
    NumericSweep,
    DecodedTrace,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::TableColumn => "table column",
            StrategyKind::SameLine => "same line",
            StrategyKind::NextLine => "next line",
            StrategyKind::NeighborCell => "neighbor cell",
            StrategyKind::NumericSweep => "numeric sweep",
            StrategyKind::DecodedTrace => "decoded trace",
        };
        f.write_str(name)
    }
}

/// Where in the document a value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub page_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_index: Option<usize>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub kind: FieldKind,
    pub value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<StrategyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

impl FieldRecord {
    pub fn absent(kind: FieldKind) -> Self {
        FieldRecord {
            kind,
            value: None,
            source: None,
            evidence: None,
        }
    }

    pub fn found(kind: FieldKind, value: Decimal, source: StrategyKind, evidence: Option<Evidence>) -> Self {
        FieldRecord {
            kind,
            value: Some(value),
            source: Some(source),
            evidence,
        }
    }
}

/// The scalar fields of one document after a locator pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedFields {
    pub fiber_end: FieldRecord,
    pub total_loss: FieldRecord,
    pub span_length: FieldRecord,
}

impl LocatedFields {
    pub fn empty() -> Self {
        LocatedFields {
            fiber_end: FieldRecord::absent(FieldKind::FiberEnd),
            total_loss: FieldRecord::absent(FieldKind::TotalLoss),
            span_length: FieldRecord::absent(FieldKind::SpanLength),
        }
    }

    pub fn get(&self, kind: FieldKind) -> &FieldRecord {
        match kind {
            FieldKind::FiberEnd => &self.fiber_end,
            FieldKind::TotalLoss => &self.total_loss,
            FieldKind::SpanLength => &self.span_length,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldRecord> {
        [&self.fiber_end, &self.total_loss, &self.span_length].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(loss: &str) -> EventRecord {
        EventRecord {
            loss_db: Reading::from_cell(loss),
            ..Default::default()
        }
    }

    #[test]
    fn reading_keeps_unparseable_text() {
        assert_eq!(Reading::from_cell("0,35 dB"), Some(Reading::Value(dec!(0.35))));
        assert_eq!(Reading::from_cell("  --  "), Some(Reading::Raw("--".into())));
        assert_eq!(Reading::from_cell("   "), None);
    }

    #[test]
    fn exactly_one_critical_event() {
        let events = [event("0.1"), event("0.3"), event("0.2")];
        let critical: Vec<_> = events.iter().filter(|e| e.is_critical(dec!(0.2))).collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].loss_db, Some(Reading::Value(dec!(0.3))));
    }

    #[test]
    fn raw_loss_is_never_critical() {
        assert!(!event("n/a").is_critical(dec!(0.2)));
        assert!(!EventRecord::default().is_critical(dec!(0.2)));
    }

    #[test]
    fn field_labels_ignore_case_and_accents() {
        assert!(FieldKind::FiberEnd.matches("FIM DA FIBRA (km)"));
        assert!(FieldKind::SpanLength.matches("Comprimento do Troço"));
        assert!(FieldKind::TotalLoss.matches("Total Loss:"));
        assert!(!FieldKind::TotalLoss.matches("Perda (dB)"));
    }
}
