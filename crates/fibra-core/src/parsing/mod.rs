pub mod columns;
pub mod events;
pub mod lookup;
pub mod normalize;
pub mod strategy;
pub mod values;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::extraction::trace::TraceSummary;
use crate::extraction::PageContent;
use crate::model::{EventRecord, FieldKind, FieldRecord, LocatedFields, Reading, StrategyKind};
use crate::profile::schema::DiagnosisProfile;
use events::extract_events;
use strategy::{
    AggregationPolicy, FieldStrategy, NeighborCellStrategy, NextLineStrategy,
    NumericSweepStrategy, SameLineStrategy, TableColumnStrategy,
};
use values::{f64_to_decimal, metres_to_km};

/// A note about something the parser could not use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
    pub reason: String,
}

/// Everything one parse pass produced for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub page_count: usize,
    pub fields: LocatedFields,
    pub events: Vec<EventRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

impl ParsedDocument {
    /// A document nothing could be read from.
    pub fn unreadable(reason: impl Into<String>) -> Self {
        ParsedDocument {
            page_count: 0,
            fields: LocatedFields::empty(),
            events: Vec::new(),
            warnings: vec![ParseWarning {
                page_number: None,
                reason: reason.into(),
            }],
        }
    }
}

/// Runs the field strategies in priority order.
pub struct FieldLocator {
    strategies: Vec<Box<dyn FieldStrategy>>,
    distance_policy: AggregationPolicy,
    loss_policy: AggregationPolicy,
}

impl FieldLocator {
    /// The standard chain: table column, same line, next line, neighbor cell,
    /// numeric sweep.
    pub fn new(profile: &DiagnosisProfile) -> Self {
        Self::with_strategies(
            vec![
                Box::new(TableColumnStrategy),
                Box::new(SameLineStrategy),
                Box::new(NextLineStrategy),
                Box::new(NeighborCellStrategy),
                Box::new(NumericSweepStrategy::new(profile.sweep_min_km, profile.sweep_max_km)),
            ],
            profile.distance_policy,
            profile.loss_policy,
        )
    }

    pub fn with_strategies(
        strategies: Vec<Box<dyn FieldStrategy>>,
        distance_policy: AggregationPolicy,
        loss_policy: AggregationPolicy,
    ) -> Self {
        FieldLocator {
            strategies,
            distance_policy,
            loss_policy,
        }
    }

    pub fn policy_for(&self, field: FieldKind) -> AggregationPolicy {
        match field {
            FieldKind::FiberEnd => self.distance_policy,
            FieldKind::TotalLoss => self.loss_policy,
            // The nominal length is printed once; later mentions are usually
            // something else.
            FieldKind::SpanLength => AggregationPolicy::First,
        }
    }

    /// The first strategy that yields a number decides the field.
    pub fn locate(&self, pages: &[PageContent], field: FieldKind) -> FieldRecord {
        let policy = self.policy_for(field);
        for strategy in &self.strategies {
            if let Some(candidate) = strategy.attempt(pages, field, policy) {
                tracing::debug!(
                    field = ?field,
                    strategy = %strategy.kind(),
                    value = %candidate.value,
                    page = candidate.evidence.page_number,
                    "field located"
                );
                return FieldRecord::found(
                    field,
                    candidate.value,
                    strategy.kind(),
                    Some(candidate.evidence),
                );
            }
        }
        tracing::debug!(field = ?field, "field not found");
        FieldRecord::absent(field)
    }

    pub fn locate_all(&self, pages: &[PageContent]) -> LocatedFields {
        LocatedFields {
            fiber_end: self.locate(pages, FieldKind::FiberEnd),
            total_loss: self.locate(pages, FieldKind::TotalLoss),
            span_length: self.locate(pages, FieldKind::SpanLength),
        }
    }
}

impl Default for FieldLocator {
    fn default() -> Self {
        Self::new(&DiagnosisProfile::default())
    }
}

/// Parse extracted page content into fields and events.
///
/// Never fails: malformed tables are skipped with a warning and missing
/// fields stay absent.
pub fn parse_document(pages: &[PageContent], locator: &FieldLocator) -> ParsedDocument {
    let mut warnings = Vec::new();

    for page in pages {
        for (idx, table) in page.tables.iter().enumerate() {
            if let Err(defect) = table.check_shape() {
                tracing::warn!(page = page.page_number, table = idx + 1, "skipping table: {defect}");
                warnings.push(ParseWarning {
                    page_number: Some(page.page_number),
                    reason: format!("table {} skipped: {}", idx + 1, defect),
                });
            }
        }
    }

    let fields = locator.locate_all(pages);
    for kind in [FieldKind::FiberEnd, FieldKind::TotalLoss] {
        if fields.get(kind).value.is_none() {
            warnings.push(ParseWarning {
                page_number: None,
                reason: format!("{kind} not found in document"),
            });
        }
    }

    ParsedDocument {
        page_count: pages.len(),
        fields,
        events: extract_events(pages),
        warnings,
    }
}

/// Fold a decoded trace into the same shape as a parsed document.
pub fn parse_trace(summary: &TraceSummary) -> ParsedDocument {
    let decoded = |kind: FieldKind, value: Option<Decimal>| match value {
        Some(v) => FieldRecord::found(kind, v, StrategyKind::DecodedTrace, None),
        None => FieldRecord::absent(kind),
    };

    let fields = LocatedFields {
        fiber_end: decoded(
            FieldKind::FiberEnd,
            summary.fiber_length_m.and_then(metres_to_km),
        ),
        total_loss: decoded(
            FieldKind::TotalLoss,
            summary.end_to_end_loss_db.and_then(f64_to_decimal),
        ),
        span_length: FieldRecord::absent(FieldKind::SpanLength),
    };

    let reading = |v: Option<f64>| v.and_then(f64_to_decimal).map(Reading::Value);
    let events = summary
        .events
        .iter()
        .map(|ev| EventRecord {
            label: ev.event_type.clone(),
            position_km: ev.position_m.and_then(metres_to_km).map(Reading::Value),
            loss_db: reading(ev.loss_db),
            reflectance_db: reading(ev.reflectance_db),
            cumulative_loss_db: reading(ev.cumulative_loss_db),
        })
        .collect();

    let mut warnings = Vec::new();
    if fields.fiber_end.value.is_none() {
        warnings.push(ParseWarning {
            page_number: None,
            reason: "trace has no fiber length".into(),
        });
    }

    ParsedDocument {
        page_count: 1,
        fields,
        events,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::trace::TraceEvent;
    use crate::extraction::Table;
    use rust_decimal_macros::dec;

    fn page(number: usize, lines: &[&str], tables: Vec<Table>) -> PageContent {
        PageContent {
            page_number: number,
            lines: lines.iter().map(|s| s.to_string()).collect(),
            tables,
        }
    }

    fn table(rows: &[&[&str]]) -> Table {
        Table::new(
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_distance_is_maximum_across_pages() {
        let pages = vec![
            page(1, &[], vec![table(&[&["Evento", "Dist"], &["1", "5,0"]])]),
            page(2, &[], vec![table(&[&["Evento", "Dist"], &["2", "12,3"]])]),
            page(3, &[], vec![table(&[&["Evento", "Dist"], &["3", "8,0"]])]),
        ];
        let parsed = parse_document(&pages, &FieldLocator::default());
        assert_eq!(parsed.fields.fiber_end.value, Some(dec!(12.3)));
        assert_eq!(parsed.fields.fiber_end.source, Some(StrategyKind::TableColumn));
        assert_eq!(parsed.events.len(), 3);
    }

    #[test]
    fn test_table_beats_free_text() {
        let pages = vec![page(
            1,
            &["Fim da fibra: 99,9 km"],
            vec![table(&[&["Evento", "Dist"], &["1", "12,3"]])],
        )];
        let parsed = parse_document(&pages, &FieldLocator::default());
        assert_eq!(parsed.fields.fiber_end.value, Some(dec!(12.3)));
    }

    #[test]
    fn test_free_text_fallbacks() {
        let pages = vec![page(
            1,
            &["Fim da Fibra Km", "102,027", "Perda total: 21,4 dB", "Comprimento do trecho 100 km"],
            vec![],
        )];
        let parsed = parse_document(&pages, &FieldLocator::default());
        assert_eq!(parsed.fields.fiber_end.value, Some(dec!(102.027)));
        assert_eq!(parsed.fields.fiber_end.source, Some(StrategyKind::NextLine));
        assert_eq!(parsed.fields.total_loss.value, Some(dec!(21.4)));
        assert_eq!(parsed.fields.total_loss.source, Some(StrategyKind::SameLine));
        assert_eq!(parsed.fields.span_length.value, Some(dec!(100)));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_side_by_side_summary() {
        let pages = vec![page(
            1,
            &["Fim da fibra (km)    Perda total (dB)", "20,150               3,80"],
            vec![],
        )];
        let parsed = parse_document(&pages, &FieldLocator::default());
        assert_eq!(parsed.fields.fiber_end.value, Some(dec!(20.150)));
        assert_eq!(parsed.fields.total_loss.value, Some(dec!(3.80)));
        assert_eq!(parsed.fields.total_loss.source, Some(StrategyKind::NextLine));
    }

    #[test]
    fn test_numeric_sweep_is_last_resort() {
        let pages = vec![page(1, &["Trecho Lisboa-Porto", "Marcador 12,5", "Marcador 31,0"], vec![])];
        let parsed = parse_document(&pages, &FieldLocator::default());
        assert_eq!(parsed.fields.fiber_end.value, Some(dec!(31.0)));
        assert_eq!(parsed.fields.fiber_end.source, Some(StrategyKind::NumericSweep));
        assert_eq!(parsed.fields.total_loss.value, None);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_malformed_table_warns_and_continues() {
        let pages = vec![page(
            1,
            &["Perda total 3,0"],
            vec![
                table(&[&["Dist"], &["5,0", "x"]]),
                table(&[&["Evento", "Dist"], &["1", "7,5"]]),
            ],
        )];
        let parsed = parse_document(&pages, &FieldLocator::default());
        assert_eq!(parsed.fields.fiber_end.value, Some(dec!(7.5)));
        assert_eq!(parsed.fields.total_loss.value, Some(dec!(3.0)));
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].page_number, Some(1));
    }

    #[test]
    fn test_last_policy() {
        let profile = DiagnosisProfile {
            distance_policy: AggregationPolicy::Last,
            ..Default::default()
        };
        let pages = vec![page(
            1,
            &[],
            vec![table(&[&["Evento", "Dist"], &["1", "5,0"], &["2", "12,3"], &["3", "8,0"]])],
        )];
        let parsed = parse_document(&pages, &FieldLocator::new(&profile));
        assert_eq!(parsed.fields.fiber_end.value, Some(dec!(8.0)));
    }

    #[test]
    fn test_parse_trace_converts_metres() {
        let summary = TraceSummary {
            fiber_length_m: Some(12300.0),
            end_to_end_loss_db: Some(3.05),
            events: vec![TraceEvent {
                event_type: Some("splice".into()),
                position_m: Some(5120.0),
                loss_db: Some(0.31),
                ..Default::default()
            }],
        };
        let parsed = parse_trace(&summary);
        assert_eq!(parsed.fields.fiber_end.value, Some(dec!(12.3)));
        assert_eq!(parsed.fields.total_loss.value, Some(dec!(3.05)));
        assert_eq!(parsed.events[0].position_km, Some(Reading::Value(dec!(5.12))));
        assert!(parsed.events[0].is_critical(dec!(0.2)));
    }
}
