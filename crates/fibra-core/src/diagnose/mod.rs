pub mod compare;
pub mod engine;
pub mod outcome;

use rust_decimal::Decimal;

use crate::model::FieldKind;
use crate::parsing::ParsedDocument;
use crate::profile::schema::DiagnosisProfile;
use outcome::{DiagnosisResult, FiberStatus};

/// Caller-supplied parameters for one diagnosis.
#[derive(Debug, Clone, Default)]
pub struct DiagnosisRequest {
    pub fiber_id: String,
    pub period: Option<String>,
    /// Nominal span length. Falls back to a span length printed in the
    /// document.
    pub expected_length_km: Option<Decimal>,
    pub wavelength_nm: Option<u32>,
    /// Takes precedence over the wavelength budget.
    pub max_loss_override_db: Option<Decimal>,
}

/// Fold a parsed document into a diagnosis.
pub fn diagnose(
    parsed: &ParsedDocument,
    request: &DiagnosisRequest,
    profile: &DiagnosisProfile,
    source_format: &str,
) -> DiagnosisResult {
    let mut warnings: Vec<String> = parsed
        .warnings
        .iter()
        .map(|w| match w.page_number {
            Some(page) => format!("page {page}: {}", w.reason),
            None => w.reason.clone(),
        })
        .collect();

    let measured_length_km = parsed.fields.get(FieldKind::FiberEnd).value;
    let total_loss_db = parsed.fields.get(FieldKind::TotalLoss).value;
    let expected_length_km = request
        .expected_length_km
        .or(parsed.fields.get(FieldKind::SpanLength).value);

    let max_allowed_loss_db = match (request.max_loss_override_db, expected_length_km) {
        (Some(max), _) => Some(max),
        (None, Some(expected)) => match request.wavelength_nm {
            Some(nm) => {
                let max = engine::max_allowed_loss(expected, nm);
                if max.is_none() {
                    warnings.push(format!(
                        "no loss budget for {nm} nm; only the length is checked"
                    ));
                }
                max
            }
            None => None,
        },
        (None, None) => None,
    };

    let critical_events = parsed
        .events
        .iter()
        .filter(|e| e.is_critical(profile.critical_event_loss_db))
        .count();

    let (status, reason) = match expected_length_km {
        Some(expected) => {
            let verdict = engine::evaluate(
                expected,
                max_allowed_loss_db,
                measured_length_km,
                total_loss_db,
                profile.break_tolerance,
            );
            (verdict.status, verdict.reason)
        }
        None => {
            warnings.push("expected span length not given and not found in document".into());
            (
                FiberStatus::InsufficientData,
                "expected span length unknown".to_string(),
            )
        }
    };

    tracing::debug!(
        fiber = %request.fiber_id,
        status = ?status,
        critical_events,
        "diagnosis complete"
    );

    DiagnosisResult {
        fiber_id: request.fiber_id.clone(),
        period: request.period.clone(),
        source_format: source_format.to_string(),
        expected_length_km,
        measured_length_km,
        wavelength_nm: request.wavelength_nm,
        max_allowed_loss_db,
        total_loss_db,
        fields: parsed.fields.clone(),
        events: parsed.events.clone(),
        critical_events,
        status,
        reason,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventRecord, FieldRecord, LocatedFields, Reading, StrategyKind};
    use rust_decimal_macros::dec;

    fn parsed(length: Option<Decimal>, loss: Option<Decimal>, losses: &[Decimal]) -> ParsedDocument {
        let field = |kind, v: Option<Decimal>| match v {
            Some(v) => FieldRecord::found(kind, v, StrategyKind::TableColumn, None),
            None => FieldRecord::absent(kind),
        };
        ParsedDocument {
            page_count: 1,
            fields: LocatedFields {
                fiber_end: field(FieldKind::FiberEnd, length),
                total_loss: field(FieldKind::TotalLoss, loss),
                span_length: FieldRecord::absent(FieldKind::SpanLength),
            },
            events: losses
                .iter()
                .map(|l| EventRecord {
                    loss_db: Some(Reading::Value(*l)),
                    ..Default::default()
                })
                .collect(),
            warnings: vec![],
        }
    }

    fn request(expected: Decimal, nm: u32) -> DiagnosisRequest {
        DiagnosisRequest {
            fiber_id: "F1".into(),
            expected_length_km: Some(expected),
            wavelength_nm: Some(nm),
            ..Default::default()
        }
    }

    #[test]
    fn test_budget_from_wavelength() {
        let doc = parsed(Some(dec!(20.1)), Some(dec!(5.0)), &[]);
        let result = diagnose(&doc, &request(dec!(20), 1550), &DiagnosisProfile::default(), "pdf");
        assert_eq!(result.max_allowed_loss_db, Some(dec!(4.4)));
        assert_eq!(result.status, FiberStatus::Attenuated);

        let result = diagnose(&doc, &request(dec!(20), 1310), &DiagnosisProfile::default(), "pdf");
        assert_eq!(result.status, FiberStatus::Ok);
    }

    #[test]
    fn test_override_wins() {
        let doc = parsed(Some(dec!(20)), Some(dec!(5.0)), &[]);
        let req = DiagnosisRequest {
            max_loss_override_db: Some(dec!(6)),
            ..request(dec!(20), 1550)
        };
        let result = diagnose(&doc, &req, &DiagnosisProfile::default(), "pdf");
        assert_eq!(result.max_allowed_loss_db, Some(dec!(6)));
        assert_eq!(result.status, FiberStatus::Ok);
    }

    #[test]
    fn test_unknown_wavelength_checks_length_only() {
        let doc = parsed(Some(dec!(20)), Some(dec!(50)), &[]);
        let result = diagnose(&doc, &request(dec!(20), 1625), &DiagnosisProfile::default(), "pdf");
        assert_eq!(result.max_allowed_loss_db, None);
        assert_eq!(result.status, FiberStatus::Ok);
        assert!(result.warnings.iter().any(|w| w.contains("1625 nm")));
    }

    #[test]
    fn test_critical_events_counted() {
        let doc = parsed(Some(dec!(10)), None, &[dec!(0.1), dec!(0.3), dec!(0.2)]);
        let result = diagnose(&doc, &request(dec!(10), 1550), &DiagnosisProfile::default(), "pdf");
        assert_eq!(result.critical_events, 1);
        assert_eq!(result.event_count(), 3);
    }

    #[test]
    fn test_expected_length_from_document() {
        let mut doc = parsed(Some(dec!(8)), None, &[]);
        doc.fields.span_length =
            FieldRecord::found(FieldKind::SpanLength, dec!(10), StrategyKind::SameLine, None);
        let req = DiagnosisRequest {
            fiber_id: "F1".into(),
            ..Default::default()
        };
        let result = diagnose(&doc, &req, &DiagnosisProfile::default(), "pdf");
        assert_eq!(result.expected_length_km, Some(dec!(10)));
        assert_eq!(result.status, FiberStatus::Broken);
    }

    #[test]
    fn test_no_expected_length_is_insufficient() {
        let doc = parsed(Some(dec!(8)), None, &[]);
        let req = DiagnosisRequest {
            fiber_id: "F1".into(),
            wavelength_nm: Some(1550),
            ..Default::default()
        };
        let result = diagnose(&doc, &req, &DiagnosisProfile::default(), "pdf");
        assert_eq!(result.status, FiberStatus::InsufficientData);
        assert_eq!(result.max_allowed_loss_db, None);
    }

    #[test]
    fn test_tolerance_from_profile() {
        let doc = parsed(Some(dec!(9.2)), None, &[]);
        let profile = DiagnosisProfile {
            break_tolerance: dec!(0.1),
            ..Default::default()
        };
        let result = diagnose(&doc, &request(dec!(10), 1550), &profile, "pdf");
        assert_eq!(result.status, FiberStatus::Ok);
        let result = diagnose(&doc, &request(dec!(10), 1550), &DiagnosisProfile::default(), "pdf");
        assert_eq!(result.status, FiberStatus::Broken);
    }
}
