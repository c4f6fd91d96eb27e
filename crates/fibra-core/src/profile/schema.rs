use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::parsing::strategy::AggregationPolicy;

/// Tunable constants of the locator and the diagnosis rules.
///
/// Decimal fields are quoted strings in JSON ("0.05", not 0.05).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosisProfile {
    /// A fiber shorter than `expected * (1 - break_tolerance)` is broken.
    pub break_tolerance: Decimal,
    /// Events with a local loss above this are critical (dB).
    pub critical_event_loss_db: Decimal,
    /// How to pick the tested distance among several candidates.
    pub distance_policy: AggregationPolicy,
    /// How to pick the total loss among several candidates.
    pub loss_policy: AggregationPolicy,
    /// Plausible range for the numeric sweep fallback (km).
    pub sweep_min_km: Decimal,
    pub sweep_max_km: Decimal,
    /// External decoder for binary trace files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_decoder: Option<DecoderCommand>,
}

impl Default for DiagnosisProfile {
    fn default() -> Self {
        DiagnosisProfile {
            break_tolerance: Decimal::new(5, 2),
            critical_event_loss_db: Decimal::new(2, 1),
            distance_policy: AggregationPolicy::Maximum,
            loss_policy: AggregationPolicy::Maximum,
            sweep_min_km: Decimal::new(1, 1),
            sweep_max_km: Decimal::from(200),
            trace_decoder: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}
