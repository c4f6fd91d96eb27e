use crate::model::{EventRecord, LocatedFields};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of a fiber span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiberStatus {
    Ok,
    /// Trace ends well short of the expected span.
    Broken,
    /// Span is complete but loses more than allowed.
    Attenuated,
    InsufficientData,
}

impl FiberStatus {
    /// Ordering used for trend comparison. Higher is worse.
    ///
    /// `InsufficientData` has no place on the scale.
    pub fn severity(self) -> Option<u8> {
        match self {
            FiberStatus::Ok => Some(0),
            FiberStatus::Attenuated => Some(1),
            FiberStatus::Broken => Some(2),
            FiberStatus::InsufficientData => None,
        }
    }
}

impl fmt::Display for FiberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiberStatus::Ok => write!(f, "OK"),
            FiberStatus::Broken => write!(f, "Partida"),
            FiberStatus::Attenuated => write!(f, "Atenuada"),
            FiberStatus::InsufficientData => write!(f, "Dados insuficientes"),
        }
    }
}

/// Status plus the human-readable reason that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: FiberStatus,
    pub reason: String,
}

/// Diagnosis of one document. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// Fiber identifier (file stem unless given explicitly).
    pub fiber_id: String,
    /// Free-form period label, e.g. "Q1".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Input format the document was read as.
    pub source_format: String,
    pub expected_length_km: Option<Decimal>,
    pub measured_length_km: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wavelength_nm: Option<u32>,
    pub max_allowed_loss_db: Option<Decimal>,
    pub total_loss_db: Option<Decimal>,
    /// Located fields with their provenance.
    pub fields: LocatedFields,
    pub events: Vec<EventRecord>,
    /// Events whose local loss is above the critical threshold.
    pub critical_events: usize,
    pub status: FiberStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DiagnosisResult {
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}
