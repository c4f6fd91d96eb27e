use crate::diagnose::outcome::{DiagnosisResult, FiberStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of change between two measurement periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Stable,
    Improved,
    Worsened,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Stable => write!(f, "stable"),
            Trend::Improved => write!(f, "improved"),
            Trend::Worsened => write!(f, "worsened"),
        }
    }
}

/// Change of one fiber between a prior and a current diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub fiber_id: String,
    pub prior_period: Option<String>,
    pub current_period: Option<String>,
    pub prior_status: FiberStatus,
    pub current_status: FiberStatus,
    /// `current.total_loss - prior.total_loss`; absent when either is unknown
    /// or the difference does not fit a `Decimal`.
    pub loss_variation_db: Option<Decimal>,
    pub trend: Trend,
}

impl PeriodComparison {
    /// "Q1 → Q2", falling back to "prior → current".
    pub fn period_label(&self) -> String {
        format!(
            "{} → {}",
            self.prior_period.as_deref().unwrap_or("prior"),
            self.current_period.as_deref().unwrap_or("current")
        )
    }
}

pub fn compare(prior: &DiagnosisResult, current: &DiagnosisResult) -> PeriodComparison {
    let loss_variation_db = match (prior.total_loss_db, current.total_loss_db) {
        (Some(before), Some(after)) => after.checked_sub(before),
        _ => None,
    };

    PeriodComparison {
        fiber_id: current.fiber_id.clone(),
        prior_period: prior.period.clone(),
        current_period: current.period.clone(),
        prior_status: prior.status,
        current_status: current.status,
        loss_variation_db,
        trend: trend(prior.status, current.status),
    }
}

fn trend(prior: FiberStatus, current: FiberStatus) -> Trend {
    match (prior.severity(), current.severity()) {
        (Some(before), Some(after)) if after > before => Trend::Worsened,
        (Some(before), Some(after)) if after < before => Trend::Improved,
        _ => Trend::Stable,
    }
}
