pub mod schema;

use crate::error::FibraError;
use schema::DiagnosisProfile;
use rust_decimal::Decimal;
use std::path::Path;

/// Load a diagnosis profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<DiagnosisProfile, FibraError> {
    let content = std::fs::read_to_string(path).map_err(|e| FibraError::ProfileLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_profile(&content, path)
}

/// Parse a profile from a JSON string.
pub fn parse_profile(json: &str, source: &Path) -> Result<DiagnosisProfile, FibraError> {
    let profile: DiagnosisProfile =
        serde_json::from_str(json).map_err(|e| FibraError::ProfileLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Parse a profile from a JSON string (no file path context).
pub fn parse_profile_str(json: &str) -> Result<DiagnosisProfile, FibraError> {
    let profile: DiagnosisProfile = serde_json::from_str(json).map_err(FibraError::Json)?;
    validate_profile(&profile)?;
    Ok(profile)
}

/// Validate that a profile is usable.
pub fn validate_profile(profile: &DiagnosisProfile) -> Result<(), FibraError> {
    if profile.break_tolerance < Decimal::ZERO || profile.break_tolerance >= Decimal::ONE {
        return Err(FibraError::ProfileInvalid(format!(
            "break_tolerance must be in [0, 1), got {}",
            profile.break_tolerance
        )));
    }

    if profile.critical_event_loss_db < Decimal::ZERO {
        return Err(FibraError::ProfileInvalid(format!(
            "critical_event_loss_db must not be negative, got {}",
            profile.critical_event_loss_db
        )));
    }

    if profile.sweep_min_km < Decimal::ZERO || profile.sweep_min_km >= profile.sweep_max_km {
        return Err(FibraError::ProfileInvalid(format!(
            "sweep range {}..{} km is empty or negative",
            profile.sweep_min_km, profile.sweep_max_km
        )));
    }

    if let Some(ref decoder) = profile.trace_decoder {
        if decoder.program.trim().is_empty() {
            return Err(FibraError::ProfileInvalid(
                "trace_decoder.program must not be empty".into(),
            ));
        }
    }

    Ok(())
}
