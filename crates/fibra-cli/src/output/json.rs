use fibra_core::diagnose::compare::PeriodComparison;
use fibra_core::diagnose::outcome::DiagnosisResult;
use fibra_core::error::FibraError;

pub fn diagnosis_json(
    results: &[DiagnosisResult],
    comparison: Option<&PeriodComparison>,
) -> serde_json::Value {
    serde_json::json!({
        "results": results,
        "comparison": comparison,
    })
}

pub fn print_diagnosis(
    results: &[DiagnosisResult],
    comparison: Option<&PeriodComparison>,
) -> Result<(), FibraError> {
    let json = serde_json::to_string_pretty(&diagnosis_json(results, comparison))?;
    println!("{json}");
    Ok(())
}
