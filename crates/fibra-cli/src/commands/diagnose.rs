use fibra_core::cache::DocumentCache;
use fibra_core::diagnose::compare::{compare, PeriodComparison};
use fibra_core::diagnose::engine::max_allowed_loss;
use fibra_core::diagnose::outcome::DiagnosisResult;
use fibra_core::diagnose::DiagnosisRequest;
use fibra_core::error::FibraError;
use fibra_core::export::write_workbook;
use fibra_core::history::{write_summary, HistoryStore, SummaryRow};
use fibra_core::profile::schema::DiagnosisProfile;
use fibra_core::Backends;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use crate::output;

pub struct DiagnoseOptions {
    pub current: PathBuf,
    pub prior: Option<PathBuf>,
    pub expected_km: Option<Decimal>,
    pub wavelength: u32,
    pub max_loss: Option<Decimal>,
    pub fiber_id: Option<String>,
    pub period: Option<String>,
    pub prior_period: Option<String>,
    pub profile: Option<PathBuf>,
    pub output_format: String,
    pub out: Option<PathBuf>,
    pub history: Option<PathBuf>,
    pub show_events: bool,
}

pub fn run(opts: DiagnoseOptions) -> Result<(), FibraError> {
    let profile = match opts.profile {
        Some(ref path) => fibra_core::profile::load_profile(path)?,
        None => DiagnosisProfile::default(),
    };
    let backends = Backends::default();
    let mut cache = DocumentCache::new();

    let mut run_one = |path: &Path, period: &Option<String>| -> Result<DiagnosisResult, FibraError> {
        let bytes = std::fs::read(path)?;
        let request = request_for(&opts, period);
        fibra_core::diagnose_cached(&mut cache, path, &bytes, &backends, &request, &profile)
    };

    let prior = match opts.prior {
        Some(ref path) => Some(run_one(path, &opts.prior_period)?),
        None => None,
    };
    let current = run_one(&opts.current, &opts.period)?;

    let comparison = prior.as_ref().map(|p| compare(p, &current));
    let results: Vec<DiagnosisResult> = prior.into_iter().chain(std::iter::once(current)).collect();
    let rows: Vec<SummaryRow> = results.iter().map(SummaryRow::from).collect();

    match opts.output_format.as_str() {
        "json" => output::json::print_diagnosis(&results, comparison.as_ref())?,
        "csv" => output::csv::print(&rows)?,
        _ => {
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                output::table::print_diagnosis(result, opts.show_events);
            }
            if let Some(ref cmp) = comparison {
                println!();
                output::table::print_comparison(cmp);
            }
        }
    }

    if let Some(ref path) = opts.out {
        write_out(path, &results, &rows, comparison.as_ref(), &profile)?;
        eprintln!("Wrote {} result(s) to {}", results.len(), path.display());
    }

    if let Some(ref path) = opts.history {
        let store = HistoryStore::new(path);
        let total = store.append(&rows)?;
        eprintln!(
            "Appended {} row(s) to {} ({} total)",
            rows.len(),
            path.display(),
            total
        );
    }

    Ok(())
}

/// Request for one report. Without `--fiber-id` the id is left empty so each
/// report is named after its own file.
fn request_for(opts: &DiagnoseOptions, period: &Option<String>) -> DiagnosisRequest {
    DiagnosisRequest {
        fiber_id: opts.fiber_id.clone().unwrap_or_default(),
        period: period.clone(),
        expected_length_km: opts.expected_km,
        wavelength_nm: Some(opts.wavelength),
        max_loss_override_db: opts.max_loss,
    }
}

/// `.csv`: summary columns, `.xlsx`: workbook with one events sheet per
/// result, anything else: the JSON envelope.
fn write_out(
    path: &Path,
    results: &[DiagnosisResult],
    rows: &[SummaryRow],
    comparison: Option<&PeriodComparison>,
    profile: &DiagnosisProfile,
) -> Result<(), FibraError> {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::create(path)?;
            write_summary(file, rows)
        }
        "xlsx" => write_workbook(path, results, profile.critical_event_loss_db),
        _ => {
            let json = output::json::diagnosis_json(results, comparison);
            std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
            Ok(())
        }
    }
}

pub fn max_loss(distance_km: Decimal, wavelength: u32) -> Result<(), FibraError> {
    match max_allowed_loss(distance_km, wavelength) {
        Some(max) => println!(
            "Max allowed loss for {} km at {} nm: {} dB",
            distance_km.normalize(),
            wavelength,
            max.normalize()
        ),
        None => println!("No loss budget for {wavelength} nm (known: 1310, 1550)"),
    }
    Ok(())
}
