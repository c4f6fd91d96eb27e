use fibra_core::error::FibraError;
use fibra_core::profile::schema::DiagnosisProfile;
use fibra_core::Backends;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    output_format: &str,
    profile: Option<PathBuf>,
) -> Result<(), FibraError> {
    let profile = match profile {
        Some(ref path) => fibra_core::profile::load_profile(path)?,
        None => DiagnosisProfile::default(),
    };
    let bytes = std::fs::read(&input_file)?;
    let parsed = fibra_core::parse_input(&input_file, &bytes, &Backends::default(), &profile)?;

    match output_format {
        "json" => println!("{}", serde_json::to_string_pretty(&parsed)?),
        _ => println!("{}", output::table::format_parsed(&parsed)),
    }

    if !parsed.warnings.is_empty() {
        for w in &parsed.warnings {
            match w.page_number {
                Some(page) => eprintln!("  warning (page {page}): {}", w.reason),
                None => eprintln!("  warning: {}", w.reason),
            }
        }
    }

    Ok(())
}
