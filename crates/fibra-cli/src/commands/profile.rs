use fibra_core::error::FibraError;
use fibra_core::profile::schema::DiagnosisProfile;
use std::path::Path;

pub fn show(file: Option<&Path>) -> Result<(), FibraError> {
    let profile = match file {
        Some(path) => fibra_core::profile::load_profile(path)?,
        None => DiagnosisProfile::default(),
    };
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), FibraError> {
    let profile = fibra_core::profile::load_profile(file)?;

    println!("Profile '{}' is valid.", file.display());
    println!(
        "  Break tolerance: {}%",
        (profile.break_tolerance * rust_decimal::Decimal::ONE_HUNDRED).normalize()
    );
    println!("  Critical event loss: > {} dB", profile.critical_event_loss_db);
    println!(
        "  Aggregation: distance {}, loss {}",
        profile.distance_policy, profile.loss_policy
    );
    println!(
        "  Sweep range: {}..{} km",
        profile.sweep_min_km, profile.sweep_max_km
    );
    match profile.trace_decoder {
        Some(ref decoder) if decoder.args.is_empty() => {
            println!("  Trace decoder: {}", decoder.program)
        }
        Some(ref decoder) => println!(
            "  Trace decoder: {} {}",
            decoder.program,
            decoder.args.join(" ")
        ),
        None => println!("  Trace decoder: none (.sor files cannot be read)"),
    }

    Ok(())
}
