use rust_decimal::Decimal;

/// Convert f64 to Decimal, preserving reasonable precision.
///
/// Uses string round-trip to avoid floating-point artifacts
/// (e.g., 0.0035_f64 becoming 0.00349999...).
pub fn f64_to_decimal(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    let s = format!("{f}");
    s.parse::<Decimal>().ok().or_else(|| Decimal::try_from(f).ok())
}

/// Metres as reported by trace decoders, converted to kilometres.
pub fn metres_to_km(metres: f64) -> Option<Decimal> {
    f64_to_decimal(metres).map(|m| m / Decimal::ONE_THOUSAND)
}
