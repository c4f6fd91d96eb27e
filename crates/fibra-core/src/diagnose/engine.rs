use crate::diagnose::outcome::{FiberStatus, Verdict};
use rust_decimal::Decimal;

/// Attenuation budget per km for a wavelength, in dB/km.
///
/// Only 1310 nm and 1550 nm have a budget.
pub fn loss_coefficient_db_per_km(wavelength_nm: u32) -> Option<Decimal> {
    match wavelength_nm {
        1310 => Some(Decimal::new(33, 2)),
        1550 => Some(Decimal::new(22, 2)),
        _ => None,
    }
}

/// Maximum acceptable end-to-end loss for a span.
pub fn max_allowed_loss(distance_km: Decimal, wavelength_nm: u32) -> Option<Decimal> {
    loss_coefficient_db_per_km(wavelength_nm).map(|coef| distance_km * coef)
}

/// Apply the threshold rules in order; the first that matches decides.
///
/// 1. no measured length: insufficient data
/// 2. length below `expected * (1 - break_tolerance)`: broken
/// 3. loss above the maximum (when both are known): attenuated
/// 4. otherwise ok
pub fn evaluate(
    expected_length_km: Decimal,
    max_allowed_loss_db: Option<Decimal>,
    measured_length_km: Option<Decimal>,
    measured_loss_db: Option<Decimal>,
    break_tolerance: Decimal,
) -> Verdict {
    let Some(length) = measured_length_km else {
        return Verdict {
            status: FiberStatus::InsufficientData,
            reason: "measured length not found in document".into(),
        };
    };

    let minimum = expected_length_km * (Decimal::ONE - break_tolerance);
    if length < minimum {
        return Verdict {
            status: FiberStatus::Broken,
            reason: format!(
                "measured length {} km < {} km ({}% of expected {} km)",
                length.normalize(),
                minimum.normalize(),
                ((Decimal::ONE - break_tolerance) * Decimal::ONE_HUNDRED).normalize(),
                expected_length_km.normalize()
            ),
        };
    }

    if let (Some(loss), Some(max)) = (measured_loss_db, max_allowed_loss_db) {
        if loss > max {
            return Verdict {
                status: FiberStatus::Attenuated,
                reason: format!(
                    "total loss {} dB > allowed {} dB",
                    loss.normalize(),
                    max.normalize()
                ),
            };
        }
    }

    let reason = match (measured_loss_db, max_allowed_loss_db) {
        (Some(loss), Some(max)) => format!(
            "length {} km within tolerance, loss {} dB <= {} dB",
            length.normalize(),
            loss.normalize(),
            max.normalize()
        ),
        _ => format!(
            "length {} km within tolerance, loss not checked",
            length.normalize()
        ),
    };
    Verdict {
        status: FiberStatus::Ok,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn status(length: Option<Decimal>, loss: Option<Decimal>) -> FiberStatus {
        evaluate(dec!(10), Some(dec!(2.0)), length, loss, dec!(0.05)).status
    }

    #[test]
    fn test_max_allowed_loss_table() {
        assert_eq!(max_allowed_loss(dec!(20), 1550), Some(dec!(4.4)));
        assert_eq!(max_allowed_loss(dec!(20), 1310), Some(dec!(6.6)));
        assert_eq!(max_allowed_loss(dec!(20), 1625), None);
    }

    #[test]
    fn test_short_fiber_is_broken_regardless_of_loss() {
        assert_eq!(status(Some(dec!(9.0)), Some(dec!(0.1))), FiberStatus::Broken);
        assert_eq!(status(Some(dec!(9.0)), Some(dec!(50))), FiberStatus::Broken);
        assert_eq!(status(Some(dec!(9.0)), None), FiberStatus::Broken);
    }

    #[test]
    fn test_tolerance_boundary_is_ok() {
        // 9.5 is exactly 95% of 10: not strictly below
        assert_eq!(status(Some(dec!(9.5)), Some(dec!(1.0))), FiberStatus::Ok);
        assert_eq!(status(Some(dec!(9.49)), Some(dec!(1.0))), FiberStatus::Broken);
    }

    #[test]
    fn test_attenuated() {
        assert_eq!(status(Some(dec!(10)), Some(dec!(2.5))), FiberStatus::Attenuated);
        // loss equal to the budget passes
        assert_eq!(status(Some(dec!(10)), Some(dec!(2.0))), FiberStatus::Ok);
    }

    #[test]
    fn test_ok() {
        let verdict = evaluate(dec!(10), Some(dec!(2.0)), Some(dec!(10)), Some(dec!(1.0)), dec!(0.05));
        assert_eq!(verdict.status, FiberStatus::Ok);
        assert!(verdict.reason.contains("1 dB <= 2 dB"), "{}", verdict.reason);
    }

    #[test]
    fn test_missing_length_is_insufficient() {
        assert_eq!(status(None, Some(dec!(50))), FiberStatus::InsufficientData);
        assert_eq!(status(None, None), FiberStatus::InsufficientData);
    }

    #[test]
    fn test_unknown_budget_falls_back_to_length_check() {
        let verdict = evaluate(dec!(10), None, Some(dec!(10)), Some(dec!(99)), dec!(0.05));
        assert_eq!(verdict.status, FiberStatus::Ok);
        assert!(verdict.reason.contains("not checked"));

        let verdict = evaluate(dec!(10), None, Some(dec!(5)), Some(dec!(99)), dec!(0.05));
        assert_eq!(verdict.status, FiberStatus::Broken);
    }

    #[test]
    fn test_broken_reason() {
        let verdict = evaluate(dec!(10), Some(dec!(2.0)), Some(dec!(9.0)), None, dec!(0.05));
        assert_eq!(
            verdict.reason,
            "measured length 9 km < 9.5 km (95% of expected 10 km)"
        );
    }
}
