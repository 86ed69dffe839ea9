//! Precursor mass tolerance checks.
//!
//! All functions here are pure and total: lookup failures and out-of-range
//! inputs are the caller's problem, nothing panics.

/// Mass difference between C13 and C12, in Da. Selecting a non-monoisotopic
/// peak offsets the observed m/z by an integer multiple of this over the
/// charge.
pub const C13_MASS_DIFF: f64 = 1.00335;

/// Relative mass error in ppm between the calculated and the observed
/// precursor m/z, correcting the observation for `isotope` C13 offsets.
pub fn mass_error_ppm(calc_mz: f64, obs_mz: f64, charge: u8, isotope: i32) -> f64 {
    (calc_mz - (obs_mz - f64::from(isotope) * C13_MASS_DIFF / f64::from(charge))) / obs_mz * 1e6
}

/// True when some isotope offset in the inclusive range brings the absolute
/// mass error strictly below the tolerance.
pub fn fits_tolerance(
    calc_mz: f64,
    obs_mz: f64,
    charge: u8,
    tol_ppm: f64,
    isotope_range: (i32, i32),
) -> bool {
    (isotope_range.0..=isotope_range.1)
        .any(|iso| mass_error_ppm(calc_mz, obs_mz, charge, iso).abs() < tol_ppm)
}

/// True when every isotope offset in the inclusive range leaves the mass
/// error strictly above the tolerance.
///
/// One-sided on purpose: a peptide that is too heavy stays too heavy, while
/// one that is too light can still be corrected by a future negative-mass
/// residue.
pub fn exceeds_tolerance(
    calc_mz: f64,
    obs_mz: f64,
    charge: u8,
    tol_ppm: f64,
    isotope_range: (i32, i32),
) -> bool {
    (isotope_range.0..=isotope_range.1)
        .all(|iso| mass_error_ppm(calc_mz, obs_mz, charge, iso) > tol_ppm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_error_ppm_fixtures() {
        assert_eq!(mass_error_ppm(100.0, 100.0, 1, 0), 0.0);
        let err = mass_error_ppm(100.001, 100.0, 1, 0);
        assert!((err - 10.0).abs() < 1e-6, "got {}", err);
        // One isotope offset at charge 1 shifts the error by ~1.00335 Da.
        let shifted = mass_error_ppm(100.0, 100.0, 1, 1);
        assert!((shifted - C13_MASS_DIFF / 100.0 * 1e6).abs() < 1e-6);
    }

    #[test]
    fn test_fits_tolerance() {
        // 10 ppm error fits a 50 ppm tolerance.
        assert!(fits_tolerance(100.001, 100.0, 1, 50.0, (0, 1)));
        // 1000 ppm error fits for no isotope offset in range.
        assert!(!fits_tolerance(100.1, 100.0, 1, 50.0, (0, 1)));
        // An isotope mismatch can rescue an otherwise failing match.
        let obs = 200.0 + C13_MASS_DIFF / 2.0;
        assert!(!fits_tolerance(200.0, obs, 2, 50.0, (0, 0)));
        assert!(fits_tolerance(200.0, obs, 2, 50.0, (0, 1)));
    }

    #[test]
    fn test_exceeds_tolerance_is_one_sided() {
        // Over-mass beyond tolerance for every offset.
        assert!(exceeds_tolerance(100.1, 100.0, 1, 50.0, (0, 1)));
        // Under-mass never exceeds, no matter how far off.
        assert!(!exceeds_tolerance(99.0, 100.0, 1, 50.0, (0, 1)));
        // Within tolerance exceeds nothing.
        assert!(!exceeds_tolerance(100.001, 100.0, 1, 50.0, (0, 1)));
    }
}
