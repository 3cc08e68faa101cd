//! SCS curve-number rainfall losses, Temez concentration time and the
//! rational-method reference peak.

use crate::model::Subcatchment;

/// Slope assumed when the catalogue supplies none, percent.
const DEFAULT_SLOPE_PERCENT: f64 = 5.0;

/// Effective (runoff-producing) rainfall in mm for a gross depth `precip_mm`
/// and curve number `curve_number`.
///
/// S = 25400/CN - 254 (mm), Ia = 0.2 S. Rainfall at or below the initial
/// abstraction produces exactly zero runoff.
pub fn effective_rainfall(precip_mm: f64, curve_number: f64) -> f64 {
    if precip_mm <= 0.0 {
        return 0.0;
    }

    let s = 25400.0 / curve_number - 254.0;
    let ia = 0.2 * s;

    if precip_mm <= ia {
        return 0.0;
    }

    (precip_mm - ia).powi(2) / (precip_mm + 0.8 * s)
}

/// Time of concentration in hours by the Temez formula,
/// tc = 0.3 * (L / S^0.25)^0.76 with L in km and S in percent.
///
/// An explicit catalogue tc wins. Channel length defaults to
/// sqrt(area) * 1.5 and slope to 5% when missing.
pub fn time_of_concentration(sub: &Subcatchment) -> f64 {
    if let Some(tc) = sub.tc_hours {
        return tc;
    }

    let length_km = sub
        .channel_length_km
        .unwrap_or_else(|| sub.area_km2.sqrt() * 1.5);
    let slope_percent = if sub.slope_percent > 0.0 {
        sub.slope_percent
    } else {
        DEFAULT_SLOPE_PERCENT
    };

    0.3 * (length_km / slope_percent.powf(0.25)).powf(0.76)
}

/// Runoff coefficient from CN, fine 5-point table. Used by the
/// per-subcatchment rational reference peak.
pub fn runoff_coefficient(curve_number: f64) -> f64 {
    match curve_number {
        cn if cn >= 90.0 => 0.85,
        cn if cn >= 85.0 => 0.72,
        cn if cn >= 80.0 => 0.60,
        cn if cn >= 75.0 => 0.50,
        cn if cn >= 70.0 => 0.40,
        cn if cn >= 65.0 => 0.30,
        cn if cn >= 60.0 => 0.22,
        _ => 0.15,
    }
}

/// Coarser 10-point variant of the CN table, kept for the lumped fallback
/// path which historically used it.
pub fn runoff_coefficient_coarse(curve_number: f64) -> f64 {
    match curve_number {
        cn if cn >= 90.0 => 0.80,
        cn if cn >= 80.0 => 0.60,
        cn if cn >= 70.0 => 0.40,
        cn if cn >= 60.0 => 0.25,
        _ => 0.15,
    }
}

/// Rational-method peak Q = C * I * A / 3.6, in m3/s, with I in mm/h and
/// A in km2.
pub fn rational_peak(runoff_coefficient: f64, intensity_mm_h: f64, area_km2: f64) -> f64 {
    runoff_coefficient * intensity_mm_h * area_km2 / 3.6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bounds;

    fn sub_with(
        area_km2: f64,
        slope_percent: f64,
        channel_length_km: Option<f64>,
        tc_hours: Option<f64>,
    ) -> Subcatchment {
        Subcatchment {
            id: "sc".to_string(),
            area_km2,
            curve_number: 75.0,
            slope_percent,
            channel_length_km,
            tc_hours,
            storage_hours: None,
            bounds: Bounds {
                north: 1.0,
                south: 0.0,
                east: 1.0,
                west: 0.0,
            },
            routing: None,
        }
    }

    #[test]
    fn test_effective_rainfall_spot_check() {
        // P = 50 mm, CN = 80: S = 63.5, Ia = 12.7,
        // Pe = 37.3^2 / (50 + 50.8) = 13.80 mm.
        let pe = effective_rainfall(50.0, 80.0);
        assert!((pe - 13.80).abs() < 0.01, "got {}", pe);
    }

    #[test]
    fn test_no_runoff_at_or_below_initial_abstraction() {
        // CN 80: Ia = 12.7 mm.
        assert_eq!(effective_rainfall(12.7, 80.0), 0.0);
        assert_eq!(effective_rainfall(5.0, 80.0), 0.0);
        assert_eq!(effective_rainfall(0.0, 80.0), 0.0);
        assert!(effective_rainfall(12.8, 80.0) > 0.0);
    }

    #[test]
    fn test_effective_rainfall_bounded_by_gross() {
        for precip in [1.0, 10.0, 50.0, 200.0] {
            for cn in [30.0, 55.0, 75.0, 99.0] {
                let pe = effective_rainfall(precip, cn);
                assert!(pe >= 0.0);
                assert!(pe <= precip, "Pe {} > P {} at CN {}", pe, precip, cn);
            }
        }
    }

    #[test]
    fn test_higher_cn_gives_more_runoff() {
        let low = effective_rainfall(60.0, 65.0);
        let high = effective_rainfall(60.0, 90.0);
        assert!(high > low);
    }

    #[test]
    fn test_explicit_tc_wins() {
        let sub = sub_with(100.0, 5.0, Some(12.0), Some(2.5));
        assert_eq!(time_of_concentration(&sub), 2.5);
    }

    #[test]
    fn test_temez_from_length_and_slope() {
        // L = 10 km, S = 5%: tc = 0.3 * (10 / 5^0.25)^0.76.
        let sub = sub_with(100.0, 5.0, Some(10.0), None);
        let expected = 0.3 * (10.0 / 5.0_f64.powf(0.25)).powf(0.76);
        assert!((time_of_concentration(&sub) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_length_defaults_from_area() {
        let derived = time_of_concentration(&sub_with(100.0, 5.0, None, None));
        let explicit = time_of_concentration(&sub_with(100.0, 5.0, Some(15.0), None));
        assert!((derived - explicit).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_slope_defaults() {
        let defaulted = time_of_concentration(&sub_with(100.0, 0.0, Some(10.0), None));
        let explicit = time_of_concentration(&sub_with(100.0, 5.0, Some(10.0), None));
        assert!((defaulted - explicit).abs() < 1e-12);
    }

    #[test]
    fn test_extreme_slopes_stay_finite() {
        let flat = time_of_concentration(&sub_with(100.0, 0.1, Some(10.0), None));
        let steep = time_of_concentration(&sub_with(100.0, 50.0, Some(10.0), None));
        assert!(flat.is_finite() && flat > 0.0);
        assert!(steep.is_finite() && steep > 0.0);
        // Steeper catchments concentrate faster.
        assert!(steep < flat);
    }

    #[test]
    fn test_fine_coefficient_table() {
        assert_eq!(runoff_coefficient(95.0), 0.85);
        assert_eq!(runoff_coefficient(90.0), 0.85);
        assert_eq!(runoff_coefficient(85.0), 0.72);
        assert_eq!(runoff_coefficient(80.0), 0.60);
        assert_eq!(runoff_coefficient(75.0), 0.50);
        assert_eq!(runoff_coefficient(70.0), 0.40);
        assert_eq!(runoff_coefficient(65.0), 0.30);
        assert_eq!(runoff_coefficient(60.0), 0.22);
        assert_eq!(runoff_coefficient(45.0), 0.15);
    }

    #[test]
    fn test_rational_peak_spot_check() {
        // A = 10 km2, CN 85 (C = 0.72), I = 20 mm/h: Q = 40 m3/s.
        let q = rational_peak(runoff_coefficient(85.0), 20.0, 10.0);
        assert!((q - 40.0).abs() < 1e-9, "got {}", q);
    }
}
