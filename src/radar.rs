//! Radar reflectivity model: Z-R conversion and intensity classification.

use serde::{Deserialize, Serialize};

/// Empirical Z-R power law Z = a * R^b, selected per precipitation regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZrRelation {
    /// Stratiform rain, a = 200, b = 1.6. The radar-gauge merger always
    /// uses this relation.
    MarshallPalmer,
    /// Convective rain, a = 300, b = 1.4.
    Convective,
}

impl ZrRelation {
    fn coefficients(&self) -> (f64, f64) {
        match self {
            ZrRelation::MarshallPalmer => (200.0, 1.6),
            ZrRelation::Convective => (300.0, 1.4),
        }
    }

    /// Converts reflectivity in dBZ to rain rate in mm/h.
    pub fn rain_rate(&self, dbz: f64) -> f64 {
        let (a, b) = self.coefficients();
        let z = 10f64.powf(dbz / 10.0);
        (z / a).powf(1.0 / b)
    }

    /// Inverse conversion, mm/h back to dBZ. Only meaningful for rates > 0.
    pub fn dbz(&self, rain_rate_mm_h: f64) -> f64 {
        let (a, b) = self.coefficients();
        let z = a * rain_rate_mm_h.powf(b);
        10.0 * z.log10()
    }
}

/// Qualitative rainfall intensity bands, by upper bound in mm/h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityBand {
    None,
    Light,
    Moderate,
    Heavy,
    VeryHeavy,
    Torrential,
}

impl IntensityBand {
    pub fn classify(intensity_mm_h: f64) -> Self {
        match intensity_mm_h {
            i if i < 1.0 => IntensityBand::None,
            i if i < 5.0 => IntensityBand::Light,
            i if i < 15.0 => IntensityBand::Moderate,
            i if i < 30.0 => IntensityBand::Heavy,
            i if i < 60.0 => IntensityBand::VeryHeavy,
            _ => IntensityBand::Torrential,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IntensityBand::None => "none",
            IntensityBand::Light => "light",
            IntensityBand::Moderate => "moderate",
            IntensityBand::Heavy => "heavy",
            IntensityBand::VeryHeavy => "very_heavy",
            IntensityBand::Torrential => "torrential",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marshall_palmer_spot_value() {
        // dBZ = 35: Z = 10^3.5 = 3162.28, R = (Z/200)^(1/1.6) ~ 5.57 mm/h.
        let rate = ZrRelation::MarshallPalmer.rain_rate(35.0);
        assert!((rate - 5.57).abs() < 0.02, "got {}", rate);
    }

    #[test]
    fn test_convective_exceeds_marshall_palmer_at_high_dbz() {
        let mp = ZrRelation::MarshallPalmer.rain_rate(50.0);
        let conv = ZrRelation::Convective.rain_rate(50.0);
        assert!(conv > mp);
    }

    #[test]
    fn test_round_trip_preserves_dbz() {
        for dbz in [5.0, 20.0, 35.0, 55.0] {
            let rate = ZrRelation::MarshallPalmer.rain_rate(dbz);
            assert!(rate > 0.0);
            let back = ZrRelation::MarshallPalmer.dbz(rate);
            assert!((back - dbz).abs() < 1e-9, "dbz {} -> {}", dbz, back);
        }
    }

    #[test]
    fn test_intensity_bands() {
        assert_eq!(IntensityBand::classify(0.4), IntensityBand::None);
        assert_eq!(IntensityBand::classify(1.0), IntensityBand::Light);
        assert_eq!(IntensityBand::classify(8.0), IntensityBand::Moderate);
        assert_eq!(IntensityBand::classify(20.0), IntensityBand::Heavy);
        assert_eq!(IntensityBand::classify(45.0), IntensityBand::VeryHeavy);
        assert_eq!(IntensityBand::classify(75.0), IntensityBand::Torrential);
    }
}
