//! Inverse-distance-weighted interpolation over scattered samples.

use crate::spatial::geo::{haversine_km, COINCIDENT_KM};

/// Interpolation power p.
const POWER: f64 = 2.0;

/// Search radius, km; samples farther than this carry no weight.
const SEARCH_RADIUS_KM: f64 = 50.0;

/// A scalar sample anchored to a point. Stations, radar pixels and bias
/// ratios are all adapted into this shape before interpolation.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSample {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

/// Estimates the field at (latitude, longitude) by inverse-distance
/// weighting with power 2 over samples within 50 km.
///
/// A sample closer than 10 m to the target wins outright; when several are
/// colocated, the first in slice order is returned. Returns 0.0 when no
/// sample lies within the search radius.
pub fn interpolate(samples: &[WeightedSample], latitude: f64, longitude: f64) -> f64 {
    let mut weight_sum = 0.0;
    let mut weighted_value_sum = 0.0;

    for sample in samples {
        let distance_km = haversine_km(latitude, longitude, sample.latitude, sample.longitude);

        if distance_km < COINCIDENT_KM {
            return sample.value;
        }
        if distance_km > SEARCH_RADIUS_KM {
            continue;
        }

        let weight = 1.0 / distance_km.powf(POWER);
        weight_sum += weight;
        weighted_value_sum += weight * sample.value;
    }

    if weight_sum > 0.0 {
        weighted_value_sum / weight_sum
    } else {
        0.0
    }
}
