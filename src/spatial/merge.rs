//! Conditional radar-gauge merging (Sinclair & Pegram style): the radar
//! field is corrected by an interpolated gauge/radar ratio surface, then
//! blended with the pure gauge field.

use tracing::debug;

use crate::model::{Bounds, RadarPixel, Station};
use crate::radar::ZrRelation;
use crate::spatial::geo::haversine_km;
use crate::spatial::idw::{interpolate, WeightedSample};

/// Interpolation grid resolution, decimal degrees.
const GRID_RESOLUTION_DEG: f64 = 0.02;

/// Radar share of the fused field; gauges carry the remainder.
const RADAR_WEIGHT: f64 = 0.4;

/// Upper cap on an individual gauge/radar bias ratio.
const BIAS_RATIO_CAP: f64 = 5.0;

/// Radar depths at or below this are treated as dry, mm.
const DRY_RADAR_MM: f64 = 0.1;

/// Bias assigned where the radar is dry but the gauge is not.
const DRY_RADAR_BIAS: f64 = 3.0;

/// Clamp range for the interpolated correction surface.
const CORRECTION_MIN: f64 = 0.1;
const CORRECTION_MAX: f64 = 5.0;

/// Mean and maximum of an estimated rainfall field over its grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSummary {
    pub mean_mm: f64,
    pub max_mm: f64,
    pub cells: usize,
}

impl FieldSummary {
    pub fn zero() -> Self {
        FieldSummary {
            mean_mm: 0.0,
            max_mm: 0.0,
            cells: 0,
        }
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Regular grid over `bounds` at 0.02 degree resolution, coordinates
/// rounded to three decimals so grid geometry is reproducible across runs.
fn grid_points(bounds: &Bounds) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    let mut latitude = bounds.south;
    while latitude <= bounds.north + 1e-9 {
        let mut longitude = bounds.west;
        while longitude <= bounds.east + 1e-9 {
            points.push((round3(latitude), round3(longitude)));
            longitude += GRID_RESOLUTION_DEG;
        }
        latitude += GRID_RESOLUTION_DEG;
    }
    points
}

fn summarize(values: &[f64]) -> FieldSummary {
    if values.is_empty() {
        return FieldSummary::zero();
    }
    let sum: f64 = values.iter().sum();
    let max = values.iter().cloned().fold(0.0, f64::max);
    FieldSummary {
        mean_mm: sum / values.len() as f64,
        max_mm: max,
        cells: values.len(),
    }
}

fn gauge_samples(gauges: &[Station]) -> Vec<WeightedSample> {
    gauges
        .iter()
        .map(|station| WeightedSample {
            latitude: station.latitude,
            longitude: station.longitude,
            value: station.precipitation_mm,
        })
        .collect()
}

fn radar_depth_samples(pixels: &[RadarPixel]) -> Vec<WeightedSample> {
    pixels
        .iter()
        .map(|pixel| WeightedSample {
            latitude: pixel.latitude,
            longitude: pixel.longitude,
            value: ZrRelation::MarshallPalmer.rain_rate(pixel.dbz),
        })
        .collect()
}

/// One gauge/radar bias ratio per gauge that has a usable nearest pixel.
///
/// Nearest-pixel search is brute force over the (already basin-filtered)
/// pixel set; counts are small enough that a spatial index is not worth it.
fn bias_samples(gauges: &[Station], radar_depths: &[WeightedSample]) -> Vec<WeightedSample> {
    let mut biases = Vec::new();

    for gauge in gauges {
        let nearest = radar_depths.iter().min_by(|a, b| {
            let da = haversine_km(gauge.latitude, gauge.longitude, a.latitude, a.longitude);
            let db = haversine_km(gauge.latitude, gauge.longitude, b.latitude, b.longitude);
            da.total_cmp(&db)
        });

        let Some(pixel) = nearest else { continue };

        let ratio = if pixel.value > DRY_RADAR_MM {
            Some((gauge.precipitation_mm / pixel.value).min(BIAS_RATIO_CAP))
        } else if gauge.precipitation_mm > 0.0 {
            // Radar sees nothing where the gauge is wet; apply a fixed
            // upward bias instead of an unbounded ratio.
            Some(DRY_RADAR_BIAS)
        } else {
            None
        };

        if let Some(value) = ratio {
            biases.push(WeightedSample {
                latitude: gauge.latitude,
                longitude: gauge.longitude,
                value,
            });
        }
    }

    biases
}

/// Fused radar-gauge rainfall field over `bounds`.
///
/// Both inputs must be non-empty; the estimator falls back to
/// [`gauge_field`] or [`radar_field`] otherwise.
pub fn merged_field(bounds: &Bounds, gauges: &[Station], pixels: &[RadarPixel]) -> FieldSummary {
    let station_field = gauge_samples(gauges);
    let radar_depths = radar_depth_samples(pixels);
    let biases = bias_samples(gauges, &radar_depths);

    debug!(
        gauges = gauges.len(),
        pixels = pixels.len(),
        bias_samples = biases.len(),
        "merging radar and gauge fields"
    );

    let values: Vec<f64> = grid_points(bounds)
        .into_iter()
        .map(|(latitude, longitude)| {
            let radar_value = interpolate(&radar_depths, latitude, longitude);
            let correction = if biases.is_empty() {
                1.0
            } else {
                interpolate(&biases, latitude, longitude).clamp(CORRECTION_MIN, CORRECTION_MAX)
            };
            let station_value = interpolate(&station_field, latitude, longitude);

            RADAR_WEIGHT * (radar_value * correction) + (1.0 - RADAR_WEIGHT) * station_value
        })
        .collect();

    summarize(&values)
}

/// Pure gauge IDW field over `bounds`.
pub fn gauge_field(bounds: &Bounds, gauges: &[Station]) -> FieldSummary {
    let samples = gauge_samples(gauges);
    let values: Vec<f64> = grid_points(bounds)
        .into_iter()
        .map(|(latitude, longitude)| interpolate(&samples, latitude, longitude))
        .collect();
    summarize(&values)
}

/// Pure radar-depth IDW field over `bounds`.
pub fn radar_field(bounds: &Bounds, pixels: &[RadarPixel]) -> FieldSummary {
    let samples = radar_depth_samples(pixels);
    let values: Vec<f64> = grid_points(bounds)
        .into_iter()
        .map(|(latitude, longitude)| interpolate(&samples, latitude, longitude))
        .collect();
    summarize(&values)
}
