//! Per-subcatchment rainfall estimation: filters the station and radar
//! feeds down to each subcatchment and picks the best available method.

use tracing::{debug, instrument};

use crate::model::{AreaEstimate, Basin, Bounds, EstimationMethod, RadarPixel, Station};
use crate::spatial::merge::{gauge_field, merged_field, radar_field};

/// Margin added around basin bounds when selecting gauges, degrees.
const BASIN_MARGIN_DEG: f64 = 0.15;

/// Margin added around subcatchment bounds when selecting gauges, degrees.
const SUBCATCHMENT_MARGIN_DEG: f64 = 0.08;

/// Rainfall estimate for a whole basin, one entry per subcatchment in
/// catalogue order.
#[derive(Debug, Clone)]
pub struct BasinRainfall {
    pub subcatchments: Vec<AreaEstimate>,
    /// Area-weighted mean over subcatchments, mm.
    pub mean_precip_mm: f64,
    /// Maximum local intensity over subcatchments, mm/h.
    pub max_intensity_mm_h: f64,
    pub method: EstimationMethod,
}

/// Estimates rainfall over one region, choosing fusion, gauge-only or
/// radar-only depending on which inputs survived filtering.
fn estimate_region(bounds: &Bounds, gauges: &[Station], pixels: &[RadarPixel]) -> AreaEstimate {
    let (summary, method) = match (gauges.is_empty(), pixels.is_empty()) {
        (false, false) => (
            merged_field(bounds, gauges, pixels),
            EstimationMethod::DistributedFusion,
        ),
        (false, true) => (gauge_field(bounds, gauges), EstimationMethod::DistributedIdw),
        (true, false) => (radar_field(bounds, pixels), EstimationMethod::RadarOnly),
        (true, true) => return AreaEstimate::no_data(),
    };

    AreaEstimate {
        precip_mm: summary.mean_mm,
        intensity_mm_h: summary.max_mm,
        method,
        gauge_count: gauges.len(),
        radar_count: pixels.len(),
    }
}

/// Strongest method actually used across subcatchments; tags the basin
/// result so consumers can tell full fusion from degraded paths.
fn basin_method(estimates: &[AreaEstimate]) -> EstimationMethod {
    let mut method = EstimationMethod::NoData;
    for estimate in estimates {
        method = match (method, estimate.method) {
            (_, EstimationMethod::DistributedFusion) | (EstimationMethod::DistributedFusion, _) => {
                EstimationMethod::DistributedFusion
            }
            (_, EstimationMethod::DistributedIdw) | (EstimationMethod::DistributedIdw, _) => {
                EstimationMethod::DistributedIdw
            }
            (_, EstimationMethod::RadarOnly) | (EstimationMethod::RadarOnly, _) => {
                EstimationMethod::RadarOnly
            }
            _ => EstimationMethod::NoData,
        };
    }
    method
}

/// Per-subcatchment rainfall for `basin` from the cycle's station and
/// radar feeds.
///
/// Gauges are pre-filtered to online stations within the basin bounds plus
/// a margin; radar pixels to the exact basin bounds. Each subcatchment then
/// narrows both sets again. A basin with no subcatchments is estimated as a
/// single region over its own bounds.
#[instrument(skip(basin, stations, radar), fields(basin_id = %basin.id))]
pub fn estimate_basin_rainfall(
    basin: &Basin,
    stations: &[Station],
    radar: Option<&[RadarPixel]>,
) -> BasinRainfall {
    let gauge_search = basin.bounds.expanded(BASIN_MARGIN_DEG);
    let basin_gauges: Vec<Station> = stations
        .iter()
        .filter(|station| station.online && gauge_search.contains(station.latitude, station.longitude))
        .cloned()
        .collect();

    let basin_pixels: Vec<RadarPixel> = radar
        .unwrap_or(&[])
        .iter()
        .filter(|pixel| basin.bounds.contains(pixel.latitude, pixel.longitude))
        .copied()
        .collect();

    debug!(
        gauges = basin_gauges.len(),
        pixels = basin_pixels.len(),
        subcatchments = basin.subcatchments.len(),
        "estimating basin rainfall"
    );

    if basin.subcatchments.is_empty() {
        let estimate = estimate_region(&basin.bounds, &basin_gauges, &basin_pixels);
        return BasinRainfall {
            mean_precip_mm: estimate.precip_mm,
            max_intensity_mm_h: estimate.intensity_mm_h,
            method: estimate.method,
            subcatchments: vec![estimate],
        };
    }

    let mut estimates = Vec::with_capacity(basin.subcatchments.len());
    for sub in &basin.subcatchments {
        let sub_search = sub.bounds.expanded(SUBCATCHMENT_MARGIN_DEG);
        let sub_gauges: Vec<Station> = basin_gauges
            .iter()
            .filter(|station| sub_search.contains(station.latitude, station.longitude))
            .cloned()
            .collect();
        let sub_pixels: Vec<RadarPixel> = basin_pixels
            .iter()
            .filter(|pixel| sub.bounds.contains(pixel.latitude, pixel.longitude))
            .copied()
            .collect();

        estimates.push(estimate_region(&sub.bounds, &sub_gauges, &sub_pixels));
    }

    let total_area: f64 = basin.subcatchments.iter().map(|sub| sub.area_km2).sum();
    let mean_precip_mm = if total_area > 0.0 {
        basin
            .subcatchments
            .iter()
            .zip(&estimates)
            .map(|(sub, estimate)| estimate.precip_mm * sub.area_km2)
            .sum::<f64>()
            / total_area
    } else {
        0.0
    };
    let max_intensity_mm_h = estimates
        .iter()
        .map(|estimate| estimate.intensity_mm_h)
        .fold(0.0, f64::max);

    BasinRainfall {
        method: basin_method(&estimates),
        mean_precip_mm,
        max_intensity_mm_h,
        subcatchments: estimates,
    }
}
