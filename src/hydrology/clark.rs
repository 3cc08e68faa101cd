//! Clark unit hydrograph: rainfall translated through a time-area curve,
//! then attenuated through a linear reservoir.

use crate::model::{HydrographPoint, Subcatchment};

use super::scs::time_of_concentration;

/// Fraction of tc used for the storage coefficient when none is supplied.
const DEFAULT_STORAGE_FRACTION: f64 = 0.7;

/// Cumulative time-area fraction at relative time `u` = t/tc.
///
/// Symmetric parabolic S-curve, clamped outside [0, 1]. This shape is
/// fixed; the triangular textbook approximation produces different peaks
/// and must not be substituted.
fn time_area_fraction(u: f64) -> f64 {
    let u = u.clamp(0.0, 1.0);
    if u <= 0.5 {
        2.0 * u * u
    } else {
        1.0 - 2.0 * (1.0 - u) * (1.0 - u)
    }
}

/// Clark unit hydrograph for `sub` under `effective_rainfall_mm` of runoff,
/// sampled at `dt_hours`.
///
/// The runoff volume enters through the time-area curve until tc, and a
/// linear reservoir (C1 = dt / (R + dt/2)) releases it; the duration spans
/// tc + 4R so the recession tail is nearly fully drained.
pub fn clark_hydrograph(
    sub: &Subcatchment,
    effective_rainfall_mm: f64,
    dt_hours: f64,
) -> Vec<HydrographPoint> {
    let tc = time_of_concentration(sub);
    let storage = sub
        .storage_hours
        .filter(|r| *r > 0.0)
        .unwrap_or(DEFAULT_STORAGE_FRACTION * tc);

    // Total runoff volume, m3: Pe (mm -> m) over the area (km2 -> m2).
    let volume_m3 = (effective_rainfall_mm / 1000.0) * sub.area_km2 * 1_000_000.0;

    let steps = ((tc + 4.0 * storage) / dt_hours).ceil() as usize;
    let c1 = dt_hours / (storage + 0.5 * dt_hours);
    let c2 = 1.0 - c1;
    let step_seconds = dt_hours * 3600.0;

    let mut samples = Vec::with_capacity(steps + 1);
    let mut outflow = 0.0;

    for i in 0..=steps {
        let time_hours = i as f64 * dt_hours;

        let inflow_m3s = if time_hours <= tc && i > 0 {
            let released = time_area_fraction(time_hours / tc)
                - time_area_fraction((time_hours - dt_hours) / tc);
            released.max(0.0) * volume_m3 / step_seconds
        } else {
            0.0
        };

        outflow = (c1 * inflow_m3s + c2 * outflow).max(0.0);
        samples.push(HydrographPoint {
            time_hours,
            flow_m3s: outflow,
        });
    }

    samples
}
