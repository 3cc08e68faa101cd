//! Muskingum hydrologic channel routing.

use tracing::warn;

use crate::model::{HydrographPoint, RoutingParams};

/// Routes `inflow` through `params.reaches` identical Muskingum reaches in
/// series at step `dt_hours`. Sample times are preserved.
///
/// A reach whose denominator D = K - K*X + dt/2 is non-positive would be
/// numerically unstable; it is skipped with a warning and the remaining
/// reaches still apply.
pub fn route(
    inflow: &[HydrographPoint],
    params: &RoutingParams,
    dt_hours: f64,
) -> Vec<HydrographPoint> {
    let mut current: Vec<HydrographPoint> = inflow.to_vec();

    for reach in 0..params.reaches {
        let kx = params.k_hours * params.x;
        let d = params.k_hours - kx + 0.5 * dt_hours;

        if d <= 0.0 {
            warn!(
                reach,
                k_hours = params.k_hours,
                x = params.x,
                "Muskingum denominator non-positive, skipping reach"
            );
            continue;
        }

        let c0 = (-kx + 0.5 * dt_hours) / d;
        let c1 = (kx + 0.5 * dt_hours) / d;
        let c2 = (params.k_hours - kx - 0.5 * dt_hours) / d;

        let mut routed: Vec<HydrographPoint> = Vec::with_capacity(current.len());
        for (i, point) in current.iter().enumerate() {
            let outflow = if i == 0 {
                point.flow_m3s
            } else {
                let previous_in = current[i - 1].flow_m3s;
                let previous_out = routed[i - 1].flow_m3s;
                (c0 * point.flow_m3s + c1 * previous_in + c2 * previous_out).max(0.0)
            };
            routed.push(HydrographPoint {
                time_hours: point.time_hours,
                flow_m3s: outflow,
            });
        }

        current = routed;
    }

    current
}
