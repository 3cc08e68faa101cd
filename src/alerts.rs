//! Alert classification over composite peak flow, basin rainfall and peak
//! intensity, plus the rolling alert history.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::model::{Alert, AlertLevel, Basin, BasinResult};

/// Intensity (mm/h) and precipitation (mm) floors per level, applied
/// alongside the basin's flow thresholds.
const RED_INTENSITY_MM_H: f64 = 60.0;
const RED_PRECIP_MM: f64 = 100.0;
const ORANGE_INTENSITY_MM_H: f64 = 30.0;
const ORANGE_PRECIP_MM: f64 = 50.0;
const YELLOW_INTENSITY_MM_H: f64 = 15.0;
const YELLOW_PRECIP_MM: f64 = 20.0;

/// History keeps at most this many alerts.
const HISTORY_CAPACITY: usize = 1000;

/// On overflow the history is trimmed back to the most recent this-many.
const HISTORY_RETAIN: usize = 500;

/// Classifies one basin result. First match wins, checked from red down,
/// so raising any input can only raise the level.
pub fn classify(basin: &Basin, result: &BasinResult) -> AlertLevel {
    let flow = result.peak_flow_m3s;
    let intensity = result.max_intensity_mm_h;
    let precip = result.mean_precip_mm;
    let thresholds = &basin.thresholds;

    if flow >= thresholds.red || intensity >= RED_INTENSITY_MM_H || precip >= RED_PRECIP_MM {
        AlertLevel::Red
    } else if flow >= thresholds.orange
        || intensity >= ORANGE_INTENSITY_MM_H
        || precip >= ORANGE_PRECIP_MM
    {
        AlertLevel::Orange
    } else if flow >= thresholds.yellow
        || intensity >= YELLOW_INTENSITY_MM_H
        || precip >= YELLOW_PRECIP_MM
    {
        AlertLevel::Yellow
    } else {
        AlertLevel::Green
    }
}

/// Builds the emitted alert for a basin result, or `None` when the basin
/// classifies green.
pub fn build_alert(
    basin: &Basin,
    result: &BasinResult,
    issued_at: DateTime<Utc>,
) -> Option<Alert> {
    let level = classify(basin, result);
    if level == AlertLevel::Green {
        return None;
    }

    info!(
        basin_id = %basin.id,
        level = level.label(),
        peak_m3s = result.peak_flow_m3s,
        "basin alert raised"
    );

    Some(Alert {
        basin_id: basin.id.clone(),
        level,
        message: format!(
            "{}: {} alert, peak flow {:.1} m3/s, rainfall {:.1} mm, intensity {:.1} mm/h",
            basin.name,
            level.label(),
            result.peak_flow_m3s,
            result.mean_precip_mm,
            result.max_intensity_mm_h
        ),
        peak_flow_m3s: result.peak_flow_m3s,
        precipitation_mm: result.mean_precip_mm,
        intensity_mm_h: result.max_intensity_mm_h,
        issued_at,
    })
}

/// Sorts emitted alerts most severe first, stable within a severity so
/// basin catalogue order is preserved.
pub fn order_by_severity(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| b.level.cmp(&a.level));
}

/// Rolling record of emitted alerts across cycles. Bounded: past 1000
/// entries, only the most recent 500 survive.
#[derive(Debug, Default)]
pub struct AlertHistory {
    entries: Vec<Alert>,
}

impl AlertHistory {
    pub fn new() -> Self {
        AlertHistory {
            entries: Vec::new(),
        }
    }

    pub fn append(&mut self, alerts: &[Alert]) {
        self.entries.extend_from_slice(alerts);
        if self.entries.len() > HISTORY_CAPACITY {
            let drop = self.entries.len() - HISTORY_RETAIN;
            self.entries.drain(..drop);
        }
    }

    pub fn entries(&self) -> &[Alert] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
