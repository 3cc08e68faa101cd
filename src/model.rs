use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed hydrograph time step, in hours.
pub const TIME_STEP_HOURS: f64 = 0.25;

/// A single weather-station observation used by the spatial estimator.
///
/// Produced by the station fetcher after sanitation: precipitation and
/// intensity are floored at zero and zero-coordinate stations are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: Option<f64>,
    /// Rainfall depth over the reporting interval, mm.
    pub precipitation_mm: f64,
    /// Instantaneous rainfall intensity, mm/h.
    pub intensity_mm_h: f64,
    pub online: bool,
    pub observed_at: DateTime<Utc>,
}

/// One decoded radar pixel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RadarPixel {
    pub latitude: f64,
    pub longitude: f64,
    pub dbz: f64,
}

/// Geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.south
            && latitude <= self.north
            && longitude >= self.west
            && longitude <= self.east
    }

    /// Box grown by `margin` degrees on every side.
    pub fn expanded(&self, margin: f64) -> Bounds {
        Bounds {
            north: self.north + margin,
            south: self.south - margin,
            east: self.east + margin,
            west: self.west - margin,
        }
    }
}

/// Muskingum parameters for the channel path from a subcatchment to the
/// basin outlet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoutingParams {
    /// Reach transit time K, hours.
    pub k_hours: f64,
    /// Weighting factor X, dimensionless, valid range [0, 0.5].
    pub x: f64,
    /// Number of identical reaches applied in series.
    pub reaches: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcatchment {
    pub id: String,
    pub area_km2: f64,
    /// SCS curve number, valid range [30, 100].
    pub curve_number: f64,
    pub slope_percent: f64,
    /// Main channel length, km. Derived from area when absent.
    #[serde(default)]
    pub channel_length_km: Option<f64>,
    /// Explicit time of concentration, hours. Derived (Temez) when absent.
    #[serde(default)]
    pub tc_hours: Option<f64>,
    /// Clark storage coefficient R, hours. Defaults to 0.7 * tc.
    #[serde(default)]
    pub storage_hours: Option<f64>,
    pub bounds: Bounds,
    /// Channel routing to the outlet; `None` means direct discharge.
    #[serde(default)]
    pub routing: Option<RoutingParams>,
}

impl Subcatchment {
    /// Rejects unphysical parameters before the subcatchment enters the
    /// runoff model. Degraded *data* never errors; bad *parameters* do.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.area_km2 <= 0.0 {
            return Err(ModelError::NonPositiveArea {
                id: self.id.clone(),
                area_km2: self.area_km2,
            });
        }
        if !(30.0..=100.0).contains(&self.curve_number) {
            return Err(ModelError::CurveNumberOutOfRange {
                id: self.id.clone(),
                curve_number: self.curve_number,
            });
        }
        if let Some(routing) = &self.routing {
            if routing.k_hours <= 0.0 {
                return Err(ModelError::NonPositiveTransitTime {
                    id: self.id.clone(),
                    k_hours: routing.k_hours,
                });
            }
            if !(0.0..=0.5).contains(&routing.x) {
                return Err(ModelError::WeightingOutOfRange {
                    id: self.id.clone(),
                    x: routing.x,
                });
            }
            if routing.reaches < 1 {
                return Err(ModelError::InvalidReachCount {
                    id: self.id.clone(),
                    reaches: routing.reaches,
                });
            }
        }
        Ok(())
    }
}

/// Alert thresholds on composite peak flow, m3/s.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub yellow: f64,
    pub orange: f64,
    pub red: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Basin {
    pub id: String,
    pub name: String,
    /// Catalogue basin type, e.g. "torrential" or "fluvial".
    pub kind: String,
    pub area_km2: f64,
    pub bounds: Bounds,
    pub outlet_latitude: f64,
    pub outlet_longitude: f64,
    pub thresholds: Thresholds,
    pub subcatchments: Vec<Subcatchment>,
}

impl Basin {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.thresholds.yellow < self.thresholds.orange
            && self.thresholds.orange < self.thresholds.red)
        {
            return Err(ModelError::ThresholdsNotIncreasing {
                basin_id: self.id.clone(),
            });
        }
        for sub in &self.subcatchments {
            sub.validate()?;
        }
        Ok(())
    }
}

/// One hydrograph sample: time since cycle start (hours) and flow (m3/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HydrographPoint {
    pub time_hours: f64,
    pub flow_m3s: f64,
}

/// How rainfall over a region was estimated, recorded so consumers can
/// distinguish degraded outputs from full radar-gauge fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    NoData,
    RadarOnly,
    DistributedIdw,
    DistributedFusion,
}

/// Which runoff-model path produced a basin result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelMethod {
    Lumped,
    SemiDistributed,
}

/// Rainfall estimate aggregated over one region's interpolation grid.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AreaEstimate {
    /// Grid mean rainfall depth, mm.
    pub precip_mm: f64,
    /// Grid maximum, read as peak local intensity, mm.
    pub intensity_mm_h: f64,
    pub method: EstimationMethod,
    pub gauge_count: usize,
    pub radar_count: usize,
}

impl AreaEstimate {
    pub fn no_data() -> Self {
        AreaEstimate {
            precip_mm: 0.0,
            intensity_mm_h: 0.0,
            method: EstimationMethod::NoData,
            gauge_count: 0,
            radar_count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubcatchmentResult {
    pub id: String,
    pub area_km2: f64,
    pub curve_number: f64,
    pub tc_hours: f64,
    pub precip_mm: f64,
    pub intensity_mm_h: f64,
    pub effective_rainfall_mm: f64,
    /// Peak of the Clark hydrograph before channel routing.
    pub clark_peak_m3s: f64,
    /// Peak after Muskingum routing; equals the Clark peak when the
    /// subcatchment discharges directly.
    pub routed_peak_m3s: f64,
    /// Rational-method reference peak, reported as a sanity check.
    pub rational_peak_m3s: f64,
    pub method: EstimationMethod,
    pub hydrograph: Vec<HydrographPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasinResult {
    pub basin_id: String,
    pub model: ModelMethod,
    pub estimation: EstimationMethod,
    pub time_step_hours: f64,
    pub hydrograph: Vec<HydrographPoint>,
    pub peak_flow_m3s: f64,
    pub peak_time_hours: f64,
    pub mean_precip_mm: f64,
    pub max_intensity_mm_h: f64,
    pub subcatchments: Vec<SubcatchmentResult>,
    pub computed_at: DateTime<Utc>,
}

/// Colour-coded alert levels, ascending severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl AlertLevel {
    pub fn label(&self) -> &'static str {
        match self {
            AlertLevel::Green => "green",
            AlertLevel::Yellow => "yellow",
            AlertLevel::Orange => "orange",
            AlertLevel::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub basin_id: String,
    pub level: AlertLevel,
    pub message: String,
    pub peak_flow_m3s: f64,
    pub precipitation_mm: f64,
    pub intensity_mm_h: f64,
    pub issued_at: DateTime<Utc>,
}

/// Unphysical-parameter rejections. Always local to one basin: the cycle
/// records the error and continues with the others.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("subcatchment {id}: curve number {curve_number} outside [30, 100]")]
    CurveNumberOutOfRange { id: String, curve_number: f64 },
    #[error("subcatchment {id}: non-positive area {area_km2} km2")]
    NonPositiveArea { id: String, area_km2: f64 },
    #[error("subcatchment {id}: Muskingum K {k_hours} h must be positive")]
    NonPositiveTransitTime { id: String, k_hours: f64 },
    #[error("subcatchment {id}: Muskingum X {x} outside [0, 0.5]")]
    WeightingOutOfRange { id: String, x: f64 },
    #[error("subcatchment {id}: reach count {reaches} below 1")]
    InvalidReachCount { id: String, reaches: u32 },
    #[error("basin {basin_id}: thresholds must be strictly increasing")]
    ThresholdsNotIncreasing { basin_id: String },
}
