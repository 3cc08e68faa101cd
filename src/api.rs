use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::model::{
    Alert, Basin, Bounds, EstimationMethod, ModelMethod, SubcatchmentResult, Thresholds,
};
use crate::radar::IntensityBand;
use crate::snapshot::{BasinOutcome, SnapshotStore};

#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
    pub basins: Arc<Vec<Basin>>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub last_cycle: Option<DateTime<Utc>>,
    pub basins: usize,
    pub stations: usize,
}

/// Per-subcatchment slice of the emitted snapshot; the full routed
/// hydrograph stays internal.
#[derive(Serialize)]
pub struct SubcatchmentView {
    pub id: String,
    pub area_km2: f64,
    pub precip_mm: f64,
    pub intensity_mm_h: f64,
    pub effective_rainfall_mm: f64,
    pub clark_peak_m3s: f64,
    pub routed_peak_m3s: f64,
    pub tc_hours: f64,
    pub curve_number: f64,
}

impl From<&SubcatchmentResult> for SubcatchmentView {
    fn from(result: &SubcatchmentResult) -> Self {
        SubcatchmentView {
            id: result.id.clone(),
            area_km2: result.area_km2,
            precip_mm: result.precip_mm,
            intensity_mm_h: result.intensity_mm_h,
            effective_rainfall_mm: result.effective_rainfall_mm,
            clark_peak_m3s: result.clark_peak_m3s,
            routed_peak_m3s: result.routed_peak_m3s,
            tc_hours: result.tc_hours,
            curve_number: result.curve_number,
        }
    }
}

#[derive(Serialize)]
pub struct BasinView {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub area_km2: f64,
    pub bounds: Bounds,
    pub outlet_latitude: f64,
    pub outlet_longitude: f64,
    pub thresholds: Thresholds,
    pub mean_precip_mm: f64,
    pub max_intensity_mm_h: f64,
    pub intensity_band: IntensityBand,
    pub peak_flow_m3s: f64,
    pub peak_time_hours: f64,
    pub model: Option<ModelMethod>,
    pub estimation: Option<EstimationMethod>,
    pub subcatchments: Vec<SubcatchmentView>,
    pub subcatchment_count: usize,
    pub error: Option<String>,
}

fn basin_view(basin: &Basin, outcome: Option<&BasinOutcome>) -> BasinView {
    let mut view = BasinView {
        id: basin.id.clone(),
        name: basin.name.clone(),
        kind: basin.kind.clone(),
        area_km2: basin.area_km2,
        bounds: basin.bounds,
        outlet_latitude: basin.outlet_latitude,
        outlet_longitude: basin.outlet_longitude,
        thresholds: basin.thresholds,
        mean_precip_mm: 0.0,
        max_intensity_mm_h: 0.0,
        intensity_band: IntensityBand::None,
        peak_flow_m3s: 0.0,
        peak_time_hours: 0.0,
        model: None,
        estimation: None,
        subcatchments: Vec::new(),
        subcatchment_count: basin.subcatchments.len(),
        error: None,
    };

    match outcome {
        Some(BasinOutcome::Computed(result)) => {
            view.mean_precip_mm = result.mean_precip_mm;
            view.max_intensity_mm_h = result.max_intensity_mm_h;
            view.intensity_band = IntensityBand::classify(result.max_intensity_mm_h);
            view.peak_flow_m3s = result.peak_flow_m3s;
            view.peak_time_hours = result.peak_time_hours;
            view.model = Some(result.model);
            view.estimation = Some(result.estimation);
            view.subcatchments = result.subcatchments.iter().map(Into::into).collect();
        }
        Some(BasinOutcome::Failed { error, .. }) => {
            view.error = Some(error.clone());
        }
        None => {}
    }

    view
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/basins", get(list_basins))
        .route("/basins/{id}", get(get_basin))
        .route("/alerts", get(list_alerts))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[instrument(skip(state))]
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let snapshot = state.store.load();
    let status = if snapshot.updated_at.is_some() {
        "healthy"
    } else {
        "starting"
    };
    let response = HealthResponse {
        status: status.to_string(),
        last_cycle: snapshot.updated_at,
        basins: state.basins.len(),
        stations: snapshot.stations.len(),
    };
    (StatusCode::OK, Json(response))
}

#[instrument(skip(state))]
async fn list_basins(State(state): State<AppState>) -> Json<Vec<BasinView>> {
    debug!("Listing basins");
    let snapshot = state.store.load();
    let views: Vec<BasinView> = state
        .basins
        .iter()
        .map(|basin| basin_view(basin, snapshot.outcome_for(&basin.id)))
        .collect();

    info!("Listed {} basins", views.len());
    Json(views)
}

#[instrument(skip(state), fields(basin_id = %id))]
async fn get_basin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BasinView>, StatusCode> {
    debug!("Fetching basin {}", id);
    let basin = state
        .basins
        .iter()
        .find(|b| b.id == id)
        .ok_or_else(|| {
            warn!("Basin {} not found in catalogue", id);
            StatusCode::NOT_FOUND
        })?;

    let snapshot = state.store.load();
    Ok(Json(basin_view(basin, snapshot.outcome_for(&basin.id))))
}

#[instrument(skip(state))]
async fn list_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    debug!("Listing active alerts");
    let snapshot = state.store.load();
    Json(snapshot.alerts.clone())
}
