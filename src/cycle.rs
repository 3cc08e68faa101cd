//! Cycle coordination: collect the feeds, run every basin's pipeline in
//! parallel, classify, and publish one fresh snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, error, instrument, warn};

use crate::alerts::{build_alert, order_by_severity, AlertHistory};
use crate::hydrology::run_basin_model;
use crate::model::{Alert, Basin, RadarPixel, Station};
use crate::radar_fetcher::RadarFetcher;
use crate::snapshot::{BasinOutcome, Snapshot, SnapshotStore};
use crate::spatial::estimate_basin_rainfall;
use crate::station_fetcher::StationFetcher;

pub struct CycleCoordinator {
    basins: Arc<Vec<Basin>>,
    station_fetcher: StationFetcher,
    /// `None` when no AEMET key is configured: gauge-only processing.
    radar_fetcher: Option<RadarFetcher>,
    store: SnapshotStore,
    history: Arc<Mutex<AlertHistory>>,
}

#[derive(Debug, Clone, Copy)]
pub struct CycleSummary {
    pub stations: usize,
    pub basins: usize,
    pub failed_basins: usize,
    pub alerts: usize,
}

/// One basin's full pipeline: estimate, model, classify. Pure with respect
/// to its inputs, so distinct basins can run on separate workers.
fn process_basin(
    basin: &Basin,
    stations: &[Station],
    radar: Option<&[RadarPixel]>,
    now: DateTime<Utc>,
) -> (BasinOutcome, Option<Alert>) {
    let rainfall = estimate_basin_rainfall(basin, stations, radar);

    match run_basin_model(basin, &rainfall, now) {
        Ok(result) => {
            let alert = build_alert(basin, &result, now);
            (BasinOutcome::Computed(result), alert)
        }
        Err(e) => {
            warn!(basin_id = %basin.id, error = %e, "basin failed validation");
            (
                BasinOutcome::Failed {
                    basin_id: basin.id.clone(),
                    error: e.to_string(),
                },
                None,
            )
        }
    }
}

/// Runs every basin pipeline on the blocking pool and collects outcomes in
/// catalogue order, with emitted alerts sorted most severe first.
pub async fn compute_cycle(
    basins: Arc<Vec<Basin>>,
    stations: Arc<Vec<Station>>,
    radar: Arc<Option<Vec<RadarPixel>>>,
    now: DateTime<Utc>,
) -> (Vec<BasinOutcome>, Vec<Alert>) {
    let mut handles = Vec::with_capacity(basins.len());
    for index in 0..basins.len() {
        let basins = basins.clone();
        let stations = stations.clone();
        let radar = radar.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let basin = &basins[index];
            process_basin(basin, &stations, radar.as_deref(), now)
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    let mut alerts = Vec::new();
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok((outcome, alert)) => {
                outcomes.push(outcome);
                alerts.extend(alert);
            }
            Err(e) => {
                let basin_id = basins[index].id.clone();
                error!(basin_id = %basin_id, error = %e, "basin task aborted");
                outcomes.push(BasinOutcome::Failed {
                    basin_id,
                    error: format!("pipeline task aborted: {}", e),
                });
            }
        }
    }

    order_by_severity(&mut alerts);
    (outcomes, alerts)
}

impl CycleCoordinator {
    pub fn new(
        basins: Vec<Basin>,
        station_fetcher: StationFetcher,
        radar_fetcher: Option<RadarFetcher>,
        store: SnapshotStore,
    ) -> Self {
        Self {
            basins: Arc::new(basins),
            station_fetcher,
            radar_fetcher,
            store,
            history: Arc::new(Mutex::new(AlertHistory::new())),
        }
    }

    pub fn store(&self) -> SnapshotStore {
        self.store.clone()
    }

    pub fn history(&self) -> Arc<Mutex<AlertHistory>> {
        self.history.clone()
    }

    /// Runs one full cycle and publishes the snapshot.
    ///
    /// Never fails as a whole: fetch failures fall back to the previous
    /// snapshot's data and per-basin errors become outcome records. The
    /// previous snapshot stays visible until the single publish call.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> CycleSummary {
        let previous = self.store.load();
        let now = Utc::now();

        let stations: Vec<Station> = match self.station_fetcher.fetch_stations().await {
            Ok(stations) => stations,
            Err(e) => {
                warn!(error = %e, "station fetch failed, reusing previous snapshot's stations");
                previous.stations.values().cloned().collect()
            }
        };

        let radar: Option<Vec<RadarPixel>> = match &self.radar_fetcher {
            Some(fetcher) => match fetcher.fetch_grid().await {
                Ok(grid) => Some(grid),
                Err(e) => {
                    warn!(error = %e, "radar fetch failed, reusing previous snapshot's grid");
                    previous.radar.clone()
                }
            },
            None => None,
        };

        debug!(
            stations = stations.len(),
            radar_pixels = radar.as_ref().map(|g| g.len()).unwrap_or(0),
            "cycle inputs collected"
        );

        let station_count = stations.len();
        let stations = Arc::new(stations);
        let radar = Arc::new(radar);

        let (outcomes, alerts) =
            compute_cycle(self.basins.clone(), stations.clone(), radar.clone(), now).await;

        let failed_basins = outcomes.iter().filter(|o| o.result().is_none()).count();
        let summary = CycleSummary {
            stations: station_count,
            basins: outcomes.len(),
            failed_basins,
            alerts: alerts.len(),
        };

        self.history
            .lock()
            .expect("alert history lock poisoned")
            .append(&alerts);

        let stations_map: HashMap<String, Station> = stations
            .iter()
            .map(|s| (s.id.clone(), s.clone()))
            .collect();

        self.store.publish(Snapshot {
            stations: stations_map,
            outcomes,
            radar: Arc::try_unwrap(radar).unwrap_or_else(|shared| (*shared).clone()),
            alerts,
            updated_at: Some(now),
        });

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds, EstimationMethod, Subcatchment, Thresholds};
    use chrono::Utc;

    fn bounds() -> Bounds {
        Bounds {
            north: 39.7,
            south: 39.5,
            east: -0.3,
            west: -0.5,
        }
    }

    fn wet_station(id: &str, precipitation_mm: f64) -> Station {
        Station {
            id: id.to_string(),
            name: id.to_string(),
            latitude: 39.6,
            longitude: -0.4,
            altitude_m: None,
            precipitation_mm,
            intensity_mm_h: precipitation_mm,
            online: true,
            observed_at: Utc::now(),
        }
    }

    fn basin(id: &str, curve_number: f64) -> Basin {
        Basin {
            id: id.to_string(),
            name: id.to_string(),
            kind: "torrential".to_string(),
            area_km2: 100.0,
            bounds: bounds(),
            outlet_latitude: 39.5,
            outlet_longitude: -0.4,
            thresholds: Thresholds {
                yellow: 50.0,
                orange: 150.0,
                red: 300.0,
            },
            subcatchments: vec![Subcatchment {
                id: format!("{}-main", id),
                area_km2: 100.0,
                curve_number,
                slope_percent: 5.0,
                channel_length_km: None,
                tc_hours: Some(2.0),
                storage_hours: None,
                bounds: bounds(),
                routing: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_basins_processed_in_catalogue_order() {
        let basins = Arc::new(vec![basin("a", 75.0), basin("b", 80.0), basin("c", 85.0)]);
        let stations = Arc::new(vec![wet_station("st", 40.0)]);
        let (outcomes, _) =
            compute_cycle(basins, stations, Arc::new(None), Utc::now()).await;

        let ids: Vec<&str> = outcomes.iter().map(|o| o.basin_id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_invalid_basin_does_not_abort_cycle() {
        let mut bad = basin("bad", 75.0);
        bad.subcatchments[0].curve_number = 200.0;
        let basins = Arc::new(vec![basin("good", 80.0), bad]);
        let stations = Arc::new(vec![wet_station("st", 40.0)]);

        let (outcomes, _) =
            compute_cycle(basins, stations, Arc::new(None), Utc::now()).await;

        assert!(outcomes[0].result().is_some());
        assert!(matches!(outcomes[1], BasinOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_dry_cycle_emits_no_alerts() {
        let basins = Arc::new(vec![basin("a", 75.0)]);
        let stations = Arc::new(vec![wet_station("st", 0.0)]);
        let (outcomes, alerts) =
            compute_cycle(basins, stations, Arc::new(None), Utc::now()).await;

        assert!(alerts.is_empty());
        let result = outcomes[0].result().unwrap();
        assert_eq!(result.peak_flow_m3s, 0.0);
        assert_eq!(result.estimation, EstimationMethod::DistributedIdw);
    }

    #[tokio::test]
    async fn test_alerts_come_out_most_severe_first() {
        // The same downpour hits both basins; the ordering contract still
        // holds whatever mix of levels comes out.
        let basins = Arc::new(vec![basin("mild", 75.0), basin("severe", 85.0)]);
        let stations = Arc::new(vec![wet_station("st", 120.0)]);
        let (_, alerts) = compute_cycle(basins, stations, Arc::new(None), Utc::now()).await;

        assert!(!alerts.is_empty());
        for pair in alerts.windows(2) {
            assert!(pair[0].level >= pair[1].level);
        }
    }
}
