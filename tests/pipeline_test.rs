// End-to-end pipeline scenarios: feed observations in, check the composite
// hydrograph, method tags and emitted alerts that come out.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use flood_watch_service::cycle::compute_cycle;
use flood_watch_service::model::{
    AlertLevel, Basin, Bounds, EstimationMethod, ModelMethod, RadarPixel, RoutingParams, Station,
    Subcatchment, Thresholds,
};

fn basin_bounds() -> Bounds {
    Bounds {
        north: 39.70,
        south: 39.50,
        east: -0.30,
        west: -0.50,
    }
}

fn station(id: &str, latitude: f64, longitude: f64, precip_mm: f64, intensity_mm_h: f64) -> Station {
    Station {
        id: id.to_string(),
        name: id.to_string(),
        latitude,
        longitude,
        altitude_m: Some(45.0),
        precipitation_mm: precip_mm,
        intensity_mm_h,
        online: true,
        observed_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap(),
    }
}

fn single_sub_basin(routing: Option<RoutingParams>) -> Basin {
    Basin {
        id: "poyo".to_string(),
        name: "Rambla del Poyo".to_string(),
        kind: "torrential".to_string(),
        area_km2: 100.0,
        bounds: basin_bounds(),
        outlet_latitude: 39.50,
        outlet_longitude: -0.40,
        thresholds: Thresholds {
            yellow: 50.0,
            orange: 150.0,
            red: 300.0,
        },
        subcatchments: vec![Subcatchment {
            id: "poyo-main".to_string(),
            area_km2: 100.0,
            curve_number: 75.0,
            slope_percent: 5.0,
            channel_length_km: None,
            tc_hours: Some(2.0),
            storage_hours: None,
            bounds: basin_bounds(),
            routing,
        }],
    }
}

#[tokio::test]
async fn test_dry_basin_stays_green() {
    let basins = Arc::new(vec![single_sub_basin(None)]);
    let stations = Arc::new(vec![
        station("s1", 39.60, -0.40, 0.0, 0.0),
        station("s2", 39.55, -0.35, 0.0, 0.0),
    ]);

    let (outcomes, alerts) =
        compute_cycle(basins, stations, Arc::new(None), Utc::now()).await;

    let result = outcomes[0].result().expect("basin should compute");
    assert_eq!(result.peak_flow_m3s, 0.0);
    assert_eq!(result.model, ModelMethod::SemiDistributed);
    assert_eq!(result.estimation, EstimationMethod::DistributedIdw);
    assert!(alerts.is_empty(), "dry basin must not emit an alert");
}

#[tokio::test]
async fn test_heavy_rain_emits_alert_with_positive_peak() {
    let basins = Arc::new(vec![single_sub_basin(None)]);
    let stations = Arc::new(vec![
        station("s1", 39.60, -0.40, 80.0, 40.0),
        station("s2", 39.55, -0.35, 70.0, 35.0),
    ]);

    let (outcomes, alerts) =
        compute_cycle(basins, stations, Arc::new(None), Utc::now()).await;

    let result = outcomes[0].result().expect("basin should compute");
    assert!(result.peak_flow_m3s > 0.0);
    assert!(result.subcatchments[0].effective_rainfall_mm > 0.0);

    assert_eq!(alerts.len(), 1);
    // Intensity around 40 mm/h crosses the orange intensity floor.
    assert!(alerts[0].level >= AlertLevel::Orange);
    assert_eq!(alerts[0].basin_id, "poyo");
}

#[tokio::test]
async fn test_channel_routing_attenuates_and_delays_the_peak() {
    let routing = RoutingParams {
        k_hours: 1.0,
        x: 0.1,
        reaches: 2,
    };
    let stations = Arc::new(vec![station("s1", 39.60, -0.40, 60.0, 20.0)]);

    let (routed_outcomes, _) = compute_cycle(
        Arc::new(vec![single_sub_basin(Some(routing))]),
        stations.clone(),
        Arc::new(None),
        Utc::now(),
    )
    .await;
    let (direct_outcomes, _) = compute_cycle(
        Arc::new(vec![single_sub_basin(None)]),
        stations,
        Arc::new(None),
        Utc::now(),
    )
    .await;

    let routed = routed_outcomes[0].result().unwrap();
    let direct = direct_outcomes[0].result().unwrap();

    let routed_sub = &routed.subcatchments[0];
    assert!(routed_sub.routed_peak_m3s <= routed_sub.clark_peak_m3s + 1e-6);
    assert!(routed.peak_flow_m3s < direct.peak_flow_m3s);
    assert!(routed.peak_time_hours >= direct.peak_time_hours);
}

#[tokio::test]
async fn test_single_gauge_at_outlet_drives_the_basin() {
    let basins = Arc::new(vec![single_sub_basin(None)]);
    let stations = Arc::new(vec![station("outlet", 39.50, -0.40, 30.0, 12.0)]);

    let (outcomes, _) = compute_cycle(basins, stations, Arc::new(None), Utc::now()).await;

    let result = outcomes[0].result().unwrap();
    assert_eq!(result.estimation, EstimationMethod::DistributedIdw);
    assert!(result.mean_precip_mm > 0.0);
    assert!(result.peak_flow_m3s > 0.0);
}

#[tokio::test]
async fn test_radar_only_cycle_tags_method() {
    let basins = Arc::new(vec![single_sub_basin(None)]);
    let pixels: Vec<RadarPixel> = (0..5)
        .map(|i| RadarPixel {
            latitude: 39.55 + 0.02 * i as f64,
            longitude: -0.40,
            dbz: 40.0,
        })
        .collect();

    let (outcomes, _) = compute_cycle(
        basins,
        Arc::new(Vec::new()),
        Arc::new(Some(pixels)),
        Utc::now(),
    )
    .await;

    let result = outcomes[0].result().unwrap();
    assert_eq!(result.estimation, EstimationMethod::RadarOnly);
    assert!(result.mean_precip_mm > 0.0);
}

#[tokio::test]
async fn test_no_data_cycle_yields_zeros_not_errors() {
    let basins = Arc::new(vec![single_sub_basin(None)]);

    let (outcomes, alerts) = compute_cycle(
        basins,
        Arc::new(Vec::new()),
        Arc::new(None),
        Utc::now(),
    )
    .await;

    let result = outcomes[0].result().expect("no data is not an error");
    assert_eq!(result.estimation, EstimationMethod::NoData);
    assert_eq!(result.peak_flow_m3s, 0.0);
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn test_pipeline_is_deterministic_across_runs() {
    let basins = Arc::new(vec![single_sub_basin(Some(RoutingParams {
        k_hours: 0.8,
        x: 0.2,
        reaches: 1,
    }))]);
    let stations = Arc::new(vec![
        station("s1", 39.60, -0.40, 45.0, 22.0),
        station("s2", 39.55, -0.35, 55.0, 28.0),
    ]);
    let pixels = Arc::new(Some(vec![
        RadarPixel {
            latitude: 39.58,
            longitude: -0.38,
            dbz: 38.0,
        },
        RadarPixel {
            latitude: 39.53,
            longitude: -0.42,
            dbz: 30.0,
        },
    ]));
    let now = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();

    let (first_outcomes, first_alerts) =
        compute_cycle(basins.clone(), stations.clone(), pixels.clone(), now).await;
    let (second_outcomes, second_alerts) =
        compute_cycle(basins, stations, pixels, now).await;

    let first = serde_json::to_string(&first_outcomes).unwrap();
    let second = serde_json::to_string(&second_outcomes).unwrap();
    assert_eq!(first, second, "same inputs must reproduce the same snapshot");

    let first_alerts = serde_json::to_string(&first_alerts).unwrap();
    let second_alerts = serde_json::to_string(&second_alerts).unwrap();
    assert_eq!(first_alerts, second_alerts);
}

#[tokio::test]
async fn test_two_subcatchment_superposition_exceeds_each_part() {
    let upper = Bounds {
        north: 39.70,
        south: 39.60,
        east: -0.30,
        west: -0.50,
    };
    let lower = Bounds {
        north: 39.60,
        south: 39.50,
        east: -0.30,
        west: -0.50,
    };
    let mut basin = single_sub_basin(None);
    basin.subcatchments = vec![
        Subcatchment {
            id: "upper".to_string(),
            area_km2: 60.0,
            curve_number: 80.0,
            slope_percent: 6.0,
            channel_length_km: None,
            tc_hours: Some(2.0),
            storage_hours: None,
            bounds: upper,
            routing: None,
        },
        Subcatchment {
            id: "lower".to_string(),
            area_km2: 40.0,
            curve_number: 75.0,
            slope_percent: 4.0,
            channel_length_km: None,
            tc_hours: Some(2.0),
            storage_hours: None,
            bounds: lower,
            routing: None,
        },
    ];

    let stations = Arc::new(vec![
        station("up", 39.65, -0.40, 60.0, 25.0),
        station("down", 39.55, -0.40, 60.0, 25.0),
    ]);

    let (outcomes, _) = compute_cycle(
        Arc::new(vec![basin]),
        stations,
        Arc::new(None),
        Utc::now(),
    )
    .await;

    let result = outcomes[0].result().unwrap();
    let sub_peaks: Vec<f64> = result
        .subcatchments
        .iter()
        .map(|s| s.routed_peak_m3s)
        .collect();
    // Same tc on both, so the composite peak beats either part alone.
    assert!(result.peak_flow_m3s > sub_peaks[0]);
    assert!(result.peak_flow_m3s > sub_peaks[1]);
    // And never exceeds the sum of the parts.
    assert!(result.peak_flow_m3s <= sub_peaks[0] + sub_peaks[1] + 1e-9);
}
