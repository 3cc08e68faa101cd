//! Station feed client: pulls the wide-area weather-station network feed
//! and sanitizes it into [`Station`] observations for the estimator.

use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::fetch_error::FetchError;
use crate::model::Station;

/// One raw feed record. Sensor fields the core never reads (temperature,
/// humidity, pressure, wind) are tolerated and dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObservation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude_m: Option<f64>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub humidity_percent: Option<f64>,
    #[serde(default)]
    pub pressure_hpa: Option<f64>,
    #[serde(default)]
    pub wind_speed_kmh: Option<f64>,
    #[serde(default)]
    pub precipitation_mm: Option<f64>,
    #[serde(default)]
    pub intensity_mm_h: Option<f64>,
    #[serde(default = "online_default")]
    pub online: bool,
    pub observed_at: DateTime<Utc>,
}

fn online_default() -> bool {
    true
}

#[derive(Clone)]
pub struct StationFetcher {
    client: reqwest::Client,
    url: String,
}

impl StationFetcher {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// Fetches the current station feed, retrying transient failures with
    /// exponential backoff before giving up on the cycle.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_stations(&self) -> Result<Vec<Station>, FetchError> {
        let response = (|| async {
            debug!("Sending HTTP request to station feed");
            self.client.get(&self.url).send().await
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(1))
                .with_max_times(3),
        )
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let raw: Vec<RawObservation> = response
            .json()
            .await
            .map_err(|e| FetchError::Payload(e.to_string()))?;
        debug!("Received {} raw observations", raw.len());

        Ok(sanitize(raw))
    }
}

/// Applies the feed contract: precipitation and intensity floored at zero,
/// zero-coordinate stations discarded, and later observations replacing
/// earlier ones with the same id. First-seen order is kept so downstream
/// interpolation is deterministic.
pub fn sanitize(raw: Vec<RawObservation>) -> Vec<Station> {
    let mut stations: Vec<Station> = Vec::with_capacity(raw.len());
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut discarded = 0usize;

    for observation in raw {
        if observation.latitude == 0.0 && observation.longitude == 0.0 {
            discarded += 1;
            continue;
        }

        let station = Station {
            name: observation
                .name
                .unwrap_or_else(|| observation.id.clone()),
            id: observation.id,
            latitude: observation.latitude,
            longitude: observation.longitude,
            altitude_m: observation.altitude_m,
            precipitation_mm: observation.precipitation_mm.unwrap_or(0.0).max(0.0),
            intensity_mm_h: observation.intensity_mm_h.unwrap_or(0.0).max(0.0),
            online: observation.online,
            observed_at: observation.observed_at,
        };

        match index_by_id.get(&station.id) {
            Some(&i) => stations[i] = station,
            None => {
                index_by_id.insert(station.id.clone(), stations.len());
                stations.push(station);
            }
        }
    }

    if discarded > 0 {
        warn!("Discarded {} observations with zero coordinates", discarded);
    }

    stations
}
