//! Radar product client. The national product is served in two steps: a
//! metadata envelope pointing at the decoded reflectivity grid, then the
//! grid itself as (lat, lon, dBZ) pixels.

use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::fetch_error::FetchError;
use crate::model::RadarPixel;

/// AEMET-style product envelope; `datos` carries the payload URL.
#[derive(Debug, Deserialize)]
struct ProductEnvelope {
    #[serde(default)]
    estado: Option<u16>,
    #[serde(default)]
    datos: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPixel {
    latitude: f64,
    longitude: f64,
    dbz: f64,
}

#[derive(Clone)]
pub struct RadarFetcher {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl RadarFetcher {
    pub fn new(url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }

    /// Fetches the decoded reflectivity grid for the current product.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_grid(&self) -> Result<Vec<RadarPixel>, FetchError> {
        let envelope = (|| async {
            debug!("Requesting radar product envelope");
            self.client
                .get(&self.url)
                .query(&[("api_key", self.api_key.as_str())])
                .send()
                .await
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(1))
                .with_max_times(3),
        )
        .await?;

        let status = envelope.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let envelope: ProductEnvelope = envelope
            .json()
            .await
            .map_err(|e| FetchError::Payload(e.to_string()))?;

        if let Some(estado) = envelope.estado {
            if estado != 200 {
                return Err(FetchError::RadarUnavailable(format!(
                    "product estado {}",
                    estado
                )));
            }
        }

        let data_url = envelope
            .datos
            .ok_or_else(|| FetchError::RadarUnavailable("envelope carries no data URL".into()))?;

        debug!("Fetching decoded reflectivity grid");
        let response = self.client.get(&data_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let pixels: Vec<RawPixel> = response
            .json()
            .await
            .map_err(|e| FetchError::Payload(e.to_string()))?;
        debug!("Decoded {} radar pixels", pixels.len());

        Ok(pixels
            .into_iter()
            .map(|p| RadarPixel {
                latitude: p.latitude,
                longitude: p.longitude,
                dbz: p.dbz,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parses_with_missing_fields() {
        let envelope: ProductEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.datos.is_none());
        assert!(envelope.estado.is_none());
    }

    #[test]
    fn test_pixel_grid_parses() {
        let json = r#"[
            { "latitude": 39.50, "longitude": -0.40, "dbz": 32.5 },
            { "latitude": 39.52, "longitude": -0.40, "dbz": -5.0 }
        ]"#;
        let pixels: Vec<RawPixel> = serde_json::from_str(json).unwrap();
        assert_eq!(pixels.len(), 2);
        assert_eq!(pixels[1].dbz, -5.0);
    }
}
