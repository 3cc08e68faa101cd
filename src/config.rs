use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub station_feed_url: String,
    pub basin_catalog_path: String,
    pub cycle_interval_minutes: u64,
    /// Radar is active only when the AEMET key is present; unset forces
    /// gauge-only processing.
    pub aemet_api_key: Option<String>,
    pub radar_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            station_feed_url: env::var("STATION_FEED_URL")?,
            basin_catalog_path: env::var("BASIN_CATALOG_PATH")
                .unwrap_or_else(|_| "basins.json".to_string()),
            cycle_interval_minutes: env::var("CYCLE_INTERVAL_MINUTES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            aemet_api_key: env::var("AEMET_API_KEY").ok().filter(|key| !key.is_empty()),
            radar_url: env::var("RADAR_URL").unwrap_or_else(|_| {
                "https://opendata.aemet.es/opendata/api/red/radar/nacional".to_string()
            }),
        })
    }

    pub fn radar_enabled(&self) -> bool {
        self.aemet_api_key.is_some()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
