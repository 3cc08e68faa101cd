//! Basin catalogue loading: a declarative JSON file enumerating basins and
//! their subcatchments, read once at startup and immutable thereafter.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::model::{Basin, ModelError};

/// Subcatchment areas may diverge from the declared basin area by this
/// relative amount before the loader warns.
const AREA_MISMATCH_TOLERANCE: f64 = 0.10;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read basin catalogue: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse basin catalogue: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid basin catalogue entry: {0}")]
    Invalid(#[from] ModelError),
    #[error("duplicate basin id {0}")]
    DuplicateBasin(String),
}

/// Loads and validates the basin catalogue from `path`.
///
/// Validation is strict here, unlike the per-cycle model checks: a broken
/// catalogue should stop the service at startup, not degrade every cycle.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<Basin>, CatalogError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let basins = parse_catalog(&contents)?;
    info!(
        basins = basins.len(),
        path = %path.as_ref().display(),
        "basin catalogue loaded"
    );
    Ok(basins)
}

pub fn parse_catalog(contents: &str) -> Result<Vec<Basin>, CatalogError> {
    let basins: Vec<Basin> = serde_json::from_str(contents)?;

    for (i, basin) in basins.iter().enumerate() {
        if basins[..i].iter().any(|other| other.id == basin.id) {
            return Err(CatalogError::DuplicateBasin(basin.id.clone()));
        }
        basin.validate()?;

        let sub_area: f64 = basin.subcatchments.iter().map(|s| s.area_km2).sum();
        if !basin.subcatchments.is_empty() && basin.area_km2 > 0.0 {
            let mismatch = (sub_area - basin.area_km2).abs() / basin.area_km2;
            if mismatch > AREA_MISMATCH_TOLERANCE {
                warn!(
                    basin_id = %basin.id,
                    basin_area_km2 = basin.area_km2,
                    subcatchment_area_km2 = sub_area,
                    "subcatchment areas diverge from basin area"
                );
            }
        }
    }

    Ok(basins)
}
