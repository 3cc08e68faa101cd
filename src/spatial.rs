//! Spatial rainfall estimation: geodesy, inverse-distance interpolation,
//! conditional radar-gauge merging and the per-subcatchment estimator.

pub mod estimator;
pub mod geo;
pub mod idw;
pub mod merge;

pub use estimator::{estimate_basin_rainfall, BasinRainfall};
pub use geo::haversine_km;
pub use idw::{interpolate, WeightedSample};
pub use merge::{gauge_field, merged_field, radar_field, FieldSummary};
