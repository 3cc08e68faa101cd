//! Semi-distributed rainfall-runoff modelling: SCS curve-number losses,
//! Clark unit hydrographs, Muskingum channel routing and composite
//! superposition at the basin outlet.

pub mod basin;
pub mod clark;
pub mod muskingum;
pub mod scs;

pub use basin::run_basin_model;
pub use clark::clark_hydrograph;
pub use muskingum::route;
pub use scs::{effective_rainfall, rational_peak, time_of_concentration};
