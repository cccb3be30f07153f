//! Detector Constellation Generator
//!
//! Builds the detector layout of a satellite constellation: for every active
//! slot of a [`SlotTable`] and every equipped spacecraft side, a [`Detector`]
//! with its sky location, altitude, pointing, effective area and background
//! rate.
//!
//! # Pipeline
//!
//! ```text
//! SlotTable (positions, body axes) ──┐
//! Mask (active slots) ───────────────┼──> ConstellationGenerator ──> Constellation
//! Sides (+x, -x, +y, -y, +z, -z) ────┘                                    │
//!                                                                          └──> SkyPlot (Mollweide)
//! ```
//!
//! Detector names follow `sat_<slot>_<side>` (e.g. `sat_3_minus_y`). All
//! locations are stamped with the fixed reference epoch 2010-01-01T00:00:00Z.

use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod config;
pub mod detector;
pub mod generator;
pub mod plot;
pub mod side;
pub mod table;

pub use config::GeneratorConfig;
pub use detector::{Detector, DetectorId, EffectiveArea, Location, Pointing};
pub use generator::{Constellation, ConstellationGenerator, Mask};
pub use plot::{PlotStyle, SkyPlot};
pub use side::Side;
pub use table::SlotTable;

/// Background rate per unit of effective area when none is given
pub const DEFAULT_BKG_PER_AREA: f64 = 4.0;

/// Reference epoch as Unix seconds (2010-01-01T00:00:00Z)
pub const REFERENCE_EPOCH_SECS: i64 = 1_262_304_000;

#[derive(Error, Debug)]
pub enum ConstellationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed slot table: {0}")]
    TableShape(String),
    #[error("Slot {index} out of range (table has {slots} slots)")]
    SlotOutOfRange { index: usize, slots: usize },
    #[error("Bad coordinates for slot {slot}: {source}")]
    Coordinates {
        slot: usize,
        #[source]
        source: orbital_mechanics::OrbitalError,
    },
    #[error("Orbital geometry error: {0}")]
    Orbital(#[from] orbital_mechanics::OrbitalError),
    #[error("Unknown detector side: {0}")]
    UnknownSide(String),
    #[error("Invalid detector name: {0}")]
    InvalidName(String),
    #[error("Invalid mask: {0}")]
    InvalidMask(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("There are no instantiated detectors")]
    EmptyConstellation,
    #[error("Plot rendering failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, ConstellationError>;

/// Observation time shared by every detector location
pub fn reference_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(REFERENCE_EPOCH_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
