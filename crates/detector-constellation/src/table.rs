//! Slot table: per-slot positions and body axes of a constellation
//!
//! JSON layout:
//!
//! ```json
//! {
//!   "name": "galileo-24-3-1",
//!   "positions": [[x, y, z], ...],
//!   "directions": [[[x, y, z], x6], ...]
//! }
//! ```
//!
//! Positions are in km, directions are unit vectors in side order
//! +x, -x, +y, -y, +z, -z.

use crate::side::Side;
use crate::{ConstellationError, Result};
use orbital_mechanics::walker::WalkerDelta;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

const GALILEO_JSON: &str = include_str!("../data/galileo_slots.json");

/// Raw table as found on disk, before shape validation
#[derive(Debug, Deserialize)]
struct RawSlotTable {
    name: Option<String>,
    positions: Option<Vec<Vec<f64>>>,
    directions: Option<Vec<Vec<Vec<f64>>>>,
}

/// Immutable constellation layout shared by every generator built on it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    positions: Vec<[f64; 3]>,
    directions: Vec<[[f64; 3]; 6]>,
}

fn to_vec3(row: &[f64], what: impl FnOnce() -> String) -> Result<[f64; 3]> {
    match row {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(ConstellationError::TableShape(format!(
            "{} has {} components, expected 3",
            what(),
            row.len()
        ))),
    }
}

impl SlotTable {
    pub fn new(positions: Vec<[f64; 3]>, directions: Vec<[[f64; 3]; 6]>) -> Result<Self> {
        if positions.len() != directions.len() {
            return Err(ConstellationError::TableShape(format!(
                "{} positions but {} direction rows",
                positions.len(),
                directions.len()
            )));
        }
        Ok(Self {
            name: None,
            positions,
            directions,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Bundled Galileo 24/3/1 layout
    pub fn galileo() -> Result<Self> {
        Self::from_json_str(GALILEO_JSON)
    }

    /// Table computed from a Walker Delta geometry
    pub fn from_walker(walker: &WalkerDelta) -> Result<Self> {
        let slots = walker.slots()?;
        let (positions, directions): (Vec<_>, Vec<_>) = slots.iter().map(|s| (s.position_km, s.axes)).unzip();

        Ok(Self::new(positions, directions)?.with_name(format!(
            "walker-{}-{}-{}",
            walker.total_satellites, walker.planes, walker.phasing
        )))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawSlotTable = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading slot table from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let raw: RawSlotTable = serde_json::from_reader(reader)?;
        let table = Self::from_raw(raw)?;

        info!("Loaded {} slots", table.len());
        Ok(table)
    }

    fn from_raw(raw: RawSlotTable) -> Result<Self> {
        let positions = raw
            .positions
            .ok_or_else(|| ConstellationError::TableShape("missing 'positions' array".to_string()))?;
        let directions = raw
            .directions
            .ok_or_else(|| ConstellationError::TableShape("missing 'directions' array".to_string()))?;

        let positions = positions
            .iter()
            .enumerate()
            .map(|(i, row)| to_vec3(row, || format!("position {}", i)))
            .collect::<Result<Vec<_>>>()?;

        let directions = directions
            .iter()
            .enumerate()
            .map(|(i, sides)| {
                if sides.len() != Side::ALL.len() {
                    return Err(ConstellationError::TableShape(format!(
                        "slot {} has {} direction vectors, expected {}",
                        i,
                        sides.len(),
                        Side::ALL.len()
                    )));
                }
                let mut row = [[0.0; 3]; 6];
                for (j, v) in sides.iter().enumerate() {
                    row[j] = to_vec3(v, || format!("direction {} of slot {}", j, i))?;
                }
                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;

        let table = Self::new(positions, directions)?;
        Ok(match raw.name {
            Some(name) => table.with_name(name),
            None => table,
        })
    }

    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.to_json_writer(BufWriter::new(file))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, slot: usize) -> Result<[f64; 3]> {
        self.positions
            .get(slot)
            .copied()
            .ok_or(ConstellationError::SlotOutOfRange {
                index: slot,
                slots: self.len(),
            })
    }

    pub fn directions(&self, slot: usize) -> Result<&[[f64; 3]; 6]> {
        self.directions
            .get(slot)
            .ok_or(ConstellationError::SlotOutOfRange {
                index: slot,
                slots: self.len(),
            })
    }

    pub fn direction(&self, slot: usize, side: Side) -> Result<[f64; 3]> {
        Ok(self.directions(slot)?[side.index()])
    }
}
