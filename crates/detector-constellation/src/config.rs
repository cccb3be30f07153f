//! Generator configuration (JSON file or CLI)

use crate::generator::{ConstellationGenerator, Mask};
use crate::side::Side;
use crate::table::SlotTable;
use crate::{ConstellationError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Number of slots in the bundled Galileo table
pub const GALILEO_SLOTS: usize = 24;

/// Default effective area (detector units)
pub const DEFAULT_EFFECTIVE_AREA: f64 = 1000.0;

/// Everything needed to build a constellation.
///
/// ```json
/// {
///   "mask": [1, 1, 0, 1],
///   "sides": ["+x", "-x", "+z"],
///   "effective_area": 1000.0,
///   "background_rate": 500.0,
///   "table": "data/custom_slots.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub mask: Mask,
    /// Side labels; unknown labels are ignored
    pub sides: Vec<String>,
    pub effective_area: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_rate: Option<f64>,
    /// Slot table file; the bundled Galileo table when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mask: Mask::all(GALILEO_SLOTS),
            sides: [Side::PlusX, Side::MinusX, Side::PlusY, Side::MinusY]
                .iter()
                .map(|s| s.label().to_string())
                .collect(),
            effective_area: DEFAULT_EFFECTIVE_AREA,
            background_rate: None,
            table: None,
        }
    }
}

impl GeneratorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading generator config from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.effective_area.is_finite() || self.effective_area <= 0.0 {
            return Err(ConstellationError::InvalidConfig(format!(
                "effective_area must be positive, got {}",
                self.effective_area
            )));
        }
        if let Some(rate) = self.background_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ConstellationError::InvalidConfig(format!(
                    "background_rate must be non-negative, got {}",
                    rate
                )));
            }
        }
        Ok(())
    }

    /// Table named by the config, or the bundled Galileo table
    pub fn load_table(&self) -> Result<SlotTable> {
        match &self.table {
            Some(path) => SlotTable::from_json_file(path),
            None => SlotTable::galileo(),
        }
    }

    pub fn build(&self, table: &SlotTable) -> Result<ConstellationGenerator> {
        self.validate()?;
        ConstellationGenerator::from_labels(
            table,
            self.mask.clone(),
            &self.sides,
            self.effective_area,
            self.background_rate,
        )
    }
}
