//! Detector records and their location / pointing values

use crate::side::Side;
use crate::ConstellationError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Sky position and altitude of the spacecraft hosting a detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub ra_deg: f64,
    pub dec_deg: f64,
    /// Distance from the frame origin in km
    pub altitude_km: f64,
    pub obs_time: DateTime<Utc>,
}

/// Sky direction a detector faces
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pointing {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

/// Geometric effective area of a detector
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct EffectiveArea(pub f64);

impl EffectiveArea {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Key of a detector in a constellation: slot index plus mounting side.
///
/// Ordered by slot, then by canonical side order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DetectorId {
    pub slot: usize,
    pub side: Side,
}

impl DetectorId {
    pub fn new(slot: usize, side: Side) -> Self {
        Self { slot, side }
    }

    /// Display name, e.g. `sat_12_plus_z`
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DetectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sat_{}_{}", self.slot, self.side.name())
    }
}

impl FromStr for DetectorId {
    type Err = ConstellationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConstellationError::InvalidName(s.to_string());

        let rest = s.strip_prefix("sat_").ok_or_else(invalid)?;
        let (slot, side) = rest.split_once('_').ok_or_else(invalid)?;
        if slot.is_empty() || !slot.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let slot = slot.parse::<usize>().map_err(|_| invalid())?;
        let side = Side::ALL
            .into_iter()
            .find(|candidate| candidate.name() == side)
            .ok_or_else(invalid)?;

        Ok(Self { slot, side })
    }
}

impl Serialize for DetectorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single detector mounted on one side of one spacecraft
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detector {
    #[serde(rename = "name")]
    pub id: DetectorId,
    pub location: Location,
    pub pointing: Pointing,
    pub effective_area: EffectiveArea,
    pub background_rate: f64,
}

impl Detector {
    pub fn name(&self) -> String {
        self.id.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_epoch;

    #[test]
    fn test_detector_name() {
        assert_eq!(DetectorId::new(0, Side::PlusX).name(), "sat_0_plus_x");
        assert_eq!(DetectorId::new(17, Side::MinusZ).name(), "sat_17_minus_z");
    }

    #[test]
    fn test_parse_name() {
        let id: DetectorId = "sat_23_minus_y".parse().unwrap();
        assert_eq!(id, DetectorId::new(23, Side::MinusY));

        for bad in ["sat_x_plus_x", "sat__plus_x", "sat_1_up", "det_1_plus_x", "sat_1", "sat_+1_plus_x"] {
            assert!(bad.parse::<DetectorId>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_id_ordering() {
        let mut ids = vec![
            DetectorId::new(2, Side::PlusX),
            DetectorId::new(1, Side::MinusZ),
            DetectorId::new(1, Side::PlusY),
            DetectorId::new(10, Side::PlusX),
        ];
        ids.sort();
        let names: Vec<String> = ids.iter().map(DetectorId::name).collect();
        assert_eq!(
            names,
            vec!["sat_1_plus_y", "sat_1_minus_z", "sat_2_plus_x", "sat_10_plus_x"]
        );
    }

    #[test]
    fn test_detector_json() {
        let det = Detector {
            id: DetectorId::new(4, Side::PlusZ),
            location: Location {
                ra_deg: 10.0,
                dec_deg: -5.0,
                altitude_km: 29600.0,
                obs_time: reference_epoch(),
            },
            pointing: Pointing {
                ra_deg: 190.0,
                dec_deg: 5.0,
            },
            effective_area: EffectiveArea(1000.0),
            background_rate: 4000.0,
        };

        let value = serde_json::to_value(&det).unwrap();
        assert_eq!(value["name"], "sat_4_plus_z");
        assert_eq!(value["effective_area"], 1000.0);
        assert_eq!(value["location"]["altitude_km"], 29600.0);
        assert_eq!(value["location"]["obs_time"], "2010-01-01T00:00:00Z");
    }
}
