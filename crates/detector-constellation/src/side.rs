//! Spacecraft sides that can carry a detector

use crate::ConstellationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// One of the six mounting faces of a spacecraft.
///
/// Variant order is the canonical order of the slot direction table, so
/// sorting sides or iterating [`Side::ALL`] visits them as the table stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "+x")]
    PlusX,
    #[serde(rename = "-x")]
    MinusX,
    #[serde(rename = "+y")]
    PlusY,
    #[serde(rename = "-y")]
    MinusY,
    #[serde(rename = "+z")]
    PlusZ,
    #[serde(rename = "-z")]
    MinusZ,
}

impl Side {
    pub const ALL: [Side; 6] = [
        Side::PlusX,
        Side::MinusX,
        Side::PlusY,
        Side::MinusY,
        Side::PlusZ,
        Side::MinusZ,
    ];

    /// Column of this side in the slot direction table
    pub fn index(&self) -> usize {
        match self {
            Side::PlusX => 0,
            Side::MinusX => 1,
            Side::PlusY => 2,
            Side::MinusY => 3,
            Side::PlusZ => 4,
            Side::MinusZ => 5,
        }
    }

    /// Short label, e.g. `+x`
    pub fn label(&self) -> &'static str {
        match self {
            Side::PlusX => "+x",
            Side::MinusX => "-x",
            Side::PlusY => "+y",
            Side::MinusY => "-y",
            Side::PlusZ => "+z",
            Side::MinusZ => "-z",
        }
    }

    /// Name used in detector names, e.g. `plus_x`
    pub fn name(&self) -> &'static str {
        match self {
            Side::PlusX => "plus_x",
            Side::MinusX => "minus_x",
            Side::PlusY => "plus_y",
            Side::MinusY => "minus_y",
            Side::PlusZ => "plus_z",
            Side::MinusZ => "minus_z",
        }
    }

    /// Parse a list of labels, dropping the ones that name no side.
    pub fn parse_labels<I, S>(labels: I) -> BTreeSet<Side>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .filter_map(|label| match label.as_ref().parse::<Side>() {
                Ok(side) => Some(side),
                Err(_) => {
                    warn!("Ignoring unknown detector side {:?}", label.as_ref());
                    None
                }
            })
            .collect()
    }
}

impl FromStr for Side {
    type Err = ConstellationError;

    /// Accepts both the label (`+x`) and the name (`plus_x`) form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Side::ALL
            .into_iter()
            .find(|side| side.label() == s || side.name() == s)
            .ok_or_else(|| ConstellationError::UnknownSide(s.to_string()))
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        for (i, side) in Side::ALL.iter().enumerate() {
            assert_eq!(side.index(), i);
        }
        let mut shuffled = vec![Side::MinusZ, Side::PlusX, Side::PlusZ, Side::MinusX];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Side::PlusX, Side::MinusX, Side::PlusZ, Side::MinusZ]
        );
    }

    #[test]
    fn test_parse_label_and_name() {
        assert_eq!("+y".parse::<Side>().unwrap(), Side::PlusY);
        assert_eq!("minus_z".parse::<Side>().unwrap(), Side::MinusZ);
        assert_eq!(" -x ".parse::<Side>().unwrap(), Side::MinusX);
        assert!(matches!(
            "+w".parse::<Side>(),
            Err(ConstellationError::UnknownSide(_))
        ));
    }

    #[test]
    fn test_parse_labels_drops_unknown() {
        let sides = Side::parse_labels(["+z", "top", "-x", "+z", ""]);
        assert_eq!(sides.len(), 2);
        assert!(sides.contains(&Side::PlusZ));
        assert!(sides.contains(&Side::MinusX));
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&Side::MinusY).unwrap();
        assert_eq!(json, "\"-y\"");
        let side: Side = serde_json::from_str("\"+z\"").unwrap();
        assert_eq!(side, Side::PlusZ);
    }
}
