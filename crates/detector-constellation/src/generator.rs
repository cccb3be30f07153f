//! Constellation generation
//!
//! Single pass over the slot table: every active slot gets a location
//! (RA/Dec of its position, altitude = |position|), every selected side of
//! that slot gets a detector pointing along the side's body axis.

use crate::detector::{Detector, DetectorId, EffectiveArea, Location, Pointing};
use crate::side::Side;
use crate::table::SlotTable;
use crate::{reference_epoch, ConstellationError, Result, DEFAULT_BKG_PER_AREA};
use orbital_mechanics::transforms::cartesian_to_spherical;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::str::FromStr;
use tracing::{debug, info};

/// Mask flag as it may appear in config files: `true`, `1`, `0.0`, ...
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum MaskFlag {
    Bool(bool),
    Number(f64),
}

impl MaskFlag {
    fn is_set(self) -> bool {
        match self {
            MaskFlag::Bool(b) => b,
            MaskFlag::Number(n) => n != 0.0,
        }
    }
}

/// Selection of active slots, one flag per slot index
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Mask(Vec<bool>);

impl Mask {
    /// Every slot active
    pub fn all(slots: usize) -> Self {
        Self(vec![true; slots])
    }

    /// No slot active
    pub fn none(slots: usize) -> Self {
        Self(vec![false; slots])
    }

    /// Integer flags, non-zero is active
    pub fn from_flags<I: IntoIterator<Item = i64>>(flags: I) -> Self {
        Self(flags.into_iter().map(|f| f != 0).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.0.get(slot).copied().unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    /// Indices of active slots, ascending
    pub fn active_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &active)| active.then_some(i))
    }
}

impl From<Vec<bool>> for Mask {
    fn from(flags: Vec<bool>) -> Self {
        Self(flags)
    }
}

impl<'de> Deserialize<'de> for Mask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let flags = Vec::<MaskFlag>::deserialize(deserializer)?;
        Ok(Self(flags.into_iter().map(MaskFlag::is_set).collect()))
    }
}

impl From<Mask> for Vec<bool> {
    fn from(mask: Mask) -> Self {
        mask.0
    }
}

impl FromStr for Mask {
    type Err = ConstellationError;

    /// Parses a digit string such as `"110011"`; `_` and whitespace are
    /// ignored so long masks can be grouped (`"11111111_00000000"`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(ConstellationError::InvalidMask(format!(
                    "unexpected character {:?} in {:?}",
                    other, s
                ))),
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Detectors of a constellation keyed by slot and side.
///
/// Iteration is slot ascending, then canonical side order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constellation {
    detectors: BTreeMap<DetectorId, Detector>,
}

impl Constellation {
    fn insert(&mut self, detector: Detector) {
        self.detectors.insert(detector.id, detector);
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn get(&self, id: &DetectorId) -> Option<&Detector> {
        self.detectors.get(id)
    }

    /// Lookup by display name, e.g. `sat_3_minus_y`
    pub fn get_by_name(&self, name: &str) -> Option<&Detector> {
        let id = name.parse::<DetectorId>().ok()?;
        self.detectors.get(&id)
    }

    pub fn contains(&self, id: &DetectorId) -> bool {
        self.detectors.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &DetectorId> {
        self.detectors.keys()
    }

    pub fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.detectors.keys().map(DetectorId::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DetectorId, &Detector)> {
        self.detectors.iter()
    }

    pub fn detectors(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.values()
    }
}

impl<'a> IntoIterator for &'a Constellation {
    type Item = (&'a DetectorId, &'a Detector);
    type IntoIter = std::collections::btree_map::Iter<'a, DetectorId, Detector>;

    fn into_iter(self) -> Self::IntoIter {
        self.detectors.iter()
    }
}

impl Serialize for Constellation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.detectors.len()))?;
        for (id, detector) in &self.detectors {
            map.serialize_entry(&id.name(), detector)?;
        }
        map.end()
    }
}

/// Builds and owns the detector constellation for one mask / side selection
#[derive(Debug, Clone, Serialize)]
pub struct ConstellationGenerator {
    mask: Mask,
    sides: BTreeSet<Side>,
    effective_area: EffectiveArea,
    background_rate: f64,
    constellation: Constellation,
}

impl ConstellationGenerator {
    /// Generate the detectors for every active slot and selected side.
    ///
    /// `background_rate` defaults to 4 × `effective_area`. A mask shorter
    /// than the table leaves trailing slots unused; an active flag past the
    /// end of the table fails with [`ConstellationError::SlotOutOfRange`].
    pub fn new(
        table: &SlotTable,
        mask: impl Into<Mask>,
        sides: impl IntoIterator<Item = Side>,
        effective_area: f64,
        background_rate: Option<f64>,
    ) -> Result<Self> {
        let mask = mask.into();
        let sides: BTreeSet<Side> = sides.into_iter().collect();
        let background_rate = background_rate.unwrap_or(DEFAULT_BKG_PER_AREA * effective_area);

        let constellation = generate(table, &mask, &sides, effective_area, background_rate)?;

        info!(
            "Generated {} detectors on {} of {} slots ({} sides each)",
            constellation.len(),
            mask.active_count(),
            table.len(),
            sides.len()
        );

        Ok(Self {
            mask,
            sides,
            effective_area: EffectiveArea(effective_area),
            background_rate,
            constellation,
        })
    }

    /// Same as [`ConstellationGenerator::new`] with sides given as labels;
    /// unknown labels are ignored.
    pub fn from_labels<I, S>(
        table: &SlotTable,
        mask: impl Into<Mask>,
        labels: I,
        effective_area: f64,
        background_rate: Option<f64>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sides = Side::parse_labels(labels);
        Self::new(table, mask, sides, effective_area, background_rate)
    }

    pub fn constellation(&self) -> &Constellation {
        &self.constellation
    }

    pub fn effective_area(&self) -> f64 {
        self.effective_area.value()
    }

    pub fn background_rate(&self) -> f64 {
        self.background_rate
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn sides(&self) -> &BTreeSet<Side> {
        &self.sides
    }

    pub fn len(&self) -> usize {
        self.constellation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constellation.is_empty()
    }

    /// Write the constellation as a JSON object keyed by detector name
    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.constellation)?;
        Ok(())
    }
}

fn generate(
    table: &SlotTable,
    mask: &Mask,
    sides: &BTreeSet<Side>,
    effective_area: f64,
    background_rate: f64,
) -> Result<Constellation> {
    let mut constellation = Constellation::default();
    let obs_time = reference_epoch();

    for slot in mask.active_slots() {
        let [x, y, z] = table.position(slot)?;
        let position = cartesian_to_spherical(x, y, z)
            .map_err(|source| ConstellationError::Coordinates { slot, source })?;

        // shared by every detector on this spacecraft
        let location = Location {
            ra_deg: position.ra_deg,
            dec_deg: position.dec_deg,
            altitude_km: position.distance,
            obs_time,
        };

        let axes = table.directions(slot)?;
        let mut pointings = [Pointing { ra_deg: 0.0, dec_deg: 0.0 }; 6];
        for side in Side::ALL {
            let [x, y, z] = axes[side.index()];
            let dir = cartesian_to_spherical(x, y, z)
                .map_err(|source| ConstellationError::Coordinates { slot, source })?;
            pointings[side.index()] = Pointing {
                ra_deg: dir.ra_deg,
                dec_deg: dir.dec_deg,
            };
        }

        debug!(
            "Slot {}: ra={:.3} dec={:.3} alt={:.1} km",
            slot, location.ra_deg, location.dec_deg, location.altitude_km
        );

        for &side in sides {
            constellation.insert(Detector {
                id: DetectorId::new(slot, side),
                location,
                pointing: pointings[side.index()],
                effective_area: EffectiveArea(effective_area),
                background_rate,
            });
        }
    }

    Ok(constellation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_mechanics::transforms::norm;
    use orbital_mechanics::walker::WalkerDelta;
    use proptest::prelude::*;

    const FOUR_SIDES: [Side; 4] = [Side::PlusX, Side::MinusX, Side::PlusY, Side::MinusY];

    fn galileo() -> SlotTable {
        SlotTable::galileo().unwrap()
    }

    #[test]
    fn test_constellation_generator() {
        let generator = ConstellationGenerator::from_labels(
            &galileo(),
            Mask::from_flags(vec![1; 24]),
            ["+x", "-x", "+y", "-y"],
            1000.0,
            Some(500.0),
        )
        .unwrap();

        assert_eq!(generator.constellation().len(), 4 * 24);
        assert_eq!(generator.effective_area(), 1000.0);
        assert_eq!(generator.background_rate(), 500.0);
    }

    #[test]
    fn test_default_background_rate() {
        let generator =
            ConstellationGenerator::new(&galileo(), Mask::all(24), [Side::PlusZ], 250.0, None)
                .unwrap();
        assert_eq!(generator.background_rate(), 1000.0);
        for det in generator.constellation().detectors() {
            assert_eq!(det.background_rate, 1000.0);
            assert_eq!(det.effective_area, EffectiveArea(250.0));
        }
    }

    #[test]
    fn test_empty_mask() {
        let generator =
            ConstellationGenerator::new(&galileo(), Mask::none(24), Side::ALL, 1000.0, None)
                .unwrap();
        assert!(generator.is_empty());
        assert_eq!(generator.len(), 0);
    }

    #[test]
    fn test_names_and_order() {
        let mask: Mask = "101".parse().unwrap();
        let generator = ConstellationGenerator::new(
            &galileo(),
            mask,
            [Side::MinusZ, Side::PlusX],
            1000.0,
            None,
        )
        .unwrap();

        let names: Vec<String> = generator.constellation().names().collect();
        assert_eq!(
            names,
            vec!["sat_0_plus_x", "sat_0_minus_z", "sat_2_plus_x", "sat_2_minus_z"]
        );
        assert!(generator.constellation().get_by_name("sat_1_plus_x").is_none());
        assert!(generator.constellation().get_by_name("garbage").is_none());
    }

    #[test]
    fn test_location_and_pointing() {
        let table = galileo();
        let generator =
            ConstellationGenerator::new(&table, Mask::all(24), Side::ALL, 1000.0, None).unwrap();
        let constellation = generator.constellation();

        // slot 0 sits on the x axis and flies towards ra=90, dec=56
        let det = constellation.get_by_name("sat_0_plus_x").unwrap();
        assert!(det.location.ra_deg.abs() < 1e-6);
        assert!(det.location.dec_deg.abs() < 1e-6);
        assert!((det.pointing.ra_deg - 90.0).abs() < 1e-4);
        assert!((det.pointing.dec_deg - 56.0).abs() < 1e-4);

        // +z looks at the Earth, i.e. opposite to the location
        let nadir = constellation.get_by_name("sat_0_plus_z").unwrap();
        assert!((nadir.pointing.ra_deg - 180.0).abs() < 1e-4);

        for (id, det) in constellation {
            let [x, y, z] = table.position(id.slot).unwrap();
            assert!((det.location.altitude_km - norm(x, y, z)).abs() < 1e-9);
            assert_eq!(det.location.obs_time, reference_epoch());
            assert!((0.0..360.0).contains(&det.pointing.ra_deg));
            assert!((-90.0..=90.0).contains(&det.pointing.dec_deg));
        }

        // every side of one slot shares the same location
        let a = constellation.get_by_name("sat_5_plus_y").unwrap();
        let b = constellation.get_by_name("sat_5_minus_z").unwrap();
        assert_eq!(a.location, b.location);
    }

    #[test]
    fn test_mask_longer_than_table() {
        let mut flags = vec![0; 24];
        flags.push(1);
        let err =
            ConstellationGenerator::new(&galileo(), Mask::from_flags(flags), FOUR_SIDES, 1.0, None)
                .unwrap_err();
        assert!(matches!(
            err,
            ConstellationError::SlotOutOfRange { index: 24, slots: 24 }
        ));

        // inactive trailing flags are never looked up
        let generator = ConstellationGenerator::new(
            &galileo(),
            Mask::from_flags(vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            FOUR_SIDES,
            1.0,
            None,
        )
        .unwrap();
        assert_eq!(generator.len(), 4);
    }

    #[test]
    fn test_mask_shorter_than_table() {
        let generator =
            ConstellationGenerator::new(&galileo(), Mask::all(3), [Side::PlusZ], 1.0, None).unwrap();
        assert_eq!(generator.len(), 3);
        assert!(generator.constellation().ids().all(|id| id.slot < 3));
    }

    #[test]
    fn test_bad_coordinates() {
        let mut axes = [[1.0, 0.0, 0.0]; 6];
        axes[3] = [0.0, 0.0, 0.0];
        let table = SlotTable::new(vec![[7000.0, 0.0, 0.0]], vec![axes]).unwrap();

        // the zero axis is converted even when its side is not selected
        let err = ConstellationGenerator::new(&table, Mask::all(1), [Side::PlusX], 1.0, None)
            .unwrap_err();
        assert!(matches!(err, ConstellationError::Coordinates { slot: 0, .. }));

        let table = SlotTable::new(vec![[f64::NAN, 0.0, 0.0]], vec![[[1.0, 0.0, 0.0]; 6]]).unwrap();
        assert!(ConstellationGenerator::new(&table, Mask::all(1), [Side::PlusX], 1.0, None).is_err());
    }

    #[test]
    fn test_mask_parsing() {
        let mask: Mask = "1111_0000 11".parse().unwrap();
        assert_eq!(mask.len(), 10);
        assert_eq!(mask.active_count(), 6);
        assert_eq!(mask.active_slots().collect::<Vec<_>>(), vec![0, 1, 2, 3, 8, 9]);
        assert!(matches!(
            "10x1".parse::<Mask>(),
            Err(ConstellationError::InvalidMask(_))
        ));
    }

    #[test]
    fn test_mask_serde() {
        let mask: Mask = serde_json::from_str("[1, 0, true, false, 2.0, 0.0]").unwrap();
        assert_eq!(mask, Mask::from(vec![true, false, true, false, true, false]));
        assert_eq!(
            serde_json::to_string(&mask).unwrap(),
            "[true,false,true,false,true,false]"
        );
    }

    #[test]
    fn test_json_export() {
        let generator =
            ConstellationGenerator::new(&galileo(), "11".parse::<Mask>().unwrap(), [Side::MinusY], 10.0, None)
                .unwrap();
        let mut buf = Vec::new();
        generator.to_json_writer(&mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["sat_1_minus_y"]["name"], "sat_1_minus_y");
        assert_eq!(object["sat_1_minus_y"]["background_rate"], 40.0);
    }

    proptest! {
        #[test]
        fn prop_detector_count(
            flags in proptest::collection::vec(any::<bool>(), 0..=24),
            side_bits in 0u8..64,
            area in 1.0f64..1.0e4,
        ) {
            let sides: Vec<Side> = Side::ALL
                .into_iter()
                .filter(|s| side_bits & (1 << s.index()) != 0)
                .collect();
            let mask = Mask::from(flags);
            let generator =
                ConstellationGenerator::new(&galileo(), mask.clone(), sides.clone(), area, None).unwrap();

            prop_assert_eq!(generator.len(), mask.active_count() * sides.len());
            prop_assert_eq!(generator.background_rate(), 4.0 * area);

            let names: BTreeSet<String> = generator.constellation().names().collect();
            prop_assert_eq!(names.len(), generator.len());
            for (id, det) in generator.constellation() {
                prop_assert!(mask.is_active(id.slot));
                prop_assert!(sides.contains(&id.side));
                prop_assert_eq!(det.name(), format!("sat_{}_{}", id.slot, id.side.name()));
            }
        }

        #[test]
        fn prop_deterministic(flags in proptest::collection::vec(any::<bool>(), 24), bkg in proptest::option::of(0.0f64..1.0e5)) {
            let table = SlotTable::from_walker(&WalkerDelta::galileo()).unwrap();
            let a = ConstellationGenerator::new(&table, Mask::from(flags.clone()), Side::ALL, 100.0, bkg).unwrap();
            let b = ConstellationGenerator::new(&table, Mask::from(flags), Side::ALL, 100.0, bkg).unwrap();
            prop_assert_eq!(a.constellation(), b.constellation());
            prop_assert_eq!(a.background_rate(), bkg.unwrap_or(400.0));
        }
    }
}
