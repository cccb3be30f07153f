//! Orbital Mechanics Library
//!
//! Coordinate transforms and Walker Delta constellation geometry used to
//! build static detector layouts (e.g. Galileo, 24 MEO satellites at 29,600 km).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitalError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Invalid constellation: {0}")]
    InvalidConstellation(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Spherical coordinates in the ICRS-like frame of the input vectors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SphericalCoord {
    /// Right ascension / longitude in degrees, [0, 360)
    pub ra_deg: f64,
    /// Declination / latitude in degrees, [-90, 90]
    pub dec_deg: f64,
    /// Distance from the origin, in the unit of the input vector
    pub distance: f64,
}

pub mod transforms {
    use super::*;

    pub fn norm(x: f64, y: f64, z: f64) -> f64 {
        (x * x + y * y + z * z).sqrt()
    }

    /// Convert a Cartesian vector to (ra, dec, distance).
    ///
    /// Fails on non-finite components and on the zero vector, whose
    /// direction is undefined.
    pub fn cartesian_to_spherical(x: f64, y: f64, z: f64) -> Result<SphericalCoord> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "non-finite vector ({}, {}, {})",
                x, y, z
            )));
        }

        let distance = norm(x, y, z);
        if distance == 0.0 {
            return Err(OrbitalError::InvalidCoordinates(
                "zero-length vector has no direction".to_string(),
            ));
        }

        let r = (x * x + y * y).sqrt();
        let mut ra_deg = y.atan2(x).to_degrees();
        if ra_deg < 0.0 {
            ra_deg += 360.0;
        }
        // -0.0 and values rounding up to 360 both map back onto 0
        if ra_deg >= 360.0 || ra_deg == 0.0 {
            ra_deg = 0.0;
        }
        let dec_deg = z.atan2(r).to_degrees();

        Ok(SphericalCoord {
            ra_deg,
            dec_deg,
            distance,
        })
    }

    pub fn spherical_to_cartesian(ra_deg: f64, dec_deg: f64, distance: f64) -> (f64, f64, f64) {
        let ra = ra_deg.to_radians();
        let dec = dec_deg.to_radians();

        (
            distance * dec.cos() * ra.cos(),
            distance * dec.cos() * ra.sin(),
            distance * dec.sin(),
        )
    }
}

pub mod walker {
    use super::*;
    use nalgebra::Vector3;

    /// Position and body axes of one constellation slot at the reference epoch.
    ///
    /// `axes` follows the side order +x, -x, +y, -y, +z, -z with +z nadir
    /// and +x along-track.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct SlotGeometry {
        pub plane: u32,
        pub slot: u32,
        pub position_km: [f64; 3],
        pub axes: [[f64; 3]; 6],
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct WalkerDelta {
        pub total_satellites: u32,
        pub planes: u32,
        pub phasing: u32,
        pub semi_major_axis_km: f64,
        pub inclination_deg: f64,
    }

    impl WalkerDelta {
        /// Galileo nominal constellation: 56°: 24/3/1 at 29,600 km
        pub fn galileo() -> Self {
            WalkerDelta {
                total_satellites: 24,
                planes: 3,
                phasing: 1,
                semi_major_axis_km: 29600.0,
                inclination_deg: 56.0,
            }
        }

        pub fn validate(&self) -> Result<()> {
            if self.planes == 0 || self.total_satellites == 0 {
                return Err(OrbitalError::InvalidConstellation(
                    "constellation needs at least one plane and one satellite".to_string(),
                ));
            }
            if self.total_satellites % self.planes != 0 {
                return Err(OrbitalError::InvalidConstellation(format!(
                    "{} satellites cannot be split evenly over {} planes",
                    self.total_satellites, self.planes
                )));
            }
            if !(self.semi_major_axis_km.is_finite() && self.semi_major_axis_km > 0.0) {
                return Err(OrbitalError::InvalidConstellation(format!(
                    "semi-major axis must be positive, got {}",
                    self.semi_major_axis_km
                )));
            }
            Ok(())
        }

        pub fn satellites_per_plane(&self) -> u32 {
            self.total_satellites / self.planes
        }

        pub fn plane_spacing_deg(&self) -> f64 {
            360.0 / self.planes as f64
        }

        pub fn in_plane_spacing_deg(&self) -> f64 {
            360.0 / self.satellites_per_plane() as f64
        }

        /// Inter-plane phase offset in degrees (360·F/T)
        pub fn phase_offset_deg(&self) -> f64 {
            360.0 * self.phasing as f64 / self.total_satellites as f64
        }

        /// Slot geometry for every satellite, plane-major order.
        pub fn slots(&self) -> Result<Vec<SlotGeometry>> {
            self.validate()?;

            let inclination = self.inclination_deg.to_radians();
            let mut slots = Vec::with_capacity(self.total_satellites as usize);

            for plane in 0..self.planes {
                let raan = (self.plane_spacing_deg() * plane as f64).to_radians();
                for slot in 0..self.satellites_per_plane() {
                    let arg_lat = (self.in_plane_spacing_deg() * slot as f64
                        + self.phase_offset_deg() * plane as f64)
                        .to_radians();
                    slots.push(slot_geometry(
                        plane,
                        slot,
                        raan,
                        arg_lat,
                        inclination,
                        self.semi_major_axis_km,
                    ));
                }
            }

            Ok(slots)
        }
    }

    fn slot_geometry(
        plane: u32,
        slot: u32,
        raan: f64,
        arg_lat: f64,
        inclination: f64,
        sma_km: f64,
    ) -> SlotGeometry {
        let (so, co) = raan.sin_cos();
        let (su, cu) = arg_lat.sin_cos();
        let (si, ci) = inclination.sin_cos();

        let radial = Vector3::new(co * cu - so * su * ci, so * cu + co * su * ci, su * si);
        let along_track = Vector3::new(-co * su - so * cu * ci, -so * su + co * cu * ci, cu * si);

        let z = -radial;
        let x = along_track;
        let y = z.cross(&x);

        let arr = |v: Vector3<f64>| [v.x, v.y, v.z];

        SlotGeometry {
            plane,
            slot,
            position_km: arr(radial * sma_km),
            axes: [arr(x), arr(-x), arr(y), arr(-y), arr(z), arr(-z)],
        }
    }
}
