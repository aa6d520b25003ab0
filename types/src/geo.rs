//! Geographic points, great-circle distance, and the fixed grid used by the
//! spatial index.
//!
//! The grid divides the sphere into cells of [`GeoCell::DEGREES`] on each
//! side. A radius query first collects the cells covering the query's
//! bounding box and then filters candidates by exact distance, so the grid
//! only has to be conservative, never exact.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A validated latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    long: f64,
}

#[derive(Serialize, Deserialize)]
struct RawPoint {
    lat: f64,
    long: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = ValidationError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.lat, raw.long)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(p: GeoPoint) -> Self {
        RawPoint {
            lat: p.lat,
            long: p.long,
        }
    }
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, long: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange(lat));
        }
        if !long.is_finite() || !(-180.0..=180.0).contains(&long) {
            return Err(ValidationError::LongitudeOutOfRange(long));
        }
        Ok(Self { lat, long })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn long(&self) -> f64 {
        self.long
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_phi = (other.lat - self.lat).to_radians();
        let d_lambda = (other.long - self.long).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }

    pub fn within(&self, center: &GeoPoint, radius_meters: f64) -> bool {
        self.distance_meters(center) <= radius_meters
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.long)
    }
}

/// One cell of the fixed spatial grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeoCell {
    lat_idx: u16,
    lon_idx: u16,
}

impl GeoCell {
    /// Cell edge length in degrees.
    pub const DEGREES: f64 = 0.1;

    const LAT_CELLS: i64 = 1800;
    const LON_CELLS: i64 = 3600;

    /// Radius queries that would touch more cells than this scan everything.
    pub const MAX_COVERING_CELLS: usize = 4096;

    pub fn containing(point: &GeoPoint) -> Self {
        Self {
            lat_idx: lat_index(point.lat),
            lon_idx: lon_index(point.long),
        }
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let mut out = [0u8; 4];
        out[..2].copy_from_slice(&self.lat_idx.to_be_bytes());
        out[2..].copy_from_slice(&self.lon_idx.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            lat_idx: u16::from_be_bytes([bytes[0], bytes[1]]),
            lon_idx: u16::from_be_bytes([bytes[2], bytes[3]]),
        }
    }

    /// Cells that together contain every point within `radius_meters` of
    /// `center`. Returns `None` when the covering would exceed
    /// [`Self::MAX_COVERING_CELLS`]; callers then fall back to a full scan.
    pub fn covering(center: &GeoPoint, radius_meters: f64) -> Option<Vec<GeoCell>> {
        let angular = radius_meters / EARTH_RADIUS_METERS;
        if angular >= std::f64::consts::PI {
            return None;
        }
        let d_lat = angular.to_degrees();
        let lat_min = center.lat - d_lat;
        let lat_max = center.lat + d_lat;

        // One cell of padding on every side absorbs float rounding at edges.
        let lat_lo = (lat_index(lat_min.max(-90.0)) as i64 - 1).max(0);
        let lat_hi = (lat_index(lat_max.min(90.0)) as i64 + 1).min(Self::LAT_CELLS - 1);

        let touches_pole = lat_min <= -90.0 || lat_max >= 90.0;
        let lon_range = if touches_pole {
            None
        } else {
            let sin_ratio = angular.sin() / center.lat.to_radians().cos();
            if sin_ratio >= 1.0 {
                None
            } else {
                let d_lon = sin_ratio.asin().to_degrees();
                let lo = lon_index_unwrapped(center.long - d_lon) - 1;
                let hi = lon_index_unwrapped(center.long + d_lon) + 1;
                if hi - lo + 1 >= Self::LON_CELLS {
                    None
                } else {
                    Some((lo, hi))
                }
            }
        };

        let lat_count = (lat_hi - lat_lo + 1) as usize;
        let lon_count = match lon_range {
            Some((lo, hi)) => (hi - lo + 1) as usize,
            None => Self::LON_CELLS as usize,
        };
        if lat_count.saturating_mul(lon_count) > Self::MAX_COVERING_CELLS {
            return None;
        }

        let mut cells = Vec::with_capacity(lat_count * lon_count);
        for lat_idx in lat_lo..=lat_hi {
            match lon_range {
                Some((lo, hi)) => {
                    for raw in lo..=hi {
                        cells.push(GeoCell {
                            lat_idx: lat_idx as u16,
                            lon_idx: raw.rem_euclid(Self::LON_CELLS) as u16,
                        });
                    }
                }
                None => {
                    for lon_idx in 0..Self::LON_CELLS {
                        cells.push(GeoCell {
                            lat_idx: lat_idx as u16,
                            lon_idx: lon_idx as u16,
                        });
                    }
                }
            }
        }
        Some(cells)
    }
}

fn lat_index(lat: f64) -> u16 {
    (((lat + 90.0) / GeoCell::DEGREES).floor() as i64).clamp(0, GeoCell::LAT_CELLS - 1) as u16
}

fn lon_index_unwrapped(long: f64) -> i64 {
    ((long + 180.0) / GeoCell::DEGREES).floor() as i64
}

fn lon_index(long: f64) -> u16 {
    lon_index_unwrapped(long).rem_euclid(GeoCell::LON_CELLS) as u16
}
