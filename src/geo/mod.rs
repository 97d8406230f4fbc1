// src/geo/mod.rs

use serde::{Deserialize, Serialize};

pub mod gazetteer;
pub use gazetteer::{LocationResolver, Place};

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Builds a point from a flat `[lon, lat, lon, lat, ...]` sequence.
    /// A trailing odd value is dropped.
    pub fn from_flat(coords: &[f64]) -> Vec<GeoPoint> {
        coords
            .chunks_exact(2)
            .map(|pair| GeoPoint::new(pair[0], pair[1]))
            .collect()
    }
}
