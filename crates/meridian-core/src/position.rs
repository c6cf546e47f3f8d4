//! Node placement and distance math

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers, used for great-circle distance
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Where a node sits: a local 3D frame for campus/site meshes, or a
/// geographic coordinate for continental deployments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Local 3D coordinate; distances are Euclidean in the same unit
    Local { x: f64, y: f64, z: f64 },

    /// Geographic coordinate in degrees; distances are great-circle
    /// kilometers (altitude does not contribute)
    Geographic {
        latitude: f64,
        longitude: f64,
        altitude_m: f64,
    },
}

impl Position {
    pub fn local(x: f64, y: f64, z: f64) -> Self {
        Self::Local { x, y, z }
    }

    pub fn geographic(latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self::Geographic {
            latitude,
            longitude,
            altitude_m,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Geographic { .. })
    }

    /// Distance between two positions of the same kind
    ///
    /// Local pairs measure Euclidean distance, geographic pairs measure
    /// great-circle kilometers. A mixed pair has no meaningful distance
    /// and yields `None`.
    pub fn distance_to(&self, other: &Position) -> Option<f64> {
        match (self, other) {
            (Self::Local { x, y, z }, Self::Local { x: x2, y: y2, z: z2 }) => {
                Some(((x - x2).powi(2) + (y - y2).powi(2) + (z - z2).powi(2)).sqrt())
            }
            (
                Self::Geographic {
                    latitude: lat1,
                    longitude: lon1,
                    ..
                },
                Self::Geographic {
                    latitude: lat2,
                    longitude: lon2,
                    ..
                },
            ) => Some(great_circle_km(*lat1, *lon1, *lat2, *lon2)),
            _ => None,
        }
    }
}

/// Haversine great-circle distance between two lat/lon pairs, in kilometers
pub fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
