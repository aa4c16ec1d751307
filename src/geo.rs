//! Geographic primitives: coordinate pairs and great-circle distance.
//!
//! Distances are always kilometers. Rounding happens only at the display
//! edge; every comparison elsewhere in the crate runs on the full
//! precision value returned by [`haversine_km`].

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

// ─── Types ──────────────────────────────────────────────────────────────────

/// A WGS84 latitude/longitude pair, decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Both components are finite numbers. Non-finite coordinates
    /// propagate NaN through distance math, so callers gate on this
    /// before pricing anything.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Within the valid WGS84 envelope.
    pub fn in_bounds(&self) -> bool {
        self.is_finite() && self.lat.abs() <= 90.0 && self.lon.abs() <= 180.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

// ─── Distance ───────────────────────────────────────────────────────────────

/// Great-circle distance between two coordinates in kilometers, by the
/// haversine formula.
///
/// Identical points give exactly 0.0 and the result is symmetric in its
/// arguments. NaN components propagate to a NaN distance rather than
/// panicking; see [`Coordinate::is_finite`].
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// One-decimal rendering for customer-facing distances ("2.5 km").
/// Display only; never feed the rounded value back into fee lookup.
pub fn format_distance_km(km: f64) -> String {
    format!("{:.1} km", km)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
