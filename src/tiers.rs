//! Distance-tier fee schedule.
//!
//! Fees come from a short ordered ladder of distance bands: the first
//! band whose outer bound is at or beyond the straight-line distance
//! wins. Band selection always runs on the full-precision distance;
//! the one-decimal figure customers see is produced afterwards by
//! [`crate::geo::format_distance_km`].
//!
//! An address beyond the service radius is a normal outcome, not an
//! error: [`TierTable::quote`] answers with `deliverable: false` and a
//! zero fee so callers can render "pickup only" without branching on
//! error types.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Defaults ───────────────────────────────────────────────────────────────

/// Hard outer edge of the delivery service, kilometers from the kitchen.
pub const DEFAULT_MAX_RADIUS_KM: f64 = 20.0;

/// The standard Kampala fee ladder. Fees in Ugandan shillings.
pub const DEFAULT_TIERS: &[DeliveryTier] = &[
    DeliveryTier::new(3.0, 5_000, 15, 25),
    DeliveryTier::new(6.0, 8_000, 25, 40),
    DeliveryTier::new(10.0, 12_000, 35, 55),
    DeliveryTier::new(15.0, 18_000, 50, 70),
    DeliveryTier::new(20.0, 25_000, 65, 90),
];

pub(crate) fn default_tiers() -> Vec<DeliveryTier> {
    DEFAULT_TIERS.to_vec()
}

// ─── Types ──────────────────────────────────────────────────────────────────

/// One band of the fee ladder: everything out to `max_km` (inclusive)
/// costs `fee` and arrives inside the stated window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryTier {
    pub max_km: f64,
    /// Flat delivery fee in UGX.
    pub fee: u32,
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl DeliveryTier {
    pub const fn new(max_km: f64, fee: u32, min_minutes: u32, max_minutes: u32) -> Self {
        Self {
            max_km,
            fee,
            min_minutes,
            max_minutes,
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            min_minutes: self.min_minutes,
            max_minutes: self.max_minutes,
        }
    }
}

/// Estimated door-to-door delivery window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} mins", self.min_minutes, self.max_minutes)
    }
}

/// The answer to "can we deliver there and for how much".
///
/// Always a value, never an error. `deliverable: false` with a zero fee
/// covers out-of-radius addresses, unmatched place names, and junk
/// coordinates alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub deliverable: bool,
    /// UGX. Zero whenever `deliverable` is false.
    pub fee: u32,
    /// Full-precision kilometers from the kitchen. NaN (serialized as
    /// null) when no usable coordinate was involved.
    pub distance_km: f64,
    /// Structured window for distance-priced quotes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
    /// Human label, e.g. "15-25 mins". Set for every deliverable quote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    /// Zone the fee came from, when the quote was priced by name rather
    /// than by distance band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl DeliveryQuote {
    /// Distance-band quote.
    pub fn from_tier(tier: &DeliveryTier, distance_km: f64) -> Self {
        let window = tier.window();
        Self {
            deliverable: true,
            fee: tier.fee,
            distance_km,
            window: Some(window),
            eta: Some(window.to_string()),
            zone: None,
        }
    }

    /// Quote priced by a named zone's flat fee.
    pub fn from_zone(name: &str, fee: u32, eta: &str, distance_km: f64) -> Self {
        Self {
            deliverable: true,
            fee,
            distance_km,
            window: None,
            eta: Some(eta.to_string()),
            zone: Some(name.to_string()),
        }
    }

    /// Out of radius, unmatched, or unusable input.
    pub fn not_deliverable(distance_km: f64) -> Self {
        Self {
            deliverable: false,
            fee: 0,
            distance_km,
            window: None,
            eta: None,
            zone: None,
        }
    }

    pub fn window_label(&self) -> Option<&str> {
        self.eta.as_deref()
    }
}

// ─── Table ──────────────────────────────────────────────────────────────────

/// The fee ladder plus the service radius it operates under.
///
/// Construction assumes bounds already validated as positive and
/// strictly increasing; [`crate::config::DeliveryConfig::validate`]
/// enforces that before a table is ever built.
#[derive(Debug, Clone)]
pub struct TierTable {
    tiers: Vec<DeliveryTier>,
    max_radius_km: f64,
}

impl TierTable {
    pub fn new(tiers: Vec<DeliveryTier>, max_radius_km: f64) -> Self {
        Self {
            tiers,
            max_radius_km,
        }
    }

    pub fn tiers(&self) -> &[DeliveryTier] {
        &self.tiers
    }

    pub fn max_radius_km(&self) -> f64 {
        self.max_radius_km
    }

    /// First band whose bound is at or beyond `distance_km`.
    ///
    /// None for distances past the service radius, and for negative or
    /// non-finite input.
    pub fn tier_for(&self, distance_km: f64) -> Option<&DeliveryTier> {
        if !distance_km.is_finite() || distance_km < 0.0 || distance_km > self.max_radius_km {
            return None;
        }
        self.tiers.iter().find(|t| t.max_km >= distance_km)
    }

    /// Price a straight-line distance from the kitchen.
    pub fn quote(&self, distance_km: f64) -> DeliveryQuote {
        match self.tier_for(distance_km) {
            Some(tier) => DeliveryQuote::from_tier(tier, distance_km),
            None => DeliveryQuote::not_deliverable(distance_km),
        }
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::new(default_tiers(), DEFAULT_MAX_RADIUS_KM)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
