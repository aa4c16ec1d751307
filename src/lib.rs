//! Boda Bites delivery core.
//!
//! Everything the ordering site needs to answer "can we deliver there,
//! for how much, and how fast": great-circle distance from the kitchen,
//! a distance-tier fee ladder, a zone table with alias matching, an
//! async geocoding boundary with latest-query-wins sessions, and the
//! WhatsApp order handoff.

pub mod classify;
pub mod config;
pub mod geo;
pub mod order;
pub mod resolver;
pub mod server;
pub mod suggest;
pub mod tiers;
pub mod zones;

pub use config::{ConfigError, DeliveryConfig};
pub use geo::{format_distance_km, haversine_km, Coordinate};
pub use resolver::{AddressMatch, DeliveryResolver};
pub use suggest::{Geocoder, PlaceCandidate, SuggestSession, Suggestion};
pub use tiers::{DeliveryQuote, DeliveryTier, TierTable, TimeWindow};
pub use zones::{DeliveryZone, NearestZone, ZoneDirectory};
