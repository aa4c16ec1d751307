//! Address suggestion subsystem for Boda Bites.
//!
//! Wires the geocoding boundary, the on-disk result cache, and the
//! latest-query-wins session that keeps a suggestion dropdown honest
//! while the customer is still typing.

pub mod cache;
pub mod geocoder;
pub mod session;

pub use cache::{CachedGeocoder, GeocodeCache};
pub use geocoder::{GeocodeError, Geocoder, PhotonGeocoder, PlaceCandidate, MAX_SUGGESTIONS};
pub use session::{build_suggestion, SuggestSession, Suggestion};
