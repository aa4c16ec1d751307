//! The resolver: one struct that owns the validated tables and answers
//! every eligibility question the CLI, server, and suggestion layer ask.
//!
//! Two pricing paths exist on purpose. An address that matches a zone
//! by name gets that zone's flat fee; anything else with a usable
//! coordinate is priced by the distance ladder. Both paths end in a
//! [`DeliveryQuote`] value, never an error.

use serde::Serialize;

use crate::classify::{self, MatchRule};
use crate::config::{ConfigError, DeliveryConfig, DEFAULT_METRO_RADIUS_KM, DEFAULT_ORIGIN};
use crate::geo::{haversine_km, Coordinate};
use crate::tiers::{DeliveryQuote, TierTable};
use crate::zones::{default_zones, ZoneDirectory};

// ─── Types ──────────────────────────────────────────────────────────────────

/// Everything we can say about one geocoded candidate.
///
/// `deliverable` is strictly the name classifier's verdict. A candidate
/// can be inside the service radius and still be `deliverable: false`
/// when its label matches no zone; the coordinate fallback in
/// [`DeliveryResolver::quote_match`] handles pricing for those.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressMatch {
    pub display_name: String,
    pub coordinate: Coordinate,
    /// Zone whose name or alias the label matched, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_zone: Option<String>,
    /// Rule that produced the name match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_rule: Option<MatchRule>,
    /// Closest zone by straight-line distance, regardless of matching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_to_zone_km: Option<f64>,
    pub deliverable: bool,
    /// Inside the informational metro radius around the kitchen.
    pub in_metro: bool,
}

// ─── Resolver ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DeliveryResolver {
    origin: Coordinate,
    metro_radius_km: f64,
    tiers: TierTable,
    directory: ZoneDirectory,
}

impl DeliveryResolver {
    /// Build from a config, validating it first.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            origin: config.origin,
            metro_radius_km: config.metro_radius_km,
            tiers: TierTable::new(config.tiers.clone(), config.max_radius_km),
            directory: ZoneDirectory::new(config.zones.clone()),
        })
    }

    /// The compiled-in Kampala setup.
    pub fn kampala() -> Self {
        Self {
            origin: DEFAULT_ORIGIN,
            metro_radius_km: DEFAULT_METRO_RADIUS_KM,
            tiers: TierTable::default(),
            directory: ZoneDirectory::new(default_zones()),
        }
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn directory(&self) -> &ZoneDirectory {
        &self.directory
    }

    /// Price a raw coordinate by the distance ladder.
    pub fn quote_coordinate(&self, coord: Coordinate) -> DeliveryQuote {
        match self.distance_from_origin(coord) {
            Some(d) => self.tiers.quote(d),
            None => DeliveryQuote::not_deliverable(f64::NAN),
        }
    }

    /// Offline path: classify free text against the zone table and
    /// price by the matched zone. No geocoding involved.
    pub fn quote_text(&self, text: &str) -> DeliveryQuote {
        let normalized = text.trim().to_lowercase();
        match classify::match_zone(&self.directory, &normalized) {
            Some(hit) => {
                let distance = hit
                    .zone
                    .coordinate
                    .map(|c| haversine_km(self.origin, c))
                    .unwrap_or(f64::NAN);
                DeliveryQuote::from_zone(&hit.zone.name, hit.zone.fee, &hit.zone.estimated_time, distance)
            }
            None => DeliveryQuote::not_deliverable(f64::NAN),
        }
    }

    /// Classify one geocoder candidate: name match, nearest zone, and
    /// the metro flag. Lowercasing and trimming happen here so the
    /// classifier can assume normalized input.
    pub fn assess(&self, display_name: &str, coordinate: Coordinate) -> AddressMatch {
        let normalized = display_name.trim().to_lowercase();
        let matched = classify::match_zone(&self.directory, &normalized);
        let nearest = if coordinate.is_finite() {
            self.directory.nearest(coordinate)
        } else {
            None
        };
        let origin_km = self.distance_from_origin(coordinate);

        AddressMatch {
            display_name: display_name.to_string(),
            coordinate,
            matched_zone: matched.map(|hit| hit.zone.name.clone()),
            match_rule: matched.map(|hit| hit.rule),
            nearest_zone: nearest.map(|n| n.zone.name.clone()),
            distance_to_zone_km: nearest.map(|n| n.distance_km),
            deliverable: matched.is_some(),
            in_metro: origin_km.is_some_and(|d| d <= self.metro_radius_km),
        }
    }

    /// Price an assessed candidate: matched zone first, distance ladder
    /// as the fallback.
    pub fn quote_match(&self, item: &AddressMatch) -> DeliveryQuote {
        if let Some(name) = &item.matched_zone {
            if let Some(zone) = self.directory.by_name(name) {
                let distance = self
                    .distance_from_origin(item.coordinate)
                    .or_else(|| zone.coordinate.map(|c| haversine_km(self.origin, c)))
                    .unwrap_or(f64::NAN);
                return DeliveryQuote::from_zone(&zone.name, zone.fee, &zone.estimated_time, distance);
            }
        }
        self.quote_coordinate(item.coordinate)
    }

    fn distance_from_origin(&self, coord: Coordinate) -> Option<f64> {
        coord
            .is_finite()
            .then(|| haversine_km(self.origin, coord))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const KOLOLO: Coordinate = Coordinate::new(0.3321, 32.5936);
    const ENTEBBE: Coordinate = Coordinate::new(0.0512, 32.4637);

    #[test]
    fn test_nearby_coordinate_prices_in_the_first_band() {
        let resolver = DeliveryResolver::kampala();
        let quote = resolver.quote_coordinate(KOLOLO);
        assert!(quote.deliverable);
        assert_eq!(quote.fee, 5_000);
        assert!(quote.distance_km < 3.0);
    }

    #[test]
    fn test_entebbe_is_out_of_radius() {
        let resolver = DeliveryResolver::kampala();
        let quote = resolver.quote_coordinate(ENTEBBE);
        assert!(!quote.deliverable);
        assert_eq!(quote.fee, 0);
        assert!(quote.distance_km > 30.0);
    }

    #[test]
    fn test_non_finite_coordinate_refuses_without_panicking() {
        let resolver = DeliveryResolver::kampala();
        let quote = resolver.quote_coordinate(Coordinate::new(f64::NAN, 32.6));
        assert!(!quote.deliverable);
        assert!(quote.distance_km.is_nan());
    }

    #[test]
    fn test_assess_matched_candidate() {
        let resolver = DeliveryResolver::kampala();
        let m = resolver.assess("Kololo Hill, Kampala", KOLOLO);
        assert!(m.deliverable);
        assert_eq!(m.matched_zone.as_deref(), Some("Kololo"));
        assert_eq!(m.match_rule, Some(MatchRule::Prefix));
        assert_eq!(m.nearest_zone.as_deref(), Some("Kololo"));
        assert_eq!(m.distance_to_zone_km, Some(0.0));
        assert!(m.in_metro);
    }

    #[test]
    fn test_assess_unserviced_candidate_still_reports_nearest() {
        let resolver = DeliveryResolver::kampala();
        let m = resolver.assess("Entebbe", ENTEBBE);
        assert!(!m.deliverable);
        assert_eq!(m.matched_zone, None);
        assert_eq!(m.match_rule, None);
        assert_eq!(m.nearest_zone.as_deref(), Some("Lubowa"));
        assert!(m.distance_to_zone_km.unwrap() > 20.0);
        assert!(!m.in_metro);
    }

    #[test]
    fn test_quote_match_prefers_the_named_zone_fee() {
        let resolver = DeliveryResolver::kampala();
        // Muyenga's flat fee differs from what its distance band would charge.
        let muyenga = Coordinate::new(0.2932, 32.6093);
        let m = resolver.assess("Tank Hill Road, Muyenga", muyenga);
        // "tank hill road, muyenga" prefix-matches the "tank hill" alias.
        assert_eq!(m.matched_zone.as_deref(), Some("Muyenga"));
        let quote = resolver.quote_match(&m);
        assert_eq!(quote.zone.as_deref(), Some("Muyenga"));
        assert_eq!(quote.fee, 9_000);
        assert_eq!(quote.window_label(), Some("30-45 mins"));
    }

    #[test]
    fn test_quote_match_falls_back_to_the_distance_ladder() {
        let resolver = DeliveryResolver::kampala();
        // Inside the radius but matching no zone name.
        let m = resolver.assess("Old Port Bell Road", Coordinate::new(0.3150, 32.6300));
        assert!(!m.deliverable);
        let quote = resolver.quote_match(&m);
        assert!(quote.deliverable);
        assert!(quote.zone.is_none());
        assert!(quote.window.is_some());
    }

    #[test]
    fn test_quote_text_matches_aliases_offline() {
        let resolver = DeliveryResolver::kampala();
        let quote = resolver.quote_text("Downtown Market");
        assert!(quote.deliverable);
        assert_eq!(quote.zone.as_deref(), Some("Kampala Central"));
        assert_eq!(quote.fee, 5_000);
        assert!(quote.distance_km < 5.0);
    }

    #[test]
    fn test_quote_text_refuses_unknown_places() {
        let resolver = DeliveryResolver::kampala();
        let quote = resolver.quote_text("Mbarara");
        assert!(!quote.deliverable);
        assert_eq!(quote.fee, 0);
    }

    #[test]
    fn test_from_config_honors_a_smaller_radius() {
        let mut config = DeliveryConfig::default();
        config.max_radius_km = 3.0;
        let resolver = DeliveryResolver::from_config(&config).unwrap();
        // Ntinda sits about 4 km out, past the shrunk radius.
        let ntinda = Coordinate::new(0.3497, 32.6206);
        assert!(!resolver.quote_coordinate(ntinda).deliverable);
        assert!(resolver.quote_coordinate(KOLOLO).deliverable);
    }
}
