//! Named delivery zones and the directory built over them.
//!
//! A zone is a neighbourhood we quote a flat fee for, with aliases for
//! the names customers actually type ("tank hill" for Muyenga). The
//! directory precomputes a lowercase label list so per-keystroke
//! matching never re-lowercases the table, and answers nearest-zone
//! queries for addresses that geocode to a point but match no name.

use serde::{Deserialize, Serialize};

use crate::geo::{haversine_km, Coordinate};

// ─── Builtin table ──────────────────────────────────────────────────────────

struct ZoneSeed {
    name: &'static str,
    aliases: &'static [&'static str],
    lat: f64,
    lon: f64,
    fee: u32,
    eta: &'static str,
}

/// Neighbourhoods served by the Kamwokya kitchen. Aliases are stored
/// lowercase; fees in UGX.
const KAMPALA_ZONES: &[ZoneSeed] = &[
    ZoneSeed {
        name: "Kampala Central",
        aliases: &["downtown", "city centre", "city center", "cbd", "town"],
        lat: 0.3136,
        lon: 32.5811,
        fee: 5_000,
        eta: "15-25 mins",
    },
    ZoneSeed {
        name: "Nakasero",
        aliases: &["nakasero hill"],
        lat: 0.3206,
        lon: 32.5768,
        fee: 5_000,
        eta: "15-25 mins",
    },
    ZoneSeed {
        name: "Kololo",
        aliases: &["kololo hill"],
        lat: 0.3321,
        lon: 32.5936,
        fee: 5_000,
        eta: "15-25 mins",
    },
    ZoneSeed {
        name: "Naguru",
        aliases: &["naguru hill"],
        lat: 0.3352,
        lon: 32.6076,
        fee: 6_000,
        eta: "20-30 mins",
    },
    ZoneSeed {
        name: "Bukoto",
        aliases: &[],
        lat: 0.3450,
        lon: 32.6010,
        fee: 7_000,
        eta: "20-35 mins",
    },
    ZoneSeed {
        name: "Ntinda",
        aliases: &["ministers village"],
        lat: 0.3497,
        lon: 32.6206,
        fee: 8_000,
        eta: "25-40 mins",
    },
    ZoneSeed {
        name: "Bugolobi",
        aliases: &["bugoloobi"],
        lat: 0.3108,
        lon: 32.6204,
        fee: 8_000,
        eta: "25-40 mins",
    },
    ZoneSeed {
        name: "Kabalagala",
        aliases: &[],
        lat: 0.2887,
        lon: 32.5997,
        fee: 9_000,
        eta: "30-45 mins",
    },
    ZoneSeed {
        name: "Muyenga",
        aliases: &["tank hill"],
        lat: 0.2932,
        lon: 32.6093,
        fee: 9_000,
        eta: "30-45 mins",
    },
    ZoneSeed {
        name: "Kansanga",
        aliases: &[],
        lat: 0.2817,
        lon: 32.6088,
        fee: 10_000,
        eta: "35-50 mins",
    },
    ZoneSeed {
        name: "Makindye",
        aliases: &[],
        lat: 0.2855,
        lon: 32.5867,
        fee: 10_000,
        eta: "35-50 mins",
    },
    ZoneSeed {
        name: "Najjera",
        aliases: &["najera"],
        lat: 0.3806,
        lon: 32.6334,
        fee: 12_000,
        eta: "40-60 mins",
    },
    ZoneSeed {
        name: "Kira",
        aliases: &["kira town"],
        lat: 0.3971,
        lon: 32.6396,
        fee: 13_000,
        eta: "45-65 mins",
    },
    ZoneSeed {
        name: "Lubowa",
        aliases: &[],
        lat: 0.2450,
        lon: 32.5585,
        fee: 15_000,
        eta: "50-75 mins",
    },
];

/// The builtin zone list, materialized for a [`ZoneDirectory`] or a
/// config file starting point.
pub fn default_zones() -> Vec<DeliveryZone> {
    KAMPALA_ZONES
        .iter()
        .map(|seed| DeliveryZone {
            name: seed.name.to_string(),
            fee: seed.fee,
            coordinate: Some(Coordinate::new(seed.lat, seed.lon)),
            estimated_time: seed.eta.to_string(),
            aliases: seed.aliases.iter().map(|a| a.to_string()).collect(),
        })
        .collect()
}

// ─── Types ──────────────────────────────────────────────────────────────────

/// One serviced neighbourhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub name: String,
    /// Flat delivery fee in UGX for name-matched orders.
    pub fee: u32,
    /// Representative point, used for nearest-zone lookups. Zones
    /// without one still match by name but never win a nearest query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    /// Display label, e.g. "15-25 mins".
    pub estimated_time: String,
    /// Lowercase alternate names customers type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// A nearest-zone answer: the winning zone and the full-precision
/// distance to its representative point.
#[derive(Debug, Clone, Copy)]
pub struct NearestZone<'a> {
    pub zone: &'a DeliveryZone,
    pub distance_km: f64,
}

// ─── Directory ──────────────────────────────────────────────────────────────

/// Immutable index over the zone list, built once at startup.
#[derive(Debug, Clone)]
pub struct ZoneDirectory {
    zones: Vec<DeliveryZone>,
    // Lowercase (label, zone index) pairs: canonical name first, then
    // aliases, preserving zone list order. Match iteration order is the
    // tie-break for everything downstream.
    match_keys: Vec<(String, usize)>,
}

impl ZoneDirectory {
    pub fn new(zones: Vec<DeliveryZone>) -> Self {
        let mut match_keys = Vec::new();
        for (idx, zone) in zones.iter().enumerate() {
            match_keys.push((zone.name.to_lowercase(), idx));
            for alias in &zone.aliases {
                match_keys.push((alias.to_lowercase(), idx));
            }
        }
        Self { zones, match_keys }
    }

    pub fn zones(&self) -> &[DeliveryZone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub(crate) fn zone(&self, idx: usize) -> &DeliveryZone {
        &self.zones[idx]
    }

    /// Lowercase labels in match order, shared with the classifier.
    pub(crate) fn match_keys(&self) -> &[(String, usize)] {
        &self.match_keys
    }

    /// Case-insensitive lookup by canonical name.
    pub fn by_name(&self, name: &str) -> Option<&DeliveryZone> {
        self.zones
            .iter()
            .find(|z| z.name.eq_ignore_ascii_case(name))
    }

    /// Zone whose representative point is closest to `point`.
    ///
    /// Zones without a stored coordinate never participate. Ties keep
    /// the zone listed first, so repeated queries over the same table
    /// are stable. None when no zone has a coordinate at all.
    pub fn nearest(&self, point: Coordinate) -> Option<NearestZone<'_>> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, zone) in self.zones.iter().enumerate() {
            let Some(center) = zone.coordinate else {
                continue;
            };
            let d = haversine_km(point, center);
            if !d.is_finite() {
                continue;
            }
            match best {
                // Not strictly closer keeps the earlier zone.
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((idx, d)),
            }
        }
        best.map(|(idx, d)| NearestZone {
            zone: &self.zones[idx],
            distance_km: d,
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str, coord: Option<Coordinate>) -> DeliveryZone {
        DeliveryZone {
            name: name.to_string(),
            fee: 5_000,
            coordinate: coord,
            estimated_time: "15-25 mins".to_string(),
            aliases: Vec::new(),
        }
    }

    #[test]
    fn test_point_on_a_zone_center_is_zero_distance() {
        let directory = ZoneDirectory::new(default_zones());
        let kololo = Coordinate::new(0.3321, 32.5936);
        let hit = directory.nearest(kololo).unwrap();
        assert_eq!(hit.zone.name, "Kololo");
        assert_eq!(hit.distance_km, 0.0);
    }

    #[test]
    fn test_nearest_prefers_the_actually_closer_zone() {
        let directory = ZoneDirectory::new(default_zones());
        // Just east of the Ntinda center.
        let near_ntinda = Coordinate::new(0.3500, 32.6230);
        let hit = directory.nearest(near_ntinda).unwrap();
        assert_eq!(hit.zone.name, "Ntinda");
        assert!(hit.distance_km < 1.0);
    }

    #[test]
    fn test_zones_without_coordinates_never_win() {
        let target = Coordinate::new(0.3000, 32.6000);
        let directory = ZoneDirectory::new(vec![
            zone("Phantom", None),
            zone("Real", Some(Coordinate::new(0.3100, 32.6100))),
        ]);
        let hit = directory.nearest(target).unwrap();
        assert_eq!(hit.zone.name, "Real");
    }

    #[test]
    fn test_nearest_on_empty_or_coordinate_free_table_is_none() {
        let target = Coordinate::new(0.3, 32.6);
        let empty = ZoneDirectory::new(Vec::new());
        assert!(empty.is_empty());
        assert!(empty.nearest(target).is_none());
        let no_coords = ZoneDirectory::new(vec![zone("A", None), zone("B", None)]);
        assert!(!no_coords.is_empty());
        assert!(no_coords.nearest(target).is_none());
    }

    #[test]
    fn test_equidistant_zones_keep_listing_order() {
        let shared = Coordinate::new(0.3200, 32.6000);
        let directory = ZoneDirectory::new(vec![
            zone("First", Some(shared)),
            zone("Second", Some(shared)),
        ]);
        let hit = directory.nearest(Coordinate::new(0.3300, 32.6100)).unwrap();
        assert_eq!(hit.zone.name, "First");
    }

    #[test]
    fn test_by_name_is_case_insensitive() {
        let directory = ZoneDirectory::new(default_zones());
        assert!(directory.by_name("kololo").is_some());
        assert!(directory.by_name("KOLOLO").is_some());
        assert!(directory.by_name("Kyanja").is_none());
    }

    #[test]
    fn test_builtin_table_is_well_formed() {
        let zones = default_zones();
        assert!(zones.len() >= 10);
        for z in &zones {
            assert!(z.coordinate.is_some(), "{} lacks a coordinate", z.name);
            for alias in &z.aliases {
                assert_eq!(alias, &alias.to_lowercase(), "{alias} not lowercase");
            }
        }
        // Names are unique ignoring case.
        let mut names: Vec<String> = zones.iter().map(|z| z.name.to_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), zones.len());
    }

    #[test]
    fn test_match_keys_list_names_before_aliases_in_zone_order() {
        let directory = ZoneDirectory::new(default_zones());
        let keys = directory.match_keys();
        assert_eq!(keys[0].0, "kampala central");
        assert_eq!(keys[1].0, "downtown");
        // Every key is lowercase and points at a real zone.
        for (label, idx) in keys {
            assert_eq!(label, &label.to_lowercase());
            assert!(*idx < directory.len());
        }
    }
}
