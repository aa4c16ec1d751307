//! Runtime configuration: kitchen origin, radii, fee ladder, zone table.
//!
//! Everything ships with compiled-in Kampala defaults; a JSON file can
//! override any subset of fields. A config is validated before any
//! resolver is built from it, so the matching and pricing paths never
//! re-check table shape.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinate;
use crate::tiers::{self, DeliveryTier, DEFAULT_MAX_RADIUS_KM};
use crate::zones::{self, DeliveryZone};

// ─── Defaults ───────────────────────────────────────────────────────────────

/// The Kamwokya kitchen, origin of every distance quote.
pub const DEFAULT_ORIGIN: Coordinate = Coordinate::new(0.3379, 32.5862);

/// Soft "greater Kampala" radius used for the metro flag on
/// suggestions, kilometers.
pub const DEFAULT_METRO_RADIUS_KM: f64 = 25.0;

const DEFAULT_KITCHEN_NAME: &str = "Boda Bites";
const DEFAULT_WHATSAPP: &str = "256772345678";

fn default_origin() -> Coordinate {
    DEFAULT_ORIGIN
}

fn default_max_radius() -> f64 {
    DEFAULT_MAX_RADIUS_KM
}

fn default_metro_radius() -> f64 {
    DEFAULT_METRO_RADIUS_KM
}

fn default_kitchen_name() -> String {
    DEFAULT_KITCHEN_NAME.to_string()
}

fn default_whatsapp() -> String {
    DEFAULT_WHATSAPP.to_string()
}

// ─── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_origin")]
    pub origin: Coordinate,
    /// Hard service edge in kilometers from the origin.
    #[serde(default = "default_max_radius")]
    pub max_radius_km: f64,
    /// Radius for the informational metro flag, not for pricing.
    #[serde(default = "default_metro_radius")]
    pub metro_radius_km: f64,
    #[serde(default = "tiers::default_tiers")]
    pub tiers: Vec<DeliveryTier>,
    #[serde(default = "zones::default_zones")]
    pub zones: Vec<DeliveryZone>,
    #[serde(default = "default_kitchen_name")]
    pub kitchen_name: String,
    /// International-format number (digits only) for the order handoff.
    #[serde(default = "default_whatsapp")]
    pub whatsapp_number: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN,
            max_radius_km: DEFAULT_MAX_RADIUS_KM,
            metro_radius_km: DEFAULT_METRO_RADIUS_KM,
            tiers: tiers::default_tiers(),
            zones: zones::default_zones(),
            kitchen_name: default_kitchen_name(),
            whatsapp_number: default_whatsapp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ─── Loading and validation ─────────────────────────────────────────────────

impl DeliveryConfig {
    /// Load and validate a JSON config file. Fields absent from the
    /// file fall back to the compiled-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.origin.in_bounds() {
            return Err(invalid(format!(
                "kitchen origin ({}) is outside valid coordinates",
                self.origin
            )));
        }
        if !self.max_radius_km.is_finite() || self.max_radius_km <= 0.0 {
            return Err(invalid("max_radius_km must be a positive number"));
        }
        if !self.metro_radius_km.is_finite() || self.metro_radius_km <= 0.0 {
            return Err(invalid("metro_radius_km must be a positive number"));
        }

        if self.tiers.is_empty() {
            return Err(invalid("at least one delivery tier is required"));
        }
        let mut previous = 0.0_f64;
        for tier in &self.tiers {
            if !tier.max_km.is_finite() || tier.max_km <= previous {
                return Err(invalid(format!(
                    "tier bounds must be positive and strictly increasing; {} follows {}",
                    tier.max_km, previous
                )));
            }
            if tier.min_minutes > tier.max_minutes {
                return Err(invalid(format!(
                    "tier at {} km has an inverted time window",
                    tier.max_km
                )));
            }
            previous = tier.max_km;
        }
        // Outermost bound and service radius normally coincide; a gap
        // between them silently refuses or strands part of the ladder.
        if (previous - self.max_radius_km).abs() > 1e-9 {
            tracing::warn!(
                outer_bound_km = previous,
                max_radius_km = self.max_radius_km,
                "outermost tier bound does not line up with the service radius"
            );
        }

        let mut seen = Vec::with_capacity(self.zones.len());
        for zone in &self.zones {
            let lowered = zone.name.to_lowercase();
            if zone.name.trim().is_empty() {
                return Err(invalid("zone names cannot be empty"));
            }
            if seen.contains(&lowered) {
                return Err(invalid(format!("duplicate zone name: {}", zone.name)));
            }
            seen.push(lowered);
            if let Some(coord) = zone.coordinate {
                if !coord.in_bounds() {
                    return Err(invalid(format!(
                        "zone {} has an out-of-bounds coordinate ({coord})",
                        zone.name
                    )));
                }
            }
            for alias in &zone.aliases {
                if alias != &alias.to_lowercase() {
                    return Err(invalid(format!(
                        "zone {} alias \"{alias}\" must be lowercase",
                        zone.name
                    )));
                }
            }
        }

        if self.whatsapp_number.is_empty() || !self.whatsapp_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid(
                "whatsapp_number must be digits only, international format",
            ));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_validate() {
        DeliveryConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_radius_km": 12.0 }}"#).unwrap();

        let config = DeliveryConfig::load(file.path()).unwrap();
        assert_eq!(config.max_radius_km, 12.0);
        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert_eq!(config.tiers.len(), 5);
        assert!(config.zones.len() >= 10);
    }

    #[test]
    fn test_full_round_trip_through_json() {
        let mut file = NamedTempFile::new().unwrap();
        let original = DeliveryConfig::default();
        write!(file, "{}", serde_json::to_string_pretty(&original).unwrap()).unwrap();

        let loaded = DeliveryConfig::load(file.path()).unwrap();
        assert_eq!(loaded.tiers, original.tiers);
        assert_eq!(loaded.zones, original.zones);
        assert_eq!(loaded.whatsapp_number, original.whatsapp_number);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = DeliveryConfig::load(Path::new("/nonexistent/boda.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_unparseable_file_is_a_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = DeliveryConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unsorted_tiers_are_rejected() {
        let mut config = DeliveryConfig::default();
        config.tiers.swap(0, 1);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_duplicate_zone_names_are_rejected() {
        let mut config = DeliveryConfig::default();
        let mut clone = config.zones[0].clone();
        clone.name = clone.name.to_uppercase();
        config.zones.push(clone);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate zone name"));
    }

    #[test]
    fn test_uppercase_alias_is_rejected() {
        let mut config = DeliveryConfig::default();
        config.zones[0].aliases.push("Downtown".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must be lowercase"));
    }

    #[test]
    fn test_non_finite_origin_is_rejected() {
        let mut config = DeliveryConfig::default();
        config.origin = Coordinate::new(f64::NAN, 32.58);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_numeric_whatsapp_number_is_rejected() {
        let mut config = DeliveryConfig::default();
        config.whatsapp_number = "+256 772 345678".to_string();
        assert!(config.validate().is_err());
    }
}
