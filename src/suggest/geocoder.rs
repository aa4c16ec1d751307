//! Geocoding boundary: the [`Geocoder`] trait and the Photon-backed
//! implementation behind it.
//!
//! Photon (photon.komoot.io) answers free-text queries with GeoJSON and
//! takes a lat/lon bias so "kololo" ranks the Kampala hill above
//! anything else on the planet. Individual features that fail to parse
//! are dropped rather than failing the whole response; a lookup that
//! cannot produce candidates degrades to an empty list upstream.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinate;

/// Public Photon instance.
pub const PHOTON_ENDPOINT: &str = "https://photon.komoot.io/api/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);
const USER_AGENT: &str = "boda-bites/0.5 (delivery eligibility checker)";

/// Most suggestions a single lookup may return.
pub const MAX_SUGGESTIONS: usize = 10;

// ─── Types ──────────────────────────────────────────────────────────────────

/// One place the geocoder offered for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    /// Containing suburb or city, when the geocoder knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub coordinate: Coordinate,
}

impl PlaceCandidate {
    /// The "Kololo, Kampala" style label shown to customers and fed to
    /// the name classifier.
    pub fn display_label(&self) -> String {
        match &self.locality {
            Some(locality) if !locality.eq_ignore_ascii_case(&self.name) => {
                format!("{}, {}", self.name, locality)
            }
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("geocoder response was not valid GeoJSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The async lookup seam. Implementations must be cancel-safe: a
/// dropped `search` future abandons whatever request it had in flight.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(
        &self,
        query: &str,
        bias: Coordinate,
        limit: usize,
    ) -> Result<Vec<PlaceCandidate>, GeocodeError>;
}

// ─── Photon wire format ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PhotonResponse {
    #[serde(default)]
    features: Vec<PhotonFeature>,
}

#[derive(Deserialize)]
struct PhotonFeature {
    #[serde(default)]
    geometry: PhotonGeometry,
    #[serde(default)]
    properties: PhotonProperties,
}

#[derive(Deserialize, Default)]
struct PhotonGeometry {
    // GeoJSON order: [lon, lat].
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Deserialize, Default)]
struct PhotonProperties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    suburb: Option<String>,
    #[serde(default)]
    district: Option<String>,
}

fn feature_to_candidate(feature: PhotonFeature) -> Option<PlaceCandidate> {
    let lon = *feature.geometry.coordinates.first()?;
    let lat = *feature.geometry.coordinates.get(1)?;
    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.in_bounds() {
        return None;
    }
    let name = feature.properties.name?;
    if name.trim().is_empty() {
        return None;
    }
    Some(PlaceCandidate {
        name,
        locality: feature.properties.suburb.or(feature.properties.city),
        district: feature.properties.district,
        coordinate,
    })
}

/// Parse a Photon GeoJSON body, silently dropping malformed features.
fn parse_response(body: &str) -> Result<Vec<PlaceCandidate>, GeocodeError> {
    let response: PhotonResponse = serde_json::from_str(body)?;
    Ok(response
        .features
        .into_iter()
        .filter_map(feature_to_candidate)
        .collect())
}

// ─── Photon client ──────────────────────────────────────────────────────────

pub struct PhotonGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl PhotonGeocoder {
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_base_url(PHOTON_ENDPOINT)
    }

    /// Point at a different Photon instance, e.g. a self-hosted one.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Geocoder for PhotonGeocoder {
    async fn search(
        &self,
        query: &str,
        bias: Coordinate,
        limit: usize,
    ) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        let limit = limit.clamp(1, MAX_SUGGESTIONS);
        let lat = bias.lat.to_string();
        let lon = bias.lon.to_string();
        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("limit", limit_param.as_str()),
                ("lang", "en"),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        parse_response(&body)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
