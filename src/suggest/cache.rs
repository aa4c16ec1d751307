//! File-based geocode cache at ~/.boda/geocache.json.
//!
//! TTL: 7 days. Keys are trimmed, lowercased queries. The cache is a
//! convenience layer: any read or write failure degrades to a miss or
//! a no-op, never to an error the caller sees.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::geocoder::{GeocodeError, Geocoder, PlaceCandidate};
use crate::geo::Coordinate;

const CACHE_TTL_MS: i64 = 7 * 24 * 3600 * 1000; // 7 days in ms

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    candidates: Vec<PlaceCandidate>,
    timestamp: i64,
}

/// The on-disk geocode cache.
pub struct GeocodeCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl GeocodeCache {
    /// Load the cache from the default location (~/.boda/geocache.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from a specific path (for testing).
    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self { path, entries }
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".boda")
            .join("geocache.json")
    }

    fn read_file(path: &PathBuf) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    fn key(query: &str) -> String {
        query.trim().to_lowercase()
    }

    /// Cached candidates for a query. None if missing or expired.
    pub fn get(&self, query: &str) -> Option<Vec<PlaceCandidate>> {
        let entry = self.entries.get(&Self::key(query))?;
        let now = chrono::Utc::now().timestamp_millis();
        if now - entry.timestamp > CACHE_TTL_MS {
            return None; // expired
        }
        Some(entry.candidates.clone())
    }

    /// Store a query's candidates and persist to disk.
    pub fn put(&mut self, query: &str, candidates: &[PlaceCandidate]) {
        let entry = CacheEntry {
            candidates: candidates.to_vec(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.entries.insert(Self::key(query), entry);
        self.persist();
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(&self.entries) {
            let _ = fs::write(&self.path, json);
        }
    }

    /// Number of entries (for testing).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── Caching decorator ──────────────────────────────────────────────────────

/// Wraps any [`Geocoder`] with the file cache. Hits skip the network
/// entirely; fresh non-empty results are written back. Empty result
/// sets are not stored, so a place missing today can still appear
/// tomorrow.
pub struct CachedGeocoder {
    inner: Arc<dyn Geocoder>,
    cache: Mutex<GeocodeCache>,
}

impl CachedGeocoder {
    pub fn new(inner: Arc<dyn Geocoder>, cache: GeocodeCache) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
        }
    }
}

#[async_trait]
impl Geocoder for CachedGeocoder {
    async fn search(
        &self,
        query: &str,
        bias: Coordinate,
        limit: usize,
    ) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        if let Some(hit) = self.cache.lock().unwrap().get(query) {
            tracing::debug!(%query, candidates = hit.len(), "geocode cache hit");
            return Ok(hit.into_iter().take(limit).collect());
        }
        let candidates = self.inner.search(query, bias, limit).await?;
        if !candidates.is_empty() {
            self.cache.lock().unwrap().put(query, &candidates);
        }
        Ok(candidates)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
