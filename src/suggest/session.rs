//! Latest-query-wins suggestion session.
//!
//! An address box fires a lookup per keystroke, and responses come back
//! in whatever order the network feels like. The session enforces the
//! only ordering that matters: the visible suggestion list always
//! reflects the most recently issued query. Each lookup takes a
//! generation number; issuing a new one aborts the previous in-flight
//! task, and a result may be applied only while its generation is still
//! the latest. A stale response that slips past the abort is discarded
//! at the apply step.
//!
//! Failures stay quiet on purpose. An aborted lookup returns `None`; a
//! geocoder error logs a warning and applies an empty list. Nothing in
//! this path ever surfaces an error to the customer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::task::AbortHandle;

use super::geocoder::Geocoder;
use super::PlaceCandidate;
use crate::resolver::{AddressMatch, DeliveryResolver};
use crate::tiers::DeliveryQuote;

const DEFAULT_LIMIT: usize = 5;

// ─── Types ──────────────────────────────────────────────────────────────────

/// One row of the suggestion dropdown: the geocoder's candidate plus
/// everything the resolver derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub candidate: PlaceCandidate,
    pub assessment: AddressMatch,
    pub quote: DeliveryQuote,
}

/// Assess and price one candidate.
pub fn build_suggestion(resolver: &DeliveryResolver, candidate: PlaceCandidate) -> Suggestion {
    let label = candidate.display_label();
    let assessment = resolver.assess(&label, candidate.coordinate);
    let quote = resolver.quote_match(&assessment);
    Suggestion {
        candidate,
        assessment,
        quote,
    }
}

// ─── Session ────────────────────────────────────────────────────────────────

pub struct SuggestSession {
    resolver: Arc<DeliveryResolver>,
    geocoder: Arc<dyn Geocoder>,
    limit: usize,
    generation: AtomicU64,
    visible: Mutex<Vec<Suggestion>>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl SuggestSession {
    pub fn new(resolver: Arc<DeliveryResolver>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            resolver,
            geocoder,
            limit: DEFAULT_LIMIT,
            generation: AtomicU64::new(0),
            visible: Mutex::new(Vec::new()),
            in_flight: Mutex::new(None),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Issue a lookup for `query`, superseding any in-flight one.
    ///
    /// Returns the suggestions this call applied, or `None` when a
    /// newer query superseded it first. A geocoder failure applies an
    /// empty list and logs a warning.
    pub async fn lookup(&self, query: &str) -> Option<Vec<Suggestion>> {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // A newer keystroke makes the previous request worthless; tear
        // it down instead of letting it run to completion.
        if let Some(previous) = self.in_flight.lock().unwrap().take() {
            previous.abort();
        }

        let query = query.trim().to_string();
        if query.is_empty() {
            return self.apply(my_generation, Vec::new());
        }

        let task = tokio::spawn({
            let geocoder = Arc::clone(&self.geocoder);
            let resolver = Arc::clone(&self.resolver);
            let query = query.clone();
            let limit = self.limit;
            async move {
                match geocoder.search(&query, resolver.origin(), limit).await {
                    Ok(candidates) => candidates
                        .into_iter()
                        .map(|c| build_suggestion(&resolver, c))
                        .collect(),
                    Err(err) => {
                        tracing::warn!(%query, error = %err, "address lookup failed; showing no suggestions");
                        Vec::new()
                    }
                }
            }
        });
        *self.in_flight.lock().unwrap() = Some(task.abort_handle());

        match task.await {
            Ok(suggestions) => self.apply(my_generation, suggestions),
            Err(join_err) if join_err.is_cancelled() => {
                tracing::debug!(%query, "address lookup superseded");
                None
            }
            Err(join_err) => {
                tracing::warn!(%query, error = %join_err, "address lookup task failed");
                self.apply(my_generation, Vec::new())
            }
        }
    }

    /// The customer cleared the box: drop results and invalidate any
    /// in-flight lookup.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = self.in_flight.lock().unwrap().take() {
            previous.abort();
        }
        self.visible.lock().unwrap().clear();
    }

    /// The currently applied suggestion list.
    pub fn visible(&self) -> Vec<Suggestion> {
        self.visible.lock().unwrap().clone()
    }

    // Apply results only while `generation` is still the latest issued.
    fn apply(&self, generation: u64, suggestions: Vec<Suggestion>) -> Option<Vec<Suggestion>> {
        let mut visible = self.visible.lock().unwrap();
        if self.generation.load(Ordering::SeqCst) != generation {
            return None;
        }
        *visible = suggestions.clone();
        Some(suggestions)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
