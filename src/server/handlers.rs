use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::geo::{format_distance_km, Coordinate};
use crate::order::{
    combo_by_name, compose_order, validate_combo, Cart, CartLine, ComboViolation, CustomerDetails,
    OrderMessage,
};
use crate::suggest::{build_suggestion, Suggestion};
use crate::tiers::DeliveryQuote;
use crate::zones::DeliveryZone;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET /api/zones ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct ZonesResponse {
    pub origin: Coordinate,
    pub max_radius_km: f64,
    pub zones: Vec<DeliveryZone>,
}

pub async fn zones(State(state): State<Arc<AppState>>) -> Json<ZonesResponse> {
    Json(ZonesResponse {
        origin: state.resolver.origin(),
        max_radius_km: state.resolver.tiers().max_radius_km(),
        zones: state.resolver.directory().zones().to_vec(),
    })
}

// ─── GET /api/quote ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct QuoteQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub place: Option<String>,
}

#[derive(Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: DeliveryQuote,
    /// Display form of the distance, one decimal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_label: Option<String>,
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteQuery>,
) -> Result<Json<QuoteResponse>, Response> {
    let start = Instant::now();
    let quote = destination_quote(&state, params.lat, params.lon, params.place.as_deref())?;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        deliverable = quote.deliverable,
        fee = quote.fee,
        elapsed_ms,
        "GET /api/quote"
    );
    Ok(Json(quote_response(quote)))
}

fn quote_response(quote: DeliveryQuote) -> QuoteResponse {
    let distance_label = quote
        .distance_km
        .is_finite()
        .then(|| format_distance_km(quote.distance_km));
    QuoteResponse {
        quote,
        distance_label,
    }
}

// Shared destination handling: explicit coordinates win, then a free
// text place name; anything else is a client error.
fn destination_quote(
    state: &AppState,
    lat: Option<f64>,
    lon: Option<f64>,
    place: Option<&str>,
) -> Result<DeliveryQuote, Response> {
    if let (Some(lat), Some(lon)) = (lat, lon) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Invalid coordinates. Lat: -90..90, Lon: -180..180",
            )
            .into_response());
        }
        return Ok(state.resolver.quote_coordinate(Coordinate::new(lat, lon)));
    }
    if let Some(place) = place.map(str::trim).filter(|p| !p.is_empty()) {
        return Ok(state.resolver.quote_text(place));
    }
    Err(api_error(
        StatusCode::BAD_REQUEST,
        "Provide 'place' or 'lat'+'lon' parameters",
    )
    .into_response())
}

// ─── GET /api/suggest ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SuggestQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub query: String,
    pub suggestions: Vec<Suggestion>,
}

/// Geocode a partial address and assess every candidate. A geocoder
/// failure degrades to an empty suggestion list, never to an error
/// status; the address box stays usable while the provider is down.
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestQuery>,
) -> Result<Json<SuggestResponse>, Response> {
    let start = Instant::now();
    let query = params.q.as_deref().unwrap_or("").trim().to_string();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'q' parameter").into_response());
    }
    let limit = params.limit.unwrap_or(state.suggest_limit).max(1);

    let suggestions = match state
        .geocoder
        .search(&query, state.resolver.origin(), limit)
        .await
    {
        Ok(candidates) => candidates
            .into_iter()
            .map(|c| build_suggestion(&state.resolver, c))
            .collect(),
        Err(err) => {
            tracing::warn!(%query, error = %err, "suggest lookup failed; returning empty list");
            Vec::new()
        }
    };

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        %query,
        count = suggestions.len(),
        elapsed_ms,
        "GET /api/suggest"
    );
    Ok(Json(SuggestResponse { query, suggestions }))
}

// ─── POST /api/order/message ─────────────────────────────────────

#[derive(Deserialize)]
pub struct OrderRequest {
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub combo: Option<String>,
    pub customer: CustomerDetails,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub place: Option<String>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub message: OrderMessage,
    pub quote: QuoteResponse,
}

#[derive(Serialize)]
struct ComboErrorBody {
    error: String,
    combo: String,
    violations: Vec<ComboViolation>,
}

pub async fn order_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OrderRequest>,
) -> Result<Json<OrderResponse>, Response> {
    let start = Instant::now();
    let cart = Cart {
        lines: request.lines,
    };
    if cart.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Cart is empty").into_response());
    }

    let combo = match request.combo.as_deref() {
        Some(name) => {
            let combo = combo_by_name(name).ok_or_else(|| {
                api_error(StatusCode::BAD_REQUEST, format!("Unknown combo '{}'", name))
                    .into_response()
            })?;
            let violations = validate_combo(combo, &cart);
            if !violations.is_empty() {
                let body = ComboErrorBody {
                    error: format!("Cart does not satisfy combo '{}'", combo.name),
                    combo: combo.name.to_string(),
                    violations,
                };
                return Err((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response());
            }
            Some(combo)
        }
        None => None,
    };

    let quote = destination_quote(&state, request.lat, request.lon, request.place.as_deref())?;
    let message = compose_order(&state.config, &cart, combo, &quote, &request.customer);

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        total = message.total,
        deliverable = quote.deliverable,
        elapsed_ms,
        "POST /api/order/message"
    );
    Ok(Json(OrderResponse {
        message,
        quote: quote_response(quote),
    }))
}
