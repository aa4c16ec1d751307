use std::sync::Arc;

use crate::config::DeliveryConfig;
use crate::resolver::DeliveryResolver;
use crate::suggest::Geocoder;

/// Shared, read-only application state. The resolver's tables never
/// change after startup, so handlers borrow freely without locking.
pub struct AppState {
    pub config: DeliveryConfig,
    pub resolver: DeliveryResolver,
    pub geocoder: Arc<dyn Geocoder>,
    pub suggest_limit: usize,
}
