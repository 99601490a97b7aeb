use std::sync::Arc;

use crate::llm_client::ScoreOracle;
use crate::scoring::validation::ImageSupport;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup; cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// The scoring oracle. `None` when no API key is configured; scoring
    /// requests are then answered with 503 before any oracle call.
    pub oracle: Option<Arc<dyn ScoreOracle>>,
    /// Image-decoding capability, detected once at startup.
    pub images: ImageSupport,
}
