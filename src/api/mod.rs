pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::enrichment::{EnrichmentConfig, EnrichmentService};
use crate::state::IncidentStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IncidentStore>,
    pub enrichment: Arc<EnrichmentService>,

    /// How long `POST /v1/incidents` may wait for enrichment; `None` answers at once
    pub response_wait: Option<Duration>,

    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn IncidentStore>, enrichment: Arc<EnrichmentService>) -> Self {
        Self {
            store,
            enrichment,
            response_wait: None,
            started_at: Instant::now(),
        }
    }

    /// Hold create responses until enrichment settles or `wait` elapses
    pub fn with_response_wait(mut self, wait: Duration) -> Self {
        self.response_wait = Some(wait);
        self
    }

    /// Honor `await_on_create`, waiting at most one attempt's timeout
    pub fn with_enrichment_config(self, config: &EnrichmentConfig) -> Self {
        if config.await_on_create {
            self.with_response_wait(config.timeout())
        } else {
            self
        }
    }
}
