use crate::enrichment::validation::SchemaViolations;
use crate::error::AppError;
use std::time::Duration;
use thiserror::Error;

/// Failures inside the enrichment core
///
/// Only a `Validation` failure of the outbound request and a `Store` failure
/// leave `EnrichmentCoordinator::enrich`; everything else is absorbed by the
/// retry loop and recorded on the incident.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// Schema violation of a request or result
    #[error("{0}")]
    Validation(SchemaViolations),

    /// Transport, provider or parse failure of one AI call
    #[error("AI enrichment failed: {0}")]
    Transient(String),

    /// The AI call did not answer within the per-attempt limit
    #[error("AI enrichment timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Persisting the incident failed
    #[error("Failed to persist incident: {0}")]
    Store(AppError),
}

impl EnrichmentError {
    /// Label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            EnrichmentError::Validation(_) => "invalid",
            EnrichmentError::Transient(_) => "transient",
            EnrichmentError::Timeout(_) => "timeout",
            EnrichmentError::Store(_) => "store",
        }
    }
}
