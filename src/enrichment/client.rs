use crate::config::{AiConfig, AiProvider};
use crate::enrichment::cancel::CancellationToken;
use crate::enrichment::error::EnrichmentError;
use crate::enrichment::openai::OpenAiEnrichmentClient;
use crate::enrichment::schema::{EnrichmentRequest, EnrichmentResult};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Boundary to the external inference capability
///
/// One call, one answer. Implementations hold no retry or timeout logic; the
/// coordinator owns both. `cancel` fires when the caller has given up on the
/// call and may be used to stop work early.
#[async_trait]
pub trait AiEnrichmentClient: Send + Sync + 'static {
    /// Client name for logs
    fn name(&self) -> &str;

    async fn enrich_incident(
        &self,
        request: &EnrichmentRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<EnrichmentResult, EnrichmentError>;
}

/// Deterministic client for development and tests
#[derive(Debug, Clone)]
pub struct MockAiEnrichmentClient {
    result: EnrichmentResult,
}

impl MockAiEnrichmentClient {
    pub fn new() -> Self {
        Self {
            result: EnrichmentResult::new(
                "HIGH",
                "SECURITY",
                "Mock summary of the incident",
                "Take immediate action",
            ),
        }
    }

    /// Mock that always answers with `result`
    pub fn with_result(result: EnrichmentResult) -> Self {
        Self { result }
    }
}

impl Default for MockAiEnrichmentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiEnrichmentClient for MockAiEnrichmentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn enrich_incident(
        &self,
        _request: &EnrichmentRequest,
        _cancel: &CancellationToken,
    ) -> std::result::Result<EnrichmentResult, EnrichmentError> {
        Ok(self.result.clone())
    }
}

/// Build the configured AI client
pub fn create_ai_client(config: &AiConfig) -> Result<Arc<dyn AiEnrichmentClient>> {
    match config.provider {
        AiProvider::Openai => {
            let client = OpenAiEnrichmentClient::from_config(config)?;
            tracing::info!(model = %config.model, base_url = %config.base_url, "Using OpenAI enrichment client");
            Ok(Arc::new(client))
        }
        AiProvider::Mock => {
            tracing::info!("Using mock enrichment client");
            Ok(Arc::new(MockAiEnrichmentClient::new()))
        }
    }
}
