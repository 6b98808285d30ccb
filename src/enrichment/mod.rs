//! AI enrichment of incidents
//!
//! The coordinator validates the outbound request, calls the AI client under a
//! per-attempt timeout, retries with capped exponential backoff and persists
//! the incident exactly once in a terminal `ENRICHED` or `FAILED` state.
//! Enrichment runs off the request path through `EnrichmentService`.

pub mod backoff;
pub mod cancel;
pub mod client;
pub mod clock;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod openai;
pub mod prompt;
pub mod schema;
pub mod service;
pub mod timeout;
pub mod validation;

pub use backoff::{BackoffPolicy, JitterSource, NoJitter, SeededJitter};
pub use cancel::{cancellation_pair, CancelHandle, CancellationToken};
pub use client::{create_ai_client, AiEnrichmentClient, MockAiEnrichmentClient};
pub use clock::{Clock, ManualClock, TokioClock};
pub use coordinator::EnrichmentCoordinator;
pub use error::EnrichmentError;
pub use models::{EnrichmentConfig, EnrichmentReport};
pub use openai::OpenAiEnrichmentClient;
pub use prompt::{parse_enrichment_output, PromptTemplate};
pub use schema::{EnrichmentRequest, EnrichmentResult};
pub use service::{EnrichmentHandle, EnrichmentOutcome, EnrichmentService};
pub use timeout::call_with_timeout;
pub use validation::{non_blank, validate_schema, FieldViolation, Schema, SchemaViolations};
