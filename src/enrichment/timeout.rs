use crate::enrichment::cancel::cancellation_pair;
use crate::enrichment::client::AiEnrichmentClient;
use crate::enrichment::error::EnrichmentError;
use crate::enrichment::schema::{EnrichmentRequest, EnrichmentResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// How long an abandoned call may take to wind down after its token fires
pub const CANCEL_GRACE: Duration = Duration::from_millis(500);

/// Run one AI call with a hard time limit
///
/// The call runs on its own task so a client that never yields cannot hold
/// the caller past `limit`. On expiry the caller gets `Timeout` at once while
/// the client's token is cancelled. The task then has [`CANCEL_GRACE`] to
/// finish on its own before it is aborted.
pub async fn call_with_timeout(
    client: Arc<dyn AiEnrichmentClient>,
    request: EnrichmentRequest,
    limit: Duration,
) -> Result<EnrichmentResult, EnrichmentError> {
    let (cancel_handle, token) = cancellation_pair();

    let mut task = tokio::spawn(async move { client.enrich_incident(&request, &token).await });

    match timeout(limit, &mut task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(EnrichmentError::Transient(format!(
            "AI call task failed: {}",
            join_error
        ))),
        Err(_) => {
            cancel_handle.cancel();
            debug!(limit_ms = limit.as_millis() as u64, "AI call abandoned after timeout");

            tokio::spawn(async move {
                let _cancel_handle = cancel_handle;
                if timeout(CANCEL_GRACE, &mut task).await.is_err() {
                    task.abort();
                    debug!("AI call ignored cancellation, task aborted");
                }
            });

            Err(EnrichmentError::Timeout(limit))
        }
    }
}
