use crate::enrichment::backoff::{BackoffPolicy, JitterSource, NoJitter, SeededJitter};
use crate::enrichment::client::AiEnrichmentClient;
use crate::enrichment::clock::{Clock, TokioClock};
use crate::enrichment::error::EnrichmentError;
use crate::enrichment::models::{EnrichmentConfig, EnrichmentReport};
use crate::enrichment::schema::{EnrichmentRequest, EnrichmentResult};
use crate::enrichment::timeout::call_with_timeout;
use crate::enrichment::validation::validate_schema;
use crate::metrics::{
    ENRICHMENT_ATTEMPTS_TOTAL, ENRICHMENT_DURATION_SECONDS, ENRICHMENT_RESULTS_TOTAL,
    ENRICHMENT_TIMEOUTS_TOTAL,
};
use crate::models::Incident;
use crate::state::IncidentStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Drives one incident from its current state to `ENRICHED` or `FAILED`
///
/// Every accepted call makes between one and `max_attempts` AI calls, each
/// bounded by the per-attempt timeout, and saves the incident exactly once.
/// A request that breaks its schema is rejected before any call or save.
pub struct EnrichmentCoordinator {
    client: Arc<dyn AiEnrichmentClient>,
    store: Arc<dyn IncidentStore>,
    clock: Arc<dyn Clock>,
    jitter: Arc<dyn JitterSource>,
    max_attempts: u32,
    timeout: Duration,
    backoff: BackoffPolicy,
}

impl EnrichmentCoordinator {
    pub fn new(
        client: Arc<dyn AiEnrichmentClient>,
        store: Arc<dyn IncidentStore>,
        config: &EnrichmentConfig,
    ) -> Self {
        let backoff = config.backoff_policy();
        let jitter: Arc<dyn JitterSource> = if backoff.jitter_ratio > 0.0 {
            Arc::new(SeededJitter::new(
                config.jitter_seed.unwrap_or_else(rand::random),
            ))
        } else {
            Arc::new(NoJitter)
        };

        Self {
            client,
            store,
            clock: Arc::new(TokioClock),
            jitter,
            max_attempts: config.max_attempts.max(1),
            timeout: config.timeout(),
            backoff,
        }
    }

    /// Replace the clock used for backoff sleeps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the jitter source
    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Enrich `incident` in place and persist it
    ///
    /// Returns `Validation` when the outbound request is invalid and `Store`
    /// when the final save fails. AI failures are not errors here; they end in
    /// a saved `FAILED` incident and a report carrying the cause.
    #[instrument(skip(self, incident), fields(incident_id = %incident.id, client = self.client.name()))]
    pub async fn enrich(
        &self,
        incident: &mut Incident,
    ) -> Result<EnrichmentReport, EnrichmentError> {
        let started = Instant::now();

        let request = EnrichmentRequest::from_incident(incident);
        if let Err(violations) = validate_schema(&request) {
            warn!(
                fields = ?violations.fields(),
                "Rejecting enrichment of invalid incident"
            );
            return Err(EnrichmentError::Validation(violations));
        }

        if incident.is_enrichment_settled() {
            debug!(status = %incident.ai_status, "Re-enriching settled incident");
        }

        let mut delay = self.backoff.initial_delay;
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_attempts {
            attempts += 1;

            match self.attempt(&request).await {
                Ok(result) => {
                    ENRICHMENT_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
                    debug!(attempt = attempts, "AI enrichment attempt succeeded");
                    incident.mark_enriched(
                        result.severity,
                        result.category,
                        result.summary,
                        result.recommended_action,
                    );
                    last_error = None;
                    break;
                }
                Err(e) => {
                    ENRICHMENT_ATTEMPTS_TOTAL.with_label_values(&[e.kind()]).inc();
                    if matches!(e, EnrichmentError::Timeout(_)) {
                        ENRICHMENT_TIMEOUTS_TOTAL.inc();
                    }

                    warn!(
                        attempt = attempts,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "AI enrichment attempt failed"
                    );

                    last_error = Some(e);

                    if attempts < self.max_attempts {
                        let wait = self.backoff.apply_jitter(delay, self.jitter.as_ref());
                        debug!(delay_ms = wait.as_millis() as u64, "Waiting before retry");
                        self.clock.sleep(wait).await;
                        delay = self.backoff.next_delay(delay);
                    }
                }
            }
        }

        let error_message = last_error.map(|e| {
            let message = format!("Enrichment failed after {} attempt(s): {}", attempts, e);
            incident.mark_failed(message.clone());
            message
        });

        let elapsed = started.elapsed();
        ENRICHMENT_DURATION_SECONDS.observe(elapsed.as_secs_f64());

        self.store
            .save_incident(incident)
            .await
            .map_err(EnrichmentError::Store)?;

        ENRICHMENT_RESULTS_TOTAL
            .with_label_values(&[incident.ai_status.to_string().as_str()])
            .inc();

        match &error_message {
            None => info!(attempts, "Incident enriched"),
            Some(message) => error!(attempts, error = %message, "Incident enrichment failed"),
        }

        Ok(EnrichmentReport {
            incident_id: incident.id,
            status: incident.ai_status,
            attempts,
            elapsed,
            error: error_message,
        })
    }

    /// One timed AI call whose answer must satisfy the result schema
    async fn attempt(
        &self,
        request: &EnrichmentRequest,
    ) -> Result<EnrichmentResult, EnrichmentError> {
        let result =
            call_with_timeout(Arc::clone(&self.client), request.clone(), self.timeout).await?;
        validate_schema(&result).map_err(EnrichmentError::Validation)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::cancel::CancellationToken;
    use crate::enrichment::client::MockAiEnrichmentClient;
    use crate::enrichment::clock::ManualClock;
    use crate::models::AiStatus;
    use crate::state::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then answers
    struct FlakyClient {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl AiEnrichmentClient for FlakyClient {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn enrich_incident(
            &self,
            _request: &EnrichmentRequest,
            _cancel: &CancellationToken,
        ) -> Result<EnrichmentResult, EnrichmentError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(EnrichmentError::Transient("503 Service Unavailable".to_string()))
            } else {
                Ok(EnrichmentResult::new("LOW", "NETWORK", "Link flap", "Check cabling"))
            }
        }
    }

    fn coordinator(
        client: Arc<dyn AiEnrichmentClient>,
        store: Arc<InMemoryStore>,
        clock: Arc<ManualClock>,
    ) -> EnrichmentCoordinator {
        EnrichmentCoordinator::new(client, store, &EnrichmentConfig::default()).with_clock(clock)
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new());
        let coordinator = coordinator(
            Arc::new(MockAiEnrichmentClient::new()),
            Arc::clone(&store),
            Arc::clone(&clock),
        );

        let mut incident = Incident::new("Disk full on db-1".to_string(), "ops".to_string());
        let report = coordinator.enrich(&mut incident).await.unwrap();

        assert_eq!(report.status, AiStatus::Enriched);
        assert_eq!(report.attempts, 1);
        assert!(report.error.is_none());
        assert!(clock.sleeps().is_empty());

        let stored = store.get_incident(&incident.id).await.unwrap().unwrap();
        assert_eq!(stored.severity.as_deref(), Some("HIGH"));
        assert_eq!(stored.ai_status, AiStatus::Enriched);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(FlakyClient {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let coordinator = coordinator(client.clone(), Arc::clone(&store), Arc::clone(&clock));

        let mut incident = Incident::new("Packet loss".to_string(), "noc".to_string());
        let report = coordinator.enrich(&mut incident).await.unwrap();

        assert_eq!(report.status, AiStatus::Enriched);
        assert_eq!(report.attempts, 3);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert_eq!(incident.category.as_deref(), Some("NETWORK"));
    }

    #[tokio::test]
    async fn test_exhausted_retries_mark_failed() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(FlakyClient {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        });
        let coordinator = coordinator(client.clone(), Arc::clone(&store), Arc::clone(&clock));

        let mut incident = Incident::new("Packet loss".to_string(), "noc".to_string());
        let report = coordinator.enrich(&mut incident).await.unwrap();

        assert_eq!(report.status, AiStatus::Failed);
        assert_eq!(report.attempts, 3);
        assert_eq!(clock.total_slept(), Duration::from_secs(3));

        let message = incident.ai_error_message.clone().unwrap();
        assert!(message.starts_with("Enrichment failed after 3 attempt(s)"));
        assert!(message.contains("503 Service Unavailable"));
        assert_eq!(report.error.as_deref(), Some(message.as_str()));
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_without_calls() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(FlakyClient {
            failures: 0,
            calls: AtomicU32::new(0),
        });
        let coordinator = coordinator(client.clone(), Arc::clone(&store), clock);

        let mut incident = Incident::new(" ".to_string(), "noc".to_string());
        let err = coordinator.enrich(&mut incident).await.unwrap_err();

        match err {
            EnrichmentError::Validation(violations) => {
                assert!(violations.has_field("description"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.count_incidents().await.unwrap(), 0);
        assert_eq!(incident.ai_status, AiStatus::Pending);
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        let config = EnrichmentConfig {
            max_attempts: 0,
            ..Default::default()
        };
        let coordinator = EnrichmentCoordinator::new(
            Arc::new(MockAiEnrichmentClient::new()),
            Arc::new(InMemoryStore::new()),
            &config,
        );
        assert_eq!(coordinator.max_attempts(), 1);
        assert_eq!(coordinator.timeout(), Duration::from_secs(10));
    }
}
