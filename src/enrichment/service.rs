use crate::enrichment::coordinator::EnrichmentCoordinator;
use crate::enrichment::error::EnrichmentError;
use crate::enrichment::models::EnrichmentReport;
use crate::models::Incident;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, Instrument};
use uuid::Uuid;

/// Runs enrichment off the caller's path
#[derive(Clone)]
pub struct EnrichmentService {
    coordinator: Arc<EnrichmentCoordinator>,
    in_flight: Arc<AtomicUsize>,
}

/// Settled incident together with the run summary
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub incident: Incident,
    pub report: EnrichmentReport,
}

/// Awaitable handle to one background enrichment
///
/// Dropping the handle does not stop the enrichment.
#[derive(Debug)]
pub struct EnrichmentHandle {
    incident_id: Uuid,
    task: JoinHandle<Result<EnrichmentOutcome, EnrichmentError>>,
}

impl EnrichmentHandle {
    pub fn incident_id(&self) -> Uuid {
        self.incident_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the enrichment to settle
    pub async fn wait(self) -> Result<EnrichmentOutcome, EnrichmentError> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(EnrichmentError::Transient(format!(
                "Enrichment task failed: {}",
                e
            ))),
        }
    }
}

/// Counts one running enrichment until dropped, panics included
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EnrichmentService {
    pub fn new(coordinator: Arc<EnrichmentCoordinator>) -> Self {
        Self {
            coordinator,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn coordinator(&self) -> &EnrichmentCoordinator {
        &self.coordinator
    }

    /// Number of enrichments started and not yet settled
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Enrich on the calling task
    pub async fn enrich_incident(
        &self,
        mut incident: Incident,
    ) -> Result<EnrichmentOutcome, EnrichmentError> {
        let report = self.coordinator.enrich(&mut incident).await?;
        Ok(EnrichmentOutcome { incident, report })
    }

    /// Start enrichment in the background and return immediately
    ///
    /// Failures are logged here; the caller only sees them if it waits on the
    /// handle.
    pub fn enrich_incident_async(&self, incident: Incident) -> EnrichmentHandle {
        let incident_id = incident.id;
        let coordinator = Arc::clone(&self.coordinator);
        let in_flight = Arc::clone(&self.in_flight);

        let guard = InFlightGuard::enter(in_flight);
        info!(incident_id = %incident_id, "Triggering AI enrichment");

        let task = tokio::spawn(
            async move {
                let _guard = guard;
                let mut incident = incident;
                let outcome = coordinator.enrich(&mut incident).await;

                match outcome {
                    Ok(report) => Ok(EnrichmentOutcome { incident, report }),
                    Err(e) => {
                        error!(error = %e, kind = e.kind(), "Background enrichment aborted");
                        Err(e)
                    }
                }
            }
            .instrument(tracing::info_span!("enrichment", incident_id = %incident_id)),
        );

        EnrichmentHandle { incident_id, task }
    }
}
