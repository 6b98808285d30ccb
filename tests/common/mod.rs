//! Common test utilities for enrichment testing
//!
//! Scripted AI clients and a store that counts and optionally fails saves.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use smart_incident_service::enrichment::{
    AiEnrichmentClient, CancellationToken, EnrichmentError, EnrichmentRequest, EnrichmentResult,
};
use smart_incident_service::models::Incident;
use smart_incident_service::state::{InMemoryStore, IncidentStore};
use smart_incident_service::{AppError, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// What a scripted client does on one call
#[derive(Debug, Clone)]
pub enum Step {
    Answer(EnrichmentResult),
    Fail(&'static str),
    Hang,
}

pub fn good_result() -> EnrichmentResult {
    EnrichmentResult::new(
        "CRITICAL",
        "DATABASE",
        "Primary database unreachable",
        "Fail over to the replica",
    )
}

/// Result the schema rejects: `category` is blank
pub fn result_missing_category() -> EnrichmentResult {
    EnrichmentResult::new("HIGH", "", "Summary", "Action")
}

/// Client that plays a fixed script; the last step repeats once the script runs out
pub struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Step>,
    calls: AtomicUsize,
    requests: Mutex<Vec<EnrichmentRequest>>,
}

impl ScriptedClient {
    pub fn new(steps: Vec<Step>) -> Self {
        let last = steps.last().cloned().unwrap_or(Step::Answer(good_result()));
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(step: Step) -> Self {
        Self::new(vec![step])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<EnrichmentRequest> {
        self.requests.lock().clone()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock();
        match steps.pop_front() {
            Some(step) => step,
            None => self.last.lock().clone(),
        }
    }
}

#[async_trait]
impl AiEnrichmentClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn enrich_incident(
        &self,
        request: &EnrichmentRequest,
        _cancel: &CancellationToken,
    ) -> std::result::Result<EnrichmentResult, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        match self.next_step() {
            Step::Answer(result) => Ok(result),
            Step::Fail(message) => Err(EnrichmentError::Transient(message.to_string())),
            Step::Hang => std::future::pending().await,
        }
    }
}

/// Store that counts saves and can be told to fail them
pub struct CountingStore {
    inner: InMemoryStore,
    saves: AtomicUsize,
    /// Saves beyond this many fail
    fail_after: AtomicUsize,
}

impl Default for CountingStore {
    fn default() -> Self {
        Self {
            inner: InMemoryStore::new(),
            saves: AtomicUsize::new(0),
            fail_after: AtomicUsize::new(usize::MAX),
        }
    }
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self::failing_after(0)
    }

    /// Accept the first `saves` saves, then fail every one after
    pub fn failing_after(saves: usize) -> Self {
        let store = Self::default();
        store.fail_after.store(saves, Ordering::SeqCst);
        store
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IncidentStore for CountingStore {
    async fn save_incident(&self, incident: &Incident) -> Result<()> {
        let earlier = self.saves.fetch_add(1, Ordering::SeqCst);
        if earlier >= self.fail_after.load(Ordering::SeqCst) {
            return Err(AppError::Storage("disk unavailable".to_string()));
        }
        self.inner.save_incident(incident).await
    }

    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        self.inner.get_incident(id).await
    }

    async fn count_incidents(&self) -> Result<u64> {
        self.inner.count_incidents().await
    }
}

pub fn create_test_incident(description: &str) -> Incident {
    Incident::new(description.to_string(), "oncall@example.com".to_string())
}
