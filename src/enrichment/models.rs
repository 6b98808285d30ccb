use crate::enrichment::backoff::BackoffPolicy;
use crate::models::AiStatus;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Configuration for AI enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Total AI calls per enrichment, including the first
    pub max_attempts: u32,

    /// Per-attempt timeout (seconds)
    pub timeout_secs: u64,

    /// Delay before the first retry (milliseconds)
    pub initial_backoff_ms: u64,

    /// Upper bound of any retry delay (milliseconds)
    pub max_backoff_ms: u64,

    /// Growth factor between retry delays
    pub backoff_multiplier: f64,

    /// Fraction of each delay added as random jitter (0.0 - 1.0)
    pub jitter_ratio: f64,

    /// Seed for the jitter source; random when unset
    pub jitter_seed: Option<u64>,

    /// Hold the create response until enrichment settles or times out
    pub await_on_create: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 10,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter_ratio: 0.0,
            jitter_seed: None,
            await_on_create: false,
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
        .with_multiplier(self.backoff_multiplier)
        .with_jitter_ratio(self.jitter_ratio)
    }

    /// Longest an `enrich` call can take: every attempt timing out plus the
    /// un-jittered backoff between them. Saturates at `Duration::MAX`.
    pub fn worst_case_duration(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        let backoff = self
            .backoff_policy()
            .delays()
            .take(attempts as usize - 1)
            .fold(Duration::ZERO, Duration::saturating_add);
        self.timeout().saturating_mul(attempts).saturating_add(backoff)
    }
}

/// Summary of one `enrich` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub incident_id: Uuid,

    /// Terminal status written to the store
    pub status: AiStatus,

    /// AI calls made
    pub attempts: u32,

    /// Wall time spent, backoff included
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,

    /// Last failure when `status` is `Failed`
    pub error: Option<String>,
}

impl EnrichmentReport {
    pub fn is_enriched(&self) -> bool {
        self.status == AiStatus::Enriched
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
