use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Represents a reported incident and its AI enrichment state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier
    pub id: Uuid,

    /// Short description supplied by the reporter
    pub description: String,

    /// Name or identifier of the reporter
    pub reported_by: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// AI-derived severity label (e.g. "HIGH")
    pub severity: Option<String>,

    /// AI-derived category label (e.g. "NETWORK")
    pub category: Option<String>,

    /// AI-written summary
    pub ai_summary: Option<String>,

    /// AI-recommended remediation
    pub recommended_action: Option<String>,

    /// Enrichment status
    pub ai_status: AiStatus,

    /// Cause of the last enrichment failure, set only while `ai_status` is `Failed`
    pub ai_error_message: Option<String>,
}

impl Incident {
    /// Create a new, not yet enriched incident
    pub fn new(description: String, reported_by: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            description,
            reported_by,
            created_at: Utc::now(),
            severity: None,
            category: None,
            ai_summary: None,
            recommended_action: None,
            ai_status: AiStatus::Pending,
            ai_error_message: None,
        }
    }

    /// Record a successful enrichment
    pub fn mark_enriched(
        &mut self,
        severity: String,
        category: String,
        summary: String,
        recommended_action: String,
    ) {
        self.severity = Some(severity);
        self.category = Some(category);
        self.ai_summary = Some(summary);
        self.recommended_action = Some(recommended_action);
        self.ai_status = AiStatus::Enriched;
        self.ai_error_message = None;
    }

    /// Record a terminal enrichment failure. Previously enriched fields are kept.
    pub fn mark_failed(&mut self, message: String) {
        self.ai_status = AiStatus::Failed;
        self.ai_error_message = Some(message);
    }

    /// Whether enrichment has reached a terminal state
    pub fn is_enrichment_settled(&self) -> bool {
        self.ai_status.is_terminal()
    }
}

/// AI enrichment status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AiStatus {
    #[default]
    Pending,
    Enriched,
    Failed,
}

impl AiStatus {
    /// `Enriched` and `Failed` are terminal; `Pending` is not
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AiStatus::Pending)
    }
}
