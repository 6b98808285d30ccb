use crate::api::AppState;
use crate::enrichment::non_blank;
use crate::error::{AppError, Result};
use crate::metrics::INCIDENTS_CREATED_TOTAL;
use crate::models::{AiStatus, Incident};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        enrichments_in_flight: state.enrichment.in_flight(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub enrichments_in_flight: usize,
}

/// Record an incident and trigger its AI enrichment
///
/// The incident is saved as `PENDING` before enrichment starts. Unless the
/// state asks to wait, the response carries that pending snapshot. While
/// waiting, an enrichment that aborts (its terminal save failed) fails the
/// request; one still running when the wait ends yields the pending snapshot.
pub async fn create_incident(
    State(state): State<AppState>,
    Json(request): Json<CreateIncidentRequest>,
) -> Result<(StatusCode, Json<IncidentResponse>)> {
    request.validate()?;

    let incident = Incident::new(request.description, request.reported_by);
    state.store.save_incident(&incident).await?;
    INCIDENTS_CREATED_TOTAL.inc();

    tracing::info!(
        incident_id = %incident.id,
        reported_by = %incident.reported_by,
        "Incident created"
    );

    let handle = state.enrichment.enrich_incident_async(incident.clone());

    let incident = match state.response_wait {
        None => incident,
        Some(wait) => match tokio::time::timeout(wait, handle.wait()).await {
            Ok(Ok(outcome)) => outcome.incident,
            Ok(Err(e)) => {
                tracing::warn!(incident_id = %incident.id, error = %e, "Enrichment did not settle");
                return Err(AppError::from(e));
            }
            Err(_) => {
                tracing::debug!(incident_id = %incident.id, "Responding before enrichment settled");
                incident
            }
        },
    };

    Ok((StatusCode::CREATED, Json(IncidentResponse::from(incident))))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    #[validate(custom(function = "non_blank"), length(max = 4000))]
    pub description: String,
    #[validate(custom(function = "non_blank"), length(max = 200))]
    pub reported_by: String,
}

/// Get an incident by ID
pub async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IncidentResponse>> {
    let incident = state
        .store
        .get_incident(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))?;

    Ok(Json(IncidentResponse::from(incident)))
}

/// Incident response DTO
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentResponse {
    pub id: Uuid,
    pub description: String,
    pub reported_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub severity: Option<String>,
    pub category: Option<String>,
    pub ai_summary: Option<String>,
    pub recommended_action: Option<String>,
    pub ai_status: AiStatus,
    pub ai_error_message: Option<String>,
}

impl From<Incident> for IncidentResponse {
    fn from(incident: Incident) -> Self {
        Self {
            id: incident.id,
            description: incident.description,
            reported_by: incident.reported_by,
            created_at: incident.created_at,
            severity: incident.severity,
            category: incident.category,
            ai_summary: incident.ai_summary,
            recommended_action: incident.recommended_action,
            ai_status: incident.ai_status,
            ai_error_message: incident.ai_error_message,
        }
    }
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}
