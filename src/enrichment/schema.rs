use crate::enrichment::validation::{non_blank, Schema};
use crate::models::Incident;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Data sent to the AI capability for one incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequest {
    #[validate(custom(function = "non_blank"))]
    pub incident_id: String,

    #[validate(custom(function = "non_blank"))]
    pub description: String,

    #[validate(custom(function = "non_blank"))]
    pub reported_by: String,

    /// RFC 3339 creation timestamp
    #[validate(custom(function = "non_blank"))]
    pub created_at: String,
}

impl EnrichmentRequest {
    /// Project the immutable facts of an incident
    pub fn from_incident(incident: &Incident) -> Self {
        Self {
            incident_id: incident.id.to_string(),
            description: incident.description.clone(),
            reported_by: incident.reported_by.clone(),
            created_at: incident.created_at.to_rfc3339(),
        }
    }
}

impl Schema for EnrichmentRequest {
    const NAME: &'static str = "EnrichmentRequest";
}

/// Structured output of the AI capability
///
/// Missing fields deserialize as empty strings so that an incomplete answer
/// surfaces as a schema violation rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub severity: String,

    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub category: String,

    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub summary: String,

    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub recommended_action: String,
}

impl EnrichmentResult {
    pub fn new(
        severity: impl Into<String>,
        category: impl Into<String>,
        summary: impl Into<String>,
        recommended_action: impl Into<String>,
    ) -> Self {
        Self {
            severity: severity.into(),
            category: category.into(),
            summary: summary.into(),
            recommended_action: recommended_action.into(),
        }
    }
}

impl Schema for EnrichmentResult {
    const NAME: &'static str = "EnrichmentResult";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::validation::validate_schema;

    #[test]
    fn test_request_projection() {
        let incident = Incident::new("Queue backlog growing".to_string(), "sre".to_string());
        let request = EnrichmentRequest::from_incident(&incident);

        assert_eq!(request.incident_id, incident.id.to_string());
        assert_eq!(request.description, "Queue backlog growing");
        assert_eq!(request.reported_by, "sre");
        assert_eq!(request.created_at, incident.created_at.to_rfc3339());
        assert!(validate_schema(&request).is_ok());
    }

    #[test]
    fn test_blank_description_is_rejected() {
        let incident = Incident::new("   ".to_string(), "sre".to_string());
        let request = EnrichmentRequest::from_incident(&incident);

        let violations = validate_schema(&request).unwrap_err();
        assert_eq!(violations.fields(), vec!["description"]);
    }

    #[test]
    fn test_result_missing_category_deserializes_but_fails_validation() {
        let result: EnrichmentResult = serde_json::from_str(
            r#"{"severity":"HIGH","summary":"s","recommendedAction":"a"}"#,
        )
        .unwrap();

        assert!(result.category.is_empty());
        let violations = validate_schema(&result).unwrap_err();
        assert!(violations.has_field("category"));
        assert_eq!(violations.violations.len(), 1);
    }

    #[test]
    fn test_result_wire_names() {
        let result = EnrichmentResult::new("LOW", "PERFORMANCE", "Slow queries", "Add index");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["recommendedAction"], "Add index");
    }
}
