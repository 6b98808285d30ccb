use crate::enrichment::error::EnrichmentError;
use crate::enrichment::schema::{EnrichmentRequest, EnrichmentResult};

const DEFAULT_TEMPLATE: &str = include_str!("../../prompts/incident_enrichment.txt");

/// Prompt with `{{incidentId}}`, `{{description}}`, `{{reportedBy}}` and
/// `{{createdAt}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fill the placeholders from `request`
    pub fn render(&self, request: &EnrichmentRequest) -> String {
        self.template
            .replace("{{incidentId}}", &request.incident_id)
            .replace("{{description}}", &request.description)
            .replace("{{reportedBy}}", &request.reported_by)
            .replace("{{createdAt}}", &request.created_at)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// Parse model output as an [`EnrichmentResult`]
///
/// Accepts a bare JSON object or one wrapped in prose or a markdown code
/// fence. Field completeness is not checked here.
pub fn parse_enrichment_output(text: &str) -> Result<EnrichmentResult, EnrichmentError> {
    let json = extract_json_object(text).ok_or_else(|| {
        EnrichmentError::Transient(
            "Failed to parse AI enrichment response: no JSON object found".to_string(),
        )
    })?;

    serde_json::from_str(json).map_err(|e| {
        EnrichmentError::Transient(format!("Failed to parse AI enrichment response: {}", e))
    })
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
