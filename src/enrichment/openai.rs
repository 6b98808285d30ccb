use crate::config::AiConfig;
use crate::enrichment::cancel::CancellationToken;
use crate::enrichment::client::AiEnrichmentClient;
use crate::enrichment::error::EnrichmentError;
use crate::enrichment::prompt::{parse_enrichment_output, PromptTemplate};
use crate::enrichment::schema::{EnrichmentRequest, EnrichmentResult};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "You classify operational incidents and answer only with the requested JSON object.";

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct OpenAiEnrichmentClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    prompt: PromptTemplate,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl OpenAiEnrichmentClient {
    /// Create a client reading the API key from the configured environment variable
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            AppError::Configuration(format!(
                "AI provider API key not found in environment variable {}",
                config.api_key_env
            ))
        })?;

        Self::new(&config.base_url, &config.model, api_key, config.temperature)
    }

    pub fn new(base_url: &str, model: &str, api_key: String, temperature: f32) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("smart-incident-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            temperature,
            prompt: PromptTemplate::default(),
        })
    }

    /// Replace the embedded prompt template
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    async fn complete(&self, prompt: &str) -> std::result::Result<String, EnrichmentError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EnrichmentError::Transient(format!("Failed to connect to AI provider: {}", e))
                } else {
                    EnrichmentError::Transient(format!("AI provider request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Transient(format!(
                "AI provider returned status {}: {}",
                status, text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            EnrichmentError::Transient(format!("Malformed AI provider response: {}", e))
        })?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| {
                EnrichmentError::Transient("AI provider returned no choices".to_string())
            })?;

        if let Some(refusal) = message.refusal {
            return Err(EnrichmentError::Transient(format!(
                "Model refused the request: {}",
                refusal
            )));
        }

        message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| EnrichmentError::Transient("AI provider returned empty content".to_string()))
    }
}

#[async_trait]
impl AiEnrichmentClient for OpenAiEnrichmentClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn enrich_incident(
        &self,
        request: &EnrichmentRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<EnrichmentResult, EnrichmentError> {
        let prompt = self.prompt.render(request);

        let content = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(EnrichmentError::Transient("AI request cancelled".to_string()));
            }
            content = self.complete(&prompt) => content?,
        };

        debug!(
            incident_id = %request.incident_id,
            response_length = content.len(),
            "AI provider answered"
        );

        parse_enrichment_output(&content)
    }
}
