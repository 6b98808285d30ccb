use mockito::Matcher;
use serde_json::json;
use smart_incident_service::enrichment::{
    AiEnrichmentClient, CancellationToken, EnrichmentConfig, EnrichmentCoordinator,
    EnrichmentError, EnrichmentRequest, ManualClock, OpenAiEnrichmentClient,
};
use smart_incident_service::models::{AiStatus, Incident};
use smart_incident_service::state::InMemoryStore;
use std::sync::Arc;

fn request() -> EnrichmentRequest {
    EnrichmentRequest {
        incident_id: "4f1c2d7e-0000-4000-8000-000000000001".to_string(),
        description: "Database connection pool exhausted".to_string(),
        reported_by: "sre-oncall".to_string(),
        created_at: "2026-01-19T18:00:00Z".to_string(),
    }
}

fn completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content, "refusal": null },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

fn client(server: &mockito::ServerGuard) -> OpenAiEnrichmentClient {
    OpenAiEnrichmentClient::new(&server.url(), "gpt-4o-mini", "test-key".to_string(), 0.0).unwrap()
}

#[tokio::test]
async fn test_successful_completion_is_parsed() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "response_format": { "type": "json_object" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(
            r#"{"severity":"HIGH","category":"DATABASE","summary":"Pool exhausted","recommendedAction":"Raise pool size"}"#,
        ))
        .create_async()
        .await;

    let result = client(&server)
        .enrich_incident(&request(), &CancellationToken::never())
        .await
        .unwrap();

    assert_eq!(result.severity, "HIGH");
    assert_eq!(result.category, "DATABASE");
    assert_eq!(result.summary, "Pool exhausted");
    assert_eq!(result.recommended_action, "Raise pool size");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_prompt_carries_incident_fields() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("Database connection pool exhausted".to_string()),
            Matcher::Regex("sre-oncall".to_string()),
        ]))
        .with_status(200)
        .with_body(completion(
            r#"{"severity":"LOW","category":"OTHER","summary":"s","recommendedAction":"a"}"#,
        ))
        .create_async()
        .await;

    client(&server)
        .enrich_incident(&request(), &CancellationToken::never())
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fenced_json_content_is_accepted() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion(
            "```json\n{\"severity\":\"MEDIUM\",\"category\":\"NETWORK\",\"summary\":\"s\",\"recommendedAction\":\"a\"}\n```",
        ))
        .create_async()
        .await;

    let result = client(&server)
        .enrich_incident(&request(), &CancellationToken::never())
        .await
        .unwrap();

    assert_eq!(result.severity, "MEDIUM");
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let err = client(&server)
        .enrich_incident(&request(), &CancellationToken::never())
        .await
        .unwrap_err();

    assert!(matches!(err, EnrichmentError::Transient(_)));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_unparseable_content_is_transient() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion("Sorry, I can only answer in prose."))
        .create_async()
        .await;

    let err = client(&server)
        .enrich_incident(&request(), &CancellationToken::never())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Failed to parse AI enrichment response"));
}

#[tokio::test]
async fn test_refusal_is_transient() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(
            json!({
                "choices": [{
                    "message": { "role": "assistant", "content": null, "refusal": "I can't help with that." }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client(&server)
        .enrich_incident(&request(), &CancellationToken::never())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("refused"));
}

#[tokio::test]
async fn test_coordinator_retries_provider_errors_then_fails() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("overloaded")
        .expect(3)
        .create_async()
        .await;

    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new());
    let coordinator = EnrichmentCoordinator::new(
        Arc::new(client(&server)),
        store,
        &EnrichmentConfig::default(),
    )
    .with_clock(clock.clone());

    let mut incident = Incident::new("Pods crash looping".to_string(), "k8s".to_string());
    let report = coordinator.enrich(&mut incident).await.unwrap();

    assert_eq!(report.status, AiStatus::Failed);
    assert_eq!(report.attempts, 3);
    assert_eq!(clock.sleeps().len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_coordinator_rejects_incomplete_answer() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion(
            r#"{"severity":"HIGH","summary":"s","recommendedAction":"a"}"#,
        ))
        .expect(3)
        .create_async()
        .await;

    let coordinator = EnrichmentCoordinator::new(
        Arc::new(client(&server)),
        Arc::new(InMemoryStore::new()),
        &EnrichmentConfig::default(),
    )
    .with_clock(Arc::new(ManualClock::new()));

    let mut incident = Incident::new("Pods crash looping".to_string(), "k8s".to_string());
    let report = coordinator.enrich(&mut incident).await.unwrap();

    assert_eq!(report.status, AiStatus::Failed);
    assert!(report.error.unwrap().contains("category"));
}
