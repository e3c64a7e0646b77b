/*!
 * Integration tests for the model catalog
 */

use promptlens::providers::ProviderId;
use promptlens::providers::models::{ModelCatalog, default_models, models_endpoint};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetchModels_anthropic_shouldSendVersionHeaderAndMapFields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("x-api-key", "ant-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "claude-3-7-sonnet-20250219", "display_name": "Claude 3.7 Sonnet", "type": "model" },
                { "id": "claude-3-5-haiku-20241022", "display_name": "Claude 3.5 Haiku", "type": "model" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let models = ModelCatalog::new()
        .fetch_models_from(ProviderId::Anthropic, "ant-key", &format!("{}/v1/models", server.uri()))
        .await;

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].id, "claude-3-7-sonnet-20250219");
    assert_eq!(models[1].label(), "Claude 3.5 Haiku");
}

#[tokio::test]
async fn test_fetchModels_openai_shouldKeepGptModels() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer sk-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                { "id": "gpt-4o", "object": "model" },
                { "id": "dall-e-3", "object": "model" },
                { "id": "gpt-3.5-turbo", "object": "model" }
            ]
        })))
        .mount(&server)
        .await;

    let models = ModelCatalog::new()
        .fetch_models_from(ProviderId::OpenAI, "sk-key", &server.uri())
        .await;

    let ids: Vec<&str> = models.iter().map(|model| model.id.as_str()).collect();
    assert_eq!(ids, vec!["gpt-4o", "gpt-3.5-turbo"]);
    assert_eq!(models[0].name.as_deref(), Some("gpt-4o"));
}

#[tokio::test]
async fn test_fetchModels_openrouter_shouldUseDescriptionAsDisplayName() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "meta-llama/llama-3-8b", "name": "Llama 3 8B", "description": "Meta's 8B model" },
                { "id": "mistral/tiny", "name": "Mistral Tiny" }
            ]
        })))
        .mount(&server)
        .await;

    let models = ModelCatalog::new()
        .fetch_models_from(ProviderId::OpenRouter, "or-key", &server.uri())
        .await;

    assert_eq!(models[0].display_name.as_deref(), Some("Meta's 8B model"));
    assert_eq!(models[1].display_name.as_deref(), Some("Mistral Tiny"));
}

#[tokio::test]
async fn test_fetchModels_errorStatus_shouldFallBackToDefaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let models = ModelCatalog::new()
        .fetch_models_from(ProviderId::Anthropic, "bad", &server.uri())
        .await;
    assert_eq!(models, default_models(ProviderId::Anthropic));
}

#[tokio::test]
async fn test_fetchModels_unexpectedShape_shouldFallBackToDefaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;

    let models = ModelCatalog::new()
        .fetch_models_from(ProviderId::OpenAI, "sk", &server.uri())
        .await;
    assert_eq!(models, default_models(ProviderId::OpenAI));
}

#[test]
fn test_modelsEndpoint_onlyLiveProviders_shouldHaveOne() {
    assert_eq!(models_endpoint(ProviderId::Anthropic), Some("https://api.anthropic.com/v1/models"));
    assert_eq!(models_endpoint(ProviderId::OpenAI), Some("https://api.openai.com/v1/models"));
    assert_eq!(models_endpoint(ProviderId::OpenRouter), Some("https://openrouter.ai/api/v1/models"));
    assert_eq!(models_endpoint(ProviderId::Local), None);
}
