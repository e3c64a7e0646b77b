/*!
 * Model catalog.
 *
 * Lists the models a provider offers. Anthropic, OpenAI and OpenRouter are
 * queried live; every other provider has a fixed list. A failed query
 * never surfaces as an error, the fixed list is returned instead.
 */

use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::anthropic::ANTHROPIC_VERSION;
use crate::providers::{ProviderId, bearer};

/// One selectable model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Model {
    fn fixed(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            display_name: Some(name.to_string()),
        }
    }

    /// Best label for listing
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .filter(|label| !label.is_empty())
            .unwrap_or(&self.id)
    }
}

/// List response shared by the three model endpoints
#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
struct RemoteModel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Live listing endpoint, for providers that have one
pub fn models_endpoint(provider: ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::Anthropic => Some("https://api.anthropic.com/v1/models"),
        ProviderId::OpenAI => Some("https://api.openai.com/v1/models"),
        ProviderId::OpenRouter => Some("https://openrouter.ai/api/v1/models"),
        _ => None,
    }
}

/// Fixed model list for a provider
pub fn default_models(provider: ProviderId) -> Vec<Model> {
    match provider {
        ProviderId::Cohere => vec![
            Model::fixed("command", "Command"),
            Model::fixed("command-light", "Command Light"),
        ],
        ProviderId::HuggingFace => vec![
            Model::fixed("microsoft/DialoGPT-medium", "DialoGPT Medium"),
            Model::fixed("gpt2", "GPT-2"),
        ],
        ProviderId::Replicate => vec![
            Model::fixed("meta/llama-2-7b-chat", "Llama 2 7B Chat"),
            Model::fixed("meta/llama-2-13b-chat", "Llama 2 13B Chat"),
        ],
        ProviderId::Together => vec![
            Model::fixed("togethercomputer/llama-2-7b-chat", "Llama 2 7B Chat"),
            Model::fixed("togethercomputer/llama-2-13b-chat", "Llama 2 13B Chat"),
        ],
        ProviderId::Anthropic => vec![Model::fixed("claude-3-7-sonnet-20250219", "Claude 3.7 Sonnet")],
        ProviderId::OpenAI => vec![Model::fixed("gpt-3.5-turbo", "gpt-3.5-turbo")],
        ProviderId::OpenRouter => vec![Model::fixed("meta-llama/llama-2-7b-chat", "Llama 2 7B Chat")],
        ProviderId::Local => vec![
            Model::fixed("llama3.1", "Llama 3.1"),
            Model::fixed("llama3.2", "Llama 3.2"),
        ],
    }
}

/// Client for provider model listings
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    client: Client,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Models for a provider, falling back to the fixed list on any failure
    pub async fn fetch_models(&self, provider: ProviderId, api_key: &str) -> Vec<Model> {
        match models_endpoint(provider) {
            Some(url) => self.fetch_models_from(provider, api_key, url).await,
            None => default_models(provider),
        }
    }

    /// Same as `fetch_models`, against an explicit listing URL
    pub async fn fetch_models_from(&self, provider: ProviderId, api_key: &str, url: &str) -> Vec<Model> {
        match self.request_models(provider, api_key, url).await {
            Ok(models) => {
                debug!("Fetched {} models from {}", models.len(), provider.display_name());
                models
            }
            Err(e) => {
                warn!("Error fetching {} models, using defaults: {}", provider.display_name(), e);
                default_models(provider)
            }
        }
    }

    async fn request_models(&self, provider: ProviderId, api_key: &str, url: &str) -> Result<Vec<Model>, ProviderError> {
        let request = match provider {
            ProviderId::Anthropic => self
                .client
                .get(url)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            _ => self.client.get(url).header("Authorization", bearer(api_key)),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(convert_models(provider, list.data))
    }
}

fn convert_models(provider: ProviderId, remote: Vec<RemoteModel>) -> Vec<Model> {
    match provider {
        ProviderId::OpenAI => remote
            .into_iter()
            .filter(|model| model.id.contains("gpt"))
            .map(|model| Model {
                name: Some(model.id.clone()),
                display_name: Some(model.id.clone()),
                id: model.id,
            })
            .collect(),
        ProviderId::OpenRouter => remote
            .into_iter()
            .map(|model| {
                let display_name = model
                    .description
                    .filter(|description| !description.is_empty())
                    .or_else(|| model.name.clone());
                Model {
                    id: model.id,
                    name: model.name,
                    display_name,
                }
            })
            .collect(),
        _ => remote
            .into_iter()
            .map(|model| Model {
                id: model.id,
                name: model.name,
                display_name: model.display_name,
            })
            .collect(),
    }
}
