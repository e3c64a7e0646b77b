/*!
 * Provider registry and request/response adapters.
 *
 * Every supported text-generation API is described twice here:
 * - a static `ProviderProfile` (endpoint and default model), looked up by `ProviderId`
 * - a `Provider` adapter that builds the HTTP request for a task and pulls
 *   generated text out of the provider's JSON payloads
 *
 * Unknown identifiers resolve to the local (Ollama-compatible) provider.
 */

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use once_cell::sync::Lazy;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stream::Framing;
use crate::task::TaskRequest;

pub mod anthropic;
pub mod cohere;
pub mod huggingface;
pub mod local;
pub mod mock;
pub mod models;
pub mod openai;
pub mod replicate;
pub mod together;

/// Known provider identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderId {
    OpenAI,
    OpenRouter,
    Anthropic,
    Cohere,
    HuggingFace,
    Replicate,
    Together,
    /// Local or self-hosted endpoint; also the fallback for anything unrecognized
    #[default]
    Local,
}

impl ProviderId {
    /// All providers, in registry order
    pub const ALL: [ProviderId; 8] = [
        ProviderId::OpenAI,
        ProviderId::OpenRouter,
        ProviderId::Anthropic,
        ProviderId::Cohere,
        ProviderId::HuggingFace,
        ProviderId::Replicate,
        ProviderId::Together,
        ProviderId::Local,
    ];

    /// Lowercase key used in configuration and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::OpenRouter => "openrouter",
            Self::Anthropic => "anthropic",
            Self::Cohere => "cohere",
            Self::HuggingFace => "huggingface",
            Self::Replicate => "replicate",
            Self::Together => "together",
            Self::Local => "local",
        }
    }

    /// Human readable provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::OpenRouter => "OpenRouter",
            Self::Anthropic => "Anthropic",
            Self::Cohere => "Cohere",
            Self::HuggingFace => "Hugging Face",
            Self::Replicate => "Replicate",
            Self::Together => "Together AI",
            Self::Local => "Custom Provider",
        }
    }

    /// Providers offered in the settings picker
    pub fn selectable() -> &'static [ProviderId] {
        &[ProviderId::Anthropic, ProviderId::OpenAI]
    }

    /// Whether requests to this provider need an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Local)
    }

    /// Resolve an identifier, falling back to the local provider when unknown
    pub fn lookup(value: &str) -> Self {
        value.parse().unwrap_or(Self::Local)
    }

    /// Static profile for this provider
    pub fn profile(&self) -> &'static ProviderProfile {
        // PROFILES follows declaration order
        &PROFILES[*self as usize]
    }

    /// Generation endpoint from the registry
    pub fn endpoint(&self) -> &'static str {
        self.profile().endpoint
    }

    /// Default model from the registry
    pub fn default_model(&self) -> &'static str {
        self.profile().default_model
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "anthropic" => Ok(Self::Anthropic),
            "cohere" => Ok(Self::Cohere),
            "huggingface" => Ok(Self::HuggingFace),
            "replicate" => Ok(Self::Replicate),
            "together" => Ok(Self::Together),
            "local" | "custom" | "ollama" => Ok(Self::Local),
            _ => Err(anyhow::anyhow!("Invalid provider type: {}", s)),
        }
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self::lookup(&value)
    }
}

impl From<ProviderId> for String {
    fn from(value: ProviderId) -> Self {
        value.as_str().to_string()
    }
}

/// Immutable endpoint and model defaults for one provider
#[derive(Debug, PartialEq)]
pub struct ProviderProfile {
    pub id: ProviderId,
    pub endpoint: &'static str,
    pub default_model: &'static str,
}

static PROFILES: [ProviderProfile; 8] = [
    ProviderProfile {
        id: ProviderId::OpenAI,
        endpoint: "https://api.openai.com/v1/chat/completions",
        default_model: "gpt-3.5-turbo",
    },
    ProviderProfile {
        id: ProviderId::OpenRouter,
        endpoint: "https://openrouter.ai/api/v1/chat/completions",
        default_model: "meta-llama/llama-2-7b-chat",
    },
    ProviderProfile {
        id: ProviderId::Anthropic,
        endpoint: "https://api.anthropic.com/v1/messages",
        default_model: "claude-3-7-sonnet-20250219",
    },
    ProviderProfile {
        id: ProviderId::Cohere,
        endpoint: "https://api.cohere.ai/v1/generate",
        default_model: "command",
    },
    ProviderProfile {
        id: ProviderId::HuggingFace,
        endpoint: "https://api-inference.huggingface.co/models",
        default_model: "microsoft/DialoGPT-medium",
    },
    ProviderProfile {
        id: ProviderId::Replicate,
        endpoint: "https://api.replicate.com/v1/predictions",
        default_model: "meta/llama-2-7b-chat",
    },
    ProviderProfile {
        id: ProviderId::Together,
        endpoint: "https://api.together.xyz/inference",
        default_model: "togethercomputer/llama-2-7b-chat",
    },
    ProviderProfile {
        id: ProviderId::Local,
        endpoint: "http://localhost:11434/api/generate",
        default_model: "llama3.1",
    },
];

/// Endpoint for a provider identifier; unknown identifiers get the local endpoint
pub fn endpoint_for(provider: &str) -> &'static str {
    ProviderId::lookup(provider).endpoint()
}

/// Default model for a provider identifier; unknown identifiers get the local model
pub fn default_model_for(provider: &str) -> &'static str {
    ProviderId::lookup(provider).default_model()
}

/// A fully described outbound HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl HttpRequestSpec {
    /// Start a JSON POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Value::Null,
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the JSON body
    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Look up a header value, ignoring name case
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Common capability of every provider adapter
///
/// Adapters are stateless; one shared instance per provider lives in the
/// registry table and is reused by every request.
pub trait Provider: Send + Sync + Debug {
    /// Provider this adapter serves
    fn id(&self) -> ProviderId;

    /// Build the HTTP request for a task
    ///
    /// # Arguments
    /// * `task` - The task to run; its config snapshot supplies key, model and endpoint
    /// * `streaming` - Value for the body's `stream` flag
    fn build(&self, task: &TaskRequest, streaming: bool) -> HttpRequestSpec;

    /// Extract generated text from a full response or from one streamed frame
    ///
    /// Never fails; returns an empty string when no known field is present.
    fn extract_text(&self, payload: &Value) -> String;

    /// How the streamed body is framed
    fn framing(&self) -> Framing {
        Framing::Sse
    }

    /// Whether a decoded frame marks the end of the stream on its own
    fn is_final_frame(&self, _payload: &Value) -> bool {
        false
    }
}

/// First non-empty string found at the given JSON pointers, in order
pub(crate) fn extract_first(payload: &Value, pointers: &[&str]) -> String {
    pointers
        .iter()
        .filter_map(|pointer| payload.pointer(pointer))
        .filter_map(Value::as_str)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

/// Bearer authorization value
pub(crate) fn bearer(api_key: &str) -> String {
    format!("Bearer {}", api_key)
}

static REGISTRY: Lazy<HashMap<ProviderId, Arc<dyn Provider>>> = Lazy::new(|| {
    let adapters: Vec<Arc<dyn Provider>> = vec![
        Arc::new(openai::ChatCompletions::new(ProviderId::OpenAI)),
        Arc::new(openai::ChatCompletions::new(ProviderId::OpenRouter)),
        Arc::new(anthropic::Anthropic),
        Arc::new(cohere::Cohere),
        Arc::new(huggingface::HuggingFace),
        Arc::new(replicate::Replicate),
        Arc::new(together::Together),
        Arc::new(local::Local),
    ];
    adapters.into_iter().map(|adapter| (adapter.id(), adapter)).collect()
});

/// Adapter for a provider
pub fn provider_for(id: ProviderId) -> Arc<dyn Provider> {
    match REGISTRY.get(&id) {
        Some(adapter) => Arc::clone(adapter),
        None => Arc::new(local::Local),
    }
}
