/*!
 * OpenAI-compatible chat completions (OpenAI and OpenRouter).
 */

use serde_json::{Value, json};

use crate::prompts::build_prompt;
use crate::providers::{HttpRequestSpec, Provider, ProviderId, bearer, extract_first};
use crate::task::TaskRequest;

/// Chat completions adapter, shared by providers speaking the OpenAI protocol
#[derive(Debug, Clone, Copy)]
pub struct ChatCompletions {
    id: ProviderId,
}

impl ChatCompletions {
    /// Create an adapter for an OpenAI-compatible provider
    pub fn new(id: ProviderId) -> Self {
        Self { id }
    }
}

/// Streaming delta first, then a full message, then a bare `content`
const TEXT_PATHS: &[&str] = &["/choices/0/delta/content", "/choices/0/message/content", "/content"];

impl Provider for ChatCompletions {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn build(&self, task: &TaskRequest, streaming: bool) -> HttpRequestSpec {
        let config = &task.config;
        HttpRequestSpec::post(config.endpoint_or_default())
            .header("Authorization", bearer(&config.api_key))
            .body(json!({
                "model": config.model_or_default(),
                "messages": [
                    { "role": "user", "content": build_prompt(task) }
                ],
                "max_tokens": 1000,
                "stream": streaming,
            }))
    }

    fn extract_text(&self, payload: &Value) -> String {
        extract_first(payload, TEXT_PATHS)
    }
}
