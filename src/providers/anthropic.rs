/*!
 * Anthropic Messages API.
 */

use serde_json::{Value, json};

use crate::prompts::build_prompt;
use crate::providers::{HttpRequestSpec, Provider, ProviderId, extract_first};
use crate::task::TaskRequest;

/// API version sent with every request
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic adapter
#[derive(Debug, Clone, Copy)]
pub struct Anthropic;

/// `content_block_delta` frames, then a full message, then a bare string `content`
const TEXT_PATHS: &[&str] = &["/delta/text", "/content/0/text", "/content"];

impl Provider for Anthropic {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn build(&self, task: &TaskRequest, streaming: bool) -> HttpRequestSpec {
        let config = &task.config;
        HttpRequestSpec::post(config.endpoint_or_default())
            .header("x-api-key", config.api_key.as_str())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("anthropic-dangerous-direct-browser-access", "true")
            .body(json!({
                "model": config.model_or_default(),
                "max_tokens": 1000,
                "messages": [
                    { "role": "user", "content": build_prompt(task) }
                ],
                "stream": streaming,
            }))
    }

    fn extract_text(&self, payload: &Value) -> String {
        extract_first(payload, TEXT_PATHS)
    }
}
