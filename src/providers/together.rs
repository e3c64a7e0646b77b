/*!
 * Together AI inference API.
 */

use serde_json::{Value, json};

use crate::prompts::build_prompt;
use crate::providers::{HttpRequestSpec, Provider, ProviderId, bearer, extract_first};
use crate::task::TaskRequest;

/// Together adapter
#[derive(Debug, Clone, Copy)]
pub struct Together;

/// Streamed choices first, then the non-streaming `output` envelope
const TEXT_PATHS: &[&str] = &["/choices/0/text", "/output/choices/0/text", "/content"];

impl Provider for Together {
    fn id(&self) -> ProviderId {
        ProviderId::Together
    }

    fn build(&self, task: &TaskRequest, streaming: bool) -> HttpRequestSpec {
        let config = &task.config;
        HttpRequestSpec::post(config.endpoint_or_default())
            .header("Authorization", bearer(&config.api_key))
            .body(json!({
                "model": config.model_or_default(),
                "prompt": build_prompt(task),
                "max_tokens": 1000,
                "temperature": 0.7,
                "stream": streaming,
            }))
    }

    fn extract_text(&self, payload: &Value) -> String {
        extract_first(payload, TEXT_PATHS)
    }
}
