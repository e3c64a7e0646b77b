/*!
 * Cohere generate API.
 *
 * The generate endpoint streams newline-delimited JSON rather than SSE;
 * the last object carries `is_finished: true`.
 */

use serde_json::{Value, json};

use crate::prompts::build_prompt;
use crate::providers::{HttpRequestSpec, Provider, ProviderId, bearer, extract_first};
use crate::stream::Framing;
use crate::task::TaskRequest;

/// Cohere adapter
#[derive(Debug, Clone, Copy)]
pub struct Cohere;

const TEXT_PATHS: &[&str] = &["/text", "/generations/0/text", "/content"];

impl Provider for Cohere {
    fn id(&self) -> ProviderId {
        ProviderId::Cohere
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
        // The final stream object repeats the whole generation under `response`
        if self.is_final_frame(payload) {
            return String::new();
        }
        extract_first(payload, TEXT_PATHS)
    }

    fn framing(&self) -> Framing {
        Framing::NdJson
    }

    fn is_final_frame(&self, payload: &Value) -> bool {
        payload.get("is_finished").and_then(Value::as_bool).unwrap_or(false)
    }
}
