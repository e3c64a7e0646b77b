/*!
 * Replicate predictions API.
 */

use serde_json::{Value, json};

use crate::prompts::build_prompt;
use crate::providers::{HttpRequestSpec, Provider, ProviderId, extract_first};
use crate::task::TaskRequest;

/// Replicate adapter
#[derive(Debug, Clone, Copy)]
pub struct Replicate;

const TEXT_PATHS: &[&str] = &["/output", "/content"];

impl Provider for Replicate {
    fn id(&self) -> ProviderId {
        ProviderId::Replicate
    }

    fn build(&self, task: &TaskRequest, streaming: bool) -> HttpRequestSpec {
        let config = &task.config;
        HttpRequestSpec::post(config.endpoint_or_default())
            .header("Authorization", format!("Token {}", config.api_key))
            .body(json!({
                "version": config.model_or_default(),
                "input": {
                    "prompt": build_prompt(task),
                    "max_length": 1000,
                },
                "stream": streaming,
            }))
    }

    fn extract_text(&self, payload: &Value) -> String {
        // Finished predictions return output as a list of token strings
        if let Some(tokens) = payload.get("output").and_then(Value::as_array) {
            return tokens.iter().filter_map(Value::as_str).collect();
        }
        extract_first(payload, TEXT_PATHS)
    }
}
