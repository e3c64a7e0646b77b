/*!
 * Hugging Face inference API.
 */

use serde_json::{Value, json};

use crate::prompts::build_prompt;
use crate::providers::{HttpRequestSpec, Provider, ProviderId, bearer, extract_first};
use crate::task::TaskRequest;

/// Hugging Face adapter
#[derive(Debug, Clone, Copy)]
pub struct HuggingFace;

/// Streamed token first; `generated_text` alone, or inside the non-streaming array
const TEXT_PATHS: &[&str] = &["/token/text", "/generated_text", "/0/generated_text", "/content"];

impl Provider for HuggingFace {
    fn id(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    fn build(&self, task: &TaskRequest, streaming: bool) -> HttpRequestSpec {
        let config = &task.config;
        // The model is part of the path
        let url = format!(
            "{}/{}",
            config.endpoint_or_default().trim_end_matches('/'),
            config.model_or_default()
        );

        HttpRequestSpec::post(url)
            .header("Authorization", bearer(&config.api_key))
            .body(json!({
                "inputs": build_prompt(task),
                "parameters": {
                    "max_length": 1000,
                    "temperature": 0.7,
                },
                "stream": streaming,
            }))
    }

    fn extract_text(&self, payload: &Value) -> String {
        extract_first(payload, TEXT_PATHS)
    }
}
