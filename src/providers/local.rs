/*!
 * Local or self-hosted endpoint speaking the Ollama generate API.
 *
 * Ollama streams newline-delimited JSON objects and marks the last one with
 * `done: true`. No authentication header is sent.
 */

use serde_json::{Value, json};

use crate::prompts::build_prompt;
use crate::providers::{HttpRequestSpec, Provider, ProviderId, extract_first};
use crate::stream::Framing;
use crate::task::TaskRequest;

/// Local adapter
#[derive(Debug, Clone, Copy)]
pub struct Local;

/// Generate API, then chat API, then a bare `content`
const TEXT_PATHS: &[&str] = &["/response", "/message/content", "/content"];

impl Provider for Local {
    fn id(&self) -> ProviderId {
        ProviderId::Local
    }

    fn build(&self, task: &TaskRequest, streaming: bool) -> HttpRequestSpec {
        let config = &task.config;
        HttpRequestSpec::post(config.endpoint_or_default()).body(json!({
            "model": config.model_or_default(),
            "prompt": build_prompt(task),
            "stream": streaming,
        }))
    }

    fn extract_text(&self, payload: &Value) -> String {
        extract_first(payload, TEXT_PATHS)
    }

    fn framing(&self) -> Framing {
        Framing::NdJson
    }

    fn is_final_frame(&self, payload: &Value) -> bool {
        payload.get("done").and_then(Value::as_bool).unwrap_or(false)
    }
}
