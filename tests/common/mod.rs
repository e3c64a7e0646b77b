/*!
 * Common test utilities for the promptlens test suite
 */

use promptlens::app_config::ProviderConfig;
use promptlens::dispatcher::Dispatcher;
use promptlens::providers::ProviderId;
use promptlens::task::{NormalizedEvent, TaskKind, TaskRequest};
use serde_json::Value;
use tokio::sync::mpsc;

/// Route log output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// SSE body with one `data: ` line per frame
pub fn sse_body(frames: &[&str]) -> String {
    frames.iter().map(|frame| format!("data: {}\n\n", frame)).collect()
}

/// SSE body from JSON payloads
pub fn sse_json_body(payloads: &[Value]) -> String {
    payloads.iter().map(|payload| format!("data: {}\n\n", payload)).collect()
}

/// Provider config pointed at a mock server
pub fn config_at(provider: ProviderId, endpoint: impl Into<String>) -> ProviderConfig {
    ProviderConfig::new(provider)
        .with_api_key("test-key")
        .with_endpoint(endpoint)
}

/// Task with a config pointed at a mock server
pub fn task_at(kind: TaskKind, provider: ProviderId, endpoint: impl Into<String>) -> TaskRequest {
    TaskRequest::new(kind, "Hello", config_at(provider, endpoint)).expect("non-empty text")
}

/// Run a dispatch and collect every event it emits
pub async fn collect_events(dispatcher: &dyn Dispatcher, task: TaskRequest) -> Vec<NormalizedEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    dispatcher.dispatch(task, tx).await;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Chunk event shorthand
pub fn chunk(text: &str) -> NormalizedEvent {
    NormalizedEvent::Chunk { text: text.to_string() }
}

/// Error event shorthand
pub fn error(message: &str) -> NormalizedEvent {
    NormalizedEvent::Error { error: message.to_string() }
}
