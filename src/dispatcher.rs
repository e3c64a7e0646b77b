/*!
 * Task dispatch.
 *
 * A `Dispatcher` runs one `TaskRequest` and writes its normalized events to a
 * channel. The HTTP dispatcher routes to the provider adapter, issues the
 * streaming request and decodes the body; the mock dispatcher serves canned
 * text. Which one is used is decided once, when the dispatcher is built from
 * the configuration.
 */

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::app_config::Config;
use crate::errors::ProviderError;
use crate::providers::mock::MockDispatcher;
use crate::providers::{HttpRequestSpec, provider_for};
use crate::stream::decode_stream;
use crate::task::{EventEmitter, EventSender, TaskRequest};

/// Runs tasks and produces normalized events
#[async_trait]
pub trait Dispatcher: Send + Sync + Debug {
    /// Run a task to completion
    ///
    /// Writes zero or more `Chunk` events followed by exactly one `Done` or
    /// `Error` to `events`. Never fails and never panics on provider errors.
    async fn dispatch(&self, task: TaskRequest, events: EventSender);
}

/// Dispatcher that calls the real provider APIs
#[derive(Debug, Clone, Default)]
pub struct HttpDispatcher {
    client: Client,
}

impl HttpDispatcher {
    /// Create a dispatcher with a fresh HTTP client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher sharing an existing HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Run a task without streaming and return the extracted text
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The generated text, possibly empty
    pub async fn complete(&self, task: &TaskRequest) -> Result<String, ProviderError> {
        let provider = provider_for(task.provider());
        let spec = provider.build(task, false);
        let response = self.send(&spec).await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(provider.extract_text(&payload))
    }

    async fn send(&self, spec: &HttpRequestSpec) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .request(spec.method.clone(), &spec.url)
            .headers(header_map(spec)?)
            .json(&spec.body)
            .send()
            .await?;
        Ok(response)
    }
}

/// Convert request headers, rejecting values that cannot go on the wire
fn header_map(spec: &HttpRequestSpec) -> Result<HeaderMap, ProviderError> {
    let mut headers = HeaderMap::with_capacity(spec.headers.len());
    for (name, value) in &spec.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ProviderError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ProviderError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, task: TaskRequest, events: EventSender) {
        let mut emitter = EventEmitter::new(events, task.kind);
        let provider = provider_for(task.provider());

        debug!(
            "Dispatching {:?} to {} ({})",
            task.kind,
            provider.id(),
            task.config.model_or_default()
        );

        emitter.begin_request();
        let spec = provider.build(&task, true);

        let response = match self.send(&spec).await {
            Ok(response) => response,
            Err(e) => {
                error!("{} request failed: {}", provider.id().display_name(), e);
                emitter.fail();
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("{} API error ({}): {}", provider.id().display_name(), status, error_text);
            emitter.fail();
            return;
        }

        emitter.begin_streaming();
        if let Err(e) = decode_stream(response.bytes_stream(), provider.as_ref(), &mut emitter).await {
            error!("{} stream failed: {}", provider.id().display_name(), e);
            emitter.fail();
        }
    }
}

/// Build the dispatcher selected by the configuration
pub fn dispatcher_for(config: &Config) -> Arc<dyn Dispatcher> {
    if config.mock.enabled {
        debug!("Mock mode enabled, provider calls are simulated");
        Arc::new(MockDispatcher::from_config(&config.mock))
    } else {
        Arc::new(HttpDispatcher::new())
    }
}
