/*!
 * Messaging bridge between a requesting context and the dispatcher.
 *
 * The two sides share no memory: requests arrive as `InboundMessage` values,
 * and results travel back as `OutboundMessage` values posted to a
 * `MessagePort`. Every request is acknowledged immediately; its normalized
 * events are then relayed one message at a time from a spawned task.
 *
 * Posting is fallible and never blocks. A failed post (the requester went
 * away) is logged and skipped; the dispatch still runs to completion.
 */

use std::fmt::Debug;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::app_config::{DEFAULT_TARGET_LANGUAGE, ProviderConfig};
use crate::dispatcher::Dispatcher;
use crate::errors::BridgeError;
use crate::task::{NormalizedEvent, TaskKind, TaskRequest};

/// Acknowledgment error for an action the bridge does not know
pub const UNKNOWN_ACTION: &str = "Unknown action";

/// A task request from the requesting context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// `translate` or `summarize`
    pub action: String,

    #[serde(default)]
    pub text: String,

    /// Resolved provider settings; the bridge defaults apply when absent
    #[serde(default)]
    pub config: Option<ProviderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,

    /// Correlation id echoed on the acknowledgment and every relayed message;
    /// generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Immediate reply to an inbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgment {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Acknowledgment {
    /// A stream of events will follow
    pub fn streaming(request_id: Option<String>) -> Self {
        Self {
            success: true,
            streaming: Some(true),
            error: None,
            request_id,
        }
    }

    /// The request was rejected; nothing follows
    pub fn rejected(error: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            success: false,
            streaming: None,
            error: Some(error.into()),
            request_id,
        }
    }
}

/// A message relayed back to the requesting context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Stream {
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        data: NormalizedEvent,
    },
}

impl OutboundMessage {
    /// The relayed event
    pub fn event(&self) -> &NormalizedEvent {
        match self {
            Self::Stream { data, .. } => data,
        }
    }
}

/// One-way, fallible channel back to the requesting context
pub trait MessagePort: Send + Sync + Debug {
    /// Post a message without waiting for delivery
    fn post(&self, message: OutboundMessage) -> Result<(), BridgeError>;
}

/// Port delivering messages to an in-process receiver
#[derive(Debug, Clone)]
pub struct ChannelPort {
    sender: UnboundedSender<OutboundMessage>,
}

impl ChannelPort {
    pub fn new(sender: UnboundedSender<OutboundMessage>) -> Self {
        Self { sender }
    }
}

impl MessagePort for ChannelPort {
    fn post(&self, message: OutboundMessage) -> Result<(), BridgeError> {
        self.sender
            .send(message)
            .map_err(|_| BridgeError::RelayFailed("receiving context is gone".to_string()))
    }
}

/// Port writing each message as one JSON line
#[derive(Debug, Clone)]
pub struct LinePort {
    sender: UnboundedSender<String>,
}

impl LinePort {
    pub fn new(sender: UnboundedSender<String>) -> Self {
        Self { sender }
    }
}

impl MessagePort for LinePort {
    fn post(&self, message: OutboundMessage) -> Result<(), BridgeError> {
        let line = serde_json::to_string(&message).map_err(|e| BridgeError::RelayFailed(e.to_string()))?;
        self.sender
            .send(line)
            .map_err(|_| BridgeError::RelayFailed("output closed".to_string()))
    }
}

/// Outcome counts of one relay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub delivered: usize,
    pub dropped: usize,
}

/// Values applied when an inbound message leaves them out
#[derive(Debug, Clone)]
pub struct TaskDefaults {
    pub config: ProviderConfig,
    pub target_language: String,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            config: ProviderConfig::default(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }
}

/// Accepts task requests and relays their events
#[derive(Debug, Clone)]
pub struct MessageBridge {
    dispatcher: Arc<dyn Dispatcher>,
    defaults: TaskDefaults,
}

impl MessageBridge {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, defaults: TaskDefaults) -> Self {
        Self { dispatcher, defaults }
    }

    /// Handle one inbound message
    ///
    /// `respond` receives the acknowledgment before anything is relayed. For
    /// an accepted request the dispatch and its relay run on a spawned task;
    /// the returned handle resolves once the last event has been posted.
    /// Must be called from within a Tokio runtime.
    pub fn handle<F>(&self, message: InboundMessage, port: Arc<dyn MessagePort>, respond: F) -> Option<JoinHandle<RelayStats>>
    where
        F: FnOnce(Acknowledgment),
    {
        let request_id = Some(
            message
                .request_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        );
        let task = match self.accept(message) {
            Ok(task) => task,
            Err(reason) => {
                debug!("Rejected inbound message: {}", reason);
                respond(Acknowledgment::rejected(reason, request_id));
                return None;
            }
        };

        respond(Acknowledgment::streaming(request_id.clone()));

        let dispatcher = Arc::clone(&self.dispatcher);
        let handle = tokio::spawn(async move {
            let (events, received) = mpsc::unbounded_channel();
            let ((), stats) = tokio::join!(
                dispatcher.dispatch(task, events),
                relay_events(received, port, request_id)
            );
            stats
        });
        Some(handle)
    }

    fn accept(&self, message: InboundMessage) -> Result<TaskRequest, String> {
        let kind = TaskKind::from_action(&message.action).ok_or_else(|| UNKNOWN_ACTION.to_string())?;
        let config = message.config.unwrap_or_else(|| self.defaults.config.clone());
        let target_language = message
            .target_language
            .filter(|language| !language.trim().is_empty())
            .unwrap_or_else(|| self.defaults.target_language.clone());

        let task = TaskRequest::new(kind, message.text, config).map_err(|e| e.to_string())?;
        Ok(task.with_target_language(target_language))
    }
}

/// Post every event until the dispatcher closes its channel
async fn relay_events(
    mut events: UnboundedReceiver<NormalizedEvent>,
    port: Arc<dyn MessagePort>,
    request_id: Option<String>,
) -> RelayStats {
    let mut stats = RelayStats::default();
    while let Some(event) = events.recv().await {
        let message = OutboundMessage::Stream {
            request_id: request_id.clone(),
            data: event,
        };
        match port.post(message) {
            Ok(()) => stats.delivered += 1,
            Err(e) => {
                warn!("Failed to relay stream event: {}", e);
                stats.dropped += 1;
            }
        }
    }
    stats
}
