/*!
 * Task requests and the normalized event stream they produce.
 *
 * A dispatched task emits zero or more `Chunk` events followed by exactly one
 * terminal event (`Done` or `Error`). `EventEmitter` enforces that ordering
 * and tracks the dispatch state machine:
 *
 * `Idle -> Requesting -> Streaming -> {Done, Failed}`
 */

use log::trace;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::app_config::ProviderConfig;
use crate::errors::TaskError;
use crate::providers::ProviderId;

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Translate,
    Summarize,
}

impl TaskKind {
    /// Parse an inbound action name
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "translate" => Some(Self::Translate),
            "summarize" => Some(Self::Summarize),
            _ => None,
        }
    }

    /// Fixed user-facing message for a failed task
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Translate => "Translation failed",
            Self::Summarize => "Summarization failed",
        }
    }
}

/// One user-initiated request, consumed once by a dispatcher
///
/// The provider config is a snapshot: later configuration edits do not
/// reach a request that is already in flight.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub kind: TaskKind,
    pub text: String,
    pub config: ProviderConfig,
    /// ISO code of the translation target
    pub target_language: String,
}

impl TaskRequest {
    /// Create a task, rejecting empty text
    pub fn new(kind: TaskKind, text: impl Into<String>, config: ProviderConfig) -> Result<Self, TaskError> {
        let text = text.into();
        if text.is_empty() {
            return Err(TaskError::EmptyText);
        }

        Ok(Self {
            kind,
            text,
            config,
            target_language: crate::app_config::DEFAULT_TARGET_LANGUAGE.to_string(),
        })
    }

    /// Set the translation target language
    pub fn with_target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = language.into();
        self
    }

    /// Provider the task is routed to
    pub fn provider(&self) -> ProviderId {
        self.config.provider_id
    }
}

/// Provider-agnostic streaming event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NormalizedEvent {
    /// A piece of generated text
    Chunk { text: String },
    /// The stream finished normally
    Done,
    /// The task failed; no further events follow
    Error { error: String },
}

impl NormalizedEvent {
    /// Whether this event ends the sequence
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Chunk { .. })
    }
}

/// Channel a dispatcher writes its events to
pub type EventSender = UnboundedSender<NormalizedEvent>;

/// Lifecycle of a single dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Requesting,
    Streaming,
    Done,
    Failed,
}

impl DispatchState {
    /// Whether the state is final
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Writes events for one task and guarantees the terminal-event invariant
///
/// Events after a terminal one are dropped. If the emitter is dropped before
/// reaching a terminal state, it emits the task's failure message.
#[derive(Debug)]
pub struct EventEmitter {
    sender: EventSender,
    kind: TaskKind,
    state: DispatchState,
}

impl EventEmitter {
    /// Create an emitter for a task of the given kind
    pub fn new(sender: EventSender, kind: TaskKind) -> Self {
        Self {
            sender,
            kind,
            state: DispatchState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Kind of the task being dispatched
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Move to `Requesting`
    pub fn begin_request(&mut self) {
        if self.state == DispatchState::Idle {
            self.state = DispatchState::Requesting;
        }
    }

    /// Move to `Streaming`
    pub fn begin_streaming(&mut self) {
        if !self.state.is_terminal() {
            self.state = DispatchState::Streaming;
        }
    }

    /// Emit a chunk of text; empty text is ignored
    pub fn chunk(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() || self.state.is_terminal() {
            return;
        }
        self.send(NormalizedEvent::Chunk { text });
    }

    /// Emit `Done` and finish
    pub fn done(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = DispatchState::Done;
        self.send(NormalizedEvent::Done);
    }

    /// Emit `Error` and finish
    pub fn error(&mut self, message: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.state = DispatchState::Failed;
        self.send(NormalizedEvent::Error { error: message.into() });
    }

    /// Emit the task's fixed failure message
    pub fn fail(&mut self) {
        let message = self.kind.failure_message();
        self.error(message);
    }

    fn send(&self, event: NormalizedEvent) {
        // The receiver may be gone; the dispatch still runs to completion
        if self.sender.send(event).is_err() {
            trace!("Event receiver dropped, discarding event");
        }
    }
}

impl Drop for EventEmitter {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            self.fail();
        }
    }
}
