use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::{JoinError, JoinSet};

use crate::app_config::Config;
use crate::bridge::{Acknowledgment, InboundMessage, LinePort, MessageBridge, MessagePort, RelayStats, TaskDefaults};
use crate::dispatcher::{Dispatcher, dispatcher_for};
use crate::errors::BridgeError;
use crate::providers::ProviderId;
use crate::providers::models::{Model, ModelCatalog, default_models};
use crate::task::{NormalizedEvent, TaskKind, TaskRequest};

// @module: Application controller wiring configuration, dispatcher and bridge

/// Acknowledgment error for an inbound line that is not a task message
pub const MALFORMED_MESSAGE: &str = "Malformed message";

/// Per-invocation overrides from the command line
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    pub provider: Option<ProviderId>,
    pub model: Option<String>,
    pub target_language: Option<String>,
}

/// Main application controller
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Selected once from the mock setting
    dispatcher: Arc<dyn Dispatcher>,
    catalog: ModelCatalog,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let dispatcher = dispatcher_for(&config);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Create a controller around an explicit dispatcher
    pub fn with_dispatcher(config: Config, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            config,
            dispatcher,
            catalog: ModelCatalog::new(),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build a task from the configuration and the command line overrides
    pub fn build_task(&self, kind: TaskKind, text: &str, options: &TaskOptions) -> Result<TaskRequest> {
        self.config.validate_for(options.provider)?;

        let mut provider_config = self.config.resolve_provider(options.provider);
        if let Some(model) = &options.model {
            provider_config.model = model.clone();
        }

        let target_language = options
            .target_language
            .clone()
            .unwrap_or_else(|| self.config.target_language.clone());

        Ok(TaskRequest::new(kind, text, provider_config)?.with_target_language(target_language))
    }

    /// Run one task, handing each chunk to `on_chunk` as it arrives
    ///
    /// # Returns
    /// * `Ok(String)` - The concatenated text once the stream is done
    /// * `Err` - The task's failure message
    pub async fn run_task<F>(&self, kind: TaskKind, text: &str, options: &TaskOptions, mut on_chunk: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let task = self.build_task(kind, text, options)?;
        info!(
            "Running {:?} with {} ({})",
            kind,
            task.provider().display_name(),
            task.config.model_or_default()
        );

        let (events, mut received) = mpsc::unbounded_channel();
        let dispatch = self.dispatcher.dispatch(task, events);

        let collect = async {
            let mut output = String::new();
            while let Some(event) = received.recv().await {
                match event {
                    NormalizedEvent::Chunk { text } => {
                        on_chunk(&text);
                        output.push_str(&text);
                    }
                    NormalizedEvent::Done => return Ok(output),
                    NormalizedEvent::Error { error } => return Err(anyhow!(error)),
                }
            }
            Err(anyhow!(kind.failure_message()))
        };

        let ((), result) = tokio::join!(dispatch, collect);
        result
    }

    /// Models offered by a provider; the default provider when none is given
    pub async fn list_models(&self, provider: Option<ProviderId>) -> Vec<Model> {
        let id = provider.unwrap_or_else(|| ProviderId::lookup(&self.config.default_provider));
        if self.config.mock.enabled {
            return default_models(id);
        }

        let api_key = self
            .config
            .provider_entry(id)
            .map(|entry| entry.api_key.clone())
            .unwrap_or_default();
        self.catalog.fetch_models(id, &api_key).await
    }

    /// Bridge bound to this controller's dispatcher and configured defaults
    pub fn bridge(&self) -> MessageBridge {
        MessageBridge::new(
            Arc::clone(&self.dispatcher),
            TaskDefaults {
                config: self.config.resolve_provider(None),
                target_language: self.config.target_language.clone(),
            },
        )
    }

    /// Serve task messages, one JSON object per input line
    ///
    /// The acknowledgment for a line is written to `output` before any of its
    /// stream messages. A line that is not UTF-8 or not a task message is
    /// acknowledged as malformed and the next line is read. Returns once the
    /// input ends and every relay has finished; a read failure is reported
    /// only after the running relays are done.
    pub async fn serve<R>(&self, mut input: R, output: UnboundedSender<String>) -> Result<RelayStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let bridge = self.bridge();
        let port: Arc<dyn MessagePort> = Arc::new(LinePort::new(output.clone()));
        let mut relays = JoinSet::new();
        let mut totals = RelayStats::default();
        let mut buf = Vec::new();

        let read_result = loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf).await {
                Ok(0) => break Ok(()),
                Ok(_) => {}
                Err(e) => break Err(e),
            }

            while let Some(finished) = relays.try_join_next() {
                tally(&mut totals, finished);
            }

            if buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let respond = |ack: Acknowledgment| match serde_json::to_string(&ack) {
                Ok(json) => {
                    if output.send(json).is_err() {
                        warn!("Failed to write acknowledgment, output closed");
                    }
                }
                Err(e) => warn!("Failed to encode acknowledgment: {}", e),
            };

            match parse_line(&buf) {
                Ok(message) => {
                    if let Some(relay) = bridge.handle(message, Arc::clone(&port), respond) {
                        relays.spawn(relay);
                    }
                }
                Err(e) => {
                    warn!("Ignoring inbound line: {}", e);
                    respond(Acknowledgment::rejected(MALFORMED_MESSAGE, None));
                }
            }
        };

        while let Some(finished) = relays.join_next().await {
            tally(&mut totals, finished);
        }

        read_result.context("Failed to read bridge input")?;
        debug!("Bridge input closed, {} delivered, {} dropped", totals.delivered, totals.dropped);
        Ok(totals)
    }

    /// Serve task messages over stdin and stdout
    pub async fn serve_stdio(&self) -> Result<RelayStats> {
        let (output, mut lines) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = lines.recv().await {
                if stdout.write_all(line.as_bytes()).await.is_err()
                    || stdout.write_all(b"\n").await.is_err()
                    || stdout.flush().await.is_err()
                {
                    warn!("Failed to write to stdout, stopping bridge output");
                    break;
                }
            }
        });

        let stats = self.serve(BufReader::new(tokio::io::stdin()), output).await;
        if let Err(e) = writer.await {
            warn!("Bridge writer ended abnormally: {}", e);
        }
        stats
    }
}

fn parse_line(bytes: &[u8]) -> Result<InboundMessage, BridgeError> {
    let line = std::str::from_utf8(bytes).map_err(|e| BridgeError::MalformedMessage(e.to_string()))?;
    serde_json::from_str(line).map_err(|e| BridgeError::MalformedMessage(e.to_string()))
}

fn tally(totals: &mut RelayStats, finished: Result<Result<RelayStats, JoinError>, JoinError>) {
    match finished.and_then(|relay| relay) {
        Ok(stats) => {
            totals.delivered += stats.delivered;
            totals.dropped += stats.dropped;
        }
        Err(e) => warn!("Relay task ended abnormally: {}", e),
    }
}
