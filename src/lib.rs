/*!
 * # promptlens - streaming translation and summarization over LLM providers
 *
 * A Rust library that sends a piece of text to one of several text-generation
 * APIs and streams the answer back as provider-agnostic events.
 *
 * ## Features
 *
 * - One registry of providers with fixed endpoints and default models:
 *   - OpenAI and OpenRouter (chat completions)
 *   - Anthropic (messages)
 *   - Cohere, Hugging Face, Replicate, Together AI
 *   - A local Ollama-compatible endpoint, also the fallback for unknown ids
 * - Incremental decoding of SSE and NDJSON response bodies
 * - Normalized `Chunk` / `Done` / `Error` events with a single terminal event
 * - A message bridge that acknowledges requests and relays events
 * - A mock dispatcher selected from configuration
 * - ISO 639-1 and ISO 639-2 target language codes
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Persisted configuration and provider resolution
 * - `providers`: Provider registry and per-provider request/response adapters:
 *   - `providers::models`: Model catalog
 *   - `providers::mock`: Mock dispatcher
 * - `task`: Task requests, normalized events and the event emitter
 * - `prompts`: Prompt wording per task kind
 * - `stream`: Streamed body decoder
 * - `dispatcher`: HTTP dispatch of a task
 * - `bridge`: Request acknowledgment and event relay
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod bridge;
pub mod dispatcher;
pub mod errors;
pub mod language_utils;
pub mod prompts;
pub mod providers;
pub mod stream;
pub mod task;

// Re-export main types for easier usage
pub use app_config::{Config, ProviderConfig};
pub use app_controller::Controller;
pub use bridge::{Acknowledgment, InboundMessage, MessageBridge, OutboundMessage};
pub use dispatcher::{Dispatcher, HttpDispatcher};
pub use errors::{AppError, BridgeError, ConfigError, ProviderError, TaskError};
pub use language_utils::{get_language_name, normalize_to_part2t};
pub use providers::{ProviderId, default_model_for, endpoint_for};
pub use task::{NormalizedEvent, TaskKind, TaskRequest};
