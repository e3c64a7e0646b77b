/*!
 * Mock dispatcher for offline use and tests.
 *
 * This module provides a dispatcher that never touches the network:
 * - `MockDispatcher::working()` - Streams a canned answer word by word
 * - `MockDispatcher::failing()` - Always ends with the task's failure message
 *
 * Each word is wrapped in the provider's native chunk shape and run through
 * that provider's normalizer, the same path real stream frames take.
 */

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use rand::Rng;
use serde_json::{Value, json};

use crate::app_config::MockConfig;
use crate::dispatcher::Dispatcher;
use crate::language_utils;
use crate::providers::{ProviderId, provider_for};
use crate::task::{EventEmitter, EventSender, TaskKind, TaskRequest};

/// Behavior mode for the mock dispatcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Streams a canned response
    Working,
    /// Always fails with the task's fixed error
    Failing,
}

/// Canned answers for one provider
struct CannedResponses {
    translation: HashMap<&'static str, &'static str>,
    summary: HashMap<&'static str, &'static str>,
}

impl CannedResponses {
    /// Pair answers with the shared source phrases, in order
    fn new(translations: [&'static str; 10], summaries: [&'static str; 5]) -> Self {
        Self {
            translation: TRANSLATION_SOURCES.into_iter().zip(translations).collect(),
            summary: SUMMARY_SOURCES.into_iter().zip(summaries).collect(),
        }
    }
}

static TRANSLATION_SOURCES: [&str; 10] = [
    "Hello world",
    "How are you?",
    "Thank you",
    "Good morning",
    "Good night",
    "I love you",
    "What is your name?",
    "Where are you from?",
    "How old are you?",
    "Nice to meet you",
];

static SUMMARY_SOURCES: [&str; 5] = [
    "This is a very long text that needs to be summarized. It contains many sentences and paragraphs that should be condensed into a brief summary.",
    "The quick brown fox jumps over the lazy dog. This sentence contains all the letters of the alphabet.",
    "Artificial intelligence is transforming the way we live and work. It has applications in healthcare, education, transportation, and many other fields.",
    "Climate change is one of the most pressing issues of our time. It affects weather patterns, sea levels, and biodiversity across the globe.",
    "The internet has revolutionized communication and information sharing. It connects billions of people worldwide and provides access to vast amounts of knowledge.",
];

static CANNED: Lazy<HashMap<ProviderId, CannedResponses>> = Lazy::new(|| {
    HashMap::from([
        (
            ProviderId::OpenAI,
            CannedResponses::new(
                [
                    "Xin chào thế giới",
                    "Bạn khỏe không?",
                    "Cảm ơn bạn",
                    "Chào buổi sáng",
                    "Chúc ngủ ngon",
                    "Tôi yêu bạn",
                    "Tên bạn là gì?",
                    "Bạn đến từ đâu?",
                    "Bạn bao nhiêu tuổi?",
                    "Rất vui được gặp bạn",
                ],
                [
                    "A comprehensive text requiring summarization with multiple detailed sections.",
                    "A classic pangram demonstrating all alphabet letters in a coherent sentence.",
                    "AI is revolutionizing multiple industries including healthcare, education, and transportation with widespread impact.",
                    "Climate change represents a critical global challenge affecting weather systems, ocean levels, and ecological diversity worldwide.",
                    "The internet has fundamentally transformed global communication networks and democratized access to information on an unprecedented scale.",
                ],
            ),
        ),
        (
            ProviderId::Anthropic,
            CannedResponses::new(
                [
                    "Chào thế giới",
                    "Bạn thế nào?",
                    "Cảm ơn",
                    "Chào buổi sáng",
                    "Chúc ngủ ngon",
                    "Tôi yêu bạn",
                    "Bạn tên gì?",
                    "Bạn từ đâu đến?",
                    "Bạn bao nhiêu tuổi?",
                    "Rất vui được gặp bạn",
                ],
                [
                    "An extensive document requiring concise summarization of its multiple sections and detailed content.",
                    "A traditional pangram showcasing complete alphabet coverage in a meaningful sentence structure.",
                    "AI technology is fundamentally reshaping societal structures across healthcare, education, transportation, and numerous other sectors.",
                    "Climate change stands as humanity's most urgent contemporary challenge, impacting global weather systems, oceanic conditions, and biological diversity.",
                    "The internet represents a paradigm shift in human connectivity and knowledge accessibility, linking billions globally while democratizing information access.",
                ],
            ),
        ),
        (
            ProviderId::OpenRouter,
            CannedResponses::new(
                [
                    "Xin chào thế giới",
                    "Bạn có khỏe không?",
                    "Cảm ơn bạn",
                    "Chào buổi sáng",
                    "Chúc ngủ ngon",
                    "Tôi yêu bạn",
                    "Tên của bạn là gì?",
                    "Bạn đến từ đâu?",
                    "Bạn bao nhiêu tuổi?",
                    "Rất vui được gặp bạn",
                ],
                [
                    "A lengthy document requiring summarization of its comprehensive content and multiple sections.",
                    "A well-known pangram that demonstrates complete alphabet usage in a coherent sentence.",
                    "AI is dramatically changing society across healthcare, education, transportation, and various other industries.",
                    "Climate change is a critical global issue affecting weather, sea levels, and biodiversity worldwide.",
                    "The internet has transformed global communication and made information accessible to billions of people worldwide.",
                ],
            ),
        ),
        (
            ProviderId::Cohere,
            CannedResponses::new(
                [
                    "Chào thế giới",
                    "Bạn thế nào?",
                    "Cảm ơn",
                    "Chào buổi sáng",
                    "Chúc ngủ ngon",
                    "Tôi yêu bạn",
                    "Bạn tên gì?",
                    "Bạn từ đâu?",
                    "Bạn bao nhiêu tuổi?",
                    "Rất vui được gặp bạn",
                ],
                [
                    "A comprehensive document that requires summarization of its extensive content and multiple sections.",
                    "A classic pangram that includes every letter of the alphabet in a meaningful sentence.",
                    "AI is revolutionizing various sectors including healthcare, education, and transportation.",
                    "Climate change is a critical global challenge affecting weather, oceans, and biodiversity.",
                    "The internet has transformed global communication and information access for billions of people.",
                ],
            ),
        ),
        (
            ProviderId::HuggingFace,
            CannedResponses::new(
                [
                    "Xin chào thế giới",
                    "Bạn khỏe không?",
                    "Cảm ơn",
                    "Chào buổi sáng",
                    "Chúc ngủ ngon",
                    "Tôi yêu bạn",
                    "Tên bạn là gì?",
                    "Bạn đến từ đâu?",
                    "Bạn bao nhiêu tuổi?",
                    "Rất vui được gặp bạn",
                ],
                [
                    "A long text requiring summarization with multiple sentences and paragraphs.",
                    "A pangram containing all alphabet letters.",
                    "AI is revolutionizing various industries including healthcare, education, and transportation.",
                    "Climate change is a critical global issue impacting weather, sea levels, and biodiversity.",
                    "The internet has transformed global communication and information access.",
                ],
            ),
        ),
        (
            ProviderId::Replicate,
            CannedResponses::new(
                [
                    "Chào thế giới",
                    "Bạn thế nào?",
                    "Cảm ơn",
                    "Chào buổi sáng",
                    "Chúc ngủ ngon",
                    "Tôi yêu bạn",
                    "Bạn tên gì?",
                    "Bạn từ đâu?",
                    "Bạn bao nhiêu tuổi?",
                    "Rất vui được gặp bạn",
                ],
                [
                    "A lengthy document requiring summarization of its comprehensive content.",
                    "A traditional pangram demonstrating complete alphabet usage.",
                    "AI is fundamentally changing society across multiple sectors including healthcare, education, and transportation.",
                    "Climate change represents humanity's most urgent challenge, affecting global weather, oceans, and biodiversity.",
                    "The internet has revolutionized global connectivity and democratized access to information for billions worldwide.",
                ],
            ),
        ),
        (
            ProviderId::Together,
            CannedResponses::new(
                [
                    "Xin chào thế giới",
                    "Bạn có khỏe không?",
                    "Cảm ơn bạn",
                    "Chào buổi sáng",
                    "Chúc ngủ ngon",
                    "Tôi yêu bạn",
                    "Tên của bạn là gì?",
                    "Bạn đến từ đâu?",
                    "Bạn bao nhiêu tuổi?",
                    "Rất vui được gặp bạn",
                ],
                [
                    "An extensive document requiring concise summarization of its detailed content and multiple sections.",
                    "A well-known pangram that includes every letter of the alphabet in a coherent sentence.",
                    "AI technology is dramatically reshaping society across healthcare, education, transportation, and numerous other sectors.",
                    "Climate change stands as our era's most critical challenge, impacting global weather systems, oceanic conditions, and biological diversity.",
                    "The internet has fundamentally transformed human connectivity and knowledge accessibility, linking billions globally while democratizing information.",
                ],
            ),
        ),
        (
            ProviderId::Local,
            CannedResponses::new(
                [
                    "Chào thế giới",
                    "Bạn thế nào?",
                    "Cảm ơn",
                    "Chào buổi sáng",
                    "Chúc ngủ ngon",
                    "Tôi yêu bạn",
                    "Bạn tên gì?",
                    "Bạn từ đâu?",
                    "Bạn bao nhiêu tuổi?",
                    "Rất vui được gặp bạn",
                ],
                [
                    "A long document that needs summarization of its content.",
                    "A pangram with all alphabet letters.",
                    "AI is changing society in healthcare, education, and transportation.",
                    "Climate change is a global issue affecting weather and biodiversity.",
                    "The internet has changed global communication and information access.",
                ],
            ),
        ),
    ])
});

/// Model label used in generic mock answers
fn mock_model_name(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAI => "OpenAI GPT",
        ProviderId::Anthropic => "Anthropic Claude",
        ProviderId::OpenRouter => "OpenRouter",
        ProviderId::Cohere => "Cohere",
        ProviderId::HuggingFace => "HuggingFace",
        ProviderId::Replicate => "Replicate",
        ProviderId::Together => "Together AI",
        ProviderId::Local => "Local/Ollama",
    }
}

/// Full mock answer for a task
pub fn mock_response(task: &TaskRequest) -> String {
    let provider = task.provider();
    let canned = CANNED.get(&provider);
    let table = canned.map(|c| match task.kind {
        TaskKind::Translate => &c.translation,
        TaskKind::Summarize => &c.summary,
    });

    if let Some(answer) = table.and_then(|t| t.get(task.text.as_str())) {
        return answer.to_string();
    }

    let model = mock_model_name(provider);
    match task.kind {
        TaskKind::Translate => format!(
            "[{} MOCK TRANSLATION] {} → {} translation",
            model,
            task.text,
            language_utils::language_name_or_code(&task.target_language)
        ),
        TaskKind::Summarize => {
            let preview: String = task.text.chars().take(50).collect();
            format!(
                "[{} MOCK SUMMARY] This is a summary of the provided text: \"{}...\"",
                model, preview
            )
        }
    }
}

/// Wrap text in the chunk shape a provider streams
pub fn native_chunk(provider: ProviderId, text: &str) -> Value {
    match provider {
        ProviderId::OpenAI | ProviderId::OpenRouter => json!({ "choices": [{ "delta": { "content": text } }] }),
        ProviderId::Anthropic => json!({ "type": "content_block_delta", "delta": { "type": "text_delta", "text": text } }),
        ProviderId::Cohere => json!({ "text": text, "is_finished": false }),
        ProviderId::HuggingFace => json!({ "generated_text": text }),
        ProviderId::Replicate => json!({ "output": text }),
        ProviderId::Together => json!({ "output": { "choices": [{ "text": text }] } }),
        ProviderId::Local => json!({ "response": text, "done": false }),
    }
}

/// Dispatcher serving canned responses
#[derive(Debug, Clone)]
pub struct MockDispatcher {
    behavior: MockBehavior,
    delay_min_ms: u64,
    delay_max_ms: u64,
}

impl MockDispatcher {
    /// Create a new mock dispatcher with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay_min_ms: 0,
            delay_max_ms: 0,
        }
    }

    /// Create a working mock dispatcher without delays
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock dispatcher that always fails
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a working mock paced by the configured delays
    pub fn from_config(config: &MockConfig) -> Self {
        Self::working().with_delay(config.delay_min_ms, config.delay_max_ms)
    }

    /// Set the delay window between streamed words
    pub fn with_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.delay_min_ms = min_ms.min(max_ms);
        self.delay_max_ms = max_ms.max(min_ms);
        self
    }

    async fn pause(&self) {
        if self.delay_max_ms == 0 {
            return;
        }
        let millis = rand::rng().random_range(self.delay_min_ms..=self.delay_max_ms);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    async fn dispatch(&self, task: TaskRequest, events: EventSender) {
        let mut emitter = EventEmitter::new(events, task.kind);
        debug!("Using mock response for {}", task.provider());
        emitter.begin_request();

        if self.behavior == MockBehavior::Failing {
            emitter.fail();
            return;
        }

        emitter.begin_streaming();
        let provider = provider_for(task.provider());
        let response = mock_response(&task);
        let words: Vec<&str> = response.split(' ').collect();

        for (i, word) in words.iter().enumerate() {
            let piece = if i + 1 < words.len() {
                format!("{} ", word)
            } else {
                word.to_string()
            };
            let chunk = native_chunk(provider.id(), &piece);
            emitter.chunk(provider.extract_text(&chunk));
            self.pause().await;
        }

        emitter.done();
    }
}
