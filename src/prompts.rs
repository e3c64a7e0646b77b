/*!
 * Prompt templates shared by every provider.
 *
 * The wording does not depend on the provider; only the task kind and the
 * target language change what is sent.
 */

use crate::language_utils;
use crate::task::{TaskKind, TaskRequest};

/// Prompt template with `{text}` and `{target_language}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Translation instruction
    pub const TRANSLATION: &'static str = "Translate the following text to {target_language}: \"{text}\"";

    /// Summarization instruction
    pub const SUMMARY: &'static str = "Summarize the following text in a few concise sentences: \"{text}\"";

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Template for a task kind
    pub fn for_kind(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Translate => Self::new(Self::TRANSLATION),
            TaskKind::Summarize => Self::new(Self::SUMMARY),
        }
    }

    /// Render the template with the given variables.
    pub fn render(&self, text: &str, target_language: &str) -> String {
        self.template
            .replace("{target_language}", target_language)
            .replace("{text}", text)
    }
}

/// Build the user prompt for a task
pub fn build_prompt(task: &TaskRequest) -> String {
    let language = language_utils::language_name_or_code(&task.target_language);
    PromptTemplate::for_kind(task.kind).render(&task.text, &language)
}
