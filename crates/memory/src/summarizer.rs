//! Memory summarizer: recent turns in, one preference summary out.

use chathub_config::MemoryConfig;
use chathub_core::message::{ChatMessage, Turn};
use chathub_core::session::SessionState;
use chathub_providers::{Completion, CompletionClient};
use tracing::{debug, warn};

/// Instruction sent ahead of the rendered conversation window.
pub const MEMORY_PROMPT: &str = "\nExtract long-term user preferences or goals from the conversation.\nIf none, return empty.\n\nConversation:\n";

/// Condenses the recent conversation into a durable preference summary.
#[derive(Clone)]
pub struct MemorySummarizer {
    client: CompletionClient,
    model: String,
    window: usize,
    enabled: bool,
}

impl MemorySummarizer {
    pub fn new(client: CompletionClient, model: impl Into<String>, window: usize) -> Self {
        Self {
            client,
            model: model.into(),
            window,
            enabled: true,
        }
    }

    pub fn from_config(client: CompletionClient, config: &MemoryConfig) -> Self {
        let mut summarizer = Self::new(client, &config.model, config.window);
        summarizer.enabled = config.enabled;
        summarizer
    }

    /// Summarize the recent turns. Any failure yields an empty string.
    pub async fn summarize(&self, turns: &[Turn]) -> String {
        let convo = render_window(turns, self.window);
        if convo.is_empty() {
            return String::new();
        }

        let prompt = format!("{MEMORY_PROMPT}{convo}\n");
        match self
            .client
            .complete(&self.model, vec![ChatMessage::user(prompt)], &[])
            .await
        {
            Ok(Completion::Text(text)) => text.trim().to_string(),
            Ok(Completion::Image(_)) => String::new(),
            Err(e) => {
                warn!(model = %self.model, error = %e, "Memory summarization failed");
                String::new()
            }
        }
    }

    /// Re-summarize the session and replace its memory if the result is
    /// non-empty. Returns whether the memory changed.
    pub async fn refresh(&self, session: &mut SessionState) -> bool {
        if !self.enabled {
            return false;
        }

        let summary = self.summarize(session.conversation.turns()).await;
        if summary.is_empty() {
            debug!("Summarizer returned nothing; keeping previous memory");
            return false;
        }

        let changed = summary != session.memory;
        session.set_memory(summary);
        debug!(chars = session.memory.len(), changed, "Memory summary refreshed");
        changed
    }
}

/// Render the last `window` text turns as `role: content` lines.
pub fn render_window(turns: &[Turn], window: usize) -> String {
    let text: Vec<(String, &str)> = turns
        .iter()
        .filter_map(|t| t.as_text().map(|c| (t.role().to_string(), c)))
        .collect();
    let start = text.len().saturating_sub(window);

    text[start..]
        .iter()
        .map(|(role, content)| format!("{role}: {content}"))
        .collect::<Vec<_>>()
        .join("\n")
}
