//! Context assembly pipeline.
//!
//! A plain-chat request is assembled from up to four blocks:
//!
//! 1. **Persona** (configured system prompt), always present
//! 2. **Memory** (`User memory:` + summary), omitted when empty
//! 3. **File context** (active upload text), omitted when no upload
//! 4. **History** (text turns only), oldest turns dropped to fit the budget
//!
//! A read-url request is a single synthetic user message and carries no
//! history.
//!
//! # Determinism
//!
//! Identical inputs always produce identical outputs. No random or
//! time-dependent logic is used during assembly.

use crate::context::token;
use chathub_core::fetch::FetchedContent;
use chathub_core::message::{ChatMessage, Conversation};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Prefix of the memory system block.
pub const MEMORY_HEADER: &str = "User memory:\n";

/// Wrap uploaded file text as a system block.
pub fn file_context_block(content: &str) -> String {
    format!("\nThe user uploaded a file. Here is its content:\n{content}\n")
}

/// The synthetic prompt for summarizing a fetched page.
pub fn read_url_prompt(content: &str) -> String {
    format!("Summarize the key points of the following webpage:\n\n{content}")
}

// ── Types ─────────────────────────────────────────────────────────────────

/// Token budget configuration.
#[derive(Debug, Clone)]
pub struct TokenBudget {
    /// Total token budget for one assembled request.
    pub total: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self { total: 8192 }
    }
}

/// What to assemble a request for.
#[derive(Debug, Clone, Copy)]
pub enum AssemblyInput<'a> {
    /// A plain chat turn: persona, optional memory and file, then history.
    Chat {
        memory: &'a str,
        file_context: Option<&'a FetchedContent>,
        conversation: &'a Conversation,
    },
    /// Summarize a fetched page. History is not included.
    ReadUrl { page: &'a FetchedContent },
}

/// The assembled context, ready for a completion call.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// System blocks first, then history (or the single read-url prompt).
    pub messages: Vec<ChatMessage>,
    /// Assembly metadata (token counts, drops, utilization).
    pub metadata: AssemblyMetadata,
}

/// Detailed metadata about the assembly process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    /// Total tokens in the assembled context.
    pub total_tokens: usize,
    /// Configured token budget.
    pub budget: usize,
    /// Budget utilization percentage.
    pub utilization_pct: f32,
    /// Per-block statistics.
    pub per_layer: Vec<LayerStats>,
    /// Items dropped during budget enforcement.
    pub drops: Vec<DropInfo>,
}

impl AssemblyMetadata {
    /// Number of history turns left out of the request.
    pub fn dropped_turns(&self) -> usize {
        self.drops.iter().map(|d| d.items_dropped).sum()
    }
}

/// Statistics for a single context block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerStats {
    pub name: String,
    pub tokens: usize,
    pub items_included: usize,
    pub items_total: usize,
}

/// Information about items dropped from a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropInfo {
    pub layer: String,
    pub items_dropped: usize,
    pub tokens_dropped: usize,
    pub reason: String,
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// The context assembler. Stateless apart from configuration.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    system_prompt: String,
    budget: TokenBudget,
}

impl ContextAssembler {
    pub fn new(system_prompt: impl Into<String>, budget: TokenBudget) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            budget,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Assemble the message list for one request. Never fails.
    pub fn assemble(&self, input: &AssemblyInput<'_>) -> AssembledContext {
        match *input {
            AssemblyInput::Chat {
                memory,
                file_context,
                conversation,
            } => self.assemble_chat(memory, file_context, conversation),
            AssemblyInput::ReadUrl { page } => self.assemble_read_url(page),
        }
    }

    fn assemble_chat(
        &self,
        memory: &str,
        file_context: Option<&FetchedContent>,
        conversation: &Conversation,
    ) -> AssembledContext {
        let mut stats: Vec<LayerStats> = Vec::new();
        let mut drops: Vec<DropInfo> = Vec::new();
        let mut messages: Vec<ChatMessage> = Vec::new();

        // ── System blocks (never trimmed) ──────────────────────────────────
        let mut push_system = |name: &str, content: Option<String>| match content {
            Some(content) => {
                let msg = ChatMessage::system(content);
                stats.push(LayerStats {
                    name: name.into(),
                    tokens: token::estimate_message_tokens(&msg),
                    items_included: 1,
                    items_total: 1,
                });
                messages.push(msg);
            }
            None => stats.push(Self::empty_stats(name, 0)),
        };

        push_system("persona", Some(self.system_prompt.clone()));
        push_system(
            "memory",
            (!memory.is_empty()).then(|| format!("{MEMORY_HEADER}{memory}")),
        );
        push_system(
            "file_context",
            file_context
                .filter(|f| !f.as_str().trim().is_empty())
                .map(|f| file_context_block(f.as_str())),
        );

        let system_tokens: usize = stats.iter().map(|s| s.tokens).sum();

        // ── History (sliding window) ───────────────────────────────────────
        let history_budget = match self.budget.total.checked_sub(system_tokens) {
            Some(remaining) => remaining,
            None => {
                warn!(
                    system_tokens,
                    budget = self.budget.total,
                    "System blocks exceed the token budget; sending without history"
                );
                0
            }
        };

        let (history, hist_stats, hist_drop) =
            Self::render_history_layer(conversation, history_budget);
        messages.extend(history);
        stats.push(hist_stats);
        if let Some(d) = hist_drop {
            drops.push(d);
        }

        self.finish(messages, stats, drops)
    }

    fn assemble_read_url(&self, page: &FetchedContent) -> AssembledContext {
        let msg = ChatMessage::user(read_url_prompt(page.as_str()));
        let stats = vec![LayerStats {
            name: "page".into(),
            tokens: token::estimate_message_tokens(&msg),
            items_included: 1,
            items_total: 1,
        }];
        self.finish(vec![msg], stats, Vec::new())
    }

    fn finish(
        &self,
        messages: Vec<ChatMessage>,
        stats: Vec<LayerStats>,
        drops: Vec<DropInfo>,
    ) -> AssembledContext {
        let total_tokens: usize = stats.iter().map(|s| s.tokens).sum();
        let utilization_pct = if self.budget.total == 0 {
            0.0
        } else {
            (total_tokens as f32 / self.budget.total as f32) * 100.0
        };

        AssembledContext {
            messages,
            metadata: AssemblyMetadata {
                total_tokens,
                budget: self.budget.total,
                utilization_pct,
                per_layer: stats,
                drops,
            },
        }
    }

    /// Newest-first window over text turns, stopping at the first turn
    /// that does not fit so the kept history stays contiguous.
    fn render_history_layer(
        conversation: &Conversation,
        budget: usize,
    ) -> (Vec<ChatMessage>, LayerStats, Option<DropInfo>) {
        let layer = "history";
        let all: Vec<ChatMessage> = conversation
            .turns()
            .iter()
            .filter_map(|t| t.to_chat_message())
            .collect();
        if all.is_empty() {
            return (Vec::new(), Self::empty_stats(layer, 0), None);
        }

        let mut used = 0;
        let mut kept = 0;
        for msg in all.iter().rev() {
            let msg_tokens = token::estimate_message_tokens(msg);
            if used + msg_tokens > budget {
                break;
            }
            used += msg_tokens;
            kept += 1;
        }

        let split = all.len() - kept;
        let dropped_tokens = token::estimate_messages_tokens(&all[..split]);
        let included = all[split..].to_vec();

        (
            included,
            LayerStats {
                name: layer.into(),
                tokens: used,
                items_included: kept,
                items_total: all.len(),
            },
            Self::maybe_drop(
                layer,
                split,
                dropped_tokens,
                "Oldest turns dropped (sliding window)",
            ),
        )
    }

    // ── Helpers ────────────────────────────────────────────────────────────

    fn empty_stats(layer: &str, total: usize) -> LayerStats {
        LayerStats {
            name: layer.into(),
            tokens: 0,
            items_included: 0,
            items_total: total,
        }
    }

    fn maybe_drop(layer: &str, count: usize, tokens: usize, reason: &str) -> Option<DropInfo> {
        if count > 0 {
            Some(DropInfo {
                layer: layer.into(),
                items_dropped: count,
                tokens_dropped: tokens,
                reason: reason.into(),
            })
        } else {
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
