//! Turn and Conversation domain types.
//!
//! These are the core value objects that flow through the entire system:
//! user types input → router appends a `Turn` → engine calls the provider →
//! the assistant's `Turn` is appended to the same `Conversation`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions (persona, memory, file context)
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a turn carries text or a generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Text,
    Image,
}

/// The payload of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnContent {
    Text(String),
    /// Raw image bytes as decoded from the provider's data URI.
    Image(Vec<u8>),
}

/// A single turn in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TurnRecord", try_from = "TurnRecord")]
pub struct Turn {
    role: Role,
    content: TurnContent,
    timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a text turn with an explicit role.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: TurnContent::Text(content.into()),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Create an assistant turn holding a generated image.
    pub fn image(bytes: Vec<u8>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Image(bytes),
            timestamp: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &TurnContent {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn kind(&self) -> TurnKind {
        match self.content {
            TurnContent::Text(_) => TurnKind::Text,
            TurnContent::Image(_) => TurnKind::Image,
        }
    }

    /// The text of this turn, or `None` for image turns.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            TurnContent::Text(text) => Some(text),
            TurnContent::Image(_) => None,
        }
    }

    /// Convert to a provider message. Image turns have no text form.
    pub fn to_chat_message(&self) -> Option<ChatMessage> {
        self.as_text().map(|text| ChatMessage {
            role: self.role,
            content: text.to_string(),
        })
    }
}

/// Wire form of a [`Turn`]: image bytes travel as base64.
#[derive(Serialize, Deserialize)]
struct TurnRecord {
    role: Role,
    kind: TurnKind,
    content: String,
    timestamp: DateTime<Utc>,
}

impl From<Turn> for TurnRecord {
    fn from(turn: Turn) -> Self {
        let kind = turn.kind();
        let content = match turn.content {
            TurnContent::Text(text) => text,
            TurnContent::Image(bytes) => STANDARD.encode(bytes),
        };
        Self {
            role: turn.role,
            kind,
            content,
            timestamp: turn.timestamp,
        }
    }
}

impl TryFrom<TurnRecord> for Turn {
    type Error = String;

    fn try_from(record: TurnRecord) -> Result<Self, Self::Error> {
        let content = match record.kind {
            TurnKind::Text => TurnContent::Text(record.content),
            TurnKind::Image => TurnContent::Image(
                STANDARD
                    .decode(record.content.as_bytes())
                    .map_err(|e| format!("invalid base64 image content: {e}"))?,
            ),
        };
        Ok(Self {
            role: record.role,
            content,
            timestamp: record.timestamp,
        })
    }
}

/// A plain role/content pair as sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A conversation is an ordered, append-only sequence of turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    turns: Vec<Turn>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last turn was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a conversation from previously exported turns.
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        let mut conv = Self::new();
        conv.turns = turns;
        conv
    }

    /// Append a turn to the conversation.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Iterate over turns that carry text, in order.
    pub fn text_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.kind() == TurnKind::Text)
    }

    /// Drop every turn. The only way history ever shrinks.
    pub fn clear(&mut self) {
        self.updated_at = Utc::now();
        self.turns.clear();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
