//! Per-session mutable state, passed explicitly into every turn.

use crate::message::Conversation;
use crate::model::ModelTier;
use crate::upload::Upload;

/// Everything one chat session owns.
///
/// Created at session start and dropped at session end. Only one turn
/// touches it at a time, so it is handed around as `&mut SessionState`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub conversation: Conversation,
    /// Durable user preferences; empty means none known.
    pub memory: String,
    pub model: ModelTier,
    /// The active upload, re-read on every plain-chat turn.
    pub upload: Option<Upload>,
}

impl SessionState {
    pub fn new(model: ModelTier) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Replace the memory summary. Never appends.
    pub fn set_memory(&mut self, summary: impl Into<String>) {
        self.memory = summary.into();
    }

    pub fn attach(&mut self, upload: Upload) -> Option<Upload> {
        self.upload.replace(upload)
    }

    pub fn detach(&mut self) -> Option<Upload> {
        self.upload.take()
    }
}
