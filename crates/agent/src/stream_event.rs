//! Turn-level progress events.
//!
//! The engine reports progress through a caller-supplied callback so the
//! UI can redraw while a reply streams in.

use serde::{Deserialize, Serialize};

use crate::command::IntentKind;

/// Events emitted while a turn runs.
///
/// - `started`: the input was routed and the handler is starting
/// - `partial`: the accumulated reply text after a streamed increment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Started { intent: IntentKind },
    Partial { text: String },
}

impl TurnEvent {
    /// Event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Partial { .. } => "partial",
        }
    }
}
