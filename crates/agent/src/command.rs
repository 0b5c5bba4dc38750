//! Command routing: raw input in, exactly one intent out.

use chathub_config::GuardConfig;
use chathub_core::error::{Error, Result};
use chathub_core::message::Turn;
use chathub_core::session::SessionState;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const IMAGE_COMMAND: &str = "/image";
pub const READ_COMMAND: &str = "/read";
pub const HELP_COMMAND: &str = "/help";

/// Appended as an assistant turn for `/help`.
pub const HELP_TEXT: &str = "### Commands
- `/image <prompt>` – Generate AI art
- `/read <url>` – Read & summarize a webpage
- Upload a file to chat with documents";

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ImageGenerate { prompt: String },
    ReadUrl { url: String },
    Help,
    PlainChat,
}

/// Payload-free tag for an [`Intent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    ImageGenerate,
    ReadUrl,
    Help,
    PlainChat,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImageGenerate => "image-generate",
            Self::ReadUrl => "read-url",
            Self::Help => "help",
            Self::PlainChat => "plain-chat",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Intent {
    /// Classify input by plain prefix match, checking `/image`, `/read`,
    /// then `/help`. The argument is the trimmed remainder after the token
    /// and may be empty.
    pub fn classify(input: &str) -> Self {
        if let Some(rest) = input.strip_prefix(IMAGE_COMMAND) {
            Self::ImageGenerate {
                prompt: rest.trim().to_string(),
            }
        } else if let Some(rest) = input.strip_prefix(READ_COMMAND) {
            Self::ReadUrl {
                url: rest.trim().to_string(),
            }
        } else if input.starts_with(HELP_COMMAND) {
            Self::Help
        } else {
            Self::PlainChat
        }
    }

    pub fn kind(&self) -> IntentKind {
        match self {
            Self::ImageGenerate { .. } => IntentKind::ImageGenerate,
            Self::ReadUrl { .. } => IntentKind::ReadUrl,
            Self::Help => IntentKind::Help,
            Self::PlainChat => IntentKind::PlainChat,
        }
    }
}

/// Records the user turn, screens it against the reject-list and classifies it.
#[derive(Debug, Clone, Default)]
pub struct CommandRouter {
    /// Lower-cased forbidden substrings.
    forbidden: Vec<String>,
}

impl CommandRouter {
    pub fn new<I, S>(forbidden: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            forbidden: forbidden
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(&config.forbidden)
    }

    /// The first forbidden term contained in `input`, if any.
    pub fn forbidden_term(&self, input: &str) -> Option<&str> {
        let lowered = input.to_lowercase();
        self.forbidden
            .iter()
            .find(|term| lowered.contains(term.as_str()))
            .map(String::as_str)
    }

    /// Append `input` as a user turn, then classify it.
    ///
    /// The turn is recorded before screening, so a rejected input still
    /// shows up in the conversation history.
    pub fn route(&self, session: &mut SessionState, input: &str) -> Result<Intent> {
        session.conversation.push(Turn::user(input));

        if let Some(term) = self.forbidden_term(input) {
            warn!(term, "Input rejected by guard");
            return Err(Error::ForbiddenInput {
                term: term.to_string(),
            });
        }

        let intent = Intent::classify(input);
        debug!(intent = %intent.kind(), "Routed input");
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chathub_core::message::{Role, TurnKind};

    #[test]
    fn classify_commands() {
        assert_eq!(
            Intent::classify("/image  a red fox "),
            Intent::ImageGenerate {
                prompt: "a red fox".into()
            }
        );
        assert_eq!(
            Intent::classify("/read https://example.com"),
            Intent::ReadUrl {
                url: "https://example.com".into()
            }
        );
        assert_eq!(Intent::classify("/help"), Intent::Help);
        assert_eq!(Intent::classify("hello there"), Intent::PlainChat);
    }

    #[test]
    fn empty_argument_is_forwarded() {
        assert_eq!(
            Intent::classify("/image"),
            Intent::ImageGenerate {
                prompt: String::new()
            }
        );
        assert_eq!(Intent::classify("/read   "), Intent::ReadUrl { url: String::new() });
    }

    #[test]
    fn matching_is_a_plain_prefix() {
        assert_eq!(
            Intent::classify("/imagery"),
            Intent::ImageGenerate {
                prompt: "ry".into()
            }
        );
        assert_eq!(Intent::classify("/helpme"), Intent::Help);
        assert_eq!(Intent::classify(" /help"), Intent::PlainChat);
        assert_eq!(Intent::classify("/unknown"), Intent::PlainChat);
        assert_eq!(Intent::classify("please /image x"), Intent::PlainChat);
    }

    #[test]
    fn route_appends_user_turn_first() {
        let router = CommandRouter::default();
        let mut session = SessionState::default();
        let intent = router.route(&mut session, "/help").unwrap();
        assert_eq!(intent, Intent::Help);
        assert_eq!(session.conversation.len(), 1);
        let turn = session.conversation.last().unwrap();
        assert_eq!(turn.role(), Role::User);
        assert_eq!(turn.kind(), TurnKind::Text);
        assert_eq!(turn.as_text(), Some("/help"));
    }

    #[test]
    fn forbidden_input_is_case_insensitive() {
        let router = CommandRouter::new(["Password", ""]);
        let mut session = SessionState::default();
        let err = router
            .route(&mut session, "my PASSWORD is hunter2")
            .unwrap_err();
        match err {
            Error::ForbiddenInput { term } => assert_eq!(term, "password"),
            other => panic!("unexpected: {other:?}"),
        }
        // Recorded before the guard ran.
        assert_eq!(session.conversation.len(), 1);
    }

    #[test]
    fn empty_reject_list_allows_everything() {
        let router = CommandRouter::from_config(&GuardConfig::default());
        assert!(router.forbidden_term("anything at all").is_none());
    }

    #[test]
    fn intent_kind_labels() {
        assert_eq!(IntentKind::ReadUrl.to_string(), "read-url");
        assert_eq!(
            serde_json::to_string(&IntentKind::ImageGenerate).unwrap(),
            "\"image_generate\""
        );
    }
}
