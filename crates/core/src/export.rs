//! Conversation export: plain text, markdown transcript, or raw JSON.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::message::{Conversation, Turn};

/// Placeholder written by the text formats when there is nothing to export.
pub const EMPTY_EXPORT: &str = "No chat history yet.";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Markdown,
    Json,
}

impl ExportFormat {
    /// Conventional file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "md" | "markdown" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format '{other}' (use txt, md or json)")),
        }
    }
}

impl Conversation {
    /// Serialize the conversation in the given format.
    ///
    /// Image turns only appear in the JSON export.
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(self.turns())?),
            ExportFormat::Text => Ok(self.render_lines(|role, text| format!("{role}: {text}"))),
            ExportFormat::Markdown => {
                Ok(self.render_lines(|role, text| format!("**{role}**: {text}")))
            }
        }
    }

    /// Parse a JSON export back into a conversation.
    pub fn from_json(json: &str) -> Result<Self> {
        let turns: Vec<Turn> = serde_json::from_str(json).map_err(Error::Serialization)?;
        Ok(Self::from_turns(turns))
    }

    fn render_lines(&self, line: impl Fn(String, &str) -> String) -> String {
        let blocks: Vec<String> = self
            .text_turns()
            .filter_map(|t| {
                t.as_text()
                    .map(|text| line(t.role().as_str().to_uppercase(), text))
            })
            .collect();

        if blocks.is_empty() {
            EMPTY_EXPORT.to_string()
        } else {
            blocks.join("\n\n")
        }
    }
}
