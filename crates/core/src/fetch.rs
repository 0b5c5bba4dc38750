//! Fetched content and the page-reader seam.
//!
//! `FetchedContent` is transient: it lives for the turn that produced it and
//! is never longer than its character budget.

use async_trait::async_trait;

use crate::error::FetchError;

/// Default character budget for any fetched text.
pub const DEFAULT_MAX_CHARS: usize = 6000;

/// Text fetched from a URL or an uploaded file, bounded to a character budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent(String);

impl FetchedContent {
    /// Wrap `text`, truncating it to at most `max_chars` characters.
    pub fn bounded(text: impl Into<String>, max_chars: usize) -> Self {
        let mut text = text.into();
        if let Some((byte_idx, _)) = text.char_indices().nth(max_chars) {
            text.truncate(byte_idx);
        }
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for FetchedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can turn a URL into bounded page text.
#[async_trait]
pub trait PageReader: Send + Sync {
    async fn read(&self, url: &str) -> Result<FetchedContent, FetchError>;
}
