//! The completion client: the one boundary the chat engine talks to.
//!
//! Wraps a [`Provider`] and resolves its raw responses into a [`Completion`]
//! (text or decoded image bytes) or a pull-based [`CompletionStream`].

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chathub_config::AppConfig;
use chathub_core::error::{CompletionError, Error, Result};
use chathub_core::message::ChatMessage;
use chathub_core::provider::{Modality, Provider, ProviderRequest, StreamReceiver};
use tracing::debug;

/// The resolved result of a non-streaming call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Text(String),
    Image(Vec<u8>),
}

/// Sends requests through a provider with the session's sampling settings.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Build a client for the configured endpoint.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(crate::router::build_from_config(config))
            .with_sampling(config.temperature, config.max_tokens)
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn request(&self, model: &str, messages: Vec<ChatMessage>) -> ProviderRequest {
        let mut request = ProviderRequest::new(model, messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request
    }

    /// Send a non-streaming request.
    ///
    /// When `modalities` includes [`Modality::Image`] the first returned image
    /// is decoded and a missing image is [`Error::NoImageReturned`].
    pub async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        modalities: &[Modality],
    ) -> Result<Completion> {
        let request = self.request(model, messages).with_modalities(modalities);
        let response = self.provider.complete(request).await?;

        if modalities.contains(&Modality::Image) {
            let Some(uri) = response.images.first() else {
                return Err(Error::NoImageReturned);
            };
            let bytes = decode_data_uri(uri)?;
            debug!(model = %response.model, bytes = bytes.len(), "Decoded image payload");
            return Ok(Completion::Image(bytes));
        }

        Ok(Completion::Text(response.message.content))
    }

    /// Open a streaming request.
    pub async fn stream(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> std::result::Result<CompletionStream, CompletionError> {
        let rx = self.provider.stream(self.request(model, messages)).await?;
        Ok(CompletionStream::new(rx))
    }
}

/// A single in-flight streamed completion.
///
/// Each call to [`next_partial`](Self::next_partial) yields the text
/// accumulated so far. Not restartable: once it returns `None` or an error
/// the stream is finished.
pub struct CompletionStream {
    rx: StreamReceiver,
    text: String,
    finished: bool,
}

impl CompletionStream {
    pub fn new(rx: StreamReceiver) -> Self {
        Self {
            rx,
            text: String::new(),
            finished: false,
        }
    }

    /// Wait for the next increment and return the accumulated text.
    pub async fn next_partial(&mut self) -> Option<std::result::Result<&str, CompletionError>> {
        loop {
            if self.finished {
                return None;
            }

            let chunk = match self.rx.recv().await {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                Some(Ok(chunk)) => chunk,
            };

            let grew = match chunk.content {
                Some(delta) if !delta.is_empty() => {
                    self.text.push_str(&delta);
                    true
                }
                _ => false,
            };
            if chunk.done {
                self.finished = true;
            }
            if grew {
                return Some(Ok(&self.text));
            }
        }
    }

    /// The text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain the remaining stream and return the full text.
    pub async fn collect(mut self) -> std::result::Result<String, CompletionError> {
        while let Some(partial) = self.next_partial().await {
            partial?;
        }
        Ok(self.text)
    }
}

/// Decode the base64 payload of a `data:<mime>;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> std::result::Result<Vec<u8>, CompletionError> {
    let (_, payload) = uri
        .split_once(',')
        .ok_or_else(|| CompletionError::Malformed("image URL is not a data URI".into()))?;
    STANDARD
        .decode(payload.trim())
        .map_err(|e| CompletionError::Malformed(format!("invalid base64 image payload: {e}")))
}
