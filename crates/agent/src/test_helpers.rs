//! Shared test helpers for engine tests.

use async_trait::async_trait;
use chathub_core::error::{CompletionError, FetchError};
use chathub_core::fetch::{FetchedContent, PageReader};
use chathub_core::message::ChatMessage;
use chathub_core::provider::{
    Provider, ProviderRequest, ProviderResponse, StreamChunk, StreamReceiver,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted provider reply.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Non-streaming text.
    Text(String),
    /// Non-streaming response carrying image data URIs.
    Images(Vec<String>),
    /// Streamed deltas followed by a clean end.
    Stream(Vec<String>),
    /// Streamed deltas, then a mid-stream failure.
    BrokenStream(Vec<String>, CompletionError),
    /// The call itself fails.
    Fail(CompletionError),
}

/// A mock provider that plays back replies in order, whichever method is
/// called. Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Scripted>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request seen so far, in call order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: ProviderRequest) -> Scripted {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no more replies"))
    }
}

fn response(model: String, content: String, images: Vec<String>) -> ProviderResponse {
    ProviderResponse {
        message: ChatMessage::assistant(content),
        images,
        usage: None,
        model,
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, CompletionError> {
        let model = request.model.clone();
        match self.next(request) {
            Scripted::Text(text) => Ok(response(model, text, vec![])),
            Scripted::Images(images) => Ok(response(model, String::new(), images)),
            Scripted::Stream(parts) => Ok(response(model, parts.concat(), vec![])),
            Scripted::BrokenStream(_, e) | Scripted::Fail(e) => Err(e),
        }
    }

    async fn stream(&self, request: ProviderRequest) -> Result<StreamReceiver, CompletionError> {
        let (parts, tail) = match self.next(request) {
            Scripted::Stream(parts) => (parts, Ok(StreamChunk::finished())),
            Scripted::BrokenStream(parts, e) => (parts, Err(e)),
            Scripted::Text(text) => (vec![text], Ok(StreamChunk::finished())),
            Scripted::Images(_) => (vec![], Ok(StreamChunk::finished())),
            Scripted::Fail(e) => return Err(e),
        };

        let (tx, rx) = tokio::sync::mpsc::channel(parts.len() + 1);
        for part in parts {
            let _ = tx.try_send(Ok(StreamChunk::delta(part)));
        }
        let _ = tx.try_send(tail);
        Ok(rx)
    }
}

/// A page reader returning a fixed page or error, recording requested URLs.
pub struct StubReader {
    result: Result<String, FetchError>,
    urls: Mutex<Vec<String>>,
}

impl StubReader {
    pub fn page(text: &str) -> Self {
        Self {
            result: Ok(text.into()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: FetchError) -> Self {
        Self {
            result: Err(err),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageReader for StubReader {
    async fn read(&self, url: &str) -> Result<FetchedContent, FetchError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.result
            .clone()
            .map(|text| FetchedContent::bounded(text, chathub_core::fetch::DEFAULT_MAX_CHARS))
    }
}
