//! The chat engine: one call per user input.
//!
//! Each turn runs **route → handle → update state**:
//!
//! 1. The router records the user turn and classifies it
//! 2. The matching handler fetches content and calls the completion client
//! 3. On success the assistant turn is appended (and memory refreshed for
//!    plain chat). On failure nothing further is recorded.

use std::sync::Arc;

use chathub_config::{AppConfig, ModelsConfig};
use chathub_core::error::{Error, Result};
use chathub_core::fetch::PageReader;
use chathub_core::message::Turn;
use chathub_core::provider::Modality;
use chathub_core::session::SessionState;
use chathub_fetch::{FileFetcher, UrlFetcher};
use chathub_memory::MemorySummarizer;
use chathub_providers::{Completion, CompletionClient};
use tracing::{debug, info, warn};

use crate::command::{CommandRouter, HELP_TEXT, Intent};
use crate::context::{AssemblyInput, ContextAssembler, TokenBudget};
use crate::stream_event::TurnEvent;

/// What a completed turn produced. The same content has already been
/// appended to the session's conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A streamed plain-chat reply.
    Reply(String),
    /// Decoded bytes of a generated image.
    Image(Vec<u8>),
    /// A web page summary.
    Summary(String),
    /// The command help text.
    Help(String),
}

/// Runs chat turns against a session.
pub struct ChatEngine {
    client: CompletionClient,
    reader: Arc<dyn PageReader>,
    files: FileFetcher,
    router: CommandRouter,
    assembler: ContextAssembler,
    summarizer: MemorySummarizer,
    models: ModelsConfig,
    image_model: String,
}

impl ChatEngine {
    /// Wire an engine from configuration with explicit client and page reader.
    pub fn new(config: &AppConfig, client: CompletionClient, reader: Arc<dyn PageReader>) -> Self {
        Self {
            summarizer: MemorySummarizer::from_config(client.clone(), &config.memory),
            client,
            reader,
            files: FileFetcher::from_config(&config.fetch),
            router: CommandRouter::from_config(&config.guard),
            assembler: ContextAssembler::new(
                &config.identity.system_prompt,
                TokenBudget {
                    total: config.context.budget_tokens,
                },
            ),
            models: config.models.clone(),
            image_model: config.image_model.clone(),
        }
    }

    /// Wire an engine talking to the configured endpoint over HTTP.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config,
            CompletionClient::from_config(config),
            Arc::new(UrlFetcher::from_config(&config.fetch)),
        )
    }

    /// The provider model id for the session's selected tier.
    pub fn model_id(&self, session: &SessionState) -> &str {
        self.models.resolve(session.model)
    }

    /// Handle one raw user input.
    ///
    /// `on_event` receives [`TurnEvent::Started`] once routing succeeds and
    /// [`TurnEvent::Partial`] after every streamed increment.
    pub async fn handle(
        &self,
        session: &mut SessionState,
        input: &str,
        mut on_event: impl FnMut(TurnEvent),
    ) -> Result<TurnOutcome> {
        let intent = self.router.route(session, input)?;
        info!(intent = %intent.kind(), model = %session.model, "Handling turn");
        on_event(TurnEvent::Started {
            intent: intent.kind(),
        });

        match intent {
            Intent::ImageGenerate { prompt } => self.generate_image(session, &prompt).await,
            Intent::ReadUrl { url } => self.read_url(session, &url).await,
            Intent::Help => {
                session.conversation.push(Turn::assistant(HELP_TEXT));
                Ok(TurnOutcome::Help(HELP_TEXT.to_string()))
            }
            Intent::PlainChat => self.chat(session, &mut on_event).await,
        }
    }

    async fn generate_image(&self, session: &mut SessionState, prompt: &str) -> Result<TurnOutcome> {
        let messages = vec![chathub_core::ChatMessage::user(prompt)];
        let completion = self
            .client
            .complete(
                &self.image_model,
                messages,
                &[Modality::Image, Modality::Text],
            )
            .await?;

        let Completion::Image(bytes) = completion else {
            return Err(Error::NoImageReturned);
        };
        debug!(bytes = bytes.len(), "Image generated");
        session.conversation.push(Turn::image(bytes.clone()));
        Ok(TurnOutcome::Image(bytes))
    }

    async fn read_url(&self, session: &mut SessionState, url: &str) -> Result<TurnOutcome> {
        let page = self.reader.read(url).await?;
        let context = self
            .assembler
            .assemble(&AssemblyInput::ReadUrl { page: &page });

        let completion = self
            .client
            .complete(self.model_id(session), context.messages, &[])
            .await?;
        let Completion::Text(summary) = completion else {
            return Err(Error::Completion(
                chathub_core::CompletionError::Malformed("expected a text summary".into()),
            ));
        };

        session.conversation.push(Turn::assistant(summary.clone()));
        Ok(TurnOutcome::Summary(summary))
    }

    async fn chat(
        &self,
        session: &mut SessionState,
        on_event: &mut impl FnMut(TurnEvent),
    ) -> Result<TurnOutcome> {
        // The upload is re-read every turn; only its bytes live in the session.
        let file_context = session.upload.as_ref().map(|u| self.files.read(u));
        let context = self.assembler.assemble(&AssemblyInput::Chat {
            memory: &session.memory,
            file_context: file_context.as_ref(),
            conversation: &session.conversation,
        });
        debug!(
            messages = context.messages.len(),
            tokens = context.metadata.total_tokens,
            dropped_turns = context.metadata.dropped_turns(),
            "Assembled chat context"
        );

        let mut stream = self
            .client
            .stream(self.model_id(session), context.messages)
            .await?;

        while let Some(partial) = stream.next_partial().await {
            match partial {
                Ok(text) => on_event(TurnEvent::Partial {
                    text: text.to_string(),
                }),
                Err(e) => {
                    warn!(error = %e, "Stream failed; discarding partial reply");
                    return Err(e.into());
                }
            }
        }

        let reply = stream.text().to_string();
        session.conversation.push(Turn::assistant(reply.clone()));
        self.summarizer.refresh(session).await;
        Ok(TurnOutcome::Reply(reply))
    }
}
