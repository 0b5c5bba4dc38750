//! # Chat Hub Core
//!
//! Domain types, traits, and error definitions for the Chat Hub assistant.
//! This crate has **no HTTP or UI dependencies**: it defines the domain model
//! that all other crates implement against.
//!
//! Every external seam (completion provider, page reader) is a trait here;
//! implementations live in their own crates so tests can swap in stubs.

pub mod error;
pub mod export;
pub mod fetch;
pub mod message;
pub mod model;
pub mod provider;
pub mod session;
pub mod upload;

// Re-export key types at crate root for ergonomics
pub use error::{CompletionError, Error, FetchError, Result};
pub use export::ExportFormat;
pub use fetch::{FetchedContent, PageReader};
pub use message::{ChatMessage, Conversation, Role, Turn, TurnContent, TurnKind};
pub use model::ModelTier;
pub use provider::{Modality, Provider, ProviderRequest, ProviderResponse, StreamChunk};
pub use session::SessionState;
pub use upload::{Upload, UploadKind};
