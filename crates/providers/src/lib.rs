//! Completion providers for Chat Hub.
//!
//! [`OpenAiCompatProvider`] implements `chathub_core::Provider` over HTTP;
//! [`CompletionClient`] is what the rest of the app calls.

pub mod client;
pub mod openai_compat;
pub mod router;

pub use client::{Completion, CompletionClient, CompletionStream, decode_data_uri};
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
