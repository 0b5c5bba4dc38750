//! Session memory for Chat Hub.
//!
//! The summarizer distills recent turns into a short description of the
//! user's durable preferences and goals, which the context assembler
//! injects into every plain-chat request.

pub mod summarizer;

pub use summarizer::{MEMORY_PROMPT, MemorySummarizer, render_window};
