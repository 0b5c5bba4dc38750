//! The Chat Hub turn engine.
//!
//! Every user input goes through the same cycle:
//!
//! 1. **Route**: record the user turn, screen it, classify it
//! 2. **Assemble**: build the message list within the token budget
//! 3. **Dispatch**: image generation, page summary, help, or streamed chat
//! 4. **Update**: append the assistant turn and refresh the memory summary

pub mod command;
pub mod context;
pub mod engine;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use command::{CommandRouter, HELP_TEXT, Intent, IntentKind};
pub use context::{
    AssembledContext, AssemblyInput, AssemblyMetadata, ContextAssembler, DropInfo, LayerStats,
    TokenBudget,
};
pub use engine::{ChatEngine, TurnOutcome};
pub use stream_event::TurnEvent;
