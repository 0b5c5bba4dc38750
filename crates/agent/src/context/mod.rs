//! Request context assembly.
//!
//! Builds the ordered message list for one completion call from the
//! persona, the memory summary, the active upload and the conversation,
//! enforcing a token budget on history.
//!
//! | Block | Source | Trim Strategy |
//! |-------|--------|---------------|
//! | Persona | Identity config | Never trimmed |
//! | Memory | Session summary | Omitted when empty |
//! | File context | Active upload | Omitted when absent |
//! | History | Text turns | Oldest turns dropped |

pub mod assembler;
pub mod token;

pub use assembler::{
    AssembledContext, AssemblyInput, AssemblyMetadata, ContextAssembler, DropInfo, LayerStats,
    TokenBudget,
};
