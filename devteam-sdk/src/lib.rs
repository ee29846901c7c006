//! Shared contracts for the devteam workflow engine: data model, role and
//! backend traits, errors, run events and the runtime surface.

pub mod backend;
pub mod console;
pub mod context;
pub mod error;
pub mod events;
pub mod role;
pub mod runtime;
pub mod types;

// Re-export for runtime implementors
pub use async_trait::async_trait;

pub use backend::{
    ChatMessage, ChatRole, ChunkStream, Completion, CompletionBackend, CompletionOptions,
    StreamAccumulator, StreamChunk,
};
pub use context::WorkflowContext;
pub use error::{DevTeamError, Result};
pub use events::RunEvent;
pub use role::{JsonOrText, OutputParser, Role};
pub use runtime::DevTeamRuntime;
pub use types::*;
