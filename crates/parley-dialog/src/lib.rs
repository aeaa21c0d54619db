//! Dialogue engine for Parley.
//!
//! Runs many independent conversations against one loaded model backend:
//! - model-family prompt templates (`template`)
//! - the backend collaborator traits and built-in engines (`engine`)
//! - per-dialogue turn state and the serialized session manager (`session`)
//! - forwarding of streamed fragments to a caller's consumer (`streaming`)

pub mod engine;
pub mod session;
pub mod streaming;
pub mod template;

pub use engine::{EchoEngine, Engine, EngineDialog, EngineError, SentenceCode};
pub use parley_common::DialogueId;
pub use session::SessionManager;
pub use streaming::{StreamSummary, Transcript};
pub use template::{ModelFamily, PromptTemplate};

#[cfg(feature = "genie")]
pub use engine::genie::GenieEngine;

#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("failed to create engine dialog: {0}")]
    EngineCreation(#[source] EngineError),

    #[error("dialogue not found: {0}")]
    SessionNotFound(DialogueId),

    #[error("dialogue {0} is stateless, user_query needs a stateful dialogue")]
    NotStateful(DialogueId),

    #[error("dialogue {0} has no first turn yet, call query with a system prompt first")]
    FirstTurnRequired(DialogueId),

    #[error("query on dialogue {id} failed: {source}")]
    QueryFailed {
        id: DialogueId,
        #[source]
        source: EngineError,
    },

    #[error("reset of dialogue {id} failed: {source}")]
    ResetFailed {
        id: DialogueId,
        #[source]
        source: EngineError,
    },
}

impl DialogError {
    /// True for errors caused by the caller rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound(_) | Self::NotStateful(_) | Self::FirstTurnRequired(_)
        )
    }
}
