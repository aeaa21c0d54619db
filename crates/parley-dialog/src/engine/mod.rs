//! Backend collaborator seam.
//!
//! An [`Engine`] stands for one loaded configuration (model weights, runtime
//! settings). It creates [`EngineDialog`]s, each an independent backend
//! conversation context. Both are released by `Drop`, so a handle is freed
//! exactly once on every exit path.

mod echo;
#[cfg(feature = "genie")]
pub mod genie;
#[cfg(test)]
pub(crate) mod scripted;

pub use echo::EchoEngine;

/// Tag attached to each streamed fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentenceCode {
    /// The whole response in one piece. Also the mode queries are issued with.
    Complete,
    /// First fragment of a response.
    Begin,
    /// A partial fragment.
    Continue,
    /// Terminal fragment of the response.
    End,
    /// The backend aborted generation.
    Abort,
}

impl SentenceCode {
    /// Whether no further fragments follow this one.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::End | Self::Abort)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine returned status {0}")]
    Status(i32),

    #[error("{0}")]
    Backend(String),
}

/// A loaded backend configuration.
pub trait Engine: Send {
    /// Instantiate a fresh conversation context.
    fn create_dialog(&self) -> Result<Box<dyn EngineDialog>, EngineError>;
}

/// One backend conversation context.
pub trait EngineDialog: Send {
    /// Run a prompt to completion, calling `on_token` for every fragment in
    /// emission order. Blocks until the backend reports a final status.
    fn query(
        &mut self,
        prompt: &str,
        mode: SentenceCode,
        on_token: &mut dyn FnMut(&str, SentenceCode),
    ) -> Result<(), EngineError>;

    /// Drop all conversation memory held by the backend.
    fn reset(&mut self) -> Result<(), EngineError>;
}
