//! Echo backend.
//!
//! Streams the formatted prompt straight back, split after each whitespace
//! run. Useful for checking template output end to end without a model.

use tracing::debug;

use super::{Engine, EngineDialog, EngineError, SentenceCode};

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoEngine;

impl EchoEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for EchoEngine {
    fn create_dialog(&self) -> Result<Box<dyn EngineDialog>, EngineError> {
        Ok(Box::new(EchoDialog))
    }
}

struct EchoDialog;

impl EngineDialog for EchoDialog {
    fn query(
        &mut self,
        prompt: &str,
        _mode: SentenceCode,
        on_token: &mut dyn FnMut(&str, SentenceCode),
    ) -> Result<(), EngineError> {
        let pieces: Vec<&str> = prompt.split_inclusive(char::is_whitespace).collect();
        if pieces.is_empty() {
            on_token("", SentenceCode::End);
            return Ok(());
        }

        let last = pieces.len() - 1;
        for (i, piece) in pieces.into_iter().enumerate() {
            let code = if i == last {
                SentenceCode::End
            } else if i == 0 {
                SentenceCode::Begin
            } else {
                SentenceCode::Continue
            };
            on_token(piece, code);
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        debug!("echo dialog reset");
        Ok(())
    }
}
