//! Streaming query relay.
//!
//! The backend pushes fragments through a callback while the query call
//! blocks. The relay forwards each one to the caller's consumer unchanged
//! and in emission order: no buffering, reordering or deduplication. When
//! the backend fails, fragments already forwarded stay delivered.

use tracing::debug;

use crate::engine::{EngineDialog, EngineError, SentenceCode};

/// What passed through the relay during one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub fragments: usize,
    pub bytes: usize,
    /// A terminal sentence code was seen.
    pub terminated: bool,
}

/// Issue `prompt` and forward every fragment to `consumer`.
pub(crate) fn relay(
    dialog: &mut dyn EngineDialog,
    prompt: &str,
    consumer: &mut dyn FnMut(&str, SentenceCode),
) -> Result<StreamSummary, EngineError> {
    let mut summary = StreamSummary::default();

    let status = dialog.query(prompt, SentenceCode::Complete, &mut |text, code| {
        summary.fragments += 1;
        summary.bytes += text.len();
        if code.is_terminal() {
            summary.terminated = true;
        }
        consumer(text, code);
    });

    debug!(
        fragments = summary.fragments,
        bytes = summary.bytes,
        terminated = summary.terminated,
        ok = status.is_ok(),
        "query relayed"
    );
    status.map(|()| summary)
}

/// Accumulates a streamed response into one string.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    text: String,
    complete: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer-compatible sink.
    pub fn push(&mut self, text: &str, code: SentenceCode) {
        self.text.push_str(text);
        if code.is_terminal() {
            self.complete = true;
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Whether the terminal fragment arrived.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
