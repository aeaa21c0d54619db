//! One conversation and its turn state.

use tracing::warn;

use crate::engine::{Engine, EngineDialog, EngineError, SentenceCode};
use crate::streaming::{self, StreamSummary};
use crate::{DialogError, DialogueId};

/// A conversation bound to exactly one backend dialog handle.
///
/// The handle is owned here and freed when the session is dropped.
pub(crate) struct DialogueSession {
    id: DialogueId,
    engine: Box<dyn EngineDialog>,
    stateful: bool,
    first_turn: bool,
}

impl DialogueSession {
    pub(crate) fn open(
        engine: &dyn Engine,
        id: DialogueId,
        stateful: bool,
    ) -> Result<Self, DialogError> {
        let handle = engine.create_dialog().map_err(DialogError::EngineCreation)?;
        Ok(Self {
            id,
            engine: handle,
            stateful,
            first_turn: true,
        })
    }

    pub(crate) fn is_stateful(&self) -> bool {
        self.stateful
    }

    pub(crate) fn is_first_turn(&self) -> bool {
        self.first_turn
    }

    /// Issue an already formatted prompt and stream the reply to `consumer`.
    ///
    /// The first-turn flag is cleared before the backend sees the prompt. A
    /// stateless session is reset afterwards on every exit path.
    pub(crate) fn submit(
        &mut self,
        prompt: &str,
        consumer: &mut dyn FnMut(&str, SentenceCode),
    ) -> Result<StreamSummary, DialogError> {
        self.first_turn = false;

        let mut turn = TurnGuard::begin(self);
        let result = streaming::relay(turn.engine(), prompt, consumer);
        let reset = turn.finish();

        let id = &self.id;
        match (result, reset) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(source)) => Err(DialogError::ResetFailed {
                id: id.clone(),
                source,
            }),
            (Err(source), reset) => {
                if let Err(e) = reset {
                    warn!(dialogue = %id, error = %e, "reset after failed query also failed");
                }
                Err(DialogError::QueryFailed {
                    id: id.clone(),
                    source,
                })
            }
        }
    }
}

/// Resets a stateless session when the turn ends, including by panic.
struct TurnGuard<'a> {
    session: &'a mut DialogueSession,
    armed: bool,
}

impl<'a> TurnGuard<'a> {
    fn begin(session: &'a mut DialogueSession) -> Self {
        let armed = !session.stateful;
        Self { session, armed }
    }

    fn engine(&mut self) -> &mut dyn EngineDialog {
        self.session.engine.as_mut()
    }

    fn finish(mut self) -> Result<(), EngineError> {
        self.armed = false;
        if self.session.stateful {
            return Ok(());
        }
        self.session.first_turn = true;
        self.session.engine.reset()
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.session.first_turn = true;
        if let Err(e) = self.session.engine.reset() {
            warn!(dialogue = %self.session.id, error = %e, "reset on unwind failed");
        }
    }
}
