//! Session manager: the single access gate over every dialogue.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::engine::{Engine, SentenceCode};
use crate::streaming::StreamSummary;
use crate::template::{self, ModelFamily};
use crate::{DialogError, DialogueId};

use super::dialogue::DialogueSession;

/// Everything behind the gate.
struct Registry {
    // Declared before `engine` so dialog handles are freed before the config.
    dialogues: HashMap<DialogueId, DialogueSession>,
    engine: Box<dyn Engine>,
}

impl Registry {
    fn get_mut(&mut self, id: &DialogueId) -> Result<&mut DialogueSession, DialogError> {
        self.dialogues
            .get_mut(id)
            .ok_or_else(|| DialogError::SessionNotFound(id.clone()))
    }
}

/// Owns the engine configuration and every dialogue created from it.
///
/// One mutex covers the whole manager: at most one backend call is in
/// flight at any time, across all dialogues. Queries block the calling
/// thread, and the consumer runs on that thread while the gate is held, so
/// a consumer must never call back into the manager.
pub struct SessionManager {
    family: ModelFamily,
    gate: Mutex<Registry>,
}

impl SessionManager {
    pub fn new(engine: Box<dyn Engine>, family: ModelFamily) -> Self {
        info!(template = %family, "session manager ready");
        Self {
            family,
            gate: Mutex::new(Registry {
                dialogues: HashMap::new(),
                engine,
            }),
        }
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    // A poisoned gate only means a consumer panicked mid-query; the turn
    // guard has already restored the dialogue state.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a dialogue bound to a fresh backend context.
    pub fn create_dialogue(&self, stateful: bool) -> Result<DialogueId, DialogError> {
        let mut registry = self.lock();

        let mut id = DialogueId::new();
        while registry.dialogues.contains_key(&id) {
            id = DialogueId::new();
        }

        let session = DialogueSession::open(registry.engine.as_ref(), id.clone(), stateful)?;
        registry.dialogues.insert(id.clone(), session);

        info!(dialogue = %id, stateful, "dialogue created");
        Ok(id)
    }

    /// Free a dialogue's backend context and forget it.
    ///
    /// Idempotent: returns `false` when the id is unknown.
    pub fn remove_dialogue(&self, id: &DialogueId) -> bool {
        let mut registry = self.lock();
        match registry.dialogues.remove(id) {
            Some(session) => {
                // Freed while the gate is still held.
                drop(session);
                info!(dialogue = %id, "dialogue removed");
                true
            }
            None => {
                debug!(dialogue = %id, "remove of unknown dialogue ignored");
                false
            }
        }
    }

    /// Submit a turn. The first turn of a conversation carries `system_text`;
    /// later turns ignore it.
    pub fn query<F>(
        &self,
        id: &DialogueId,
        system_text: &str,
        user_text: &str,
        mut consumer: F,
    ) -> Result<StreamSummary, DialogError>
    where
        F: FnMut(&str, SentenceCode),
    {
        let mut registry = self.lock();
        let session = registry.get_mut(id)?;

        let first = session.is_first_turn();
        let prompt = if first {
            template::format_first_turn(self.family, system_text, user_text)
        } else {
            template::format_subsequent_turn(self.family, user_text)
        };

        debug!(dialogue = %id, first_turn = first, "query");
        session.submit(&prompt, &mut consumer)
    }

    /// Submit a follow-up turn to a stateful dialogue that already has
    /// its first turn.
    pub fn user_query<F>(
        &self,
        id: &DialogueId,
        user_text: &str,
        mut consumer: F,
    ) -> Result<StreamSummary, DialogError>
    where
        F: FnMut(&str, SentenceCode),
    {
        let mut registry = self.lock();
        let session = registry.get_mut(id)?;

        if !session.is_stateful() {
            return Err(DialogError::NotStateful(id.clone()));
        }
        if session.is_first_turn() {
            return Err(DialogError::FirstTurnRequired(id.clone()));
        }

        let prompt = template::format_subsequent_turn(self.family, user_text);
        debug!(dialogue = %id, "user query");
        session.submit(&prompt, &mut consumer)
    }

    pub fn contains(&self, id: &DialogueId) -> bool {
        self.lock().dialogues.contains_key(id)
    }

    pub fn dialogue_count(&self) -> usize {
        self.lock().dialogues.len()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let registry = self
            .gate
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let count = registry.dialogues.len();
        registry.dialogues.clear();
        debug!(count, "session manager torn down");
    }
}
