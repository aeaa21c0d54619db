//! Scripted engine for tests.
//!
//! Replays a fixed fragment list for every query and records every backend
//! call, so tests can assert on exact prompts, resets, frees and overlap.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Engine, EngineDialog, EngineError, SentenceCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create(usize),
    Query { dialog: usize, prompt: String },
    Reset(usize),
    Free(usize),
    FreeConfig,
}

/// Shared view of everything the engine saw.
#[derive(Default)]
pub(crate) struct Recorder {
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicBool,
    overlaps: AtomicUsize,
}

impl Recorder {
    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Query { prompt, .. } => Some(prompt),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub(crate) struct ScriptedEngine {
    recorder: Arc<Recorder>,
    next_dialog: Arc<AtomicUsize>,
    script: Vec<(String, SentenceCode)>,
    fail_create: bool,
    fail_query: Option<i32>,
    fail_reset: Option<i32>,
    fragment_delay: Duration,
}

impl ScriptedEngine {
    pub(crate) fn new(script: &[(&str, SentenceCode)]) -> Self {
        Self {
            recorder: Arc::new(Recorder::default()),
            next_dialog: Arc::new(AtomicUsize::new(0)),
            script: script.iter().map(|(t, c)| (t.to_string(), *c)).collect(),
            fail_create: false,
            fail_query: None,
            fail_reset: None,
            fragment_delay: Duration::ZERO,
        }
    }

    pub(crate) fn recorder(&self) -> Arc<Recorder> {
        self.recorder.clone()
    }

    pub(crate) fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Emit the script, then report `status`.
    pub(crate) fn failing_query(mut self, status: i32) -> Self {
        self.fail_query = Some(status);
        self
    }

    pub(crate) fn failing_reset(mut self, status: i32) -> Self {
        self.fail_reset = Some(status);
        self
    }

    /// Sleep before every fragment, in milliseconds.
    pub(crate) fn with_latency(mut self, latency_ms: u64) -> Self {
        self.fragment_delay = Duration::from_millis(latency_ms);
        self
    }

    /// Engine handed to a manager. Records `FreeConfig` when dropped.
    pub(crate) fn boxed(&self) -> Box<dyn Engine> {
        Box::new(ScriptedConfig(self.clone()))
    }
}

/// Owned configuration handle around a scripted engine.
struct ScriptedConfig(ScriptedEngine);

impl Engine for ScriptedConfig {
    fn create_dialog(&self) -> Result<Box<dyn EngineDialog>, EngineError> {
        self.0.create_dialog()
    }
}

impl Drop for ScriptedConfig {
    fn drop(&mut self) {
        self.0.recorder.push(Call::FreeConfig);
    }
}

impl Engine for ScriptedEngine {
    fn create_dialog(&self) -> Result<Box<dyn EngineDialog>, EngineError> {
        if self.fail_create {
            return Err(EngineError::Backend("no free context".into()));
        }
        let index = self.next_dialog.fetch_add(1, Ordering::SeqCst);
        self.recorder.push(Call::Create(index));
        Ok(Box::new(ScriptedDialog {
            index,
            engine: self.clone(),
        }))
    }
}

struct ScriptedDialog {
    index: usize,
    engine: ScriptedEngine,
}

impl EngineDialog for ScriptedDialog {
    fn query(
        &mut self,
        prompt: &str,
        _mode: SentenceCode,
        on_token: &mut dyn FnMut(&str, SentenceCode),
    ) -> Result<(), EngineError> {
        let recorder = &self.engine.recorder;
        if recorder.in_flight.swap(true, Ordering::SeqCst) {
            recorder.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let _in_flight = InFlight(&recorder.in_flight);
        recorder.push(Call::Query {
            dialog: self.index,
            prompt: prompt.to_string(),
        });

        for (text, code) in &self.engine.script {
            if !self.engine.fragment_delay.is_zero() {
                std::thread::sleep(self.engine.fragment_delay);
            }
            on_token(text, *code);
        }

        match self.engine.fail_query {
            Some(status) => Err(EngineError::Status(status)),
            None => Ok(()),
        }
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.engine.recorder.push(Call::Reset(self.index));
        match self.engine.fail_reset {
            Some(status) => Err(EngineError::Status(status)),
            None => Ok(()),
        }
    }
}

/// Clears the in-flight flag even when a consumer panics.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Drop for ScriptedDialog {
    fn drop(&mut self) {
        self.engine.recorder.push(Call::Free(self.index));
    }
}
