//! Genie dialog SDK binding.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;

use parley_common::ConfigError;
use tracing::warn;

use super::{Engine, EngineDialog, EngineError, SentenceCode};

type GenieStatus = i32;
type ConfigHandle = *const c_void;
type DialogHandle = *const c_void;
type QueryCallback =
    extern "C" fn(response: *const c_char, sentence_code: c_int, user_data: *const c_void);

const GENIE_STATUS_SUCCESS: GenieStatus = 0;

const SENTENCE_COMPLETE: c_int = 0;
const SENTENCE_BEGIN: c_int = 1;
const SENTENCE_CONTINUE: c_int = 2;
const SENTENCE_END: c_int = 3;
const SENTENCE_ABORT: c_int = 4;

extern "C" {
    fn GenieDialogConfig_createFromJson(json: *const c_char, config: *mut ConfigHandle) -> GenieStatus;
    fn GenieDialogConfig_free(config: ConfigHandle) -> GenieStatus;

    fn GenieDialog_create(config: ConfigHandle, dialog: *mut DialogHandle) -> GenieStatus;
    fn GenieDialog_query(
        dialog: DialogHandle,
        query: *const c_char,
        sentence_code: c_int,
        callback: QueryCallback,
        user_data: *const c_void,
    ) -> GenieStatus;
    fn GenieDialog_reset(dialog: DialogHandle) -> GenieStatus;
    fn GenieDialog_free(dialog: DialogHandle) -> GenieStatus;
}

fn code_to_raw(code: SentenceCode) -> c_int {
    match code {
        SentenceCode::Complete => SENTENCE_COMPLETE,
        SentenceCode::Begin => SENTENCE_BEGIN,
        SentenceCode::Continue => SENTENCE_CONTINUE,
        SentenceCode::End => SENTENCE_END,
        SentenceCode::Abort => SENTENCE_ABORT,
    }
}

fn code_from_raw(raw: c_int) -> SentenceCode {
    match raw {
        SENTENCE_COMPLETE => SentenceCode::Complete,
        SENTENCE_BEGIN => SentenceCode::Begin,
        SENTENCE_END => SentenceCode::End,
        SENTENCE_ABORT => SentenceCode::Abort,
        _ => SentenceCode::Continue,
    }
}

type TokenSink<'a> = &'a mut dyn FnMut(&str, SentenceCode);

// A panic in the consumer aborts here: unwinding cannot cross the C frame.
extern "C" fn on_response(response: *const c_char, sentence_code: c_int, user_data: *const c_void) {
    if user_data.is_null() {
        return;
    }
    // SAFETY: user_data is the `TokenSink` on the stack of `GenieDialog::query`,
    // which outlives the blocking GenieDialog_query call that invokes us.
    let sink = unsafe { &mut *(user_data as *mut TokenSink<'_>) };
    let text = if response.is_null() {
        std::borrow::Cow::Borrowed("")
    } else {
        // SAFETY: Genie passes NUL-terminated strings valid for this call.
        unsafe { CStr::from_ptr(response) }.to_string_lossy()
    };
    sink(&text, code_from_raw(sentence_code));
}

/// A Genie dialog configuration loaded from JSON.
pub struct GenieEngine {
    config: ConfigHandle,
}

// SAFETY: the handle is only used behind the session manager's gate.
unsafe impl Send for GenieEngine {}

impl GenieEngine {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let c_json = CString::new(json)
            .map_err(|_| ConfigError::ParseError("engine config contains a NUL byte".into()))?;
        let mut config: ConfigHandle = ptr::null();
        let status = unsafe { GenieDialogConfig_createFromJson(c_json.as_ptr(), &mut config) };
        if status != GENIE_STATUS_SUCCESS || config.is_null() {
            return Err(ConfigError::ParseError(format!(
                "Genie rejected dialog config (status {status})"
            )));
        }
        Ok(Self { config })
    }
}

impl Engine for GenieEngine {
    fn create_dialog(&self) -> Result<Box<dyn EngineDialog>, EngineError> {
        let mut handle: DialogHandle = ptr::null();
        let status = unsafe { GenieDialog_create(self.config, &mut handle) };
        if status != GENIE_STATUS_SUCCESS || handle.is_null() {
            return Err(EngineError::Status(status));
        }
        Ok(Box::new(GenieDialog { handle }))
    }
}

impl Drop for GenieEngine {
    fn drop(&mut self) {
        let status = unsafe { GenieDialogConfig_free(self.config) };
        if status != GENIE_STATUS_SUCCESS {
            warn!(status, "failed to free Genie dialog config");
        }
    }
}

struct GenieDialog {
    handle: DialogHandle,
}

// SAFETY: see `GenieEngine`.
unsafe impl Send for GenieDialog {}

impl EngineDialog for GenieDialog {
    fn query(
        &mut self,
        prompt: &str,
        mode: SentenceCode,
        on_token: &mut dyn FnMut(&str, SentenceCode),
    ) -> Result<(), EngineError> {
        let c_prompt = CString::new(prompt).map_err(|e| {
            EngineError::Backend(format!("prompt has a NUL byte at {}", e.nul_position()))
        })?;
        let mut sink: TokenSink<'_> = on_token;
        let status = unsafe {
            GenieDialog_query(
                self.handle,
                c_prompt.as_ptr(),
                code_to_raw(mode),
                on_response,
                &mut sink as *mut TokenSink<'_> as *const c_void,
            )
        };
        if status != GENIE_STATUS_SUCCESS {
            return Err(EngineError::Status(status));
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        let status = unsafe { GenieDialog_reset(self.handle) };
        if status != GENIE_STATUS_SUCCESS {
            return Err(EngineError::Status(status));
        }
        Ok(())
    }
}

impl Drop for GenieDialog {
    fn drop(&mut self) {
        let status = unsafe { GenieDialog_free(self.handle) };
        if status != GENIE_STATUS_SUCCESS {
            warn!(status, "failed to free Genie dialog");
        }
    }
}
