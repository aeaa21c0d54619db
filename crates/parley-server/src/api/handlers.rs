use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{stream, StreamExt};
use parley_dialog::{DialogError, DialogueId, SentenceCode, SessionManager, Transcript};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use super::error::ApiError;
use super::types::*;

/// Fragments buffered between the backend thread and the HTTP body.
/// Once full, a reader that stops consuming holds the manager gate.
const STREAM_BUFFER: usize = 64;

/// Shared server state.
pub struct AppState {
    pub manager: Arc<SessionManager>,
    /// Dialogue behind `/chat` and `/chat_stream`.
    pub default_dialogue: DialogueId,
}

pub type SharedState = Arc<AppState>;

/// Which manager entry point a request maps to.
enum Turn {
    Query { system: String, user: String },
    Followup { user: String },
}

impl Turn {
    fn run<F>(
        self,
        manager: &SessionManager,
        id: &DialogueId,
        consumer: F,
    ) -> Result<(), DialogError>
    where
        F: FnMut(&str, SentenceCode),
    {
        let summary = match self {
            Turn::Query { system, user } => manager.query(id, &system, &user, consumer)?,
            Turn::Followup { user } => manager.user_query(id, &user, consumer)?,
        };
        debug!(dialogue = %id, fragments = summary.fragments, "turn complete");
        Ok(())
    }
}

enum StreamEvent {
    Chunk(Bytes),
    Failed(DialogError),
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn hi() -> &'static str {
    "Hello from Parley chat server!"
}

// ============================================================================
// Default Dialogue
// ============================================================================

fn default_turn(req: ChatRequest) -> Result<Turn, ApiError> {
    if req.system_prompt.is_empty() || req.user_prompt.is_empty() {
        return Err(ApiError::bad_request(
            "Error: system_prompt and user_prompt required",
        ));
    }
    Ok(Turn::Query {
        system: req.system_prompt,
        user: req.user_prompt,
    })
}

pub async fn chat(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<String, ApiError> {
    let turn = default_turn(req)?;
    collect_turn(state.manager.clone(), state.default_dialogue.clone(), turn).await
}

pub async fn chat_stream(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let turn = default_turn(req)?;
    stream_turn(state.manager.clone(), state.default_dialogue.clone(), turn).await
}

// ============================================================================
// Dialogue Lifecycle
// ============================================================================

pub async fn create_dialogue(
    State(state): State<SharedState>,
    req: Option<Json<CreateDialogueRequest>>,
) -> Result<(StatusCode, Json<CreateDialogueResponse>), ApiError> {
    let stateful = req.map(|Json(r)| r.stateful).unwrap_or_default();
    let manager = state.manager.clone();

    let id = tokio::task::spawn_blocking(move || manager.create_dialogue(stateful))
        .await
        .map_err(|e| ApiError::internal(format!("Error: dialogue task failed: {e}")))??;

    Ok((
        StatusCode::CREATED,
        Json(CreateDialogueResponse { id, stateful }),
    ))
}

pub async fn remove_dialogue(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = DialogueId::from(id);
    if id == state.default_dialogue {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "Error: the default dialogue cannot be removed",
        ));
    }
    let manager = state.manager.clone();
    tokio::task::spawn_blocking(move || manager.remove_dialogue(&id))
        .await
        .map_err(|e| ApiError::internal(format!("Error: dialogue task failed: {e}")))?;
    Ok(StatusCode::NO_CONTENT)
}

fn dialogue_turn(req: DialogueChatRequest) -> Result<Turn, ApiError> {
    if req.user_prompt.is_empty() {
        return Err(ApiError::bad_request("Error: user_prompt required"));
    }
    match req.system_prompt {
        Some(system) if system.is_empty() => Err(ApiError::bad_request(
            "Error: system_prompt must not be empty when given",
        )),
        Some(system) => Ok(Turn::Query {
            system,
            user: req.user_prompt,
        }),
        None => Ok(Turn::Followup {
            user: req.user_prompt,
        }),
    }
}

pub async fn dialogue_chat(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<DialogueChatRequest>,
) -> Result<String, ApiError> {
    let turn = dialogue_turn(req)?;
    collect_turn(state.manager.clone(), DialogueId::from(id), turn).await
}

pub async fn dialogue_chat_stream(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<DialogueChatRequest>,
) -> Result<Response, ApiError> {
    let turn = dialogue_turn(req)?;
    stream_turn(state.manager.clone(), DialogueId::from(id), turn).await
}

// ============================================================================
// Turn Execution
// ============================================================================

/// Run a turn to completion and return the concatenated reply.
async fn collect_turn(
    manager: Arc<SessionManager>,
    id: DialogueId,
    turn: Turn,
) -> Result<String, ApiError> {
    let text = tokio::task::spawn_blocking(move || {
        let mut transcript = Transcript::new();
        turn.run(&manager, &id, |text, code| transcript.push(text, code))
            .map(|()| transcript.into_text())
    })
    .await
    .map_err(|e| ApiError::internal(format!("Error: query task failed: {e}")))??;
    Ok(text)
}

/// Run a turn and stream fragments as they arrive.
///
/// A failure before the first fragment becomes an ordinary error response.
/// A failure after output has started is appended to the body as an error
/// line and the stream is closed.
async fn stream_turn(
    manager: Arc<SessionManager>,
    id: DialogueId,
    turn: Turn,
) -> Result<Response, ApiError> {
    let (tx, mut rx) = mpsc::channel::<StreamEvent>(STREAM_BUFFER);

    tokio::task::spawn_blocking(move || {
        let result = turn.run(&manager, &id, |text, code| {
            if !text.is_empty() {
                let _ = tx.blocking_send(StreamEvent::Chunk(Bytes::copy_from_slice(
                    text.as_bytes(),
                )));
            }
            if code == SentenceCode::End {
                let _ = tx.blocking_send(StreamEvent::Chunk(Bytes::from_static(b"\n")));
            }
        });
        if let Err(e) = result {
            warn!(dialogue = %id, error = %e, "streaming query failed");
            let _ = tx.blocking_send(StreamEvent::Failed(e));
        }
    });

    let first = match rx.recv().await {
        Some(StreamEvent::Failed(e)) => return Err(e.into()),
        other => other,
    };

    let events = stream::iter(first).chain(ReceiverStream::new(rx));
    let body = events.map(|event| {
        let bytes = match event {
            StreamEvent::Chunk(bytes) => bytes,
            StreamEvent::Failed(e) => Bytes::from(format!("Error in query: {e}\n")),
        };
        Ok::<_, Infallible>(bytes)
    });

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}
