use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{self, SharedState};
use parley_common::ParleyError;

/// Build the API router with all routes.
pub fn build_router(state: SharedState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/hi", get(handlers::hi))
        // Default dialogue
        .route("/chat", post(handlers::chat))
        .route("/chat_stream", post(handlers::chat_stream))
        // Dialogue lifecycle
        .route("/dialogues", post(handlers::create_dialogue))
        .route("/dialogues/:id", delete(handlers::remove_dialogue))
        .route("/dialogues/:id/chat", post(handlers::dialogue_chat))
        .route("/dialogues/:id/chat_stream", post(handlers::dialogue_chat_stream))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn start_server(router: Router, host: &str, port: u16) -> Result<(), ParleyError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Server(format!("failed to bind {addr}: {e}")))?;

    info!("parley listening on http://{addr}");
    info!("  GET    /hi                          health check");
    info!("  POST   /chat                        blocking chat (default dialogue)");
    info!("  POST   /chat_stream                 streaming chat (default dialogue)");
    info!("  POST   /dialogues                   create a dialogue");
    info!("  DELETE /dialogues/:id               remove a dialogue");
    info!("  POST   /dialogues/:id/chat          blocking chat");
    info!("  POST   /dialogues/:id/chat_stream   streaming chat");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
