use super::types::{StatusMessage, VoiceCommandRequest};
use crate::dispatch::DispatchError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tracing::error;

/// POST /api/voice-command
pub(super) async fn voice_command(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VoiceCommandRequest>,
) -> Response {
    let command = body.command.unwrap_or_default();
    let dispatcher = state.dispatcher.clone();

    // Handlers touch the file system and spawn processes.
    let result = tokio::task::spawn_blocking(move || dispatcher.dispatch(&command)).await;

    match result {
        Ok(Ok(response)) => Json(response).into_response(),
        Ok(Err(e @ DispatchError::EmptyCommand)) => {
            (StatusCode::BAD_REQUEST, Json(StatusMessage::error(e.to_string()))).into_response()
        }
        Err(e) => {
            error!("command task failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusMessage::error(format!("Error processing command: {e}"))),
            )
                .into_response()
        }
    }
}
