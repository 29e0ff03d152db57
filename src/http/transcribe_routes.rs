use super::types::{ActiveResponse, StatusMessage, TranscriptEvent};
use crate::state::AppState;
use crate::transcription::{SessionError, TranscriptionSession};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, warn};

fn session_error_response(e: SessionError) -> Response {
    let status = match e {
        SessionError::AlreadyRunning | SessionError::NotRunning => StatusCode::BAD_REQUEST,
        SessionError::Source(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(StatusMessage::error(e.to_string()))).into_response()
}

/// Runs a session transition on the blocking pool: starting the source
/// touches the file system and spawns the capture thread.
async fn transition<F>(state: Arc<AppState>, op: F, done: &'static str) -> Response
where
    F: FnOnce(&TranscriptionSession) -> Result<(), SessionError>
        + Send
        + 'static,
{
    let session = state.session.clone();
    match tokio::task::spawn_blocking(move || op(&session)).await {
        Ok(Ok(())) => Json(StatusMessage::success(done)).into_response(),
        Ok(Err(e)) => session_error_response(e),
        Err(e) => {
            error!("transcription task failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusMessage::error(format!("Error changing transcription state: {e}"))),
            )
                .into_response()
        }
    }
}

/// POST /api/transcribe/start
pub(super) async fn start(State(state): State<Arc<AppState>>) -> Response {
    transition(state, |session| session.start(), "Transcription started").await
}

/// POST /api/transcribe/stop
pub(super) async fn stop(State(state): State<Arc<AppState>>) -> Response {
    transition(state, |session| session.stop(), "Transcription stopped").await
}

/// GET /api/transcribe/status
pub(super) async fn status(State(state): State<Arc<AppState>>) -> Json<ActiveResponse> {
    Json(ActiveResponse { active: state.session.is_active() })
}

/// GET /api/transcribe/stream
///
/// Emits each new fragment once while the session runs, then ends. A client
/// connecting to an idle session gets an empty stream.
pub(super) async fn stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.session.clone();
    let interval = state.stream_poll_interval();

    let stream = async_stream::stream! {
        let mut last_seq = 0;
        let mut ticker = tokio::time::interval(interval);
        while session.is_active() {
            ticker.tick().await;

            if let Some(fragment) = session.latest_since(last_seq) {
                last_seq = fragment.seq;
                let payload = TranscriptEvent { transcript: fragment.text, is_final: true };
                match serde_json::to_string(&payload) {
                    Ok(data) => yield Ok(Event::default().data(data)),
                    Err(e) => warn!("could not encode transcript event: {e}"),
                }
            }
        }
        debug!("transcript stream closed");
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
