mod command_routes;
mod transcribe_routes;
mod types;

use crate::state::AppState;
use anyhow::Context;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use types::{HealthResponse, SystemStatus};

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn system_status(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Json<SystemStatus> {
    Json(SystemStatus {
        status: "online",
        mode: "offline",
        transcription_active: state.session.is_active(),
    })
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Page not found"})))
}

/// Build the router (exposed for testing).
/// CORS is restricted to localhost origins; the API is meant for a local UI.
pub fn build_router(state: Arc<AppState>) -> Router {
    let allowed_origins = [
        HeaderValue::from_static("http://localhost"),
        HeaderValue::from_static("http://127.0.0.1"),
    ];
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins.to_vec())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(system_status))
        .route("/api/voice-command", post(command_routes::voice_command))
        .route("/api/transcribe/start", post(transcribe_routes::start))
        .route("/api/transcribe/stop", post(transcribe_routes::stop))
        .route("/api/transcribe/stream", get(transcribe_routes::stream))
        .route("/api/transcribe/status", get(transcribe_routes::status))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

/// Serve the API until ctrl-c. A running transcription is stopped on exit.
pub async fn start_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("VoicePilot API listening on {}", listener.local_addr()?);

    let app = build_router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    if state.session.is_active() {
        let _ = state.session.stop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::tests::{settings_for, RecordingPlatform};
    use crate::actions::ActionHandlers;
    use crate::config::AppConfig;
    use crate::dispatch::Dispatcher;
    use crate::transcription::tests::ScriptedSource;
    use crate::transcription::TranscriptionSession;
    use axum::body::Body;
    use axum::http::Request;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(home: &Path, source: Arc<ScriptedSource>) -> Arc<AppState> {
        let handlers = ActionHandlers::new(Arc::new(RecordingPlatform::default()), settings_for(home));
        Arc::new(AppState {
            dispatcher: Arc::new(Dispatcher::new(handlers)),
            session: Arc::new(TranscriptionSession::new(source, Duration::from_millis(5))),
            config: AppConfig { stream_poll_interval_ms: 10, ..Default::default() },
        })
    }

    fn home(tmp: &TempDir) -> std::path::PathBuf {
        let home = tmp.path().join("home");
        std::fs::create_dir_all(&home).unwrap();
        home
    }

    fn post_json(url: &str, body: &str) -> Request<Body> {
        Request::post(url)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(test_state(&home(&tmp), Arc::default()));
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["ok"], true);
    }

    #[tokio::test]
    async fn test_system_status() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(test_state(&home(&tmp), Arc::default()));
        let resp = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["status"], "online");
        assert_eq!(json["mode"], "offline");
        assert_eq!(json["transcription_active"], false);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_json() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(test_state(&home(&tmp), Arc::default()));
        let resp = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"], "Page not found");
    }

    #[tokio::test]
    async fn test_voice_command_unknown() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(test_state(&home(&tmp), Arc::default()));
        let resp = app
            .oneshot(post_json("/api/voice-command", r#"{"command":"blah blah nonsense"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["action"], "unknown");
        assert!(json["message"].as_str().unwrap().starts_with("Unknown command: blah blah nonsense"));
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_voice_command_find() {
        let tmp = TempDir::new().unwrap();
        let home = home(&tmp);
        std::fs::write(home.join("report.pdf"), b"x").unwrap();
        let app = build_router(test_state(&home, Arc::default()));
        let resp = app
            .oneshot(post_json("/api/voice-command", r#"{"command":"find pdfs from last week"}"#))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["action"], "find_files");
        assert!(json["message"].as_str().unwrap().contains("report.pdf"));
    }

    #[tokio::test]
    async fn test_voice_command_missing_or_empty() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&home(&tmp), Arc::default());
        for body in [r#"{}"#, r#"{"command":""}"#, r#"{"command":"   "}"#] {
            let resp = build_router(state.clone())
                .oneshot(post_json("/api/voice-command", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
            let json = body_json(resp).await;
            assert_eq!(json["status"], "error");
            assert_eq!(json["message"], "No command provided");
        }
    }

    #[tokio::test]
    async fn test_voice_command_malformed_json_rejected() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(test_state(&home(&tmp), Arc::default()));
        let resp = app
            .oneshot(post_json("/api/voice-command", "{not json"))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn test_transcribe_start_stop_cycle() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&home(&tmp), Arc::default());
        let post = |url: &str| Request::post(url).body(Body::empty()).unwrap();

        let resp = build_router(state.clone()).oneshot(post("/api/transcribe/start")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["message"], "Transcription started");

        let resp = build_router(state.clone()).oneshot(post("/api/transcribe/start")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "Transcription already running");

        let resp = build_router(state.clone())
            .oneshot(Request::get("/api/transcribe/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["active"], true);

        let resp = build_router(state.clone()).oneshot(post("/api/transcribe/stop")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["message"], "Transcription stopped");

        let resp = build_router(state.clone()).oneshot(post("/api/transcribe/stop")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "No active transcription");
    }

    #[tokio::test]
    async fn test_transcribe_start_source_failure() {
        let tmp = TempDir::new().unwrap();
        let source = Arc::new(ScriptedSource { fail_start: true, ..Default::default() });
        let state = test_state(&home(&tmp), source);
        let resp = build_router(state.clone())
            .oneshot(Request::post("/api/transcribe/start").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["status"], "error");
        assert!(!state.session.is_active());
    }

    #[tokio::test]
    async fn test_slow_transcribe_start_does_not_stall_runtime() {
        let tmp = TempDir::new().unwrap();
        let source = Arc::new(ScriptedSource {
            start_delay: Duration::from_millis(500),
            ..Default::default()
        });
        let state = test_state(&home(&tmp), source);

        let starter = build_router(state.clone());
        let pending = tokio::spawn(async move {
            starter
                .oneshot(Request::post("/api/transcribe/start").body(Body::empty()).unwrap())
                .await
                .unwrap()
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let begun = std::time::Instant::now();
        let resp = build_router(state.clone())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(begun.elapsed() < Duration::from_millis(300), "health waited {:?}", begun.elapsed());

        let started = pending.await.unwrap();
        assert_eq!(started.status(), StatusCode::OK);
        assert!(state.session.is_active());
    }

    #[tokio::test]
    async fn test_stream_idle_session_ends_immediately() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(test_state(&home(&tmp), Arc::default()));
        let resp = app
            .oneshot(Request::get("/api/transcribe/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers().get("content-type").unwrap().to_str().unwrap().to_string();
        assert!(ct.starts_with("text/event-stream"));
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_stream_emits_fragment_once_then_closes() {
        let tmp = TempDir::new().unwrap();
        let source = Arc::new(ScriptedSource::default());
        let state = test_state(&home(&tmp), source.clone());
        state.session.start().unwrap();
        source.push("open notes.txt");

        let stopper = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            stopper.session.stop().unwrap();
        });

        let resp = build_router(state.clone())
            .oneshot(Request::get("/api/transcribe/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let expected = r#"data: {"transcript":"open notes.txt","is_final":true}"#;
        assert_eq!(text.matches(expected).count(), 1, "stream body: {text}");
    }
}
