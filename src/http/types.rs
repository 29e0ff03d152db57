use crate::actions::ActionStatus;
use serde::{Deserialize, Serialize};

// --- Request/Response types ---

#[derive(Deserialize)]
pub(super) struct VoiceCommandRequest {
    #[serde(default)]
    pub command: Option<String>,
}

/// `{status, message}` body used for validation errors and session toggles.
#[derive(Serialize)]
pub(super) struct StatusMessage {
    pub status: ActionStatus,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self { status: ActionStatus::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: ActionStatus::Error, message: message.into() }
    }
}

/// Payload of one `/api/transcribe/stream` event.
#[derive(Serialize)]
pub(super) struct TranscriptEvent {
    pub transcript: String,
    pub is_final: bool,
}

#[derive(Serialize)]
pub(super) struct ActiveResponse {
    pub active: bool,
}

#[derive(Serialize)]
pub(super) struct SystemStatus {
    pub status: &'static str,
    pub mode: &'static str,
    pub transcription_active: bool,
}

#[derive(Serialize)]
pub(super) struct HealthResponse {
    pub ok: bool,
}
