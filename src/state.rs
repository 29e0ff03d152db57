use crate::actions::platform::SystemPlatform;
use crate::actions::{ActionHandlers, HandlerSettings};
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::transcription::feed::FeedSource;
use crate::transcription::TranscriptionSession;
use std::sync::Arc;
use std::time::Duration;

/// Shared by every request handler.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub session: Arc<TranscriptionSession>,
    pub config: AppConfig,
}

impl AppState {
    /// Wire the real platform and the transcript-file speech source.
    pub fn from_config(config: AppConfig) -> Self {
        let handlers = ActionHandlers::new(
            Arc::new(SystemPlatform),
            HandlerSettings::from_config(&config),
        );
        let source = Arc::new(FeedSource::new(config.transcript_feed_path()));
        let session = TranscriptionSession::new(
            source,
            Duration::from_millis(config.capture_poll_interval_ms),
        );
        Self {
            dispatcher: Arc::new(Dispatcher::new(handlers)),
            session: Arc::new(session),
            config,
        }
    }

    pub fn stream_poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.stream_poll_interval_ms.max(1))
    }
}
