use crate::actions::{ActionHandlers, ActionResult, ActionStatus};
use crate::intent::{match_intent, Intent};
use crate::params::normalize;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No command provided")]
    EmptyCommand,
}

/// Outcome of one processed command, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    pub status: ActionStatus,
    pub message: String,
    pub action: Intent,
    /// Local time the command was handled, RFC 3339.
    pub timestamp: String,
}

impl CommandResponse {
    fn new(result: ActionResult, action: Intent) -> Self {
        Self {
            status: result.status,
            message: result.message,
            action,
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }
}

fn unknown_command_message(text: &str) -> String {
    format!(
        "Unknown command: {text}. Try 'open notes.txt', 'find pdfs from last week', \
         'move images to ~/Pictures/sorted' or 'recent downloads'."
    )
}

/// Text in, `CommandResponse` out. Holds no mutable state.
pub struct Dispatcher {
    handlers: ActionHandlers,
}

impl Dispatcher {
    pub fn new(handlers: ActionHandlers) -> Self {
        Self { handlers }
    }

    pub fn dispatch(&self, text: &str) -> Result<CommandResponse, DispatchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DispatchError::EmptyCommand);
        }

        let raw = match_intent(text);
        info!(intent = %raw.intent, kind = ?raw.kind, "dispatching {text:?}");

        let Some(params) = normalize(&raw, text) else {
            return Ok(CommandResponse::new(
                ActionResult {
                    status: ActionStatus::Error,
                    message: unknown_command_message(text),
                },
                Intent::Unknown,
            ));
        };

        let result = self.handlers.run(&params);
        info!(intent = %raw.intent, status = ?result.status, "{}", result.message);
        Ok(CommandResponse::new(result, params.intent()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::tests::{settings_for, RecordingPlatform};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn dispatcher(home: &Path) -> (Dispatcher, Arc<RecordingPlatform>) {
        let platform = Arc::new(RecordingPlatform::default());
        let handlers = ActionHandlers::new(platform.clone(), settings_for(home));
        (Dispatcher::new(handlers), platform)
    }

    fn home(tmp: &TempDir) -> PathBuf {
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).unwrap();
        home
    }

    #[test]
    fn empty_and_blank_commands_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let (d, _) = dispatcher(&home(&tmp));
        assert_eq!(d.dispatch(""), Err(DispatchError::EmptyCommand));
        assert_eq!(d.dispatch("   \t"), Err(DispatchError::EmptyCommand));
        assert_eq!(DispatchError::EmptyCommand.to_string(), "No command provided");
    }

    #[test]
    fn nonsense_is_unknown_with_help() {
        let tmp = TempDir::new().unwrap();
        let (d, platform) = dispatcher(&home(&tmp));
        let response = d.dispatch("blah blah nonsense").unwrap();
        assert_eq!(response.status, ActionStatus::Error);
        assert_eq!(response.action, Intent::Unknown);
        assert!(response.message.starts_with("Unknown command: blah blah nonsense."));
        assert!(response.message.contains("'recent downloads'"));
        assert!(platform.opened.lock().is_empty());
    }

    #[test]
    fn find_pdfs_from_last_week_lists_recent_files() {
        let tmp = TempDir::new().unwrap();
        let home = home(&tmp);
        fs::write(home.join("report.pdf"), b"x").unwrap();
        fs::create_dir_all(home.join("docs")).unwrap();
        fs::write(home.join("docs/notes.pdf"), b"x").unwrap();
        fs::write(home.join("readme.txt"), b"x").unwrap();

        let (d, _) = dispatcher(&home);
        let response = d.dispatch("find pdfs from last week").unwrap();
        assert_eq!(response.action, Intent::FindFiles);
        assert_eq!(response.status, ActionStatus::Success);
        assert!(response.message.starts_with("Found 2 files:"), "{}", response.message);
        assert!(response.message.contains("report.pdf"));
        assert!(!response.message.contains("readme.txt"));
    }

    #[test]
    fn move_images_into_tilde_destination() {
        let tmp = TempDir::new().unwrap();
        let home = home(&tmp);
        fs::write(home.join("a.jpg"), b"x").unwrap();
        fs::write(home.join("b.PNG"), b"x").unwrap();
        fs::write(home.join("c.pdf"), b"x").unwrap();

        let (d, _) = dispatcher(&home);
        let response = d.dispatch("move images to ~/Pictures/sorted").unwrap();
        assert_eq!(response.action, Intent::OrganizeFiles);
        assert_eq!(response.status, ActionStatus::Success, "{}", response.message);

        let dest = home.join("Pictures/sorted");
        assert!(dest.join("a.jpg").exists());
        assert!(dest.join("b.PNG").exists());
        assert!(home.join("c.pdf").exists());
        assert!(response.message.starts_with("Moved 2 images to"));
    }

    #[test]
    fn open_existing_file_uses_platform_opener() {
        let tmp = TempDir::new().unwrap();
        let home = home(&tmp);
        let file = home.join("Notes.txt");
        fs::write(&file, b"x").unwrap();

        let (d, platform) = dispatcher(&home);
        let response = d.dispatch("  Open ~/Notes.txt  ").unwrap();
        assert_eq!(response.action, Intent::OpenPath);
        assert_eq!(response.status, ActionStatus::Success);
        assert_eq!(platform.opened.lock().as_slice(), &[file]);
    }

    #[test]
    fn missing_path_reports_error_without_opening() {
        let tmp = TempDir::new().unwrap();
        let home = home(&tmp);
        let (d, platform) = dispatcher(&home);
        let response = d.dispatch("open ~/missing.pdf").unwrap();
        assert_eq!(response.status, ActionStatus::Error);
        assert!(response.message.starts_with("Path does not exist:"));
        assert!(platform.opened.lock().is_empty());
    }

    #[test]
    fn keyword_fallback_still_searches() {
        let tmp = TempDir::new().unwrap();
        let home = home(&tmp);
        let (d, _) = dispatcher(&home);
        let response = d.dispatch("could you find something").unwrap();
        assert_eq!(response.action, Intent::FindFiles);
        assert_eq!(response.status, ActionStatus::Success);
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let tmp = TempDir::new().unwrap();
        let (d, _) = dispatcher(&home(&tmp));
        let response = d.dispatch("blah").unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&response.timestamp).is_ok());
    }

    #[test]
    fn response_serializes_wire_names() {
        let tmp = TempDir::new().unwrap();
        let (d, _) = dispatcher(&home(&tmp));
        let json = serde_json::to_value(d.dispatch("recent downloads").unwrap()).unwrap();
        assert_eq!(json["action"], "recent_downloads");
        assert!(json["status"] == "success" || json["status"] == "error");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn dispatcher_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher>();
    }
}
