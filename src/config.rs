use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CONFIG_FILE: &str = "config.json";
const TRANSCRIPT_FEED_FILE: &str = "transcript.txt";

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/voicepilot/`
/// - Linux: `~/.config/voicepilot/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/voicepilot/`
///
/// Falls back to `~/.voicepilot/` if the platform dir is unavailable.
pub(crate) fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("voicepilot"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".voicepilot")
        })
}

/// Default location of the config file.
pub(crate) fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Load a JSON config file, returning Default if missing or corrupt.
/// Corrupt or unreadable files are logged instead of silently resetting state.
pub(crate) fn load_json_config<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not read config {}: {e}", path.display());
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Corrupt config {}: {e}. Using defaults.", path.display());
            T::default()
        }
    }
}

/// Save a JSON config file atomically (temp file + rename).
/// Sets 0600 permissions on Unix.
pub(crate) fn save_json_config<T: Serialize>(path: &Path, config: &T) -> Result<(), String> {
    let dir = path
        .parent()
        .ok_or_else(|| format!("Invalid config path: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| CONFIG_FILE.to_string());
    let temp = dir.join(format!("{}.tmp.{}", file_name, std::process::id()));

    std::fs::write(&temp, &json)
        .map_err(|e| format!("Failed to write temp config: {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| format!("Failed to set config permissions: {e}"))?;
    }

    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit config: {e}")
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Root for find and organize when no directory is spoken (home if unset).
    #[serde(default)]
    pub search_root: Option<String>,
    /// Directory depth walked below the search root. `None` walks everything.
    #[serde(default = "default_search_max_depth")]
    pub search_max_depth: Option<usize>,
    /// Overrides the platform downloads directory.
    #[serde(default)]
    pub downloads_dir: Option<String>,
    /// Text file an external speech-to-text engine appends transcripts to.
    #[serde(default)]
    pub transcript_feed: Option<String>,
    #[serde(default = "default_capture_poll_interval_ms")]
    pub capture_poll_interval_ms: u64,
    #[serde(default = "default_stream_poll_interval_ms")]
    pub stream_poll_interval_ms: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_search_max_depth() -> Option<usize> {
    Some(6)
}

fn default_capture_poll_interval_ms() -> u64 {
    50
}

fn default_stream_poll_interval_ms() -> u64 {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            search_root: None,
            search_max_depth: default_search_max_depth(),
            downloads_dir: None,
            transcript_feed: None,
            capture_poll_interval_ms: default_capture_poll_interval_ms(),
            stream_poll_interval_ms: default_stream_poll_interval_ms(),
        }
    }
}

impl AppConfig {
    pub fn transcript_feed_path(&self) -> PathBuf {
        self.transcript_feed
            .as_deref()
            .map(|raw| {
                PathBuf::from(crate::actions::expand_tilde_with_home(
                    raw,
                    dirs::home_dir().as_deref(),
                ))
            })
            .unwrap_or_else(|| config_dir().join(TRANSCRIPT_FEED_FILE))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Load the config at `path`, writing the defaults there on first launch.
pub(crate) fn load_or_init_app_config(path: &Path) -> AppConfig {
    if path.exists() {
        return load_json_config(path);
    }
    let config = AppConfig::default();
    match save_json_config(path, &config) {
        Ok(()) => info!("Wrote default config to {}", path.display()),
        Err(e) => warn!("Could not write default config: {e}"),
    }
    config
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
