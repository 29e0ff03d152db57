//! Launcher binary resolution with caching.
//!
//! A server started from a desktop session or a service manager often runs
//! without the user's shell PATH, so `xdg-open` or `nautilus` are not found
//! by name. Well-known binary directories are searched once per name and the
//! result is cached for the lifetime of the process.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Directories searched before falling back to a bare name lookup on PATH.
fn launcher_dirs() -> &'static [String] {
    static DIRS: OnceLock<Vec<String>> = OnceLock::new();
    DIRS.get_or_init(|| {
        let home = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut dirs = Vec::new();

        #[cfg(target_os = "macos")]
        {
            dirs.extend([
                "/usr/bin".to_string(),
                "/usr/local/bin".to_string(),
                "/opt/homebrew/bin".to_string(),
            ]);
            if !home.is_empty() {
                dirs.push(format!("{home}/.local/bin"));
            }
        }

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            dirs.extend([
                "/usr/bin".to_string(),
                "/usr/local/bin".to_string(),
                "/snap/bin".to_string(),
                "/var/lib/flatpak/exports/bin".to_string(),
            ]);
            if !home.is_empty() {
                dirs.push(format!("{home}/.local/bin"));
            }
        }

        #[cfg(target_os = "windows")]
        {
            let system_root =
                std::env::var("SystemRoot").unwrap_or_else(|_| "C:\\Windows".to_string());
            dirs.extend([system_root.clone(), format!("{system_root}\\System32")]);
            if !home.is_empty() {
                dirs.push(format!("{home}\\AppData\\Local\\Microsoft\\WindowsApps"));
            }
        }

        dirs
    })
}

/// Resolve a launcher binary to its full path, or return the name unchanged
/// so the OS performs its own PATH lookup.
pub(crate) fn resolve_launcher(name: &str) -> String {
    static CACHE: OnceLock<parking_lot::Mutex<HashMap<String, String>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| parking_lot::Mutex::new(HashMap::new()));

    if let Some(cached) = cache.lock().get(name) {
        return cached.clone();
    }

    let resolved = resolve_launcher_uncached(name);
    cache.lock().insert(name.to_string(), resolved.clone());
    resolved
}

fn resolve_launcher_uncached(name: &str) -> String {
    // Names with a separator are already paths
    if name.contains('/') || name.contains('\\') {
        return name.to_string();
    }
    for dir in launcher_dirs() {
        let candidate = Path::new(dir).join(name);
        if candidate.is_file() {
            return candidate.to_string_lossy().to_string();
        }
    }
    name.to_string()
}
