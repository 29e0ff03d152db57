//! Action handlers: one per intent, each returning an `ActionResult`.
//!
//! Handlers are the only place that touches the file system or spawns
//! processes. Collaborator failures are turned into `Error` results with an
//! `"<operation>: <cause>"` message and never escape as errors or panics.

pub mod platform;

use crate::params::{category_patterns, file_patterns, CommandParams, TimeFilter};
use platform::{ListOptions, Platform};
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::warn;

/// Upper bound on the files reported by a search.
pub const MAX_FIND_RESULTS: usize = 10;

/// Subdirectory created by `sort_files`.
pub const SORTED_DIR_NAME: &str = "sorted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub message: String,
}

impl ActionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Success,
            message: message.into(),
        }
    }

    /// `"<operation>: <cause>"`
    pub fn error(operation: &str, cause: impl Display) -> Self {
        Self {
            status: ActionStatus::Error,
            message: format!("{operation}: {cause}"),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}

/// Locations the handlers resolve relative commands against.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// Used for `~` expansion.
    pub home_dir: Option<PathBuf>,
    /// Default search root for find and organize.
    pub search_root: PathBuf,
    pub search_max_depth: Option<usize>,
    pub downloads_dir: PathBuf,
}

impl HandlerSettings {
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        let home_dir = dirs::home_dir();
        let expand = |raw: &str| PathBuf::from(expand_tilde_with_home(raw, home_dir.as_deref()));

        let search_root = config
            .search_root
            .as_deref()
            .map(expand)
            .or_else(|| home_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let downloads_dir = config
            .downloads_dir
            .as_deref()
            .map(expand)
            .or_else(dirs::download_dir)
            .or_else(|| home_dir.as_ref().map(|h| h.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("Downloads"));

        Self {
            home_dir,
            search_root,
            search_max_depth: config.search_max_depth,
            downloads_dir,
        }
    }
}

/// Expand a leading `~` against `home_dir`. Other paths are returned as-is.
pub fn expand_tilde_with_home(raw: &str, home_dir: Option<&Path>) -> String {
    let Some(home_dir) = home_dir else {
        return raw.to_string();
    };

    if raw == "~" {
        return home_dir.to_string_lossy().to_string();
    }

    if let Some(stripped) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return home_dir.join(stripped).to_string_lossy().to_string();
    }

    raw.to_string()
}

/// Order applied by `sort_files`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCriterion {
    SizeDescending,
    NameAscending,
    NewestFirst,
    /// Any unrecognised criterion.
    SizeAscending,
}

impl SortCriterion {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "size" => SortCriterion::SizeDescending,
            "name" => SortCriterion::NameAscending,
            "date" | "modified" | "time" => SortCriterion::NewestFirst,
            _ => SortCriterion::SizeAscending,
        }
    }
}

/// Glob patterns for an organize category. Unknown categories are treated
/// as an extension.
pub fn organize_patterns(category: &str) -> Vec<String> {
    match category_patterns(category) {
        Some(patterns) => patterns.iter().map(|p| p.to_string()).collect(),
        None => {
            let category = category.trim().to_lowercase();
            vec![format!("*.{}", category.trim_start_matches('.'))]
        }
    }
}

/// Canonical file manager for the generic "explorer" names.
fn platform_file_manager() -> &'static str {
    if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "Finder"
    } else {
        "nautilus"
    }
}

fn skipped_suffix(skipped: usize) -> String {
    if skipped == 0 {
        String::new()
    } else {
        format!(" ({skipped} skipped: already present at destination)")
    }
}

/// Runs `CommandParams` against a `Platform`.
pub struct ActionHandlers {
    platform: Arc<dyn Platform>,
    settings: HandlerSettings,
}

impl ActionHandlers {
    pub fn new(platform: Arc<dyn Platform>, settings: HandlerSettings) -> Self {
        Self { platform, settings }
    }

    pub fn run(&self, params: &CommandParams) -> ActionResult {
        match params {
            CommandParams::OpenPath { target } => self.open_path(target),
            CommandParams::OpenApplication { name } => self.open_application(name),
            CommandParams::FindFiles {
                file_type,
                directory,
                time_filter,
            } => self.find_files(file_type, directory.as_deref(), *time_filter),
            CommandParams::OrganizeFiles {
                file_type,
                destination,
            } => self.organize_files(file_type, destination),
            CommandParams::SortFiles {
                directory,
                criteria,
            } => self.sort_files(directory, criteria),
            CommandParams::RecentDownloads => self.recent_downloads(),
        }
    }

    fn expand(&self, raw: &str) -> PathBuf {
        PathBuf::from(expand_tilde_with_home(raw.trim(), self.settings.home_dir.as_deref()))
    }

    /// Expanded and made absolute against the working directory.
    fn absolute(&self, raw: &str) -> PathBuf {
        let path = self.expand(raw);
        if path.is_absolute() {
            return path;
        }
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path,
        }
    }

    pub fn open_path(&self, target: &str) -> ActionResult {
        self.open_resolved(&self.absolute(target))
    }

    fn open_resolved(&self, path: &Path) -> ActionResult {
        if !path.exists() {
            return ActionResult::error("Path does not exist", path.display());
        }
        match self.platform.open_path(path) {
            Ok(()) => ActionResult::success(format!("Opened: {}", path.display())),
            Err(e) => {
                warn!("failed to open {}: {e:#}", path.display());
                ActionResult::error("Error opening path", format!("{e:#}"))
            }
        }
    }

    pub fn open_application(&self, name: &str) -> ActionResult {
        let name = name.trim().to_lowercase();
        let command = match name.as_str() {
            "file explorer" | "explorer" => platform_file_manager(),
            other => other,
        };
        match self.platform.launch_application(command) {
            Ok(()) => ActionResult::success(format!("Opened application: {name}")),
            Err(e) => {
                warn!("failed to launch {command}: {e:#}");
                ActionResult::error("Error opening application", format!("{e:#}"))
            }
        }
    }

    pub fn find_files(
        &self,
        pattern: &str,
        directory: Option<&str>,
        time_filter: Option<TimeFilter>,
    ) -> ActionResult {
        let root = directory
            .map(|d| self.expand(d))
            .unwrap_or_else(|| self.settings.search_root.clone());
        let options = ListOptions {
            modified_after: time_filter.map(|f| SystemTime::from(chrono::Utc::now() - f.window())),
            limit: Some(MAX_FIND_RESULTS),
            max_depth: self.settings.search_max_depth,
            exclude: None,
        };

        let mut files = Vec::new();
        for glob in file_patterns(pattern) {
            match self.platform.list_files(&glob, &root, &options) {
                Ok(found) => files.extend(found),
                Err(e) => {
                    warn!("file search for {glob} in {} failed: {e:#}", root.display());
                    return ActionResult::error("Error finding files", format!("{e:#}"));
                }
            }
        }
        files.sort();
        files.dedup();
        files.truncate(MAX_FIND_RESULTS);

        if files.is_empty() {
            return ActionResult::success(format!("No files matching {pattern} found"));
        }
        let listing: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
        ActionResult::success(format!("Found {} files: {}", files.len(), listing.join(", ")))
    }

    pub fn organize_files(&self, category: &str, destination: &str) -> ActionResult {
        let destination = self.absolute(destination);
        if let Err(e) = self.platform.make_directory(&destination) {
            return ActionResult::error("Error organizing files", format!("{e:#}"));
        }

        let options = ListOptions {
            max_depth: self.settings.search_max_depth,
            exclude: Some(destination.clone()),
            ..Default::default()
        };

        let mut moved = 0usize;
        let mut skipped = 0usize;
        for pattern in organize_patterns(category) {
            let files = match self.platform.list_files(&pattern, &self.settings.search_root, &options) {
                Ok(files) => files,
                Err(e) => {
                    return ActionResult::error(
                        "Error organizing files",
                        format!("{e:#} (moved {moved} before failing)"),
                    );
                }
            };
            for file in files {
                let Some(file_name) = file.file_name() else {
                    continue;
                };
                let target = destination.join(file_name);
                if target.exists() {
                    skipped += 1;
                    continue;
                }
                if let Err(e) = self.platform.move_file(&file, &target) {
                    warn!("organize stopped after {moved} files: {e:#}");
                    return ActionResult::error(
                        "Error organizing files",
                        format!("{e:#} (moved {moved} before failing)"),
                    );
                }
                moved += 1;
            }
        }

        ActionResult::success(format!(
            "Moved {moved} {category} to {}{}",
            destination.display(),
            skipped_suffix(skipped)
        ))
    }

    pub fn sort_files(&self, directory: &str, criteria: &str) -> ActionResult {
        let dir = self.absolute(directory);
        let entries = match self.platform.list_entries(&dir) {
            Ok(entries) => entries,
            Err(e) => return ActionResult::error("Error sorting files", format!("{e:#}")),
        };

        struct Entry {
            path: PathBuf,
            size: u64,
            modified: Option<SystemTime>,
        }

        let mut entries: Vec<Entry> = entries
            .into_iter()
            .filter(|p| p.file_name().is_some_and(|n| n != SORTED_DIR_NAME))
            .filter_map(|path| {
                let meta = std::fs::metadata(&path).ok()?;
                Some(Entry {
                    size: meta.len(),
                    modified: meta.modified().ok(),
                    path,
                })
            })
            .collect();

        // Entries arrive sorted by name, so stable sorts keep ties in name order.
        match SortCriterion::parse(criteria) {
            SortCriterion::SizeDescending => entries.sort_by_key(|e| Reverse(e.size)),
            SortCriterion::SizeAscending => entries.sort_by_key(|e| e.size),
            SortCriterion::NewestFirst => entries.sort_by_key(|e| Reverse(e.modified)),
            SortCriterion::NameAscending => {}
        }

        let sorted_dir = dir.join(SORTED_DIR_NAME);
        if let Err(e) = self.platform.make_directory(&sorted_dir) {
            return ActionResult::error("Error sorting files", format!("{e:#}"));
        }

        let mut moved = 0usize;
        let mut skipped = 0usize;
        for (index, entry) in entries.iter().enumerate() {
            let Some(name) = entry.path.file_name() else {
                continue;
            };
            let target = sorted_dir.join(format!("{}_{}", index + 1, name.to_string_lossy()));
            if target.exists() {
                skipped += 1;
                continue;
            }
            if let Err(e) = self.platform.move_file(&entry.path, &target) {
                warn!("sort stopped after {moved} entries: {e:#}");
                return ActionResult::error(
                    "Error sorting files",
                    format!("{e:#} (moved {moved} before failing)"),
                );
            }
            moved += 1;
        }

        ActionResult::success(format!(
            "Sorted {moved} files in {} by {} to {}{}",
            dir.display(),
            criteria.trim(),
            sorted_dir.display(),
            skipped_suffix(skipped)
        ))
    }

    pub fn recent_downloads(&self) -> ActionResult {
        let downloads = self.settings.downloads_dir.clone();
        self.open_resolved(&downloads)
    }
}
