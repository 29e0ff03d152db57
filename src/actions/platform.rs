//! OS collaborators used by the action handlers.
//!
//! `open_path` and `launch_application` shell out to the platform opener.
//! The file-system operations have local default implementations so test
//! doubles only need to replace the process-spawning half.

use anyhow::{bail, Context, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;
use tracing::debug;

/// Filters for `Platform::list_files`.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Only files modified at or after this instant.
    pub modified_after: Option<SystemTime>,
    /// Stop after this many matches.
    pub limit: Option<usize>,
    /// Maximum directory depth below the root (root children are depth 1).
    pub max_depth: Option<usize>,
    /// Skip everything below this directory.
    pub exclude: Option<PathBuf>,
}

pub trait Platform: Send + Sync {
    fn open_path(&self, path: &Path) -> Result<()>;

    fn launch_application(&self, name: &str) -> Result<()>;

    fn list_files(&self, pattern: &str, root: &Path, options: &ListOptions) -> Result<Vec<PathBuf>> {
        list_local_files(pattern, root, options)
    }

    /// Immediate, non-hidden entries of `dir` (files and directories), by name.
    fn list_entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        list_local_entries(dir)
    }

    fn move_file(&self, src: &Path, dst: &Path) -> Result<()> {
        move_local_file(src, dst)
    }

    fn make_directory(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("failed to create {}", path.display()))
    }
}

/// The real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPlatform;

impl Platform for SystemPlatform {
    fn open_path(&self, path: &Path) -> Result<()> {
        let mut command = opener_command(path)?;
        let status = command
            .status()
            .with_context(|| format!("failed to run opener for {}", path.display()))?;
        if !status.success() {
            bail!("opener exited with {status}");
        }
        Ok(())
    }

    fn launch_application(&self, name: &str) -> Result<()> {
        let mut child = launch_command(name)?
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch '{name}'"))?;

        // Reap the child when it exits so the server does not collect zombies.
        let label = name.to_string();
        let reaper = std::thread::Builder::new()
            .name("launch-reaper".to_string())
            .spawn(move || match child.wait() {
                Ok(status) => debug!("'{label}' exited with {status}"),
                Err(e) => debug!("could not wait for '{label}': {e}"),
            });
        if let Err(e) = reaper {
            debug!("could not spawn reaper for '{name}': {e}");
        }
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn opener_command(path: &Path) -> Result<Command> {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    Ok(command)
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> Result<Command> {
    let mut command = Command::new("open");
    command.arg(path);
    Ok(command)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn opener_command(path: &Path) -> Result<Command> {
    let mut command = Command::new(crate::launcher::resolve_launcher("xdg-open"));
    command.arg(path);
    Ok(command)
}

#[cfg(not(any(unix, target_os = "windows")))]
fn opener_command(_path: &Path) -> Result<Command> {
    bail!("Unsupported operating system")
}

#[cfg(target_os = "windows")]
fn launch_command(name: &str) -> Result<Command> {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", name]);
    Ok(command)
}

#[cfg(target_os = "macos")]
fn launch_command(name: &str) -> Result<Command> {
    let mut command = Command::new("open");
    command.args(["-a", name]);
    Ok(command)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn launch_command(name: &str) -> Result<Command> {
    Ok(Command::new(crate::launcher::resolve_launcher(name)))
}

#[cfg(not(any(unix, target_os = "windows")))]
fn launch_command(_name: &str) -> Result<Command> {
    bail!("Unsupported operating system")
}

/// Walk `root` and return files whose name matches `pattern`
/// (case-insensitive glob), in deterministic file-name order.
pub fn list_local_files(pattern: &str, root: &Path, options: &ListOptions) -> Result<Vec<PathBuf>> {
    let matcher = glob::Pattern::new(pattern)
        .with_context(|| format!("invalid file pattern '{pattern}'"))?;
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let match_options = glob::MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(true)
        .max_depth(options.max_depth)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut found = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        if options.exclude.as_deref().is_some_and(|ex| path.starts_with(ex)) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !matcher.matches_with(name, match_options) {
            continue;
        }
        if let Some(after) = options.modified_after {
            let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
            if !modified.is_some_and(|m| m >= after) {
                continue;
            }
        }

        found.push(path.to_path_buf());
        if options.limit.is_some_and(|limit| found.len() >= limit) {
            break;
        }
    }

    Ok(found)
}

pub fn list_local_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .map(|e| e.path())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Rename, falling back to copy + remove for files on another device.
pub fn move_local_file(src: &Path, dst: &Path) -> Result<()> {
    match std::fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(rename_err) if src.is_file() => {
            debug!(
                "rename {} -> {} failed ({rename_err}), copying instead",
                src.display(),
                dst.display()
            );
            std::fs::copy(src, dst)
                .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
            std::fs::remove_file(src)
                .with_context(|| format!("failed to remove {}", src.display()))
        }
        Err(e) => Err(e)
            .with_context(|| format!("failed to move {} to {}", src.display(), dst.display())),
    }
}
