//! Turns raw pattern captures into typed, per-intent parameters.
//!
//! The "last week" time filter is a lexical check over the whole command,
//! applied after (and independently of) the structural match.

use crate::intent::{Intent, RawMatch, GENERIC_FILE_TYPE};
use serde::Serialize;

/// Glob substituted for a generic "files" search.
pub const DEFAULT_FIND_GLOB: &str = "*.pdf";

const LAST_WEEK_PHRASE: &str = "last week";

/// Extensions whose plural form ("pdfs", "pngs") is understood as the
/// extension itself.
const KNOWN_EXTENSIONS: &[&str] = &["txt", "pdf", "doc", "docx", "jpg", "jpeg", "png", "gif"];

const IMAGE_PATTERNS: &[&str] = &["*.jpg", "*.jpeg", "*.png", "*.gif"];
const PDF_PATTERNS: &[&str] = &["*.pdf"];
const DOCUMENT_PATTERNS: &[&str] = &["*.doc", "*.docx", "*.txt"];

/// File-name globs for the named file categories shared by find and organize.
pub fn category_patterns(category: &str) -> Option<&'static [&'static str]> {
    match category.trim().to_lowercase().as_str() {
        "images" => Some(IMAGE_PATTERNS),
        "pdfs" => Some(PDF_PATTERNS),
        "documents" => Some(DOCUMENT_PATTERNS),
        _ => None,
    }
}

/// Globs a resolved find `file_type` stands for: a category expands to its
/// table entry, anything else is already a glob.
pub fn file_patterns(file_type: &str) -> Vec<String> {
    match category_patterns(file_type) {
        Some(patterns) => patterns.iter().map(|p| p.to_string()).collect(),
        None => vec![file_type.to_string()],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilter {
    LastWeek,
}

impl TimeFilter {
    /// How far back the filter reaches from now.
    pub fn window(self) -> chrono::Duration {
        match self {
            TimeFilter::LastWeek => chrono::Duration::days(7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum CommandParams {
    OpenPath {
        target: String,
    },
    OpenApplication {
        name: String,
    },
    FindFiles {
        file_type: String,
        directory: Option<String>,
        time_filter: Option<TimeFilter>,
    },
    OrganizeFiles {
        file_type: String,
        destination: String,
    },
    SortFiles {
        directory: String,
        criteria: String,
    },
    RecentDownloads,
}

impl CommandParams {
    /// The intent this parameter record belongs to.
    pub fn intent(&self) -> Intent {
        match self {
            CommandParams::OpenPath { .. } => Intent::OpenPath,
            CommandParams::OpenApplication { .. } => Intent::OpenApplication,
            CommandParams::FindFiles { .. } => Intent::FindFiles,
            CommandParams::OrganizeFiles { .. } => Intent::OrganizeFiles,
            CommandParams::SortFiles { .. } => Intent::SortFiles,
            CommandParams::RecentDownloads => Intent::RecentDownloads,
        }
    }
}

/// Build the parameter record for a match. Returns `None` only for
/// `Intent::Unknown`, which carries no parameters.
pub fn normalize(raw: &RawMatch, original_text: &str) -> Option<CommandParams> {
    let slot = |i: usize| raw.capture(i).map(str::trim).unwrap_or_default().to_string();

    let params = match raw.intent {
        Intent::OpenPath => CommandParams::OpenPath { target: slot(0) },
        Intent::OpenApplication => CommandParams::OpenApplication { name: slot(0) },
        Intent::FindFiles => CommandParams::FindFiles {
            file_type: resolve_find_glob(&slot(0)),
            directory: raw
                .capture(1)
                .map(str::trim)
                .filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case(LAST_WEEK_PHRASE))
                .map(str::to_string),
            time_filter: time_filter_for(original_text),
        },
        Intent::OrganizeFiles => CommandParams::OrganizeFiles {
            file_type: slot(0),
            destination: slot(1),
        },
        Intent::SortFiles => CommandParams::SortFiles {
            directory: slot(0),
            criteria: slot(1),
        },
        Intent::RecentDownloads => CommandParams::RecentDownloads,
        Intent::Unknown => return None,
    };
    Some(params)
}

/// `LastWeek` when the phrase occurs anywhere in the command.
pub fn time_filter_for(text: &str) -> Option<TimeFilter> {
    text.to_lowercase()
        .contains(LAST_WEEK_PHRASE)
        .then_some(TimeFilter::LastWeek)
}

/// Resolve a spoken file type into a file-name glob, or a category name
/// (`images`, `documents`) that `file_patterns` expands.
pub fn resolve_find_glob(token: &str) -> String {
    let token = token.trim();
    if token.is_empty() || token.eq_ignore_ascii_case(GENERIC_FILE_TYPE) {
        return DEFAULT_FIND_GLOB.to_string();
    }
    if token.contains('*') || token.contains('?') {
        return token.to_string();
    }

    let lower = token.to_lowercase();
    if let Some(ext) = lower.strip_suffix('s').filter(|stem| KNOWN_EXTENSIONS.contains(stem)) {
        return format!("*.{ext}");
    }
    if category_patterns(&lower).is_some() {
        return lower;
    }
    format!("*.{}", lower.trim_start_matches('.'))
}
