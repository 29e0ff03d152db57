//! Intent classification for spoken commands.
//!
//! Patterns are tried in a fixed priority order and the first structural
//! match wins. Reordering `PATTERNS` changes which intent an ambiguous
//! command resolves to (e.g. `open notepad` is a folder open, not an app
//! launch), so the order is part of the public behaviour.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Capture used when a command is only recognised through the search keyword
/// fallback. The parameter normalizer resolves it to a concrete glob.
pub const GENERIC_FILE_TYPE: &str = "files";

/// Keywords that classify otherwise unmatched text as a file search.
const SEARCH_KEYWORDS: &[&str] = &["search", "find"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    OpenPath,
    OpenApplication,
    FindFiles,
    OrganizeFiles,
    SortFiles,
    RecentDownloads,
    Unknown,
}

impl Intent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Intent::OpenPath => "open_path",
            Intent::OpenApplication => "open_application",
            Intent::FindFiles => "find_files",
            Intent::OrganizeFiles => "organize_files",
            Intent::SortFiles => "sort_files",
            Intent::RecentDownloads => "recent_downloads",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an intent was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// A strict pattern matched the whole command.
    Structural,
    /// No pattern matched; a search keyword appeared somewhere in the text.
    KeywordFallback,
    /// Nothing matched (`Intent::Unknown`).
    NoMatch,
}

/// Result of classifying one command. Optional pattern slots that did not
/// participate in the match are `None`, never an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub intent: Intent,
    pub kind: MatchKind,
    pub captures: Vec<Option<String>>,
}

impl RawMatch {
    fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            kind: MatchKind::NoMatch,
            captures: Vec::new(),
        }
    }

    fn keyword_fallback() -> Self {
        Self {
            intent: Intent::FindFiles,
            kind: MatchKind::KeywordFallback,
            captures: vec![Some(GENERIC_FILE_TYPE.to_string()), None],
        }
    }

    /// Capture slot `index`, if that slot participated in the match.
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).and_then(|c| c.as_deref())
    }
}

struct IntentPattern {
    intent: Intent,
    regex: Regex,
}

impl IntentPattern {
    fn new(intent: Intent, pattern: &str) -> Self {
        Self {
            intent,
            regex: Regex::new(pattern).unwrap(),
        }
    }
}

lazy_static! {
    // Case-insensitive so captured paths keep the speaker's casing.
    static ref PATTERNS: Vec<IntentPattern> = vec![
        // Path with a known document/image extension
        IntentPattern::new(
            Intent::OpenPath,
            r"(?i)^open\s+(?:file\s+)?(.+\.(?:txt|pdf|docx?|jpg|png|gif))$",
        ),
        // Generic folder: anything after "open" without a dot
        IntentPattern::new(Intent::OpenPath, r"(?i)^open\s+(?:folder\s+)?([^.]+)$"),
        // Known application names
        IntentPattern::new(
            Intent::OpenApplication,
            r"(?i)^open\s+(?:application\s+|app\s+)?(file\s+explorer|explorer|notepad|firefox|chrome|safari|finder|nautilus)(?:\s+.*)?$",
        ),
        // find/search <type> [from|in <dir>] [from last week]
        IntentPattern::new(
            Intent::FindFiles,
            r"(?i)^(?:find|search)\s+(?:all\s+)?(.+?)(?:\s+(?:from|in)\s+(.+?))?(?:\s+from\s+last\s+week)?$",
        ),
        // move <type> to <destination>
        IntentPattern::new(Intent::OrganizeFiles, r"(?i)^move\s+(?:all\s+)?(.+?)\s+to\s+(.+)$"),
        // sort [files|documents] [in] <dir> by <criteria>
        IntentPattern::new(
            Intent::SortFiles,
            r"(?i)^sort\s+(?:files\s+|documents\s+)?(?:in\s+)?(.+?)\s+by\s+(.+)$",
        ),
        IntentPattern::new(Intent::RecentDownloads, r"(?i)^(?:open\s+)?recent\s+downloads(?:\s+.*)?$"),
    ];
}

/// Classify a trimmed command.
pub fn match_intent(text: &str) -> RawMatch {
    for pattern in PATTERNS.iter() {
        if let Some(caps) = pattern.regex.captures(text) {
            let captures = caps
                .iter()
                .skip(1)
                .map(|c| c.map(|m| m.as_str().to_string()))
                .collect();
            return RawMatch {
                intent: pattern.intent,
                kind: MatchKind::Structural,
                captures,
            };
        }
    }

    let lower = text.to_lowercase();
    if SEARCH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return RawMatch::keyword_fallback();
    }

    RawMatch::unknown()
}
