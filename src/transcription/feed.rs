//! Speech source backed by a transcript file.
//!
//! An external speech-to-text engine appends one line per recognised
//! utterance. Only text written after `start` is reported, and a partially
//! written trailing line is left for the next pull.

use super::SpeechSource;
use anyhow::Context;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FeedSource {
    path: PathBuf,
    /// Byte offset up to which the file has been consumed. `None` while idle.
    offset: Mutex<Option<u64>>,
}

impl FeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current_len(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    fn read_from(&self, offset: u64) -> std::io::Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl SpeechSource for FeedSource {
    fn start(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create transcript directory {}", parent.display())
            })?;
        }
        let len = self.current_len();
        debug!("tailing {} from byte {len}", self.path.display());
        *self.offset.lock() = Some(len);
        Ok(())
    }

    fn stop(&self) {
        *self.offset.lock() = None;
    }

    fn pull_latest(&self) -> Option<String> {
        let mut offset = self.offset.lock();
        let consumed = (*offset)?;

        let len = match std::fs::metadata(&self.path) {
            Ok(m) => m.len(),
            Err(_) => return None,
        };
        let start = if len < consumed {
            debug!("{} was truncated, rereading from start", self.path.display());
            0
        } else {
            consumed
        };
        if len == start {
            *offset = Some(start);
            return None;
        }

        let buf = match self.read_from(start) {
            Ok(buf) => buf,
            Err(e) => {
                warn!("Could not read transcript feed {}: {e}", self.path.display());
                return None;
            }
        };

        let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') else {
            *offset = Some(start);
            return None;
        };
        *offset = Some(start + last_newline as u64 + 1);

        String::from_utf8_lossy(&buf[..last_newline])
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(str::to_string)
    }
}
