//! Processed message ledger for push-based ingestion.
//!
//! Message ids are kept in a JSON file that is written atomically under an
//! exclusive lock. A missing or corrupt ledger is treated as empty.

use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Ledger file name inside the state directory
pub const LEDGER_FILE: &str = "processed_messages.json";

/// Tracks which message ids have already been logged
pub trait MessageLedger {
    fn is_processed(&self, message_id: &str) -> bool;

    /// Record `message_id` durably
    fn mark_processed(&mut self, message_id: &str) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerContents {
    processed: BTreeSet<String>,
}

/// File-backed message ledger
#[derive(Debug)]
pub struct ProcessedMessages {
    path: PathBuf,
    contents: LedgerContents,
}

impl ProcessedMessages {
    /// Open the ledger in `state_dir`
    pub fn open_in(state_dir: &Path) -> Result<Self> {
        Self::load(&state_dir.join(LEDGER_FILE))
    }

    /// Load a ledger with shared locking
    ///
    /// Returns an empty ledger if the file doesn't exist.
    /// If the file is corrupted, logs a warning and starts empty.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = if path.exists() {
            read_contents(path)
        } else {
            tracing::info!("No message ledger found at {:?}, starting empty", path);
            LedgerContents::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            contents,
        })
    }

    pub fn len(&self) -> usize {
        self.contents.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.processed.is_empty()
    }

    /// Write the ledger via temp file and rename
    pub fn save(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::State(format!("ledger path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(&self.contents)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} processed ids to {:?}", self.len(), self.path);
        Ok(())
    }
}

fn read_contents(path: &Path) -> LedgerContents {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open ledger {:?}: {}. Starting empty.", path, e);
            return LedgerContents::default();
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock ledger {:?}: {}. Starting empty.", path, e);
        return LedgerContents::default();
    }

    let mut raw = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut raw);
    let _ = file.unlock();

    if let Err(e) = read {
        tracing::warn!("Failed to read ledger {:?}: {}. Starting empty.", path, e);
        return LedgerContents::default();
    }

    match serde_json::from_str::<LedgerContents>(&raw) {
        Ok(contents) => {
            tracing::debug!("Loaded {} processed ids from {:?}", contents.processed.len(), path);
            contents
        }
        Err(e) => {
            tracing::warn!("Failed to parse ledger {:?}: {}. Starting empty.", path, e);
            LedgerContents::default()
        }
    }
}

impl MessageLedger for ProcessedMessages {
    fn is_processed(&self, message_id: &str) -> bool {
        self.contents.processed.contains(message_id)
    }

    fn mark_processed(&mut self, message_id: &str) -> Result<()> {
        if self.contents.processed.insert(message_id.to_string()) {
            self.save()?;
        }
        Ok(())
    }
}
