//! Append-only JSONL record store, partitioned by day.
//!
//! Records are appended to `{root}/YYYY/MM/DD.jsonl`, one JSON object per
//! line, under an exclusive file lock. Existing lines are never rewritten.

use crate::{PartitionKey, Result, WorkoutRecord};
use chrono::NaiveDate;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Record sink trait for persisting records
pub trait RecordSink {
    /// Append one record to its partition, returning the file written
    fn append(&mut self, record: &WorkoutRecord, key: &PartitionKey) -> Result<PathBuf>;

    /// File a record for `key` would be written to
    fn path_for(&self, key: &PartitionKey) -> PathBuf;
}

/// Day-partitioned JSONL store
#[derive(Clone, Debug)]
pub struct JsonlStore {
    root: PathBuf,
}

impl JsonlStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All partition files under the root, oldest first
    pub fn partitions(&self) -> Result<Vec<(PartitionKey, PathBuf)>> {
        let mut found = Vec::new();
        if !self.root.is_dir() {
            return Ok(found);
        }

        for year_dir in numbered_entries(&self.root, true)? {
            for month_dir in numbered_entries(&year_dir.1, true)? {
                for day_file in numbered_entries(&month_dir.1, false)? {
                    let date = NaiveDate::from_ymd_opt(
                        year_dir.0 as i32,
                        month_dir.0,
                        day_file.0,
                    );
                    match date {
                        Some(date) => found.push((PartitionKey::from_date(date), day_file.1)),
                        None => tracing::warn!(
                            "Ignoring partition with invalid date: {:?}",
                            day_file.1
                        ),
                    }
                }
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    /// Records from every partition between `from` and `to`, inclusive
    pub fn load_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<WorkoutRecord>> {
        let from = PartitionKey::from_date(from);
        let to = PartitionKey::from_date(to);
        let mut records = Vec::new();
        for (key, path) in self.partitions()? {
            if key >= from && key <= to {
                records.extend(read_records(&path)?.into_iter().map(|(_, r)| r));
            }
        }
        tracing::debug!("Loaded {} records from {} to {}", records.len(), from, to);
        Ok(records)
    }
}

/// Directory entries whose stem is a number: `2026`, `02`, `16.jsonl`
fn numbered_entries(dir: &Path, want_dirs: bool) -> Result<Vec<(u32, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() != want_dirs {
            continue;
        }
        if !want_dirs && path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        let number = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u32>().ok());
        if let Some(number) = number {
            entries.push((number, path));
        }
    }
    Ok(entries)
}

impl RecordSink for JsonlStore {
    fn append(&mut self, record: &WorkoutRecord, key: &PartitionKey) -> Result<PathBuf> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        // Acquire exclusive lock
        file.lock_exclusive()?;

        // Serialize first so a bad record never leaves a partial line
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::info!("Appended {} record to {:?}", record.entry.kind(), path);
        Ok(path)
    }

    fn path_for(&self, key: &PartitionKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

/// Read all records from one partition file with their 1-based line numbers
///
/// Malformed lines are logged and skipped.
pub fn read_records(path: &Path) -> Result<Vec<(usize, WorkoutRecord)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutRecord>(&line) {
            Ok(record) => records.push((line_num + 1, record)),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse record at {:?} line {}: {}",
                    path,
                    line_num + 1,
                    e
                );
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}
