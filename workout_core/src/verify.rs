//! Store verification: re-parse every stored `raw` and compare.
//!
//! The stored timestamp is the reparse reference, so relative modifiers
//! shift the reparsed timestamp; `ts` itself is therefore not compared.
//! The record's local date must still match the partition it lives in.

use crate::engine::{Parser, PrefixPolicy};
use crate::store::{read_records, JsonlStore};
use crate::{PartitionKey, Result, WorkoutRecord};
use std::fmt;
use std::path::PathBuf;

/// One stored line that disagrees with its own raw text
#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    pub path: PathBuf,
    pub line: usize,
    pub raw: String,
    pub problems: Vec<String>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} ({})",
            self.path.display(),
            self.line,
            self.problems.join("; "),
            self.raw
        )
    }
}

/// Outcome of a full store walk
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VerificationReport {
    pub files: usize,
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Differences between a stored record and its reparse, ignoring `ts`
fn compare(stored: &WorkoutRecord, reparsed: &WorkoutRecord) -> Vec<String> {
    let mut problems = Vec::new();
    if stored.entry != reparsed.entry {
        problems.push(format!(
            "entry differs: stored {}, reparsed {}",
            serde_json::to_string(&stored.entry).unwrap_or_default(),
            serde_json::to_string(&reparsed.entry).unwrap_or_default()
        ));
    }
    if stored.rpe != reparsed.rpe {
        problems.push(format!(
            "rpe differs: stored {:?}, reparsed {:?}",
            stored.rpe, reparsed.rpe
        ));
    }
    if stored.notes != reparsed.notes {
        problems.push(format!(
            "notes differ: stored {:?}, reparsed {:?}",
            stored.notes, reparsed.notes
        ));
    }
    problems
}

/// Check one record against its reparse and its partition
pub fn check_record(
    parser: &Parser<'_>,
    record: &WorkoutRecord,
    partition: &PartitionKey,
) -> Vec<String> {
    let mut problems = Vec::new();

    let stored_key = record.partition_key();
    if &stored_key != partition {
        problems.push(format!(
            "record dated {} stored in partition {}",
            stored_key, partition
        ));
    }

    match parser.reparse(record) {
        Ok(parsed) => problems.extend(compare(record, &parsed.record)),
        Err(e) => problems.push(format!("raw no longer parses: {}", e)),
    }
    problems
}

/// Walk every partition and collect all mismatches
///
/// Never modifies the store. Malformed lines are skipped by the reader and
/// are not counted.
pub fn verify_store(store: &JsonlStore, parser: &Parser<'_>) -> Result<VerificationReport> {
    let parser = parser.clone().with_policy(PrefixPolicy::Optional);
    let mut report = VerificationReport::default();

    for (key, path) in store.partitions()? {
        report.files += 1;
        for (line, record) in read_records(&path)? {
            report.checked += 1;
            let problems = check_record(&parser, &record, &key);
            if !problems.is_empty() {
                tracing::warn!("Mismatch at {:?} line {}: {}", path, line, problems.join("; "));
                report.mismatches.push(Mismatch {
                    path: path.clone(),
                    line,
                    raw: record.raw.clone(),
                    problems,
                });
            }
        }
    }

    tracing::info!(
        "Verified {} records in {} files, {} mismatched",
        report.checked,
        report.files,
        report.mismatches.len()
    );
    Ok(report)
}
