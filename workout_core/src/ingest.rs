//! One-message ingestion: parse, append, then optionally commit and mark.

use crate::dedup::MessageLedger;
use crate::engine::Parser;
use crate::store::RecordSink;
use crate::versioning::Versioner;
use crate::{Result, WorkoutRecord};
use chrono::{DateTime, TimeZone};
use std::path::PathBuf;

/// What happened to one message
#[derive(Clone, Debug, PartialEq)]
pub enum IngestOutcome {
    /// The message id was already processed; nothing was written
    Duplicate { message_id: String },
    /// Parsed but not written
    DryRun { record: WorkoutRecord, path: PathBuf },
    /// Appended to `path`; `committed` is false when versioning is off or failed
    Logged {
        record: WorkoutRecord,
        path: PathBuf,
        committed: bool,
    },
}

/// Composes the parser with its storage collaborators
pub struct Ingestor<'c, S: RecordSink> {
    parser: Parser<'c>,
    sink: S,
    versioner: Option<Box<dyn Versioner>>,
    ledger: Option<Box<dyn MessageLedger>>,
    dry_run: bool,
}

impl<'c, S: RecordSink> Ingestor<'c, S> {
    pub fn new(parser: Parser<'c>, sink: S) -> Self {
        Self {
            parser,
            sink,
            versioner: None,
            ledger: None,
            dry_run: false,
        }
    }

    pub fn with_versioner(mut self, versioner: impl Versioner + 'static) -> Self {
        self.versioner = Some(Box::new(versioner));
        self
    }

    pub fn with_ledger(mut self, ledger: impl MessageLedger + 'static) -> Self {
        self.ledger = Some(Box::new(ledger));
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn parser(&self) -> &Parser<'c> {
        &self.parser
    }

    /// Parse `message` against `reference` and store it
    ///
    /// A parse failure leaves the store, versioning and ledger untouched.
    /// A versioning failure is logged and reported as not committed.
    pub fn ingest<Tz: TimeZone>(
        &mut self,
        message: &str,
        reference: &DateTime<Tz>,
        source: &str,
        message_id: Option<&str>,
    ) -> Result<IngestOutcome> {
        if let (Some(id), Some(ledger)) = (message_id, self.ledger.as_ref()) {
            if ledger.is_processed(id) {
                tracing::info!("Skipping already processed message {}", id);
                return Ok(IngestOutcome::Duplicate {
                    message_id: id.to_string(),
                });
            }
        }

        let parsed = self.parser.parse(message, reference, source)?;

        if self.dry_run {
            let path = self.sink.path_for(&parsed.partition);
            return Ok(IngestOutcome::DryRun {
                record: parsed.record,
                path,
            });
        }

        let path = self.sink.append(&parsed.record, &parsed.partition)?;

        let committed = match &self.versioner {
            Some(versioner) => match versioner.commit(&path, &parsed.record) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Record saved but not committed: {}", e);
                    false
                }
            },
            None => false,
        };

        if let (Some(id), Some(ledger)) = (message_id, self.ledger.as_mut()) {
            ledger.mark_processed(id)?;
        }

        Ok(IngestOutcome::Logged {
            record: parsed.record,
            path,
            committed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;
    use crate::dedup::ProcessedMessages;
    use crate::engine::PrefixPolicy;
    use crate::error::{Error, ParseError};
    use crate::store::{read_records, JsonlStore};
    use crate::PartitionKey;
    use chrono::FixedOffset;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn parser() -> Parser<'static> {
        Parser::new(get_default_catalog(), FixedOffset::west_opt(8 * 3600).unwrap())
            .with_policy(PrefixPolicy::Required)
    }

    fn reference() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-02-16T10:30:00-08:00").unwrap()
    }

    /// Counts commits, failing every one when `fail` is set
    struct CountingVersioner {
        commits: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Versioner for CountingVersioner {
        fn commit(&self, _path: &Path, _record: &WorkoutRecord) -> Result<()> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Versioning("no remote".into()))
            } else {
                Ok(())
            }
        }
    }

    /// Sink that must never be written to
    struct RejectingSink;

    impl RecordSink for RejectingSink {
        fn append(&mut self, _record: &WorkoutRecord, _key: &PartitionKey) -> Result<PathBuf> {
            panic!("append called");
        }

        fn path_for(&self, key: &PartitionKey) -> PathBuf {
            key.relative_path()
        }
    }

    #[test]
    fn test_logged_and_committed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let commits = Arc::new(AtomicUsize::new(0));
        let mut ingestor = Ingestor::new(parser(), JsonlStore::new(temp_dir.path()))
            .with_versioner(CountingVersioner {
                commits: commits.clone(),
                fail: false,
            });

        let outcome = ingestor
            .ingest("/log squat 315x5x3 rpe8", &reference(), "telegram", None)
            .unwrap();

        match outcome {
            IngestOutcome::Logged {
                record,
                path,
                committed,
            } => {
                assert!(committed);
                assert_eq!(path, temp_dir.path().join("2026/02/16.jsonl"));
                assert_eq!(read_records(&path).unwrap()[0].1, record);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(commits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_commit_failure_keeps_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ingestor = Ingestor::new(parser(), JsonlStore::new(temp_dir.path()))
            .with_versioner(CountingVersioner {
                commits: Arc::new(AtomicUsize::new(0)),
                fail: true,
            });

        let outcome = ingestor
            .ingest("/note rest day", &reference(), "telegram", None)
            .unwrap();
        let IngestOutcome::Logged { path, committed, .. } = outcome else {
            panic!("expected a logged outcome");
        };
        assert!(!committed);
        assert_eq!(read_records(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_message_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger = ProcessedMessages::open_in(&temp_dir.path().join("state")).unwrap();
        let mut ingestor =
            Ingestor::new(parser(), JsonlStore::new(temp_dir.path().join("db"))).with_ledger(ledger);

        let first = ingestor
            .ingest("/log pull-up 20,20,25", &reference(), "telegram", Some("101"))
            .unwrap();
        assert!(matches!(first, IngestOutcome::Logged { .. }));

        let second = ingestor
            .ingest("/log pull-up 20,20,25", &reference(), "telegram", Some("101"))
            .unwrap();
        assert_eq!(
            second,
            IngestOutcome::Duplicate {
                message_id: "101".into()
            }
        );

        let path = temp_dir.path().join("db/2026/02/16.jsonl");
        assert_eq!(read_records(&path).unwrap().len(), 1);

        // The mark survives a restart
        let reloaded = ProcessedMessages::open_in(&temp_dir.path().join("state")).unwrap();
        assert!(reloaded.is_processed("101"));
    }

    #[test]
    fn test_parse_failure_marks_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_dir = temp_dir.path().join("state");
        let ledger = ProcessedMessages::open_in(&state_dir).unwrap();
        let mut ingestor = Ingestor::new(parser(), RejectingSink).with_ledger(ledger);

        let err = ingestor
            .ingest("squat 315x5x3", &reference(), "telegram", Some("7"))
            .unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::InvalidPrefix)));
        assert!(!ProcessedMessages::open_in(&state_dir)
            .unwrap()
            .is_processed("7"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let mut ingestor = Ingestor::new(parser(), RejectingSink).dry_run(true);
        let outcome = ingestor
            .ingest("/log yesterday: bench 225x5", &reference(), "telegram", None)
            .unwrap();

        let IngestOutcome::DryRun { record, path } = outcome else {
            panic!("expected a dry run");
        };
        assert_eq!(path, PathBuf::from("2026/02/15.jsonl"));
        assert_eq!(record.entry.name(), Some("bench_press"));
    }
}
