#![forbid(unsafe_code)]

//! Core domain model and business logic for the workout logger.
//!
//! This crate provides:
//! - Domain types (records, sets, cardio sessions, partitions)
//! - Exercise catalog and message parsing engine
//! - Record formatting
//! - Persistence (JSONL store, message ledger, git versioning)
//! - Verification and CSV export

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod date;
pub mod grammar;
pub mod engine;
pub mod formatter;
pub mod store;
pub mod dedup;
pub mod versioning;
pub mod verify;
pub mod export;
pub mod ingest;

// Re-export commonly used types
pub use error::{Error, ParseError, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, Catalog};
pub use config::Config;
pub use engine::{ParsedMessage, Parser, PrefixPolicy};
pub use store::{JsonlStore, RecordSink};
pub use dedup::{MessageLedger, ProcessedMessages};
pub use versioning::{GitVersioner, NoVersioning, Versioner};
pub use ingest::{IngestOutcome, Ingestor};
